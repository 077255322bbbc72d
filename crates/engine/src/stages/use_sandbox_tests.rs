use std::sync::Arc;
use std::time::Duration;

use crucible_adapters::{FakeEngine, FakeObserver, ScriptedOutcome};
use crucible_core::build_state::BuildState;
use crucible_core::engine_trait::ContainerEngine;
use crucible_core::stage::Stage;
use crucible_core::{DockerProfile, Limits};

use super::*;

fn profile() -> DockerProfile {
    DockerProfile::minimal_alpine("/sandbox")
}

fn params(key: &str, attach: bool) -> UseSandboxParams {
    UseSandboxParams {
        key: key.to_string(),
        profile: profile(),
        limits: Limits::default(),
        files: vec![],
        mounts: vec![],
        attach,
    }
}

#[tokio::test]
async fn setup_without_attach_publishes_sandbox_on_success() {
    let engine = Arc::new(FakeEngine::new());
    engine.script(ScriptedOutcome {
        exit_code: 0,
        ..Default::default()
    });
    let dyn_engine: Arc<dyn ContainerEngine> = engine;
    let mut state = BuildState::new(dyn_engine);

    let mut stage = UseSandbox::new(params("box", false));
    stage.setup(&mut state).await.unwrap();

    assert!(state.shared.get("box").and_then(|v| v.as_sandbox()).is_some());
}

#[tokio::test]
async fn setup_with_attach_but_no_observer_is_no_observer_error() {
    let engine = Arc::new(FakeEngine::new());
    let dyn_engine: Arc<dyn ContainerEngine> = engine;
    let mut state = BuildState::new(dyn_engine);

    let mut stage = UseSandbox::new(params("box", true));
    let err = stage.setup(&mut state).await;
    assert!(matches!(err, Err(StageError::NoObserver { .. })));
}

#[tokio::test]
async fn setup_with_attach_streams_scripted_output_to_observer() {
    let engine = Arc::new(FakeEngine::new());
    engine.script(ScriptedOutcome {
        exit_code: 0,
        stdout: vec!["hello\n".to_string()],
        ..Default::default()
    });
    let dyn_engine: Arc<dyn ContainerEngine> = engine;
    let observer = Arc::new(FakeObserver::new(vec![]));
    let mut state = BuildState::new(dyn_engine).with_observer(observer.clone());

    let mut stage = UseSandbox::new(params("box", true));
    stage.setup(&mut state).await.unwrap();

    // The listener task is spawned concurrently with `wait`; give it a
    // moment to drain the scripted message before asserting.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(observer.collected_stdout(), "hello\n");
}

#[tokio::test]
async fn dispose_awaits_output_listener_drain_without_truncating_buffered_output() {
    let engine = Arc::new(FakeEngine::new());
    engine.script(ScriptedOutcome {
        exit_code: 0,
        stdout: vec!["one\n".to_string(), "two\n".to_string(), "three\n".to_string()],
        ..Default::default()
    });
    let dyn_engine: Arc<dyn ContainerEngine> = engine;
    let observer = Arc::new(FakeObserver::new(vec![]));
    let mut state = BuildState::new(dyn_engine).with_observer(observer.clone());

    let mut stage = UseSandbox::new(params("box", true));
    stage.setup(&mut state).await.unwrap();
    // Dispose immediately, with no sleep to let the output listener drain
    // on its own: `dispose` must still await it to completion rather than
    // aborting it alongside the input listener.
    stage.dispose(&mut state).await.unwrap();

    assert_eq!(observer.collected_stdout(), "one\ntwo\nthree\n");
}

#[tokio::test]
async fn setup_classifies_non_zero_exit() {
    let engine = Arc::new(FakeEngine::new());
    engine.script(ScriptedOutcome {
        exit_code: 1,
        ..Default::default()
    });
    let dyn_engine: Arc<dyn ContainerEngine> = engine;
    let mut state = BuildState::new(dyn_engine);

    let mut stage = UseSandbox::new(params("box", false));
    let err = stage.setup(&mut state).await.unwrap_err();
    assert!(!state.shared.contains_key("box"));

    // Classification errors carry the stage's key, a stage-kind
    // identifier, and its full params (spec §4.7 step 6, §7).
    match err {
        StageError::NonZeroExitCode { exit_code, stage_kind, params, .. } => {
            assert_eq!(exit_code, 1);
            assert_eq!(stage_kind, "use_sandbox");
            assert_eq!(params.key, "box");
            assert_eq!(params.profile, profile());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn setup_classifies_memory_limit_before_exit_code() {
    let engine = Arc::new(FakeEngine::new());
    engine.script(ScriptedOutcome {
        exit_code: 137,
        oom_killed: true,
        ..Default::default()
    });
    let dyn_engine: Arc<dyn ContainerEngine> = engine;
    let mut state = BuildState::new(dyn_engine);

    let mut stage = UseSandbox::new(params("box", false));
    let err = stage.setup(&mut state).await;
    assert!(matches!(err, Err(StageError::MemoryLimit { .. })));
}

#[tokio::test]
async fn setup_classifies_cpu_limit() {
    let engine = Arc::new(FakeEngine::new());
    engine.script(ScriptedOutcome {
        hangs: true,
        ..Default::default()
    });
    let dyn_engine: Arc<dyn ContainerEngine> = engine;
    let mut state = BuildState::new(dyn_engine);

    let mut params = params("box", false);
    params.limits.time = Duration::from_millis(10);
    let mut stage = UseSandbox::new(params);
    let err = stage.setup(&mut state).await;
    assert!(matches!(err, Err(StageError::CpuLimit { .. })));
}

#[tokio::test]
async fn setup_with_missing_mount_key_is_a_stage_error() {
    let engine = Arc::new(FakeEngine::new());
    let dyn_engine: Arc<dyn ContainerEngine> = engine;
    let mut state = BuildState::new(dyn_engine);

    let mut params = params("box", false);
    params.mounts.push(SandboxMountParams {
        key: "missing".into(),
        bind: "/data".into(),
        readonly: false,
    });
    let mut stage = UseSandbox::new(params);
    let err = stage.setup(&mut state).await;
    assert!(matches!(err, Err(StageError::Other { .. })));
}

#[tokio::test]
async fn dispose_deletes_sandbox_and_removes_shared_key() {
    let engine = Arc::new(FakeEngine::new());
    engine.script(ScriptedOutcome {
        exit_code: 0,
        ..Default::default()
    });
    let fake_engine = engine.clone();
    let dyn_engine: Arc<dyn ContainerEngine> = engine;
    let mut state = BuildState::new(dyn_engine);

    let mut stage = UseSandbox::new(params("box", false));
    stage.setup(&mut state).await.unwrap();
    assert!(state.shared.contains_key("box"));

    let container_id = crucible_core::ContainerId::new("fake-container-1");

    stage.dispose(&mut state).await.unwrap();
    assert!(!state.shared.contains_key("box"));
    assert!(stage.is_disposed());
    assert!(fake_engine.is_deleted(&container_id));
}
