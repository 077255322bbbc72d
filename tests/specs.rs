//! End-to-end scenarios exercising the full stack — pipeline document,
//! stage registry, pipeline orchestration, sandbox classification — wired
//! together against [`crucible_adapters::FakeEngine`] rather than a real
//! container daemon.

use std::sync::Arc;

use crucible_adapters::{FakeEngine, FakeObserver, ScriptedOutcome};
use crucible_core::engine_trait::ContainerEngine;
use crucible_core::{DockerProfile, File, GroupStatus, Limits, Stage};
use crucible_engine::stages::{UseSandbox, UseSandboxParams, UseVolume, UseVolumeParams, WriteFiles, WriteFilesParams};
use crucible_loader::{default_registry, Format, PipelineLoader};

fn python_profile() -> DockerProfile {
    DockerProfile {
        image: "sandbox:python-3.10".into(),
        workdir: "/sandbox".into(),
        user: Some("sandbox".into()),
        cmd_template: vec![
            crucible_core::CmdElement::Literal("python".into()),
            crucible_core::CmdElement::Placeholder { index: 0 },
        ],
    }
}

/// Scenario 1: hello-world run.
#[tokio::test]
async fn hello_world_run_exits_cleanly_and_is_cleaned_up_after_dispose() {
    let engine = Arc::new(FakeEngine::new());
    engine.script(ScriptedOutcome {
        exit_code: 0,
        stdout: vec!["Hello, world!\n".to_string()],
        ..Default::default()
    });
    let dyn_engine: Arc<dyn ContainerEngine> = engine.clone();

    let mut pipeline = crucible_core::Pipeline::new().with_executor(dyn_engine).add_stages(
        "run",
        vec![Box::new(UseSandbox::new(UseSandboxParams {
            key: "box".into(),
            profile: python_profile(),
            limits: Limits::default(),
            files: vec![File::text("main.py", "print(\"Hello, world!\")\n")],
            mounts: vec![],
            attach: false,
        })) as Box<dyn crucible_core::Stage>],
    );

    pipeline.execute_group("run").await.unwrap();
    assert!(pipeline.groups()[0].stages[0].is_setup());
    assert!(pipeline.finalize().await.is_ok());

    let container = crucible_core::ContainerId::new("fake-container-1");
    assert!(engine.is_deleted(&container));
}

/// Scenario 2: attached observer echoes scripted stdout with an empty stdin.
#[tokio::test]
async fn attached_observer_collects_scripted_stdout() {
    let engine = Arc::new(FakeEngine::new());
    engine.script(ScriptedOutcome {
        exit_code: 0,
        stdout: vec!["Hello, world!\n".to_string()],
        ..Default::default()
    });
    let dyn_engine: Arc<dyn ContainerEngine> = engine;
    let observer = Arc::new(FakeObserver::new(vec![]));

    let mut pipeline = crucible_core::Pipeline::new()
        .with_executor(dyn_engine)
        .with_observer(observer.clone())
        .add_stages(
            "run",
            vec![Box::new(UseSandbox::new(UseSandboxParams {
                key: "box".into(),
                profile: python_profile(),
                limits: Limits::default(),
                files: vec![File::text("main.py", "print(\"Hello, world!\")\n")],
                mounts: vec![],
                attach: true,
            })) as Box<dyn crucible_core::Stage>],
        );

    pipeline.execute_group("run").await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    assert_eq!(observer.collected_stdout(), "Hello, world!\n");
    assert_eq!(observer.collected_stderr(), "");
}

/// Scenario 3: non-zero exit fails the group and disposes only the
/// raising stage.
#[tokio::test]
async fn non_zero_exit_fails_group_and_disposes_raising_stage() {
    let engine = Arc::new(FakeEngine::new());
    engine.script(ScriptedOutcome {
        exit_code: 1,
        ..Default::default()
    });
    let dyn_engine: Arc<dyn ContainerEngine> = engine;

    let mut pipeline = crucible_core::Pipeline::new().with_executor(dyn_engine).add_stages(
        "run",
        vec![Box::new(UseSandbox::new(UseSandboxParams {
            key: "box".into(),
            profile: python_profile(),
            limits: Limits::default(),
            files: vec![File::text("main.py", "invalid syntax !!\n")],
            mounts: vec![],
            attach: false,
        })) as Box<dyn crucible_core::Stage>],
    );

    let err = pipeline.execute_group("run").await;
    assert!(matches!(err, Err(crucible_core::StageError::NonZeroExitCode { exit_code: 1, .. })));
    assert_eq!(pipeline.groups()[0].status, GroupStatus::Failed);
    assert!(pipeline.groups()[0].stages[0].is_setup());
    assert!(pipeline.groups()[0].stages[0].is_disposed());
}

/// Scenario 4: memory-limit classification takes priority over exit code.
#[tokio::test]
async fn memory_limit_classification() {
    let engine = Arc::new(FakeEngine::new());
    engine.script(ScriptedOutcome {
        exit_code: 137,
        oom_killed: true,
        ..Default::default()
    });
    let dyn_engine: Arc<dyn ContainerEngine> = engine;

    let mut pipeline = crucible_core::Pipeline::new().with_executor(dyn_engine).add_stages(
        "run",
        vec![Box::new(UseSandbox::new(UseSandboxParams {
            key: "box".into(),
            profile: python_profile(),
            limits: Limits {
                memory_mb: 256,
                ..Limits::default()
            },
            files: vec![File::text("main.py", "a = [i for i in range(10**10)]\n")],
            mounts: vec![],
            attach: false,
        })) as Box<dyn crucible_core::Stage>],
    );

    let err = pipeline.execute_group("run").await;
    assert!(matches!(err, Err(crucible_core::StageError::MemoryLimit { .. })));
}

/// Scenario 5: a hanging container is classified as a cpu/time-limit error.
#[tokio::test]
async fn time_limit_classification() {
    let engine = Arc::new(FakeEngine::new());
    engine.script(ScriptedOutcome {
        hangs: true,
        ..Default::default()
    });
    let dyn_engine: Arc<dyn ContainerEngine> = engine;

    let mut pipeline = crucible_core::Pipeline::new().with_executor(dyn_engine).add_stages(
        "run",
        vec![Box::new(UseSandbox::new(UseSandboxParams {
            key: "box".into(),
            profile: python_profile(),
            limits: Limits {
                time: std::time::Duration::from_millis(20),
                ..Limits::default()
            },
            files: vec![File::text("main.py", "import time; time.sleep(100)\n")],
            mounts: vec![],
            attach: false,
        })) as Box<dyn crucible_core::Stage>],
    );

    let err = pipeline.execute_group("run").await;
    assert!(matches!(err, Err(crucible_core::StageError::CpuLimit { .. })));
}

/// Scenario 6: interactive echo — the observer's single stdin chunk is
/// written and its scripted stdout reply is collected.
#[tokio::test]
async fn interactive_echo_writes_stdin_and_collects_stdout() {
    let engine = Arc::new(FakeEngine::new());
    engine.script(ScriptedOutcome {
        exit_code: 0,
        stdout: vec!["What is your name?\n".to_string(), "Hello, Andrew\n".to_string()],
        ..Default::default()
    });
    let dyn_engine: Arc<dyn ContainerEngine> = engine;
    let observer = Arc::new(FakeObserver::new(vec!["Andrew\n".to_string()]));

    let mut pipeline = crucible_core::Pipeline::new()
        .with_executor(dyn_engine)
        .with_observer(observer.clone())
        .add_stages(
            "run",
            vec![Box::new(UseSandbox::new(UseSandboxParams {
                key: "box".into(),
                profile: python_profile(),
                limits: Limits::default(),
                files: vec![File::text(
                    "main.py",
                    "name = input(\"What is your name?\\n\"); print(f\"Hello, {name}\")\n",
                )],
                mounts: vec![],
                attach: true,
            })) as Box<dyn crucible_core::Stage>],
        );

    pipeline.execute_group("run").await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    assert_eq!(observer.collected_stdout(), "What is your name?\nHello, Andrew\n");
}

/// Scenario 7: multi-stage build+run sharing a volume, loaded from a JSON
/// pipeline document rather than constructed in code.
#[tokio::test]
async fn multi_stage_build_then_run_over_a_shared_volume() {
    const DOC: &str = r#"
    {
      "meta": {"name": "build-then-run"},
      "pipeline": {
        "build": [
          {"use_volume": {"key": "vol"}},
          {"write_files": {"key": "write", "file_keys": ["files"], "volume": "vol"}}
        ],
        "run": [
          {"use_sandbox": {
            "key": "box",
            "profile": {"image": "sandbox:gcc", "workdir": "/sandbox", "cmd_template": ["/sandbox/build"]},
            "mounts": [{"key": "vol", "bind": "/sandbox", "readonly": false}]
          }}
        ]
      }
    }
    "#;

    let engine = Arc::new(FakeEngine::new());
    engine.script(ScriptedOutcome {
        // write_files' throwaway sandbox
        exit_code: 0,
        ..Default::default()
    });
    engine.script(ScriptedOutcome {
        // the run-group sandbox
        exit_code: 0,
        stdout: vec!["5 7 12\n".to_string()],
        ..Default::default()
    });
    let dyn_engine: Arc<dyn ContainerEngine> = engine;

    let loader = PipelineLoader::new(DOC, Format::Json).unwrap();
    assert_eq!(loader.meta().get("name").and_then(|v| v.as_str()), Some("build-then-run"));

    let registry = default_registry();
    let mut pipeline = loader.load(&registry).unwrap().with_executor(dyn_engine);

    let mut state = crucible_core::SharedState::new();
    state.insert(
        "files".to_string(),
        crucible_core::SharedValue::Files(vec![File::text("main.c", "int main(void) { return 0; }\n")]),
    );
    pipeline = pipeline.with_initial_state(state);

    pipeline.execute_group("build").await.unwrap();
    pipeline.execute_group("run").await.unwrap();

    assert_eq!(pipeline.groups()[0].status, GroupStatus::Done);
    assert_eq!(pipeline.groups()[1].status, GroupStatus::Done);
    assert!(pipeline.finalize().await.is_ok());
}

/// Testable property: `dispose()` called twice is a no-op on the second
/// call, for every core stage kind.
#[tokio::test]
async fn dispose_is_idempotent_across_core_stage_kinds() {
    let engine: Arc<dyn ContainerEngine> = Arc::new(FakeEngine::new());
    let mut state = crucible_core::BuildState::new(engine);

    let mut volume_stage = UseVolume::new(UseVolumeParams { key: "vol".into() });
    volume_stage.setup(&mut state).await.unwrap();
    volume_stage.dispose(&mut state).await.unwrap();
    volume_stage.dispose(&mut state).await.unwrap();
    assert!(volume_stage.is_disposed());

    let mut write_stage = WriteFiles::new(WriteFilesParams {
        key: "write".into(),
        file_keys: vec![],
        volume: "missing".into(),
        profile: DockerProfile::minimal_alpine("/tmp"),
    });
    write_stage.dispose(&mut state).await.unwrap();
    write_stage.dispose(&mut state).await.unwrap();
    assert!(write_stage.is_disposed());
}
