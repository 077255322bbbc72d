use super::*;

#[test]
fn resolve_argv_delegates_to_profile() {
    let mut profile = DockerProfile::minimal_alpine("/sandbox");
    profile.cmd_template = vec![CmdElement::Splat];
    let files = vec![File::text("main.py", "print(1)")];
    let argv = resolve_argv(&profile, &files).unwrap();
    assert_eq!(argv, vec!["main.py".to_string()]);
}

#[test]
fn container_config_carries_optional_cpu_ulimit() {
    let config = ContainerConfig {
        image: "alpine".to_string(),
        cmd: vec!["true".to_string()],
        working_dir: "/sandbox".to_string(),
        user: None,
        memory_bytes: 64 << 20,
        mounts: vec![],
        cpu_ulimit_secs: Some(3),
    };
    assert_eq!(config.cpu_ulimit_secs, Some(3));
}

#[test]
fn raw_container_state_is_plain_data() {
    let state = RawContainerState {
        status: "exited".to_string(),
        exit_code: Some(0),
        oom_killed: false,
        running: false,
    };
    assert_eq!(state.status, "exited");
    assert!(!state.running);
}
