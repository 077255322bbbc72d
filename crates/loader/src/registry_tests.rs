use super::*;

#[test]
fn default_registry_builds_each_core_stage_kind() {
    let registry = default_registry();

    let volume = registry.build("use_volume", serde_json::json!({"key": "vol"}));
    assert!(volume.is_ok());

    let write = registry.build(
        "write_files",
        serde_json::json!({"key": "write", "file_keys": ["files"], "volume": "vol"}),
    );
    assert!(write.is_ok());

    let sandbox = registry.build(
        "use_sandbox",
        serde_json::json!({
            "key": "box",
            "profile": {"image": "alpine", "workdir": "/tmp", "cmd_template": []},
            "files": [{"name": "a.txt", "content": "hi"}],
        }),
    );
    assert!(sandbox.is_ok());
}

#[test]
fn unknown_kind_is_a_registry_error() {
    let registry = default_registry();
    let err = registry.build("no_such_stage", serde_json::json!({}));
    assert!(matches!(err, Err(RegistryError::UnknownKind(_))));
}

#[test]
fn invalid_params_is_a_registry_error() {
    let registry = default_registry();
    let err = registry.build("use_volume", serde_json::json!({"wrong_field": 1}));
    assert!(matches!(err, Err(RegistryError::InvalidParams { .. })));
}

#[test]
fn use_sandbox_accepts_loadable_file_paths_via_registry() {
    let registry = default_registry();
    let tmp = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(tmp.path(), "from disk").unwrap();

    let err = registry.build(
        "use_sandbox",
        serde_json::json!({
            "key": "box",
            "profile": {"image": "alpine", "workdir": "/tmp", "cmd_template": []},
            "files": [{"name": "a.txt", "path": tmp.path().to_str().unwrap()}],
        }),
    );
    assert!(err.is_ok());
}
