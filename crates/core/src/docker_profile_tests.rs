use super::*;

fn files(names: &[&str]) -> Vec<File> {
    names.iter().map(|n| File::text(*n, "")).collect()
}

#[test]
fn placeholder_resolves_to_file_name() {
    let profile = DockerProfile {
        image: "sandbox:python-3.10".into(),
        workdir: "/sandbox".into(),
        user: Some("sandbox".into()),
        cmd_template: vec![
            CmdElement::Literal("python".into()),
            CmdElement::Placeholder { index: 0 },
        ],
    };
    let argv = profile.resolve_argv(&files(&["main.py"])).unwrap();
    assert_eq!(argv, vec!["python".to_string(), "main.py".to_string()]);
}

#[test]
fn placeholder_out_of_range_is_config_error() {
    let profile = DockerProfile {
        image: "x".into(),
        workdir: "/".into(),
        user: None,
        cmd_template: vec![CmdElement::Placeholder { index: 3 }],
    };
    let err = profile.resolve_argv(&files(&["a.py"])).unwrap_err();
    assert_eq!(
        err,
        ConfigError::PlaceholderOutOfRange {
            index: 3,
            file_count: 1
        }
    );
}

#[test]
fn splat_expands_unused_files_in_order() {
    let profile = DockerProfile {
        image: "x".into(),
        workdir: "/".into(),
        user: None,
        cmd_template: vec![
            CmdElement::Literal("gcc".into()),
            CmdElement::Splat,
        ],
    };
    let argv = profile
        .resolve_argv(&files(&["a.c", "b.c", "c.h"]))
        .unwrap();
    assert_eq!(argv, vec!["gcc", "a.c", "b.c", "c.h"]);
}

#[test]
fn splat_skips_files_already_consumed_by_placeholders() {
    let profile = DockerProfile {
        image: "x".into(),
        workdir: "/".into(),
        user: None,
        cmd_template: vec![
            CmdElement::Literal("ld".into()),
            CmdElement::Placeholder { index: 1 },
            CmdElement::Splat,
        ],
    };
    let argv = profile
        .resolve_argv(&files(&["a.o", "b.o", "c.o"]))
        .unwrap();
    assert_eq!(argv, vec!["ld", "b.o", "a.o", "c.o"]);
}

#[test]
fn second_splat_is_a_config_error() {
    let profile = DockerProfile {
        image: "x".into(),
        workdir: "/".into(),
        user: None,
        cmd_template: vec![CmdElement::Splat, CmdElement::Splat],
    };
    let err = profile.resolve_argv(&files(&["a"])).unwrap_err();
    assert_eq!(err, ConfigError::DuplicateSplat);
}

#[test]
fn empty_files_with_only_splat_is_empty_tail() {
    let profile = DockerProfile {
        image: "x".into(),
        workdir: "/".into(),
        user: None,
        cmd_template: vec![CmdElement::Splat],
    };
    let argv = profile.resolve_argv(&[]).unwrap();
    assert!(argv.is_empty());
}

#[test]
fn deserializes_splat_token_and_placeholder_from_json() {
    let el: CmdElement = serde_json::from_str(r#""...""#).unwrap();
    assert_eq!(el, CmdElement::Splat);

    let el: CmdElement = serde_json::from_str(r#"{"index": 2}"#).unwrap();
    assert_eq!(el, CmdElement::Placeholder { index: 2 });

    let el: CmdElement = serde_json::from_str(r#""python""#).unwrap();
    assert_eq!(el, CmdElement::Literal("python".to_string()));
}

mod argv_invariants {
    use super::*;
    use proptest::prelude::*;

    // spec §8: argv length == template length minus the splat marker itself
    // plus however many files the splat expands to; every file not consumed
    // by a placeholder appears exactly once in the splat expansion, in its
    // original order.
    proptest! {
        #[test]
        fn splat_argv_length_and_order_hold(
            names in prop::collection::vec("[a-z][a-z0-9]{0,6}", 0..8),
            placeholder_count in 0usize..4,
        ) {
            let names: Vec<String> = {
                let mut seen = std::collections::HashSet::new();
                names.into_iter().filter(|n| seen.insert(n.clone())).collect()
            };
            let files = files(&names.iter().map(String::as_str).collect::<Vec<_>>());
            let placeholder_count = placeholder_count.min(files.len());

            let mut cmd_template = vec![CmdElement::Literal("run".into())];
            for i in 0..placeholder_count {
                cmd_template.push(CmdElement::Placeholder { index: i });
            }
            cmd_template.push(CmdElement::Splat);

            let profile = DockerProfile {
                image: "x".into(),
                workdir: "/".into(),
                user: None,
                cmd_template,
            };

            let argv = profile.resolve_argv(&files).unwrap();

            let expected_splat_len = files.len() - placeholder_count;
            prop_assert_eq!(argv.len(), 1 + placeholder_count + expected_splat_len);

            let splat_tail = &argv[1 + placeholder_count..];
            let expected_tail: Vec<String> = files[placeholder_count..]
                .iter()
                .map(|f| f.name.clone())
                .collect();
            prop_assert_eq!(splat_tail.to_vec(), expected_tail);
        }

        #[test]
        fn no_splat_argv_length_matches_template(
            names in prop::collection::vec("[a-z][a-z0-9]{0,6}", 1..5),
        ) {
            let files = files(&names.iter().map(String::as_str).collect::<Vec<_>>());
            let cmd_template = vec![
                CmdElement::Literal("run".into()),
                CmdElement::Placeholder { index: 0 },
            ];
            let profile = DockerProfile {
                image: "x".into(),
                workdir: "/".into(),
                user: None,
                cmd_template: cmd_template.clone(),
            };
            let argv = profile.resolve_argv(&files).unwrap();
            prop_assert_eq!(argv.len(), cmd_template.len());
        }
    }
}
