use slingshot_core::config::{self, Config, ConfigError};

#[test]
fn rejects_max_results_out_of_range() {
    for max_results in [0, 4, 101, 500] {
        let cfg = Config {
            max_results,
            ..Default::default()
        };
        assert!(config::validate(&cfg).is_err(), "{max_results} should be rejected");
    }
}

#[test]
fn accepts_default_config() {
    let cfg = Config::default();
    assert_eq!(cfg.max_results, 10);
    assert!(cfg.frecency_path.to_string_lossy().contains("Slingshot"));
    assert!(cfg.config_path.to_string_lossy().contains("Slingshot"));
    assert!(config::validate(&cfg).is_ok());
}

#[test]
fn loads_json_with_comments_and_trailing_commas() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            // show a few more rows
            "max_results": 15,
            "max_depth": 2,
            "search_roots": ["/opt/tools",],
        }"#,
    )
    .unwrap();

    let cfg = config::load(Some(path.as_path())).unwrap();
    assert_eq!(cfg.max_results, 15);
    assert_eq!(cfg.max_depth, 2);
    assert_eq!(cfg.search_roots, vec![std::path::PathBuf::from("/opt/tools")]);
    assert_eq!(cfg.config_path, path);
    assert_eq!(cfg.log_level, "info");
}

#[test]
fn load_rejects_invalid_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "max_results": 1 }"#).unwrap();

    assert!(matches!(
        config::load(Some(path.as_path())),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn load_reports_malformed_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    match config::load(Some(path.as_path())) {
        Err(ConfigError::Parse { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn save_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = Config {
        max_results: 25,
        frecency_path: dir.path().join("usage.json"),
        log_dir: Some(dir.path().join("logs")),
        config_path: dir.path().join("nested").join("config.json"),
        ..Default::default()
    };

    config::save(&cfg).unwrap();
    let loaded = config::load(Some(cfg.config_path.as_path())).unwrap();
    assert_eq!(loaded, cfg);
}
