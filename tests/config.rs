use vtrend::{AnalysisMethod, Config, Error, Scene};

#[test]
fn example_config_loads() {
    let config = Config::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.yaml")).unwrap();

    assert_eq!(config.analysis_method, AnalysisMethod::Linreg);
    assert!(config.draw_direction);
    assert_eq!(config.max_missed_frames, None);
    assert_eq!(config.class_name(3), "car");

    Scene::new(config).unwrap();
}

#[test]
fn json_config_is_validated_on_load() {
    let path = std::env::temp_dir().join(format!("vtrend-bad-{}.json", std::process::id()));
    std::fs::write(&path, r#"{"speed_history_window_size": 2}"#).unwrap();

    let result = Config::load(&path);
    let _ = std::fs::remove_file(&path);

    match result {
        Err(Error::InvalidConfig { field, .. }) => assert_eq!(field, "speed_history_window_size"),
        other => panic!("unexpected {:?}", other.map(|_| ())),
    }
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(matches!(
        Config::load("/nonexistent/vtrend.yaml"),
        Err(Error::Io(_))
    ));
}
