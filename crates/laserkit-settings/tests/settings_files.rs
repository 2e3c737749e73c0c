use laserkit_settings::{Settings, SettingsError};
use tempfile::TempDir;

#[test]
fn test_toml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("job.toml");

    let mut settings = Settings::default();
    settings.process.knife_on = true;
    settings.process.knife_passes = 3;
    settings.device.gcode_pre = vec!["G21".to_string(), "G90".to_string()];
    settings.save_to_file(&path).unwrap();

    let loaded = Settings::load_from_file(&path).unwrap();
    assert_eq!(loaded, settings);
}

#[test]
fn test_json_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("job.json");

    let mut settings = Settings::default();
    settings.process.merged = true;
    settings.process.laser_offset = 0.0;
    settings.save_to_file(&path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("\"merged\": true"));

    let loaded = Settings::load_from_file(&path).unwrap();
    assert_eq!(loaded, settings);
}

#[test]
fn test_unknown_extension_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("job.yaml");
    std::fs::write(&path, "process: {}").unwrap();

    let err = Settings::load_from_file(&path).unwrap_err();
    assert!(matches!(err, SettingsError::UnsupportedFormat(_)));
}

#[test]
fn test_invalid_file_values_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("job.json");
    std::fs::write(&path, r#"{ "process": { "slice_height": -2.0 } }"#).unwrap();

    let err = Settings::load_from_file(&path).unwrap_err();
    assert!(matches!(err, SettingsError::InvalidSetting { .. }));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = Settings::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, SettingsError::IoError(_)));
}
