//! Settings file handling on a real filesystem.

use zt_cli::settings::{Settings, load_settings, save_settings};

#[test]
fn save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("settings.toml");

    let mut settings = Settings::default();
    settings.registry.min_supported_major = 4;
    settings.cdn.timeout_secs = 3;
    save_settings(&settings, &path).unwrap();

    assert_eq!(load_settings(&path), settings);
}

#[test]
fn missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(load_settings(&dir.path().join("absent.toml")), Settings::default());
}

#[test]
fn malformed_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, "registry = [not toml").unwrap();
    assert_eq!(load_settings(&path), Settings::default());
}
