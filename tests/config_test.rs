//! Integration tests for Settings loading with layered precedence.
//!
//! These tests only use explicit config files in temp directories,
//! so they effectively test explicit-file merging over the defaults.

use std::fs;

use tempfile::TempDir;

use sbd::application::ApplicationError;
use sbd::config::{RawSettings, Settings};

// ============================================================
// Settings::load() with an explicit file
// ============================================================

#[test]
fn given_explicit_config_when_load_then_overrides_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sbd.toml");
    fs::write(&path, "pretty = false\nextension = \".json\"\n").unwrap();

    // Act
    let settings = Settings::load(Some(&path)).unwrap();

    // Assert
    assert!(!settings.pretty);
    assert!(settings.backup, "unspecified field keeps default");
    assert_eq!(settings.extension, "json", "leading dot stripped");
}

#[test]
fn given_backup_dir_with_tilde_when_load_then_expanded() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sbd.toml");
    fs::write(&path, "backup_dir = \"~/sbd-backups\"\n").unwrap();

    // Act
    let settings = Settings::load(Some(&path)).unwrap();

    // Assert
    let backup_dir = settings.backup_dir.expect("backup_dir set");
    assert!(!backup_dir.to_string_lossy().starts_with('~'));
    assert!(backup_dir.ends_with("sbd-backups"));
}

#[test]
fn given_missing_explicit_config_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    let result = Settings::load(Some(&dir.path().join("nope.toml")));
    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_invalid_toml_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sbd.toml");
    fs::write(&path, "pretty = \"not a bool\"\n").unwrap();

    let result = Settings::load(Some(&path));

    match result {
        Err(ApplicationError::Config { message }) => assert!(message.contains("parse")),
        other => panic!("expected Config error, got {:?}", other),
    }
}

// ============================================================
// Template and display
// ============================================================

#[test]
fn given_template_when_loaded_as_explicit_config_then_defaults_result() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sbd.toml");
    fs::write(&path, Settings::template()).unwrap();

    // Act
    let settings = Settings::load(Some(&path)).unwrap();

    // Assert
    assert_eq!(settings.extension, Settings::default().extension);
}

#[test]
fn given_settings_when_rendered_as_toml_then_parses_back() {
    let settings = Settings {
        pretty: false,
        ..Settings::default()
    };

    let text = settings.to_toml().unwrap();
    let raw: RawSettings = toml::from_str(&text).unwrap();

    assert_eq!(raw.pretty, Some(false));
    assert_eq!(raw.extension.as_deref(), Some("sbd"));
}
