//! Tests for BundleService: load, save with backups, directory checks.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use sbd::application::services::BundleService;
use sbd::application::ApplicationError;
use sbd::config::Settings;
use sbd::domain::{Bundle, SettingsError};
use sbd::infrastructure::traits::RealFileSystem;
use sbd::infrastructure::ServiceContainer;
use sbd::util::testing;

fn service(settings: Settings) -> BundleService {
    testing::init_test_setup();
    BundleService::new(Arc::new(RealFileSystem), Arc::new(settings))
}

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/resources/bundles")
        .join(name)
}

fn copy_fixture(name: &str, dir: &Path) -> PathBuf {
    let target = dir.join(name);
    fs::create_dir_all(target.parent().unwrap()).unwrap();
    fs::copy(fixture_path(name), &target).unwrap();
    target
}

fn backups_in(dir: &Path) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.to_string_lossy().contains(".bk-"))
        .collect()
}

// ============================================================
// load
// ============================================================

#[test]
fn given_missing_file_when_load_then_file_not_found() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let svc = service(Settings::default());

    // Act
    let result = svc.load(&temp.path().join("missing.sbd"));

    // Assert
    match result {
        Err(ApplicationError::Settings(e)) => {
            assert!(e.is_not_found());
            assert!(matches!(e, SettingsError::FileNotFound(_)));
        }
        other => panic!("expected FileNotFound, got {:?}", other),
    }
}

#[test]
fn given_fixture_when_load_then_bundle_parsed() {
    let svc = service(Settings::default());
    let bundle = svc.load(&fixture_path("sample.sbd")).unwrap();
    assert!(bundle.contains("Root1"));
    assert!(bundle.contains("Root2"));
}

#[test]
fn given_malformed_file_when_load_then_malformed_document() {
    let svc = service(Settings::default());
    assert!(matches!(
        svc.load(&fixture_path("invalid/malformed.sbd")),
        Err(ApplicationError::Settings(SettingsError::MalformedDocument(_)))
    ));
}

// ============================================================
// save
// ============================================================

#[test]
fn given_new_path_when_save_then_written_without_backup() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested/dir/new.sbd");
    let svc = service(Settings::default());
    let mut bundle = Bundle::new(Some("fresh".into()));
    bundle.add_root_with("Root", Vec::new(), None).unwrap();

    // Act
    let backup = svc.save(&bundle, &path).unwrap();

    // Assert
    assert!(backup.is_none());
    assert_eq!(svc.load(&path).unwrap(), bundle);
}

#[test]
fn given_existing_file_when_save_then_backup_written_next_to_it() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = copy_fixture("sample.sbd", temp.path());
    let original = fs::read_to_string(&path).unwrap();
    let svc = service(Settings::default());
    let mut bundle = svc.load(&path).unwrap();
    bundle.remove_root("Root2", false).unwrap();

    // Act
    let backup = svc.save(&bundle, &path).unwrap().expect("backup written");

    // Assert
    assert_eq!(backups_in(temp.path()), vec![backup.clone()]);
    let name = backup.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("sample.bk-"), "{}", name);
    assert!(name.ends_with(".sbd"), "{}", name);
    assert_eq!(fs::read_to_string(&backup).unwrap(), original);
    assert!(!svc.load(&path).unwrap().contains("Root2"));
}

#[test]
fn given_backup_dir_when_save_then_backup_goes_there() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let backup_dir = temp.path().join("backups");
    let path = copy_fixture("sample.sbd", temp.path());
    let svc = service(Settings {
        backup_dir: Some(backup_dir.clone()),
        ..Settings::default()
    });
    let bundle = svc.load(&path).unwrap();

    // Act
    let backup = svc.save(&bundle, &path).unwrap().expect("backup written");

    // Assert
    assert_eq!(backup.parent().unwrap(), backup_dir.as_path());
    assert!(backups_in(temp.path()).is_empty());
}

#[test]
fn given_backup_disabled_when_save_then_no_backup() {
    let temp = TempDir::new().unwrap();
    let path = copy_fixture("sample.sbd", temp.path());
    let svc = service(Settings {
        backup: false,
        ..Settings::default()
    });
    let bundle = svc.load(&path).unwrap();

    assert!(svc.save(&bundle, &path).unwrap().is_none());
    assert!(backups_in(temp.path()).is_empty());
}

#[test]
fn given_compact_setting_when_save_then_single_line() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("compact.sbd");
    let svc = service(Settings {
        pretty: false,
        ..Settings::default()
    });

    svc.save(&Bundle::new(None), &path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(!text.contains('\n'));
    assert_eq!(text, r#"{"metadata":{"desc":null},"data":[]}"#);
}

// ============================================================
// create
// ============================================================

#[test]
fn given_existing_file_when_create_then_already_exists() {
    let temp = TempDir::new().unwrap();
    let path = copy_fixture("sample.sbd", temp.path());
    let svc = service(Settings::default());

    assert!(matches!(
        svc.create(&path, None),
        Err(ApplicationError::Settings(SettingsError::AlreadyExists(_)))
    ));
}

#[test]
fn given_new_path_when_create_then_empty_bundle_written() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("new.sbd");
    let svc = service(Settings::default());

    svc.create(&path, Some("desc".into())).unwrap();

    let bundle = svc.load(&path).unwrap();
    assert!(bundle.is_empty());
    assert_eq!(bundle.description(), Some("desc"));
}

// ============================================================
// check
// ============================================================

#[test]
fn given_directory_when_check_then_reports_each_bundle_file() {
    // Arrange
    let temp = TempDir::new().unwrap();
    copy_fixture("sample.sbd", temp.path());
    copy_fixture("legacy.sbd", temp.path());
    copy_fixture("invalid/malformed.sbd", temp.path());
    fs::write(temp.path().join("notes.txt"), "ignored").unwrap();
    let svc = service(Settings::default());

    // Act
    let outcomes = svc.check(temp.path()).unwrap();

    // Assert
    assert_eq!(outcomes.len(), 3);
    let failed: Vec<_> = outcomes.iter().filter(|o| !o.is_ok()).collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].path.ends_with("invalid/malformed.sbd"));
    let sample = outcomes
        .iter()
        .find(|o| o.path.ends_with("sample.sbd"))
        .unwrap();
    // Root1, R1-Int, R1-Bool, Group1, G1-String, G1-Null, Root2
    assert_eq!(*sample.result.as_ref().unwrap(), 7);
}

#[test]
fn given_custom_extension_when_check_dir_then_only_matching_files() {
    let temp = TempDir::new().unwrap();
    copy_fixture("sample.sbd", temp.path());
    fs::copy(fixture_path("legacy.sbd"), temp.path().join("legacy.json")).unwrap();
    let svc = service(Settings {
        extension: "json".into(),
        ..Settings::default()
    });

    let outcomes = svc.check_dir(temp.path()).unwrap();

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].path.ends_with("legacy.json"));
    assert!(outcomes[0].is_ok());
}

#[test]
fn given_missing_path_when_check_then_file_not_found() {
    let temp = TempDir::new().unwrap();
    let svc = service(Settings::default());
    assert!(matches!(
        svc.check(&temp.path().join("nope")),
        Err(ApplicationError::Settings(SettingsError::FileNotFound(_)))
    ));
}

// ============================================================
// container wiring
// ============================================================

#[test]
fn given_container_when_using_bundles_then_settings_shared() {
    let container = ServiceContainer::new(Settings {
        extension: "json".into(),
        ..Settings::default()
    });
    assert_eq!(container.bundles().settings().extension, "json");
    assert_eq!(container.settings.extension, "json");
}
