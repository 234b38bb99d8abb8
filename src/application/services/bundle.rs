//! Bundle file service
//!
//! Loads, saves and validates bundle documents on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{Bundle, SettingsError};
use crate::infrastructure::traits::FileSystem;

/// Validation result for a single bundle file.
#[derive(Debug)]
pub struct CheckOutcome {
    pub path: PathBuf,
    /// Number of nodes in the bundle, or why it failed to load
    pub result: ApplicationResult<usize>,
}

impl CheckOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Service for reading and writing bundle files.
pub struct BundleService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl BundleService {
    /// Create a new bundle service.
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Read and parse a bundle file.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<Bundle> {
        if !self.fs.exists(path) {
            return Err(SettingsError::FileNotFound(path.to_path_buf()).into());
        }
        let text = self
            .fs
            .read_to_string(path)
            .with_path_context("read bundle", path)?;
        let bundle = Bundle::from_document_text(&text)?;
        debug!("load: {} roots from {}", bundle.len(), path.display());
        Ok(bundle)
    }

    /// Write `bundle` to `path`, backing up an existing file first when enabled.
    ///
    /// Returns the backup path if one was written.
    #[instrument(level = "debug", skip(self, bundle))]
    pub fn save(&self, bundle: &Bundle, path: &Path) -> ApplicationResult<Option<PathBuf>> {
        let text = bundle.to_document_string(self.settings.pretty)?;

        let backup = if self.settings.backup && self.fs.is_file(path) {
            Some(self.backup(path)?)
        } else {
            None
        };

        self.fs
            .ensure_parent(path)
            .with_path_context("create parent directory", path)?;
        self.fs
            .write_atomic(path, &text)
            .with_path_context("write bundle", path)?;
        debug!("save: wrote {} bytes to {}", text.len(), path.display());
        Ok(backup)
    }

    /// Write a new, empty bundle. Refuses to overwrite.
    pub fn create(&self, path: &Path, description: Option<String>) -> ApplicationResult<Bundle> {
        if self.fs.exists(path) {
            return Err(SettingsError::AlreadyExists(path.display().to_string()).into());
        }
        let bundle = Bundle::new(description);
        self.save(&bundle, path)?;
        Ok(bundle)
    }

    /// Copy `path` to a timestamped sibling (or into `backup_dir`).
    pub fn backup(&self, path: &Path) -> ApplicationResult<PathBuf> {
        let stamp = Local::now().format("%Y%m%d%H%M%S").to_string();
        let target = self.backup_path(path, &stamp);
        self.fs
            .ensure_parent(&target)
            .with_path_context("create backup directory", &target)?;
        self.fs
            .copy(path, &target)
            .with_path_context("backup bundle", path)?;
        debug!("backup: {} -> {}", path.display(), target.display());
        Ok(target)
    }

    /// `<dir>/<stem>.bk-<stamp>.<ext>`
    pub fn backup_path(&self, path: &Path, stamp: &str) -> PathBuf {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match path.extension() {
            Some(ext) => format!("{}.bk-{}.{}", stem, stamp, ext.to_string_lossy()),
            None => format!("{}.bk-{}", stem, stamp),
        };
        let dir = self
            .settings
            .backup_dir
            .clone()
            .or_else(|| path.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        dir.join(name)
    }

    /// Validate one bundle file, or every bundle file below a directory.
    pub fn check(&self, path: &Path) -> ApplicationResult<Vec<CheckOutcome>> {
        if !self.fs.exists(path) {
            return Err(SettingsError::FileNotFound(path.to_path_buf()).into());
        }
        if self.fs.is_dir(path) {
            self.check_dir(path)
        } else {
            Ok(vec![self.check_file(path)])
        }
    }

    /// Validate all files with the configured extension below `dir`.
    #[instrument(level = "debug", skip(self))]
    pub fn check_dir(&self, dir: &Path) -> ApplicationResult<Vec<CheckOutcome>> {
        let mut outcomes = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| ApplicationError::OperationFailed {
                context: format!("walk {}", dir.display()),
                source: Box::new(e),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let is_bundle = entry
                .path()
                .extension()
                .is_some_and(|ext| ext == self.settings.extension.as_str());
            if !is_bundle {
                continue;
            }
            outcomes.push(self.check_file(entry.path()));
        }
        debug!("check_dir: {} bundle files", outcomes.len());
        Ok(outcomes)
    }

    fn check_file(&self, path: &Path) -> CheckOutcome {
        let result = self
            .load(path)
            .map(|bundle| bundle.roots().iter().map(|r| r.iter().count()).sum::<usize>());
        if let Err(e) = &result {
            warn!("check: {}: {}", path.display(), e);
        }
        CheckOutcome {
            path: path.to_path_buf(),
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::traits::RealFileSystem;

    fn service(settings: Settings) -> BundleService {
        BundleService::new(Arc::new(RealFileSystem), Arc::new(settings))
    }

    #[test]
    fn test_backup_path_next_to_file() {
        let svc = service(Settings::default());
        let path = svc.backup_path(Path::new("/data/app.sbd"), "20240102030405");
        assert_eq!(path, PathBuf::from("/data/app.bk-20240102030405.sbd"));
    }

    #[test]
    fn test_backup_path_in_backup_dir() {
        let svc = service(Settings {
            backup_dir: Some(PathBuf::from("/backups")),
            ..Settings::default()
        });
        let path = svc.backup_path(Path::new("/data/app"), "20240102030405");
        assert_eq!(path, PathBuf::from("/backups/app.bk-20240102030405"));
    }
}
