//! Timestamped copies of the backing file.

use chrono::Local;
use eyre::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Backup file name prefix.
const BACKUP_PREFIX: &str = "todos_backup_";

/// Suffix used when an unparseable backing file is set aside.
pub const CORRUPTED_SUFFIX: &str = "corrupted";

/// Suffix used for on-demand backups.
pub const MANUAL_SUFFIX: &str = "manual";

/// Copies the backing file into the backup directory.
#[derive(Debug, Clone)]
pub struct BackupManager {
    source: PathBuf,
    backup_dir: PathBuf,
}

impl BackupManager {
    pub fn new(source: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            backup_dir: backup_dir.into(),
        }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Copy the backing file to `todos_backup_<YYYYMMDD_HHMMSS>[_suffix].json`.
    ///
    /// Returns `Ok(None)` when there is no backing file to copy.
    pub fn backup(&self, suffix: Option<&str>) -> Result<Option<PathBuf>> {
        if !self.source.exists() {
            return Ok(None);
        }

        let path = self.backup_dir.join(backup_file_name(suffix));

        fs::create_dir_all(&self.backup_dir).context("Failed to create backup directory")?;
        fs::copy(&self.source, &path)
            .with_context(|| format!("Failed to copy {} to {}", self.source.display(), path.display()))?;

        log::info!("Created backup at {}", path.display());
        Ok(Some(path))
    }

    /// Backups currently on disk, oldest name first.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        for entry in fs::read_dir(&self.backup_dir).context("Failed to read backup directory")? {
            let path = entry.context("Failed to read backup directory entry")?.path();
            let is_backup = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(BACKUP_PREFIX) && n.ends_with(".json"));
            if is_backup {
                backups.push(path);
            }
        }
        backups.sort();
        Ok(backups)
    }
}

fn backup_file_name(suffix: Option<&str>) -> String {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    match suffix {
        Some(s) if !s.is_empty() => format!("{}{}_{}.json", BACKUP_PREFIX, timestamp, s),
        _ => format!("{}{}.json", BACKUP_PREFIX, timestamp),
    }
}
