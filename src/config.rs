//! Store configuration: backing file, backup directory and cache window.

use eyre::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the backing file path.
pub const TODO_FILE_ENV: &str = "TODO_FILE";

/// Environment variable overriding the backup directory.
pub const BACKUP_DIR_ENV: &str = "TODO_BACKUP_DIR";

/// Default backing file name, next to the executable.
const DEFAULT_TODO_FILE: &str = "todos.json";

/// Default backup directory name, next to the executable.
const DEFAULT_BACKUP_DIR: &str = "backups";

/// Reads within this window after a load are served from memory.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5);

/// Configuration for a [`TodoStore`](crate::TodoStore).
#[derive(Debug, Clone)]
pub struct Config {
    /// JSON document holding every record
    pub todo_file: PathBuf,

    /// Where timestamped backups are written
    pub backup_dir: PathBuf,

    /// Cache freshness window
    pub cache_ttl: Duration,
}

impl Config {
    /// Config with explicit paths and the default cache window.
    pub fn new(todo_file: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            todo_file: todo_file.into(),
            backup_dir: backup_dir.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Config from `TODO_FILE` / `TODO_BACKUP_DIR`, defaulting to paths next
    /// to the running executable.
    pub fn from_env() -> Self {
        let base = install_dir();
        let todo_file = std::env::var_os(TODO_FILE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| base.join(DEFAULT_TODO_FILE));
        let backup_dir = std::env::var_os(BACKUP_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| base.join(DEFAULT_BACKUP_DIR));
        Self::new(todo_file, backup_dir)
    }

    /// Set the cache freshness window.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Replace the backing file path.
    pub fn with_todo_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.todo_file = path.into();
        self
    }

    /// Replace the backup directory.
    pub fn with_backup_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.backup_dir = path.into();
        self
    }

    /// Create the backup directory if it is missing.
    pub fn ensure_backup_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.backup_dir)
            .with_context(|| format!("Failed to create backup directory {}", self.backup_dir.display()))
    }

    /// Directory containing the backing file.
    pub fn data_dir(&self) -> &Path {
        self.todo_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }
}

fn install_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_uses_default_ttl() {
        let config = Config::new("/tmp/t/todos.json", "/tmp/t/backups");
        assert_eq!(config.cache_ttl, DEFAULT_CACHE_TTL);
        assert_eq!(config.data_dir(), Path::new("/tmp/t"));
    }

    #[test]
    fn test_builder_overrides() {
        let config = Config::new("a.json", "b")
            .with_cache_ttl(Duration::ZERO)
            .with_todo_file("c.json")
            .with_backup_dir("d");
        assert_eq!(config.cache_ttl, Duration::ZERO);
        assert_eq!(config.todo_file, PathBuf::from("c.json"));
        assert_eq!(config.backup_dir, PathBuf::from("d"));
        assert_eq!(config.data_dir(), Path::new("."));
    }

    #[test]
    fn test_ensure_backup_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::new(temp_dir.path().join("todos.json"), temp_dir.path().join("nested/backups"));
        config.ensure_backup_dir().unwrap();
        assert!(config.backup_dir.is_dir());
    }
}
