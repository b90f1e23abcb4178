//! Storage layer: the JSON backing file plus an in-memory snapshot cache.

use crate::backup::{BackupManager, CORRUPTED_SUFFIX};
use crate::config::Config;
use crate::types::Todo;
use eyre::{Context, Result};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Most recently loaded record set and when it was loaded.
#[derive(Debug)]
pub struct Cache {
    snapshot: Option<Vec<Todo>>,
    loaded_at: Option<Instant>,
    ttl: Duration,
}

impl Cache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            snapshot: None,
            loaded_at: None,
            ttl,
        }
    }

    /// The snapshot, if one exists and is inside the freshness window.
    pub fn fresh(&self) -> Option<&[Todo]> {
        match (&self.snapshot, self.loaded_at) {
            (Some(todos), Some(at)) if at.elapsed() < self.ttl => Some(todos),
            _ => None,
        }
    }

    /// Replace the snapshot and restart the freshness window.
    pub fn store(&mut self, todos: Vec<Todo>) {
        self.snapshot = Some(todos);
        self.loaded_at = Some(Instant::now());
    }

    /// Drop the snapshot so the next read goes to disk.
    pub fn invalidate(&mut self) {
        self.snapshot = None;
        self.loaded_at = None;
    }
}

/// Handle on the backing file, its backups and the read cache.
pub struct Storage {
    path: PathBuf,
    backups: BackupManager,
    cache: Cache,
}

impl Storage {
    pub fn new(config: &Config) -> Self {
        Self {
            path: config.todo_file.clone(),
            backups: BackupManager::new(&config.todo_file, &config.backup_dir),
            cache: Cache::new(config.cache_ttl),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    /// Load every record.
    ///
    /// Serves the cache when it is fresh and `force_reload` is false. Never
    /// fails: a missing file is an empty store, an unparseable file is backed
    /// up with the `corrupted` suffix and treated as empty, and any other read
    /// error is logged and treated as empty.
    pub fn load(&mut self, force_reload: bool) -> Vec<Todo> {
        if !force_reload && let Some(todos) = self.cache.fresh() {
            let todos = todos.to_vec();
            self.cache.store(todos.clone());
            return todos;
        }

        let todos = match fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str::<Vec<Todo>>(&content) {
                Ok(todos) => todos,
                Err(e) => {
                    log::error!("Todo file {} is not valid JSON: {}", self.path.display(), e);
                    match self.backups.backup(Some(CORRUPTED_SUFFIX)) {
                        Ok(Some(path)) => log::warn!("Corrupted todo file preserved at {}", path.display()),
                        Ok(None) => {}
                        Err(e) => log::error!("Failed to back up corrupted todo file: {:#}", e),
                    }
                    Vec::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("Todo file not found at {}, starting empty", self.path.display());
                Vec::new()
            }
            Err(e) => {
                log::error!("Error loading todos from {}: {}", self.path.display(), e);
                Vec::new()
            }
        };

        self.cache.store(todos.clone());
        todos
    }

    /// Replace the backing file with `todos`.
    ///
    /// A backup of the current file is attempted first; its outcome does not
    /// gate the write. The cache is only updated once the write succeeded.
    pub fn save(&mut self, todos: &[Todo]) -> Result<()> {
        if let Err(e) = self.backups.backup(None) {
            log::warn!("Pre-write backup failed, writing anyway: {:#}", e);
        }

        let json = serde_json::to_string_pretty(todos).context("Failed to serialize todos")?;
        write_replace(&self.path, json.as_bytes())?;

        self.cache.store(todos.to_vec());
        Ok(())
    }
}

/// Write through a sibling temp file and rename it over `path`.
fn write_replace(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create todo file directory")?;
    }

    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let result = (|| -> Result<()> {
        let mut file = File::create(&tmp_path).context("Failed to create temporary todo file")?;
        file.write_all(contents).context("Failed to write todo file")?;
        file.sync_all().context("Failed to sync todo file")?;
        fs::rename(&tmp_path, path).context("Failed to replace todo file")?;
        Ok(())
    })();

    if result.is_err() {
        fs::remove_file(&tmp_path).ok();
    }
    result
}
