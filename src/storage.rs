use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::models::{DailyTask, ProjectTask};
use crate::seed;

/// The two persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    ProjectTasks,
    DailyTasks,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::ProjectTasks, Collection::DailyTasks];

    /// Fixed storage key of the collection.
    pub fn key(&self) -> &'static str {
        match self {
            Collection::ProjectTasks => "taskflow_projects_v1",
            Collection::DailyTasks => "taskflow_daily_v1",
        }
    }
}

/// Minimal string key-value backend the gateway persists through.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> io::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> io::Result<()>;
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// Returns the default data directory.
///
/// The path is determined in the following order:
/// 1. `TASKFLOW_DATA_DIR` environment variable.
/// 2. `~/.local/share/taskflow` (on Linux).
/// 3. `./taskflow` (fallback).
pub fn default_data_dir() -> PathBuf {
    std::env::var("TASKFLOW_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
            p.push("taskflow");
            p
        })
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let mut f = OpenOptions::new().read(true).open(&path)?;
        let mut s = String::new();
        f.read_to_string(&mut s)?;
        Ok(Some(s))
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        let path = self.path_for(key);
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        f.write_all(value.as_bytes())?;
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// In-process backend. Clones share the same entries, so a test can keep a
/// handle and inspect what the store persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
    fail_writes: Rc<Cell<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `set` fail with an I/O error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        if self.fail_writes.get() {
            return Err(io::Error::other("memory store is read-only"));
        }
        self.insert_raw(key, value);
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Loads and saves the two task collections through a key-value backend.
pub struct PersistenceGateway {
    backend: Box<dyn KeyValueStore>,
}

impl PersistenceGateway {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Gateway over JSON files in `dir`.
    pub fn open_dir(dir: impl Into<PathBuf>) -> Self {
        let store = JsonFileStore::new(dir);
        debug!(dir = %store.dir().display(), "using JSON file storage");
        Self::new(store)
    }

    /// Reads a collection. `Ok(None)` means it was never written.
    pub fn load<T: DeserializeOwned>(&self, collection: Collection) -> Result<Option<Vec<T>>> {
        match self.backend.get(collection.key())? {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    /// Overwrites a collection with `items`.
    pub fn save<T: Serialize>(&self, collection: Collection, items: &[T]) -> Result<()> {
        let s = serde_json::to_string_pretty(items)?;
        self.backend.set(collection.key(), &s)?;
        Ok(())
    }

    /// Loads a collection, seeding and persisting `seed` when it is absent.
    ///
    /// Read or parse failures fall back to the seed without persisting it.
    pub fn load_or_seed<T, F>(&self, collection: Collection, seed: F) -> Vec<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Vec<T>,
    {
        match self.load(collection) {
            Ok(Some(items)) => {
                debug!(collection = collection.key(), count = items.len(), "loaded collection");
                items
            }
            Ok(None) => {
                let items = seed();
                info!(collection = collection.key(), count = items.len(), "seeding collection");
                if let Err(e) = self.save(collection, &items) {
                    warn!(collection = collection.key(), error = %e, "failed to persist seed data");
                }
                items
            }
            Err(e) => {
                error!(
                    collection = collection.key(),
                    error = %e,
                    "failed to load collection, using seed data"
                );
                seed()
            }
        }
    }

    pub fn load_project_tasks(&self) -> Vec<ProjectTask> {
        self.load_or_seed(Collection::ProjectTasks, seed::project_tasks)
    }

    pub fn load_daily_tasks(&self, today: NaiveDate) -> Vec<DailyTask> {
        self.load_or_seed(Collection::DailyTasks, || seed::daily_tasks(today))
    }

    /// Deletes both collections; the next load seeds again.
    pub fn reset(&self) -> Result<()> {
        for c in Collection::ALL {
            self.backend.remove(c.key())?;
        }
        Ok(())
    }
}
