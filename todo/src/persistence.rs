//! Durable storage of the to-do collection.
//!
//! Only `todos` is persisted, as one JSON blob `{"todos": [...]}` under the
//! root key [`ROOT_KEY`]. Search, sort and fetch status are transient and
//! reset on restart.

use crate::error::PersistenceError;
use crate::types::{Todo, TodoState};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

/// Key the collection blob is stored under
pub const ROOT_KEY: &str = "persist:root";

/// String blob storage keyed by name
pub trait KeyValueStore: Send + Sync {
    /// Read the blob stored under `key`, if any
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, PersistenceError>>;

    /// Store `value` under `key`, replacing any previous blob
    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, Result<(), PersistenceError>>;

    /// Delete the blob under `key`; deleting a missing key succeeds
    fn remove<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), PersistenceError>>;
}

/// One file per key inside a data directory
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write leaves the previous blob intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store files under `dir`; the directory is created on first write
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the blobs
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`
    ///
    /// `[A-Za-z0-9-]` is kept as is and every other byte becomes `_` plus
    /// two hex digits, so distinct keys never share a file. `persist:root`
    /// lives in `persist_3Aroot.json`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        let mut name = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                name.push(char::from(byte));
            } else {
                name.push_str(&format!("_{byte:02X}"));
            }
        }
        self.dir.join(format!("{name}.json"))
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> PersistenceError + '_ {
    move |source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl KeyValueStore for FileStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, PersistenceError>> {
        Box::pin(async move {
            let path = self.path_for(key);
            match tokio::fs::read_to_string(&path).await {
                Ok(blob) => Ok(Some(blob)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(io_error(&path)(e)),
            }
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, Result<(), PersistenceError>> {
        Box::pin(async move {
            tokio::fs::create_dir_all(&self.dir)
                .await
                .map_err(io_error(&self.dir))?;

            let path = self.path_for(key);
            let tmp = path.with_extension("json.tmp");
            tokio::fs::write(&tmp, value).await.map_err(io_error(&tmp))?;
            tokio::fs::rename(&tmp, &path).await.map_err(io_error(&path))
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), PersistenceError>> {
        Box::pin(async move {
            let path = self.path_for(key);
            match tokio::fs::remove_file(&path).await {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(io_error(&path)(e)),
                _ => Ok(()),
            }
        })
    }
}

/// In-memory blob store for tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blobs: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, PersistenceError>> {
        Box::pin(async move { Ok(self.blobs.lock().await.get(key).cloned()) })
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, Result<(), PersistenceError>> {
        Box::pin(async move {
            self.blobs.lock().await.insert(key.to_string(), value);
            Ok(())
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), PersistenceError>> {
        Box::pin(async move {
            self.blobs.lock().await.remove(key);
            Ok(())
        })
    }
}

/// Persisted shape of the durable state
#[derive(Debug, Deserialize)]
struct PersistedState {
    todos: Vec<Todo>,
}

/// Loads and saves the to-do collection through a [`KeyValueStore`]
#[derive(Clone)]
pub struct Persistence {
    backend: Arc<dyn KeyValueStore>,
    key: String,
}

impl Persistence {
    /// Persist under [`ROOT_KEY`] in `backend`
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            key: ROOT_KEY.to_string(),
        }
    }

    /// Use a different key than [`ROOT_KEY`]
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Read the persisted collection; nothing stored yields an empty list
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the backend fails or the blob is
    /// malformed.
    pub async fn load(&self) -> Result<Vec<Todo>, PersistenceError> {
        let Some(blob) = self.backend.get(&self.key).await? else {
            tracing::debug!(key = %self.key, "No persisted todos");
            return Ok(Vec::new());
        };

        let persisted: PersistedState = serde_json::from_str(&blob).map_err(PersistenceError::Decode)?;
        tracing::debug!(key = %self.key, count = persisted.todos.len(), "Loaded persisted todos");
        Ok(persisted.todos)
    }

    /// Load and wrap the collection in a fresh state
    ///
    /// # Errors
    ///
    /// Same as [`Persistence::load`].
    pub async fn rehydrate(&self) -> Result<TodoState, PersistenceError> {
        Ok(TodoState::with_todos(self.load().await?))
    }

    /// Write the collection
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if encoding or the backend fails.
    pub async fn save(&self, todos: &[Todo]) -> Result<(), PersistenceError> {
        #[derive(Serialize)]
        struct Borrowed<'a> {
            todos: &'a [Todo],
        }

        let blob = serde_json::to_string(&Borrowed { todos }).map_err(PersistenceError::Encode)?;
        self.backend.set(&self.key, blob).await?;
        tracing::debug!(key = %self.key, count = todos.len(), "Saved todos");
        Ok(())
    }

    /// Delete the persisted collection
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the backend fails.
    pub async fn clear(&self) -> Result<(), PersistenceError> {
        self.backend.remove(&self.key).await
    }
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// Save `todos` whenever the observed state changes them
///
/// The collection current at the time of the call counts as saved. Each
/// published collection is compared with the last saved one and written
/// only on difference. The task ends once every store handle is dropped,
/// after writing the final state if it was not saved yet. Write failures
/// are logged and retried on the next change.
pub fn spawn_autosave(persistence: Persistence, mut states: watch::Receiver<TodoState>) -> JoinHandle<()> {
    let mut saved = states.borrow_and_update().todos.clone();

    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let todos = states.borrow_and_update().todos.clone();
            save_if_changed(&persistence, &mut saved, todos).await;
        }

        let last = states.borrow().todos.clone();
        save_if_changed(&persistence, &mut saved, last).await;
        tracing::debug!("Autosave stopped");
    })
}

async fn save_if_changed(persistence: &Persistence, saved: &mut Vec<Todo>, todos: Vec<Todo>) {
    if *saved == todos {
        return;
    }

    match persistence.save(&todos).await {
        Ok(()) => *saved = todos,
        Err(error) => tracing::error!(error = %error, "Failed to persist todos"),
    }
}
