// Key-value backends for the editor layout.
// HostStore mirrors a native app store (one JSON document holding many keys),
// LocalStore is the local-only fallback (one file per key).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unsupported(&'static str),
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored JSON is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait KeyValueStore: Send {
    /// Short label used in log lines.
    fn name(&self) -> &'static str;
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// Write through a sibling temp file so a crash never leaves half a document.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

// ──────────────────────────────────────────────
// HostStore
// ──────────────────────────────────────────────

pub struct HostStore {
    path: Option<PathBuf>,
}

impl HostStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// `<config_dir>/<app_dir>/<file>`, or an unusable store when the platform
    /// has no config directory.
    pub fn locate(app_dir: &str, file: &str) -> Self {
        Self {
            path: dirs::config_dir().map(|dir| dir.join(app_dir).join(file)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn require_path(&self) -> Result<&Path, StoreError> {
        self.path
            .as_deref()
            .ok_or(StoreError::Unsupported("no config directory"))
    }

    fn read_document(path: &Path) -> Result<Map<String, Value>, StoreError> {
        if !path.exists() {
            return Ok(Map::new());
        }
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

impl KeyValueStore for HostStore {
    fn name(&self) -> &'static str {
        "host store"
    }

    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.require_path()?;
        let mut document = Self::read_document(path)?;
        Ok(document.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let path = self.require_path()?;
        let mut document = match Self::read_document(path) {
            Ok(doc) => doc,
            Err(StoreError::Json(e)) => {
                log::warn!("Replacing malformed store {}: {}", path.display(), e);
                Map::new()
            }
            Err(e) => return Err(e),
        };
        document.insert(key.to_string(), value);
        let json = serde_json::to_string_pretty(&document)?;
        write_atomic(path, json.as_bytes())
    }
}

// ──────────────────────────────────────────────
// LocalStore
// ──────────────────────────────────────────────

pub struct LocalStore {
    dir: Option<PathBuf>,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// `<data_local_dir>/<app_dir>/local-storage/`.
    pub fn locate(app_dir: &str) -> Self {
        Self {
            dir: dirs::data_local_dir().map(|dir| dir.join(app_dir).join("local-storage")),
        }
    }

    /// File backing `key`. Characters outside `[A-Za-z0-9._-]` become `_`.
    pub fn key_path(&self, key: &str) -> Option<PathBuf> {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.as_ref().map(|dir| dir.join(format!("{}.json", name)))
    }

    fn require_key_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        self.key_path(key)
            .ok_or(StoreError::Unsupported("no local data directory"))
    }
}

impl KeyValueStore for LocalStore {
    fn name(&self) -> &'static str {
        "local store"
    }

    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.require_key_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&data)?))
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let path = self.require_key_path(key)?;
        let json = serde_json::to_string(&value)?;
        write_atomic(&path, json.as_bytes())
    }
}

// ──────────────────────────────────────────────
// MemoryStore
// ──────────────────────────────────────────────

/// In-process store. Clones share the same entries, so a test can keep a
/// handle while the bridge owns another.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory store"
    }

    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Unsupported("memory store poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Unsupported("memory store poisoned"))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}
