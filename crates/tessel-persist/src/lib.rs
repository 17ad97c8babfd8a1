// Layout persistence: a primary store with a local fallback, plus a
// background saver so writes stay off the mutation path.

mod config;
mod saver;
mod store;

pub use config::{PersistConfig, DEFAULT_APP_DIR, DEFAULT_STORAGE_KEY, DEFAULT_STORE_FILE};
pub use saver::LayoutSaver;
pub use store::{HostStore, KeyValueStore, LocalStore, MemoryStore, StoreError};

use tessel_core::LayoutSnapshot;

// ──────────────────────────────────────────────
// PersistenceBridge
// ──────────────────────────────────────────────

/// Saves and loads the layout snapshot under one key.
///
/// Saves go to the primary store and fall back to the secondary one when the
/// primary fails. Loads try the primary first; a miss, a read error, or an
/// unparseable value falls through to the secondary. Failures are logged and
/// never surface to callers.
pub struct PersistenceBridge {
    key: String,
    primary: Box<dyn KeyValueStore>,
    fallback: Box<dyn KeyValueStore>,
}

impl PersistenceBridge {
    pub fn new(
        key: impl Into<String>,
        primary: Box<dyn KeyValueStore>,
        fallback: Box<dyn KeyValueStore>,
    ) -> Self {
        Self {
            key: key.into(),
            primary,
            fallback,
        }
    }

    /// Host store in the config dir, local store in the data dir.
    pub fn from_config(config: &PersistConfig) -> Self {
        Self::new(
            config.storage_key.clone(),
            Box::new(HostStore::locate(&config.app_dir, &config.store_file)),
            Box::new(LocalStore::locate(&config.app_dir)),
        )
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn save(&self, snapshot: &LayoutSnapshot) {
        let value = match serde_json::to_value(snapshot) {
            Ok(v) => v,
            Err(e) => {
                log::error!("Failed to serialize editor layout: {}", e);
                return;
            }
        };
        match self.primary.set(&self.key, value.clone()) {
            Ok(()) => return,
            Err(e) => log::warn!(
                "Saving layout to {} failed, using {}: {}",
                self.primary.name(),
                self.fallback.name(),
                e
            ),
        }
        if let Err(e) = self.fallback.set(&self.key, value) {
            log::error!("Failed to persist editor layout: {}", e);
        }
    }

    pub fn load(&self) -> Option<LayoutSnapshot> {
        self.load_from(self.primary.as_ref())
            .or_else(|| self.load_from(self.fallback.as_ref()))
    }

    fn load_from(&self, store: &dyn KeyValueStore) -> Option<LayoutSnapshot> {
        let value = match store.get(&self.key) {
            Ok(Some(v)) => v,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Reading layout from {} failed: {}", store.name(), e);
                return None;
            }
        };
        match serde_json::from_value(value) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                log::warn!("Ignoring malformed layout in {}: {}", store.name(), e);
                None
            }
        }
    }
}
