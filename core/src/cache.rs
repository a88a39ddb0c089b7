use crate::config::{Backend, StoreConfig};
use crate::error::{Result, StoreError};
use crate::persist::{load_snapshot, save_snapshot};
use crate::record::{StoredEntry, WordRecord};
use crate::store::{MemoryStore, SledStore, WordStore};
use crate::tokenizer::normalize_word;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Word → record cache. The only component that writes to durable storage; everyone else gets
/// copies of records.
pub struct DefinitionCache {
    store: Box<dyn WordStore>,
    snapshot: Option<PathBuf>,
}

impl DefinitionCache {
    /// Open the backend named by `config`. Call [`initialize`](Self::initialize) before serving.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let store: Box<dyn WordStore> = match &config.backend {
            Backend::Sled { path } => Box::new(SledStore::open(path, &config.lang)?),
            Backend::Memory { read_only: true } => Box::new(MemoryStore::read_only()),
            Backend::Memory { read_only: false } => Box::new(MemoryStore::new()),
        };
        Ok(Self::with_store(store, config.snapshot.clone()))
    }

    pub fn with_store(store: Box<dyn WordStore>, snapshot: Option<PathBuf>) -> Self {
        Self { store, snapshot }
    }

    /// Seed an empty store from the snapshot. A missing or malformed snapshot leaves the store
    /// empty; only storage failures are errors.
    pub fn initialize(&self) -> Result<usize> {
        let count = self.store.len()?;
        if count > 0 {
            info!(backend = self.store.name(), count, "word store ready");
            return Ok(0);
        }
        let Some(path) = self.snapshot.as_deref() else {
            return Ok(0);
        };
        if !path.exists() {
            info!(path = %path.display(), "no snapshot, starting with an empty store");
            return Ok(0);
        }
        match load_snapshot(path) {
            Ok(records) => {
                let records = normalize_records(records);
                self.store.replace_all(&records)?;
                info!(path = %path.display(), count = records.len(), "restored word store from snapshot");
                Ok(records.len())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "snapshot unreadable, starting with an empty store");
                Ok(0)
            }
        }
    }

    pub fn close(&self) -> Result<()> {
        self.store.flush()
    }

    /// Look up a word in any casing; absence is `Ok(None)`.
    pub fn get(&self, word: &str) -> Result<Option<WordRecord>> {
        let key = normalize_word(word);
        if key.is_empty() {
            return Ok(None);
        }
        self.store.get(&key)
    }

    /// Upsert. Offsets merge as a set union; a `None` definition never erases a cached one.
    pub fn put(&self, word: &str, offsets: &[u32], definition: Option<&str>) -> Result<WordRecord> {
        let key = normalize_word(word);
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        self.store.upsert(&key, offsets, definition)
    }

    pub fn get_all(&self) -> Result<Vec<WordRecord>> {
        self.store.all()
    }

    pub fn len(&self) -> Result<usize> {
        self.store.len()
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.store.is_empty()
    }

    /// Forget every cached definition so the next lookup re-fetches; occurrence history stays.
    pub fn purge_definitions(&self) -> Result<usize> {
        let purged = self.store.purge_definitions()?;
        info!(purged, "purged cached definitions");
        Ok(purged)
    }

    /// Explicit bulk clear. The only way records are ever deleted.
    pub fn clear(&self) -> Result<()> {
        self.store.clear()?;
        info!("cleared word store");
        Ok(())
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot.as_deref()
    }

    /// Export every record to `path`, or to the configured snapshot when `path` is `None`.
    pub fn dump_snapshot(&self, path: Option<&Path>) -> Result<PathBuf> {
        let target = self.target(path)?;
        let records = self.store.all()?;
        save_snapshot(&target, &records)?;
        info!(path = %target.display(), count = records.len(), "dumped word store");
        Ok(target)
    }

    /// Replace the store's contents with the snapshot at `path` (or the configured one).
    pub fn restore_snapshot(&self, path: Option<&Path>) -> Result<usize> {
        let target = self.target(path)?;
        let records = normalize_records(load_snapshot(&target)?);
        self.store.replace_all(&records)?;
        info!(path = %target.display(), count = records.len(), "restored word store");
        Ok(records.len())
    }

    fn target(&self, path: Option<&Path>) -> Result<PathBuf> {
        path.or(self.snapshot.as_deref())
            .map(Path::to_path_buf)
            .ok_or_else(|| StoreError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "no snapshot path configured")))
    }
}

/// Snapshots may be edited by hand: re-key every record by its normalized word, folding
/// records that collide and dropping ones with nothing left.
fn normalize_records(records: Vec<WordRecord>) -> Vec<WordRecord> {
    let mut merged: BTreeMap<String, StoredEntry> = BTreeMap::new();
    for r in records {
        let key = normalize_word(&r.word);
        if key.is_empty() {
            warn!(word = %r.word, "dropping snapshot record with an empty word");
            continue;
        }
        merged.entry(key).or_default().merge(&r.offsets, r.definition.as_deref());
    }
    merged.into_iter().map(|(word, entry)| entry.into_record(word)).collect()
}
