//! Storage backends for word records.
//!
//! `SledStore` is the writable, file-backed store. `MemoryStore` lives only in the process and is
//! normally seeded from the snapshot; in read-only mode it ignores writes. Both serialize writes
//! to the same word so concurrent offset merges are never lost.

use crate::error::Result;
use crate::record::{StoredEntry, WordRecord};
use parking_lot::RwLock;
use sled::{Db, Tree};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

pub trait WordStore: Send + Sync {
    /// Exact lookup by normalized word.
    fn get(&self, word: &str) -> Result<Option<WordRecord>>;

    /// Insert or merge: offsets are unioned, `definition` overwrites only when `Some`.
    fn upsert(&self, word: &str, offsets: &[u32], definition: Option<&str>) -> Result<WordRecord>;

    fn all(&self) -> Result<Vec<WordRecord>>;

    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Drop every record and load `records` in their place. Also the bootstrap path, so it is
    /// honoured even by read-only stores.
    fn replace_all(&self, records: &[WordRecord]) -> Result<()>;

    /// Reset every definition to "not fetched", keeping offsets. Returns how many were reset.
    fn purge_definitions(&self) -> Result<usize>;

    fn clear(&self) -> Result<()>;

    fn flush(&self) -> Result<()>;

    fn name(&self) -> &str;
}

pub struct SledStore {
    db: Db,
    tree: Tree,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P, lang: &str) -> Result<Self> {
        let db = sled::open(path)?;
        Self::with_db(db, lang)
    }

    /// Store backed by a throwaway database, removed on drop.
    pub fn temporary(lang: &str) -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::with_db(db, lang)
    }

    fn with_db(db: Db, lang: &str) -> Result<Self> {
        let tree = db.open_tree(format!("words/{lang}"))?;
        Ok(Self { db, tree })
    }

    fn decode(value: &[u8]) -> Result<StoredEntry> {
        Ok(bincode::deserialize(value)?)
    }

    /// Read-modify-write of one key through compare-and-swap; a concurrent writer to the same key
    /// forces a re-read. `apply` returns false to leave the key untouched. Missing keys start from
    /// an empty entry only when `apply` changes it.
    fn update<F>(&self, word: &str, mut apply: F) -> Result<Option<StoredEntry>>
    where
        F: FnMut(&mut StoredEntry) -> bool,
    {
        loop {
            let current = self.tree.get(word)?;
            let mut entry = match &current {
                Some(v) => Self::decode(v)?,
                None => StoredEntry::default(),
            };
            if !apply(&mut entry) {
                return Ok(current.map(|_| entry));
            }
            let bytes = bincode::serialize(&entry)?;
            match self.tree.compare_and_swap(word, current, Some(bytes))? {
                Ok(()) => return Ok(Some(entry)),
                Err(_) => continue,
            }
        }
    }
}

impl WordStore for SledStore {
    fn get(&self, word: &str) -> Result<Option<WordRecord>> {
        match self.tree.get(word)? {
            Some(v) => Ok(Some(Self::decode(&v)?.into_record(word.to_string()))),
            None => Ok(None),
        }
    }

    fn upsert(&self, word: &str, offsets: &[u32], definition: Option<&str>) -> Result<WordRecord> {
        let entry = self.update(word, |entry| {
            entry.merge(offsets, definition);
            true
        })?;
        Ok(entry.unwrap_or_default().into_record(word.to_string()))
    }

    fn all(&self) -> Result<Vec<WordRecord>> {
        let mut out = Vec::with_capacity(self.tree.len());
        for kv in self.tree.iter() {
            let (k, v) = kv?;
            let word = String::from_utf8_lossy(&k).into_owned();
            out.push(Self::decode(&v)?.into_record(word));
        }
        Ok(out)
    }

    fn len(&self) -> Result<usize> {
        Ok(self.tree.len())
    }

    fn replace_all(&self, records: &[WordRecord]) -> Result<()> {
        let keep: HashSet<&str> = records.iter().map(|r| r.word.as_str()).collect();
        for kv in self.tree.iter() {
            let (k, v) = kv?;
            if keep.contains(String::from_utf8_lossy(&k).as_ref()) {
                continue;
            }
            // a key rewritten since the scan was written after this replace began; keep it
            let _ = self.tree.compare_and_swap(&k, Some(&v), None as Option<&[u8]>)?;
        }
        for r in records {
            self.tree.insert(r.word.as_bytes(), bincode::serialize(&StoredEntry::from(r))?)?;
        }
        self.flush()
    }

    fn purge_definitions(&self) -> Result<usize> {
        let mut purged = 0usize;
        for key in self.tree.iter().keys() {
            let key = key?;
            let word = String::from_utf8_lossy(&key).into_owned();
            let mut changed = false;
            self.update(&word, |entry| {
                changed = entry.definition.take().is_some();
                changed
            })?;
            if changed {
                purged += 1;
            }
        }
        self.flush()?;
        Ok(purged)
    }

    fn clear(&self) -> Result<()> {
        self.tree.clear()?;
        self.flush()
    }

    fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "sled"
    }
}

#[derive(Default)]
pub struct MemoryStore {
    words: RwLock<BTreeMap<String, StoredEntry>>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_only() -> Self {
        Self { words: RwLock::new(BTreeMap::new()), read_only: true }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }
}

impl WordStore for MemoryStore {
    fn get(&self, word: &str) -> Result<Option<WordRecord>> {
        Ok(self.words.read().get(word).cloned().map(|e| e.into_record(word.to_string())))
    }

    fn upsert(&self, word: &str, offsets: &[u32], definition: Option<&str>) -> Result<WordRecord> {
        if self.read_only {
            tracing::warn!(word = %word, "write ignored by read-only store");
            let mut entry = self.words.read().get(word).cloned().unwrap_or_default();
            entry.merge(offsets, definition);
            return Ok(entry.into_record(word.to_string()));
        }
        let mut words = self.words.write();
        let entry = words.entry(word.to_string()).or_default();
        entry.merge(offsets, definition);
        Ok(entry.clone().into_record(word.to_string()))
    }

    fn all(&self) -> Result<Vec<WordRecord>> {
        Ok(self
            .words
            .read()
            .iter()
            .map(|(w, e)| e.clone().into_record(w.clone()))
            .collect())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.words.read().len())
    }

    fn replace_all(&self, records: &[WordRecord]) -> Result<()> {
        let fresh: BTreeMap<String, StoredEntry> =
            records.iter().map(|r| (r.word.clone(), StoredEntry::from(r))).collect();
        *self.words.write() = fresh;
        Ok(())
    }

    fn purge_definitions(&self) -> Result<usize> {
        if self.read_only {
            tracing::warn!("purge ignored by read-only store");
            return Ok(0);
        }
        let mut words = self.words.write();
        Ok(words.values_mut().filter_map(|e| e.definition.take()).count())
    }

    fn clear(&self) -> Result<()> {
        if self.read_only {
            tracing::warn!("clear ignored by read-only store");
            return Ok(());
        }
        self.words.write().clear();
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        if self.read_only { "memory (read-only)" } else { "memory" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn stores() -> Vec<Box<dyn WordStore>> {
        vec![Box::new(SledStore::temporary("ru").unwrap()), Box::new(MemoryStore::new())]
    }

    #[test]
    fn upsert_merges_offsets_and_keeps_definition() {
        for store in stores() {
            store.upsert("дом", &[3, 1], None).unwrap();
            store.upsert("дом", &[1, 7], Some("<p>house</p>")).unwrap();
            let r = store.upsert("дом", &[2], None).unwrap();
            assert_eq!(r.offsets, vec![1, 2, 3, 7], "{}", store.name());
            assert_eq!(r.definition.as_deref(), Some("<p>house</p>"), "{}", store.name());
            assert_eq!(store.get("дом").unwrap(), Some(r));
            assert_eq!(store.get("кот").unwrap(), None);
        }
    }

    #[test]
    fn purge_keeps_offsets() {
        for store in stores() {
            store.upsert("дом", &[1], Some("<p>house</p>")).unwrap();
            store.upsert("кот", &[4], None).unwrap();
            assert_eq!(store.purge_definitions().unwrap(), 1);
            let r = store.get("дом").unwrap().unwrap();
            assert_eq!(r.offsets, vec![1]);
            assert_eq!(r.definition, None);
            assert_eq!(store.len().unwrap(), 2);
        }
    }

    #[test]
    fn replace_all_and_clear() {
        for store in stores() {
            store.upsert("старое", &[0], None).unwrap();
            let records = vec![
                WordRecord { word: "а".into(), offsets: vec![0], definition: Some(String::new()) },
                WordRecord { word: "б".into(), offsets: vec![2, 1], definition: None },
            ];
            store.replace_all(&records).unwrap();
            assert_eq!(store.len().unwrap(), 2);
            assert_eq!(store.get("старое").unwrap(), None);
            assert_eq!(store.get("б").unwrap().unwrap().offsets, vec![1, 2]);
            store.clear().unwrap();
            assert!(store.is_empty().unwrap());
        }
    }

    #[test]
    fn languages_do_not_share_keys() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let ru = SledStore::with_db(db.clone(), "ru").unwrap();
        let uk = SledStore::with_db(db, "uk").unwrap();
        ru.upsert("кіт", &[0], None).unwrap();
        assert_eq!(uk.get("кіт").unwrap(), None);
    }

    #[test]
    fn read_only_memory_ignores_writes() {
        let store = MemoryStore::read_only();
        store
            .replace_all(&[WordRecord { word: "дом".into(), offsets: vec![1], definition: None }])
            .unwrap();
        let merged = store.upsert("дом", &[5], Some("<p>x</p>")).unwrap();
        assert_eq!(merged.offsets, vec![1, 5]);
        assert_eq!(store.get("дом").unwrap().unwrap().offsets, vec![1]);
        store.clear().unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn purge_racing_upserts_keeps_every_offset() {
        let store = Arc::new(SledStore::temporary("ru").unwrap());
        store.upsert("слово", &[0], Some("<p>x</p>")).unwrap();
        let writer = {
            let s = store.clone();
            std::thread::spawn(move || {
                for i in 1..=300u32 {
                    s.upsert("слово", &[i], Some("<p>x</p>")).unwrap();
                }
            })
        };
        for _ in 0..50 {
            store.purge_definitions().unwrap();
        }
        writer.join().unwrap();
        assert_eq!(store.get("слово").unwrap().unwrap().offsets.len(), 301);
    }

    #[test]
    fn concurrent_upserts_lose_no_offsets() {
        let store: Arc<dyn WordStore> = Arc::new(SledStore::temporary("ru").unwrap());
        let handles: Vec<_> = (0..8u32)
            .map(|t| {
                let s = store.clone();
                std::thread::spawn(move || {
                    for i in 0..25u32 {
                        s.upsert("слово", &[t * 100 + i], None).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.get("слово").unwrap().unwrap().offsets.len(), 200);
    }
}
