use crate::record::DEFAULT_LANG;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which storage backend to open. Chosen explicitly by the caller at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backend {
    /// Writable file-backed store.
    Sled { path: PathBuf },
    /// Process-local store, usually seeded from the snapshot.
    Memory {
        #[serde(default)]
        read_only: bool,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: Backend,
    /// Snapshot used to bootstrap an empty store and as the default dump target.
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
    #[serde(default = "default_lang")]
    pub lang: String,
}

impl StoreConfig {
    /// File-backed store plus snapshot under one data directory.
    pub fn in_dir(paths: &DataPaths) -> Self {
        Self {
            backend: Backend::Sled { path: paths.store() },
            snapshot: Some(paths.snapshot()),
            lang: default_lang(),
        }
    }

    pub fn memory(snapshot: Option<PathBuf>, read_only: bool) -> Self {
        Self { backend: Backend::Memory { read_only }, snapshot, lang: default_lang() }
    }
}

fn default_lang() -> String {
    DEFAULT_LANG.to_string()
}

/// Layout of the data directory.
pub struct DataPaths {
    pub root: PathBuf,
}

impl DataPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn store(&self) -> PathBuf { self.root.join("words.sled") }
    pub fn snapshot(&self) -> PathBuf { self.root.join("words.yaml") }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Minimum spacing between requests that reach the dictionary.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    /// Id of the language heading to keep.
    #[serde(default = "default_section")]
    pub section: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            request_delay_ms: default_request_delay_ms(),
            section: default_section(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }
    pub fn request_delay(&self) -> Duration { Duration::from_millis(self.request_delay_ms) }
}

fn default_base_url() -> String { "https://en.wiktionary.org/wiki/".into() }
fn default_user_agent() -> String { "chitalka/0.1 (personal reading aid)".into() }
fn default_timeout_secs() -> u64 { 12 }
fn default_request_delay_ms() -> u64 { 1000 }
fn default_section() -> String { "Russian".into() }
