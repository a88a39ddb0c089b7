//! YAML snapshot of the whole word store, for backup and for seeding an empty store.

use crate::error::SnapshotError;
use crate::record::WordRecord;
use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all, File};
use std::io::{Read, Write};
use std::path::Path;
use time::format_description::well_known::Rfc3339;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub version: u32,
    #[serde(default)]
    pub created_at: String,
    pub words: Vec<WordRecord>,
}

/// Write `records` sorted by word. Goes through a temp file so a crash never leaves half a snapshot.
pub fn save_snapshot(path: &Path, records: &[WordRecord]) -> Result<(), SnapshotError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            create_dir_all(dir)?;
        }
    }
    let mut words = records.to_vec();
    words.sort_by(|a, b| a.word.cmp(&b.word));
    let snapshot = SnapshotFile {
        version: SNAPSHOT_VERSION,
        created_at: time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
        words,
    };
    let yaml = serde_yaml::to_string(&snapshot)?;

    let tmp = path.with_extension("yaml.tmp");
    let mut f = File::create(&tmp)?;
    f.write_all(yaml.as_bytes())?;
    f.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<Vec<WordRecord>, SnapshotError> {
    let mut f = File::open(path)?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let snapshot: SnapshotFile = serde_yaml::from_str(&buf)?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(snapshot.version));
    }
    Ok(snapshot.words)
}
