// src/store.rs
//! Persisted set of delivered-article fingerprints.
//!
//! On disk: `{ "items": [hash, ...] }`, read wholesale at run start and
//! replaced wholesale at run end (temp file + rename, never appended).

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{error, info};

use crate::error::{RelayError, RelayResult};

/// Identity of an article for dedup purposes: hex SHA-256 of `source::title::link`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn of(source: &str, title: &str, link: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        hasher.update(b"::");
        hasher.update(title.as_bytes());
        hasher.update(b"::");
        hasher.update(link.as_bytes());
        let digest = hasher.finalize();

        let mut out = String::with_capacity(64);
        for b in digest.iter() {
            use std::fmt::Write as _;
            let _ = write!(&mut out, "{:02x}", b);
        }
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    items: Vec<ContentHash>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DedupStore {
    items: BTreeSet<ContentHash>,
}

impl DedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.items.contains(hash)
    }

    /// Returns false if the hash was already present.
    pub fn add(&mut self, hash: ContentHash) -> bool {
        self.items.insert(hash)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Missing file => empty store. An unreadable or corrupt file is logged
    /// and also treated as empty; it gets replaced by the end-of-run save.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(Some(store)) => {
                info!(path = %path.display(), items = store.len(), "dedup store loaded");
                store
            }
            Ok(None) => {
                info!(path = %path.display(), "no dedup store yet, starting empty");
                Self::new()
            }
            Err(e) => {
                error!(error = %e, "dedup store unreadable, starting empty");
                Self::new()
            }
        }
    }

    /// Strict variant of [`DedupStore::load`]: `Ok(None)` when the file is absent.
    pub fn try_load(path: &Path) -> RelayResult<Option<Self>> {
        let content = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(state_err(path, e)),
        };
        let file: StoreFile = serde_json::from_str(&content).map_err(|e| state_err(path, e))?;
        Ok(Some(Self {
            items: file.items.into_iter().collect(),
        }))
    }

    /// Overwrite `path` atomically with the full store.
    pub fn save(&self, path: &Path) -> RelayResult<()> {
        let file = StoreFile {
            items: self.items.iter().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|e| state_err(path, e))?;
        write_atomic(path, json.as_bytes()).map_err(|e| state_err(path, e))
    }
}

/// Write to a sibling temp file, fsync, then rename over the target.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let tmp = tmp_path(path);
    let mut f = fs::File::create(&tmp)?;
    f.write_all(bytes)?;
    f.sync_all()?;
    drop(f);
    fs::rename(&tmp, path)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn state_err(path: &Path, e: impl std::fmt::Display) -> RelayError {
    RelayError::State {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}
