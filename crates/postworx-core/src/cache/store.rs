use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::CacheKey;

/// Suffix given to a cache file that could not be parsed.
const CORRUPT_SUFFIX: &str = "corrupt";

/// On-disk layout. Entries live under the `shifts` namespace; any other
/// top-level namespace is carried through untouched.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    #[serde(default)]
    shifts: BTreeMap<String, String>,
    #[serde(flatten)]
    other: BTreeMap<String, serde_json::Value>,
}

/// Persistent roster cache for shifts that have already happened.
///
/// The whole file is rewritten after every mutation.
pub struct ShiftCache {
    path: PathBuf,
    entries: BTreeMap<CacheKey, String>,
    /// Keys that did not parse; kept verbatim so a save does not drop them.
    unrecognized: BTreeMap<String, String>,
    namespaces: BTreeMap<String, serde_json::Value>,
}

impl ShiftCache {
    /// Load the cache at `path`, creating an empty one if none exists.
    ///
    /// A file that cannot be parsed is moved aside and replaced with an empty
    /// cache; every shift is then simply fetched again.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut cache = Self {
            path,
            entries: BTreeMap::new(),
            unrecognized: BTreeMap::new(),
            namespaces: BTreeMap::new(),
        };

        if !cache.path.exists() {
            debug!(path = %cache.path.display(), "No shift cache yet, creating");
            cache.save()?;
            return Ok(cache);
        }

        let contents = std::fs::read(&cache.path)
            .with_context(|| format!("Failed to read shift cache: {}", cache.path.display()))?;

        // Invalid UTF-8 surfaces here as a parse error, same as malformed JSON
        let file: CacheFile = match serde_json::from_slice(&contents) {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %cache.path.display(), error = %e, "Shift cache unreadable, starting empty");
                cache.set_aside_corrupt();
                cache.save()?;
                return Ok(cache);
            }
        };

        for (raw_key, entry) in file.shifts {
            match CacheKey::parse(&raw_key) {
                Some(key) => {
                    cache.entries.insert(key, entry);
                }
                None => {
                    warn!(key = %raw_key, "Ignoring unrecognized shift cache key");
                    cache.unrecognized.insert(raw_key, entry);
                }
            }
        }
        cache.namespaces = file.other;

        debug!(entries = cache.entries.len(), "Shift cache loaded");
        Ok(cache)
    }

    fn set_aside_corrupt(&self) {
        let mut target = self.path.clone().into_os_string();
        target.push(".");
        target.push(CORRUPT_SUFFIX);
        if let Err(e) = std::fs::rename(&self.path, &target) {
            warn!(error = %e, "Failed to move corrupt shift cache aside");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.entries.keys()
    }

    pub fn get(&self, key: &CacheKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or overwrite an entry and persist the cache.
    pub fn put(&mut self, key: CacheKey, entry: String) -> Result<()> {
        debug!(key = %key, "Caching shift roster");
        self.entries.insert(key, entry);
        self.save()
    }

    /// Remove every entry dated before `cutoff`. Returns how many were removed.
    pub fn evict(&mut self, cutoff: NaiveDate) -> Result<usize> {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.labor_date >= cutoff);
        let removed = before - self.entries.len();

        if removed > 0 {
            info!(removed, cutoff = %cutoff, "Evicted old shifts from cache");
            self.save()?;
        }
        Ok(removed)
    }

    /// Write the full cache to disk.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut shifts = self.unrecognized.clone();
        shifts.extend(
            self.entries
                .iter()
                .map(|(key, entry)| (key.to_string(), entry.clone())),
        );

        let file = CacheFile {
            shifts,
            other: self.namespaces.clone(),
        };
        let mut contents = serde_json::to_string_pretty(&file)?;
        contents.push('\n');

        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write shift cache: {}", self.path.display()))?;
        Ok(())
    }
}
