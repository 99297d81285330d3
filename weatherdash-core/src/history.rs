//! Search history: a most-recently-used list of cities and its persistence.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{Context, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, WeatherError},
    model::HistoryEntry,
};

/// Name of the single document holding the serialized history.
pub const HISTORY_KEY: &str = "history";

/// Ordered search history, most recent first.
///
/// Entry names are unique; the capacity is enforced by
/// [`History::upsert_most_recent`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History(Vec<HistoryEntry>);

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&HistoryEntry> {
        self.0.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HistoryEntry> {
        self.0.iter()
    }

    pub fn get(&self, name: &str) -> Option<&HistoryEntry> {
        self.0.iter().find(|e| e.name() == name)
    }

    /// Record a search: drop any entry with the same city name, put `entry`
    /// in front and evict from the back past `capacity`. The new entry is
    /// always kept, even when `capacity` is 0.
    ///
    /// Returns a new history; `self` is left as it was.
    pub fn upsert_most_recent(&self, entry: HistoryEntry, capacity: usize) -> History {
        let rest: Vec<HistoryEntry> =
            self.0.iter().filter(|e| e.name() != entry.name()).cloned().collect();

        let mut entries = Vec::with_capacity(rest.len() + 1);
        entries.push(entry);
        entries.extend(rest);
        entries.truncate(capacity.max(1));

        History(entries)
    }

    /// Build a history from entries in the given order, skipping repeated
    /// names and stopping at `capacity`.
    pub fn from_ordered(entries: impl IntoIterator<Item = HistoryEntry>, capacity: usize) -> Self {
        let mut out: Vec<HistoryEntry> = Vec::new();

        for entry in entries {
            if out.len() >= capacity {
                break;
            }
            if out.iter().any(|e| e.name() == entry.name()) {
                continue;
            }
            out.push(entry);
        }

        History(out)
    }

    /// Replace each entry with the matching result of `refreshed`, keeping
    /// order and keys. `None` keeps the existing entry.
    pub fn with_replacements(&self, refreshed: Vec<Option<HistoryEntry>>) -> History {
        let entries = self
            .0
            .iter()
            .zip(refreshed.into_iter().chain(std::iter::repeat(None)))
            .map(|(old, new)| match new {
                Some(new) if new.name() == old.name() => new,
                _ => old.clone(),
            })
            .collect();

        History(entries)
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a HistoryEntry;
    type IntoIter = std::slice::Iter<'a, HistoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Durable storage for the whole history under a single key.
pub trait HistoryStore: Send + Sync {
    /// `Ok(None)` means nothing has been stored yet.
    fn load(&self) -> Result<Option<History>>;

    /// Overwrite the stored history.
    fn save(&self, history: &History) -> Result<()>;

    /// Remove the stored history. Clearing an empty store is not an error.
    fn clear(&self) -> Result<()>;
}

/// History stored as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct FileHistoryStore {
    path: PathBuf,
}

impl FileHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the platform data directory.
    pub fn in_data_dir() -> Result<Self> {
        Self::default_path().map(Self::new).map_err(WeatherError::Persistence)
    }

    pub fn default_path() -> anyhow::Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherdash", "weatherdash")
            .ok_or_else(|| anyhow!("Could not determine platform data directory"))?;

        Ok(dirs.data_dir().join(format!("{HISTORY_KEY}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> anyhow::Result<Option<History>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read history file: {}", self.path.display()))?;

        let history: History = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse history file: {}", self.path.display()))?;

        Ok(Some(history))
    }

    fn write(&self, history: &History) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create history directory: {}", parent.display())
            })?;
        }

        let json =
            serde_json::to_string_pretty(history).context("Failed to serialize history to JSON")?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("Failed to write history temp file: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace history file: {}", self.path.display()))?;

        Ok(())
    }
}

impl HistoryStore for FileHistoryStore {
    fn load(&self) -> Result<Option<History>> {
        let history = self.read().map_err(WeatherError::Persistence)?;
        tracing::debug!(path = %self.path.display(), found = history.is_some(), "Loaded history");
        Ok(history)
    }

    fn save(&self, history: &History) -> Result<()> {
        self.write(history).map_err(WeatherError::Persistence)?;
        tracing::debug!(path = %self.path.display(), entries = history.len(), "Saved history");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WeatherError::Persistence(anyhow::Error::new(e).context(format!(
                "Failed to remove history file: {}",
                self.path.display()
            )))),
        }
    }
}

/// In-process store keeping the serialized document in memory.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    document: Mutex<Option<String>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(history: &History) -> Result<Self> {
        let store = Self::new();
        store.save(history)?;
        Ok(store)
    }

    pub fn is_initialized(&self) -> bool {
        self.document.lock().map(|doc| doc.is_some()).unwrap_or(false)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>> {
        self.document
            .lock()
            .map_err(|_| WeatherError::Persistence(anyhow!("History store lock was poisoned")))
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self) -> Result<Option<History>> {
        let doc = self.lock()?;
        let history = doc
            .as_deref()
            .map(|json| {
                serde_json::from_str(json)
                    .context("Failed to parse stored history")
                    .map_err(WeatherError::Persistence)
            })
            .transpose()?;
        Ok(history)
    }

    fn save(&self, history: &History) -> Result<()> {
        let json = serde_json::to_string(history)
            .context("Failed to serialize history to JSON")
            .map_err(WeatherError::Persistence)?;
        *self.lock()? = Some(json);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.lock()? = None;
        Ok(())
    }
}
