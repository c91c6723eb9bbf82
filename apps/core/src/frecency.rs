use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrecencyError {
    #[error("failed to write usage counts to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode usage counts: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Usage counts keyed by boost identifier.
///
/// Counts only grow. The backing file is read on first access and rewritten
/// in full after every recorded use.
#[derive(Debug)]
pub struct FrecencyStore {
    path: Option<PathBuf>,
    counts: Option<HashMap<String, u32>>,
}

impl FrecencyStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            counts: None,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            counts: Some(HashMap::new()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get_all(&mut self) -> &HashMap<String, u32> {
        self.loaded()
    }

    pub fn count(&mut self, id: &str) -> u32 {
        self.loaded().get(id).copied().unwrap_or(0)
    }

    /// Bumps the count for `id` and flushes the whole map.
    ///
    /// The in-memory count is updated even when the flush fails.
    pub fn record_use(
        &mut self,
        id: &str,
        query: &str,
        chosen_index: usize,
    ) -> Result<u32, FrecencyError> {
        if id.is_empty() {
            return Ok(0);
        }

        let counts = self.loaded_mut();
        let count = counts.entry(id.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        let updated = *count;

        tracing::debug!(id, query, chosen_index, count = updated, "recorded use");
        self.flush()?;
        Ok(updated)
    }

    fn loaded(&mut self) -> &HashMap<String, u32> {
        self.loaded_mut()
    }

    fn loaded_mut(&mut self) -> &mut HashMap<String, u32> {
        let path = self.path.as_deref();
        self.counts.get_or_insert_with(|| match path {
            Some(path) => load_counts(path),
            None => HashMap::new(),
        })
    }

    fn flush(&self) -> Result<(), FrecencyError> {
        let (Some(path), Some(counts)) = (self.path.as_deref(), self.counts.as_ref()) else {
            return Ok(());
        };

        let write_error = |source: std::io::Error| FrecencyError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }

        let sorted: BTreeMap<&str, u32> = counts
            .iter()
            .map(|(id, count)| (id.as_str(), *count))
            .collect();
        let encoded = serde_json::to_string_pretty(&sorted)?;

        let staging = path.with_extension("json.tmp");
        std::fs::write(&staging, encoded).map_err(write_error)?;
        std::fs::rename(&staging, path).map_err(write_error)
    }
}

fn load_counts(path: &Path) -> HashMap<String, u32> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no usage counts yet");
            return HashMap::new();
        }
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "usage counts unreadable; starting empty");
            return HashMap::new();
        }
    };

    match serde_json::from_str::<HashMap<String, u32>>(&raw) {
        Ok(counts) => counts,
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "usage counts malformed; starting empty");
            HashMap::new()
        }
    }
}
