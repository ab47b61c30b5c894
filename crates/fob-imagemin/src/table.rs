//! Shared asset table for one build.
//!
//! Maps output paths to the bytes that will be written there. Concurrent
//! asset pipelines insert into it independently; the batch flusher reads it
//! once the module graph is closed.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Thread-safe output path → content store.
#[derive(Debug, Clone, Default)]
pub struct AssetTable {
    inner: Arc<RwLock<FxHashMap<String, Arc<[u8]>>>>,
}

impl AssetTable {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an entry.
    ///
    /// Overwriting with different bytes means two contents collided on the
    /// truncated hash; the later insert wins and a warning is logged.
    pub fn insert(&self, output_path: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        let output_path = output_path.into();
        let bytes = bytes.into();

        let mut inner = self.inner.write();
        if let Some(previous) = inner.get(&output_path) {
            if previous[..] != bytes[..] {
                tracing::warn!(
                    output_path = %output_path,
                    "imagemin: hash collision, different content for the same output path"
                );
            }
        }
        inner.insert(output_path, bytes);
    }

    /// Get the content registered for `output_path`.
    pub fn get(&self, output_path: &str) -> Option<Arc<[u8]>> {
        self.inner.read().get(output_path).cloned()
    }

    /// Snapshot of every entry, sorted by output path.
    pub fn entries(&self) -> Vec<(String, Arc<[u8]>)> {
        let mut entries: Vec<_> = self
            .inner
            .read()
            .iter()
            .map(|(path, bytes)| (path.clone(), Arc::clone(bytes)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Remove and return every entry, sorted by output path.
    pub fn drain_all(&self) -> Vec<(String, Arc<[u8]>)> {
        let mut entries: Vec<_> = self.inner.write().drain().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
