//! In-memory Runtime implementation
//!
//! `MemoryRuntime` keeps every file in a map keyed by normalized path.
//! Directories are tracked explicitly so that writes into a missing parent
//! fail the same way they would on disk.

use async_trait::async_trait;
use parking_lot::RwLock;
use path_clean::PathClean;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{Runtime, RuntimeError, RuntimeResult};

#[derive(Debug, Default)]
struct MemoryFs {
    files: FxHashMap<PathBuf, Vec<u8>>,
    dirs: FxHashSet<PathBuf>,
}

/// Runtime backed entirely by memory
#[derive(Debug, Clone)]
pub struct MemoryRuntime {
    fs: Arc<RwLock<MemoryFs>>,
    cwd: PathBuf,
}

impl MemoryRuntime {
    /// Create an empty runtime rooted at `cwd`.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        let cwd: PathBuf = cwd.into();
        let runtime = Self {
            fs: Arc::new(RwLock::new(MemoryFs::default())),
            cwd: cwd.clean(),
        };
        runtime.insert_dir_chain(&runtime.cwd);
        runtime
    }

    /// Add a file, creating its parent directories.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = self.normalize(path.as_ref());
        if let Some(parent) = path.parent() {
            self.insert_dir_chain(parent);
        }
        self.fs.write().files.insert(path, content.into());
    }

    /// Get the content of a file, if present.
    pub fn file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        let path = self.normalize(path.as_ref());
        self.fs.read().files.get(&path).cloned()
    }

    /// All file paths currently stored, sorted.
    pub fn files(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.fs.read().files.keys().cloned().collect();
        paths.sort();
        paths
    }

    fn normalize(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.clean()
        } else {
            self.cwd.join(path).clean()
        }
    }

    fn insert_dir_chain(&self, dir: &Path) {
        let mut fs = self.fs.write();
        for ancestor in dir.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            fs.dirs.insert(ancestor.to_path_buf());
        }
    }
}

#[async_trait]
impl Runtime for MemoryRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        let normalized = self.normalize(path);
        self.fs
            .read()
            .files
            .get(&normalized)
            .cloned()
            .ok_or(RuntimeError::FileNotFound(normalized))
    }

    async fn write_file(&self, path: &Path, content: &[u8]) -> RuntimeResult<()> {
        let normalized = self.normalize(path);
        let mut fs = self.fs.write();

        if fs.dirs.contains(&normalized) {
            return Err(RuntimeError::Io(format!(
                "Failed to write {}: is a directory",
                normalized.display()
            )));
        }
        if let Some(parent) = normalized.parent() {
            if !fs.dirs.contains(parent) {
                return Err(RuntimeError::Io(format!(
                    "Failed to write {}: parent directory does not exist",
                    normalized.display()
                )));
            }
        }

        fs.files.insert(normalized, content.to_vec());
        Ok(())
    }

    async fn create_dir(&self, path: &Path, recursive: bool) -> RuntimeResult<()> {
        let normalized = self.normalize(path);
        let mut fs = self.fs.write();

        // A file anywhere along the chain blocks directory creation.
        for ancestor in normalized.ancestors() {
            if fs.files.contains_key(ancestor) {
                return Err(RuntimeError::Io(format!(
                    "Failed to create directory {}: {} is a file",
                    normalized.display(),
                    ancestor.display()
                )));
            }
        }

        if recursive {
            for ancestor in normalized.ancestors() {
                if ancestor.as_os_str().is_empty() {
                    break;
                }
                fs.dirs.insert(ancestor.to_path_buf());
            }
            return Ok(());
        }

        let parent_exists = normalized
            .parent()
            .is_none_or(|parent| fs.dirs.contains(parent));
        if !parent_exists {
            return Err(RuntimeError::Io(format!(
                "Failed to create directory {}: parent directory does not exist",
                normalized.display()
            )));
        }
        fs.dirs.insert(normalized);
        Ok(())
    }

    async fn list_files(&self, dir: &Path) -> RuntimeResult<Vec<PathBuf>> {
        let normalized = self.normalize(dir);
        let fs = self.fs.read();

        if fs.files.contains_key(&normalized) {
            return Ok(vec![normalized]);
        }
        if !fs.dirs.contains(&normalized) {
            return Err(RuntimeError::FileNotFound(normalized));
        }

        let mut files: Vec<PathBuf> = fs
            .files
            .keys()
            .filter(|path| path.starts_with(&normalized))
            .cloned()
            .collect();
        files.sort();
        Ok(files)
    }

    fn exists(&self, path: &Path) -> bool {
        let normalized = self.normalize(path);
        let fs = self.fs.read();
        fs.files.contains_key(&normalized) || fs.dirs.contains(&normalized)
    }

    fn get_cwd(&self) -> RuntimeResult<PathBuf> {
        Ok(self.cwd.clone())
    }
}
