//! Filesystem runtime abstraction
//!
//! The pipeline never touches `std::fs` directly. Reads, directory listing,
//! directory creation and writes go through the `Runtime` trait so hosts can plug in virtual
//! filesystems and tests can run entirely in memory.

mod memory;
mod native;

pub use memory::MemoryRuntime;
pub use native::NativeRuntime;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// Other runtime error
    #[error("Runtime error: {0}")]
    Other(String),
}

/// Platform runtime trait
///
/// Implementations must be cheap to share across concurrently running asset
/// pipelines (`Arc<dyn Runtime>`).
#[async_trait]
pub trait Runtime: Send + Sync + std::fmt::Debug {
    /// Read a file from the filesystem
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    /// Write a file to the filesystem, replacing any existing content
    async fn write_file(&self, path: &Path, content: &[u8]) -> RuntimeResult<()>;

    /// Create a directory
    async fn create_dir(&self, path: &Path, recursive: bool) -> RuntimeResult<()>;

    /// Every regular file below `dir`, sorted. A file path lists itself.
    async fn list_files(&self, dir: &Path) -> RuntimeResult<Vec<PathBuf>>;

    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Get the current working directory
    fn get_cwd(&self) -> RuntimeResult<PathBuf>;
}
