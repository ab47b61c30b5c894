//! Batch flusher
//!
//! Writes every asset table entry below the output root. Entries are
//! independent: each one creates its own directory and writes its own file
//! concurrently, and a failure only affects that entry.

use futures::future::join_all;
use path_clean::PathClean;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::error::{ImageminError, Result};
use crate::reporter::{ReportContext, Reporter, Stage};
use crate::runtime::Runtime;

/// Outcome of a flush
#[derive(Debug, Default)]
pub struct FlushReport {
    /// Absolute paths written, sorted
    pub written: Vec<PathBuf>,
    /// Failed entries as `(output path, error)` (already reported)
    pub errors: Vec<(String, ImageminError)>,
    /// True when `emit_files` was off and nothing was attempted
    pub skipped: bool,
}

impl FlushReport {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Resolve a table key to an absolute path under `out_dir`.
///
/// Root and prefix components of the key are ignored, so `/img/a.png` lands
/// at `<out_dir>/img/a.png`. Keys that climb out of `out_dir` are rejected.
pub fn resolve_output_path(out_dir: &Path, output_path: &str) -> Result<PathBuf> {
    if output_path.contains('\0') {
        return Err(ImageminError::invalid_output_path(
            output_path,
            "path contains a null byte",
        ));
    }

    let base = out_dir.clean();
    let relative: PathBuf = Path::new(output_path)
        .components()
        .filter(|component| !matches!(component, Component::RootDir | Component::Prefix(_)))
        .collect();

    if relative.as_os_str().is_empty() {
        return Err(ImageminError::invalid_output_path(output_path, "path is empty"));
    }

    let full_path = base.join(relative).clean();
    if !full_path.starts_with(&base) || full_path == base {
        return Err(ImageminError::invalid_output_path(
            output_path,
            format!(
                "escapes the output directory '{}' (resolved to '{}')",
                base.display(),
                full_path.display()
            ),
        ));
    }

    Ok(full_path)
}

/// Write `entries` under `out_dir`, joining all per-entry writes.
pub async fn flush(
    entries: Vec<(String, Arc<[u8]>)>,
    out_dir: &Path,
    runtime: &Arc<dyn Runtime>,
    reporter: &Arc<dyn Reporter>,
) -> FlushReport {
    let writes = entries.into_iter().map(|(output_path, bytes)| async move {
        let result = write_entry(out_dir, &output_path, &bytes, runtime.as_ref()).await;
        if let Err(error) = &result {
            reporter.report(error, &ReportContext::new(Stage::Write, output_path.clone()));
        }
        (output_path, result)
    });

    let mut report = FlushReport::default();
    for (output_path, result) in join_all(writes).await {
        match result {
            Ok(path) => report.written.push(path),
            Err(error) => report.errors.push((output_path, error)),
        }
    }
    report.written.sort();

    tracing::debug!(
        written = report.written.len(),
        failed = report.errors.len(),
        out_dir = %out_dir.display(),
        "imagemin: flush complete"
    );
    report
}

async fn write_entry(
    out_dir: &Path,
    output_path: &str,
    bytes: &[u8],
    runtime: &dyn Runtime,
) -> Result<PathBuf> {
    let full_path = resolve_output_path(out_dir, output_path)?;

    if let Some(parent) = full_path.parent() {
        runtime
            .create_dir(parent, true)
            .await
            .map_err(|source| ImageminError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    runtime
        .write_file(&full_path, bytes)
        .await
        .map_err(|source| ImageminError::Write {
            path: full_path.clone(),
            source,
        })?;

    Ok(full_path)
}
