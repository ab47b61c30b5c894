//! Extra-directory scanning
//!
//! Each `dirs` pattern is split into a literal base directory and a glob.
//! The base is listed through the [`Runtime`] and every file matching the
//! glob becomes an asset.

use globset::GlobMatcher;
use path_clean::PathClean;
use std::path::{Path, PathBuf};

use crate::error::{ImageminError, Result};
use crate::filter::{compile, to_slash};
use crate::pipeline::ProcessedAsset;
use crate::runtime::Runtime;

const GLOB_META: &[char] = &['*', '?', '[', ']', '{', '}'];

/// Outcome of a `dirs` scan
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Every file the patterns enumerated, sorted and de-duplicated
    pub files: Vec<PathBuf>,
    /// Assets that made it into the table
    pub processed: Vec<ProcessedAsset>,
    /// Read, transform and walk failures (already reported)
    pub errors: Vec<ImageminError>,
}

impl ScanReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone)]
struct ScanPattern {
    pattern: String,
    base: PathBuf,
    matcher: GlobMatcher,
}

/// Compiled `dirs` patterns
#[derive(Debug, Clone, Default)]
pub struct DirScanner {
    patterns: Vec<ScanPattern>,
}

impl DirScanner {
    pub fn new(patterns: &[String], cwd: &Path) -> Result<Self> {
        let cwd_str = to_slash(&cwd.to_string_lossy());
        let patterns = patterns
            .iter()
            .map(|pattern| {
                Ok(ScanPattern {
                    pattern: pattern.clone(),
                    base: literal_base(pattern, cwd),
                    matcher: compile(pattern, &cwd_str)?.compile_matcher(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Enumerate matching files. Listing errors are collected, never fatal.
    pub async fn enumerate(&self, runtime: &dyn Runtime) -> (Vec<PathBuf>, Vec<ImageminError>) {
        let mut files = Vec::new();
        let mut errors = Vec::new();

        for scan in &self.patterns {
            if !runtime.exists(&scan.base) {
                tracing::debug!(pattern = %scan.pattern, base = %scan.base.display(), "imagemin: scan base missing");
                continue;
            }

            let listed = match runtime.list_files(&scan.base).await {
                Ok(listed) => listed,
                Err(e) => {
                    errors.push(ImageminError::Scan {
                        pattern: scan.pattern.clone(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            files.extend(
                listed
                    .into_iter()
                    .filter(|path| scan.matcher.is_match(to_slash(&path.to_string_lossy()))),
            );
        }

        files.sort();
        files.dedup();
        (files, errors)
    }
}

/// Directory made of the pattern's components before the first glob
/// metacharacter, resolved against `cwd`.
fn literal_base(pattern: &str, cwd: &Path) -> PathBuf {
    let pattern = to_slash(pattern);
    let mut literal = Vec::new();
    for part in pattern.split('/') {
        if part.contains(GLOB_META) {
            break;
        }
        literal.push(part);
    }

    let prefix = literal.join("/");
    if prefix.is_empty() && pattern.starts_with('/') {
        return PathBuf::from("/");
    }
    cwd.join(prefix).clean()
}
