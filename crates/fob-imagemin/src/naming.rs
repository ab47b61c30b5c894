//! Output name derivation
//!
//! Output paths are a pure function of the bytes that will be written, the
//! asset's logical name and extension, and the naming options.

use path_clean::PathClean;
use regex::{Captures, Regex};
use sha1::{Digest, Sha1};
use std::path::{Component, Path, PathBuf};

use crate::error::{ImageminError, Result};
use crate::filter::to_slash;

const PLACEHOLDER: &str = r"(?i)\[(name|hash|extname)\]";

/// Hex SHA-1 of `bytes`, truncated to `length` characters.
pub fn content_hash(bytes: &[u8], length: usize) -> String {
    let mut hash = hex::encode(Sha1::digest(bytes));
    hash.truncate(length);
    hash
}

/// Extension including the leading dot, or an empty string.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Logical asset name: the file stem, optionally prefixed by its directory
/// relative to `tree_root`.
///
/// Directories outside `tree_root` are clamped: the shared prefix is removed
/// and the `..` steps that would climb out of the root are dropped.
pub fn asset_name(source: &Path, tree_root: Option<&Path>) -> String {
    let stem = source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let Some(root) = tree_root else {
        return stem;
    };

    let dir = source.parent().map(Path::clean).unwrap_or_default();
    let root = root.clean();

    let dir_parts: Vec<Component<'_>> = dir.components().collect();
    let root_parts: Vec<Component<'_>> = root.components().collect();
    let shared = dir_parts
        .iter()
        .zip(&root_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for part in &dir_parts[shared..] {
        if let Component::Normal(segment) = part {
            relative.push(segment);
        }
    }

    if relative.as_os_str().is_empty() {
        stem
    } else {
        format!("{}/{}", to_slash(&relative.to_string_lossy()), stem)
    }
}

/// Derives output paths from content and the naming template
#[derive(Debug, Clone)]
pub struct NameDeriver {
    template: String,
    public_path: String,
    hash_length: usize,
    placeholder: Regex,
}

impl NameDeriver {
    pub fn new(
        template: impl Into<String>,
        public_path: impl Into<String>,
        hash_length: usize,
    ) -> Result<Self> {
        let placeholder = Regex::new(PLACEHOLDER)
            .map_err(|e| ImageminError::invalid_option("file_name", e.to_string()))?;

        Ok(Self {
            template: template.into(),
            public_path: public_path.into(),
            hash_length,
            placeholder,
        })
    }

    /// Output path for an asset whose final content is `bytes`.
    pub fn derive(&self, bytes: &[u8], name: &str, extension: &str) -> String {
        let hash = content_hash(bytes, self.hash_length);
        let file_name = self
            .placeholder
            .replace_all(&self.template, |caps: &Captures<'_>| {
                match caps[1].to_ascii_lowercase().as_str() {
                    "name" => name.to_string(),
                    "hash" => hash.clone(),
                    _ => extension.to_string(),
                }
            });

        join_public_path(&self.public_path, &file_name)
    }
}

/// Join with `/` and normalize, keeping exactly one separator at the seam.
fn join_public_path(public_path: &str, file_name: &str) -> String {
    let joined = if public_path.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", to_slash(public_path), to_slash(file_name))
    };
    to_slash(&PathBuf::from(joined).clean().to_string_lossy())
}
