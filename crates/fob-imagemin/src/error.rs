//! Error types for the imagemin pipeline
//!
//! Every variant belongs to one of four families (see [`ErrorKind`]):
//! configuration errors are fatal to construction, everything else is
//! scoped to a single asset or a single output entry.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::codec::CodecError;
use crate::runtime::RuntimeError;

/// Result type alias for imagemin operations.
pub type Result<T> = std::result::Result<T, ImageminError>;

/// Coarse classification of an [`ImageminError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid options, patterns or codec factories. Raised at construction.
    Configuration,
    /// A source file could not be read.
    Read,
    /// A codec rejected an asset.
    Transform,
    /// An output entry could not be written.
    Write,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Read => "read",
            ErrorKind::Transform => "transform",
            ErrorKind::Write => "write",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while configuring or running the imagemin pipeline
#[derive(Error, Debug, Diagnostic)]
pub enum ImageminError {
    /// An option has a value outside its accepted range or shape
    #[error("Invalid option `{field}`: {reason}")]
    #[diagnostic(
        code(imagemin::invalid_option),
        help("Check the imagemin options passed to the plugin")
    )]
    InvalidOption { field: String, reason: String },

    /// An include/exclude/dirs glob failed to compile
    #[error("Invalid glob pattern `{pattern}`: {source}")]
    #[diagnostic(
        code(imagemin::invalid_pattern),
        help("Patterns follow standard glob syntax: `*`, `**`, `?`, `[...]` and `{{a,b}}`")
    )]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// A codec factory rejected its options or was registered incorrectly
    #[error("Codec `{codec}` could not be created: {source}")]
    #[diagnostic(code(imagemin::codec_factory))]
    CodecFactory {
        codec: String,
        #[source]
        source: CodecError,
    },

    /// Configuration file or environment could not be loaded
    #[error("Failed to load imagemin configuration: {message}")]
    #[diagnostic(
        code(imagemin::config_load),
        help("Check imagemin.toml / imagemin.json syntax and IMAGEMIN_* environment variables")
    )]
    ConfigLoad { message: String },

    /// Source asset could not be read from disk
    #[error("Couldn't read asset from disk: {}: {source}", .path.display())]
    #[diagnostic(code(imagemin::read_failed))]
    Read {
        path: PathBuf,
        #[source]
        source: RuntimeError,
    },

    /// A codec failed while optimizing an asset
    #[error("Couldn't optimize image {} with `{codec}`: {source}", .path.display())]
    #[diagnostic(code(imagemin::transform_failed))]
    Transform {
        path: PathBuf,
        codec: String,
        #[source]
        source: CodecError,
    },

    /// An optimized asset could not be written to the output directory
    #[error("Couldn't write optimized asset {}: {source}", .path.display())]
    #[diagnostic(
        code(imagemin::write_failed),
        help("Check disk space and permissions of the output directory")
    )]
    Write {
        path: PathBuf,
        #[source]
        source: RuntimeError,
    },

    /// An output path would land outside the output directory
    #[error("Invalid output path `{path}`: {reason}")]
    #[diagnostic(
        code(imagemin::invalid_output_path),
        help("Output paths must stay within the output directory; check publicPath and fileName")
    )]
    InvalidOutputPath { path: String, reason: String },

    /// Extra directory glob expansion failed
    #[error("Couldn't scan `{pattern}`: {message}")]
    #[diagnostic(code(imagemin::scan_failed))]
    Scan { pattern: String, message: String },
}

impl ImageminError {
    pub fn invalid_option(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_output_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOutputPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Classify this error into one of the four error families.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ImageminError::InvalidOption { .. }
            | ImageminError::InvalidPattern { .. }
            | ImageminError::CodecFactory { .. }
            | ImageminError::ConfigLoad { .. } => ErrorKind::Configuration,
            ImageminError::Read { .. } | ImageminError::Scan { .. } => ErrorKind::Read,
            ImageminError::Transform { .. } => ErrorKind::Transform,
            ImageminError::Write { .. } | ImageminError::InvalidOutputPath { .. } => {
                ErrorKind::Write
            }
        }
    }
}

impl From<figment::Error> for ImageminError {
    fn from(error: figment::Error) -> Self {
        ImageminError::ConfigLoad {
            message: error.to_string(),
        }
    }
}
