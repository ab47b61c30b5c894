//! Codec capabilities and the codec registry
//!
//! A codec is an opaque `bytes -> bytes` transform for one image format
//! family. Codecs are produced by named [`CodecFactory`] entries; the option
//! resolver invokes every factory exactly once per build configuration and
//! keeps the resulting [`CodecChain`] for the rest of the build.

mod gif;
mod jpeg;
mod png;
mod svg;

pub use self::gif::GifCodec;
pub use jpeg::JpegCodec;
pub use png::PngCodec;
pub use svg::SvgCodec;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::{ImageminError, Result};

/// Built-in codec names, in the order the chain runs them.
pub const JPEGTRAN: &str = "jpegtran";
pub const PNGQUANT: &str = "pngquant";
pub const GIFSICLE: &str = "gifsicle";
pub const SVGO: &str = "svgo";

/// Error raised by a codec factory or a codec transform.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct CodecError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl CodecError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// An optimization capability for one image format family.
///
/// `transform` is only called for input that `matches` accepted. Codecs are
/// CPU-bound and run on the blocking pool, so they must be `Send + Sync`.
pub trait Codec: Send + Sync + fmt::Debug {
    /// Registry name of this codec
    fn name(&self) -> &str;

    /// Content sniffing. Returns `true` when this codec handles `input`.
    fn matches(&self, input: &[u8]) -> bool;

    /// Optimize `input`
    fn transform(&self, input: &[u8]) -> std::result::Result<Vec<u8>, CodecError>;
}

/// Option record handed to a codec factory.
///
/// Thin wrapper over a JSON object so option records stay schema-free until
/// the factory parses them into its own typed settings.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CodecOptions(Map<String, Value>);

impl CodecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shallow merge: every key of `overrides` replaces the same key here.
    /// `null` override values count as absent and never shadow a default.
    pub fn merged_with(&self, overrides: &CodecOptions) -> CodecOptions {
        let mut merged = self.0.clone();
        for (key, value) in &overrides.0 {
            if !value.is_null() {
                merged.insert(key.clone(), value.clone());
            }
        }
        CodecOptions(merged)
    }

    /// Deserialize into a codec's typed settings.
    pub fn parse<T: DeserializeOwned>(&self) -> std::result::Result<T, CodecError> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|e| CodecError::with_source("invalid codec options", e))
    }
}

impl From<Map<String, Value>> for CodecOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

type FactoryFn =
    dyn Fn(&CodecOptions) -> std::result::Result<Arc<dyn Codec>, CodecError> + Send + Sync;

/// Named constructor for a codec capability.
#[derive(Clone)]
pub struct CodecFactory(Arc<FactoryFn>);

impl CodecFactory {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&CodecOptions) -> std::result::Result<Arc<dyn Codec>, CodecError>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(factory))
    }

    /// Wrap a constructor returning a concrete codec type.
    pub fn from_fn<C, F>(build: F) -> Self
    where
        C: Codec + 'static,
        F: Fn(&CodecOptions) -> std::result::Result<C, CodecError> + Send + Sync + 'static,
    {
        Self::new(move |options| {
            let codec: Arc<dyn Codec> = Arc::new(build(options)?);
            Ok(codec)
        })
    }

    pub fn create(&self, options: &CodecOptions) -> std::result::Result<Arc<dyn Codec>, CodecError> {
        (self.0)(options)
    }
}

impl fmt::Debug for CodecFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CodecFactory(..)")
    }
}

/// The four built-in factories, keyed by codec name in chain order.
pub fn builtin_factories() -> IndexMap<String, CodecFactory> {
    let mut factories = IndexMap::new();
    factories.insert(JPEGTRAN.to_string(), CodecFactory::from_fn(JpegCodec::from_options));
    factories.insert(PNGQUANT.to_string(), CodecFactory::from_fn(PngCodec::from_options));
    factories.insert(GIFSICLE.to_string(), CodecFactory::from_fn(GifCodec::from_options));
    factories.insert(SVGO.to_string(), CodecFactory::from_fn(SvgCodec::from_options));
    factories
}

/// Ready-to-run codec capabilities, applied in order.
#[derive(Debug, Clone, Default)]
pub struct CodecChain {
    codecs: Arc<[Arc<dyn Codec>]>,
}

impl CodecChain {
    pub fn new(codecs: Vec<Arc<dyn Codec>>) -> Self {
        Self {
            codecs: codecs.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.codecs.iter().map(|codec| codec.name()).collect()
    }

    /// Pipe `input` through every codec whose sniffing accepts the current
    /// bytes. Each codec sees the previous codec's output.
    pub fn apply(&self, path: &Path, input: Vec<u8>) -> Result<Vec<u8>> {
        let mut bytes = input;
        for codec in self.codecs.iter() {
            if !codec.matches(&bytes) {
                continue;
            }
            bytes = codec
                .transform(&bytes)
                .map_err(|source| ImageminError::Transform {
                    path: path.to_path_buf(),
                    codec: codec.name().to_string(),
                    source,
                })?;
            tracing::trace!(codec = codec.name(), size = bytes.len(), "codec applied");
        }
        Ok(bytes)
    }
}

pub(crate) fn is_jpeg(input: &[u8]) -> bool {
    input.starts_with(&[0xFF, 0xD8, 0xFF])
}

pub(crate) fn is_png(input: &[u8]) -> bool {
    input.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
}

pub(crate) fn is_gif(input: &[u8]) -> bool {
    input.starts_with(b"GIF87a") || input.starts_with(b"GIF89a")
}

pub(crate) fn is_svg(input: &[u8]) -> bool {
    let trimmed = input
        .strip_prefix(&[0xEF, 0xBB, 0xBF])
        .unwrap_or(input)
        .trim_ascii_start();

    let looks_like_markup = trimmed.starts_with(b"<?xml")
        || trimmed.starts_with(b"<svg")
        || trimmed.starts_with(b"<!--")
        || trimmed.starts_with(b"<!DOCTYPE svg");

    looks_like_markup && trimmed.windows(4).any(|window| window == b"<svg")
}
