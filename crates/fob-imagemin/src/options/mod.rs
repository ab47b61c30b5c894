//! Imagemin configuration types
//!
//! [`ImageminOptions`] is the user-facing shape: every field is optional so
//! that "not set" (or an explicit `null`) always falls back to the defaults.
//! [`resolve`] turns it into [`ResolvedOptions`], the immutable view the rest
//! of the pipeline works from.

mod defaults;
mod loading;
mod resolve;

pub use defaults::*;
pub use loading::{CONFIG_JSON, CONFIG_TOML, ENV_PREFIX};
pub use resolve::{ResolvedOptions, resolve};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::codec::CodecFactory;

/// Options for the imagemin pipeline
///
/// Keys that are not one of the named fields are treated as per-codec option
/// records (`jpegtran`, `pngquant`, `gifsicle`, `svgo`, or the name of a
/// custom codec registered with [`ImageminOptions::with_plugin`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageminOptions {
    /// Skip optimization; assets are still named, registered and emitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable: Option<bool>,

    /// Log build banners and per-asset size comparisons
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,

    /// Write collected assets to the output directory
    #[serde(alias = "emitFiles", skip_serializing_if = "Option::is_none")]
    pub emit_files: Option<bool>,

    /// Number of hex characters of the content hash used in file names (1-40)
    #[serde(alias = "hashLength", skip_serializing_if = "Option::is_none")]
    pub hash_length: Option<usize>,

    /// Glob patterns selecting candidate assets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<PatternList>,

    /// Glob patterns rejecting assets regardless of `include`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<PatternList>,

    /// Output naming template with `[name]`, `[hash]` and `[extname]`
    #[serde(alias = "fileName", skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    /// Prefix joined onto every output path
    #[serde(alias = "publicPath", skip_serializing_if = "Option::is_none")]
    pub public_path: Option<String>,

    /// Directory structure preservation mode
    #[serde(alias = "preserveTree", skip_serializing_if = "Option::is_none")]
    pub preserve_tree: Option<PreserveTree>,

    /// Extra glob patterns scanned once the module graph is closed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dirs: Option<PatternList>,

    /// Reference root for tree preservation and relative patterns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,

    /// Per-codec option records keyed by codec name
    #[serde(flatten)]
    pub codecs: IndexMap<String, serde_json::Value>,

    /// Codec factories added to (or replacing) the built-in ones
    #[serde(skip)]
    pub plugins: IndexMap<String, CodecFactory>,
}

impl ImageminOptions {
    /// Create options with every field unset
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_disable(mut self, disable: bool) -> Self {
        self.disable = Some(disable);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    pub fn with_emit_files(mut self, emit_files: bool) -> Self {
        self.emit_files = Some(emit_files);
        self
    }

    pub fn with_hash_length(mut self, hash_length: usize) -> Self {
        self.hash_length = Some(hash_length);
        self
    }

    pub fn with_include(mut self, patterns: impl Into<PatternList>) -> Self {
        self.include = Some(patterns.into());
        self
    }

    pub fn with_exclude(mut self, patterns: impl Into<PatternList>) -> Self {
        self.exclude = Some(patterns.into());
        self
    }

    pub fn with_file_name(mut self, template: impl Into<String>) -> Self {
        self.file_name = Some(template.into());
        self
    }

    pub fn with_public_path(mut self, public_path: impl Into<String>) -> Self {
        self.public_path = Some(public_path.into());
        self
    }

    pub fn with_preserve_tree(mut self, preserve_tree: PreserveTree) -> Self {
        self.preserve_tree = Some(preserve_tree);
        self
    }

    pub fn with_dirs(mut self, patterns: impl Into<PatternList>) -> Self {
        self.dirs = Some(patterns.into());
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Override options for one codec
    ///
    /// Keys set here are merged over that codec's defaults only.
    pub fn with_codec_options(
        mut self,
        codec: impl Into<String>,
        options: impl Into<serde_json::Value>,
    ) -> Self {
        self.codecs.insert(codec.into(), options.into());
        self
    }

    /// Register a codec factory under `name`
    ///
    /// A built-in codec with the same name is replaced in place; new names
    /// run after the built-ins.
    pub fn with_plugin(mut self, name: impl Into<String>, factory: CodecFactory) -> Self {
        self.plugins.insert(name.into(), factory);
        self
    }
}

/// One glob pattern or a list of them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PatternRepr", into = "Vec<String>")]
pub struct PatternList(Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum PatternRepr {
    One(String),
    Many(Vec<String>),
}

impl From<PatternRepr> for PatternList {
    fn from(repr: PatternRepr) -> Self {
        match repr {
            PatternRepr::One(pattern) => PatternList::from(pattern),
            PatternRepr::Many(patterns) => PatternList::from(patterns),
        }
    }
}

impl PatternList {
    pub fn patterns(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl From<PatternList> for Vec<String> {
    fn from(list: PatternList) -> Self {
        list.0
    }
}

impl From<Vec<String>> for PatternList {
    fn from(patterns: Vec<String>) -> Self {
        Self(patterns.into_iter().filter(|p| !p.is_empty()).collect())
    }
}

impl From<String> for PatternList {
    fn from(pattern: String) -> Self {
        Self::from(vec![pattern])
    }
}

impl From<&str> for PatternList {
    fn from(pattern: &str) -> Self {
        Self::from(pattern.to_string())
    }
}

impl From<&[&str]> for PatternList {
    fn from(patterns: &[&str]) -> Self {
        Self::from(patterns.iter().map(|p| p.to_string()).collect::<Vec<_>>())
    }
}

impl<const N: usize> From<[&str; N]> for PatternList {
    fn from(patterns: [&str; N]) -> Self {
        Self::from(&patterns[..])
    }
}

/// How an asset's directory structure carries into its output name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PreserveTreeRepr", into = "PreserveTreeRepr")]
pub enum PreserveTree {
    /// Flatten to the bare file stem
    #[default]
    Off,
    /// Keep the directory relative to the working directory
    Cwd,
    /// Keep the directory relative to the given root
    Root(PathBuf),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PreserveTreeRepr {
    Flag(bool),
    Root(String),
}

impl From<PreserveTreeRepr> for PreserveTree {
    fn from(repr: PreserveTreeRepr) -> Self {
        match repr {
            PreserveTreeRepr::Flag(false) => PreserveTree::Off,
            PreserveTreeRepr::Flag(true) => PreserveTree::Cwd,
            PreserveTreeRepr::Root(root) if root.is_empty() => PreserveTree::Off,
            PreserveTreeRepr::Root(root) => PreserveTree::Root(PathBuf::from(root)),
        }
    }
}

impl From<PreserveTree> for PreserveTreeRepr {
    fn from(mode: PreserveTree) -> Self {
        match mode {
            PreserveTree::Off => PreserveTreeRepr::Flag(false),
            PreserveTree::Cwd => PreserveTreeRepr::Flag(true),
            PreserveTree::Root(root) => PreserveTreeRepr::Root(root.to_string_lossy().into_owned()),
        }
    }
}

impl From<bool> for PreserveTree {
    fn from(enabled: bool) -> Self {
        if enabled {
            PreserveTree::Cwd
        } else {
            PreserveTree::Off
        }
    }
}
