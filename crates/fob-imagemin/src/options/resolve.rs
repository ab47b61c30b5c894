use indexmap::IndexMap;
use path_clean::PathClean;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{
    DEFAULT_FILE_NAME, DEFAULT_HASH_LENGTH, DEFAULT_INCLUDE, ImageminOptions, MAX_HASH_LENGTH,
    PatternList, PreserveTree, default_codec_options,
};
use crate::codec::{Codec, CodecChain, CodecError, CodecOptions, builtin_factories};
use crate::error::{ImageminError, Result};

/// Fully resolved, immutable configuration for one build
#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    pub disable: bool,
    pub verbose: bool,
    pub emit_files: bool,
    pub hash_length: usize,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub file_name: String,
    pub public_path: String,
    pub preserve_tree: PreserveTree,
    pub dirs: Vec<String>,
    /// Absolute reference root, fixed for the lifetime of the build
    pub cwd: PathBuf,
    /// Effective option record per codec, in chain order
    pub codec_options: IndexMap<String, CodecOptions>,
    /// Instantiated codecs, in chain order
    pub codecs: CodecChain,
}

impl ResolvedOptions {
    /// Root that tree-preserving names are made relative to, if any.
    pub fn tree_root(&self) -> Option<PathBuf> {
        match &self.preserve_tree {
            PreserveTree::Off => None,
            PreserveTree::Cwd => Some(self.cwd.clone()),
            PreserveTree::Root(root) => Some(self.cwd.join(root).clean()),
        }
    }
}

/// Merge user options over the defaults and instantiate every codec.
///
/// `fallback_cwd` is used when `options.cwd` is unset, and as the base for a
/// relative `options.cwd`.
pub fn resolve(options: ImageminOptions, fallback_cwd: &Path) -> Result<ResolvedOptions> {
    let ImageminOptions {
        disable,
        verbose,
        emit_files,
        hash_length,
        include,
        exclude,
        file_name,
        public_path,
        preserve_tree,
        dirs,
        cwd,
        codecs: codec_records,
        plugins,
    } = options;

    let hash_length = hash_length.unwrap_or(DEFAULT_HASH_LENGTH);
    if !(1..=MAX_HASH_LENGTH).contains(&hash_length) {
        return Err(ImageminError::invalid_option(
            "hash_length",
            format!("must be between 1 and {MAX_HASH_LENGTH}, got {hash_length}"),
        ));
    }

    let file_name = file_name.unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
    if file_name.trim().is_empty() {
        return Err(ImageminError::invalid_option(
            "file_name",
            "template must not be empty",
        ));
    }

    let cwd = match cwd {
        Some(cwd) => fallback_cwd.join(cwd).clean(),
        None => fallback_cwd.clean(),
    };

    let mut factories = builtin_factories();
    for (name, factory) in plugins {
        if name.trim().is_empty() {
            return Err(ImageminError::CodecFactory {
                codec: name,
                source: CodecError::new("codec name must not be empty"),
            });
        }
        factories.insert(name, factory);
    }

    let mut codec_options = IndexMap::with_capacity(factories.len());
    let mut instances: Vec<Arc<dyn Codec>> = Vec::with_capacity(factories.len());
    for (name, factory) in &factories {
        let overrides = codec_overrides(name, codec_records.get(name))?;
        let effective = default_codec_options(name).merged_with(&overrides);

        let codec = factory
            .create(&effective)
            .map_err(|source| ImageminError::CodecFactory {
                codec: name.clone(),
                source,
            })?;

        instances.push(codec);
        codec_options.insert(name.clone(), effective);
    }

    for name in codec_records.keys() {
        if !factories.contains_key(name) {
            tracing::debug!(codec = %name, "imagemin: ignoring options for unregistered codec");
        }
    }

    Ok(ResolvedOptions {
        disable: disable.unwrap_or(false),
        verbose: verbose.unwrap_or(false),
        emit_files: emit_files.unwrap_or(true),
        hash_length,
        include: include
            .unwrap_or_else(|| PatternList::from(DEFAULT_INCLUDE))
            .into_inner(),
        exclude: exclude.map(PatternList::into_inner).unwrap_or_default(),
        file_name,
        public_path: public_path.unwrap_or_default(),
        preserve_tree: preserve_tree.unwrap_or_default(),
        dirs: dirs.map(PatternList::into_inner).unwrap_or_default(),
        cwd,
        codec_options,
        codecs: CodecChain::new(instances),
    })
}

/// User record for one codec with `null` keys dropped.
fn codec_overrides(name: &str, record: Option<&Value>) -> Result<CodecOptions> {
    match record {
        None | Some(Value::Null) => Ok(CodecOptions::new()),
        Some(Value::Object(map)) => Ok(map
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect::<serde_json::Map<_, _>>()
            .into()),
        Some(other) => Err(ImageminError::invalid_option(
            name,
            format!("codec options must be a table, got `{other}`"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CodecFactory, GIFSICLE, JPEGTRAN, PNGQUANT, SVGO};
    use crate::error::ErrorKind;
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Debug)]
    struct Passthrough(&'static str);

    impl Codec for Passthrough {
        fn name(&self) -> &str {
            self.0
        }

        fn matches(&self, _input: &[u8]) -> bool {
            false
        }

        fn transform(&self, input: &[u8]) -> std::result::Result<Vec<u8>, CodecError> {
            Ok(input.to_vec())
        }
    }

    fn cwd() -> PathBuf {
        PathBuf::from("/project")
    }

    #[test]
    fn test_defaults() {
        let resolved = resolve(ImageminOptions::default(), &cwd()).unwrap();

        assert!(!resolved.disable);
        assert!(!resolved.verbose);
        assert!(resolved.emit_files);
        assert_eq!(resolved.hash_length, 16);
        assert_eq!(resolved.include, vec!["**/*.{svg,png,jpg,jpeg,gif}"]);
        assert!(resolved.exclude.is_empty());
        assert_eq!(resolved.file_name, "[name]-[hash][extname]");
        assert_eq!(resolved.public_path, "");
        assert_eq!(resolved.preserve_tree, PreserveTree::Off);
        assert!(resolved.dirs.is_empty());
        assert_eq!(resolved.cwd, PathBuf::from("/project"));
        assert_eq!(resolved.codecs.names(), vec![JPEGTRAN, PNGQUANT, GIFSICLE, SVGO]);
    }

    #[test]
    fn test_codec_merge_is_per_codec() {
        let options = ImageminOptions::new()
            .with_codec_options(SVGO, json!({ "precision": 3 }))
            .with_codec_options(PNGQUANT, json!({ "strip": false }));

        let resolved = resolve(options, &cwd()).unwrap();

        let svgo = &resolved.codec_options[SVGO];
        assert_eq!(svgo.get("precision"), Some(&json!(3)));
        assert_eq!(svgo.get("multipass"), Some(&json!(true)));
        assert!(svgo.get("strip").is_none());

        let pngquant = &resolved.codec_options[PNGQUANT];
        assert_eq!(pngquant.get("strip"), Some(&json!(false)));
        assert_eq!(pngquant.get("level"), Some(&json!(2)));

        assert_eq!(resolved.codec_options[GIFSICLE].get("optimizationLevel"), Some(&json!(3)));
    }

    #[test]
    fn test_null_values_do_not_shadow_defaults() {
        let options: ImageminOptions = serde_json::from_value(json!({
            "hashLength": null,
            "gifsicle": { "optimizationLevel": null },
            "svgo": null,
        }))
        .unwrap();

        let resolved = resolve(options, &cwd()).unwrap();
        assert_eq!(resolved.hash_length, 16);
        assert_eq!(resolved.codec_options[GIFSICLE].get("optimizationLevel"), Some(&json!(3)));
        assert_eq!(resolved.codec_options[SVGO].get("precision"), Some(&json!(1)));
    }

    #[test]
    fn test_hash_length_bounds() {
        for bad in [0, 41] {
            let err = resolve(ImageminOptions::new().with_hash_length(bad), &cwd()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Configuration);
        }
        assert!(resolve(ImageminOptions::new().with_hash_length(40), &cwd()).is_ok());
        assert!(resolve(ImageminOptions::new().with_hash_length(1), &cwd()).is_ok());
    }

    #[test]
    fn test_invalid_codec_options_fail_construction() {
        let options = ImageminOptions::new().with_codec_options(GIFSICLE, json!({ "optimizationLevel": 9 }));
        let err = resolve(options, &cwd()).unwrap_err();
        assert!(matches!(err, ImageminError::CodecFactory { ref codec, .. } if codec == GIFSICLE));

        let options = ImageminOptions::new().with_codec_options(JPEGTRAN, json!(42));
        let err = resolve(options, &cwd()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_plugins_replace_and_extend() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_factory = Arc::clone(&seen);

        let options = ImageminOptions::new()
            .with_codec_options("webp", json!({ "quality": 50 }))
            .with_plugin(
                PNGQUANT,
                CodecFactory::new(|_| Ok(Arc::new(Passthrough("custom-png")) as Arc<dyn Codec>)),
            )
            .with_plugin(
                "webp",
                CodecFactory::new(move |options| {
                    seen_by_factory.lock().push(options.clone());
                    Ok(Arc::new(Passthrough("webp")) as Arc<dyn Codec>)
                }),
            );

        let resolved = resolve(options, &cwd()).unwrap();
        assert_eq!(
            resolved.codecs.names(),
            vec![JPEGTRAN, "custom-png", GIFSICLE, SVGO, "webp"]
        );

        // Each factory ran exactly once, with its own merged options.
        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].get("quality"), Some(&json!(50)));
    }

    #[test]
    fn test_empty_plugin_name_is_rejected() {
        let options = ImageminOptions::new().with_plugin(
            "",
            CodecFactory::new(|_| Ok(Arc::new(Passthrough("x")) as Arc<dyn Codec>)),
        );
        let err = resolve(options, &cwd()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_failing_factory() {
        let options = ImageminOptions::new().with_plugin(
            "avif",
            CodecFactory::new(|_| Err(CodecError::new("encoder unavailable"))),
        );
        let err = resolve(options, &cwd()).unwrap_err();
        assert!(err.to_string().contains("avif"));
        assert!(err.to_string().contains("encoder unavailable"));
    }

    #[test]
    fn test_cwd_and_tree_root() {
        let options = ImageminOptions::new()
            .with_cwd("app")
            .with_preserve_tree(PreserveTree::Root(PathBuf::from("./src/../assets")));

        let resolved = resolve(options, &cwd()).unwrap();
        assert_eq!(resolved.cwd, PathBuf::from("/project/app"));
        assert_eq!(resolved.tree_root(), Some(PathBuf::from("/project/app/assets")));

        let resolved = resolve(ImageminOptions::new().with_preserve_tree(true.into()), &cwd()).unwrap();
        assert_eq!(resolved.tree_root(), Some(PathBuf::from("/project")));
    }
}
