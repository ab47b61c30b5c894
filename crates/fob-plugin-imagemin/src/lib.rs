//! Rolldown plugin for image optimization
//!
//! Wraps [`fob_imagemin::Imagemin`] in the Rolldown plugin lifecycle. Image
//! imports selected by the include/exclude filter are optimized during
//! `load` and replaced by a module exporting the emitted asset URL. During
//! `generate_bundle` the extra `dirs` are scanned and every collected asset is
//! written below the bundler's output directory (`dir`, or the directory of
//! `file`). The directory given to the constructor is only used when the
//! bundler configures neither.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use fob_plugin_imagemin::FobImageminPlugin;
//! use fob_imagemin::ImageminOptions;
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ImageminOptions::new()
//!     .with_public_path("assets")
//!     .with_exclude("src/raw/**");
//!
//! // Use with your Rolldown bundler configuration
//! let plugin = Arc::new(FobImageminPlugin::new(options, "dist")?);
//! # Ok(())
//! # }
//! ```

use anyhow::Context;
use fob_imagemin::{FlushReport, Imagemin, ImageminOptions, ScanReport};
use rolldown_common::ModuleType;
use rolldown_plugin::{
    HookBuildStartArgs, HookGenerateBundleArgs, HookLoadArgs, HookLoadOutput, HookLoadReturn,
    HookNoopReturn, HookUsage, Plugin, PluginContext,
};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Rolldown plugin that optimizes and emits imported images
///
/// # Architecture
///
/// ```text
/// image import → load() → read → codecs → hash name → asset table → URL module
/// build_start() → reset scan barrier
/// generate_bundle() → scan dirs (once per build) → write asset table to output dir
/// ```
#[derive(Debug, Clone)]
pub struct FobImageminPlugin {
    imagemin: Arc<Imagemin>,
    out_dir: PathBuf,
    scan: Arc<Mutex<Arc<OnceCell<ScanReport>>>>,
}

impl FobImageminPlugin {
    /// Create a plugin; `out_dir` is the fallback output directory
    ///
    /// Option errors (bad patterns, out-of-range values, failing codec
    /// factories) surface here rather than mid-build.
    pub fn new(options: ImageminOptions, out_dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let imagemin = Imagemin::new(options).context("Invalid imagemin options")?;
        Ok(Self::with_imagemin(imagemin, out_dir))
    }

    /// Wrap an already configured pipeline (custom runtime, reporter or cwd)
    pub fn with_imagemin(imagemin: Imagemin, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            imagemin: Arc::new(imagemin),
            out_dir: out_dir.into(),
            scan: Arc::new(Mutex::new(Arc::new(OnceCell::new()))),
        }
    }

    pub fn imagemin(&self) -> &Imagemin {
        &self.imagemin
    }

    /// Output directory used when the bundler configures none
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Start a new build: print the banner and arm a fresh `dirs` scan.
    pub fn begin_build(&self) {
        self.imagemin.build_start();
        *self.scan.lock() = Arc::new(OnceCell::new());
    }

    /// Scan `dirs` (at most once per build) and flush the asset table to `out_dir`.
    ///
    /// All writes run to completion before an error is returned, and the error
    /// lists every entry that failed.
    pub async fn finish(&self, out_dir: &Path) -> anyhow::Result<FlushReport> {
        let cell = Arc::clone(&*self.scan.lock());
        let scan = cell
            .get_or_init(|| async { self.imagemin.build_end().await })
            .await;
        if !scan.is_success() {
            tracing::warn!(
                failed = scan.errors.len(),
                "[fob-imagemin] some scanned assets were skipped"
            );
        }

        let report = self.imagemin.write_bundle(out_dir).await;
        if report.is_success() {
            return Ok(report);
        }

        let failures = report
            .errors
            .iter()
            .map(|(output_path, error)| format!("  {output_path}: {error}"))
            .collect::<Vec<_>>()
            .join("\n");
        Err(anyhow::anyhow!(
            "Failed to write {} imagemin asset(s) to {}:\n{}",
            report.errors.len(),
            out_dir.display(),
            failures
        ))
    }
}

impl Plugin for FobImageminPlugin {
    fn name(&self) -> Cow<'static, str> {
        "fob-imagemin".into()
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::BuildStart | HookUsage::Load | HookUsage::GenerateBundle
    }

    fn build_start(
        &self,
        _ctx: &PluginContext,
        _args: &HookBuildStartArgs<'_>,
    ) -> impl std::future::Future<Output = HookNoopReturn> + Send {
        let plugin = self.clone();

        async move {
            plugin.begin_build();
            Ok(())
        }
    }

    /// Replace accepted image modules with a URL-exporting JS module
    ///
    /// - `Ok(None)` - rejected by the filter, let Rolldown handle it
    /// - `Ok(Some(output))` - asset registered, JS module returned
    /// - `Err(e)` - this asset failed to read or optimize
    fn load(
        &self,
        _ctx: &PluginContext,
        args: &HookLoadArgs<'_>,
    ) -> impl std::future::Future<Output = HookLoadReturn> + Send {
        let id = args.id.to_string();
        let imagemin = Arc::clone(&self.imagemin);

        async move {
            let Some(code) = imagemin
                .load(&id)
                .await
                .with_context(|| format!("Failed to optimize image: {id}"))?
            else {
                return Ok(None);
            };

            Ok(Some(HookLoadOutput {
                code: code.into(),
                module_type: Some(ModuleType::Js),
                ..Default::default()
            }))
        }
    }

    fn generate_bundle(
        &self,
        ctx: &PluginContext,
        _args: &mut HookGenerateBundleArgs<'_>,
    ) -> impl std::future::Future<Output = HookNoopReturn> + Send {
        let options = ctx.options();
        let out_dir = output_root(
            options.dir.as_deref(),
            options.file.as_deref(),
            &options.cwd,
            &self.out_dir,
        );
        let plugin = self.clone();

        async move {
            plugin.finish(&out_dir).await?;
            Ok(())
        }
    }
}

/// Directory assets are written to.
///
/// `dir` wins, then the directory of `file`; relative values resolve against
/// `cwd`. Without either, `fallback` is used as is.
pub fn output_root(dir: Option<&str>, file: Option<&str>, cwd: &Path, fallback: &Path) -> PathBuf {
    let configured = match (dir, file) {
        (Some(dir), _) => Some(PathBuf::from(dir)),
        (None, Some(file)) => Some(
            Path::new(file)
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        ),
        (None, None) => None,
    };

    match configured {
        Some(root) if root.is_absolute() => root,
        Some(root) => cwd.join(root),
        None => fallback.to_path_buf(),
    }
}
