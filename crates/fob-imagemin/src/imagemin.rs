//! Build lifecycle driver
//!
//! [`Imagemin`] owns everything resolved for one build configuration and
//! exposes the host signals (build start, module load, graph closed, bundle
//! written) as plain async methods. Bundler adapters are thin wrappers
//! around it.

use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{ImageminError, Result};
use crate::filter::InclusionFilter;
use crate::flush::{FlushReport, flush};
use crate::naming::NameDeriver;
use crate::options::{ImageminOptions, ResolvedOptions, resolve};
use crate::pipeline::{AssetPipeline, ProcessedAsset, module_source};
use crate::reporter::{ReportContext, Reporter, Stage, TracingReporter};
use crate::runtime::{NativeRuntime, Runtime};
use crate::scan::{DirScanner, ScanReport};
use crate::table::AssetTable;

/// Image optimization pipeline for one build configuration
#[derive(Debug)]
pub struct Imagemin {
    options: ResolvedOptions,
    filter: InclusionFilter,
    scanner: DirScanner,
    pipeline: AssetPipeline,
    runtime: Arc<dyn Runtime>,
    reporter: Arc<dyn Reporter>,
}

/// Builder for [`Imagemin`]
#[derive(Debug)]
pub struct ImageminBuilder {
    options: ImageminOptions,
    runtime: Option<Arc<dyn Runtime>>,
    reporter: Option<Arc<dyn Reporter>>,
    cwd: Option<PathBuf>,
}

impl ImageminBuilder {
    /// Filesystem used for reads and writes (default: [`NativeRuntime`])
    pub fn runtime(mut self, runtime: Arc<dyn Runtime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Error channel (default: [`TracingReporter`])
    pub fn reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Working directory; otherwise read once from the runtime
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Resolve options, compile patterns and instantiate codecs.
    pub fn build(self) -> Result<Imagemin> {
        let runtime: Arc<dyn Runtime> = match self.runtime {
            Some(runtime) => runtime,
            None => Arc::new(NativeRuntime::new()),
        };
        let reporter: Arc<dyn Reporter> = match self.reporter {
            Some(reporter) => reporter,
            None => Arc::new(TracingReporter),
        };

        let fallback_cwd = match self.cwd {
            Some(cwd) => cwd,
            None => runtime
                .get_cwd()
                .map_err(|e| ImageminError::invalid_option("cwd", e.to_string()))?,
        };

        let options = resolve(self.options, &fallback_cwd)?;
        let filter = InclusionFilter::new(&options.include, &options.exclude, &options.cwd)?;
        let scanner = DirScanner::new(&options.dirs, &options.cwd)?;
        let deriver = NameDeriver::new(
            options.file_name.clone(),
            options.public_path.clone(),
            options.hash_length,
        )?;

        let pipeline = AssetPipeline::new(
            Arc::clone(&runtime),
            Arc::clone(&reporter),
            AssetTable::new(),
            deriver,
            options.codecs.clone(),
            options.disable,
            options.verbose,
            options.cwd.clone(),
            options.tree_root(),
        );

        tracing::debug!(
            cwd = %options.cwd.display(),
            codecs = ?options.codecs.names(),
            "imagemin: configured"
        );

        Ok(Imagemin {
            options,
            filter,
            scanner,
            pipeline,
            runtime,
            reporter,
        })
    }
}

impl Imagemin {
    /// Build with the native runtime and tracing reporter.
    pub fn new(options: ImageminOptions) -> Result<Self> {
        Self::builder(options).build()
    }

    pub fn builder(options: ImageminOptions) -> ImageminBuilder {
        ImageminBuilder {
            options,
            runtime: None,
            reporter: None,
            cwd: None,
        }
    }

    pub fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    pub fn table(&self) -> &AssetTable {
        self.pipeline.table()
    }

    /// Build-start banner.
    pub fn build_start(&self) {
        if !self.options.verbose {
            return;
        }
        if self.options.disable {
            tracing::info!("imagemin: Skipping image optimizations.");
        } else {
            tracing::info!("imagemin: Optimizing images...");
        }
    }

    /// Whether the module `id` is handled by this plugin.
    pub fn accepts(&self, id: &str) -> bool {
        self.filter.accepts(id)
    }

    /// Module source for `id`, or `None` when the filter rejects it.
    pub async fn load(&self, id: &str) -> Result<Option<String>> {
        if !self.accepts(id) {
            return Ok(None);
        }

        let asset = self.pipeline.process(Path::new(id)).await?;
        Ok(Some(module_source(&asset.output_path)))
    }

    /// Process one file regardless of the filter.
    pub async fn process(&self, path: impl AsRef<Path>) -> Result<ProcessedAsset> {
        self.pipeline.process(path.as_ref()).await
    }

    /// Scan `dirs` and process every file found.
    pub async fn build_end(&self) -> ScanReport {
        if self.scanner.is_empty() {
            return ScanReport::default();
        }

        let (files, walk_errors) = self.scanner.enumerate(self.runtime.as_ref()).await;

        for error in &walk_errors {
            if let ImageminError::Scan { pattern, .. } = error {
                self.reporter
                    .report(error, &ReportContext::new(Stage::Scan, pattern.clone()));
            }
        }

        tracing::debug!(files = files.len(), "imagemin: scanned extra directories");

        let results = join_all(files.iter().map(|file| self.pipeline.process(file))).await;

        let mut report = ScanReport {
            files,
            errors: walk_errors,
            ..ScanReport::default()
        };
        for result in results {
            match result {
                Ok(asset) => report.processed.push(asset),
                Err(error) => report.errors.push(error),
            }
        }
        report
    }

    /// Write every table entry under `out_dir` (no-op when `emit_files` is off).
    ///
    /// The table is left intact, so repeated calls rewrite identical files.
    pub async fn write_bundle(&self, out_dir: impl AsRef<Path>) -> FlushReport {
        if !self.options.emit_files {
            tracing::debug!("imagemin: emit_files disabled, nothing written");
            return FlushReport::skipped();
        }

        flush(
            self.table().entries(),
            out_dir.as_ref(),
            &self.runtime,
            &self.reporter,
        )
        .await
    }
}
