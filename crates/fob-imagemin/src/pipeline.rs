//! Per-asset transform pipeline
//!
//! read → optimize → name → register → module source. Steps for one asset
//! run strictly in order; different assets share nothing but the
//! [`AssetTable`] and may run concurrently.

use path_clean::PathClean;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::codec::{CodecChain, CodecError};
use crate::error::{ImageminError, Result};
use crate::naming::{NameDeriver, asset_name, extension_of};
use crate::reporter::{ReportContext, Reporter, Stage};
use crate::runtime::Runtime;
use crate::stats::SizeComparison;
use crate::table::AssetTable;

/// Outcome of a successfully processed asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedAsset {
    /// Absolute source path
    pub source_path: PathBuf,
    /// Key registered in the asset table
    pub output_path: String,
    pub raw_size: usize,
    pub final_size: usize,
}

impl ProcessedAsset {
    pub fn comparison(&self) -> SizeComparison {
        SizeComparison::new(self.raw_size, self.final_size)
    }
}

/// Stand-in module exporting the URL of an emitted asset.
pub fn module_source(output_path: &str) -> String {
    let literal = serde_json::Value::from(output_path).to_string();
    format!("export default new URL({literal}, import.meta.url).href;")
}

/// Everything one asset pipeline needs, resolved once per build
#[derive(Debug, Clone)]
pub struct AssetPipeline {
    runtime: Arc<dyn Runtime>,
    reporter: Arc<dyn Reporter>,
    table: AssetTable,
    deriver: NameDeriver,
    codecs: CodecChain,
    disable: bool,
    verbose: bool,
    cwd: PathBuf,
    tree_root: Option<PathBuf>,
}

impl AssetPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        runtime: Arc<dyn Runtime>,
        reporter: Arc<dyn Reporter>,
        table: AssetTable,
        deriver: NameDeriver,
        codecs: CodecChain,
        disable: bool,
        verbose: bool,
        cwd: PathBuf,
        tree_root: Option<PathBuf>,
    ) -> Self {
        Self {
            runtime,
            reporter,
            table,
            deriver,
            codecs,
            disable,
            verbose,
            cwd,
            tree_root,
        }
    }

    pub fn table(&self) -> &AssetTable {
        &self.table
    }

    /// Run one asset through the pipeline and register it in the table.
    ///
    /// Failures are reported once through the reporter and returned; nothing
    /// is registered for a failed asset.
    pub async fn process(&self, source: &Path) -> Result<ProcessedAsset> {
        let path = self.cwd.join(source).clean();
        let subject = path.display().to_string();

        let raw = match self.runtime.read_file(&path).await {
            Ok(raw) => raw,
            Err(source) => {
                let error = ImageminError::Read {
                    path: path.clone(),
                    source,
                };
                self.reporter
                    .report(&error, &ReportContext::new(Stage::Read, subject));
                return Err(error);
            }
        };
        let raw_size = raw.len();

        let extension = extension_of(&path);
        let name = asset_name(&path, self.tree_root.as_deref());

        let final_bytes = if self.disable {
            raw
        } else {
            match self.optimize(&path, raw).await {
                Ok(bytes) => bytes,
                Err(error) => {
                    self.reporter
                        .report(&error, &ReportContext::new(Stage::Transform, subject));
                    return Err(error);
                }
            }
        };
        let final_size = final_bytes.len();

        let output_path = self.deriver.derive(&final_bytes, &name, &extension);
        self.table.insert(output_path.clone(), final_bytes);

        let asset = ProcessedAsset {
            source_path: path,
            output_path,
            raw_size,
            final_size,
        };

        if self.verbose && !self.disable {
            tracing::info!(
                "imagemin: Optimized {}: {}",
                asset.output_path,
                asset.comparison()
            );
        }
        tracing::debug!(
            source = %asset.source_path.display(),
            output = %asset.output_path,
            raw_size,
            final_size,
            "imagemin: asset registered"
        );

        Ok(asset)
    }

    /// Run the codec chain on the blocking pool.
    async fn optimize(&self, path: &Path, raw: Vec<u8>) -> Result<Vec<u8>> {
        let codecs = self.codecs.clone();
        let task_path = path.to_path_buf();

        tokio::task::spawn_blocking(move || codecs.apply(&task_path, raw))
            .await
            .map_err(|e| ImageminError::Transform {
                path: path.to_path_buf(),
                codec: "chain".to_string(),
                source: CodecError::new(format!("codec task failed: {e}")),
            })?
    }
}
