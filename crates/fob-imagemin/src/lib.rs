#![cfg_attr(docsrs, feature(doc_cfg))]

//! # fob-imagemin
//!
//! Content-hashed image optimization for bundler plugins.
//!
//! Image modules selected by the include/exclude filter are read, run through
//! a chain of codecs (JPEG, PNG, GIF and SVG out of the box), named from their
//! final content and collected in a shared asset table. The importing module
//! is replaced by a one-line ES module exporting the asset URL, and the table
//! is written to the output directory once the bundle is written.
//!
//! ## Quick Start
//!
//! ```no_run
//! use fob_imagemin::{Imagemin, ImageminOptions};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let imagemin = Imagemin::new(
//!     ImageminOptions::new()
//!         .with_public_path("assets")
//!         .with_dirs("static/**/*.svg"),
//! )?;
//!
//! imagemin.build_start();
//! if let Some(code) = imagemin.load("./src/logo.png").await? {
//!     println!("{code}");
//! }
//! imagemin.build_end().await;
//! imagemin.write_bundle("dist").await;
//! # Ok(()) }
//! ```
//!
//! ### Loading options from files
//!
//! `imagemin.toml`, `imagemin.json` and `IMAGEMIN_*` environment variables are
//! merged in that order:
//!
//! ```no_run
//! use fob_imagemin::{Imagemin, ImageminOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ImageminOptions::load(".")?;
//! let imagemin = Imagemin::new(options)?;
//! # let _ = imagemin;
//! # Ok(()) }
//! ```

pub mod codec;
pub mod error;
pub mod filter;
pub mod flush;
pub mod imagemin;
pub mod naming;
pub mod options;
pub mod pipeline;
pub mod reporter;
pub mod runtime;
pub mod scan;
pub mod stats;
pub mod table;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub mod logging;

pub use codec::{Codec, CodecChain, CodecError, CodecFactory, CodecOptions};
pub use error::{ErrorKind, ImageminError, Result};
pub use filter::InclusionFilter;
pub use flush::FlushReport;
pub use imagemin::{Imagemin, ImageminBuilder};
pub use naming::NameDeriver;
pub use options::{ImageminOptions, PatternList, PreserveTree, ResolvedOptions};
pub use pipeline::{ProcessedAsset, module_source};
pub use reporter::{CollectingReporter, ReportContext, Reporter, Stage, TracingReporter};
pub use runtime::{MemoryRuntime, NativeRuntime, Runtime, RuntimeError};
pub use scan::ScanReport;
pub use stats::SizeComparison;
pub use table::AssetTable;

#[cfg(feature = "logging")]
pub use logging::{LogLevel, init_logging, init_logging_from_env};
