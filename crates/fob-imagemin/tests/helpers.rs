//! Shared fixtures for fob-imagemin integration tests
//!
//! Every fixture is generated in code with deliberately poor encoder settings
//! so the codecs have something to remove.

#![allow(dead_code)]

use fob_imagemin::{CollectingReporter, Imagemin, ImageminOptions, NativeRuntime};
use gif::{Encoder, Frame, Repeat};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ExtendedColorType, ImageBuffer, ImageEncoder, Rgb};
use parking_lot::Mutex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::Level;
use tracing::subscriber::DefaultGuard;

/// Animated GIF with a duplicated frame and a trailing comment block
pub fn bloated_gif() -> Vec<u8> {
    let palette = [0u8, 0, 0, 255, 255, 255, 255, 0, 0, 0, 0, 255];
    let frame = |seed: u8| {
        let mut frame = Frame::default();
        frame.width = 16;
        frame.height = 16;
        frame.delay = 10;
        frame.buffer = (0..256u32)
            .map(|i| ((i as u8).wrapping_add(seed) / 64) % 4)
            .collect::<Vec<u8>>()
            .into();
        frame
    };

    let mut out = Vec::new();
    {
        let mut encoder = Encoder::new(&mut out, 16, 16, &palette).unwrap();
        encoder.set_repeat(Repeat::Infinite).unwrap();
        encoder.write_frame(&frame(0)).unwrap();
        encoder.write_frame(&frame(0)).unwrap();
        encoder.write_frame(&frame(9)).unwrap();
    }

    // Splice a comment extension in front of the trailer.
    assert_eq!(out.pop(), Some(0x3B));
    let comment = b"exported by an image editor".repeat(8);
    out.extend_from_slice(&[0x21, 0xFE, comment.len() as u8]);
    out.extend_from_slice(&comment);
    out.extend_from_slice(&[0x00, 0x3B]);
    out
}

/// Uncompressed-ish RGB gradient
pub fn loose_png() -> Vec<u8> {
    let (width, height) = (48u32, 48u32);
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[(x * 5) as u8, (y * 5) as u8, 96]);
        }
    }

    let mut out = Vec::new();
    PngEncoder::new_with_quality(&mut out, CompressionType::Fast, FilterType::NoFilter)
        .write_image(&pixels, width, height, ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// Noisy JPEG saved at maximum quality
pub fn heavy_jpeg() -> Vec<u8> {
    let img = ImageBuffer::from_fn(64, 64, |x, y| {
        let v = ((x * 31 + y * 17) ^ (x * y)) as u8;
        Rgb([v, v.wrapping_mul(3), 255 - v])
    });
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_with_encoder(JpegEncoder::new_with_quality(&mut out, 100))
        .unwrap();
    out
}

/// Editor-exported SVG with comments and metadata
pub fn verbose_svg() -> Vec<u8> {
    br##"<?xml version="1.0" encoding="UTF-8"?>
<!-- Exported from a drawing tool -->
<svg xmlns="http://www.w3.org/2000/svg" width="64" height="64" viewBox="0 0 64 64">
    <metadata>
        <layers>background, foreground, guides, hidden sketch layer, export slices</layers>
        <grid spacing="8" subdivisions="4" snap="true" color="#cccccc" opacity="0.5"/>
        <history>created, resized, recolored, exported, exported again, exported once more</history>
    </metadata>
    <defs>
        <linearGradient id="unused-a"><stop offset="0" stop-color="#000000"/><stop offset="1" stop-color="#ffffff"/></linearGradient>
        <linearGradient id="unused-b"><stop offset="0" stop-color="#ff0000"/><stop offset="1" stop-color="#00ff00"/></linearGradient>
    </defs>
    <!-- background -->
    <rect x="0.000000" y="0.000000" width="64.000000" height="64.000000" fill="#336699"/>
    <circle cx="32.123456" cy="32.654321" r="20.5" fill="#ffffff"/>
</svg>
"##
    .to_vec()
}

/// Temporary project directory
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn out_dir(&self) -> PathBuf {
        self.root().join("dist")
    }

    /// Write a file relative to the project root and return its absolute path.
    pub fn file(&self, relative: &str, content: &[u8]) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Imagemin over the real filesystem, rooted at this project.
    pub fn imagemin(&self, options: ImageminOptions) -> (Imagemin, Arc<CollectingReporter>) {
        let reporter = Arc::new(CollectingReporter::new());
        let imagemin = Imagemin::builder(options)
            .runtime(Arc::new(NativeRuntime::new()))
            .reporter(reporter.clone())
            .cwd(self.root())
            .build()
            .unwrap();
        (imagemin, reporter)
    }
}

/// Check an output name of the form `<stem>-<hex * len><ext>`.
pub fn assert_hashed_name(output_path: &str, stem: &str, ext: &str, len: usize) {
    let hash = output_path
        .strip_prefix(&format!("{stem}-"))
        .and_then(|rest| rest.strip_suffix(ext))
        .unwrap_or_else(|| panic!("unexpected output name: {output_path}"));
    assert_eq!(hash.len(), len, "hash length in {output_path}");
    assert!(
        hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()),
        "hash is not lowercase hex: {output_path}"
    );
}

/// Output of a thread-scoped fmt subscriber
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Route INFO and above on this thread into the buffer until the guard drops.
    pub fn install(&self) -> DefaultGuard {
        let logs = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || logs.clone())
            .with_max_level(Level::INFO)
            .with_target(false)
            .without_time()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
