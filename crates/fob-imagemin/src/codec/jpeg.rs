use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageFormat};
use serde::Deserialize;

use super::{Codec, CodecError, CodecOptions, JPEGTRAN, is_jpeg};

#[derive(Debug, Deserialize)]
#[serde(default)]
struct JpegSettings {
    quality: u8,
}

impl Default for JpegSettings {
    fn default() -> Self {
        Self { quality: 75 }
    }
}

/// JPEG re-encoder.
///
/// Decodes the baseline/progressive stream and re-encodes it at the
/// configured quality. Metadata segments are not carried over.
#[derive(Debug, Clone)]
pub struct JpegCodec {
    quality: u8,
}

impl JpegCodec {
    pub fn new(quality: u8) -> Result<Self, CodecError> {
        if !(1..=100).contains(&quality) {
            return Err(CodecError::new(format!(
                "quality must be between 1 and 100, got {quality}"
            )));
        }
        Ok(Self { quality })
    }

    pub fn from_options(options: &CodecOptions) -> Result<Self, CodecError> {
        let settings: JpegSettings = options.parse()?;
        Self::new(settings.quality)
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Codec for JpegCodec {
    fn name(&self) -> &str {
        JPEGTRAN
    }

    fn matches(&self, input: &[u8]) -> bool {
        is_jpeg(input)
    }

    fn transform(&self, input: &[u8]) -> Result<Vec<u8>, CodecError> {
        let decoded = image::load_from_memory_with_format(input, ImageFormat::Jpeg)
            .map_err(|e| CodecError::with_source("failed to decode JPEG", e))?;

        // JPEG has no alpha channel and only 8-bit samples.
        let decoded = match decoded.color() {
            ColorType::L8 | ColorType::La8 | ColorType::L16 | ColorType::La16 => {
                DynamicImage::ImageLuma8(decoded.to_luma8())
            }
            _ => DynamicImage::ImageRgb8(decoded.to_rgb8()),
        };

        let mut out = Vec::with_capacity(input.len());
        decoded
            .write_with_encoder(JpegEncoder::new_with_quality(&mut out, self.quality))
            .map_err(|e| CodecError::with_source("failed to encode JPEG", e))?;

        if out.len() >= input.len() {
            return Ok(input.to_vec());
        }
        Ok(out)
    }
}
