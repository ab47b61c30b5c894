use oxipng::{Options, StripChunks};
use serde::Deserialize;

use super::{Codec, CodecError, CodecOptions, PNGQUANT, is_png};

#[derive(Debug, Deserialize)]
#[serde(default)]
struct PngSettings {
    level: u8,
    strip: bool,
}

impl Default for PngSettings {
    fn default() -> Self {
        Self {
            level: 2,
            strip: true,
        }
    }
}

/// Lossless PNG recompression via oxipng.
#[derive(Debug, Clone)]
pub struct PngCodec {
    level: u8,
    strip: bool,
}

impl PngCodec {
    pub fn new(level: u8, strip: bool) -> Result<Self, CodecError> {
        if level > 6 {
            return Err(CodecError::new(format!(
                "level must be between 0 and 6, got {level}"
            )));
        }
        Ok(Self { level, strip })
    }

    pub fn from_options(options: &CodecOptions) -> Result<Self, CodecError> {
        let settings: PngSettings = options.parse()?;
        Self::new(settings.level, settings.strip)
    }

    fn oxipng_options(&self) -> Options {
        let mut opts = Options::from_preset(self.level);
        opts.strip = if self.strip {
            StripChunks::Safe
        } else {
            StripChunks::None
        };
        opts
    }
}

impl Codec for PngCodec {
    fn name(&self) -> &str {
        PNGQUANT
    }

    fn matches(&self, input: &[u8]) -> bool {
        is_png(input)
    }

    fn transform(&self, input: &[u8]) -> Result<Vec<u8>, CodecError> {
        let out = oxipng::optimize_from_memory(input, &self.oxipng_options())
            .map_err(|e| CodecError::with_source("failed to optimize PNG", e))?;

        if out.len() >= input.len() {
            return Ok(input.to_vec());
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::png::{CompressionType, FilterType, PngEncoder};
    use image::{ExtendedColorType, ImageEncoder};

    fn loose_png() -> Vec<u8> {
        let (width, height) = (48u32, 48u32);
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[(x * 5) as u8, (y * 5) as u8, 128]);
            }
        }

        let mut out = Vec::new();
        PngEncoder::new_with_quality(&mut out, CompressionType::Fast, FilterType::NoFilter)
            .write_image(&pixels, width, height, ExtendedColorType::Rgb8)
            .unwrap();
        out
    }

    #[test]
    fn test_recompresses_png() {
        let input = loose_png();
        let codec = PngCodec::new(2, true).unwrap();

        assert!(codec.matches(&input));
        let output = codec.transform(&input).unwrap();
        assert!(output.len() < input.len());
        assert!(is_png(&output));

        let decoded = image::load_from_memory(&output).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (48, 48));
    }

    #[test]
    fn test_level_range() {
        assert!(PngCodec::new(7, true).is_err());

        let options = CodecOptions::new().with("level", 4).with("strip", false);
        let codec = PngCodec::from_options(&options).unwrap();
        assert_eq!(codec.level, 4);
        assert!(!codec.strip);
    }

    #[test]
    fn test_rejects_truncated_png() {
        let input = loose_png();
        let codec = PngCodec::new(2, true).unwrap();

        assert!(codec.transform(&input[..20]).is_err());
    }
}
