use ::gif::{ColorOutput, DecodeOptions, Encoder, Frame, Repeat};
use serde::Deserialize;

use super::{Codec, CodecError, CodecOptions, GIFSICLE, is_gif};

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GifSettings {
    optimization_level: u8,
}

impl Default for GifSettings {
    fn default() -> Self {
        Self {
            optimization_level: 3,
        }
    }
}

/// Lossless GIF re-encoder.
///
/// - level 1: re-encode frames, dropping comment, plain-text and
///   non-looping application extensions
/// - level 2: also drop local palettes equal to the global palette
/// - level 3: also merge identical consecutive frames
#[derive(Debug, Clone)]
pub struct GifCodec {
    level: u8,
}

impl GifCodec {
    pub fn new(level: u8) -> Result<Self, CodecError> {
        if !(1..=3).contains(&level) {
            return Err(CodecError::new(format!(
                "optimizationLevel must be between 1 and 3, got {level}"
            )));
        }
        Ok(Self { level })
    }

    pub fn from_options(options: &CodecOptions) -> Result<Self, CodecError> {
        let settings: GifSettings = options.parse()?;
        Self::new(settings.optimization_level)
    }

    pub fn level(&self) -> u8 {
        self.level
    }
}

fn same_image(a: &Frame<'_>, b: &Frame<'_>) -> bool {
    a.left == b.left
        && a.top == b.top
        && a.width == b.width
        && a.height == b.height
        && a.interlaced == b.interlaced
        && a.transparent == b.transparent
        && a.dispose == b.dispose
        && a.palette == b.palette
        && a.buffer == b.buffer
}

impl Codec for GifCodec {
    fn name(&self) -> &str {
        GIFSICLE
    }

    fn matches(&self, input: &[u8]) -> bool {
        is_gif(input)
    }

    fn transform(&self, input: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut options = DecodeOptions::new();
        options.set_color_output(ColorOutput::Indexed);
        let mut decoder = options
            .read_info(input)
            .map_err(|e| CodecError::with_source("failed to decode GIF", e))?;

        let width = decoder.width();
        let height = decoder.height();
        let global_palette = decoder.global_palette().map(<[u8]>::to_vec);

        let mut frames: Vec<Frame<'static>> = Vec::new();
        while let Some(frame) = decoder
            .read_next_frame()
            .map_err(|e| CodecError::with_source("failed to decode GIF frame", e))?
        {
            let mut frame = frame.clone();

            if self.level >= 2 && frame.palette.is_some() && frame.palette == global_palette {
                frame.palette = None;
            }

            if self.level >= 3 {
                if let Some(previous) = frames.last_mut() {
                    if same_image(previous, &frame) {
                        previous.delay = previous.delay.saturating_add(frame.delay);
                        continue;
                    }
                }
            }

            frames.push(frame);
        }
        let repeat = decoder.repeat();

        let mut out = Vec::with_capacity(input.len());
        {
            let palette = global_palette.as_deref().unwrap_or(&[]);
            let mut encoder = Encoder::new(&mut out, width, height, palette)
                .map_err(|e| CodecError::with_source("failed to encode GIF", e))?;

            // Finite(0) means the source carried no looping extension.
            if repeat != Repeat::Finite(0) {
                encoder
                    .set_repeat(repeat)
                    .map_err(|e| CodecError::with_source("failed to encode GIF", e))?;
            }

            for frame in &frames {
                encoder
                    .write_frame(frame)
                    .map_err(|e| CodecError::with_source("failed to encode GIF frame", e))?;
            }
        }

        if out.len() >= input.len() {
            return Ok(input.to_vec());
        }
        Ok(out)
    }
}
