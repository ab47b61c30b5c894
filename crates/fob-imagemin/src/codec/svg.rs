use regex::bytes::Regex;
use serde::Deserialize;

use super::{Codec, CodecError, CodecOptions, SVGO, is_svg};

/// Upper bound on parse/serialize rounds in multipass mode.
const MAX_PASSES: usize = 10;

/// Elements usvg rewrites lossily (text becomes paths) or drops outright.
const UNSUPPORTED_ELEMENT: &str =
    r"(?i)<\s*(?:[\w-]+:)?(?:text|tspan|textPath|foreignObject|script|style)\b";

/// `<image>` and `<use>` references, with the href value captured.
const REFERENCE: &str =
    r#"(?i)<\s*(?:[\w-]+:)?(image|use)\b[^>]*\bhref\s*=\s*["']\s*([^"']*)"#;

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SvgSettings {
    precision: u8,
    transform_precision: u8,
    multipass: bool,
}

impl Default for SvgSettings {
    fn default() -> Self {
        Self {
            precision: 1,
            transform_precision: 5,
            multipass: true,
        }
    }
}

/// SVG minifier built on usvg.
///
/// The document is parsed into usvg's simplified tree (comments, editor
/// metadata and unused definitions disappear) and written back compactly.
/// Documents with text, scripts, stylesheets, foreign content or external
/// references are returned untouched, since the simplified tree cannot
/// represent them faithfully.
#[derive(Debug, Clone)]
pub struct SvgCodec {
    precision: u8,
    transform_precision: u8,
    multipass: bool,
    unsupported_element: Regex,
    reference: Regex,
}

impl SvgCodec {
    pub fn new(precision: u8, transform_precision: u8, multipass: bool) -> Result<Self, CodecError> {
        if precision > 20 || transform_precision > 20 {
            return Err(CodecError::new("precision must be between 0 and 20"));
        }
        let unsupported_element = Regex::new(UNSUPPORTED_ELEMENT)
            .map_err(|e| CodecError::with_source("invalid element pattern", e))?;
        let reference = Regex::new(REFERENCE)
            .map_err(|e| CodecError::with_source("invalid reference pattern", e))?;

        Ok(Self {
            precision,
            transform_precision,
            multipass,
            unsupported_element,
            reference,
        })
    }

    pub fn from_options(options: &CodecOptions) -> Result<Self, CodecError> {
        let settings: SvgSettings = options.parse()?;
        Self::new(
            settings.precision,
            settings.transform_precision,
            settings.multipass,
        )
    }

    /// Whether the document holds content the rewrite would lose.
    fn is_lossy(&self, input: &[u8]) -> bool {
        if self.unsupported_element.is_match(input) {
            return true;
        }

        self.reference.captures_iter(input).any(|caps| {
            let href = &caps[2];
            if caps[1].eq_ignore_ascii_case(b"image") {
                !href.starts_with(b"data:")
            } else {
                !href.starts_with(b"#")
            }
        })
    }

    fn pass(&self, input: &[u8]) -> Result<Vec<u8>, CodecError> {
        let tree = usvg::Tree::from_data(input, &usvg::Options::default())
            .map_err(|e| CodecError::with_source("failed to parse SVG", e))?;

        let write_options = usvg::WriteOptions {
            indent: usvg::Indent::None,
            attributes_indent: usvg::Indent::None,
            coordinates_precision: self.precision,
            transforms_precision: self.transform_precision,
            ..Default::default()
        };

        Ok(tree.to_string(&write_options).into_bytes())
    }
}

impl Codec for SvgCodec {
    fn name(&self) -> &str {
        SVGO
    }

    fn matches(&self, input: &[u8]) -> bool {
        is_svg(input)
    }

    fn transform(&self, input: &[u8]) -> Result<Vec<u8>, CodecError> {
        if self.is_lossy(input) {
            tracing::debug!("imagemin: svg holds text or external content, kept as is");
            return Ok(input.to_vec());
        }

        let mut best = self.pass(input)?;
        if best.len() >= input.len() {
            return Ok(input.to_vec());
        }

        if self.multipass {
            for _ in 1..MAX_PASSES {
                let next = self.pass(&best)?;
                if next.len() >= best.len() {
                    break;
                }
                best = next;
            }
        }

        Ok(best)
    }
}
