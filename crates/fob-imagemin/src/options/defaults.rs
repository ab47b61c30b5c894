use crate::codec::{CodecOptions, GIFSICLE, JPEGTRAN, PNGQUANT, SVGO};

pub const DEFAULT_HASH_LENGTH: usize = 16;
pub const MAX_HASH_LENGTH: usize = 40;
pub const DEFAULT_INCLUDE: &str = "**/*.{svg,png,jpg,jpeg,gif}";
pub const DEFAULT_FILE_NAME: &str = "[name]-[hash][extname]";

/// Default option record for a built-in codec. Unknown codecs start empty.
pub fn default_codec_options(codec: &str) -> CodecOptions {
    match codec {
        JPEGTRAN => CodecOptions::new().with("quality", 75),
        PNGQUANT => CodecOptions::new().with("level", 2).with("strip", true),
        GIFSICLE => CodecOptions::new().with("optimizationLevel", 3),
        SVGO => CodecOptions::new()
            .with("precision", 1)
            .with("multipass", true),
        _ => CodecOptions::new(),
    }
}
