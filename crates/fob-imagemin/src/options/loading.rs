use figment::{
    Figment,
    providers::{Env, Format as _, Json, Toml},
};
use std::path::Path;

use super::ImageminOptions;
use crate::error::{ImageminError, Result};

pub const CONFIG_TOML: &str = "imagemin.toml";
pub const CONFIG_JSON: &str = "imagemin.json";
pub const ENV_PREFIX: &str = "IMAGEMIN_";

impl ImageminOptions {
    /// Load options from `root`.
    /// Priority: environment variables > imagemin.json > imagemin.toml
    ///
    /// Nested codec keys use a double underscore in the environment,
    /// e.g. `IMAGEMIN_SVGO__PRECISION=2`.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let mut figment = Figment::new();

        let toml = root.join(CONFIG_TOML);
        if toml.exists() {
            figment = figment.merge(Toml::file(toml));
        }

        let json = root.join(CONFIG_JSON);
        if json.exists() {
            figment = figment.merge(Json::file(json));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let options: Self = figment.extract()?;
        tracing::debug!(root = %root.display(), "imagemin: loaded configuration");
        Ok(options)
    }

    /// Load options from one explicit TOML or JSON file.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ImageminError::ConfigLoad {
                message: format!("config file not found: {}", path.display()),
            });
        }

        let figment = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Figment::from(Toml::file(path)),
            Some("json") => Figment::from(Json::file(path)),
            _ => {
                return Err(ImageminError::ConfigLoad {
                    message: format!(
                        "unsupported config format for {} (expected .toml or .json)",
                        path.display()
                    ),
                });
            }
        };

        Ok(figment.extract()?)
    }
}
