use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult, ConfigError, ValidationError};

use super::types::ConfigFile;

pub(crate) const DEFAULT_TOML_CONFIG: &str = "heyyall.toml";
pub(crate) const DEFAULT_JSON_CONFIG: &str = "heyyall.json";

/// Loads the config file from `path`, or from `./heyyall.toml` then
/// `./heyyall.json` when no path is given.
///
/// # Errors
///
/// Returns an error when no config file can be located, or when it cannot be
/// read or parsed.
pub fn load_config(path: Option<&str>) -> AppResult<ConfigFile> {
    if let Some(path) = path {
        return load_config_file(Path::new(path));
    }

    for candidate in [DEFAULT_TOML_CONFIG, DEFAULT_JSON_CONFIG] {
        let candidate = PathBuf::from(candidate);
        if candidate.exists() {
            return load_config_file(&candidate);
        }
    }

    Err(AppError::validation(ValidationError::MissingConfig))
}

pub(crate) fn load_config_file(path: &Path) -> AppResult<ConfigFile> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        AppError::config(ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseToml {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some("json") => serde_json::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseJson {
                path: path.to_path_buf(),
                source: err,
            })
        }),
        Some(ext) => Err(AppError::config(ConfigError::UnsupportedExtension {
            ext: ext.to_owned(),
        })),
        None => Err(AppError::config(ConfigError::MissingExtension)),
    }
}
