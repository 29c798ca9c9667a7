//! Locating and reading the layout configuration file.

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use strata::config::AppConfig;

use crate::error::CliError;

const LOCAL_CONFIG: &str = "strata/config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration TOML: {0}")]
    Parse(String),

    #[error("configuration file not found: {0}")]
    MissingFile(PathBuf),

    #[error("invalid configuration value: {0}")]
    Validation(String),
}

/// Resolves the configuration for this run.
///
/// An explicit path wins and must exist. Otherwise `strata/config.toml` in the
/// working directory is tried, then the per-user config directory. With no
/// file anywhere the defaults are used.
///
/// # Errors
///
/// Fails when the explicit file is missing, or when the chosen file does not
/// parse or holds values [`AppConfig::validate`] rejects.
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, CliError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Using configuration given on the command line");
        return load_config_file(path);
    }

    let local = Path::new(LOCAL_CONFIG);
    if local.exists() {
        info!(path = local.display().to_string(); "Using configuration from the working directory");
        return load_config_file(local);
    }

    match ProjectDirs::from("com", "strata", "strata") {
        Some(dirs) => {
            let user = dirs.config_dir().join("config.toml");
            if user.exists() {
                info!(path = user.display().to_string(); "Using per-user configuration");
                return load_config_file(user);
            }
            debug!(path = user.display().to_string(); "No per-user configuration");
        }
        None => debug!("No home directory, skipping per-user configuration"),
    }

    debug!("Falling back to default configuration");
    Ok(AppConfig::default())
}

fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, CliError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

fn parse_config(content: &str) -> Result<AppConfig, CliError> {
    let config: AppConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config
        .validate()
        .map_err(|e| ConfigError::Validation(e.to_string()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use strata::config::{EngineKind, Orientation};

    use super::*;

    #[test]
    fn test_parse_partial_config() {
        let config = parse_config(
            r#"
            [layout]
            engine = "layered"

            [layout.force]
            iterations = 50
            seed = 9

            [layout.layered]
            orientation = "left_right"
            "#,
        )
        .unwrap();

        let layout = config.layout();
        assert_eq!(layout.engine(), EngineKind::Layered);
        assert_eq!(layout.force().iterations, 50);
        assert_eq!(layout.force().seed, Some(9));
        assert_eq!(layout.force().cluster_padding, 15.0);
        assert_eq!(layout.layered().orientation, Orientation::LeftRight);
        assert_eq!(layout.layered().node_separation, 20.0);
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config.layout().engine(), EngineKind::Force);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let result = parse_config("[layout.force]\ntheta = -0.5\n");
        assert!(matches!(
            result,
            Err(CliError::Config(ConfigError::Validation(_)))
        ));
    }

    #[test]
    fn test_malformed_toml_is_rejected() {
        let result = parse_config("[layout\nengine = ");
        assert!(matches!(result, Err(CliError::Config(ConfigError::Parse(_)))));
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = load_config(Some("/nonexistent/strata/config.toml"));
        assert!(matches!(
            result,
            Err(CliError::Config(ConfigError::MissingFile(_)))
        ));
    }
}
