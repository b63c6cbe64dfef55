//! Configuration file discovery for the CLI.

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::info;
use thiserror::Error;

use meridian::config::ControllerConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Configuration file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Load controller configuration.
///
/// Searched in order:
/// 1. The explicitly provided path
/// 2. `meridian/config.toml` under the current directory
/// 3. The platform config directory (e.g. `~/.config/meridian/config.toml`)
/// 4. Built-in defaults
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<ControllerConfig, ConfigError> {
    // 1. Explicit path must exist
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    // 2. Local project directory
    let local = Path::new("meridian").join("config.toml");
    if local.exists() {
        info!(path = local.display().to_string(); "Loading configuration from local path");
        return load_config_file(&local);
    }

    // 3. Platform config directory
    if let Some(dirs) = ProjectDirs::from("com", "meridian", "meridian") {
        let path = dirs.config_dir().join("config.toml");
        if path.exists() {
            info!(path = path.display().to_string(); "Loading configuration from user config path");
            return load_config_file(&path);
        }
    }

    // 4. Defaults
    info!("No configuration file found, using defaults");
    Ok(ControllerConfig::default())
}

fn load_config_file(path: &Path) -> Result<ControllerConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)
        .map_err(|err| ConfigError::Parse(format!("{}: {err}", path.display())))?;
    let config: ControllerConfig =
        toml::from_str(&content).map_err(|err| ConfigError::Parse(err.to_string()))?;

    config
        .render()
        .view_padding()
        .map_err(|err| ConfigError::Validation(err.to_string()))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use meridian::render::ViewPaddingSettings;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write config");
        file
    }

    #[test]
    fn test_load_explicit_config() {
        let file = write_config(
            r#"
            [viewport]
            scale_extent = [0.1, 8.0]

            [render]
            constrained = true
            padding_percentage = 20.0

            [layout]
            default_layout = "grid"
            fit_on_layout = true
            fit_padding = 16.0
            "#,
        );

        let config = load_config(Some(file.path())).expect("Failed to load config");

        assert_eq!(config.viewport().scale_extent(), [0.1, 8.0]);
        assert!(config.render().constrained());
        assert_eq!(
            config.render().view_padding().unwrap(),
            ViewPaddingSettings::Percentage(20.0)
        );
        assert_eq!(config.layout().default_layout(), Some("grid"));
        assert!(config.layout().fit_on_layout());
        assert_eq!(config.layout().fit_padding(), 16.0);
    }

    #[test]
    fn test_missing_explicit_config() {
        let result = load_config(Some("/nonexistent/meridian.toml"));
        assert!(matches!(result, Err(ConfigError::MissingFile(_))));
    }

    #[test]
    fn test_conflicting_padding_rejected() {
        let file = write_config(
            r#"
            [render]
            padding = 10.0
            padding_percentage = 20.0
            "#,
        );

        let result = load_config(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_malformed_config() {
        let file = write_config("[viewport\nscale_extent = 3");
        let result = load_config(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
