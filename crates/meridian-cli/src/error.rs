//! Errors surfaced by the command-line front end.

use std::{io, path::PathBuf};

use thiserror::Error;

use meridian::GraphError;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse model `{}`: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize model: {0}")]
    Serialize(serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Invalid viewport `{0}`, expected WIDTHxHEIGHT with positive sizes")]
    InvalidViewport(String),
}
