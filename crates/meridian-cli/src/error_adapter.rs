//! Bridge between [`CliError`] and miette's diagnostic rendering.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use meridian::GraphError;

use crate::{config::ConfigError, error::CliError};

/// Wraps a [`CliError`] so it can be rendered by a miette report handler.
pub struct ErrorAdapter<'a>(pub &'a CliError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            CliError::Io(_) => "meridian::io",
            CliError::Json { .. } | CliError::Serialize(_) => "meridian::json",
            CliError::Config(_) => "meridian::config",
            CliError::Graph(GraphError::InvalidModel(_)) => "meridian::model",
            CliError::Graph(GraphError::InvalidState(_)) => "meridian::state",
            CliError::Graph(_) => "meridian::graph",
            CliError::InvalidViewport(_) => "meridian::viewport",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            CliError::Json { source, .. } => {
                format!("check line {}, column {}", source.line(), source.column())
            }
            CliError::Config(ConfigError::Validation(_)) => {
                "set either `padding` or `padding_percentage`, not both".to_string()
            }
            CliError::InvalidViewport(_) => "for example `--viewport 1280x720`".to_string(),
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        None
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_by_variant() {
        let model = CliError::Graph(GraphError::InvalidModel("duplicate id".to_string()));
        let viewport = CliError::InvalidViewport("12".to_string());

        assert_eq!(
            ErrorAdapter(&model).code().map(|c| c.to_string()),
            Some("meridian::model".to_string())
        );
        assert_eq!(
            ErrorAdapter(&viewport).code().map(|c| c.to_string()),
            Some("meridian::viewport".to_string())
        );
        assert!(ErrorAdapter(&viewport).help().is_some());
        assert!(ErrorAdapter(&model).help().is_none());
    }

    #[test]
    fn test_json_help_points_at_location() {
        let source = serde_json::from_str::<serde_json::Value>("{\n  \"graph\": }")
            .expect_err("Malformed JSON should not parse");
        let error = CliError::Json {
            path: "model.json".into(),
            source,
        };

        let help = ErrorAdapter(&error)
            .help()
            .map(|h| h.to_string())
            .unwrap_or_default();
        assert!(help.starts_with("check line 2,"), "unexpected help: {help}");
    }
}
