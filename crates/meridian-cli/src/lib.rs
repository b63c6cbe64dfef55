//! Command-line front end for Meridian.
//!
//! Loads a scene model, optionally merges a second model into it, applies
//! viewport operations and writes the resulting model back out as JSON.

pub mod error_adapter;

mod args;
mod config;
mod error;

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use log::{debug, info};

use meridian::{
    Controller,
    geometry::Dimensions,
    model::{Model, ScaleDetailsLevel},
};

pub use args::Args;
pub use config::{ConfigError, load_config};
pub use error::CliError;
pub use error_adapter::ErrorAdapter;

/// What a run produced, for logging and inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub nodes: usize,
    pub edges: usize,
    /// Nodes that pass the render constraint.
    pub rendered: usize,
    pub scale: f64,
    pub details_level: ScaleDetailsLevel,
}

/// Run the CLI with the given arguments.
pub fn run(args: &Args) -> Result<Summary, CliError> {
    info!(input_path = args.input; "Processing model");

    let viewport = args.viewport.as_deref().map(parse_viewport).transpose()?;

    let config = load_config(args.config.as_ref())?;
    let mut controller = Controller::with_config(config)?;

    let model = read_model(Path::new(&args.input))?;
    controller.from_model(&model, false)?;

    if let Some(path) = &args.merge {
        info!(merge_path = path; "Merging model");
        let update = read_model(Path::new(path))?;
        controller.from_model(&update, true)?;
    }

    if let Some(dimensions) = viewport {
        controller.set_graph_dimensions(dimensions)?;
    }

    if args.fit {
        controller.fit(args.padding, None)?;
    }

    let summary = summarize(&controller);
    info!(
        nodes = summary.nodes,
        edges = summary.edges,
        rendered = summary.rendered,
        scale = summary.scale,
        details_level:? = summary.details_level;
        "Scene loaded"
    );

    let json = serde_json::to_string_pretty(&controller.to_model()).map_err(CliError::Serialize)?;
    match &args.output {
        Some(path) => {
            fs::write(path, json)?;
            info!(output_file = path; "Model written successfully");
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }

    controller.destroy();
    Ok(summary)
}

fn read_model(path: &Path) -> Result<Model, CliError> {
    let content = fs::read_to_string(path)?;
    debug!(path = path.display().to_string(), bytes = content.len(); "Read model file");
    serde_json::from_str(&content).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn summarize(controller: &Controller) -> Summary {
    let scene = controller.scene();
    Summary {
        nodes: scene.nodes().count(),
        edges: scene.edges().count(),
        rendered: scene
            .nodes()
            .filter(|node| controller.should_render_node(node.id()))
            .count(),
        scale: scene.graph().map_or(1.0, |graph| graph.scale()),
        details_level: controller.details_level(),
    }
}

/// Parses `WIDTHxHEIGHT` into viewport dimensions.
fn parse_viewport(value: &str) -> Result<Dimensions, CliError> {
    let invalid = || CliError::InvalidViewport(value.to_string());
    let (width, height) = value.split_once(['x', 'X']).ok_or_else(invalid)?;
    let width: f64 = width.trim().parse().map_err(|_| invalid())?;
    let height: f64 = height.trim().parse().map_err(|_| invalid())?;
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(invalid());
    }
    Ok(Dimensions::new(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_viewport() {
        assert_eq!(
            parse_viewport("1280x720").unwrap(),
            Dimensions::new(1280.0, 720.0)
        );
        assert_eq!(
            parse_viewport("800X600.5").unwrap(),
            Dimensions::new(800.0, 600.5)
        );
    }

    #[test]
    fn test_parse_viewport_rejects_malformed() {
        for value in ["1280", "x720", "0x10", "-5x10", "axb", "infx10"] {
            assert!(
                matches!(parse_viewport(value), Err(CliError::InvalidViewport(_))),
                "{value} should be rejected"
            );
        }
    }
}
