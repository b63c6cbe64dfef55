use clap::Parser;

/// Loads a Meridian scene model, applies viewport operations and writes the result
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input model file (JSON)
    pub input: String,

    /// Path to the output model file, standard output when omitted
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Second model merged into the first by id
    #[arg(short, long)]
    pub merge: Option<String>,

    /// Viewport size as WIDTHxHEIGHT
    #[arg(long)]
    pub viewport: Option<String>,

    /// Fit the graph content into the viewport
    #[arg(long)]
    pub fit: bool,

    /// Padding in pixels used when fitting
    #[arg(long, default_value_t = 0.0)]
    pub padding: f64,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
