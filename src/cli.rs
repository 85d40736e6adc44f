use clap::Parser;
use std::path::PathBuf;

/// Command line interface for the application
#[derive(Parser, Debug)]
#[command(name = "chartaccess", version, about = "Accessible chart task service")]
pub struct Cli {
    /// Optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Sets the logging verbosity level for the application
    /// Possible values: "error", "warn", "info", "debug", "trace"
    /// Default: "info"
    #[arg(long, default_value_t = String::from("info"))]
    pub logging_level: String,

    /// Overrides the configured listening port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Also write logs to a daily rotating file under `logs/`
    #[arg(long, default_value_t = false)]
    pub log_to_file: bool,
}
