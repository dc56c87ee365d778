use crate::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sentinel-scan")]
#[command(version)]
#[command(
    about = "Scan a URL or a file for security risks with a generative-AI analyst.",
    long_about = None
)]
pub struct Cli {
    /// Gemini API key (defaults to GEMINI_API_KEY, then API_KEY).
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Model used for the analysis.
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Path of the history database.
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Keep history in memory only for this run.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Print results as JSON instead of a formatted report.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Analyze a URL, grounded with live web search.
    Url {
        /// The URL to check.
        url: String,
    },
    /// Analyze a file (5 MB max).
    File {
        /// Path of the file to upload.
        path: PathBuf,

        /// Override the MIME type guessed from the extension.
        #[arg(long)]
        mime: Option<String>,
    },
    /// Show the most recent scans.
    History,
    /// Serve the web UI and JSON API.
    Serve {
        /// Port to listen on.
        #[arg(short, long)]
        port: Option<u16>,
    },
}

impl Cli {
    /// Apply command-line overrides on top of `config`
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(key) = &self.api_key {
            config.api_key = Some(key.clone());
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(path) = &self.database {
            config.database_path = path.clone();
        }
        if let Command::Serve { port: Some(port) } = self.command {
            config.terminal_port = port;
        }
        config
    }
}
