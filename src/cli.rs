//! Command-line argument parsing for askdb.

use crate::config::Config;
use crate::output::OutputFormat;
use clap::Parser;
use std::path::PathBuf;

/// Ask questions about a SQLite database in plain language.
#[derive(Parser, Debug)]
#[command(name = "askdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the SQLite database file
    #[arg(short = 'd', long, value_name = "PATH")]
    pub db: PathBuf,

    /// Answer a single question and exit
    #[arg(short = 'q', long, value_name = "QUESTION")]
    pub query: Option<String>,

    /// Config file path
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory of domain knowledge documents (overrides config)
    #[arg(short = 'k', long, value_name = "DIR")]
    pub knowledge: Option<PathBuf>,

    /// Output format: table, csv, json or markdown
    #[arg(short = 'f', long, value_name = "FORMAT", default_value = "table")]
    pub format: String,

    /// Print the generated SQL without executing it
    #[arg(long)]
    pub sql_only: bool,

    /// LLM provider to use (overrides config)
    #[arg(long, value_name = "PROVIDER", env = "ASKDB_LLM")]
    pub llm: Option<String>,

    /// Model name (overrides config)
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Enable debug logging on stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses the output format from the --format argument.
    pub fn parse_output_format(&self) -> std::result::Result<OutputFormat, String> {
        self.format.parse()
    }

    /// Applies command-line overrides on top of file configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(provider) = &self.llm {
            config.llm.provider = provider.clone();
            // A model name only makes sense for the provider it came with.
            if self.model.is_none() {
                config.llm.model = None;
            }
        }
        if let Some(model) = &self.model {
            config.llm.model = Some(model.clone());
        }
        if let Some(dir) = &self.knowledge {
            config.knowledge_dir = dir.clone();
        }
    }
}
