use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

impl From<LogFormat> for logutil::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Human => logutil::LogFormat::HumanReadable,
            LogFormat::Json => logutil::LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputMode {
    /// Print the parsed statement tree.
    #[default]
    Tree,
    /// Print the facts a router would use for each statement.
    Route,
}

#[derive(Debug, Parser)]
#[clap(name = "lyx")]
#[clap(version)]
#[clap(about = "Parse SQL statements and show what a router sees", long_about = None)]
pub struct Arguments {
    /// Default log level, `RUST_LOG` directives override it.
    #[clap(long, env = "LYX_LOG_LEVEL", default_value = "error")]
    pub log_level: tracing::Level,

    #[clap(long, value_enum, env = "LYX_LOG_FORMAT", default_value_t)]
    pub log_format: LogFormat,

    #[clap(short, long, value_enum, env = "LYX_OUTPUT", default_value_t)]
    pub output: OutputMode,

    /// Read sql statements from files.
    #[clap(short = 'f', long)]
    pub files: Vec<PathBuf>,

    /// Queries to parse.
    ///
    /// If omitted, and no files were given via the `files` argument, queries
    /// are read from stdin.
    #[clap(trailing_var_arg = true)]
    pub queries: Vec<String>,
}
