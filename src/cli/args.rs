//! Command-line arguments and subcommands for the `deffix` binary.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::runtime::context::DEFAULT_MAX_DEPTH;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "deffix",
    version,
    about = "Rewrite mixed prefix, infix, and postfix expressions into canonical prefix form."
)]
#[command(propagate_version = true)]
pub struct DeffixArgs {
    /// Set log level
    #[arg(long, value_enum, global = true, env = "DEFFIX_LOG_LEVEL", default_value = "warn")]
    pub log_level: LogLevel,

    /// Maximum rewrite and evaluation depth
    #[arg(long, global = true, env = "DEFFIX_MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Script run before the command, e.g. shared operator definitions
    #[arg(long, global = true, env = "DEFFIX_PRELUDE")]
    pub prelude: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse, rewrite, and evaluate a script, printing each result.
    Run {
        /// The path to the script file to run.
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Evaluate source given on the command line.
    Eval {
        /// The source text to evaluate.
        #[arg(required = true)]
        source: String,
    },
    /// Print the canonical prefix form of every expression in a script.
    Rewrite {
        /// The path to the script file to rewrite.
        #[arg(required = true)]
        file: PathBuf,
        /// Emit JSON instead of s-expressions.
        #[arg(long)]
        json: bool,
    },
    /// Show the dispatch steps of every rewrite, with diffs.
    Trace {
        /// The path to the script file to trace.
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Start an interactive session.
    Repl,
    /// List the builtin operators and what they do.
    ListOperators,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}
