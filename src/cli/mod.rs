//! The `deffix` command-line interface.
//!
//! Every subcommand builds one [`ExecutionPipeline`] from the global flags,
//! runs the optional prelude into it, and then does its own work.

use std::{fs, path::Path};

use clap::Parser;
use env_logger::Env;
use log::info;
use miette::{IntoDiagnostic, Result, WrapErr};

use crate::cli::args::{Command, DeffixArgs};
use crate::engine::{ExecutionPipeline, NullSink};
use crate::runtime::context::EngineConfig;

pub mod args;
pub mod output;

pub use output::StdoutSink;

/// The main entry point for the CLI.
pub fn run() -> Result<()> {
    let args = DeffixArgs::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .filter_level(args.log_level.into())
        .init();
    info!("deffix v{} starting", env!("CARGO_PKG_VERSION"));

    let mut pipeline = ExecutionPipeline::new(EngineConfig {
        max_depth: args.max_depth,
    });
    if let Some(prelude) = &args.prelude {
        let source = read_source(prelude)?;
        pipeline.execute(&source, &prelude.display().to_string(), &mut NullSink)?;
        info!("loaded prelude {}", prelude.display());
    }

    match args.command {
        Command::Run { file } => {
            let source = read_source(&file)?;
            pipeline.execute(&source, &file.display().to_string(), &mut StdoutSink)?;
        }
        Command::Eval { source } => {
            pipeline.execute(&source, "<eval>", &mut StdoutSink)?;
        }
        Command::Rewrite { file, json } => {
            let source = read_source(&file)?;
            let forms = pipeline.rewrite_source(&source, &file.display().to_string())?;
            output::print_rewrites(&forms, json).into_diagnostic()?;
        }
        Command::Trace { file } => {
            let source = read_source(&file)?;
            for (input, canonical, trace) in pipeline.trace_source(&source, &file.display().to_string())? {
                output::print_trace(&input, &canonical, &trace);
            }
        }
        Command::Repl => crate::repl::run_repl(pipeline),
        Command::ListOperators => output::print_builtins(),
    }
    Ok(())
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", path.display()))
}
