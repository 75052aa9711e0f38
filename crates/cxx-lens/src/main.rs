//! `cxx-lens` - C++ type deduction and editor queries from the command line.
//!
//! Every query prints one vimson literal on stdout. Logs go to stderr,
//! filtered by `CXX_LENS_LOG` or the `[log]` section of the configuration.

mod cli;
mod config;
mod serve;

use std::io::Read;
use std::path::Path;

use anyhow::Context;
use clap::Parser;
use cxx_lens_ide::{execute, render_compile_commands, LocationTuple};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, PositionArgs};
use config::Config;

const LOG_ENV: &str = "CXX_LENS_LOG";

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let loaded = match &cli.config {
        Some(path) => Config::load(path),
        None => std::env::current_dir()
            .context("failed to resolve working directory")
            .and_then(|dir| Config::discover(&dir)),
    };
    let config = match loaded {
        Ok(config) => {
            init_logging(&config.log.filter);
            config
        }
        Err(err) => {
            let config = Config::default();
            init_logging(&config.log.filter);
            warn!("{err:#}; using default configuration");
            config
        }
    };

    match &cli.command {
        Command::Serve => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            serve::run(&config, stdin.lock(), stdout.lock())
        }
        Command::CompileCommands { file } => {
            println!("{}", render_compile_commands(&config.compile_args(file)));
            Ok(())
        }
        command => {
            let Some((kind, args)) = command.position_query() else {
                return Ok(());
            };
            let location = location_for(&config, args)?;
            println!("{}", execute(kind, &location));
            Ok(())
        }
    }
}

fn init_logging(fallback: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn location_for(config: &Config, args: &PositionArgs) -> anyhow::Result<LocationTuple> {
    let explicit = (!args.args.is_empty()).then(|| args.args.clone());
    let compile_args = config.resolve_args(&args.file, explicit);
    let mut location = LocationTuple::new(&args.file, args.line, args.col).with_args(compile_args);
    if args.stdin {
        let mut contents = String::new();
        std::io::stdin()
            .read_to_string(&mut contents)
            .context("failed to read buffer from stdin")?;
        location = location.with_unsaved(&args.file, contents);
    }
    for (path, buffer) in &args.unsaved {
        location = location.with_unsaved(path, read_buffer(buffer)?);
    }
    Ok(location)
}

fn read_buffer(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read buffer {}", path.display()))
}
