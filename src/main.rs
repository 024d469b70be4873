//! ipylua - CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ipylua::repl::LineRepl;
use ipylua::util::config::{load_config_from, load_user_config, BridgeConfig};
use ipylua::util::logger::{self, LogLevel};
use ipylua::{MemoryStore, ResultObject, Session, NAME, VERSION};

/// Lua evaluation bridge for notebook kernels
#[derive(Parser, Debug)]
#[command(name = "ipylua")]
#[command(version = VERSION)]
#[command(about = NAME, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file (default: ~/.config/ipylua/config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a Lua source file as one cell
    Run {
        /// Source file to run
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Evaluate Lua code from command line
    Eval {
        /// Code to evaluate
        #[arg(value_name = "CODE")]
        code: String,
    },

    /// Start an interactive session
    Repl,

    /// Print kernel information as JSON
    Info,

    /// Print version information
    Version,
}

fn load_config(args: &Args) -> Result<BridgeConfig> {
    let config = match &args.config {
        Some(path) => load_config_from(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => load_user_config().context("Failed to load user config")?,
    };
    Ok(config.with_env_overrides())
}

fn print_result(result: &ResultObject) -> Result<()> {
    let json = serde_json::to_string_pretty(result).context("Failed to serialize result")?;
    println!("{}", json);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    if args.verbose {
        logger::init_with_level(LogLevel::Debug);
    } else {
        logger::init_from_config(&config.log.level);
    }

    let session = Session::install(config.runtime.clone(), std::sync::Arc::new(MemoryStore::new()));

    match args.command {
        Commands::Run { file } => {
            session.start().context("Failed to start the Lua runtime")?;
            let source = std::fs::read(&file)
                .with_context(|| format!("Failed to read file: {}", file.display()))?;
            let id = session.eval_string(&file.display().to_string(), source)?;
            let result = session.result(id).context("result object missing")?;
            print_result(&result)?;
            if result.is_error() {
                std::process::exit(1);
            }
        }
        Commands::Eval { code } => {
            session.start().context("Failed to start the Lua runtime")?;
            let id = session.eval_string("eval", code)?;
            let result = session.result(id).context("result object missing")?;
            print_result(&result)?;
            if result.is_error() {
                std::process::exit(1);
            }
        }
        Commands::Repl => {
            session.start().context("Failed to start the Lua runtime")?;
            let mut repl = LineRepl::new(session, config.repl).context("Failed to open REPL")?;
            repl.run().context("REPL failed")?;
            session.stop();
        }
        Commands::Info => {
            let info = serde_json::to_string_pretty(&session.kernel_info())
                .context("Failed to serialize kernel info")?;
            println!("{}", info);
        }
        Commands::Version => {
            println!("{} {} ({})", NAME, VERSION, session.runtime_version());
        }
    }

    Ok(())
}
