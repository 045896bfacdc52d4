//! Running the CLI

// Allow exits because in this file we ideally handle all errors with known exit codes
#![allow(clippy::exit)]

use crate::config::Config;
use crate::server::app::serve;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// CADS writes files posted to its HTTP API into GitHub repositories.
/// Targets come from `GITHUB_*` environment variables and/or a TOML file.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Environment variables take precedence.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// CADS cli subcommands
    #[command(subcommand)]
    subcommands: Subcommands,
}

///
#[derive(Clone, clap::Subcommand)]
enum Subcommands {
    /// Serve the deploy API
    Serve {
        /// Address to bind to.
        #[arg(short, long, default_value_t = String::from("127.0.0.1"))]
        bind: String,
        /// Port on which to serve the API.
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
    /// Print the resolved configuration, without secrets
    Check,
}

/// Log to stdout, at `info` unless `RUST_LOG` says otherwise.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Main entrypoint to application
///
/// # Errors
/// Errors if the server cannot bind or stops with an I/O error.
pub fn run() -> std::io::Result<()> {
    init_tracing();
    tracing::debug!("Starting application");
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).unwrap_or_else(|err| {
        tracing::error!("error: {err:#}");
        std::process::exit(1);
    });

    match cli.subcommands {
        Subcommands::Serve { bind, port } => serve(config, &bind, port),
        Subcommands::Check => {
            #[allow(clippy::print_stdout)]
            {
                println!("{config:#?}");
            }
            Ok(())
        }
    }
}
