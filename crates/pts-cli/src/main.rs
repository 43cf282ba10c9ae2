//! pts-imc - TCG PTS measurer driver
//!
//! Hashes files the way the measurer reports them, and replays captured
//! verifier messages through a full measurer instance.

use std::{io, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use pts_imc::{ConnectionId, HashAlgorithm};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;

use error::CliError;

/// pts-imc - TCG PTS measurer driver
#[derive(Parser, Debug)]
#[command(name = "pts-imc")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print digests of a file or of every file in a directory
    Hash {
        /// File or directory to measure
        path: PathBuf,

        /// Digest algorithm (sha1, sha256, sha384, sha512)
        #[arg(short, long, default_value = "sha256")]
        algorithm: HashAlgorithm,

        /// Treat PATH as a directory
        #[arg(short, long)]
        directory: bool,
    },

    /// Feed PA-TNC messages to a measurer and write its replies
    Replay {
        /// Encoded PA-TNC message files, processed in order
        #[arg(required = true)]
        messages: Vec<PathBuf>,

        /// Directory receiving reply-<n>.bin files
        #[arg(short, long)]
        out_dir: PathBuf,

        /// Connection identifier used for every message
        #[arg(long, default_value_t = 1)]
        connection_id: ConnectionId,

        #[command(flatten)]
        config: commands::replay::ConfigArgs,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "pts-imc failed");
            ExitCode::FAILURE
        },
    }
}

fn run(command: Commands) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match command {
        Commands::Hash { path, algorithm, directory } => {
            commands::hash::run(&mut out, &path, algorithm, directory)
        },
        Commands::Replay { messages, out_dir, connection_id, config } => {
            let config = config.into_config()?;
            commands::replay::run(&mut out, &messages, &out_dir, connection_id, config)
        },
    }
}
