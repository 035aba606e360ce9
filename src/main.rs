//! Bucket-Ferry main entry point
//!
//! Runs the HTTP job API, or a single job from the command line.

use anyhow::Context;
use bucket_ferry::config::load_config_from_env;
use bucket_ferry::pipeline::{JobError, Stage};
use bucket_ferry::server::{self, ErrorResponse, JobResponse};
use bucket_ferry::{Config, Pipeline};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Bucket-Ferry: publish websites and GitHub repositories to object storage
///
/// Crawls a website breadth-first within its origin, converts every page to
/// Markdown, and uploads the result to a Cloudflare R2 bucket. Repositories
/// are uploaded file by file from their branch archive.
#[derive(Parser, Debug)]
#[command(name = "bucket-ferry")]
#[command(version)]
#[command(about = "Publish websites and GitHub repositories to R2", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (environment variables override it)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Port to listen on (defaults to server.port / PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Crawl one website and upload it as Markdown
    Crawl {
        /// Start URL, e.g. https://docs.example.com/
        url: String,

        /// Maximum number of pages to fetch
        #[arg(long)]
        max_pages: Option<usize>,
    },

    /// Upload the files of one GitHub repository
    Repo {
        /// Repository URL, e.g. https://github.com/owner/repo
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_config_from_env(cli.config.as_deref()).context("Failed to load configuration")?;
    tracing::debug!("Configuration: {:?}", config);

    let pipeline = Arc::new(build_pipeline(&config)?);

    match cli.command {
        Command::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            tracing::info!("Publishing to bucket '{}'", pipeline.bucket());
            server::serve(pipeline, port)
                .await
                .context("Server error")?;
        }
        Command::Crawl { url, max_pages } => {
            let cancel = cancel_on_ctrl_c();
            let result = pipeline.run_site_job(&url, max_pages, cancel).await;
            print_result(result)?;
        }
        Command::Repo { url } => {
            let result = pipeline.run_repo_job(&url).await;
            print_result(result)?;
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("bucket_ferry=info,warn"),
            1 => EnvFilter::new("bucket_ferry=debug,info"),
            2 => EnvFilter::new("bucket_ferry=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn build_pipeline(config: &Config) -> anyhow::Result<Pipeline> {
    Pipeline::from_config(config).context("Failed to set up the pipeline")
}

/// Token cancelled by the first Ctrl-C
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping crawl");
            cancel.cancel();
        }
    });
    token
}

/// Prints the job outcome as the API would answer it
fn print_result(result: Result<bucket_ferry::JobReport, JobError>) -> anyhow::Result<()> {
    match result {
        Ok(report) => {
            let response = JobResponse::from(report);
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(e) => {
            let response = ErrorResponse {
                error: e.source.to_string(),
                stage: e.stage,
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
            if e.stage == Stage::Validation {
                anyhow::bail!("Invalid input: {}", e.source);
            }
            Err(anyhow::Error::new(e).context("Job failed"))
        }
    }
}
