mod config;
mod serve;

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use scanbridge_reconcile::{ReportEnvelope, ReportOrchestrator, UploadOutcome};
use scanbridge_tracker::HttpTracker;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::ServiceConfig;

/// Scan report bridge into a vulnerability tracker.
#[derive(Parser)]
#[command(
    name = "scanbridge",
    version,
    about = "Forward scan reports into a vulnerability tracker"
)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. info, debug, scanbridge_reconcile=trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook receiver
    Serve {
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,
    },

    /// Reconcile a single report envelope read from a file
    Submit {
        /// Path to a JSON report envelope
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = match ServiceConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };
    tracing::debug!(tracker = ?config.tracker, product = config.reconcile.product_id, "configuration loaded");

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {}", e);
            process::exit(1);
        }
    };

    let orchestrator = ReportOrchestrator::new(
        Arc::new(HttpTracker::new(config.tracker)),
        config.reconcile,
    );

    match cli.command {
        Commands::Serve { host, port } => {
            if let Err(e) = rt.block_on(serve::start_server(&host, port, orchestrator)) {
                eprintln!("Server error: {}", e);
                process::exit(1);
            }
        }
        Commands::Submit { file } => {
            rt.block_on(cmd_submit(&file, &orchestrator));
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn cmd_submit(file: &Path, orchestrator: &ReportOrchestrator) {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => fail(&format!("cannot read {}: {}", file.display(), e)),
    };
    let envelope: ReportEnvelope = match serde_json::from_str(&source) {
        Ok(env) => env,
        Err(e) => fail(&format!("invalid report envelope in {}: {}", file.display(), e)),
    };

    let ack = match orchestrator.handle(&envelope).await {
        Ok(ack) => ack,
        Err(e) => fail(&e.to_string()),
    };

    if let UploadOutcome::Failed { status, detail } = &ack.upload {
        match status {
            Some(code) => eprintln!("warning: tracker rejected the upload ({}): {}", code, detail),
            None => eprintln!("warning: upload did not reach the tracker: {}", detail),
        }
    }
    match serde_json::to_string_pretty(&ack) {
        Ok(body) => println!("{}", body),
        Err(e) => fail(&e.to_string()),
    }
}

fn fail(message: &str) -> ! {
    println!(
        "{}",
        serde_json::json!({"status": "error", "message": message})
    );
    process::exit(1);
}
