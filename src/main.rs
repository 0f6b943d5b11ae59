use clap::Parser;
use filesentry::{config, Dispatcher, Settings};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "filesentry", about = "Rule-driven filesystem watcher")]
struct Args {
    /// Path to the YAML rule file
    #[arg(long, env = "FILESENTRY_RULES", default_value = "rules.yaml")]
    rules: PathBuf,

    /// Preview changes without moving files
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional; real environment variables win over it.
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let rules = match config::load_rules(&args.rules) {
        Ok(rules) => rules,
        Err(err) => {
            error!("rule loading failed: {}", err);
            return ExitCode::FAILURE;
        }
    };
    info!("successfully loaded {} rules", rules.len());

    let dry_run = args.dry_run || dry_run_from_env();
    if dry_run {
        info!("dry-run mode: previewing moves without touching files");
    }

    let dispatcher = Dispatcher::new(rules, Settings { dry_run });
    match dispatcher.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("watcher failed: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn dry_run_from_env() -> bool {
    matches!(
        std::env::var("DRY_RUN").as_deref(),
        Ok("true") | Ok("1")
    )
}
