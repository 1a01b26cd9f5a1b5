//! redshift-unload — run one Redshift UNLOAD export described by a job file.
//!
//! Connections are read from `UNLOAD_CONN_<ID>` env vars (JSON), optionally
//! prefixed by the active profile.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use unload_core::config::load_dotenv;
use unload_core::{Config, EnvConnectionStore};
use unload_redshift::{AwsCredentialProvider, RedshiftExecutorFactory, RedshiftToS3, UnloadParams};

// ── CLI ─────────────────────────────────────────────────────────────

/// Export a Redshift table or query to S3 with UNLOAD.
#[derive(Parser, Debug)]
#[command(name = "redshift-unload", version, about)]
struct Cli {
    /// Path to the job file (TOML, or JSON with a `.json` extension).
    #[arg(long)]
    job: PathBuf,

    /// Config profile; keys are looked up as `{PROFILE}_{KEY}` first.
    #[arg(long, env = "UNLOAD_PROFILE", default_value = "")]
    profile: String,

    /// Print the statement with a placeholder credentials clause and exit.
    #[arg(long)]
    dry_run: bool,
}

fn load_params(path: &Path) -> anyhow::Result<UnloadParams> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read job file {}", path.display()))?;

    let params = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&raw).context("invalid JSON job file")?
    } else {
        toml::from_str(&raw).context("invalid TOML job file")?
    };
    Ok(params)
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = Config::for_profile(&cli.profile);
    config.log_summary();

    let params = load_params(&cli.job)?;
    let task = RedshiftToS3::new(params)?;
    info!(path = %cli.job.display(), "loaded job file");

    if cli.dry_run {
        println!("{}", task.statement_with_clause("<credentials>"));
        return Ok(());
    }

    let store = Arc::new(EnvConnectionStore::new(&config.profile));
    let executors = RedshiftExecutorFactory::new(store.clone(), config.aws.clone());
    let credentials = AwsCredentialProvider::new(store, config.aws.clone());

    task.execute(&executors, &credentials).await?;
    info!("redshift-unload exited cleanly");

    Ok(())
}
