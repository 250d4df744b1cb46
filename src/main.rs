use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use rep_coach::settings::{ClientConfig, ConfigStore};
use rep_coach::RunOptions;

/// Stream webcam frames to a pose-coaching server and show its feedback.
#[derive(Parser, Debug)]
#[command(name = "rep-coach", version, about)]
struct Cli {
    /// JSON configuration file. Defaults apply when it does not exist.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Server origin, e.g. `http://127.0.0.1:8000`.
    #[arg(long)]
    origin: Option<String>,

    /// Exercise selected at startup.
    #[arg(long)]
    exercise: Option<String>,

    /// Start a session as soon as the client is up.
    #[arg(long)]
    autostart: bool,

    /// Exit after this many seconds.
    #[arg(long, value_name = "SECS")]
    run_for: Option<f64>,

    /// Directory that receives the latest annotated frame.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Write the effective configuration to this path and exit.
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,
}

impl Cli {
    fn load_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ConfigStore::new(path)
                .load()
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => ClientConfig::default(),
        };
        config.apply_env_overrides();

        if let Some(origin) = &self.origin {
            config.origin.clone_from(origin);
        }
        if let Some(exercise) = &self.exercise {
            config.default_exercise.clone_from(exercise);
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.clone());
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    fn run_for(&self) -> Result<Option<Duration>> {
        self.run_for
            .map(|secs| {
                Duration::try_from_secs_f64(secs)
                    .with_context(|| format!("--run-for must be non-negative, got {secs}"))
            })
            .transpose()
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("rep_coach=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    if let Some(path) = &cli.write_config {
        ConfigStore::new(path)
            .save(&config)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        tracing::info!("Configuration written to {}", path.display());
        return Ok(());
    }

    let run_for = cli.run_for()?;
    let shutdown = async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for ctrl-c: {e}");
                std::future::pending::<()>().await;
            }
        };
        match run_for {
            Some(limit) => {
                tokio::select! {
                    () = tokio::time::sleep(limit) => {}
                    () = ctrl_c => {}
                }
            }
            None => ctrl_c.await,
        }
    };

    let options = RunOptions {
        autostart: cli.autostart,
        interactive: true,
    };
    let stats = rep_coach::run(&config, options, shutdown)
        .await
        .context("Failed to start the session client")?;

    tracing::info!(
        "Shutting down after {} frames sent, {} results rendered",
        stats.frames_sent,
        stats.results_rendered
    );
    Ok(())
}
