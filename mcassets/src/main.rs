use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use app_config::{AppConfig, Cli};
use download::SourcesConfig;
use storage::FileStatus;

mod app_config;
mod download;
mod errors;
mod storage;
mod update;
mod utils;

fn init_tracing(config: &AppConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mcassets=info,libmcassets=info"));

    let (file_layer, guard) = match config.log_path() {
        Some(log_path) => {
            let directory = log_path
                .parent()
                .context("Log file has no parent directory")?
                .to_path_buf();
            let file_name = log_path
                .file_name()
                .context("Log file path does not name a file")?
                .to_owned();
            std::fs::create_dir_all(&directory)?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let config = AppConfig::from_config(&cli)?;
    let _guard = init_tracing(&config)?;
    let sources = SourcesConfig::from_config()?;

    if cli.check {
        update::check_assets(&config, &sources).await?;
        info!("Assets are up to date");
        return Ok(());
    }

    let report = update::update_assets(&config, &sources).await?;
    for written in [&report.assets, &report.atlas]
        .into_iter()
        .chain(report.debug.as_ref())
    {
        let verb = match written.status {
            FileStatus::Created => "created",
            FileStatus::Updated => "updated",
            FileStatus::Unchanged => "unchanged",
        };
        info!("{} {} (sha256 {})", written.path.display(), verb, written.sha256);
    }
    if !report.changed() {
        info!("Remote assets have not changed since the last run");
    }

    Ok(())
}
