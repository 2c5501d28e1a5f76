mod auth;
mod config;
mod host;
mod notifier;
mod scheduler;
mod youtube;

use anyhow::{Context, Result};
use auth::{Authenticator, InstalledAppFlow};
use chrono::Local;
use clap::{Parser, Subcommand};
use comfy_table::Table;
use common::{ReleaseQueue, VideoFile, VideoId};
use config::{Config, LoggingConfig};
use host::VideoHost;
use notifier::Notifier;
use scheduler::ReleaseScheduler;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use youtube::YouTubeClient;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (.yaml, .yml or .toml)
    #[arg(short, long, global = true, env = "CLIPDROP_CONFIG")]
    config: Option<PathBuf>,
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the upload order for a folder without uploading anything
    Scan {
        dir: PathBuf,
        /// Print CSV instead of a table
        #[arg(long)]
        csv: bool,
    },
    /// Upload a folder as private videos and schedule one public release per day
    Upload {
        dir: PathBuf,
        /// Keep running and publish each video when its release time comes
        #[arg(long)]
        wait: bool,
        /// Write the scheduled releases to a CSV file
        #[arg(long, value_name = "FILE")]
        plan: Option<PathBuf>,
    },
    /// Make already uploaded videos public right away
    Publish {
        #[arg(required = true)]
        video_ids: Vec<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    setup_logging(&config.logging, cli.verbose)?;

    match cli.command {
        Commands::Scan { dir, csv } => scan(&config, &dir, csv),
        Commands::Upload { dir, wait, plan } => upload(&config, &dir, wait, plan.as_deref()).await,
        Commands::Publish { video_ids } => publish(&config, video_ids).await,
    }
}

#[derive(Serialize)]
struct ScanRow<'a> {
    position: usize,
    filename: &'a str,
    category: &'a str,
    sequence: Option<u64>,
    public_after_days: usize,
}

fn scan_rows(files: &[VideoFile]) -> Vec<ScanRow<'_>> {
    files
        .iter()
        .enumerate()
        .map(|(idx, file)| ScanRow {
            position: idx + 1,
            filename: &file.filename,
            category: &file.category,
            sequence: file.sequence_number,
            public_after_days: idx + 1,
        })
        .collect()
}

fn select(config: &Config, dir: &Path) -> Result<Vec<VideoFile>> {
    common::select_ordered(dir, &config.selection)
        .with_context(|| format!("Cannot select videos from {}", dir.display()))
}

fn scan(config: &Config, dir: &Path, csv: bool) -> Result<()> {
    let files = select(config, dir)?;
    let rows = scan_rows(&files);

    if csv {
        let mut writer = csv::Writer::from_writer(std::io::stdout());
        for row in &rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "File", "Category", "Sequence", "Public after"]);
    for row in &rows {
        table.add_row(vec![
            row.position.to_string(),
            row.filename.to_string(),
            row.category.to_string(),
            row.sequence.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string()),
            format!("{} day(s)", row.public_after_days),
        ]);
    }
    println!("{table}");
    println!("{} video(s) selected from {}", files.len(), dir.display());
    Ok(())
}

async fn connect(config: &Config) -> Result<YouTubeClient> {
    let secrets = auth::read_client_secrets(&config.auth.client_secrets)
        .await
        .context("Authentication failed")?;
    let flow = InstalledAppFlow::new(secrets, config.auth.scope.clone(), config.auth.token_cache.clone());
    let session = flow.authenticate().await.context("Authentication failed")?;
    Ok(YouTubeClient::new(session))
}

async fn upload(config: &Config, dir: &Path, wait: bool, plan: Option<&Path>) -> Result<()> {
    let files = select(config, dir)?;
    if files.is_empty() {
        log::info!("No eligible videos in {}", dir.display());
        return Ok(());
    }
    log::info!("Selected {} video(s) from {}", files.len(), dir.display());

    let mut host = connect(config).await?;
    let mut scheduler = ReleaseScheduler::new(config.upload.clone(), Notifier::new(config.notifications.clone()));
    let report = scheduler.schedule_releases(&files, &mut host, Local::now).await;

    log::info!(
        "{} video(s) scheduled, {} upload(s) failed",
        report.scheduled.len(),
        report.failures.len()
    );
    for failure in &report.failures {
        log::error!("  #{} {}: {}", failure.position + 1, failure.filename, failure.error);
    }

    if let Some(path) = plan {
        export_plan(path, scheduler.queue());
    }

    if wait {
        let poll_interval = Duration::from_secs(config.schedule.poll_interval_secs);
        scheduler.run(&mut host, poll_interval).await;
    } else if !scheduler.queue().is_empty() {
        log::warn!(
            "{} release(s) are held in memory only and will not be published; use --wait, or `clipdrop publish` later",
            scheduler.queue().len()
        );
    }

    Ok(())
}

async fn publish(config: &Config, video_ids: Vec<String>) -> Result<()> {
    let mut host = connect(config).await?;
    for id in video_ids.into_iter().map(VideoId) {
        match host.set_public(&id).await {
            Ok(()) => log::info!("Video {} is now public", id),
            Err(e) => log::error!("Failed to publish {}: {}", id, e),
        }
    }
    Ok(())
}

fn write_plan(path: &Path, queue: &ReleaseQueue) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for release in queue.pending() {
        writer.serialize(release)?;
    }
    writer.flush()?;
    Ok(())
}

/// The videos are already uploaded at this point, so a failed export must
/// not stop them from being published.
fn export_plan(path: &Path, queue: &ReleaseQueue) -> bool {
    match write_plan(path, queue) {
        Ok(()) => {
            log::info!("Release plan written to {}", path.display());
            true
        }
        Err(e) => {
            log::error!("Could not write release plan: {:#}", e);
            false
        }
    }
}

fn setup_logging(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        config.level.parse().unwrap_or(log::LevelFilter::Info)
    };

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                chrono::Local::now().format("%Y-%m-%d][%H:%M:%S"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .level_for("reqwest", log::LevelFilter::Warn)
        .level_for("hyper", log::LevelFilter::Warn)
        .chain(std::io::stdout());

    if let Some(path) = &config.output {
        let file = fern::log_file(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        dispatch = dispatch.chain(file);
    }

    dispatch.apply()?;
    Ok(())
}
