mod client;

use crate::client::{MonitorClient, StatusReply, SummaryReply};
use chrono::Local;
use clap::Parser;
use color_eyre::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;
use walkdir::WalkDir;

/// Capture-side driver: ships snapshot frames to the monitoring server in
/// batches and reports session feedback. Frame grabbing itself is left to an
/// external tool writing into the capture directory.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Base URL of the monitoring server.
    #[clap(long, default_value = "http://localhost:8000")]
    server_url: String,

    /// Directory the webcam grabber drops snapshot frames into.
    #[clap(long, default_value = "webcam_captures")]
    capture_dir: PathBuf,

    /// Job id for this session; derived from the start time when omitted.
    #[clap(long)]
    job_id: Option<String>,

    /// Seconds between scans for new snapshots.
    #[clap(long, default_value_t = 5)]
    capture_interval: u64,

    /// Seconds between job status checks.
    #[clap(long, default_value_t = 10)]
    status_interval: u64,

    /// Snapshots per analysis batch.
    #[clap(long, default_value_t = 5)]
    batch_size: usize,

    /// Delete snapshots once their batch has been submitted.
    #[clap(long, default_value_t = false, action)]
    delete_submitted: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    color_eyre::install()?;

    let args = Args::parse();
    let job_id = args
        .job_id
        .clone()
        .unwrap_or_else(|| format!("session_{}", Local::now().format("%Y%m%d_%H%M%S")));
    info!("Started monitoring session with job ID: {}", job_id);

    let client = MonitorClient::new(&args.server_url, &job_id);
    run_capture_loop(&args, &client).await?;

    info!("Waiting for final processing...");
    time::sleep(Duration::from_secs(5)).await;
    print_session_summary(&client).await;

    Ok(())
}

/// Scans for fresh snapshots on an interval, submitting a batch whenever
/// enough have accumulated, until Ctrl-C. The leftover partial batch is
/// flushed on the way out.
async fn run_capture_loop(args: &Args, client: &MonitorClient) -> Result<()> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut batch: Vec<String> = Vec::new();
    let mut capture_tick = time::interval(Duration::from_secs(args.capture_interval.max(1)));
    let mut status_tick = time::interval(Duration::from_secs(args.status_interval.max(1)));
    // Swallow the immediate first ticks so both cadences start one interval in.
    capture_tick.tick().await;
    status_tick.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping capture");
                break;
            }
            _ = capture_tick.tick() => {
                for snapshot in scan_new_snapshots(&args.capture_dir, &seen) {
                    batch.push(snapshot.to_string_lossy().into_owned());
                    seen.insert(snapshot);
                }
                while batch.len() >= args.batch_size.max(1) {
                    let images: Vec<String> = batch.drain(..args.batch_size.max(1)).collect();
                    submit_batch(client, &images, args.delete_submitted).await;
                }
            }
            _ = status_tick.tick() => {
                report_status(client).await;
            }
        }
    }

    if !batch.is_empty() {
        let images: Vec<String> = batch.drain(..).collect();
        submit_batch(client, &images, args.delete_submitted).await;
    }
    Ok(())
}

/// New snapshot files in the capture directory, oldest name first.
fn scan_new_snapshots(dir: &Path, seen: &HashSet<PathBuf>) -> Vec<PathBuf> {
    let mut fresh: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| is_snapshot(path) && !seen.contains(path))
        .collect();
    fresh.sort();
    fresh
}

fn is_snapshot(path: &Path) -> bool {
    let Some(extension) = path.extension().map(|e| e.to_string_lossy().to_lowercase()) else {
        return false;
    };
    matches!(extension.as_str(), "jpg" | "jpeg" | "png")
}

async fn submit_batch(client: &MonitorClient, images: &[String], delete_submitted: bool) {
    match client.analyze_images(images).await {
        Ok(ack) => {
            match ack.queue_position {
                Some(position) => info!(status = %ack.status, position, "{}", ack.message),
                None => info!(status = %ack.status, "{}", ack.message),
            }
            if delete_submitted {
                for image in images {
                    if let Err(error) = tokio::fs::remove_file(image).await {
                        warn!(%image, %error, "could not delete submitted snapshot");
                    }
                }
            }
        }
        Err(error) => warn!(%error, "failed to submit batch"),
    }
}

async fn report_status(client: &MonitorClient) {
    match client.job_status().await {
        Ok(StatusReply::Entry {
            timestamp,
            attentiveness_rating,
            eye_contact_score,
            posture_score,
            focus_duration,
            ..
        }) => {
            info!(
                %timestamp,
                attentiveness_rating,
                eye_contact_score,
                posture_score,
                focus_duration,
                "Current student status"
            );
        }
        Ok(StatusReply::NoData { message }) => info!("{}", message),
        Err(error) => warn!(%error, "status check failed"),
    }
}

async fn print_session_summary(client: &MonitorClient) {
    match client.session_summary().await {
        Ok(SummaryReply::Report(summary)) => {
            let line = "=".repeat(50);
            println!("\n{line}");
            println!("SESSION SUMMARY");
            println!("{line}");
            println!("\nMETRICS:");
            println!("Total Entries: {}", summary.metrics.total_entries);
            println!(
                "Average Attentiveness: {:.2}/10",
                summary.metrics.average_attentiveness
            );
            println!(
                "Average Eye Contact: {:.2}/10",
                summary.metrics.average_eye_contact
            );
            println!("Average Posture: {:.2}/10", summary.metrics.average_posture);
            println!(
                "Total Focus Duration: {} seconds",
                summary.metrics.total_focus_duration
            );
            println!("\nDETAILED ANALYSIS:");
            println!("{}", summary.analysis);
            println!("{line}");
        }
        Ok(SummaryReply::NoData { message }) => info!("{}", message),
        Err(error) => warn!(%error, "could not fetch session summary"),
    }
}
