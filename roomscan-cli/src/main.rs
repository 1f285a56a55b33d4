//! Room scan command-line tool.
//!
//! # Usage
//!
//! ```bash
//! # Process a batch and print the scan result as JSON
//! roomscan process --scan-id kitchen frames/*.jpg --trajectory trajectory.json
//!
//! # With depth maps, a custom config and a PLY export of the fused cloud
//! roomscan process --scan-id kitchen frames/*.jpg --depth depth/*.png \
//!     --config configs/roomscan.yaml --export-ply kitchen.ply --finalize
//!
//! # Print the effective configuration
//! roomscan config
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use roomscan_io::{read_blobs, read_trajectory, write_scan_cloud_file};
use roomscan_pipeline::{ScanConfig, ScanProcessor, ScanRequest};

#[derive(Parser)]
#[command(name = "roomscan")]
#[command(about = "Room geometry from posed RGB-D frames")]
struct Args {
    /// YAML configuration file (default: configs/roomscan.yaml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one batch of frames and print the result as JSON
    Process {
        /// Scan session identifier
        #[arg(long, default_value = "scan")]
        scan_id: String,

        /// Color frames, in capture order
        #[arg(required = true)]
        frames: Vec<PathBuf>,

        /// Depth maps, index-aligned with the frames
        #[arg(long, num_args = 1..)]
        depth: Vec<PathBuf>,

        /// Trajectory JSON file
        #[arg(short, long)]
        trajectory: Option<PathBuf>,

        /// Write the fused cloud to this PLY file
        #[arg(long)]
        export_ply: Option<PathBuf>,

        /// Print the finalized record with artifact links
        #[arg(long)]
        finalize: bool,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the effective configuration as YAML
    Config,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ScanConfig::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => ScanConfig::load_default().context("loading default config")?,
    };

    match args.command {
        Commands::Config => {
            print!("{}", config.to_yaml()?);
        }
        Commands::Process {
            scan_id,
            frames,
            depth,
            trajectory,
            export_ply,
            finalize,
            pretty,
        } => {
            let mut request = ScanRequest::new(scan_id.clone(), read_blobs(&frames));
            if !depth.is_empty() {
                request = request.with_depth(read_blobs(&depth));
            }
            if let Some(path) = &trajectory {
                let points =
                    read_trajectory(path).with_context(|| format!("reading trajectory {}", path.display()))?;
                request = request.with_trajectory(points);
            }

            let processor = ScanProcessor::new(config).context("invalid configuration")?;
            tracing::info!(
                scan_id = %scan_id,
                frames = request.frames.len(),
                classifier = ?processor.classifier_selection(),
                "processing scan"
            );
            let processed = processor
                .process_with_cloud(&request)
                .with_context(|| format!("processing scan {scan_id}"))?;

            if let Some(path) = &export_ply {
                write_scan_cloud_file(&processed.cloud, path)
                    .with_context(|| format!("writing {}", path.display()))?;
                tracing::info!(path = %path.display(), points = processed.cloud.len(), "exported fused cloud");
            }

            let json = if finalize {
                to_json(&processor.finalize(&scan_id), pretty)?
            } else {
                to_json(&processed.result, pretty)?
            };
            println!("{json}");
        }
    }

    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}
