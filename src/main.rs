use anyhow::{Context, Result, bail};
use clap::Parser;
use image::{DynamicImage, ImageReader};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use signspot::debug::annotate;
use signspot::{DebugDump, ProposalConfig, ProposalExtractor, ProposalSet};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

#[derive(Parser)]
#[command(name = "signspot")]
#[command(about = "Propose traffic sign regions from shape and saturation cues")]
struct Cli {
    /// Image file, or directory of images
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// JSON file with proposal parameters
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write annotated copies of each image to this directory
    #[arg(long, value_name = "DIR")]
    results_dir: Option<PathBuf>,

    /// Save intermediate masks per image to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Pixels added around each proposal box
    #[arg(long)]
    margin: Option<u32>,

    /// Binarization level for the saturation channel
    #[arg(long)]
    threshold: Option<u8>,

    /// Closing element radius (0 disables closing)
    #[arg(long)]
    close_radius: Option<u8>,

    /// Print one JSON object per image instead of a summary
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct ImageReport {
    image: PathBuf,
    width: u32,
    height: u32,
    proposals: ProposalSet,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&args)?;
    let extractor = ProposalExtractor::new(config);

    let images = collect_images(&args.input)?;
    if images.is_empty() {
        bail!("No images found in {}", args.input.display());
    }
    info!("Processing {} image(s)", images.len());

    if let Some(dir) = &args.results_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create results directory {}", dir.display()))?;
    }

    let reports: Vec<ImageReport> = match &args.debug_out {
        Some(debug_root) => {
            let mut reports = Vec::new();
            for (idx, path) in images.iter().enumerate() {
                let dump_dir = debug_root.join(format!("{:03}", idx));
                let mut dump = DebugDump::new(dump_dir)?;
                if let Some(report) = process_image(&extractor, path, idx, &args, Some(&mut dump))? {
                    reports.push(report);
                }
                if dump.failures() > 0 {
                    warn!("{} debug image(s) could not be written", dump.failures());
                }
            }
            reports
        }
        None => images
            .par_iter()
            .enumerate()
            .map(|(idx, path)| process_image(&extractor, path, idx, &args, None))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect(),
    };

    if args.json {
        for report in &reports {
            println!("{}", serde_json::to_string(report)?);
        }
    } else {
        print_summary(&reports);
    }

    Ok(())
}

fn load_config(args: &Cli) -> Result<ProposalConfig> {
    let mut config = match &args.config {
        Some(path) => ProposalConfig::from_json_file(path)?,
        None => ProposalConfig::default(),
    };
    if let Some(margin) = args.margin {
        config.margin = margin;
    }
    if let Some(threshold) = args.threshold {
        config.preprocess.threshold = threshold;
    }
    if let Some(radius) = args.close_radius {
        config.preprocess.close_radius = radius;
    }
    config.validate()?;
    Ok(config)
}

/// A file is taken as is; a directory yields its image files sorted by name
fn collect_images(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        bail!("Input does not exist: {}", input.display());
    }

    let mut images = Vec::new();
    for entry in std::fs::read_dir(input).with_context(|| format!("Failed to list {}", input.display()))? {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
        if path.is_file() && is_image {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

/// Returns `None` when the image cannot be decoded
fn process_image(
    extractor: &ProposalExtractor,
    path: &Path,
    idx: usize,
    args: &Cli,
    dump: Option<&mut DebugDump>,
) -> Result<Option<ImageReport>> {
    let img = match decode(path) {
        Ok(img) => img,
        Err(e) => {
            warn!("Skipping {}: {:#}", path.display(), e);
            return Ok(None);
        }
    };

    let proposals = match dump {
        Some(observer) => extractor.extract_observed(&img, observer),
        None => extractor.extract(&img),
    };
    info!("{}: {} proposal(s)", path.display(), proposals.len());

    if let Some(dir) = &args.results_dir {
        let out = dir.join(format!("det_{}.png", idx));
        annotate(&img, &proposals)
            .save(&out)
            .with_context(|| format!("Failed to write {}", out.display()))?;
        info!("Detection results are written to: {}", out.display());
    }

    Ok(Some(ImageReport {
        image: path.to_path_buf(),
        width: img.width(),
        height: img.height(),
        proposals,
    }))
}

fn decode(path: &Path) -> Result<DynamicImage> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))
}

fn print_summary(reports: &[ImageReport]) {
    println!("\n=== Region Proposal Results ===");
    let total: usize = reports.iter().map(|r| r.proposals.len()).sum();
    println!("Images processed: {}", reports.len());
    println!("Total proposals: {}", total);

    for report in reports {
        println!("\n{} ({}x{})", report.image.display(), report.width, report.height);
        if report.proposals.is_empty() {
            println!("  No proposals.");
        }
        for (label, bbox) in report.proposals.iter() {
            println!("  {:<10} at {}", label, bbox);
        }
    }
}
