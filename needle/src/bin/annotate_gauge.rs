//! Highlight the needle in a gauge photograph using precomputed masks.
//!
//! ```bash
//! cargo run --release --bin annotate_gauge -- \
//!     --image gauge.jpg --mask needle_0.png --output gauge_annotated.png
//!
//! # Alternate rendering, JSON report, keep going past empty masks
//! cargo run --release --bin annotate_gauge -- \
//!     --image gauge.jpg --mask a.png --mask b.png --output out.png \
//!     --mode gradient-arrow --report out.json --skip-undetectable
//! ```
//!
//! Settings are layered: `--config` file, then the `CONF_THRESHOLD` and
//! `IOU_THRESHOLD` environment variables, then command line flags.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use needle::{AnnotatorConfig, InstancePolicy, NeedleAnnotator, PrecomputedSegmenter, RenderMode};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Highlight the needle in an analog gauge photograph",
    long_about = "Reads a gauge photograph and one needle mask per detected instance, \
        locates each needle's tip relative to the image center and writes an annotated \
        copy of the photograph.\n\n\
        Masks are grayscale images; pixels brighter than half scale belong to the needle. \
        They are resized to the photograph when their dimensions differ."
)]
struct Args {
    #[arg(short, long, help = "Gauge photograph to annotate")]
    image: PathBuf,

    #[arg(
        short,
        long = "mask",
        required = true,
        help = "Needle mask image, one per instance (repeatable)"
    )]
    masks: Vec<PathBuf>,

    #[arg(short, long, help = "Where to write the annotated image")]
    output: PathBuf,

    #[arg(long, help = "Write a JSON report of the per-instance geometry here")]
    report: Option<PathBuf>,

    #[arg(long, help = "JSON annotator configuration file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Minimum instance confidence (overrides config and environment)")]
    confidence: Option<f32>,

    #[arg(long, help = "Overlap threshold for suppressing duplicate instances")]
    iou: Option<f32>,

    #[arg(long, value_enum, help = "Needle rendering style")]
    mode: Option<RenderMode>,

    #[arg(
        long,
        help = "Keep processing instances after one without a detectable tip",
        long_help = "By default an instance whose mask has no needle pixels stops the run \
            and later instances are not drawn. With this flag such instances are \
            highlighted and skipped, and the remaining instances are still processed."
    )]
    skip_undetectable: bool,
}

fn build_config(args: &Args) -> Result<AnnotatorConfig> {
    let mut config = match &args.config {
        Some(path) => AnnotatorConfig::load_from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AnnotatorConfig::default(),
    };
    config
        .apply_env_overrides()
        .context("invalid threshold in environment")?;

    if let Some(confidence) = args.confidence {
        config.thresholds.confidence = confidence;
    }
    if let Some(iou) = args.iou {
        config.thresholds.iou = iou;
    }
    if let Some(mode) = args.mode {
        config.render_mode = mode;
    }
    if args.skip_undetectable {
        config.instance_policy = InstancePolicy::SkipUndetectable;
    }
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = build_config(&args)?;
    info!(
        "Thresholds: confidence {:.2}, IoU {:.2}; mode {:?}",
        config.thresholds.confidence, config.thresholds.iou, config.render_mode
    );
    let annotator = NeedleAnnotator::new(config)?;

    let mut model = PrecomputedSegmenter::new(args.masks.clone());
    model.load().context("failed to load needle masks")?;

    let image = image::open(&args.image)
        .with_context(|| format!("failed to open image {}", args.image.display()))?
        .to_rgb8();

    let (annotated, report) = annotator.process_image_detailed(&image, &model)?;

    if let Some(parent) = args.output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    annotated
        .save(&args.output)
        .with_context(|| format!("failed to save {}", args.output.display()))?;
    info!("Wrote annotated image to {}", args.output.display());

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        info!("Wrote report to {}", path.display());
    }

    println!("{}", report.status);
    Ok(())
}
