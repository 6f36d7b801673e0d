//! skinscan – classify lesion photos as benign or malignant.
//!
//! Every image on the command line is decoded, scaled to the model's square
//! input, and pushed through one classification worker. Results are printed
//! one per line; high-risk verdicts are shown in red.

use anyhow::{Context, Result};
use clap::Parser;
use skinscan_classify::{
    present, Classifier, ClassifierConfig, ClassifyQueue, DisplayColor, ImageSource, Presenter,
    Verdict,
};
use skinscan_model::validate_model;
use skinscan_preprocess::{Preprocessor, ResizeFilter};
use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

// ================ CLI ================== //

/// Classify skin lesion photos with a pretrained benign/malignant model.
#[derive(Parser)]
#[command(name = "skinscan", version, about)]
struct CliArgs {
    /// Photos to classify (PNG or JPEG)
    #[arg(value_name = "IMAGE", required_unless_present = "check_model")]
    images: Vec<PathBuf>,

    /// ONNX model file; overrides the config file
    #[arg(long)]
    model: Option<PathBuf>,

    /// JSON classifier config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Square model input side
    #[arg(long)]
    side: Option<u32>,

    /// Resize filter: nearest, triangle or lanczos3
    #[arg(long)]
    filter: Option<ResizeFilter>,

    /// Write each scaled model input as <stem>_scaled.png into this directory
    #[arg(long)]
    preview_dir: Option<PathBuf>,

    /// Print one JSON object per image instead of text
    #[arg(long)]
    json: bool,

    /// Only check that the model loads, then exit
    #[arg(long)]
    check_model: bool,

    /// Debug logging (raw model outputs, model load/release)
    #[arg(short, long)]
    verbose: bool,
}

// ================ OUTPUT ================== //

/// Prints results for the image currently being processed.
struct Terminal {
    current: String,
    json: bool,
}

impl Presenter for Terminal {
    fn show_verdict(&mut self, verdict: &Verdict) {
        if self.json {
            println!("{}", verdict_json(&self.current, verdict));
            return;
        }

        let line = format!("{}: {verdict}", self.current);
        match verdict.display_color() {
            DisplayColor::Alert => println!("\x1b[31m{line}\x1b[0m"),
            DisplayColor::Normal => println!("{line}"),
        }
    }

    fn show_error(&mut self, message: &str) {
        if self.json {
            println!("{}", serde_json::json!({ "image": self.current, "error": message }));
        } else {
            eprintln!("{}: Error: {message}", self.current);
        }
    }
}

fn verdict_json(image: &str, verdict: &Verdict) -> serde_json::Value {
    serde_json::json!({
        "image": image,
        "verdict": verdict,
        "confidence_percent": verdict.confidence_text(),
        "high_risk": verdict.is_high_risk(),
        "color": verdict.display_color(),
    })
}

// ================ PIPELINE ================== //

fn load_config(args: &CliArgs) -> Result<ClassifierConfig> {
    let mut config = match &args.config {
        Some(path) => ClassifierConfig::from_json_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => ClassifierConfig::default(),
    };
    if let Some(model) = &args.model {
        config.model.model_path = model.clone();
    }
    if let Some(side) = args.side {
        config.model.input_side = side;
    }
    if let Some(filter) = args.filter {
        config.resize_filter = filter;
    }
    Ok(config)
}

fn write_preview(
    pp: &Preprocessor,
    image: &image::DynamicImage,
    src: &Path,
    dir: &Path,
) -> Result<()> {
    let stem = src
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".into());
    let out = dir.join(format!("{stem}_scaled.png"));
    pp.scale(image)?
        .save(&out)
        .with_context(|| format!("Failed to write preview {}", out.display()))?;
    log::debug!("wrote preview {}", out.display());
    Ok(())
}

fn run(args: &CliArgs) -> Result<usize> {
    let config = load_config(args)?;
    log::debug!("config: {config:?}");

    if args.check_model {
        validate_model(&config.model).context("Model check failed")?;
        println!("Model OK: {}", config.model.model_path.display());
        return Ok(0);
    }

    if let Some(dir) = &args.preview_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create preview directory {}", dir.display()))?;
    }

    let classifier = Classifier::from_config(&config).context("Invalid classifier config")?;
    let preview = classifier.preprocessor().clone();
    let queue = ClassifyQueue::spawn(classifier);

    let mut terminal = Terminal { current: String::new(), json: args.json };
    let mut failures = 0;

    for path in &args.images {
        terminal.current = path.display().to_string();

        let outcome = ImageSource::File(path.clone()).acquire().and_then(|img| {
            if let Some(dir) = &args.preview_dir {
                if let Err(e) = write_preview(&preview, &img, path, dir) {
                    log::warn!("{e:#}");
                }
            }
            queue.classify(img)
        });

        if !present(outcome, &mut terminal) {
            failures += 1;
        }
    }
    Ok(failures)
}

fn main() -> ExitCode {
    // 1) Parse CLI arguments
    let args = CliArgs::parse();

    // 2) Initialize logging
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&args) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failures) => {
            log::warn!("{failures} of {} image(s) could not be classified", args.images.len());
            ExitCode::FAILURE
        }
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
