//! Runs Tibetan OCR over a directory of page images.
//!
//! # Usage
//!
//! ```bash
//! tibetan-ocr \
//!     --line-model models/line_model.onnx \
//!     --ocr-model models/easter.onnx \
//!     --charset models/charset.json \
//!     --input-dir Output \
//!     --iiif-manifest https://iiifpres.bdrc.io/vo:bdr:I1KG81132/manifest \
//!     --export-formats xml,text
//! ```
//!
//! With `--iiif-manifest` the pages are first downloaded below
//! `<input-dir>/Downloaded/<volume>` and the pipeline runs over that folder.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tibetan_ocr::core::config::{InferenceMode, OutputEncoding, PipelineConfig};
use tibetan_ocr::manifest::download_manifest;
use tibetan_ocr::pipeline::InferencePipeline;
use tibetan_ocr::utils::init_tracing_with_default;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "tibetan-ocr")]
#[command(about = "Line segmentation and recognition for Tibetan page images")]
struct Args {
    /// Line segmentation model (ONNX).
    #[arg(long)]
    line_model: PathBuf,

    /// Line recognition model (ONNX).
    #[arg(long)]
    ocr_model: PathBuf,

    /// Charset the recognition model was trained with (JSON or one token per line).
    #[arg(long)]
    charset: PathBuf,

    /// Directory of page images, or the download root when a manifest is given.
    #[arg(long)]
    input_dir: PathBuf,

    /// IIIF manifest to download pages from before running.
    #[arg(long)]
    iiif_manifest: Option<String>,

    /// Maximum number of manifest images; 0 or negative downloads all.
    #[arg(long, allow_hyphen_values = true)]
    file_limit: Option<i64>,

    /// Comma-separated export formats: text, xml, prodigy.
    #[arg(long, value_delimiter = ',')]
    export_formats: Vec<String>,

    /// `batched` or `sequential` recognition.
    #[arg(long)]
    mode: Option<InferenceMode>,

    /// `unicode` or `wylie` output.
    #[arg(long)]
    encoding: Option<OutputEncoding>,

    /// Write mask overlays to `<input-dir>/line_predictions`.
    #[arg(long)]
    control_images: bool,

    /// Fail on unknown export formats instead of skipping them.
    #[arg(long)]
    strict_formats: bool,

    /// JSON pipeline configuration; command-line flags take precedence.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    init_tracing_with_default("info");
    let args = Args::parse();

    if !args.line_model.is_file() || !args.ocr_model.is_file() {
        error!(
            "No valid model paths were provided: line model {}, OCR model {}",
            args.line_model.display(),
            args.ocr_model.display()
        );
        std::process::exit(1);
    }

    if let Err(e) = run(args) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    config.line.model_path = args.line_model;
    config.ocr.model_path = args.ocr_model;
    config.ocr.charset_path = args.charset;

    let formats: Vec<String> = args
        .export_formats
        .iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect();
    if !formats.is_empty() {
        config.run.export_formats = formats;
    }
    if let Some(mode) = args.mode {
        config.run.mode = mode;
    }
    if let Some(encoding) = args.encoding {
        config.run.encoding = encoding;
    }
    config.run.write_control_image |= args.control_images;
    config.run.strict_formats |= args.strict_formats;
    if let Some(limit) = args.file_limit {
        config.download.file_limit = limit;
    }

    let input_dir = match &args.iiif_manifest {
        Some(url) => {
            info!("running inference from IIIF manifest {}", url);
            let summary = download_manifest(url, &args.input_dir, &config.download)
                .with_context(|| format!("failed to download manifest {url}"))?;
            summary.directory
        }
        None => args.input_dir,
    };

    let pipeline = InferencePipeline::from_config(&config).context("failed to build pipeline")?;
    let stats = pipeline
        .run(&input_dir, &config.run)
        .with_context(|| format!("OCR run over {} failed", input_dir.display()))?;
    info!("{}", stats);
    Ok(())
}
