use mlconvert::error::Result;
use mlconvert::{coreml, fetch, onnx};
use std::path::Path;

/// InsightFace buffalo_l release archive.
const MODEL_URL: &str =
    "https://github.com/deepinsight/insightface/releases/download/v0.7/buffalo_l.zip";
/// Temporary archive file, removed after extraction.
const ARCHIVE_PATH: &str = "buffalo_l.zip";
/// Extracted model directory; its existence skips the download entirely.
const MODEL_DIR: &str = "buffalo_l";
/// Recognition model inside the archive.
const ONNX_PATH: &str = "buffalo_l/w600k_r50.onnx";
/// Converted output, overwritten on every run.
const OUTPUT_PATH: &str = "BuffaloL.mlmodel";

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Step 1: Download and extract the ONNX model
    fetch::ensure_model(MODEL_URL, Path::new(MODEL_DIR), Path::new(ARCHIVE_PATH))?;

    // Step 2: Load and verify the ONNX model
    let onnx_model = onnx::load(Path::new(ONNX_PATH))?;
    onnx::check_model(&onnx_model)?;
    println!("✅ ONNX model is valid");

    // Step 3: Convert to CoreML
    println!("🔁 Converting to CoreML...");
    let mlmodel = coreml::convert(&onnx_model)?;

    // Step 4: Save the model
    mlmodel.save(Path::new(OUTPUT_PATH))?;
    println!("✅ Saved CoreML model to {OUTPUT_PATH}");

    Ok(())
}
