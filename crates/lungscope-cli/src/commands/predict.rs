use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use lungscope_client::{ImageBlob, InferenceClient, InferenceConfig, Prediction};

use crate::render::render;
use crate::{print_info, print_warn};

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Path to a JPG or PNG histopathology image.
    pub image: PathBuf,
    /// Print the raw backend result as JSON instead of a summary.
    #[arg(long)]
    pub json: bool,
}

pub fn handle_command(args: PredictArgs, config: &InferenceConfig) -> anyhow::Result<()> {
    let image = ImageBlob::from_path(&args.image)?;
    let client = InferenceClient::from_config(config)?;

    log::info!(
        "Classifying {} ({} bytes, {}) over {}",
        image.filename(),
        image.size(),
        image.mime_type(),
        client.transport_kind()
    );
    print_info!("Analyzing {}...", image.filename());

    let prediction = match client.predict(Some(&image)) {
        Ok(prediction) => prediction,
        Err(e) if e.is_retryable_by_user() => {
            return Err(
                anyhow::Error::new(e).context("Select a valid JPG or PNG image and try again")
            );
        }
        Err(e) => return Err(e.into()),
    };

    write_prediction(&mut std::io::stdout().lock(), &prediction, args.json)
}

/// Writes the command result: the raw JSON with `--json`, otherwise the
/// rendered summary.
pub fn write_prediction(
    out: &mut impl Write,
    prediction: &Prediction,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&prediction.raw)?)?;
        return Ok(());
    }

    match render(prediction) {
        Some(summary) => writeln!(out, "{summary}")?,
        None => {
            print_warn!("The backend returned a result of unknown shape; showing it as-is.");
            writeln!(out, "{}", serde_json::to_string_pretty(&prediction.raw)?)?;
        }
    }
    Ok(())
}
