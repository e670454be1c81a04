use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use engage_core::{EncodingMode, OutcomeEvent, OutcomeEventParams};
use tracing::debug;

#[derive(Debug, Args)]
pub struct OutcomeArgs {
    /// JSON file holding v2 outcome params
    pub params: PathBuf,

    /// Print the compact backend encoding instead of the full one
    #[arg(long)]
    pub compact: bool,
}

pub fn run(args: OutcomeArgs) -> Result<()> {
    let contents = std::fs::read_to_string(&args.params)
        .with_context(|| format!("Failed to read {}", args.params.display()))?;
    let json = convert(&contents, encoding_mode(args.compact))?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn encoding_mode(compact: bool) -> EncodingMode {
    if compact {
        EncodingMode::Compact
    } else {
        EncodingMode::Full
    }
}

fn convert(raw_params: &str, mode: EncodingMode) -> Result<serde_json::Value> {
    let params: OutcomeEventParams =
        serde_json::from_str(raw_params).context("Invalid outcome params")?;
    let event = OutcomeEvent::from_params(&params);
    debug!(%event, "Converted outcome params");
    Ok(event.to_json(mode))
}
