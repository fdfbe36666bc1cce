use anyhow::Context as _;
use lungscope_client::{InferenceClient, InferenceConfig};

use crate::print_info;

pub fn handle_command(config: &InferenceConfig) -> anyhow::Result<()> {
    let client = InferenceClient::from_config(config)?;
    print_info!("Querying the {} backend", client.transport_kind());

    let api = client
        .describe_remote_api()
        .context("Failed to describe the remote API")?;
    println!("{}", serde_json::to_string_pretty(&api)?);
    Ok(())
}
