use anyhow::{bail, Result};

use crate::config::Config;
use crate::llm::factory;

/// Send one raw prompt to the configured provider and print the reply.
/// Handy for checking credentials and endpoints before a full run.
pub async fn run(text: String, config_path: Option<String>, dry_run: bool) -> Result<String> {
    if text.trim().is_empty() {
        bail!("Prompt must not be empty");
    }

    let config = Config::load_with_path(config_path)?;
    config.validate()?;
    let client = factory::create_client(&config, dry_run)?;
    let reply = client.complete(&text).await?;
    println!("{}", reply.trim());
    Ok(reply)
}
