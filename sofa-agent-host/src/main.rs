//! SOFA Agent Host - one compatibility check per run
//!
//! Prints the `macos_compatibility` row as JSON on stdout; logs go to stderr.

use anyhow::{Context, Result};
use sofa_agent_host::host::SystemHostFacts;
use sofa_agent_host::table::TABLE_NAME;
use sofa_agent_host::{generate, AgentConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sofa_agent_host=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("SOFA Agent Host v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match AgentConfig::load().await {
        Ok(config) => config,
        Err(e) => {
            warn!("{:#}, using default configuration", e);
            AgentConfig::default()
        }
    };

    info!("Generating {} row", TABLE_NAME);
    let host = SystemHostFacts::new(&config.host);
    let row = generate(&config, &host).await;

    let payload = serde_json::to_string_pretty(&row).context("Failed to serialize result row")?;
    println!("{}", payload);

    Ok(())
}
