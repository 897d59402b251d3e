//! Buzzwin node binary
//!
//! Serves the karma and ritual ledger over HTTP.

use buzzwin_node::{BuzzwinNode, NodeConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "buzzwin_node=info,buzzwin_karma=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Buzzwin node");

    let config = NodeConfig::from_env()?;

    let node = BuzzwinNode::new(config)?;
    node.run().await?;

    Ok(())
}
