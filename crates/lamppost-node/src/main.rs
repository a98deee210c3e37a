//! Lamppost Node binary
//!
//! A single-process service for location-scoped anonymous notes.

use lamppost_node::{Config, Node};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lamppost_node=info,lamppost=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Lamppost Node");

    let config = Config::from_env();

    let node = Node::new(config).await?;
    node.run().await?;

    Ok(())
}
