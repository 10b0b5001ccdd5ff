//! Convo-map server binary
//!
//! Run with: cargo run -p convo-map --bin convo-map-server
//! Set CONVO_MAP_CONFIG to a TOML file to override the defaults.

use convo_map::{config::AppConfig, server::ConvoMapServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "convo_map=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                         Convo Map                         ║
║         Chat History Import with Topic Labeling           ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    let config = AppConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Database: {}", config.storage.database_path.display());
    tracing::info!("  - Labeling backend: {:?} ({})", config.llm.backend, config.llm.model);
    tracing::info!(
        "  - Batch size: {}, attempts per message: {}",
        config.labeling.batch_size,
        config.labeling.max_attempts
    );

    let server = ConvoMapServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/conversations/import              - Upload chat exports");
    println!("  GET  /api/conversations                     - List conversations");
    println!("  POST /api/conversations/:id/generate-topics - Label messages (SSE)");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
