//! Server command implementation

use std::path::Path;

use anyhow::{Context, Result};
use tally_server::ServerConfig;

use super::{default_category, open_db, store_timeout};

pub async fn cmd_serve(db_path: &Path, host: &str, port: u16, timeout_ms: Option<u64>) -> Result<()> {
    println!("🚀 Starting Tally web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);

    // Parse allowed CORS origins from environment (comma-separated)
    let allowed_origins: Vec<String> = std::env::var("TALLY_ALLOWED_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let config = ServerConfig {
        allowed_origins,
        default_category: default_category(),
        store_timeout: store_timeout(timeout_ms),
    };

    println!("   Default category: {}", config.default_category);
    println!("   Store timeout: {} ms", config.store_timeout.as_millis());
    if config.allowed_origins.is_empty() {
        println!("   CORS: same-origin only");
    } else {
        println!("   CORS: {}", config.allowed_origins.join(", "));
    }
    println!();

    let db = open_db(db_path)?;
    db.seed_default_category(&config.default_category)
        .context("Failed to seed default category")?;

    tally_server::serve(db, host, port, config).await
}
