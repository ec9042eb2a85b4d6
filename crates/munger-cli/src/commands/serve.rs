//! Server command implementation

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use munger_server::ServerConfig;

pub async fn cmd_serve(
    host: &str,
    port: u16,
    uploads_dir: PathBuf,
    static_dir: Option<&Path>,
) -> Result<()> {
    println!("🚀 Starting Munger proxy server...");
    println!("   Listening: http://{}:{}", host, port);
    println!("   Uploads: {}", uploads_dir.display());
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }
    if std::env::var("GEMINI_API_KEY").is_err() && std::env::var("AI_BACKEND").is_err() {
        println!();
        println!("   ⚠️  GEMINI_API_KEY not set - AI routes will answer 503");
    }
    println!();

    let static_dir = static_dir.map(|p| p.to_string_lossy().into_owned());
    let config = ServerConfig { uploads_dir };

    munger_server::serve(host, port, static_dir.as_deref(), config)
        .await
        .context("Server failed")
}
