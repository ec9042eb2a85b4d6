//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `advise` - Purchase recommendation, image identification, chat
//! - `summary` - Financial summary for a profile file
//! - `prompts` - Prompt library management commands
//! - `status` - Backend and model configuration
//! - `serve` - Proxy server command

pub mod advise;
pub mod prompts;
pub mod serve;
pub mod status;
pub mod summary;

use std::path::Path;

use anyhow::{Context, Result};
use munger_core::{AIClient, FinancialProfile, ImageInput, PurchaseAdvisor};

// Re-export command functions for main.rs
pub use advise::*;
pub use prompts::*;
pub use serve::*;
pub use status::*;
pub use summary::*;

/// Build the advisor from the environment and the user's overrides
pub fn open_advisor() -> Result<PurchaseAdvisor> {
    let client = AIClient::from_env().context(
        "No AI backend configured. Set GEMINI_API_KEY (or AI_BACKEND=mock for testing)",
    )?;
    PurchaseAdvisor::load(client).context("Failed to load prompts or model configuration")
}

/// Read a financial profile JSON file
pub fn load_profile(path: &Path) -> Result<FinancialProfile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid profile JSON: {}", path.display()))
}

/// Read an image file, guessing the MIME type from its extension
pub fn read_image(path: &Path) -> Result<ImageInput> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read image: {}", path.display()))?;
    if bytes.is_empty() {
        anyhow::bail!("Image file is empty: {}", path.display());
    }
    Ok(ImageInput::new(bytes, mime_for_path(path)))
}

pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "image/jpeg",
    }
}

/// Format a dollar amount with thousands separators
pub fn format_money(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();

    let mut grouped = String::new();
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("{}${}.{:02}", sign, grouped, cents % 100)
}
