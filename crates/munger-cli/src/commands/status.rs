//! Status command implementation

use anyhow::Result;
use munger_core::prompts::default_prompts_dir;
use munger_core::{AIBackend, AIClient, ModelConfig, TaskType};

/// Show backend, per-task models and override locations
pub async fn cmd_status() -> Result<()> {
    println!("🔍 Munger status\n");

    let models = ModelConfig::load()?;
    let forced_model = std::env::var("GEMINI_MODEL").ok().filter(|m| !m.is_empty());

    match AIClient::from_env() {
        Some(client) => {
            println!("  Backend: {} ({})", client.backend_name(), client.host());
            print!("  Connection: ");
            if client.health_check().await {
                println!("✅ Connected");
            } else {
                println!("❌ Not responding");
            }
        }
        None => {
            println!("  Backend: ⚠️  not configured");
            println!("  Set GEMINI_API_KEY (or AI_BACKEND=mock for testing)");
        }
    }

    println!();
    println!("Models (default: {}):", models.default_model());
    println!(
        "  {:<16} {:<24} {:>6} {:>7} {:>8}  {}",
        "TASK", "MODEL", "TEMP", "TOKENS", "TIMEOUT", "SEARCH"
    );
    for &task in TaskType::all() {
        let config = models.task(task);
        let model = forced_model.as_deref().unwrap_or(&config.model);
        println!(
            "  {:<16} {:<24} {:>6.1} {:>7} {:>7}s  {}",
            task.as_str(),
            model,
            config.temperature,
            config.max_output_tokens,
            config.timeout.as_secs(),
            if config.google_search { "yes" } else { "" }
        );
    }
    if forced_model.is_some() {
        println!("  (GEMINI_MODEL overrides every task)");
    }

    println!();
    match models.config_path() {
        Some(path) if path.exists() => println!("Model config: {} (override)", path.display()),
        Some(path) => println!("Model config: embedded (override path: {})", path.display()),
        None => println!("Model config: embedded"),
    }
    println!(
        "Prompt overrides: {}",
        default_prompts_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not available)".to_string())
    );

    Ok(())
}
