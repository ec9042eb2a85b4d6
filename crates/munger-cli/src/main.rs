//! Munger CLI - Purchase advisor
//!
//! Usage:
//!   munger advise --name Laptop --cost 1200     Buy / Don't Buy verdict
//!   munger summary profile.json                 Financial summary
//!   munger identify photo.jpg                   Identify an item
//!   munger serve --port 3000                    Start the proxy server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Advise {
            name,
            cost,
            purpose,
            frequency,
            image,
            profile,
            alternative,
            json,
        } => {
            let options = commands::AdviseOptions {
                name,
                cost,
                purpose,
                frequency,
                image,
                profile,
                find_alternative: alternative,
                json,
            };
            commands::cmd_advise(&options).await
        }
        Commands::Summary {
            profile,
            save,
            json,
        } => commands::cmd_summary(&profile, save.as_deref(), json),
        Commands::Identify { image } => commands::cmd_identify(&image).await,
        Commands::Chat { message } => commands::cmd_chat(&message).await,
        Commands::Prompts { action } => match action {
            None | Some(PromptsAction::List) => commands::cmd_prompts_list(),
            Some(PromptsAction::Show { prompt_id }) => commands::cmd_prompts_show(&prompt_id),
            Some(PromptsAction::Path) => commands::cmd_prompts_path(),
        },
        Commands::Status => commands::cmd_status().await,
        Commands::Serve {
            port,
            host,
            uploads_dir,
            static_dir,
        } => commands::cmd_serve(&host, port, uploads_dir, static_dir.as_deref()).await,
    }
}
