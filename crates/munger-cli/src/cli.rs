//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Munger - Think twice before you buy
#[derive(Parser)]
#[command(name = "munger")]
#[command(about = "Purchase advisor in the spirit of Charlie Munger", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask whether to buy an item
    Advise {
        /// Item name (optional when --image is given)
        #[arg(short, long, default_value = "")]
        name: String,

        /// Item cost in dollars
        #[arg(short, long)]
        cost: f64,

        /// What the item is for
        #[arg(long)]
        purpose: Option<String>,

        /// How often it will be used
        #[arg(long)]
        frequency: Option<String>,

        /// Photo of the item (used to identify it when no name is given)
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// Financial profile JSON file
        #[arg(short, long)]
        profile: Option<PathBuf>,

        /// Search for a cheaper alternative first
        #[arg(short, long)]
        alternative: bool,

        /// Print the recommendation as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute the financial summary for a profile
    Summary {
        /// Financial profile JSON file
        profile: PathBuf,

        /// Write the profile together with its summary to this file
        #[arg(long)]
        save: Option<PathBuf>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Identify the item in a photo (name and one fact)
    Identify {
        /// Image file
        image: PathBuf,
    },

    /// Send a free-form message to the model
    Chat {
        /// Message text
        message: String,
    },

    /// Manage prompt templates
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },

    /// Show AI backend and model configuration
    Status,

    /// Start the proxy server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory where uploaded images are stored
        #[arg(long, default_value = "uploads")]
        uploads_dir: PathBuf,

        /// Static files directory (for a web front end)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List all available prompts and their override status
    List,

    /// Show the content of a specific prompt
    Show {
        /// Prompt ID (e.g., purchase_recommendation, find_alternative)
        prompt_id: String,
    },

    /// Show the path where prompt overrides should be placed
    Path,
}
