//! Advisor command implementations (advise, identify, chat)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use munger_core::{
    Decision, ProfileSnapshot, PurchaseAdvisor, PurchaseRequest, Recommendation,
};

use super::{format_money, load_profile, open_advisor, read_image};

/// Arguments of the `advise` command
#[derive(Debug, Clone, Default)]
pub struct AdviseOptions {
    pub name: String,
    pub cost: f64,
    pub purpose: Option<String>,
    pub frequency: Option<String>,
    pub image: Option<PathBuf>,
    pub profile: Option<PathBuf>,
    pub find_alternative: bool,
    pub json: bool,
}

/// Ask for a Buy / Don't Buy verdict
pub async fn cmd_advise(options: &AdviseOptions) -> Result<()> {
    let advisor = open_advisor()?;
    let recommendation = run_advise(&advisor, options).await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&recommendation)?);
    } else {
        print_recommendation(&recommendation, options.cost);
    }
    Ok(())
}

/// Build the request from `options` and run the recommendation flow
pub async fn run_advise(
    advisor: &PurchaseAdvisor,
    options: &AdviseOptions,
) -> Result<Recommendation> {
    let mut request = PurchaseRequest::new(options.name.clone(), options.cost);
    if let Some(ref purpose) = options.purpose {
        request = request.with_purpose(purpose.clone());
    }
    if let Some(ref frequency) = options.frequency {
        request = request.with_frequency(frequency.clone());
    }
    if let Some(ref path) = options.image {
        request = request.with_image(read_image(path)?);
    }

    let snapshot = match options.profile {
        Some(ref path) => Some(ProfileSnapshot::from_profile(load_profile(path)?)),
        None => None,
    };

    if !options.json {
        let label = if options.name.trim().is_empty() {
            "item in photo"
        } else {
            options.name.trim()
        };
        println!("🤔 Thinking about {} ({})...\n", label, format_money(options.cost));
    }

    // Validation errors surface as the command's error
    advisor
        .recommend(&request, snapshot.as_ref(), options.find_alternative)
        .await
        .context("Cannot analyze this purchase")
}

fn print_recommendation(rec: &Recommendation, item_cost: f64) {
    let icon = match rec.decision {
        Decision::Buy => "✅",
        Decision::DontBuy => "❌",
        Decision::ConsiderCarefully => "🤔",
        Decision::Error => "⚠️ ",
    };

    if let Some(ref id) = rec.identification {
        println!("📷 Identified: {}", id.name);
        if let Some(ref facts) = id.facts {
            println!("   {}", facts);
        }
        println!();
    }

    println!("{} {}: {}", icon, rec.decision, rec.item_name);
    println!();
    println!("{}", rec.reasoning);

    if let Some(ref alt) = rec.alternative {
        let (saved, percent) = alt.savings(item_cost);
        println!();
        println!("💡 Cheaper alternative: {}", alt.name);
        println!("   Price:    {} at {}", format_money(alt.price), alt.retailer);
        println!("   Savings:  {} ({:.1}%)", format_money(saved), percent);
        println!("   Link:     {}", alt.url);
        println!("   Search:   {}", alt.search_url());
    }
}

/// Identify the item in a photo
pub async fn cmd_identify(image: &Path) -> Result<()> {
    let advisor = open_advisor()?;
    let input = read_image(image)?;

    println!("📷 Identifying {}...\n", image.display());
    let id = advisor
        .quick_identify(&input)
        .await
        .context("Failed to identify image")?;

    println!("Item: {}", id.item_name);
    println!("Fact: {}", id.item_fact);
    Ok(())
}

/// Send a free-form message
pub async fn cmd_chat(message: &str) -> Result<()> {
    if message.trim().is_empty() {
        anyhow::bail!("No message provided");
    }

    let advisor = open_advisor()?;
    let reply = advisor.chat(message).await.context("Chat request failed")?;
    println!("{}", reply);
    Ok(())
}
