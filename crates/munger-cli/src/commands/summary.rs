//! Financial summary command implementation

use std::path::Path;

use anyhow::{Context, Result};
use munger_core::{rate_summary, MetricRating, ProfileSnapshot};

use super::{format_money, load_profile};

/// Compute and print the summary for a profile file
pub fn cmd_summary(profile_path: &Path, save: Option<&Path>, json: bool) -> Result<()> {
    let snapshot = ProfileSnapshot::from_profile(load_profile(profile_path)?);

    if let Some(path) = save {
        let content = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write snapshot: {}", path.display()))?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot.summary)?);
        return Ok(());
    }

    let s = &snapshot.summary;
    let r = rate_summary(s);

    println!("📊 Financial Summary\n");
    print_metric("Monthly Net Income", &format_money(s.monthly_net_income), r.monthly_net_income);
    print_metric("Debt-to-Income", &format!("{:.1}%", s.debt_to_income_ratio), r.debt_to_income_ratio);
    print_metric("Credit Utilization", &format!("{:.1}%", s.credit_utilization), r.credit_utilization);
    print_metric("Net Worth", &format_money(s.net_worth), r.net_worth);
    print_metric(
        "Emergency Fund",
        &format!("{:.1} months", s.emergency_fund_months),
        r.emergency_fund_months,
    );

    if let Some(path) = save {
        println!();
        println!("💾 Saved to {}", path.display());
    }

    Ok(())
}

fn print_metric(label: &str, value: &str, rating: MetricRating) {
    let icon = if rating.is_warning() { "⚠️ " } else { "✓ " };
    println!("  {:<20} {:>14}  {} {}", label, value, icon, rating.as_str());
}
