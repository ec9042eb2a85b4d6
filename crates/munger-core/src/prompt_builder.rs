//! Prompt builder
//!
//! Renders the prompt templates for each model call. Templates are resolved
//! once when the builder is created; building a prompt afterwards cannot fail.

use std::collections::HashMap;
use std::fmt::Write;

use crate::error::Result;
use crate::models::{Alternative, ProfileSnapshot, PurchaseRequest};
use crate::prompts::{Prompt, PromptId, PromptLibrary};

/// Builds prompt text for the recommendation, vision, search and quick
/// identification calls
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    recommendation: Prompt,
    identify_item: Prompt,
    find_alternative: Prompt,
    quick_identify: Prompt,
}

impl PromptBuilder {
    /// Resolve every template through `library` (overrides first)
    pub fn from_library(library: &mut PromptLibrary) -> Result<Self> {
        Ok(Self {
            recommendation: library.get(PromptId::PurchaseRecommendation)?.clone(),
            identify_item: library.get(PromptId::IdentifyItem)?.clone(),
            find_alternative: library.get(PromptId::FindAlternative)?.clone(),
            quick_identify: library.get(PromptId::QuickIdentify)?.clone(),
        })
    }

    /// Templates from the default override directory or embedded defaults
    pub fn load() -> Result<Self> {
        Self::from_library(&mut PromptLibrary::new())
    }

    /// Embedded templates only
    pub fn embedded() -> Result<Self> {
        Self::from_library(&mut PromptLibrary::embedded_only())
    }

    /// Prompt asking for a Buy / Don't Buy verdict as JSON
    pub fn build_recommendation_prompt(
        &self,
        request: &PurchaseRequest,
        context: Option<&ProfileSnapshot>,
        alternative: Option<&Alternative>,
    ) -> String {
        let mut vars: HashMap<&str, String> = HashMap::new();
        vars.insert("item_name", request.item_name.trim().to_string());
        vars.insert("item_cost", format_cost(request.item_cost));
        if let Some(purpose) = request.purpose() {
            vars.insert("purpose", purpose.to_string());
        }
        if let Some(frequency) = request.frequency() {
            vars.insert("frequency", frequency.to_string());
        }
        if let Some(snapshot) = context {
            vars.insert("financial_context", financial_context_block(snapshot));
        }
        if let Some(alt) = alternative {
            vars.insert("alternative", alternative_block(alt, request.item_cost));
        }

        self.recommendation.render(&vars)
    }

    /// Prompt asking for name, estimated cost and facts from an image
    pub fn build_image_identification_prompt(&self) -> String {
        self.identify_item.render(&HashMap::new())
    }

    /// Prompt asking for a real, cheaper alternative (or `null`)
    pub fn build_alternative_search_prompt(&self, item_name: &str, item_cost: f64) -> String {
        let mut vars: HashMap<&str, String> = HashMap::new();
        vars.insert("item_name", item_name.trim().to_string());
        vars.insert("item_cost", format_cost(item_cost));
        self.find_alternative.render(&vars)
    }

    /// Prompt asking for the short "Item:/Fact:" identification
    pub fn build_quick_identify_prompt(&self) -> String {
        self.quick_identify.render(&HashMap::new())
    }
}

/// Whole-dollar costs print without decimals
fn format_cost(cost: f64) -> String {
    if cost.fract() == 0.0 {
        format!("{:.0}", cost)
    } else {
        format!("{:.2}", cost)
    }
}

/// Financial context section: the five metrics, risk tolerance, timeframe
/// and any goals that were filled in
pub fn financial_context_block(snapshot: &ProfileSnapshot) -> String {
    let s = &snapshot.summary;
    let p = &snapshot.profile;

    let mut block = String::from("Financial context:\n");
    let _ = writeln!(block, "- Monthly Net Income: ${:.2}", s.monthly_net_income);
    let _ = writeln!(block, "- Debt-to-Income Ratio: {:.1}%", s.debt_to_income_ratio);
    let _ = writeln!(block, "- Credit Utilization: {:.1}%", s.credit_utilization);
    let _ = writeln!(block, "- Net Worth: ${:.2}", s.net_worth);
    let _ = writeln!(block, "- Emergency Fund: {:.1} months", s.emergency_fund_months);
    let _ = writeln!(block, "- Risk Tolerance: {}", p.risk_tolerance);
    let _ = write!(block, "- Purchase Timeframe: {}", p.purchase_timeframe);

    let goals = p.goals();
    if !goals.is_empty() {
        block.push_str("\n\nFinancial Goals:");
        for (label, text) in goals {
            let _ = write!(block, "\n- {}: {}", label, text);
        }
    }

    block
}

/// Cheaper-alternative section with absolute and percentage savings
pub fn alternative_block(alternative: &Alternative, item_cost: f64) -> String {
    let (savings, percent) = alternative.savings(item_cost);
    format!(
        "Cheaper alternative found:\n\
         - Name: {}\n\
         - Price: ${:.2}\n\
         - Retailer: {}\n\
         - Savings: ${:.2} ({:.1}%)\n\
         - URL: {}",
        alternative.name, alternative.price, alternative.retailer, savings, percent, alternative.url
    )
}
