//! Data models for Munger
//!
//! Wire shapes use camelCase so that snapshots written by the web front end
//! deserialize unchanged.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::summary::{compute_summary, parse_amount};

// ============================================================================
// Amounts
// ============================================================================

/// A user-entered amount, kept as the text the user typed
///
/// Deserializes from any JSON value; strings and numbers keep their text,
/// anything else is blank. The numeric value is always available through
/// [`Amount::value`], which treats blank or non-numeric text as 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Amount(String);

impl Amount {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The raw text as entered
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value (0 for blank or non-numeric text)
    pub fn value(&self) -> f64 {
        parse_amount(&self.0)
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for Amount {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Amount {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<f64> for Amount {
    fn from(v: f64) -> Self {
        Self(v.to_string())
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(i64),
            Float(f64),
            Other(serde::de::IgnoredAny),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Text(s)) => Amount(s),
            Some(Raw::Int(i)) => Amount(i.to_string()),
            Some(Raw::Float(f)) => Amount(f.to_string()),
            Some(Raw::Other(_)) | None => Amount::default(),
        })
    }
}

/// Deserialize an `f64` from a number, a numeric string, or null (as 0)
pub(crate) fn lenient_f64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<f64, D::Error> {
    Ok(Amount::deserialize(deserializer)?.value())
}

// ============================================================================
// Profile enums
// ============================================================================

/// How the primary income figure was entered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum IncomeFrequency {
    #[default]
    Monthly,
    Annual,
}

impl IncomeFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Annual => "annual",
        }
    }
}

impl From<Option<String>> for IncomeFrequency {
    fn from(s: Option<String>) -> Self {
        s.map(Self::from).unwrap_or_default()
    }
}

impl From<String> for IncomeFrequency {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "annual" | "annually" | "yearly" => Self::Annual,
            _ => Self::Monthly,
        }
    }
}

/// When the user intends to make purchases
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum PurchaseTimeframe {
    #[default]
    Now,
    Soon,
    Planned,
    Future,
}

impl PurchaseTimeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Now => "now",
            Self::Soon => "soon",
            Self::Planned => "planned",
            Self::Future => "future",
        }
    }
}

impl From<Option<String>> for PurchaseTimeframe {
    fn from(s: Option<String>) -> Self {
        s.map(Self::from).unwrap_or_default()
    }
}

impl From<String> for PurchaseTimeframe {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "soon" => Self::Soon,
            "planned" => Self::Planned,
            "future" => Self::Future,
            _ => Self::Now,
        }
    }
}

impl fmt::Display for PurchaseTimeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Self-described appetite for financial risk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum RiskTolerance {
    Conservative,
    #[default]
    Moderate,
    Aggressive,
}

impl RiskTolerance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Moderate => "moderate",
            Self::Aggressive => "aggressive",
        }
    }
}

impl From<Option<String>> for RiskTolerance {
    fn from(s: Option<String>) -> Self {
        s.map(Self::from).unwrap_or_default()
    }
}

impl From<String> for RiskTolerance {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "conservative" => Self::Conservative,
            "aggressive" => Self::Aggressive,
            _ => Self::Moderate,
        }
    }
}

impl fmt::Display for RiskTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Financial profile
// ============================================================================

/// Raw financial profile as entered by the user
///
/// Every numeric field is an [`Amount`]; blank or garbage input counts as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FinancialProfile {
    // Income
    pub monthly_income: Amount,
    pub income_frequency: IncomeFrequency,
    pub other_income_sources: Amount,

    // Expenses
    pub housing_cost: Amount,
    pub utilities_cost: Amount,
    pub food_cost: Amount,
    pub transportation_cost: Amount,
    pub insurance_cost: Amount,
    pub subscriptions_cost: Amount,
    pub other_expenses: Amount,

    // Debt balances and monthly payments
    pub credit_card_debt: Amount,
    pub credit_card_payment: Amount,
    pub student_loan_debt: Amount,
    pub student_loan_payment: Amount,
    pub car_loan_debt: Amount,
    pub car_loan_payment: Amount,
    pub mortgage_debt: Amount,
    pub mortgage_payment: Amount,
    pub other_debt: Amount,
    pub other_debt_payment: Amount,

    // Credit
    pub credit_score: Amount,
    pub credit_limit: Amount,
    pub current_credit_balance: Amount,

    // Savings
    pub checking_savings_balance: Amount,
    pub emergency_fund: Amount,

    // Investments
    pub retirement_accounts: Amount,
    pub stocks_and_bonds: Amount,
    pub real_estate_value: Amount,
    pub other_investments: Amount,

    // Goals
    pub short_term_goals: String,
    pub mid_term_goals: String,
    pub long_term_goals: String,

    pub purchase_timeframe: PurchaseTimeframe,
    pub risk_tolerance: RiskTolerance,
    pub financial_priorities: String,
}

impl FinancialProfile {
    /// Goals that were filled in, as (label, text) pairs in display order
    pub fn goals(&self) -> Vec<(&'static str, &str)> {
        [
            ("Short-term", self.short_term_goals.as_str()),
            ("Mid-term", self.mid_term_goals.as_str()),
            ("Long-term", self.long_term_goals.as_str()),
        ]
        .into_iter()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(label, text)| (label, text.trim()))
        .collect()
    }
}

/// Derived metrics, always recomputed as a whole from a profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    pub monthly_net_income: f64,
    /// Percent of monthly income going to debt payments
    pub debt_to_income_ratio: f64,
    /// Percent of the credit limit in use
    pub credit_utilization: f64,
    pub net_worth: f64,
    pub emergency_fund_months: f64,
}

/// A profile together with its computed summary
///
/// This is the single-slot shape a front end stores between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    #[serde(flatten)]
    pub profile: FinancialProfile,
    pub summary: FinancialSummary,
}

impl ProfileSnapshot {
    /// Build a snapshot, computing the summary from scratch
    pub fn from_profile(profile: FinancialProfile) -> Self {
        let summary = compute_summary(&profile);
        Self { profile, summary }
    }
}

// ============================================================================
// Purchase request and results
// ============================================================================

/// An image of the item being considered
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageInput {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// JPEG image (the default capture format)
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "image/jpeg")
    }
}

/// What the user wants to buy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    #[serde(default)]
    pub item_name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub item_cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    /// Frequency of use (Daily, Weekly, Monthly, Rarely, One-time)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(skip)]
    pub image: Option<ImageInput>,
}

impl PurchaseRequest {
    pub fn new(item_name: impl Into<String>, item_cost: f64) -> Self {
        Self {
            item_name: item_name.into(),
            item_cost,
            ..Default::default()
        }
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    pub fn with_frequency(mut self, frequency: impl Into<String>) -> Self {
        self.frequency = Some(frequency.into());
        self
    }

    pub fn with_image(mut self, image: ImageInput) -> Self {
        self.image = Some(image);
        self
    }

    /// Purpose, if given and non-blank
    pub fn purpose(&self) -> Option<&str> {
        self.purpose.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Frequency of use, if given and non-blank
    pub fn frequency(&self) -> Option<&str> {
        self.frequency
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// A cheaper substitute product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alternative {
    pub name: String,
    pub price: f64,
    pub retailer: String,
    pub url: String,
}

impl Alternative {
    /// Savings against the requested item as (amount, percent)
    pub fn savings(&self, item_cost: f64) -> (f64, f64) {
        let amount = item_cost - self.price;
        let percent = if item_cost > 0.0 {
            amount / item_cost * 100.0
        } else {
            0.0
        };
        (amount, percent)
    }

    /// Web search link for the alternative's name
    pub fn search_url(&self) -> String {
        reqwest::Url::parse_with_params("https://www.google.com/search", &[("q", &self.name)])
            .map(String::from)
            .unwrap_or_default()
    }
}

/// The verdict shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    #[serde(rename = "Buy")]
    Buy,
    #[serde(rename = "Don't Buy")]
    DontBuy,
    /// Neutral sentinel when the model reply had no recognisable verdict
    #[serde(rename = "Consider carefully")]
    ConsiderCarefully,
    #[serde(rename = "Error")]
    Error,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::DontBuy => "Don't Buy",
            Self::ConsiderCarefully => "Consider carefully",
            Self::Error => "Error",
        }
    }

    /// True only for a real Buy / Don't Buy verdict
    pub fn is_verdict(&self) -> bool {
        matches!(self, Self::Buy | Self::DontBuy)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of identifying an item from an image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemIdentification {
    pub name: String,
    /// Estimated cost in USD
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub facts: Option<String>,
}

/// Final result handed back to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub decision: Decision,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative: Option<Alternative>,
    /// Item name used for the recommendation (typed or identified)
    pub item_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identification: Option<ItemIdentification>,
    pub analyzed_at: DateTime<Utc>,
}

impl Recommendation {
    /// A terminal error result carrying an explanation for the user
    pub fn error(item_name: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            decision: Decision::Error,
            reasoning: reasoning.into(),
            alternative: None,
            item_name: item_name.into(),
            identification: None,
            analyzed_at: Utc::now(),
        }
    }
}
