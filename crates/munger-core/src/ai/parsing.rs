//! Parsing helpers for model replies
//!
//! Replies are loosely structured: JSON wrapped in prose or code fences,
//! or plain "Buy: because..." text. Everything here is best effort and
//! returns a neutral value instead of failing.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::models::{Alternative, Decision, ItemIdentification};

use super::types::{DecisionText, QuickIdentification};

/// Reasoning attached to the neutral sentinel
pub const SENTINEL_REASONING: &str =
    "Consider the value of this purchase against your financial goals and needs.";

pub const UNKNOWN_ITEM: &str = "Unknown item";
pub const NO_INFORMATION: &str = "No information available";

fn decision_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)^[\s*_#>]*(buy|don['’]t\s+buy)[*_]*[\s:.,]+(.*)$").expect("valid regex")
    })
}

fn item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)Item:\s*(.+)").expect("valid regex"))
}

fn fact_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)Fact:\s*(.+)").expect("valid regex"))
}

/// Extract the JSON object embedded in a reply
///
/// Takes the slice from the first `{` to the last `}` and parses it. This is
/// a heuristic: two separate objects in one reply, or braces inside prose,
/// make it fail, in which case `None` is returned.
pub fn extract_structured(text: &str) -> Option<Value> {
    let text = text.trim();
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start >= end {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Map a decision word to a verdict ("Buy", "Don't Buy", any case)
fn normalize_decision(s: &str) -> Option<Decision> {
    let cleaned = s
        .trim()
        .trim_matches(|c: char| matches!(c, '*' | '_' | '"' | '.' | '!' | ':'))
        .trim()
        .to_lowercase()
        .replace('’', "'");

    match cleaned.split_whitespace().collect::<Vec<_>>().join(" ").as_str() {
        "buy" => Some(Decision::Buy),
        "don't buy" | "dont buy" | "do not buy" => Some(Decision::DontBuy),
        _ => None,
    }
}

/// Read a leading "Buy" / "Don't Buy" verdict from free text
///
/// Text without a recognisable verdict yields `Consider carefully`.
pub fn parse_decision_text(text: &str) -> DecisionText {
    let Some(caps) = decision_re().captures(text) else {
        return DecisionText {
            decision: Decision::ConsiderCarefully,
            reasoning: SENTINEL_REASONING.to_string(),
        };
    };

    let decision = if caps[1].eq_ignore_ascii_case("buy") {
        Decision::Buy
    } else {
        Decision::DontBuy
    };

    DecisionText {
        decision,
        reasoning: caps[2].trim().to_string(),
    }
}

/// Parse a recommendation reply
///
/// Prefers the `{"decision", "explanation"}` object; falls back to the free
/// text parser when no usable object is present.
pub fn parse_recommendation(text: &str) -> DecisionText {
    if let Some(value) = extract_structured(text) {
        let decision = non_empty_str(&value, "decision");
        let explanation = non_empty_str(&value, "explanation");

        if let (Some(decision), Some(explanation)) = (decision, explanation) {
            return match normalize_decision(decision) {
                Some(decision) => DecisionText {
                    decision,
                    reasoning: explanation.to_string(),
                },
                None => {
                    tracing::debug!(decision, "Unrecognised decision in structured reply");
                    DecisionText {
                        decision: Decision::ConsiderCarefully,
                        reasoning: explanation.to_string(),
                    }
                }
            };
        }
    }

    parse_decision_text(text)
}

/// Parse an image identification reply
///
/// Requires a non-empty `name`. `cost` may be a number or a numeric string.
pub fn parse_identification(text: &str) -> Option<ItemIdentification> {
    let value = extract_structured(text)?;
    let name = non_empty_str(&value, "name")?;

    Some(ItemIdentification {
        name: name.to_string(),
        cost: value.get("cost").and_then(json_number).filter(|c| *c > 0.0),
        facts: non_empty_str(&value, "facts").map(str::to_string),
    })
}

/// Validate a cheaper-alternative object against the requested item cost
///
/// `null`, missing fields, a non-numeric price, or a price that is not
/// strictly below `item_cost` all mean "no alternative".
pub fn validate_alternative(value: &Value, item_cost: f64) -> Option<Alternative> {
    if value.is_null() {
        return None;
    }

    let name = non_empty_str(value, "name")?;
    let url = non_empty_str(value, "url")?;
    let retailer = non_empty_str(value, "retailer")?;
    let price = value.get("price").and_then(json_number)?;

    if price <= 0.0 || price >= item_cost {
        return None;
    }

    Some(Alternative {
        name: name.to_string(),
        price,
        retailer: retailer.to_string(),
        url: url.to_string(),
    })
}

/// Extract and validate an alternative from a search reply
pub fn parse_alternative(text: &str, item_cost: f64) -> Option<Alternative> {
    let value = extract_structured(text)?;
    validate_alternative(&value, item_cost)
}

/// Parse the "Item: ...\nFact: ..." format
pub fn parse_item_fact(text: &str) -> QuickIdentification {
    let capture = |re: &Regex| {
        re.captures(text)
            .map(|c| clean_line(&c[1]))
            .filter(|s| !s.is_empty())
    };

    QuickIdentification {
        item_name: capture(item_re()).unwrap_or_else(|| UNKNOWN_ITEM.to_string()),
        item_fact: capture(fact_re()).unwrap_or_else(|| NO_INFORMATION.to_string()),
    }
}

fn clean_line(s: &str) -> String {
    s.trim()
        .trim_matches(|c: char| matches!(c, '\'' | '"' | '*' | '[' | ']'))
        .trim()
        .to_string()
}

fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// A finite number from a JSON number or numeric string ("$1,299.99" is accepted)
fn json_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s
            .trim()
            .trim_start_matches('$')
            .replace(',', "")
            .trim()
            .parse::<f64>()
            .ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}
