//! Financial summary calculator
//!
//! Pure arithmetic over a [`FinancialProfile`]. Nothing here can fail: blank
//! or garbage input counts as 0 and every division is guarded, so every
//! output is finite.

use serde::{Deserialize, Serialize};

use crate::models::{FinancialProfile, FinancialSummary, IncomeFrequency};

/// Parse the leading decimal number of `text`, returning 0 on failure
///
/// Accepts an optional sign, digits with an optional fraction, and an
/// optional exponent. Trailing text is ignored (`"12.5 USD"` is 12.5), while
/// a non-numeric prefix yields 0 (`"$12"` is 0).
pub fn parse_amount(text: &str) -> f64 {
    let s = text.trim();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return 0.0;
    }

    // Exponent only counts when followed by at least one digit
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    match s[..end].parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let v = numerator / denominator;
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

fn finite(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Compute the five summary metrics from a profile
pub fn compute_summary(profile: &FinancialProfile) -> FinancialSummary {
    let p = profile;

    let base_income = match p.income_frequency {
        IncomeFrequency::Monthly => p.monthly_income.value(),
        IncomeFrequency::Annual => p.monthly_income.value() / 12.0,
    };
    let total_income = base_income + p.other_income_sources.value();

    let total_expenses = [
        &p.housing_cost,
        &p.utilities_cost,
        &p.food_cost,
        &p.transportation_cost,
        &p.insurance_cost,
        &p.subscriptions_cost,
        &p.other_expenses,
    ]
    .iter()
    .map(|a| a.value())
    .sum::<f64>();

    let total_debt_payments = [
        &p.credit_card_payment,
        &p.student_loan_payment,
        &p.car_loan_payment,
        &p.mortgage_payment,
        &p.other_debt_payment,
    ]
    .iter()
    .map(|a| a.value())
    .sum::<f64>();

    let total_debt = [
        &p.credit_card_debt,
        &p.student_loan_debt,
        &p.car_loan_debt,
        &p.mortgage_debt,
        &p.other_debt,
    ]
    .iter()
    .map(|a| a.value())
    .sum::<f64>();

    let total_assets = [
        &p.checking_savings_balance,
        &p.emergency_fund,
        &p.retirement_accounts,
        &p.stocks_and_bonds,
        &p.real_estate_value,
        &p.other_investments,
    ]
    .iter()
    .map(|a| a.value())
    .sum::<f64>();

    let credit_balance = p.current_credit_balance.value();
    let credit_limit = p.credit_limit.value();
    let emergency_fund = p.emergency_fund.value();

    FinancialSummary {
        monthly_net_income: finite(total_income - total_expenses - total_debt_payments),
        // Ratios are clamped at 0 so negative entries never produce a negative percentage
        debt_to_income_ratio: finite(ratio(total_debt_payments, total_income) * 100.0).max(0.0),
        credit_utilization: finite(ratio(credit_balance, credit_limit) * 100.0).max(0.0),
        net_worth: finite(total_assets - total_debt),
        emergency_fund_months: ratio(emergency_fund, total_expenses + total_debt_payments),
    }
}

/// Health band for a single metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricRating {
    Healthy,
    Good,
    Moderate,
    Caution,
    High,
    Positive,
    Negative,
}

impl MetricRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Good => "good",
            Self::Moderate => "moderate",
            Self::Caution => "caution",
            Self::High => "high",
            Self::Positive => "positive",
            Self::Negative => "negative",
        }
    }

    /// Whether the rating calls for the user's attention
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Caution | Self::High | Self::Negative)
    }
}

/// Ratings for every metric in a [`FinancialSummary`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRatings {
    pub monthly_net_income: MetricRating,
    pub debt_to_income_ratio: MetricRating,
    pub credit_utilization: MetricRating,
    pub net_worth: MetricRating,
    pub emergency_fund_months: MetricRating,
}

/// Apply the health bands to a summary
pub fn rate_summary(summary: &FinancialSummary) -> SummaryRatings {
    let sign = |v: f64| {
        if v >= 0.0 {
            MetricRating::Positive
        } else {
            MetricRating::Negative
        }
    };

    let dti = summary.debt_to_income_ratio;
    let util = summary.credit_utilization;
    let months = summary.emergency_fund_months;

    SummaryRatings {
        monthly_net_income: sign(summary.monthly_net_income),
        debt_to_income_ratio: if dti < 36.0 {
            MetricRating::Healthy
        } else if dti < 43.0 {
            MetricRating::Caution
        } else {
            MetricRating::High
        },
        credit_utilization: if util < 30.0 {
            MetricRating::Good
        } else if util < 50.0 {
            MetricRating::Moderate
        } else {
            MetricRating::High
        },
        net_worth: sign(summary.net_worth),
        emergency_fund_months: if months >= 3.0 {
            MetricRating::Healthy
        } else if months >= 1.0 {
            MetricRating::Caution
        } else {
            MetricRating::High
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Amount, ProfileSnapshot};

    fn profile(fields: &[(&str, &str)]) -> FinancialProfile {
        let map: serde_json::Map<String, serde_json::Value> = fields
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        serde_json::from_value(serde_json::Value::Object(map)).unwrap()
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("5000"), 5000.0);
        assert_eq!(parse_amount("  12.5 "), 12.5);
        assert_eq!(parse_amount("12.5 USD"), 12.5);
        assert_eq!(parse_amount("-40"), -40.0);
        assert_eq!(parse_amount(".5"), 0.5);
        assert_eq!(parse_amount("1e3"), 1000.0);
        assert_eq!(parse_amount("1e"), 1.0);
        assert_eq!(parse_amount("1,500"), 1.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount("$12"), 0.0);
        assert_eq!(parse_amount("."), 0.0);
        assert_eq!(parse_amount("-"), 0.0);
        assert_eq!(parse_amount("1e999"), 0.0);
    }

    #[test]
    fn test_blank_profile_is_all_zero() {
        let summary = compute_summary(&FinancialProfile::default());
        assert_eq!(summary, FinancialSummary::default());
    }

    #[test]
    fn test_basic_scenario() {
        let p = profile(&[
            ("monthlyIncome", "5000"),
            ("housingCost", "1500"),
            ("creditCardPayment", "200"),
        ]);
        let summary = compute_summary(&p);
        assert_eq!(summary.monthly_net_income, 3300.0);
        assert_eq!(summary.debt_to_income_ratio, 4.0);
        assert_eq!(summary.credit_utilization, 0.0);
        assert_eq!(summary.emergency_fund_months, 0.0);
        assert_eq!(summary.net_worth, 0.0);
    }

    #[test]
    fn test_non_numeric_counts_as_zero() {
        let p = profile(&[
            ("monthlyIncome", "lots"),
            ("housingCost", "1500"),
            ("creditLimit", "n/a"),
            ("currentCreditBalance", "900"),
        ]);
        let first = compute_summary(&p);
        assert_eq!(first.monthly_net_income, -1500.0);
        assert_eq!(first.debt_to_income_ratio, 0.0);
        assert_eq!(first.credit_utilization, 0.0);

        // Same input, same output
        assert_eq!(compute_summary(&p), first);
    }

    #[test]
    fn test_annual_income_divided_by_twelve() {
        let mut p = profile(&[("monthlyIncome", "60000"), ("otherIncomeSources", "500")]);
        p.income_frequency = IncomeFrequency::Annual;
        let summary = compute_summary(&p);
        assert_eq!(summary.monthly_net_income, 5500.0);
    }

    #[test]
    fn test_ratios_and_net_worth() {
        let p = profile(&[
            ("monthlyIncome", "4000"),
            ("housingCost", "1000"),
            ("foodCost", "500"),
            ("carLoanPayment", "300"),
            ("studentLoanPayment", "100"),
            ("carLoanDebt", "10000"),
            ("creditLimit", "10000"),
            ("currentCreditBalance", "2500"),
            ("checkingSavingsBalance", "3000"),
            ("emergencyFund", "5700"),
            ("retirementAccounts", "20000"),
        ]);
        let summary = compute_summary(&p);
        assert_eq!(summary.monthly_net_income, 2100.0);
        assert_eq!(summary.debt_to_income_ratio, 10.0);
        assert_eq!(summary.credit_utilization, 25.0);
        assert_eq!(summary.net_worth, 18700.0);
        assert_eq!(summary.emergency_fund_months, 3.0);
    }

    #[test]
    fn test_ratios_never_negative() {
        let p = profile(&[
            ("monthlyIncome", "3000"),
            ("creditCardPayment", "-100"),
            ("creditLimit", "1000"),
            ("currentCreditBalance", "-50"),
        ]);
        let summary = compute_summary(&p);
        assert!(summary.debt_to_income_ratio >= 0.0);
        assert!(summary.credit_utilization >= 0.0);
    }

    #[test]
    fn test_credit_score_not_used() {
        let mut p = profile(&[("monthlyIncome", "3000")]);
        let before = compute_summary(&p);
        p.credit_score = Amount::from("780");
        assert_eq!(compute_summary(&p), before);
    }

    #[test]
    fn test_snapshot_round_trip_is_bit_identical() {
        let p = profile(&[
            ("monthlyIncome", "3333.33"),
            ("housingCost", "1234.56"),
            ("creditCardPayment", "77.7"),
            ("creditLimit", "3000"),
            ("currentCreditBalance", "1000"),
            ("emergencyFund", "999.99"),
        ]);
        let snapshot = ProfileSnapshot::from_profile(p);
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: ProfileSnapshot = serde_json::from_str(&json).unwrap();

        let a = snapshot.summary;
        let b = back.summary;
        assert_eq!(a.monthly_net_income.to_bits(), b.monthly_net_income.to_bits());
        assert_eq!(a.debt_to_income_ratio.to_bits(), b.debt_to_income_ratio.to_bits());
        assert_eq!(a.credit_utilization.to_bits(), b.credit_utilization.to_bits());
        assert_eq!(a.net_worth.to_bits(), b.net_worth.to_bits());
        assert_eq!(a.emergency_fund_months.to_bits(), b.emergency_fund_months.to_bits());
        assert_eq!(back.profile, snapshot.profile);
    }

    #[test]
    fn test_rating_bands_at_boundaries() {
        let rate = |dti: f64, util: f64, months: f64| {
            rate_summary(&FinancialSummary {
                debt_to_income_ratio: dti,
                credit_utilization: util,
                emergency_fund_months: months,
                ..Default::default()
            })
        };

        let r = rate(35.9, 29.9, 3.0);
        assert_eq!(r.debt_to_income_ratio, MetricRating::Healthy);
        assert_eq!(r.credit_utilization, MetricRating::Good);
        assert_eq!(r.emergency_fund_months, MetricRating::Healthy);

        let r = rate(36.0, 30.0, 2.9);
        assert_eq!(r.debt_to_income_ratio, MetricRating::Caution);
        assert_eq!(r.credit_utilization, MetricRating::Moderate);
        assert_eq!(r.emergency_fund_months, MetricRating::Caution);

        let r = rate(43.0, 50.0, 0.9);
        assert_eq!(r.debt_to_income_ratio, MetricRating::High);
        assert_eq!(r.credit_utilization, MetricRating::High);
        assert_eq!(r.emergency_fund_months, MetricRating::High);
        assert!(r.emergency_fund_months.is_warning());
    }

    #[test]
    fn test_sign_ratings() {
        let r = rate_summary(&FinancialSummary {
            monthly_net_income: -1.0,
            net_worth: 0.0,
            ..Default::default()
        });
        assert_eq!(r.monthly_net_income, MetricRating::Negative);
        assert_eq!(r.net_worth, MetricRating::Positive);
    }

    #[test]
    fn test_huge_ratios_stay_finite() {
        let p = profile(&[
            ("monthlyIncome", "1"),
            ("creditCardPayment", "1e307"),
            ("creditLimit", "1"),
            ("currentCreditBalance", "1e307"),
        ]);
        let summary = compute_summary(&p);

        assert!(summary.debt_to_income_ratio.is_finite());
        assert!(summary.credit_utilization.is_finite());
        assert!(summary.monthly_net_income.is_finite());

        let snapshot = ProfileSnapshot::from_profile(p);
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: ProfileSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.summary, summary);
    }
}
