use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::model::DbfomModel;
use crate::parameters::Parameters;
use crate::types::{Money, Rate};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Investment decision against the equity hurdle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Annualized levered IRR meets or beats the hurdle
    Proceed,
    Reject,
    /// No hurdle supplied; the decision rule is reported but not applied
    NoHurdle,
}

/// Key figures of one model run, in the order they are presented.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub project_name: String,
    pub location: String,
    pub prepared_on: NaiveDate,
    /// Capital paid at COD
    pub epc: Money,
    pub city_level_payment: Money,
    pub debt_level_payment: Money,
    /// O&M base cost × (1 + markup)
    pub month_one_om_revenue: Money,
    /// e.g. "60% debt / 40% equity"
    pub capital_structure: String,
    pub tax_rate: Rate,
    pub monthly_irr: Rate,
    pub annualized_irr: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hurdle_rate: Option<Rate>,
    pub decision: Decision,
    pub decision_rule: String,
    pub description: Vec<String>,
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// 0.0675 → "6.75%", trailing zeros dropped.
fn percent(rate: Rate) -> String {
    format!("{}%", (rate * dec!(100)).round_dp(2).normalize())
}

/// Whole-dollar amount with thousands separators: 62000000 → "$62,000,000".
fn dollars(amount: Money) -> String {
    let rounded = amount.round_dp(0).abs().to_string();
    let digits: Vec<char> = rounded.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }
    if amount < Decimal::ZERO {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

fn capital_structure(params: &Parameters) -> String {
    format!(
        "{} debt / {} equity",
        percent(params.debt_fraction),
        percent(params.equity_fraction)
    )
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project description lines: structure, durations, pricing and exclusions.
pub fn project_description(params: &Parameters) -> Vec<String> {
    vec![
        format!("DBFOM; location: {}", params.location),
        format!(
            "Build {} months (COD at month {}); operate {} months",
            params.build_months,
            params.cod_month(),
            params.ops_months
        ),
        format!("EPC at COD: {} (fixed)", dollars(params.epc)),
        format!(
            "City financing: {} EAR (equal monthly payments); only interest is revenue",
            percent(params.city_rate_annual)
        ),
        format!(
            "O&M: cost-plus {} from {}/mo base; {} annual inflation",
            percent(params.om_markup),
            dollars(params.om_base),
            percent(params.om_inflation_annual)
        ),
        format!(
            "Capital structure: {} debt ({} EAR) / {} equity; tax {}",
            percent(params.debt_fraction),
            percent(params.debt_rate_annual),
            percent(params.equity_fraction),
            percent(params.tax_rate)
        ),
        "No interest during construction, no depreciation, no working-capital changes".into(),
    ]
}

/// Summarize a completed model run, applying the hurdle when one is given.
pub fn build_executive_summary(
    model: &DbfomModel,
    hurdle: Option<Rate>,
    prepared_on: NaiveDate,
) -> ExecutiveSummary {
    let params = &model.parameters;
    let annualized_irr = model.returns.annualized_irr;

    let decision = match hurdle {
        Some(h) if annualized_irr >= h => Decision::Proceed,
        Some(_) => Decision::Reject,
        None => Decision::NoHurdle,
    };
    let decision_rule = match hurdle {
        Some(h) => format!("Proceed if annualized levered IRR ≥ {}", percent(h)),
        None => "Proceed if annualized levered IRR ≥ equity hurdle".into(),
    };

    ExecutiveSummary {
        project_name: params.project_name.clone(),
        location: params.location.clone(),
        prepared_on,
        epc: params.epc,
        city_level_payment: model.city_receivable.payment,
        debt_level_payment: model.debt_schedule.payment,
        month_one_om_revenue: model
            .om_schedule
            .first()
            .map(|r| r.revenue)
            .unwrap_or_default(),
        capital_structure: capital_structure(params),
        tax_rate: params.tax_rate,
        monthly_irr: model.returns.monthly_irr,
        annualized_irr,
        hurdle_rate: hurdle,
        decision,
        decision_rule,
        description: project_description(params),
    }
}
