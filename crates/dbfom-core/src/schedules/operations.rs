use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};

use crate::error::DbfomError;
use crate::types::{Money, Month, Rate};
use crate::DbfomResult;

/// Cost-plus O&M billing for one operating month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OmRow {
    pub op_month: Month,
    pub cost: Money,
    pub revenue: Money,
    pub margin: Money,
}

/// O&M cost build: `cost(n) = base × (1 + inflation)^(n − 1)`, billed at
/// `cost × (1 + markup)`. Each row depends only on its own index.
pub fn build_om_schedule(
    base: Money,
    markup: Rate,
    monthly_inflation: Rate,
    periods: u32,
) -> DbfomResult<Vec<OmRow>> {
    let escalator = Decimal::ONE + monthly_inflation;
    let billing_factor = Decimal::ONE + markup;

    let rows = (1..=periods)
        .map(|op_month| {
            let overflow = || {
                DbfomError::invalid(
                    "om_inflation_annual",
                    format!("O&M escalation overflows at operating month {op_month}"),
                )
            };
            let index_factor = escalator
                .checked_powi(i64::from(op_month - 1))
                .ok_or_else(overflow)?;
            let cost = base.checked_mul(index_factor).ok_or_else(overflow)?;
            let revenue = cost.checked_mul(billing_factor).ok_or_else(overflow)?;
            let margin = revenue.checked_sub(cost).ok_or_else(overflow)?;
            Ok(OmRow {
                op_month,
                cost,
                revenue,
                margin,
            })
        })
        .collect::<DbfomResult<Vec<_>>>()?;

    tracing::debug!(%base, %markup, periods, "built O&M schedule");
    Ok(rows)
}
