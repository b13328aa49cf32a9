use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ensure_aligned, operating_month, schedule_row};
use crate::error::DbfomError;
use crate::schedules::{AmortizationRow, OmRow};
use crate::types::{Money, Month, Rate};
use crate::DbfomResult;

/// Monthly income statement. Every field is zero during construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatementRow {
    pub month: Month,
    pub op_month: Month,
    /// Interest portion of the city payment; principal is a balance-sheet movement
    pub interest_revenue: Money,
    pub om_revenue: Money,
    pub total_revenue: Money,
    pub om_cost: Money,
    pub ebit: Money,
    pub debt_interest_expense: Money,
    pub ebt: Money,
    pub tax: Money,
    pub net_income: Money,
}

impl IncomeStatementRow {
    fn construction(month: Month) -> Self {
        Self {
            month,
            op_month: 0,
            interest_revenue: Decimal::ZERO,
            om_revenue: Decimal::ZERO,
            total_revenue: Decimal::ZERO,
            om_cost: Decimal::ZERO,
            ebit: Decimal::ZERO,
            debt_interest_expense: Decimal::ZERO,
            ebt: Decimal::ZERO,
            tax: Decimal::ZERO,
            net_income: Decimal::ZERO,
        }
    }
}

/// Tax on positive EBT only; losses are not carried or credited.
pub fn tax_on(ebt: Money, tax_rate: Rate) -> Money {
    if ebt > Decimal::ZERO {
        ebt * tax_rate
    } else {
        Decimal::ZERO
    }
}

/// Build one income statement row per project month (build + operate).
///
/// Operating months look up the receivable, debt and O&M schedules at
/// `month - build_months`.
pub fn build_income_statement(
    receivable: &[AmortizationRow],
    debt: &[AmortizationRow],
    om: &[OmRow],
    build_months: Month,
    tax_rate: Rate,
) -> DbfomResult<Vec<IncomeStatementRow>> {
    ensure_aligned(("receivable schedule", receivable.len()), ("debt schedule", debt.len()))?;
    ensure_aligned(("receivable schedule", receivable.len()), ("O&M schedule", om.len()))?;

    let total_months = Month::try_from(receivable.len())
        .ok()
        .and_then(|ops_months| build_months.checked_add(ops_months))
        .ok_or_else(|| DbfomError::invalid("build_months", "Project duration overflows"))?;

    let rows = (1..=total_months)
        .map(|month| {
            let op_month = operating_month(month, build_months);
            if op_month == 0 {
                return Ok(IncomeStatementRow::construction(month));
            }

            let interest_revenue = schedule_row(receivable, op_month, "receivable")?.interest;
            let om_row = schedule_row(om, op_month, "O&M")?;
            let debt_interest_expense = schedule_row(debt, op_month, "debt")?.interest;

            let total_revenue = interest_revenue + om_row.revenue;
            let ebit = total_revenue - om_row.cost;
            let ebt = ebit - debt_interest_expense;
            let tax = tax_on(ebt, tax_rate);

            Ok(IncomeStatementRow {
                month,
                op_month,
                interest_revenue,
                om_revenue: om_row.revenue,
                total_revenue,
                om_cost: om_row.cost,
                ebit,
                debt_interest_expense,
                ebt,
                tax,
                net_income: ebt - tax,
            })
        })
        .collect::<DbfomResult<Vec<_>>>()?;

    tracing::debug!(months = rows.len(), build_months, "built income statement");
    Ok(rows)
}
