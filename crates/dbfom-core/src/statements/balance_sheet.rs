use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{ensure_aligned, schedule_row, CashFlowRow, IncomeStatementRow};
use crate::error::DbfomError;
use crate::schedules::AmortizationRow;
use crate::types::{Money, Month, Rate};
use crate::DbfomResult;

/// Relative tolerance on |assets − (liabilities + equity)|. It scales with
/// the larger side of the row and never drops below 1e-6 absolute.
pub const BALANCE_TOLERANCE: Decimal = dec!(0.000001);

/// Month-end balance sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheetRow {
    pub month: Month,
    pub cash: Money,
    pub receivable: Money,
    pub total_assets: Money,
    pub debt: Money,
    pub paid_in_equity: Money,
    /// Cumulative net income; no distributions are modelled
    pub retained_earnings: Money,
    pub total_equity: Money,
    pub total_liabilities_and_equity: Money,
    /// Total assets less liabilities and equity; zero when the model ties
    pub balance_check: Money,
}

/// Outstanding balance of an amortizing schedule at a calendar month:
/// nothing before COD, the opening principal at COD, the closing balance after.
fn outstanding(
    rows: &[AmortizationRow],
    month: Month,
    op_month: Month,
    build_months: Month,
    at_cod: Money,
    schedule: &str,
) -> DbfomResult<Money> {
    if month < build_months {
        Ok(Decimal::ZERO)
    } else if month == build_months {
        Ok(at_cod)
    } else {
        Ok(schedule_row(rows, op_month, schedule)?.ending_balance)
    }
}

/// Largest balance check accepted for `row`.
pub fn balance_tolerance(row: &BalanceSheetRow) -> Decimal {
    let scale = Decimal::ONE
        .max(row.total_assets.abs())
        .max(row.total_liabilities_and_equity.abs());
    BALANCE_TOLERANCE * scale
}

/// Build month-end balance sheets from the cash flow, schedules and income
/// statement. Retained earnings accumulate net income month by month.
pub fn build_balance_sheet(
    cash_flow: &[CashFlowRow],
    receivable: &[AmortizationRow],
    debt: &[AmortizationRow],
    income: &[IncomeStatementRow],
    epc: Money,
    equity_fraction: Rate,
    build_months: Month,
) -> DbfomResult<Vec<BalanceSheetRow>> {
    ensure_aligned(("cash flow", cash_flow.len()), ("income statement", income.len()))?;

    let debt_at_cod = debt
        .first()
        .map(|r| r.beginning_balance)
        .ok_or_else(|| DbfomError::InsufficientData("debt schedule is empty".into()))?;
    let paid_in = epc
        .checked_mul(equity_fraction)
        .ok_or_else(|| DbfomError::invalid("epc", "Paid-in equity exceeds decimal range"))?;

    let rows = cash_flow
        .iter()
        .zip(income)
        .scan(Decimal::ZERO, |retained, (cf, is)| {
            *retained += is.net_income;
            Some((cf, is, *retained))
        })
        .map(|(cf, is, retained_earnings)| {
            let receivable_balance =
                outstanding(receivable, is.month, is.op_month, build_months, epc, "receivable")?;
            let debt_balance =
                outstanding(debt, is.month, is.op_month, build_months, debt_at_cod, "debt")?;
            let paid_in_equity = if is.month < build_months {
                Decimal::ZERO
            } else {
                paid_in
            };

            let total_assets = cf.cash_balance + receivable_balance;
            let total_equity = paid_in_equity + retained_earnings;
            let total_liabilities_and_equity = debt_balance + total_equity;

            Ok(BalanceSheetRow {
                month: is.month,
                cash: cf.cash_balance,
                receivable: receivable_balance,
                total_assets,
                debt: debt_balance,
                paid_in_equity,
                retained_earnings,
                total_equity,
                total_liabilities_and_equity,
                balance_check: total_assets - total_liabilities_and_equity,
            })
        })
        .collect::<DbfomResult<Vec<_>>>()?;

    tracing::debug!(months = rows.len(), "built balance sheet");
    Ok(rows)
}

/// First month whose balance check exceeds [`balance_tolerance`], as an error.
pub fn verify_balance_sheet(rows: &[BalanceSheetRow]) -> DbfomResult<()> {
    match rows
        .iter()
        .find(|r| r.balance_check.abs() > balance_tolerance(r))
    {
        Some(row) => Err(DbfomError::BalanceCheckFailed {
            month: row.month,
            difference: row.balance_check,
        }),
        None => Ok(()),
    }
}
