pub mod balance_sheet;
pub mod cash_flow;
pub mod income;

pub use balance_sheet::{build_balance_sheet, BalanceSheetRow};
pub use cash_flow::{build_cash_flow, CashFlowRow};
pub use income::{build_income_statement, IncomeStatementRow};

use crate::error::DbfomError;
use crate::types::Month;
use crate::DbfomResult;

/// Operating-month index of a calendar month: 0 through COD, then 1, 2, ...
pub fn operating_month(month: Month, build_months: Month) -> Month {
    month.saturating_sub(build_months)
}

/// Fetch the row for a 1-based operating month from a schedule slice.
pub(crate) fn schedule_row<'a, T>(
    rows: &'a [T],
    op_month: Month,
    schedule: &str,
) -> DbfomResult<&'a T> {
    op_month
        .checked_sub(1)
        .and_then(|idx| rows.get(idx as usize))
        .ok_or_else(|| {
            DbfomError::InsufficientData(format!(
                "{schedule} schedule has {} rows, operating month {op_month} requested",
                rows.len()
            ))
        })
}

/// Ensure two month-aligned sequences have the same length.
pub(crate) fn ensure_aligned(left: (&str, usize), right: (&str, usize)) -> DbfomResult<()> {
    if left.1 != right.1 {
        return Err(DbfomError::InsufficientData(format!(
            "{} has {} months but {} has {}",
            left.0, left.1, right.0, right.1
        )));
    }
    Ok(())
}
