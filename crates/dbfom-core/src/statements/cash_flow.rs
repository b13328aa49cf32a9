use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ensure_aligned, schedule_row, IncomeStatementRow};
use crate::error::DbfomError;
use crate::schedules::AmortizationRow;
use crate::types::{Money, Month, Rate};
use crate::DbfomResult;

/// Monthly cash flow statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowRow {
    pub month: Month,
    /// Net income plus receivable principal collected
    pub operating: Money,
    /// EPC outlay at COD
    pub investing: Money,
    /// Debt draw and equity injection at COD, less scheduled debt principal
    pub financing: Money,
    pub net_change: Money,
    pub cash_balance: Money,
}

/// Principal collected on the city receivable in a month; zero before COD.
pub(crate) fn receivable_principal(
    receivable: &[AmortizationRow],
    op_month: Month,
) -> DbfomResult<Money> {
    if op_month == 0 {
        return Ok(Decimal::ZERO);
    }
    Ok(schedule_row(receivable, op_month, "receivable")?.principal)
}

/// Scheduled debt principal repaid in a month; zero before COD.
pub(crate) fn debt_principal(debt: &[AmortizationRow], op_month: Month) -> DbfomResult<Money> {
    if op_month == 0 {
        return Ok(Decimal::ZERO);
    }
    Ok(schedule_row(debt, op_month, "debt")?.principal)
}

/// Build the monthly cash flow statement from the income statement and the
/// two amortization schedules. The cumulative cash balance is a running sum
/// of net change seeded at zero.
pub fn build_cash_flow(
    income: &[IncomeStatementRow],
    receivable: &[AmortizationRow],
    debt: &[AmortizationRow],
    epc: Money,
    debt_fraction: Rate,
    equity_fraction: Rate,
    build_months: Month,
) -> DbfomResult<Vec<CashFlowRow>> {
    ensure_aligned(("receivable schedule", receivable.len()), ("debt schedule", debt.len()))?;

    let funding_at_cod = epc
        .checked_mul(debt_fraction)
        .zip(epc.checked_mul(equity_fraction))
        .and_then(|(debt, equity)| debt.checked_add(equity))
        .ok_or_else(|| DbfomError::invalid("epc", "COD funding exceeds decimal range"))?;

    let flows = income
        .iter()
        .map(|is| {
            let is_cod = is.month == build_months;
            let operating = is.net_income + receivable_principal(receivable, is.op_month)?;
            let investing = if is_cod { -epc } else { Decimal::ZERO };
            let funding = if is_cod { funding_at_cod } else { Decimal::ZERO };
            let financing = funding - debt_principal(debt, is.op_month)?;
            Ok((is.month, operating, investing, financing))
        })
        .collect::<DbfomResult<Vec<_>>>()?;

    let rows: Vec<CashFlowRow> = flows
        .into_iter()
        .scan(Decimal::ZERO, |balance, (month, operating, investing, financing)| {
            let net_change = operating + investing + financing;
            *balance += net_change;
            Some(CashFlowRow {
                month,
                operating,
                investing,
                financing,
                net_change,
                cash_balance: *balance,
            })
        })
        .collect();

    tracing::debug!(
        months = rows.len(),
        ending_cash = %rows.last().map(|r| r.cash_balance).unwrap_or_default(),
        "built cash flow statement"
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedules::{build_amortization_schedule, build_om_schedule};
    use crate::statements::build_income_statement;
    use rust_decimal_macros::dec;

    fn small_cash_flow() -> (Vec<IncomeStatementRow>, Vec<CashFlowRow>) {
        let receivable = build_amortization_schedule(dec!(0.01), 3, dec!(1200)).unwrap();
        let debt = build_amortization_schedule(dec!(0.005), 3, dec!(720)).unwrap();
        let om = build_om_schedule(dec!(100), dec!(0.10), Decimal::ZERO, 3).unwrap();
        let income =
            build_income_statement(&receivable.rows, &debt.rows, &om, 2, dec!(0.25)).unwrap();
        let cf = build_cash_flow(
            &income,
            &receivable.rows,
            &debt.rows,
            dec!(1200),
            dec!(0.60),
            dec!(0.40),
            2,
        )
        .unwrap();
        (income, cf)
    }

    #[test]
    fn test_cod_month_funding_nets_to_zero() {
        let (_, cf) = small_cash_flow();
        let cod = &cf[1];
        assert_eq!(cod.month, 2);
        assert_eq!(cod.investing, dec!(-1200));
        assert_eq!(cod.financing, dec!(1200));
        assert_eq!(cod.operating, Decimal::ZERO);
        assert_eq!(cod.net_change, Decimal::ZERO);
    }

    #[test]
    fn test_construction_months_are_empty() {
        let (_, cf) = small_cash_flow();
        let first = &cf[0];
        assert_eq!(first.net_change, Decimal::ZERO);
        assert_eq!(first.cash_balance, Decimal::ZERO);
    }

    #[test]
    fn test_operating_adds_back_receivable_principal() {
        let receivable = build_amortization_schedule(dec!(0.01), 3, dec!(1200)).unwrap();
        let debt = build_amortization_schedule(dec!(0.005), 3, dec!(720)).unwrap();
        let (income, cf) = small_cash_flow();
        let month = &cf[2];
        assert_eq!(month.operating, income[2].net_income + receivable.rows[0].principal);
        assert_eq!(month.financing, -debt.rows[0].principal);
        assert_eq!(month.investing, Decimal::ZERO);
    }

    #[test]
    fn test_cash_balance_is_running_sum() {
        let (_, cf) = small_cash_flow();
        let mut total = Decimal::ZERO;
        for row in &cf {
            total += row.net_change;
            assert_eq!(row.cash_balance, total);
        }
    }

    #[test]
    fn test_funding_beyond_decimal_range_is_an_error() {
        let err = build_cash_flow(&[], &[], &[], Decimal::MAX, dec!(1), dec!(1), 1).unwrap_err();
        assert!(matches!(err, DbfomError::InvalidParameters { .. }));
    }
}
