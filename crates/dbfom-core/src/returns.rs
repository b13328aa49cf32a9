use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DbfomError;
use crate::schedules::AmortizationRow;
use crate::statements::cash_flow::debt_principal;
use crate::statements::{ensure_aligned, CashFlowRow, IncomeStatementRow};
use crate::time_value::{annualize_monthly_rate, compute_irr};
use crate::types::{Money, Month, Rate};
use crate::DbfomResult;

/// Levered equity cash flow for one project month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityCashFlowRow {
    pub month: Month,
    pub equity_cash_flow: Money,
    pub cumulative: Money,
}

/// Equity return metrics derived from the levered cash flows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeveredReturns {
    pub monthly_irr: Rate,
    pub annualized_irr: Rate,
    pub equity_invested: Money,
    /// Sum of positive equity cash flows
    pub total_equity_distributions: Money,
    /// Distributions / equity invested
    pub equity_multiple: Decimal,
    /// First month in which cumulative equity cash flow turns non-negative
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payback_month: Option<Month>,
}

/// Levered equity cash flows, one per project month: nothing before COD, the
/// equity injection at COD, and operating cash flow less scheduled debt
/// principal afterwards.
pub fn build_levered_equity_cash_flows(
    cash_flow: &[CashFlowRow],
    debt: &[AmortizationRow],
    income: &[IncomeStatementRow],
    epc: Money,
    equity_fraction: Rate,
    build_months: Month,
) -> DbfomResult<Vec<Money>> {
    ensure_aligned(("cash flow", cash_flow.len()), ("income statement", income.len()))?;

    cash_flow
        .iter()
        .zip(income)
        .map(|(cf, is)| {
            if is.month < build_months {
                Ok(Decimal::ZERO)
            } else if is.month == build_months {
                Ok(-(epc * equity_fraction))
            } else {
                Ok(cf.operating - debt_principal(debt, is.op_month)?)
            }
        })
        .collect()
}

/// Attach month numbers and the running cumulative total to equity flows.
pub fn equity_cash_flow_rows(flows: &[Money]) -> Vec<EquityCashFlowRow> {
    flows
        .iter()
        .zip(1..)
        .scan(Decimal::ZERO, |cumulative, (flow, month)| {
            *cumulative += flow;
            Some(EquityCashFlowRow {
                month,
                equity_cash_flow: *flow,
                cumulative: *cumulative,
            })
        })
        .collect()
}

/// Monthly and annualized IRR plus multiple and payback for the equity flows.
pub fn compute_levered_returns(
    flows: &[Money],
    equity_invested: Money,
) -> DbfomResult<LeveredReturns> {
    let monthly_irr = compute_irr(flows)?;
    let annualized_irr = annualize_monthly_rate(monthly_irr)?;

    let total_equity_distributions: Money =
        flows.iter().filter(|cf| **cf > Decimal::ZERO).sum();
    let equity_multiple = if equity_invested > Decimal::ZERO {
        total_equity_distributions
            .checked_div(equity_invested)
            .ok_or_else(|| {
                DbfomError::invalid("equity_fraction", "Equity multiple exceeds decimal range")
            })?
    } else {
        Decimal::ZERO
    };

    let rows = equity_cash_flow_rows(flows);
    let invested_from = rows
        .iter()
        .position(|r| r.equity_cash_flow < Decimal::ZERO)
        .unwrap_or(0);
    let payback_month = rows
        .iter()
        .skip(invested_from + 1)
        .find(|r| r.cumulative >= Decimal::ZERO)
        .map(|r| r.month);

    tracing::info!(
        monthly_irr = %monthly_irr,
        annualized_irr = %annualized_irr,
        "levered equity IRR"
    );

    Ok(LeveredReturns {
        monthly_irr,
        annualized_irr,
        equity_invested,
        total_equity_distributions,
        equity_multiple,
        payback_month,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_value::npv;
    use rust_decimal::MathematicalOps;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rows_accumulate() {
        let rows = equity_cash_flow_rows(&[Decimal::ZERO, dec!(-100), dec!(60), dec!(60)]);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].month, 1);
        assert_eq!(rows[1].cumulative, dec!(-100));
        assert_eq!(rows[3].cumulative, dec!(20));
    }

    #[test]
    fn test_levered_returns_simple() {
        let flows = vec![Decimal::ZERO, dec!(-100), dec!(60), dec!(60)];
        let returns = compute_levered_returns(&flows, dec!(100)).unwrap();
        assert!(npv(returns.monthly_irr, &flows).unwrap().abs() < dec!(0.0000001));
        assert_eq!(returns.total_equity_distributions, dec!(120));
        assert_eq!(returns.equity_multiple, dec!(1.2));
        assert_eq!(returns.payback_month, Some(4));
        let expected_annual = (Decimal::ONE + returns.monthly_irr).powi(12) - Decimal::ONE;
        assert!((returns.annualized_irr - expected_annual).abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_no_payback_when_never_recovered() {
        let flows = vec![dec!(-100), dec!(10), dec!(10)];
        let returns = compute_levered_returns(&flows, dec!(100)).unwrap();
        assert!(returns.monthly_irr < Decimal::ZERO);
        assert_eq!(returns.payback_month, None);
    }
}
