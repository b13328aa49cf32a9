use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DbfomError;
use crate::time_value::compute_level_payment;
use crate::types::{Money, Month, Rate};
use crate::DbfomResult;

/// A single operating month of a level-payment amortization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub op_month: Month,
    pub beginning_balance: Money,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub ending_balance: Money,
}

/// Level-payment amortization of a single principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub principal: Money,
    pub periodic_rate: Rate,
    pub payment: Money,
    pub rows: Vec<AmortizationRow>,
    pub total_interest: Money,
    pub total_principal: Money,
}

impl AmortizationSchedule {
    /// Row for a 1-based operating month.
    pub fn row(&self, op_month: Month) -> Option<&AmortizationRow> {
        op_month
            .checked_sub(1)
            .and_then(|idx| self.rows.get(idx as usize))
    }

    /// Ending balance of the last period; zero up to decimal rounding.
    pub fn final_balance(&self) -> Money {
        self.rows
            .last()
            .map(|r| r.ending_balance)
            .unwrap_or(self.principal)
    }
}

/// Build an interest-first level-payment schedule of exactly `periods` rows.
///
/// The payment is computed once; every row opens at the previous row's
/// closing balance, starting from `principal`.
pub fn build_amortization_schedule(
    rate: Rate,
    periods: u32,
    principal: Money,
) -> DbfomResult<AmortizationSchedule> {
    let payment = compute_level_payment(rate, periods, principal)?;

    let rows = (1..=periods)
        .scan(principal, |balance, op_month| {
            let row = amortize_period(*balance, rate, payment, op_month);
            if let Ok(row) = &row {
                *balance = row.ending_balance;
            }
            Some(row)
        })
        .collect::<DbfomResult<Vec<AmortizationRow>>>()?;

    let (total_interest, total_principal) = rows
        .iter()
        .try_fold((Decimal::ZERO, Decimal::ZERO), |(i, p), row| {
            Some((i.checked_add(row.interest)?, p.checked_add(row.principal)?))
        })
        .ok_or_else(|| out_of_range(periods))?;

    tracing::debug!(
        %principal,
        %rate,
        periods,
        %payment,
        final_balance = %rows.last().map(|r| r.ending_balance).unwrap_or_default(),
        "built amortization schedule"
    );

    Ok(AmortizationSchedule {
        principal,
        periodic_rate: rate,
        payment,
        rows,
        total_interest,
        total_principal,
    })
}

fn amortize_period(
    beginning_balance: Money,
    rate: Rate,
    payment: Money,
    op_month: Month,
) -> DbfomResult<AmortizationRow> {
    let interest = beginning_balance
        .checked_mul(rate)
        .ok_or_else(|| out_of_range(op_month))?;
    let principal = payment
        .checked_sub(interest)
        .ok_or_else(|| out_of_range(op_month))?;
    let ending_balance = beginning_balance
        .checked_sub(principal)
        .ok_or_else(|| out_of_range(op_month))?;

    Ok(AmortizationRow {
        op_month,
        beginning_balance,
        payment,
        interest,
        principal,
        ending_balance,
    })
}

fn out_of_range(op_month: Month) -> DbfomError {
    DbfomError::invalid(
        "principal",
        format!("Amortization exceeds decimal range at month {op_month}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_value::monthly_rate_from_annual;
    use rust_decimal_macros::dec;

    fn city_schedule() -> AmortizationSchedule {
        let rate = monthly_rate_from_annual(dec!(0.0675)).unwrap();
        build_amortization_schedule(rate, 240, dec!(62_000_000)).unwrap()
    }

    #[test]
    fn test_city_receivable_payment_and_first_interest() {
        let sched = city_schedule();
        assert_eq!(sched.rows.len(), 240);
        // 62,000,000 × (1.0675^(1/12) − 1)
        assert!((sched.rows[0].interest - dec!(338404.09)).abs() < dec!(0.01));
        assert!((sched.payment - dec!(464073.31)).abs() < dec!(0.01));
        assert_eq!(sched.rows[0].beginning_balance, dec!(62_000_000));
    }

    #[test]
    fn test_schedule_fully_amortizes() {
        let sched = city_schedule();
        let relative = sched.final_balance().abs() / sched.principal;
        assert!(relative < dec!(0.000001), "residual {}", sched.final_balance());
        assert!((sched.total_principal - sched.principal).abs() < dec!(0.0001));
    }

    #[test]
    fn test_rows_chain_exactly() {
        let sched = city_schedule();
        for pair in sched.rows.windows(2) {
            assert_eq!(pair[1].beginning_balance, pair[0].ending_balance);
        }
    }

    #[test]
    fn test_row_identities() {
        let sched = city_schedule();
        for row in &sched.rows {
            assert_eq!(row.interest, row.beginning_balance * sched.periodic_rate);
            assert_eq!(row.principal, row.payment - row.interest);
            assert_eq!(row.ending_balance, row.beginning_balance - row.principal);
        }
    }

    #[test]
    fn test_debt_principal_strictly_increasing() {
        let rate = monthly_rate_from_annual(dec!(0.04)).unwrap();
        let sched = build_amortization_schedule(rate, 240, dec!(37_200_000)).unwrap();
        assert!((sched.payment - dec!(224025.38)).abs() < dec!(0.01));
        for pair in sched.rows.windows(2) {
            assert!(pair[1].principal > pair[0].principal);
        }
    }

    #[test]
    fn test_zero_rate_schedule_is_straight_line() {
        let sched = build_amortization_schedule(Decimal::ZERO, 4, dec!(1000)).unwrap();
        assert!(sched.rows.iter().all(|r| r.principal == dec!(250)));
        assert_eq!(sched.total_interest, Decimal::ZERO);
        assert_eq!(sched.final_balance(), Decimal::ZERO);
    }

    #[test]
    fn test_totals_beyond_decimal_range_are_an_error() {
        // Each row fits, but 480 months of 5e27 interest do not
        let principal = dec!(10_000_000_000_000_000_000_000_000_000);
        let err = build_amortization_schedule(dec!(0.5), 480, principal).unwrap_err();
        assert!(matches!(err, DbfomError::InvalidParameters { .. }));
    }

    #[test]
    fn test_row_lookup_is_one_based() {
        let sched = city_schedule();
        assert_eq!(sched.row(1).unwrap().op_month, 1);
        assert_eq!(sched.row(240).unwrap().op_month, 240);
        assert!(sched.row(0).is_none());
        assert!(sched.row(241).is_none());
    }
}
