use dbfom_core::schedules::build_amortization_schedule;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn principal_strategy() -> impl Strategy<Value = Decimal> {
    (1_000u64..=1_000_000_000u64).prop_map(Decimal::from)
}

/// Monthly rates from 0 to 300 basis points.
fn rate_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=300i64).prop_map(|bp| Decimal::new(bp, 4))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn test_schedule_fully_amortizes(
        principal in principal_strategy(),
        rate in rate_strategy(),
        periods in 1u32..=480u32
    ) {
        let schedule = build_amortization_schedule(rate, periods, principal).unwrap();
        prop_assert_eq!(schedule.rows.len(), periods as usize);

        let terminal = schedule.final_balance().abs();
        prop_assert!(
            terminal <= principal * dec!(0.000001),
            "principal {} at {} over {} months left {}",
            principal, rate, periods, terminal
        );
    }

    #[test]
    fn test_rows_chain_and_reconcile(
        principal in principal_strategy(),
        rate in rate_strategy(),
        periods in 1u32..=480u32
    ) {
        let schedule = build_amortization_schedule(rate, periods, principal).unwrap();
        prop_assert_eq!(schedule.rows[0].beginning_balance, principal);
        for pair in schedule.rows.windows(2) {
            prop_assert_eq!(pair[1].beginning_balance, pair[0].ending_balance);
        }
        for row in &schedule.rows {
            prop_assert_eq!(row.interest, row.beginning_balance * rate);
            prop_assert_eq!(row.principal, row.payment - row.interest);
            prop_assert_eq!(row.ending_balance, row.beginning_balance - row.principal);
        }
    }

    #[test]
    fn test_total_paid_covers_principal(
        principal in principal_strategy(),
        rate in rate_strategy(),
        periods in 1u32..=480u32
    ) {
        let schedule = build_amortization_schedule(rate, periods, principal).unwrap();
        let total_paid = schedule.payment * Decimal::from(periods);
        prop_assert!(total_paid >= principal - dec!(0.000001));
        prop_assert!(schedule.total_interest >= -dec!(0.000001));
        if rate > Decimal::ZERO {
            prop_assert!(total_paid > principal);
        }
    }
}
