use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use dbfom_core::schedules::build_amortization_schedule;
use dbfom_core::time_value::monthly_rate_from_annual;

/// Arguments for a standalone level-payment amortization
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct PaymentArgs {
    /// Periodic rate as a decimal (e.g. 0.005), or an effective annual rate with --annual
    #[arg(long)]
    pub rate: Decimal,

    /// Number of monthly periods
    #[arg(long)]
    pub periods: u32,

    /// Principal to amortize
    #[arg(long)]
    pub principal: Decimal,

    /// Treat --rate as an effective annual rate and convert to monthly
    #[arg(long)]
    pub annual: bool,

    /// Print every period of the schedule instead of the summary
    #[arg(long)]
    pub schedule: bool,
}

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let periodic_rate = if args.annual {
        monthly_rate_from_annual(args.rate)?
    } else {
        args.rate
    };

    let schedule = build_amortization_schedule(periodic_rate, args.periods, args.principal)?;

    if args.schedule {
        return Ok(serde_json::json!({ "result": schedule.rows }));
    }

    Ok(serde_json::json!({
        "result": {
            "principal": schedule.principal,
            "periodic_rate": schedule.periodic_rate,
            "periods": args.periods,
            "payment": schedule.payment,
            "total_paid": schedule.payment * Decimal::from(args.periods),
            "total_interest": schedule.total_interest,
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn args(rate: Decimal, annual: bool, schedule: bool) -> PaymentArgs {
        PaymentArgs {
            rate,
            periods: 240,
            principal: dec!(62_000_000),
            annual,
            schedule,
        }
    }

    #[test]
    fn test_annual_rate_is_converted() {
        let value = run_payment(args(dec!(0.0675), true, false)).unwrap();
        let payment: Decimal = value["result"]["payment"].as_str().unwrap().parse().unwrap();
        assert!((payment - dec!(464_073.31)).abs() < dec!(0.01));
    }

    #[test]
    fn test_schedule_rows() {
        let value = run_payment(args(dec!(0.005), false, true)).unwrap();
        assert_eq!(value["result"].as_array().unwrap().len(), 240);
    }

    #[test]
    fn test_zero_periods_is_an_error() {
        let mut bad = args(dec!(0.005), false, false);
        bad.periods = 0;
        assert!(run_payment(bad).is_err());
    }
}
