use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::DbfomError;
use crate::types::{Money, Rate};
use crate::DbfomResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;
const MAX_BISECTION_ITERATIONS: u32 = 200;
const DEFAULT_IRR_GUESS: Rate = dec!(0.01);
const MIN_IRR_RATE: Rate = dec!(-0.99);
const MAX_IRR_RATE: Rate = dec!(100);
const MIN_BRACKET_WIDTH: Decimal = dec!(0.000000000000000000000001);

pub const MONTHS_PER_YEAR: u32 = 12;

/// Convert an effective annual rate into the equivalent monthly rate:
/// `(1 + annual)^(1/12) - 1`.
pub fn monthly_rate_from_annual(annual: Rate) -> DbfomResult<Rate> {
    if annual < dec!(-1) {
        return Err(DbfomError::invalid(
            "annual_rate",
            format!("Effective annual rate must be >= -100%, got {annual}"),
        ));
    }

    let one_plus = Decimal::ONE + annual;
    if one_plus.is_zero() {
        return Ok(dec!(-1));
    }

    let exponent = Decimal::ONE / Decimal::from(MONTHS_PER_YEAR);
    let root = one_plus
        .checked_powd(exponent)
        .ok_or_else(|| DbfomError::invalid("annual_rate", "Monthly root out of decimal range"))?;
    Ok(root - Decimal::ONE)
}

/// Convert a monthly rate back to its effective annual rate: `(1 + monthly)^12 - 1`.
pub fn annualize_monthly_rate(monthly: Rate) -> DbfomResult<Rate> {
    let factor = compound(Decimal::ONE + monthly, MONTHS_PER_YEAR, "monthly_rate")?;
    Ok(factor - Decimal::ONE)
}

/// `base^periods` by repeated multiplication, failing instead of overflowing.
pub(crate) fn compound(base: Decimal, periods: u32, field: &str) -> DbfomResult<Decimal> {
    let mut factor = Decimal::ONE;
    for _ in 0..periods {
        factor = factor
            .checked_mul(base)
            .ok_or_else(|| DbfomError::invalid(field, "Compounding exceeds decimal range"))?;
    }
    Ok(factor)
}

/// Level payment that fully amortizes `principal` over `periods` at `rate`:
/// `rate * principal / (1 - (1 + rate)^-periods)`.
///
/// A zero rate uses the limiting value `principal / periods`.
pub fn compute_level_payment(rate: Rate, periods: u32, principal: Money) -> DbfomResult<Money> {
    if periods == 0 {
        return Err(DbfomError::invalid(
            "periods",
            "Number of periods must be > 0",
        ));
    }

    if rate.is_zero() {
        return Ok(principal / Decimal::from(periods));
    }

    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r.is_zero() {
        return Err(DbfomError::DivisionByZero {
            context: "level payment discount factor (1 + rate = 0)".into(),
        });
    }
    if one_plus_r < Decimal::ZERO {
        return Err(DbfomError::invalid(
            "rate",
            format!("Periodic rate must be > -100%, got {rate}"),
        ));
    }

    let discount = compound(Decimal::ONE / one_plus_r, periods, "rate")?;
    let annuity_denominator = Decimal::ONE - discount;
    if annuity_denominator.is_zero() {
        return Err(DbfomError::DivisionByZero {
            context: "level payment annuity factor".into(),
        });
    }

    rate
        .checked_mul(principal)
        .and_then(|interest| interest.checked_div(annuity_denominator))
        .ok_or_else(|| DbfomError::invalid("principal", "Level payment exceeds decimal range"))
}

/// Net Present Value of a series of cash flows, first flow undiscounted.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> DbfomResult<Money> {
    if rate <= dec!(-1) {
        return Err(DbfomError::invalid(
            "rate",
            "Discount rate must be greater than -100%",
        ));
    }

    let v = Decimal::ONE / (Decimal::ONE + rate);
    let mut result = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = checked(discount.checked_mul(v), "NPV discount factor", t)?;
        }
        result = checked(
            cf.checked_mul(discount).and_then(|pv| result.checked_add(pv)),
            "NPV",
            t,
        )?;
    }

    Ok(result)
}

fn checked(value: Option<Decimal>, what: &str, period: usize) -> DbfomResult<Decimal> {
    value.ok_or_else(|| {
        DbfomError::invalid("rate", format!("{what} exceeds decimal range at period {period}"))
    })
}

/// NPV and its derivative with respect to the rate.
fn npv_with_derivative(rate: Rate, cash_flows: &[Money]) -> DbfomResult<(Money, Decimal)> {
    let v = Decimal::ONE / (Decimal::ONE + rate);
    let mut npv_val = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = checked(discount.checked_mul(v), "IRR discount factor", t)?;
            let t_dec = Decimal::from(t as u64);
            let slope = t_dec
                .checked_mul(*cf)
                .and_then(|x| x.checked_mul(discount))
                .and_then(|x| x.checked_mul(v))
                .and_then(|x| dnpv.checked_sub(x));
            dnpv = checked(slope, "IRR derivative", t)?;
        }
        npv_val = checked(
            cf.checked_mul(discount).and_then(|pv| npv_val.checked_add(pv)),
            "IRR present value",
            t,
        )?;
    }

    Ok((npv_val, dnpv))
}

/// A value with the same sign as the NPV at `rate` that cannot overflow.
///
/// Non-negative rates discount to present value; negative rates roll the
/// flows forward to the final period instead, which scales the NPV by the
/// positive factor `(1 + rate)^T`.
fn npv_sign_proxy(rate: Rate, cash_flows: &[Money]) -> Decimal {
    let one_plus_r = Decimal::ONE + rate;
    if rate >= Decimal::ZERO {
        let v = Decimal::ONE / one_plus_r;
        let mut discount = Decimal::ONE;
        let mut total = Decimal::ZERO;
        for (t, cf) in cash_flows.iter().enumerate() {
            if t > 0 {
                discount *= v;
            }
            total += cf * discount;
        }
        total
    } else {
        cash_flows
            .iter()
            .fold(Decimal::ZERO, |acc, cf| acc * one_plus_r + cf)
    }
}

/// Internal rate of return per period of `cash_flows`, using the default guess.
pub fn compute_irr(cash_flows: &[Money]) -> DbfomResult<Rate> {
    irr(cash_flows, DEFAULT_IRR_GUESS)
}

/// Internal Rate of Return using Newton-Raphson, with a bisection fallback
/// when Newton stalls or leaves the representable range.
pub fn irr(cash_flows: &[Money], guess: Rate) -> DbfomResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(DbfomError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let has_inflow = cash_flows.iter().any(|cf| *cf > Decimal::ZERO);
    let has_outflow = cash_flows.iter().any(|cf| *cf < Decimal::ZERO);
    if !(has_inflow && has_outflow) {
        return Err(DbfomError::NoSignChange(
            "IRR requires at least one positive and one negative cash flow".into(),
        ));
    }

    let mut rate = guess.clamp(MIN_IRR_RATE, MAX_IRR_RATE);

    for i in 0..MAX_IRR_ITERATIONS {
        let Ok((npv_val, dnpv)) = npv_with_derivative(rate, cash_flows) else {
            tracing::debug!(iteration = i, %rate, "IRR Newton step overflowed, bisecting");
            break;
        };

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            tracing::debug!(iterations = i, %rate, "IRR converged (Newton)");
            return Ok(rate);
        }

        let Some(next) = npv_val
            .checked_div(dnpv)
            .and_then(|step| rate.checked_sub(step))
        else {
            break;
        };
        rate = next;

        // Guard against divergence
        if rate < MIN_IRR_RATE {
            rate = MIN_IRR_RATE;
        } else if rate > MAX_IRR_RATE {
            rate = MAX_IRR_RATE;
        }
    }

    irr_bisection(cash_flows)
}

fn irr_bisection(cash_flows: &[Money]) -> DbfomResult<Rate> {
    let mut lo = MIN_IRR_RATE;
    let mut hi = Decimal::ONE;
    let lo_negative = npv_sign_proxy(lo, cash_flows) < Decimal::ZERO;

    let mut expansions = 0u32;
    while (npv_sign_proxy(hi, cash_flows) < Decimal::ZERO) == lo_negative {
        if hi >= MAX_IRR_RATE {
            // No root between MIN_IRR_RATE and MAX_IRR_RATE
            return Err(DbfomError::NoConvergence {
                function: "IRR bracket".into(),
                iterations: expansions,
                last_delta: npv(hi, cash_flows).unwrap_or(Decimal::MAX),
            });
        }
        hi = (hi * dec!(10)).min(MAX_IRR_RATE);
        expansions += 1;
    }

    let mut mid = (lo + hi) / dec!(2);
    for i in 0..MAX_BISECTION_ITERATIONS {
        mid = (lo + hi) / dec!(2);
        let proxy = npv_sign_proxy(mid, cash_flows);

        let converged = npv(mid, cash_flows)
            .map(|v| v.abs() < CONVERGENCE_THRESHOLD)
            .unwrap_or(false);
        if converged || proxy.is_zero() || hi - lo < MIN_BRACKET_WIDTH {
            tracing::debug!(iterations = i, rate = %mid, "IRR converged (bisection)");
            return Ok(mid);
        }

        if (proxy < Decimal::ZERO) == lo_negative {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    Err(DbfomError::NoConvergence {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS + MAX_BISECTION_ITERATIONS,
        last_delta: npv(mid, cash_flows).unwrap_or(Decimal::MAX),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_monthly_rate_round_trips_to_annual() {
        let monthly = monthly_rate_from_annual(dec!(0.0675)).unwrap();
        // (1.0675)^(1/12) - 1 ≈ 0.0054581
        assert!((monthly - dec!(0.0054581305)).abs() < dec!(0.0000000001));
        let annual = annualize_monthly_rate(monthly).unwrap();
        assert!((annual - dec!(0.0675)).abs() < dec!(0.000000001));
    }

    #[test]
    fn test_monthly_rate_total_loss() {
        assert_eq!(monthly_rate_from_annual(dec!(-1)).unwrap(), dec!(-1));
    }

    #[test]
    fn test_monthly_rate_below_total_loss_rejected() {
        let err = monthly_rate_from_annual(dec!(-1.5)).unwrap_err();
        assert!(matches!(err, DbfomError::InvalidParameters { .. }));
    }

    #[test]
    fn test_level_payment_textbook() {
        // 100,000 at 0.5%/month over 360 months ≈ 599.55
        let pmt = compute_level_payment(dec!(0.005), 360, dec!(100000)).unwrap();
        assert!((pmt - dec!(599.55)).abs() < dec!(0.01));
    }

    #[test]
    fn test_level_payment_zero_rate_is_straight_line() {
        let pmt = compute_level_payment(Decimal::ZERO, 240, dec!(62000000)).unwrap();
        assert!((pmt - dec!(258333.333333)).abs() < dec!(0.000001));
        assert_eq!(
            compute_level_payment(Decimal::ZERO, 4, dec!(1000)).unwrap(),
            dec!(250)
        );
    }

    #[test]
    fn test_level_payment_zero_periods_rejected() {
        assert!(compute_level_payment(dec!(0.01), 0, dec!(1000)).is_err());
    }

    #[test]
    fn test_level_payment_beyond_decimal_range_is_an_error() {
        let err = compute_level_payment(dec!(2), 10, Decimal::MAX).unwrap_err();
        assert!(matches!(err, DbfomError::InvalidParameters { .. }));
    }

    #[test]
    fn test_level_payment_total_loss_rate_is_division_by_zero() {
        let err = compute_level_payment(dec!(-1), 12, dec!(1000)).unwrap_err();
        assert!(matches!(err, DbfomError::DivisionByZero { .. }));
    }

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // NPV at 10%: -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(0.01));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        assert_eq!(npv(dec!(0.0), &cfs).unwrap(), dec!(50));
    }

    #[test]
    fn test_irr_basic() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let result = compute_irr(&cfs).unwrap();
        // IRR ≈ 9.70%
        assert!((result - dec!(0.0970)).abs() < dec!(0.0001));
        assert!(npv(result, &cfs).unwrap().abs() < dec!(0.0000001));
    }

    #[test]
    fn test_irr_with_leading_zeros() {
        let cfs = vec![
            Decimal::ZERO,
            Decimal::ZERO,
            dec!(-1000),
            dec!(400),
            dec!(400),
            dec!(400),
        ];
        let result = compute_irr(&cfs).unwrap();
        assert!((result - dec!(0.0970)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_irr_bad_guess_falls_back_to_bisection() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let result = irr(&cfs, dec!(99)).unwrap();
        assert!(npv(result, &cfs).unwrap().abs() < dec!(0.0000001));
    }

    #[test]
    fn test_irr_negative_rate() {
        // Returns less than invested: IRR below zero
        let cfs = vec![dec!(-1000), dec!(300), dec!(300), dec!(300)];
        let result = compute_irr(&cfs).unwrap();
        assert!(result < Decimal::ZERO);
        assert!(npv(result, &cfs).unwrap().abs() < dec!(0.0000001));
    }

    #[test]
    fn test_irr_no_sign_change() {
        let cfs = vec![dec!(100), dec!(50), dec!(50)];
        let err = compute_irr(&cfs).unwrap_err();
        assert!(matches!(err, DbfomError::NoSignChange(_)));
    }

    #[test]
    fn test_irr_above_rate_ceiling_does_not_converge() {
        // True IRR is 999 per period, beyond the 100 ceiling
        let cfs = vec![dec!(-1), dec!(1000)];
        match compute_irr(&cfs).unwrap_err() {
            DbfomError::NoConvergence {
                iterations,
                last_delta,
                ..
            } => {
                // hi went 1 -> 10 -> 100
                assert_eq!(iterations, 2);
                // NPV at 100: -1 + 1000 / 101
                assert!((last_delta - dec!(8.90099)).abs() < dec!(0.00001));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_irr_requires_two_flows() {
        let err = compute_irr(&[dec!(-100)]).unwrap_err();
        assert!(matches!(err, DbfomError::InsufficientData(_)));
    }
}
