use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DbfomError;
use crate::time_value::monthly_rate_from_annual;
use crate::types::{Money, Month, Rate};
use crate::DbfomResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Tolerance on `debt_fraction + equity_fraction = 1`.
const CAPITAL_STRUCTURE_TOLERANCE: Decimal = dec!(0.000000001);

/// Longest project accepted (build + operate), 100 years.
const MAX_PROJECT_MONTHS: Month = 1200;

/// Ceiling on the largest monthly amount times the project length. Running
/// balances stay well inside `Decimal::MAX` (~7.9e28) below it.
const MAX_PROJECT_AMOUNT: Money = dec!(1_000_000_000_000_000_000_000_000_000);

// ---------------------------------------------------------------------------
// Scenario definition
// ---------------------------------------------------------------------------

/// Immutable scenario definition for the DBFOM concession.
///
/// Every field falls back to the base scenario when omitted, so a JSON
/// document overriding any subset of fields deserializes into a complete
/// parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Project name, carried into summaries only
    pub project_name: String,
    /// Project location, carried into summaries only
    pub location: String,
    /// Construction duration in months; COD falls at the end of the last one
    pub build_months: Month,
    /// Operating duration in months after COD
    pub ops_months: Month,
    /// Fixed EPC capital cost, paid at COD
    pub epc: Money,
    /// O&M base monthly cost at service commencement
    pub om_base: Money,
    /// Cost-plus markup billed on O&M (0.10 = 10%)
    pub om_markup: Rate,
    /// Annual inflation applied to O&M cost
    pub om_inflation_annual: Rate,
    /// City financing rate (effective annual) on the EPC receivable
    pub city_rate_annual: Rate,
    /// Cost of debt (effective annual)
    pub debt_rate_annual: Rate,
    /// Corporate tax rate, applied to positive EBT only
    pub tax_rate: Rate,
    /// Share of EPC funded by debt
    pub debt_fraction: Rate,
    /// Share of EPC funded by equity
    pub equity_fraction: Rate,
}

impl Default for Parameters {
    /// Aurora Utilities base case: 24-month build, 20-year operation.
    fn default() -> Self {
        Self {
            project_name: "Aurora Utilities Inc. (AUI) — DBFOM Wastewater Reclamation Facility"
                .into(),
            location: "City of Riverview, Alberta".into(),
            build_months: 24,
            ops_months: 240,
            epc: dec!(62_000_000),
            om_base: dec!(325_000),
            om_markup: dec!(0.10),
            om_inflation_annual: dec!(0.02),
            city_rate_annual: dec!(0.0675),
            debt_rate_annual: dec!(0.04),
            tax_rate: dec!(0.265),
            debt_fraction: dec!(0.60),
            equity_fraction: dec!(0.40),
        }
    }
}

/// Monthly rates derived from the annual effective rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRates {
    pub city: Rate,
    pub debt: Rate,
    pub om_inflation: Rate,
}

impl Parameters {
    /// COD month: the last construction month, when EPC is paid and funded.
    pub fn cod_month(&self) -> Month {
        self.build_months
    }

    /// Total number of monthly statement rows (build + operate).
    pub fn total_months(&self) -> Month {
        self.build_months + self.ops_months
    }

    pub fn debt_amount(&self) -> Money {
        self.epc * self.debt_fraction
    }

    pub fn equity_amount(&self) -> Money {
        self.epc * self.equity_fraction
    }

    /// Derive `(1 + annual)^(1/12) - 1` for the city, debt and inflation rates.
    pub fn monthly_rates(&self) -> DbfomResult<MonthlyRates> {
        Ok(MonthlyRates {
            city: monthly_rate_from_annual(self.city_rate_annual)?,
            debt: monthly_rate_from_annual(self.debt_rate_annual)?,
            om_inflation: monthly_rate_from_annual(self.om_inflation_annual)?,
        })
    }

    /// Check the scenario is internally consistent before any schedule is built.
    pub fn validate(&self) -> DbfomResult<()> {
        if self.build_months == 0 {
            return Err(DbfomError::invalid(
                "build_months",
                "Construction period must be at least 1 month",
            ));
        }
        if self.ops_months == 0 {
            return Err(DbfomError::invalid(
                "ops_months",
                "Operating period must be at least 1 month",
            ));
        }
        match self.build_months.checked_add(self.ops_months) {
            Some(total) if total <= MAX_PROJECT_MONTHS => {}
            _ => {
                return Err(DbfomError::invalid(
                    "build_months + ops_months",
                    format!("Project duration cannot exceed {MAX_PROJECT_MONTHS} months"),
                ))
            }
        }
        if self.epc <= Decimal::ZERO {
            return Err(DbfomError::invalid("epc", "EPC cost must be positive"));
        }
        if self.om_base < Decimal::ZERO {
            return Err(DbfomError::invalid(
                "om_base",
                "O&M base cost cannot be negative",
            ));
        }
        if self.om_markup < Decimal::ZERO {
            return Err(DbfomError::invalid(
                "om_markup",
                "O&M markup cannot be negative",
            ));
        }

        for (field, rate) in [
            ("om_inflation_annual", self.om_inflation_annual),
            ("city_rate_annual", self.city_rate_annual),
            ("debt_rate_annual", self.debt_rate_annual),
        ] {
            if rate < dec!(-1) {
                return Err(DbfomError::invalid(
                    field,
                    format!("Rate must be >= -100%, got {}%", rate * dec!(100)),
                ));
            }
        }

        validate_fraction("tax_rate", self.tax_rate)?;
        validate_fraction("debt_fraction", self.debt_fraction)?;
        validate_fraction("equity_fraction", self.equity_fraction)?;

        let funding = self.debt_fraction + self.equity_fraction;
        if (funding - Decimal::ONE).abs() > CAPITAL_STRUCTURE_TOLERANCE {
            return Err(DbfomError::invalid(
                "debt_fraction + equity_fraction",
                format!(
                    "Funding fractions must sum to 100%, got {}%",
                    funding * dec!(100)
                ),
            ));
        }

        self.validate_magnitude()
    }

    /// Reject scenarios whose cumulative amounts would leave the decimal range.
    ///
    /// A level payment never exceeds `principal × (1 + rate)`, and O&M revenue
    /// peaks in the first or last operating month, so the larger of the two
    /// bounds every monthly line item.
    fn validate_magnitude(&self) -> DbfomResult<()> {
        let rates = self.monthly_rates()?;
        let financing_factor = Decimal::ONE + rates.city.max(rates.debt).max(Decimal::ZERO);
        let escalation_periods = i64::from(self.ops_months - 1);

        let project_amount = self
            .epc
            .checked_mul(financing_factor)
            .zip(
                (Decimal::ONE + rates.om_inflation)
                    .checked_powi(escalation_periods)
                    .and_then(|escalation| self.om_base.checked_mul(escalation.max(Decimal::ONE)))
                    .and_then(|cost| cost.checked_mul(Decimal::ONE + self.om_markup)),
            )
            .map(|(financing, om_revenue)| financing.max(om_revenue))
            .and_then(|peak| peak.checked_mul(Decimal::from(self.total_months())))
            .filter(|amount| *amount <= MAX_PROJECT_AMOUNT);

        if project_amount.is_none() {
            return Err(DbfomError::invalid(
                "epc / om_base",
                format!(
                    "Peak monthly amount times {} months exceeds {MAX_PROJECT_AMOUNT}",
                    self.total_months()
                ),
            ));
        }
        Ok(())
    }
}

fn validate_fraction(field: &str, value: Rate) -> DbfomResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(DbfomError::invalid(field, "Must be between 0 and 1"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_case_is_valid() {
        let params = Parameters::default();
        params.validate().unwrap();
        assert_eq!(params.cod_month(), 24);
        assert_eq!(params.total_months(), 264);
        assert_eq!(params.debt_amount(), dec!(37_200_000));
        assert_eq!(params.equity_amount(), dec!(24_800_000));
    }

    #[test]
    fn test_monthly_rates() {
        let rates = Parameters::default().monthly_rates().unwrap();
        assert!((rates.city - dec!(0.0054581305)).abs() < dec!(0.0000000001));
        assert!((rates.debt - dec!(0.0032737398)).abs() < dec!(0.0000000001));
        assert!((rates.om_inflation - dec!(0.0016515813)).abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_partial_json_overrides_base_case() {
        let params: Parameters =
            serde_json::from_str(r#"{ "om_markup": "0.15", "ops_months": 120 }"#).unwrap();
        assert_eq!(params.om_markup, dec!(0.15));
        assert_eq!(params.ops_months, 120);
        assert_eq!(params.epc, dec!(62_000_000));
        assert_eq!(params.build_months, 24);
    }

    #[test]
    fn test_capital_structure_must_sum_to_one() {
        let params = Parameters {
            equity_fraction: dec!(0.30),
            ..Parameters::default()
        };
        let err = params.validate().unwrap_err();
        match err {
            DbfomError::InvalidParameters { field, .. } => {
                assert_eq!(field, "debt_fraction + equity_fraction")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_durations_rejected() {
        let no_build = Parameters {
            build_months: 0,
            ..Parameters::default()
        };
        assert!(no_build.validate().is_err());

        let no_ops = Parameters {
            ops_months: 0,
            ..Parameters::default()
        };
        assert!(no_ops.validate().is_err());
    }

    #[test]
    fn test_rate_below_total_loss_rejected() {
        let params = Parameters {
            city_rate_annual: dec!(-1.01),
            ..Parameters::default()
        };
        assert!(params.validate().is_err());

        let boundary = Parameters {
            om_inflation_annual: dec!(-1),
            ..Parameters::default()
        };
        assert!(boundary.validate().is_ok());
    }

    #[test]
    fn test_tax_rate_out_of_range_rejected() {
        let params = Parameters {
            tax_rate: dec!(1.2),
            ..Parameters::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_amounts_beyond_decimal_range_rejected() {
        let params = Parameters {
            epc: Decimal::MAX,
            ..Parameters::default()
        };
        match params.validate().unwrap_err() {
            DbfomError::InvalidParameters { field, .. } => assert_eq!(field, "epc / om_base"),
            other => panic!("unexpected error: {other}"),
        }

        let escalating = Parameters {
            om_inflation_annual: dec!(10),
            ..Parameters::default()
        };
        assert!(escalating.validate().is_err());
    }

    #[test]
    fn test_large_but_representable_amounts_accepted() {
        let params = Parameters {
            epc: dec!(100_000_000_000_000_000_000_000),
            om_base: dec!(1_000_000_000_000_000_000_000),
            ..Parameters::default()
        };
        params.validate().unwrap();
    }

    #[test]
    fn test_project_longer_than_a_century_rejected() {
        let params = Parameters {
            ops_months: 1200,
            ..Parameters::default()
        };
        assert!(params.validate().is_err());
    }
}
