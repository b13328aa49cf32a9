use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::parameters::{MonthlyRates, Parameters};
use crate::returns::{
    build_levered_equity_cash_flows, compute_levered_returns, equity_cash_flow_rows,
    EquityCashFlowRow, LeveredReturns,
};
use crate::schedules::{
    build_amortization_schedule, build_om_schedule, AmortizationSchedule, OmRow,
};
use crate::sources_uses::{build_sources_uses, SourcesUses};
use crate::statements::balance_sheet::verify_balance_sheet;
use crate::statements::{
    build_balance_sheet, build_cash_flow, build_income_statement, BalanceSheetRow, CashFlowRow,
    IncomeStatementRow,
};
use crate::types::{with_metadata, ComputationOutput, Money, Month};
use crate::DbfomResult;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Every schedule, statement and return figure for one scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbfomModel {
    pub parameters: Parameters,
    pub monthly_rates: MonthlyRates,
    pub sources_uses: SourcesUses,
    pub city_receivable: AmortizationSchedule,
    pub debt_schedule: AmortizationSchedule,
    pub om_schedule: Vec<OmRow>,
    pub income_statement: Vec<IncomeStatementRow>,
    pub cash_flow: Vec<CashFlowRow>,
    pub balance_sheet: Vec<BalanceSheetRow>,
    pub equity_cash_flows: Vec<EquityCashFlowRow>,
    pub returns: LeveredReturns,
    pub totals: ModelTotals,
}

/// Whole-life aggregates across the project months.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTotals {
    pub total_interest_revenue: Money,
    pub total_om_revenue: Money,
    pub total_om_cost: Money,
    pub total_debt_interest: Money,
    pub total_tax: Money,
    pub cumulative_net_income: Money,
    pub ending_cash: Money,
    pub minimum_cash: Money,
    pub minimum_cash_month: Month,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the full DBFOM model for one scenario.
///
/// Parameters → {city receivable, debt, O&M} → income statement → cash flow →
/// balance sheet, with the levered equity cash flows and IRR taken from the
/// income statement and cash flow. Fails with `BalanceCheckFailed` rather than
/// returning a balance sheet that does not tie.
pub fn build_dbfom_model(params: &Parameters) -> DbfomResult<ComputationOutput<DbfomModel>> {
    let start = Instant::now();
    let (model, warnings) = run_model(params)?;

    tracing::info!(
        project = %params.project_name,
        months = model.income_statement.len(),
        annualized_irr = %model.returns.annualized_irr,
        "DBFOM model complete"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "DBFOM monthly amortization, three-statement and levered IRR model",
        &serde_json::json!({
            "build_months": params.build_months,
            "ops_months": params.ops_months,
            "epc": params.epc.to_string(),
            "city_rate_annual": params.city_rate_annual.to_string(),
            "debt_rate_annual": params.debt_rate_annual.to_string(),
            "rate_conversion": "monthly = (1 + EAR)^(1/12) - 1",
            "tax": "applied to positive EBT only",
            "excluded": "interest during construction, depreciation, working capital",
        }),
        warnings,
        elapsed,
        model,
    ))
}

/// Compute the model and its warnings without the output envelope.
pub(crate) fn run_model(params: &Parameters) -> DbfomResult<(DbfomModel, Vec<String>)> {
    params.validate()?;
    let rates = params.monthly_rates()?;
    let build_months = params.build_months;

    let city_receivable = build_amortization_schedule(rates.city, params.ops_months, params.epc)?;
    let debt_schedule =
        build_amortization_schedule(rates.debt, params.ops_months, params.debt_amount())?;
    let om_schedule = build_om_schedule(
        params.om_base,
        params.om_markup,
        rates.om_inflation,
        params.ops_months,
    )?;

    let income_statement = build_income_statement(
        &city_receivable.rows,
        &debt_schedule.rows,
        &om_schedule,
        build_months,
        params.tax_rate,
    )?;

    let cash_flow = build_cash_flow(
        &income_statement,
        &city_receivable.rows,
        &debt_schedule.rows,
        params.epc,
        params.debt_fraction,
        params.equity_fraction,
        build_months,
    )?;

    let balance_sheet = build_balance_sheet(
        &cash_flow,
        &city_receivable.rows,
        &debt_schedule.rows,
        &income_statement,
        params.epc,
        params.equity_fraction,
        build_months,
    )?;
    verify_balance_sheet(&balance_sheet)?;

    let equity_flows = build_levered_equity_cash_flows(
        &cash_flow,
        &debt_schedule.rows,
        &income_statement,
        params.epc,
        params.equity_fraction,
        build_months,
    )?;
    let returns = compute_levered_returns(&equity_flows, params.equity_amount())?;

    let totals = compute_totals(&income_statement, &cash_flow);
    let warnings = collect_warnings(&income_statement, &cash_flow);

    let model = DbfomModel {
        parameters: params.clone(),
        monthly_rates: rates,
        sources_uses: build_sources_uses(params),
        city_receivable,
        debt_schedule,
        om_schedule,
        income_statement,
        cash_flow,
        balance_sheet,
        equity_cash_flows: equity_cash_flow_rows(&equity_flows),
        returns,
        totals,
    };

    Ok((model, warnings))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn compute_totals(income: &[IncomeStatementRow], cash_flow: &[CashFlowRow]) -> ModelTotals {
    let mut totals = ModelTotals {
        total_interest_revenue: Decimal::ZERO,
        total_om_revenue: Decimal::ZERO,
        total_om_cost: Decimal::ZERO,
        total_debt_interest: Decimal::ZERO,
        total_tax: Decimal::ZERO,
        cumulative_net_income: Decimal::ZERO,
        ending_cash: cash_flow.last().map(|r| r.cash_balance).unwrap_or_default(),
        minimum_cash: Decimal::ZERO,
        minimum_cash_month: 0,
    };

    for row in income {
        totals.total_interest_revenue += row.interest_revenue;
        totals.total_om_revenue += row.om_revenue;
        totals.total_om_cost += row.om_cost;
        totals.total_debt_interest += row.debt_interest_expense;
        totals.total_tax += row.tax;
        totals.cumulative_net_income += row.net_income;
    }

    if let Some(lowest) = cash_flow.iter().min_by_key(|r| r.cash_balance) {
        totals.minimum_cash = lowest.cash_balance;
        totals.minimum_cash_month = lowest.month;
    }

    totals
}

fn collect_warnings(income: &[IncomeStatementRow], cash_flow: &[CashFlowRow]) -> Vec<String> {
    let mut warnings = Vec::new();

    let loss_months: Vec<Month> = income
        .iter()
        .filter(|r| r.ebt < Decimal::ZERO)
        .map(|r| r.month)
        .collect();
    if let (Some(first), Some(last)) = (loss_months.first(), loss_months.last()) {
        warnings.push(format!(
            "{} month(s) with negative EBT (months {first}–{last}); losses are not tax-credited",
            loss_months.len()
        ));
    }

    let overdrawn: Vec<Month> = cash_flow
        .iter()
        .filter(|r| r.cash_balance < Decimal::ZERO)
        .map(|r| r.month)
        .collect();
    if let Some(first) = overdrawn.first() {
        warnings.push(format!(
            "Cumulative cash is negative in {} month(s), first in month {first}",
            overdrawn.len()
        ));
    }

    warnings
}
