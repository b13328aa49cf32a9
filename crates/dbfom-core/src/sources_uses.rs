use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::parameters::Parameters;
use crate::types::Money;

/// Sources & Uses of funds at COD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesUses {
    /// All sources of funds
    pub sources: Vec<(String, Money)>,
    /// All uses of funds
    pub uses: Vec<(String, Money)>,
    pub total_sources: Money,
    pub total_uses: Money,
    /// Total sources less total uses
    pub check: Money,
    /// Whether sources equal uses
    pub balanced: bool,
}

/// Build the Sources & Uses table: EPC funded by the debt draw and the
/// equity injection.
pub fn build_sources_uses(params: &Parameters) -> SourcesUses {
    let sources = vec![
        (
            format!("Debt draw ({}%)", as_percent(params.debt_fraction)),
            params.debt_amount(),
        ),
        (
            format!("Equity injection ({}%)", as_percent(params.equity_fraction)),
            params.equity_amount(),
        ),
    ];
    let uses = vec![("EPC (construction outlay)".to_string(), params.epc)];

    let total_sources: Money = sources.iter().map(|(_, v)| *v).sum();
    let total_uses: Money = uses.iter().map(|(_, v)| *v).sum();
    let check = total_sources - total_uses;

    SourcesUses {
        sources,
        uses,
        total_sources,
        total_uses,
        check,
        balanced: check.is_zero(),
    }
}

fn as_percent(fraction: Decimal) -> Decimal {
    (fraction * dec!(100)).normalize()
}
