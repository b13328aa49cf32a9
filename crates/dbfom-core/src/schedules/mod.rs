pub mod amortization;
pub mod operations;

pub use amortization::{build_amortization_schedule, AmortizationRow, AmortizationSchedule};
pub use operations::{build_om_schedule, OmRow};
