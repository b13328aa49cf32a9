pub mod error;
pub mod model;
pub mod parameters;
pub mod returns;
pub mod schedules;
pub mod sources_uses;
pub mod statements;
pub mod summary;
pub mod time_value;
pub mod types;

#[cfg(feature = "sensitivity")]
pub mod sensitivity;

pub use error::DbfomError;
pub use model::{build_dbfom_model, DbfomModel};
pub use parameters::Parameters;
pub use types::*;

/// Standard result type for all DBFOM model operations
pub type DbfomResult<T> = Result<T, DbfomError>;
