pub mod export;
pub mod model;
pub mod payment;
pub mod sensitivity;
pub mod sources_uses;
pub mod summary;
