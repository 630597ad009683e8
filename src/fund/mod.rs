//! Fund metadata and bucket allocation loading

mod data;
pub mod loader;

pub use data::{Fund, RiskCategory, validate_weights};
pub use loader::{load_funds, load_funds_from_reader};
