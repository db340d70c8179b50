//! Validated services and the store-backed manager that drives them.

pub mod condo_manager;
pub mod services;
pub mod utils;

pub use condo_manager::{CondoManager, LoadOutcome};
