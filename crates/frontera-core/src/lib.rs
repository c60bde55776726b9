pub mod assessment;
pub mod cadence;
pub mod config;
pub mod error;
pub mod framework;
pub mod gamification;
pub mod markers;
pub mod store;
pub mod types;

pub use error::{FronteraError, Result};
