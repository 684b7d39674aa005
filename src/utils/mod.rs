//! Utility module: errors, logging, metrics, fixed-point helpers.

pub mod errors;
pub mod metrics;
pub mod logging;
pub mod math;

pub use errors::{BalanceMismatch, LoadError, Result};
pub use metrics::{MetricsRegistry, METRICS};
pub use logging::init_logging;
pub use math::multiply_by_rational;
