//! Renamer Eval - scoring renamed tests against ground truth
//!
//! Provides:
//! - Per-example metrics ([`evaluate`]): edit distance, character error
//!   rate, ordered and unordered identifier accuracy, precision, recall, F1
//! - A thread-safe [`MetricsAccumulator`] that averages them into
//!   [`DatasetMetrics`] and keeps the failed units apart

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod aggregate;
pub mod metrics;

pub use aggregate::{DatasetMetrics, MetricsAccumulator, UnitFailure};
pub use metrics::{evaluate, extract_identifiers, levenshtein, PairMetrics};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for evaluation
    pub use crate::{evaluate, DatasetMetrics, MetricsAccumulator, PairMetrics};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
