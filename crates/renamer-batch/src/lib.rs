//! Renamer Batch - process entry point for the renamer
//!
//! Runs the rename pipeline over many units in parallel:
//! - `single` / `dir`: rename the tests of Java files and write them out
//! - `eval`: rename oracle prompts and score them against ground truth
//!
//! Configuration is loaded once into a [`PipelineConfig`] and passed into
//! the [`BatchDriver`], which gives each worker its own generator client.
//!
//! # Example
//!
//! ```rust,ignore
//! use renamer_batch::{BatchDriver, PipelineConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = PipelineConfig::load(None)?;
//! let settings = config.generator_settings();
//! let factory = Arc::new(move || renamer_llm::build_generator(&settings));
//! let report = BatchDriver::new(&config, factory, "out")
//!     .run_dir(std::path::Path::new("tests/java"))
//!     .await?;
//! println!("renamed {} of {}", report.renamed(), report.tests_found());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod driver;
pub mod error;
pub mod files;
pub mod logging;
pub mod oracle;
pub mod report;

pub use config::PipelineConfig;
pub use driver::{BatchDriver, GeneratorFactory};
pub use error::{BatchError, ConfigError, LoggingError, UnitError};
pub use files::list_files;
pub use logging::init_logging;
pub use oracle::{load_oracle_file, parse_oracle_lines, OracleRecord};
pub use report::{FileOutcome, MethodOutcome, RunReport};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for driving runs
    pub use crate::{BatchDriver, GeneratorFactory, PipelineConfig, RunReport};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
