//! Renamer Core - rename-and-validate pipeline
//!
//! Turns an untrusted model's name suggestions into rewrites that provably
//! change nothing but identifier spelling:
//! - Decode the model's reply into an [`IdentifierMapping`]
//! - Apply it by token position ([`apply_mapping`])
//! - Prove the result is a pure rename ([`check_only_renames`])
//! - Retry with corrective prompts until accepted or out of attempts
//!   ([`RenameOrchestrator`])
//! - Put accepted rewrites back into the file ([`reassemble`])
//!
//! # Example
//!
//! ```rust,ignore
//! use renamer_core::{RenameOrchestrator, RenameSettings};
//!
//! # async fn example(generator: &dyn renamer_llm::TextGenerator) {
//! let settings = RenameSettings::default().with_max_attempts(3);
//! let orchestrator = RenameOrchestrator::new(generator, &settings);
//! let case = orchestrator
//!     .rename("func_1", "@Test public void func_1(){ int var_1 = 2; }")
//!     .await;
//! println!("clean: {}", case.is_clean());
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod apply;
pub mod error;
pub mod invariant;
pub mod mapping;
pub mod orchestrator;
pub mod prompts;
pub mod reassemble;
pub mod state;
pub mod types;

pub use apply::{apply_edits, apply_mapping, RenameEdit};
pub use error::{AttemptError, Divergence, ReassembleError, TransitionError};
pub use invariant::{check_only_renames, normalize, only_renames, NormalizedToken};
pub use mapping::{decode_response, DecodedResponse, IdentifierMapping};
pub use orchestrator::{
    validate_response, AcceptedRename, AttemptContext, RenameOrchestrator, RenameSettings,
};
pub use reassemble::{reassemble, write_output};
pub use state::{allowed_transitions, validate_transition, Phase};
pub use types::TestCase;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running renames
    pub use crate::{
        reassemble, write_output, IdentifierMapping, RenameOrchestrator, RenameSettings, TestCase,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
