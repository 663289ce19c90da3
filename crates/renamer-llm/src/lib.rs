//! Renamer LLM - external collaborators of the rename pipeline
//!
//! Narrow async interfaces over network services:
//! - [`TextGenerator`]: chat with a language model
//! - [`ReadabilityScorer`]: grade the readability of a code snippet
//!
//! Both come with HTTP implementations built on `reqwest` with a per-call
//! timeout. Callers create one client per worker.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod generator;
pub mod readability;

#[cfg(test)]
mod stub_server;

pub use error::{GeneratorError, ScorerError};
pub use generator::{
    build_generator, ChatCompletionsClient, ChatMessage, GatewayClient, GeneratorBackend,
    GeneratorSettings, Role, TextGenerator,
};
pub use readability::{
    parse_grade_output, score_or_zero, CodeReaderClient, ReadabilityScore, ReadabilityScorer,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for talking to external services
    pub use crate::{
        ChatMessage, GeneratorError, ReadabilityScore, ReadabilityScorer, TextGenerator,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
