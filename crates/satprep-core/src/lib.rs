//! satprep-core: Test model, validation, and SAT-style scoring.
//!
//! This crate defines the data model, the answer normalizer, the structural
//! validators, and the scoring calculator that the rest of satprep builds on.
//! Everything except [`engine`] is synchronous and free of side effects.

pub mod engine;
pub mod error;
pub mod model;
pub mod normalizer;
pub mod parser;
pub mod report;
pub mod scale;
pub mod scoring;
pub mod statistics;
pub mod traits;
pub mod validation;

pub use error::{GradingError, ScoringError, StoreError};
pub use normalizer::answers_match;
pub use scoring::{score_attempt, TestResult};
pub use validation::{validate_test, validate_test_attempt, ValidationResult};
