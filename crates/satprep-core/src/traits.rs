//! Collaborator trait definitions.
//!
//! The scoring core never touches storage directly. Request handlers and the
//! grading engine receive an explicitly constructed [`Store`] instead; the
//! implementations live in the `satprep-store` crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::Test;
use crate::report::ScoreReport;

/// Trait for persistence backends that supply tests and keep score reports.
#[async_trait]
pub trait Store: Send + Sync {
    /// Human-readable backend name (e.g. "file").
    fn name(&self) -> &str;

    /// Fetch a test definition by id. `Ok(None)` if it does not exist.
    async fn get_test(&self, test_id: &str) -> Result<Option<Test>, StoreError>;

    /// List the tests this store can supply.
    async fn list_tests(&self) -> Result<Vec<TestListing>, StoreError>;

    /// Persist a score report, keyed by its attempt id.
    async fn put_report(&self, report: &ScoreReport) -> Result<(), StoreError>;

    /// Fetch the stored report for an attempt. `Ok(None)` if there is none.
    async fn get_report(&self, attempt_id: &str) -> Result<Option<ScoreReport>, StoreError>;
}

/// A test as listed by a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestListing {
    pub id: String,
    pub title: String,
    pub question_count: usize,
    pub max_points: u32,
}

impl From<&Test> for TestListing {
    fn from(test: &Test) -> Self {
        Self {
            id: test.id.clone(),
            title: test.title.clone(),
            question_count: test.question_count(),
            max_points: test.max_points(),
        }
    }
}
