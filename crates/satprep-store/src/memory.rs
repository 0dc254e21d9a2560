//! In-memory store for tests and embedding.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use satprep_core::model::Test;
use satprep_core::report::ScoreReport;
use satprep_core::traits::{Store, TestListing};
use satprep_core::StoreError;

/// A store that keeps everything in process memory.
///
/// Useful for exercising the grading engine without files or a network.
pub struct MemoryStore {
    /// Test definitions keyed by id.
    tests: HashMap<String, Test>,
    /// Reports keyed by attempt id.
    reports: Mutex<HashMap<String, ScoreReport>>,
    /// Number of `get_test` calls made.
    get_calls: AtomicU32,
    /// Number of `put_report` calls made.
    put_calls: AtomicU32,
}

impl MemoryStore {
    /// Create a store serving the given tests.
    pub fn new(tests: impl IntoIterator<Item = Test>) -> Self {
        Self {
            tests: tests.into_iter().map(|t| (t.id.clone(), t)).collect(),
            reports: Mutex::new(HashMap::new()),
            get_calls: AtomicU32::new(0),
            put_calls: AtomicU32::new(0),
        }
    }

    /// Create an empty store.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Get the number of `get_test` calls made.
    pub fn get_calls(&self) -> u32 {
        self.get_calls.load(Ordering::Relaxed)
    }

    /// Get the number of `put_report` calls made.
    pub fn put_calls(&self) -> u32 {
        self.put_calls.load(Ordering::Relaxed)
    }

    /// Number of reports currently held.
    pub fn report_count(&self) -> usize {
        self.reports.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get_test(&self, test_id: &str) -> Result<Option<Test>, StoreError> {
        self.get_calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.tests.get(test_id).cloned())
    }

    async fn list_tests(&self) -> Result<Vec<TestListing>, StoreError> {
        let mut listings: Vec<TestListing> = self.tests.values().map(TestListing::from).collect();
        listings.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(listings)
    }

    async fn put_report(&self, report: &ScoreReport) -> Result<(), StoreError> {
        self.put_calls.fetch_add(1, Ordering::Relaxed);
        self.reports
            .lock()
            .map_err(|_| StoreError::Malformed("report map poisoned".into()))?
            .insert(report.result.attempt_id.clone(), report.clone());
        Ok(())
    }

    async fn get_report(&self, attempt_id: &str) -> Result<Option<ScoreReport>, StoreError> {
        let reports = self
            .reports
            .lock()
            .map_err(|_| StoreError::Malformed("report map poisoned".into()))?;
        Ok(reports.get(attempt_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satprep_core::model::*;
    use satprep_core::scoring::score_attempt;

    fn sample_test(id: &str) -> Test {
        Test {
            id: id.into(),
            title: format!("Test {id}"),
            sections: vec![Section {
                id: "math".into(),
                subject: Subject::Math,
                questions: vec![Question {
                    id: "q1".into(),
                    kind: QuestionType::GridIn,
                    correct: AnswerKey::from("12"),
                    topic: "arithmetic".into(),
                    skill: "computation".into(),
                    points: 2,
                    choices: None,
                }],
                time_limit_minutes: 5,
                scale: None,
            }],
            metadata: TestMetadata::default(),
            overall_rule: Default::default(),
        }
    }

    #[tokio::test]
    async fn serves_tests_and_counts_calls() {
        let store = MemoryStore::new(vec![sample_test("b"), sample_test("a")]);

        assert!(store.get_test("a").await.unwrap().is_some());
        assert!(store.get_test("zzz").await.unwrap().is_none());
        assert_eq!(store.get_calls(), 2);

        let listings = store.list_tests().await.unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].id, "a");
        assert_eq!(listings[0].max_points, 2);
    }

    #[tokio::test]
    async fn stores_reports_by_attempt() {
        let store = MemoryStore::empty();
        let test = sample_test("t");
        let attempt = TestAttempt {
            id: "attempt-1".into(),
            test_id: "t".into(),
            user_id: None,
            answers: vec![StudentAnswer::new("q1", "12")],
            status: AttemptStatus::Submitted,
            started_at: None,
            submitted_at: None,
        };
        let report = ScoreReport::new(&test, &attempt, score_attempt(&test, &attempt).unwrap());

        store.put_report(&report).await.unwrap();
        assert_eq!(store.put_calls(), 1);
        assert_eq!(store.report_count(), 1);

        let loaded = store.get_report("attempt-1").await.unwrap().unwrap();
        assert_eq!(loaded.result.overall.earned, 2);
        assert!(store.get_report("other").await.unwrap().is_none());
    }
}
