//! HTTP document store client.
//!
//! Talks to a REST document service that exposes tests and results:
//!
//! - `GET  {base}/tests`
//! - `GET  {base}/tests/{id}`
//! - `PUT  {base}/results/{attempt_id}`
//! - `GET  {base}/results/{attempt_id}`

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::instrument;

use satprep_core::model::Test;
use satprep_core::report::ScoreReport;
use satprep_core::traits::{Store, TestListing};
use satprep_core::StoreError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A store reached over HTTP with optional bearer-token auth.
pub struct HttpStore {
    base_url: String,
    token: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl HttpStore {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        let timeout_secs = timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| StoreError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            timeout_secs,
            client,
        })
    }

    fn url(&self, collection: &str, id: Option<&str>) -> Result<String, StoreError> {
        match id {
            Some(id) => {
                if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || "-_.".contains(c)) {
                    return Err(StoreError::Malformed(format!("invalid document id: {id:?}")));
                }
                Ok(format!("{}/{collection}/{id}", self.base_url))
            }
            None => Ok(format!("{}/{collection}", self.base_url)),
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> StoreError {
        if e.is_timeout() {
            StoreError::Timeout(self.timeout_secs)
        } else {
            StoreError::Network(e.to_string())
        }
    }

    /// Map a non-success response onto a `StoreError`.
    async fn status_error(response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        match status {
            401 | 403 => StoreError::AuthenticationFailed(message),
            _ => StoreError::Api { status, message },
        }
    }

    /// GET a JSON document, mapping 404 to `None`.
    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<Option<T>, StoreError> {
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| StoreError::Malformed(format!("{url}: {e}")))
    }
}

#[async_trait]
impl Store for HttpStore {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self), fields(base = %self.base_url))]
    async fn get_test(&self, test_id: &str) -> Result<Option<Test>, StoreError> {
        self.get_json(self.url("tests", Some(test_id))?).await
    }

    async fn list_tests(&self) -> Result<Vec<TestListing>, StoreError> {
        Ok(self
            .get_json(self.url("tests", None)?)
            .await?
            .unwrap_or_default())
    }

    #[instrument(skip(self, report), fields(base = %self.base_url, attempt = %report.result.attempt_id))]
    async fn put_report(&self, report: &ScoreReport) -> Result<(), StoreError> {
        let url = self.url("results", Some(&report.result.attempt_id))?;
        let response = self
            .authorize(self.client.put(&url))
            .json(report)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }
        Ok(())
    }

    async fn get_report(&self, attempt_id: &str) -> Result<Option<ScoreReport>, StoreError> {
        self.get_json(self.url("results", Some(attempt_id))?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satprep_core::model::*;
    use satprep_core::scoring::score_attempt;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_test() -> Test {
        Test {
            id: "sat-1".into(),
            title: "SAT Practice 1".into(),
            sections: vec![Section {
                id: "rw".into(),
                subject: Subject::ReadingWriting,
                questions: vec![Question {
                    id: "r1".into(),
                    kind: QuestionType::MultipleChoice,
                    correct: AnswerKey::from("C"),
                    topic: "words-in-context".into(),
                    skill: "craft-and-structure".into(),
                    points: 1,
                    choices: Some(4),
                }],
                time_limit_minutes: 32,
                scale: None,
            }],
            metadata: TestMetadata::default(),
            overall_rule: Default::default(),
        }
    }

    fn sample_report() -> ScoreReport {
        let test = sample_test();
        let attempt = TestAttempt {
            id: "att-1".into(),
            test_id: "sat-1".into(),
            user_id: None,
            answers: vec![StudentAnswer::new("r1", "c")],
            status: AttemptStatus::Submitted,
            started_at: None,
            submitted_at: None,
        };
        ScoreReport::new(&test, &attempt, score_attempt(&test, &attempt).unwrap())
    }

    #[tokio::test]
    async fn fetches_test_with_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/tests/sat-1"))
            .and(header("Authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_test()))
            .mount(&server)
            .await;

        let store = HttpStore::new(&server.uri(), Some("secret".into()), None).unwrap();
        let test = store.get_test("sat-1").await.unwrap().unwrap();
        assert_eq!(test, sample_test());
    }

    #[tokio::test]
    async fn missing_test_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/tests/nope"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = HttpStore::new(&server.uri(), None, None).unwrap();
        assert!(store.get_test("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lists_tests() {
        let server = MockServer::start().await;
        let listing = vec![TestListing::from(&sample_test())];

        Mock::given(method("GET"))
            .and(path("/tests"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&listing))
            .mount(&server)
            .await;

        let store = HttpStore::new(&format!("{}/", server.uri()), None, None).unwrap();
        assert_eq!(store.list_tests().await.unwrap(), listing);
    }

    #[tokio::test]
    async fn put_report_sends_json() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/results/att-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let store = HttpStore::new(&server.uri(), None, None).unwrap();
        store.put_report(&sample_report()).await.unwrap();
    }

    #[tokio::test]
    async fn auth_failure_is_permanent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/results/att-1"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;

        let store = HttpStore::new(&server.uri(), Some("wrong".into()), None).unwrap();
        let err = store.get_report("att-1").await.unwrap_err();
        assert!(matches!(err, StoreError::AuthenticationFailed(ref m) if m == "bad token"));
        assert!(err.is_permanent());
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/results/att-1"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let store = HttpStore::new(&server.uri(), None, None).unwrap();
        let err = store.put_report(&sample_report()).await.unwrap_err();
        assert!(matches!(err, StoreError::Api { status: 503, .. }));
        assert!(!err.is_permanent());
    }

    #[tokio::test]
    async fn malformed_body_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/tests/sat-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let store = HttpStore::new(&server.uri(), None, None).unwrap();
        let err = store.get_test("sat-1").await.unwrap_err();
        assert!(matches!(err, StoreError::Malformed(_)));
    }

    #[tokio::test]
    async fn rejects_unsafe_ids() {
        let store = HttpStore::new("http://localhost:1", None, None).unwrap();
        assert!(matches!(
            store.get_test("a/b").await.unwrap_err(),
            StoreError::Malformed(_)
        ));
    }
}
