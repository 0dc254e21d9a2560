//! Local filesystem store.
//!
//! Tests are read from a directory of TOML files; reports are written as
//! `<attempt_id>.json` into a results directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::instrument;

use satprep_core::model::Test;
use satprep_core::parser::{load_test_directory, parse_test_str};
use satprep_core::report::ScoreReport;
use satprep_core::traits::{Store, TestListing};
use satprep_core::StoreError;

/// A store backed by two local directories.
pub struct FileStore {
    tests_dir: PathBuf,
    results_dir: PathBuf,
}

impl FileStore {
    pub fn new(tests_dir: impl Into<PathBuf>, results_dir: impl Into<PathBuf>) -> Self {
        Self {
            tests_dir: tests_dir.into(),
            results_dir: results_dir.into(),
        }
    }

    pub fn tests_dir(&self) -> &Path {
        &self.tests_dir
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    fn report_path(&self, attempt_id: &str) -> Result<PathBuf, StoreError> {
        check_id(attempt_id)?;
        Ok(self.results_dir.join(format!("{attempt_id}.json")))
    }

    /// Parse every test file in the tests directory on the blocking pool.
    async fn load_all(&self) -> Result<Vec<Test>, StoreError> {
        let dir = self.tests_dir.clone();
        tokio::task::spawn_blocking(move || {
            if !dir.is_dir() {
                return Ok(Vec::new());
            }
            load_test_directory(&dir).map_err(|e| StoreError::Malformed(format!("{e:#}")))
        })
        .await
        .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
    }
}

/// Reject ids that could escape the store directory.
fn check_id(id: &str) -> Result<(), StoreError> {
    if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
        return Err(StoreError::Malformed(format!("invalid document id: {id:?}")));
    }
    Ok(())
}

#[async_trait]
impl Store for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    #[instrument(skip(self), fields(dir = %self.tests_dir.display()))]
    async fn get_test(&self, test_id: &str) -> Result<Option<Test>, StoreError> {
        check_id(test_id)?;

        // Conventional location first, then any file declaring this id.
        let direct = self.tests_dir.join(format!("{test_id}.toml"));
        if tokio::fs::metadata(&direct).await.is_ok_and(|m| m.is_file()) {
            let content = tokio::fs::read_to_string(&direct).await?;
            let test = parse_test_str(&content, &direct)
                .map_err(|e| StoreError::Malformed(format!("{e:#}")))?;
            if test.id == test_id {
                return Ok(Some(test));
            }
        }

        Ok(self.load_all().await?.into_iter().find(|t| t.id == test_id))
    }

    async fn list_tests(&self) -> Result<Vec<TestListing>, StoreError> {
        Ok(self.load_all().await?.iter().map(TestListing::from).collect())
    }

    #[instrument(skip(self, report), fields(attempt = %report.result.attempt_id))]
    async fn put_report(&self, report: &ScoreReport) -> Result<(), StoreError> {
        let path = self.report_path(&report.result.attempt_id)?;
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| StoreError::Malformed(e.to_string()))?;
        tokio::fs::create_dir_all(&self.results_dir).await?;
        tokio::fs::write(&path, json).await?;
        tracing::debug!("wrote {}", path.display());
        Ok(())
    }

    async fn get_report(&self, attempt_id: &str) -> Result<Option<ScoreReport>, StoreError> {
        let path = self.report_path(attempt_id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StoreError::Malformed(format!("{}: {e}", path.display())))
    }
}
