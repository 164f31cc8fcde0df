//! On-disk layout for chronicle reports.
//!
//! Each closed session produces two files in the output directory:
//! `{session_id}.json` (the structured report) and
//! `{session_id}_narrative.md` (the rendered narrative).

use std::path::{Path, PathBuf};

use crate::storage::{JsonStore, StorageResult};

use super::report::Report;

/// Paths written for one persisted session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSession {
    pub report_path: PathBuf,
    pub narrative_path: PathBuf,
}

/// Reads and writes chronicle reports and narratives.
#[derive(Debug, Clone)]
pub struct ChronicleStore {
    store: JsonStore,
}

impl ChronicleStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            store: JsonStore::new(output_dir),
        }
    }

    pub fn output_dir(&self) -> &Path {
        self.store.base_path()
    }

    /// Writes the report and its narrative.
    pub async fn persist(&self, report: &Report, narrative: &str) -> StorageResult<PersistedSession> {
        let report_path = self.store.save(&report.session_id, report).await?;
        let narrative_path = self
            .store
            .write_file(&narrative_file_name(&report.session_id), narrative)
            .await?;

        Ok(PersistedSession {
            report_path,
            narrative_path,
        })
    }

    /// Loads a previously persisted report.
    pub async fn load_report(&self, session_id: &str) -> StorageResult<Report> {
        self.store.load(session_id).await
    }

    /// Loads the narrative of a previously persisted session.
    pub async fn load_narrative(&self, session_id: &str) -> StorageResult<String> {
        let path = self.narrative_path(session_id);
        if !path.exists() {
            return Err(crate::storage::StorageError::NotFound(session_id.to_string()));
        }
        Ok(tokio::fs::read_to_string(path).await?)
    }

    /// Lists the ids of every persisted session, sorted.
    pub async fn list_sessions(&self) -> StorageResult<Vec<String>> {
        self.store.list().await
    }

    pub fn narrative_path(&self, session_id: &str) -> PathBuf {
        self.store
            .base_path()
            .join(narrative_file_name(session_id))
    }
}

fn narrative_file_name(session_id: &str) -> String {
    format!("{}_narrative.md", session_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chronicle::config::ChronicleConfig;
    use crate::storage::StorageError;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_persist_writes_both_files() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = ChronicleStore::new(dir.path());
        let report = Report::synthesize("session_x", &[], &ChronicleConfig::default());

        let paths = store
            .persist(&report, "# narrative")
            .await
            .expect("persist failed");
        assert_eq!(paths.report_path, dir.path().join("session_x.json"));
        assert_eq!(
            paths.narrative_path,
            dir.path().join("session_x_narrative.md")
        );

        let loaded = store.load_report("session_x").await.expect("load failed");
        assert_eq!(loaded.session_id, "session_x");
        assert_eq!(
            store.load_narrative("session_x").await.expect("load failed"),
            "# narrative"
        );
        assert_eq!(
            store.list_sessions().await.expect("list failed"),
            vec!["session_x".to_string()]
        );
    }

    #[tokio::test]
    async fn test_missing_narrative_is_not_found() {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = ChronicleStore::new(dir.path());
        let result = store.load_narrative("nope").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }
}
