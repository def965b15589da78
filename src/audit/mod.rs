//! Run log
//!
//! In-memory record of completed snapshot runs, hashed so a stored record
//! can later be checked against the retrieved input it was produced from.

use crate::models::{RunRecord, SnapshotOutcome};
use crate::Result;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Run record storage
pub struct RunLog {
    records: Arc<RwLock<HashMap<Uuid, RunRecord>>>,
}

impl RunLog {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Store the record of a completed snapshot run.
    pub async fn record_snapshot(&self, outcome: &SnapshotOutcome, input: &str) -> Result<Uuid> {
        let record = RunRecord {
            run_id: outcome.run_id,
            pipeline: outcome.pipeline,
            domain: outcome.domain,
            input_hash: compute_input_hash(input),
            summary: outcome.summary.clone(),
            steps: Arc::new(outcome.steps.clone()),
            created_at: Utc::now(),
            elapsed_ms: outcome.elapsed_ms,
        };

        let run_id = record.run_id;
        let mut records = self.records.write().await;
        records.insert(run_id, record);
        Ok(run_id)
    }

    /// Retrieve a record by run ID
    pub async fn get(&self, run_id: Uuid) -> Result<Option<RunRecord>> {
        let records = self.records.read().await;
        Ok(records.get(&run_id).cloned())
    }

    /// List all run IDs (sorted by created_at)
    pub async fn list_recent(&self) -> Result<Vec<Uuid>> {
        let records = self.records.read().await;

        let mut items: Vec<_> = records
            .iter()
            .map(|(id, record)| (*id, record.created_at))
            .collect();

        items.sort_by_key(|(_, created_at)| *created_at);

        Ok(items.into_iter().map(|(id, _)| id).collect())
    }

    /// Verify a record's integrity against the input it claims to summarize.
    pub async fn verify_integrity(&self, run_id: Uuid, input: &str) -> Result<bool> {
        let records = self.records.read().await;

        if let Some(record) = records.get(&run_id) {
            Ok(record.input_hash == compute_input_hash(input))
        } else {
            Ok(false)
        }
    }
}

impl Default for RunLog {
    fn default() -> Self {
        Self::new()
    }
}

/// SHA256 hash of a retriever's combined text
pub fn compute_input_hash(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Domain, StepStatus, StepTrace};
    use serde_json::json;

    fn sample_outcome() -> SnapshotOutcome {
        SnapshotOutcome {
            run_id: Uuid::new_v4(),
            pipeline: "perks_snapshot_pipeline",
            domain: Domain::Perks,
            summary: json!({ "activities": [], "partners": [], "insights": "" }),
            steps: vec![StepTrace {
                query: "List my benefits.".to_string(),
                status: StepStatus::Success,
                elapsed_ms: 12,
            }],
            elapsed_ms: 40,
        }
    }

    #[tokio::test]
    async fn test_record_and_get() {
        let log = RunLog::new();
        let outcome = sample_outcome();

        let run_id = log.record_snapshot(&outcome, "benefits text").await.unwrap();
        let record = log.get(run_id).await.unwrap().unwrap();

        assert_eq!(record.pipeline, "perks_snapshot_pipeline");
        assert_eq!(record.steps.len(), 1);
    }

    #[tokio::test]
    async fn test_integrity_check() {
        let log = RunLog::new();
        let outcome = sample_outcome();
        let run_id = log.record_snapshot(&outcome, "benefits text").await.unwrap();

        assert!(log.verify_integrity(run_id, "benefits text").await.unwrap());
        assert!(!log.verify_integrity(run_id, "tampered text").await.unwrap());
        assert!(!log.verify_integrity(Uuid::new_v4(), "benefits text").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_recent() {
        let log = RunLog::new();
        let first = log.record_snapshot(&sample_outcome(), "a").await.unwrap();
        let second = log.record_snapshot(&sample_outcome(), "b").await.unwrap();

        let ids = log.list_recent().await.unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&first));
        assert!(ids.contains(&second));
    }
}
