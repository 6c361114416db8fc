//! Collaborator traits the pipeline depends on but does not implement:
//! baseline persistence and result/usage reporting. Chat-platform adapters
//! supply concrete implementations; this crate only needs the contract.

use crate::result::{DetectionResult, Stage};
use async_trait::async_trait;
use phisdebate_triage::BaselineSnapshot;

/// Loads a sender's historical posting profile ahead of a pipeline run.
/// Returning `None` is a first-class outcome — new senders simply get no
/// behavioral-anomaly scoring, not an error.
#[async_trait]
pub trait BaselineStore: Send + Sync {
    async fn load_baseline(&self, sender_id: &str) -> Option<BaselineSnapshot>;
}

/// Receives finalized results and per-stage token usage. Both methods are
/// fire-and-forget from the pipeline's perspective: a sink failure never
/// changes the `DetectionResult` already returned to the caller.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn persist_result(&self, result: &DetectionResult);

    async fn accumulate_usage(&self, stage: Stage, tokens_in: u32, tokens_out: u32);
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct InMemoryBaselineStore {
        baselines: Mutex<HashMap<String, BaselineSnapshot>>,
    }

    impl InMemoryBaselineStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&self, sender_id: impl Into<String>, baseline: BaselineSnapshot) {
            self.baselines.lock().unwrap().insert(sender_id.into(), baseline);
        }
    }

    #[async_trait]
    impl BaselineStore for InMemoryBaselineStore {
        async fn load_baseline(&self, sender_id: &str) -> Option<BaselineSnapshot> {
            self.baselines.lock().unwrap().get(sender_id).cloned()
        }
    }

    #[derive(Default)]
    pub struct InMemoryResultSink {
        pub results: Mutex<Vec<DetectionResult>>,
        pub tokens_in: Mutex<u32>,
        pub tokens_out: Mutex<u32>,
    }

    impl InMemoryResultSink {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl ResultSink for InMemoryResultSink {
        async fn persist_result(&self, result: &DetectionResult) {
            self.results.lock().unwrap().push(result.clone());
        }

        async fn accumulate_usage(&self, _stage: Stage, tokens_in: u32, tokens_out: u32) {
            *self.tokens_in.lock().unwrap() += tokens_in;
            *self.tokens_out.lock().unwrap() += tokens_out;
        }
    }

    #[tokio::test]
    async fn in_memory_baseline_store_round_trips() {
        let store = InMemoryBaselineStore::new();
        store.insert("alice", BaselineSnapshot::empty());
        assert!(store.load_baseline("alice").await.is_some());
        assert!(store.load_baseline("bob").await.is_none());
    }
}
