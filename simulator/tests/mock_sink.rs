use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use simulator::error::SimError;
use simulator::results::{ResultSink, ResultsRow};

#[derive(Default, Clone)]
pub struct InMemorySink {
    pub rows: Arc<Mutex<Vec<ResultsRow>>>,
    /// Fail every append after this many successful ones.
    pub fail_after: Option<usize>,
}

impl InMemorySink {
    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ResultSink for InMemorySink {
    async fn append(&self, row: &ResultsRow) -> Result<(), SimError> {
        let mut rows = self.rows.lock().await;
        if self.fail_after.is_some_and(|n| rows.len() >= n) {
            return Err(SimError::Results {
                path: "memory".into(),
                source: std::io::Error::other("disk full"),
            });
        }
        rows.push(row.clone());
        Ok(())
    }
}
