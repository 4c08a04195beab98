//! In-memory [`RoadmapStore`] for tests and offline use.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{RoadmapStore, StoredRoadmap};

#[derive(Debug, Default)]
pub struct MemoryRoadmapStore {
    rows: Mutex<HashMap<String, StoredRoadmap>>,
}

impl MemoryRoadmapStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user's row, replacing any existing one.
    pub async fn insert(&self, user_id: impl Into<String>, row: StoredRoadmap) {
        self.rows.lock().await.insert(user_id.into(), row);
    }

    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }
}

#[async_trait]
impl RoadmapStore for MemoryRoadmapStore {
    async fn fetch(&self, user_id: &str) -> Result<Option<StoredRoadmap>> {
        Ok(self.rows.lock().await.get(user_id).cloned())
    }

    async fn save_plan(&self, user_id: &str, plan_raw: &str) -> Result<()> {
        let mut rows = self.rows.lock().await;
        rows.entry(user_id.to_owned()).or_default().plan_raw = Some(plan_raw.to_owned());
        Ok(())
    }

    async fn save_progress(&self, user_id: &str, progress_raw: &str) -> Result<()> {
        let mut rows = self.rows.lock().await;
        rows.entry(user_id.to_owned()).or_default().progress_raw = Some(progress_raw.to_owned());
        Ok(())
    }
}
