//! PostgreSQL-backed [`RoadmapStore`].

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use roadmap_db::queries::roadmaps as db;

use super::{RoadmapStore, StoredRoadmap};

/// Stores roadmap cells in the `roadmaps` table.
#[derive(Debug, Clone)]
pub struct PgRoadmapStore {
    pool: PgPool,
}

impl PgRoadmapStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RoadmapStore for PgRoadmapStore {
    async fn fetch(&self, user_id: &str) -> Result<Option<StoredRoadmap>> {
        let row = db::get_roadmap(&self.pool, user_id).await?;
        Ok(row.map(StoredRoadmap::from))
    }

    async fn save_plan(&self, user_id: &str, plan_raw: &str) -> Result<()> {
        db::upsert_plan(&self.pool, user_id, plan_raw).await?;
        Ok(())
    }

    async fn save_progress(&self, user_id: &str, progress_raw: &str) -> Result<()> {
        db::upsert_progress(&self.pool, user_id, progress_raw).await?;
        Ok(())
    }
}
