//! The `RoadmapStore` trait -- the seam between the roadmap service and
//! whatever holds the raw cells.
//!
//! [`PgRoadmapStore`] is the production backend; [`MemoryRoadmapStore`]
//! serves tests and offline runs. The trait is object-safe so the HTTP layer
//! can hold an `Arc<dyn RoadmapStore>`.

pub mod memory;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;

use roadmap_db::models::RoadmapRow;

pub use memory::MemoryRoadmapStore;
pub use postgres::PgRoadmapStore;

/// The two raw cells stored for a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredRoadmap {
    pub plan_raw: Option<String>,
    pub progress_raw: Option<String>,
}

impl From<RoadmapRow> for StoredRoadmap {
    fn from(row: RoadmapRow) -> Self {
        Self {
            plan_raw: row.plan_raw,
            progress_raw: row.progress_raw,
        }
    }
}

/// Row store holding one raw plan cell and one progress cell per user.
#[async_trait]
pub trait RoadmapStore: Send + Sync {
    /// Fetch both cells, `None` when the user has no row.
    async fn fetch(&self, user_id: &str) -> Result<Option<StoredRoadmap>>;

    /// Write the raw plan cell, creating the row if needed.
    async fn save_plan(&self, user_id: &str, plan_raw: &str) -> Result<()>;

    /// Overwrite the progress cell, creating the row if needed.
    ///
    /// Last writer wins; implementations do no version checking.
    async fn save_progress(&self, user_id: &str, progress_raw: &str) -> Result<()>;
}

// If this compiles, the trait can be used as `dyn RoadmapStore`.
const _: () = {
    fn _assert_object_safe(_: &dyn RoadmapStore) {}
};
