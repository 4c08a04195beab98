use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One user's stored roadmap cells.
///
/// Both cells are kept exactly as written: `plan_raw` comes from upstream
/// tooling and may be malformed, `progress_raw` is written by this system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RoadmapRow {
    pub user_id: String,
    pub plan_raw: Option<String>,
    pub progress_raw: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
