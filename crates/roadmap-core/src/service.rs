//! Roadmap service: combines the stored plan and progress cells for a user
//! and applies milestone completions.
//!
//! The service owns the read-then-write cycle against a [`RoadmapStore`].
//! There is no transaction around it: two concurrent completions for the same
//! user may overwrite each other, and the last write wins.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::plan::{Diagnostics, PlanReading, RoadmapPlan, read_plan};
use crate::progress::{ProgressError, RoadmapProgress};
use crate::store::RoadmapStore;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("no roadmap found for user {0:?}")]
    NotFound(String),

    #[error("user id must not be empty")]
    EmptyUserId,

    #[error(transparent)]
    InvalidMilestone(ProgressError),

    #[error("stored progress for user {user_id:?} is corrupt")]
    CorruptProgress {
        user_id: String,
        #[source]
        source: ProgressError,
    },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Everything a consumer needs to render a user's roadmap.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapView {
    pub user_id: String,
    /// `None` when the plan cell is unrecoverable or has no milestone data.
    pub plan: Option<RoadmapPlan>,
    pub progress: RoadmapProgress,
    #[serde(skip)]
    pub diagnostics: Diagnostics,
}

/// Load the combined view for `user_id`.
pub async fn load_roadmap(
    store: &dyn RoadmapStore,
    user_id: &str,
) -> Result<RoadmapView, ServiceError> {
    let user_id = checked_user_id(user_id)?;
    let row = store
        .fetch(user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(user_id.to_owned()))?;

    let reading = read_plan(row.plan_raw.as_deref());
    log_reading(user_id, &reading);

    let progress = parse_progress(user_id, row.progress_raw.as_deref())?;
    let PlanReading { plan, diagnostics } = reading;

    Ok(RoadmapView {
        user_id: user_id.to_owned(),
        plan: plan.filter(RoadmapPlan::has_milestones),
        progress,
        diagnostics,
    })
}

/// Mark `milestone` complete for `user_id` and overwrite the stored progress.
///
/// The milestone number is validated before the store is touched. A user
/// with no row yet gets fresh progress.
pub async fn complete_milestone(
    store: &dyn RoadmapStore,
    user_id: &str,
    milestone: u32,
    now: DateTime<Utc>,
) -> Result<RoadmapProgress, ServiceError> {
    let user_id = checked_user_id(user_id)?;
    if milestone == 0 {
        return Err(ServiceError::InvalidMilestone(
            ProgressError::InvalidMilestone(milestone.to_string()),
        ));
    }

    let stored = store.fetch(user_id).await?;
    let progress_raw = stored.as_ref().and_then(|row| row.progress_raw.as_deref());
    let mut progress = parse_progress(user_id, progress_raw)?;

    progress
        .complete(milestone, now)
        .map_err(ServiceError::InvalidMilestone)?;

    let raw = progress
        .to_stored()
        .map_err(|source| ServiceError::Store(anyhow::Error::new(source)))?;
    store.save_progress(user_id, &raw).await?;

    tracing::info!(
        user_id,
        milestone,
        current_milestone = progress.current_milestone,
        completed = progress.milestones_completed.len(),
        "milestone completed"
    );

    Ok(progress)
}

/// Store a raw plan cell as-is and report how it would read back.
pub async fn store_plan(
    store: &dyn RoadmapStore,
    user_id: &str,
    plan_raw: &str,
) -> Result<PlanReading, ServiceError> {
    let user_id = checked_user_id(user_id)?;
    store.save_plan(user_id, plan_raw).await?;

    let reading = read_plan(Some(plan_raw));
    log_reading(user_id, &reading);
    Ok(reading)
}

fn checked_user_id(user_id: &str) -> Result<&str, ServiceError> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::EmptyUserId);
    }
    Ok(trimmed)
}

fn parse_progress(user_id: &str, raw: Option<&str>) -> Result<RoadmapProgress, ServiceError> {
    RoadmapProgress::from_stored(user_id, raw).map_err(|source| ServiceError::CorruptProgress {
        user_id: user_id.to_owned(),
        source,
    })
}

fn log_reading(user_id: &str, reading: &PlanReading) {
    let strategy = reading
        .diagnostics
        .succeeded_strategy()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "none".to_owned());
    let milestones = reading.plan.as_ref().map_or(0, |p| p.milestones().len());

    if reading.diagnostics.has_data_loss() {
        tracing::warn!(
            user_id,
            strategy = %strategy,
            milestones,
            dropped_entries = ?reading.diagnostics.dropped_entries(),
            "plan read with data loss"
        );
    } else {
        tracing::debug!(user_id, strategy = %strategy, milestones, "plan read");
    }
}
