//! Milestone progress state machine.
//!
//! A [`RoadmapProgress`] is always fully materialized. Its one transition is
//! [`RoadmapProgress::complete`]:
//!
//! ```text
//! complete(n), n >= 1:
//!   milestonesCompleted  += n        (sorted, no duplicates)
//!   currentMilestone      = max(current, min(n + 1, 12))
//!   milestoneProgress[n] <- { completed: true, completedDate: now }  (merged)
//! ```
//!
//! Nothing ever decrements `currentMilestone` or removes a completed
//! milestone. Repeating `complete(n)` only refreshes `completedDate`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Number of milestones in a roadmap; the ceiling for `currentMilestone`.
pub const MILESTONE_COUNT: u32 = 12;

/// Errors from parsing stored progress or validating a milestone number.
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("milestone number is missing")]
    MissingMilestone,

    #[error("milestone number must be a positive integer, got {0}")]
    InvalidMilestone(String),

    #[error("stored progress is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Completion record for one milestone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneProgress {
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<DateTime<Utc>>,
    /// Any other fields stored for the milestone, kept across completions.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Per-user progress through the roadmap, stored as camelCase JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapProgress {
    #[serde(default)]
    pub user_id: String,
    #[serde(default = "first_milestone")]
    pub current_milestone: u32,
    #[serde(default)]
    pub milestones_completed: Vec<u32>,
    #[serde(default)]
    pub milestone_progress: BTreeMap<String, MilestoneProgress>,
}

fn first_milestone() -> u32 {
    1
}

impl RoadmapProgress {
    /// Fresh progress: on milestone 1, nothing completed.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            current_milestone: first_milestone(),
            milestones_completed: Vec::new(),
            milestone_progress: BTreeMap::new(),
        }
    }

    /// Parse a stored progress cell.
    ///
    /// Progress is written by this system, so it is parsed strictly: a
    /// malformed cell is an error, not something to recover from. An absent
    /// or blank cell means the user has not started yet.
    pub fn from_stored(user_id: &str, raw: Option<&str>) -> Result<Self, ProgressError> {
        let raw = match raw.map(str::trim) {
            None | Some("") => return Ok(Self::new(user_id)),
            Some(raw) => raw,
        };

        let mut progress: Self = serde_json::from_str(raw)?;
        progress.user_id = user_id.to_owned();
        progress.restore_invariants();
        Ok(progress)
    }

    /// Serialize for a full overwrite of the stored cell.
    pub fn to_stored(&self) -> Result<String, ProgressError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Record milestone `milestone` as completed at `now`.
    ///
    /// Rejects `0` without touching the state.
    pub fn complete(&mut self, milestone: u32, now: DateTime<Utc>) -> Result<(), ProgressError> {
        validate_milestone(milestone)?;

        if let Err(pos) = self.milestones_completed.binary_search(&milestone) {
            self.milestones_completed.insert(pos, milestone);
        }

        let next = milestone.saturating_add(1).min(MILESTONE_COUNT);
        self.current_milestone = self.current_milestone.max(next);

        let record = self
            .milestone_progress
            .entry(milestone.to_string())
            .or_default();
        record.completed = true;
        record.completed_date = Some(now);

        Ok(())
    }

    pub fn is_completed(&self, milestone: u32) -> bool {
        self.milestones_completed.binary_search(&milestone).is_ok()
    }

    /// Sort and de-duplicate the completed list, drop zeros, and clamp the
    /// current milestone into `1..=12`.
    fn restore_invariants(&mut self) {
        self.milestones_completed.retain(|&m| m > 0);
        self.milestones_completed.sort_unstable();
        self.milestones_completed.dedup();
        self.current_milestone = self.current_milestone.clamp(1, MILESTONE_COUNT);
    }
}

fn validate_milestone(milestone: u32) -> Result<u32, ProgressError> {
    if milestone == 0 {
        return Err(ProgressError::InvalidMilestone("0".to_owned()));
    }
    Ok(milestone)
}

/// Read a milestone number from request input.
///
/// Accepts a positive integer, an integral float, or a string holding a
/// positive integer. Everything else is rejected before any state changes.
pub fn parse_milestone_number(value: Option<&Value>) -> Result<u32, ProgressError> {
    match value {
        None | Some(Value::Null) => Err(ProgressError::MissingMilestone),
        Some(Value::Number(n)) => {
            let number = match (n.as_u64(), n.as_f64()) {
                (Some(int), _) => int,
                (None, Some(float)) if float.fract() == 0.0 && float > 0.0 => float as u64,
                _ => return Err(ProgressError::InvalidMilestone(n.to_string())),
            };
            let number = u32::try_from(number)
                .map_err(|_| ProgressError::InvalidMilestone(n.to_string()))?;
            validate_milestone(number)
        }
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err(ProgressError::MissingMilestone);
            }
            let number = trimmed
                .parse::<u32>()
                .map_err(|_| ProgressError::InvalidMilestone(format!("{s:?}")))?;
            validate_milestone(number)
        }
        Some(other) => Err(ProgressError::InvalidMilestone(other.to_string())),
    }
}
