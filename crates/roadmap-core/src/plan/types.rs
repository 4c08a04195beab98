//! Canonical roadmap plan types.
//!
//! These are the shapes handed to consumers after normalization. Every
//! field that upstream data may omit is explicit here: either an `Option`
//! or a defaulted collection.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A user's roadmap: a goal statement plus an ordered milestone list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RoadmapPlan {
    /// The user's stated goal. Empty when upstream data had none.
    #[serde(default)]
    pub northstar: String,
    /// Milestones in order; index `i` is "Milestone i+1".
    ///
    /// `None` when no milestone data could be recovered, which consumers
    /// treat as "no plan".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_plan: Option<Vec<MilestoneEntry>>,
}

impl RoadmapPlan {
    /// Whether at least one milestone was recovered.
    pub fn has_milestones(&self) -> bool {
        !self.milestones().is_empty()
    }

    /// The milestone list, empty when none was recovered.
    pub fn milestones(&self) -> &[MilestoneEntry] {
        self.monthly_plan.as_deref().unwrap_or_default()
    }

    /// Look up a milestone by its 1-based number.
    pub fn milestone(&self, number: u32) -> Option<&MilestoneEntry> {
        let index = usize::try_from(number.checked_sub(1)?).ok()?;
        self.milestones().get(index)
    }
}

/// One stage of the plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MilestoneEntry {
    #[serde(default)]
    pub focus: String,
    #[serde(default)]
    pub goal: String,
    /// The legacy `milestone` field, kept when the input carried it so
    /// older readers still find it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<String>,
    #[serde(default)]
    pub weekly_practices: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_rec: Option<CourseRec>,
}

/// A course recommendation attached to a milestone.
///
/// Fields other than `title`, `url` and `benefit` (and those three when they
/// are not strings) are carried through unchanged in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CourseRec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefit: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CourseRec {
    /// Build from an object-shaped value, leaving its contents untouched.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let mut extra = object.clone();
        let mut take = |key: &str| match extra.get(key) {
            Some(Value::String(s)) => {
                let s = s.clone();
                extra.remove(key);
                Some(s)
            }
            _ => None,
        };
        let title = take("title");
        let url = take("url");
        let benefit = take("benefit");
        Self {
            title,
            url,
            benefit,
            extra,
        }
    }
}
