//! Roadmap plans: tolerant decoding of raw cells and normalization into the
//! canonical [`RoadmapPlan`] shape.

pub mod decode;
pub mod diagnostics;
pub mod entities;
pub mod normalize;
pub mod types;

pub use decode::{decode, decode_traced, decode_value, decode_value_traced};
pub use diagnostics::{AttemptOutcome, DecodeStrategy, Diagnostics, RecoveryEvent};
pub use normalize::{month_number, normalize, normalize_traced};
pub use types::{CourseRec, MilestoneEntry, RoadmapPlan};

/// Result of reading one raw plan cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanReading {
    /// The normalized plan, `None` when the cell held nothing recoverable.
    pub plan: Option<RoadmapPlan>,
    pub diagnostics: Diagnostics,
}

impl PlanReading {
    /// The plan when it carries milestone data; otherwise consumers have no
    /// plan to show.
    pub fn usable_plan(&self) -> Option<&RoadmapPlan> {
        self.plan.as_ref().filter(|plan| plan.has_milestones())
    }

    pub fn into_usable_plan(self) -> Option<RoadmapPlan> {
        self.plan.filter(RoadmapPlan::has_milestones)
    }
}

/// Decode and normalize a raw plan cell in one go.
pub fn read_plan(raw: Option<&str>) -> PlanReading {
    let mut diagnostics = Diagnostics::new();
    let decoded = decode_traced(raw, &mut diagnostics);
    let plan = normalize_traced(decoded.as_ref(), &mut diagnostics);
    PlanReading { plan, diagnostics }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_plan_pipeline() {
        let reading = read_plan(Some(
            r#"export: {"northstar":"x","monthly_plan":{"1":{"focus":"A"}}}"#,
        ));
        let plan = reading.usable_plan().expect("plan should be usable");
        assert_eq!(plan.milestones()[0].focus, "A");
        assert_eq!(
            reading.diagnostics.succeeded_strategy(),
            Some(DecodeStrategy::Substring)
        );
    }

    #[test]
    fn plan_without_milestones_is_not_usable() {
        let reading = read_plan(Some(r#"{"northstar":"x"}"#));
        assert!(reading.plan.is_some());
        assert!(reading.usable_plan().is_none());
        assert!(reading.into_usable_plan().is_none());
    }

    #[test]
    fn absent_cell() {
        let reading = read_plan(None);
        assert_eq!(reading, PlanReading::default());
    }
}
