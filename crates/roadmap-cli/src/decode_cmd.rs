//! `roadmap decode [FILE|-] [--trace]`: read a raw plan cell offline.

use anyhow::{Context, Result};
use serde::Serialize;

use roadmap_core::plan::{Diagnostics, RoadmapPlan, read_plan};

use crate::input::read_input;

/// What a raw cell reads as. Shared with `POST /api/decode`.
#[derive(Debug, Serialize)]
pub struct DecodeReport {
    /// The normalized plan, even when it has no milestones.
    pub plan: Option<RoadmapPlan>,
    /// Whether consumers would be shown this plan.
    pub usable: bool,
    pub diagnostics: Diagnostics,
}

impl DecodeReport {
    pub fn from_raw(raw: &str) -> Self {
        let reading = read_plan(Some(raw));
        let usable = reading.usable_plan().is_some();
        Self {
            plan: reading.plan,
            usable,
            diagnostics: reading.diagnostics,
        }
    }
}

pub fn run_decode(file: Option<&str>, trace: bool) -> Result<()> {
    let raw = read_input(file)?;
    println!("{}", render(&raw, trace)?);
    Ok(())
}

/// Pretty JSON: the plan alone, or the whole report with `trace`.
fn render(raw: &str, trace: bool) -> Result<String> {
    let report = DecodeReport::from_raw(raw);
    let text = if trace {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string_pretty(&report.plan)
    };
    text.context("failed to serialize decoded plan")
}
