//! Store-backed CLI handlers.
//!
//! Implements:
//! - `roadmap plan set <user-id> <file|->` -- store a raw plan cell
//! - `roadmap show <user-id>`              -- print the combined view
//! - `roadmap complete <user-id> <n>`      -- mark milestone `n` complete

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;

use roadmap_core::progress::parse_milestone_number;
use roadmap_core::service;
use roadmap_core::store::RoadmapStore;

use crate::PlanCommands;
use crate::input::read_input;

/// Dispatch a `PlanCommands` variant to the appropriate handler.
pub async fn run_plan_command(command: PlanCommands, store: &dyn RoadmapStore) -> Result<()> {
    match command {
        PlanCommands::Set { user_id, file } => cmd_plan_set(store, &user_id, &file).await,
    }
}

async fn cmd_plan_set(store: &dyn RoadmapStore, user_id: &str, file: &str) -> Result<()> {
    let raw = read_input(Some(file))?;
    let reading = service::store_plan(store, user_id, &raw)
        .await
        .with_context(|| format!("failed to store plan for {user_id}"))?;

    println!("Plan stored for {user_id}.");
    match reading.usable_plan() {
        Some(plan) => println!("  milestones: {}", plan.milestones().len()),
        None => println!("  warning: the stored text does not read as a plan with milestones"),
    }
    if reading.diagnostics.has_data_loss() {
        println!(
            "  warning: {} entries would be dropped when reading",
            reading.diagnostics.dropped_entries().len()
        );
    }
    Ok(())
}

pub async fn run_show(store: &dyn RoadmapStore, user_id: &str) -> Result<()> {
    let view = service::load_roadmap(store, user_id)
        .await
        .with_context(|| format!("failed to load roadmap for {user_id}"))?;
    let text = serde_json::to_string_pretty(&view).context("failed to serialize roadmap")?;
    println!("{text}");
    Ok(())
}

pub async fn run_complete(store: &dyn RoadmapStore, user_id: &str, milestone: &str) -> Result<()> {
    let number = parse_milestone_number(Some(&Value::String(milestone.to_owned())))?;
    let progress = service::complete_milestone(store, user_id, number, Utc::now())
        .await
        .with_context(|| format!("failed to complete milestone {number} for {user_id}"))?;

    println!(
        "Milestone {number} complete for {user_id}. Current milestone: {}.",
        progress.current_milestone
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadmap_core::store::MemoryRoadmapStore;

    #[tokio::test]
    async fn complete_rejects_bad_numbers_before_touching_store() {
        let store = MemoryRoadmapStore::new();
        assert!(run_complete(&store, "u1", "0").await.is_err());
        assert!(run_complete(&store, "u1", "two").await.is_err());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn complete_then_show() {
        let store = MemoryRoadmapStore::new();
        run_complete(&store, "u1", "3").await.unwrap();
        run_show(&store, "u1").await.unwrap();

        let row = store.fetch("u1").await.unwrap().unwrap();
        let progress: Value = serde_json::from_str(row.progress_raw.as_deref().unwrap()).unwrap();
        assert_eq!(progress["currentMilestone"], 4);
        assert_eq!(progress["milestonesCompleted"], serde_json::json!([3]));
    }

    #[tokio::test]
    async fn show_unknown_user_fails() {
        let store = MemoryRoadmapStore::new();
        let err = run_show(&store, "ghost").await.unwrap_err();
        assert!(format!("{err:#}").contains("no roadmap found"));
    }

    #[tokio::test]
    async fn plan_set_reads_file() {
        let store = MemoryRoadmapStore::new();
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), r#"{"northstar":"x","monthly_plan":[{"focus":"A"}]}"#).unwrap();

        let command = PlanCommands::Set {
            user_id: "u1".to_owned(),
            file: tmp.path().to_string_lossy().into_owned(),
        };
        run_plan_command(command, &store).await.unwrap();

        let row = store.fetch("u1").await.unwrap().unwrap();
        assert!(row.plan_raw.unwrap().contains("northstar"));
    }
}
