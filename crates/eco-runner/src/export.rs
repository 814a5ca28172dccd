//! Population history file written at the end of a run, for external
//! plotting.

use crate::scheduler::RunSummary;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use eco_core::{PopulationHistory, PopulationSample};
use serde::Serialize;
use std::path::Path;
use tokio::fs;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct HistoryExport<'a> {
    pub exported_at: DateTime<Utc>,
    pub summary: &'a RunSummary,
    pub peak_rabbits: usize,
    pub peak_foxes: usize,
    pub samples: &'a [PopulationSample],
}

impl<'a> HistoryExport<'a> {
    pub fn new(summary: &'a RunSummary, history: &'a PopulationHistory) -> Self {
        Self {
            exported_at: Utc::now(),
            summary,
            peak_rabbits: history.peak_rabbits(),
            peak_foxes: history.peak_foxes(),
            samples: history.samples(),
        }
    }
}

pub async fn write_history(
    path: &Path,
    summary: &RunSummary,
    history: &PopulationHistory,
) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let export = HistoryExport::new(summary, history);
    let json = serde_json::to_vec_pretty(&export).context("Failed to serialize history")?;
    fs::write(path, &json)
        .await
        .with_context(|| format!("Failed to write history to {}", path.display()))?;

    info!(
        path = %path.display(),
        samples = history.len(),
        run_id = %summary.run_id,
        "History exported"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::StopReason;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_write_history() {
        let mut history = PopulationHistory::new();
        history.record(PopulationSample::new(1, 10, 3));
        history.record(PopulationSample::new(2, 14, 2));
        history.record(PopulationSample::new(3, 9, 4));

        let run_id = Uuid::new_v4();
        let summary = RunSummary {
            run_id,
            ticks: 3,
            reason: StopReason::TickLimit,
            final_population: PopulationSample::new(3, 9, 4),
            published_snapshots: 3,
            dropped_snapshots: 0,
        };

        let path = std::env::temp_dir()
            .join(format!("eco-runner-{run_id}"))
            .join("history.json");
        write_history(&path, &summary, &history).await.unwrap();

        let written: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written["summary"]["run_id"], run_id.to_string());
        assert_eq!(written["summary"]["reason"], "TickLimit");
        assert_eq!(written["peak_rabbits"], 14);
        assert_eq!(written["peak_foxes"], 4);
        assert_eq!(written["samples"].as_array().unwrap().len(), 3);
        assert_eq!(written["samples"][2]["tick"], 3);

        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }
}
