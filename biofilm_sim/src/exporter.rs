//! JSON exporter for offline analysis and plotting.
//!
//! Exports one frame per time unit plus the final death table.

use crate::bookkeeper::{Bookkeeper, DeathTable, StepSummary};
use crate::error::HarnessError;
use crate::runner::ScenarioResult;
use biofilm_core::{ColonyConfig, AGENT_DT};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

/// A single frame of simulation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimFrame {
    /// Simulated time at the end of the step
    pub time: f64,

    /// Population and resource totals after this step
    #[serde(flatten)]
    pub summary: StepSummary,
}

impl SimFrame {
    pub fn new(summary: StepSummary) -> Self {
        Self {
            time: summary.step as f64 * AGENT_DT,
            summary,
        }
    }
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Colony parameters the run used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ColonyConfig>,

    /// All frames
    pub frames: Vec<SimFrame>,

    /// Final death counts by strain and cause
    pub deaths: DeathTable,

    /// Reproductions per dead site
    pub reproduction_records: Vec<(usize, u32)>,

    /// Final results
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            config: None,
            frames: Vec::new(),
            deaths: DeathTable::default(),
            reproduction_records: Vec::new(),
            passed: false,
            failure_reason: None,
        }
    }

    /// Builds an export from a finished run.
    pub fn from_run(
        result: &ScenarioResult,
        book: &Bookkeeper,
        config: Option<ColonyConfig>,
    ) -> Self {
        let mut export = Self::new(result.scenario.name(), result.seed);
        export.config = config;
        for summary in &book.step_summaries {
            export.add_frame(SimFrame::new(summary.clone()));
        }
        export.reproduction_records = book
            .reproduction_records
            .iter()
            .map(|(&index, &count)| (index, count))
            .collect();
        export.finalize(result.passed, book.death_counts, result.failure_reason.clone());
        export
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, deaths: DeathTable, failure_reason: Option<String>) {
        self.passed = passed;
        self.deaths = deaths;
        self.failure_reason = failure_reason;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> Result<(), HarnessError> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ScenarioRunner;
    use crate::scenarios::ScenarioId;

    #[test]
    fn test_export_from_run() {
        let runner = ScenarioRunner::new(4).with_steps(6);
        let (result, book) = runner.run_recorded(ScenarioId::Baseline);
        let config = runner.config_for(ScenarioId::Baseline).ok();

        let export = SimExport::from_run(&result, &book, config);

        assert_eq!(export.scenario, "baseline");
        assert_eq!(export.frames.len(), 6);
        assert_eq!(export.frames[0].summary.step, 1);
        assert_eq!(export.frames[5].time, 6.0 * biofilm_core::AGENT_DT);
        assert_eq!(export.deaths, book.death_counts);
        assert_eq!(export.config.as_ref().map(|c| c.size), Some(12));
    }

    #[test]
    fn test_frame_flattens_summary() {
        let mut export = SimExport::new("famine", 1);
        let (_, book) = ScenarioRunner::new(1)
            .with_steps(1)
            .run_recorded(ScenarioId::Famine);
        export.add_frame(SimFrame::new(book.step_summaries[0].clone()));

        let json = serde_json::to_value(&export).unwrap();
        let frame = &json["frames"][0];
        assert_eq!(frame["step"], 1);
        assert!(frame.get("alive_good").is_some());
        assert!(frame.get("antibiotics_concentration").is_some());
        assert!(json.get("failure_reason").is_none());
        assert!(json.get("config").is_none());
    }

    #[test]
    fn test_write_to_file() {
        let path = std::env::temp_dir().join("biofilm_sim_export_test.json");
        let path = path.to_string_lossy().to_string();
        let export = SimExport::new("baseline", 9);

        export.write_to_file(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let back: SimExport = serde_json::from_str(&text).unwrap();
        assert_eq!(back.seed, 9);
        std::fs::remove_file(&path).ok();
    }
}
