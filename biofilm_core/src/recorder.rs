//! Recorder interface consumed by the stepper.
//!
//! The model never aggregates statistics itself; it reports each death and
//! each finished time unit to a [`Recorder`].

use crate::cell::{CellAgent, CellKind, CellState, DeathEvent};
use crate::resources::{Resource, ResourceField};
use serde::{Deserialize, Serialize};

/// Receives model events.
pub trait Recorder {
    /// Called exactly once per alive → dead transition.
    fn record_death(&mut self, event: &DeathEvent);

    /// Called exactly once per completed time unit, after diffusion and the
    /// coefficient refresh.
    fn record_step_summary(&mut self, step: u64, cells: &[CellAgent], resources: &ResourceField);
}

/// Discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRecorder;

impl Recorder for NullRecorder {
    fn record_death(&mut self, _event: &DeathEvent) {}

    fn record_step_summary(
        &mut self,
        _step: u64,
        _cells: &[CellAgent],
        _resources: &ResourceField,
    ) {
    }
}

/// Keeps every death event and a census per step in memory.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub deaths: Vec<DeathEvent>,
    pub steps: Vec<(u64, Census)>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Recorder for EventLog {
    fn record_death(&mut self, event: &DeathEvent) {
        self.deaths.push(event.clone());
    }

    fn record_step_summary(&mut self, step: u64, cells: &[CellAgent], resources: &ResourceField) {
        self.steps.push((step, Census::new(cells, resources)));
    }
}

/// Population and resource totals for one lattice state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Census {
    pub alive_good: usize,
    pub alive_bad: usize,
    pub dead_good: usize,
    pub dead_bad: usize,
    pub good_dead_due_to_antibiotics: usize,
    pub bad_dead_due_to_antibiotics: usize,
    pub antibiotics_total: f64,
    pub food_total: f64,
}

impl Census {
    /// Counts every site and sums both fields.
    pub fn new(cells: &[CellAgent], resources: &ResourceField) -> Self {
        let mut census = Self {
            antibiotics_total: resources.total(Resource::Antibiotics),
            food_total: resources.total(Resource::Food),
            ..Default::default()
        };

        for cell in cells {
            match cell.state() {
                CellState::Good => census.alive_good += 1,
                CellState::Bad => census.alive_bad += 1,
                CellState::DeadGood => census.dead_good += 1,
                CellState::DeadBad => census.dead_bad += 1,
                CellState::Empty => {}
            }
            if cell.antibiotic_death() {
                match cell.kind() {
                    Some(CellKind::Good) => census.good_dead_due_to_antibiotics += 1,
                    Some(CellKind::Bad) => census.bad_dead_due_to_antibiotics += 1,
                    None => {}
                }
            }
        }

        census
    }

    pub fn alive(&self) -> usize {
        self.alive_good + self.alive_bad
    }

    pub fn dead(&self) -> usize {
        self.dead_good + self.dead_bad
    }
}
