//! Bookkeeper - the recorder used by the harness.
//!
//! Tallies deaths by strain and cause, keeps the reproduction count and
//! lifespan of every dead cell, and stores one summary row per time unit.

use biofilm_core::{
    CellAgent, CellKind, Census, DeathCause, DeathEvent, Recorder, ResourceField,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Death counts for one strain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CauseCounts {
    pub age: u64,
    pub antibiotics: u64,
    pub food: u64,
}

impl CauseCounts {
    pub fn get(&self, cause: DeathCause) -> u64 {
        match cause {
            DeathCause::Age => self.age,
            DeathCause::Antibiotics => self.antibiotics,
            DeathCause::Food => self.food,
        }
    }

    fn bump(&mut self, cause: DeathCause) {
        match cause {
            DeathCause::Age => self.age += 1,
            DeathCause::Antibiotics => self.antibiotics += 1,
            DeathCause::Food => self.food += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.age + self.antibiotics + self.food
    }
}

/// Death table indexed by strain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathTable {
    pub good: CauseCounts,
    pub bad: CauseCounts,
}

impl DeathTable {
    pub fn of(&self, kind: CellKind) -> &CauseCounts {
        match kind {
            CellKind::Good => &self.good,
            CellKind::Bad => &self.bad,
        }
    }

    fn of_mut(&mut self, kind: CellKind) -> &mut CauseCounts {
        match kind {
            CellKind::Good => &mut self.good,
            CellKind::Bad => &mut self.bad,
        }
    }

    pub fn total(&self) -> u64 {
        self.good.total() + self.bad.total()
    }
}

/// One row per completed time unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSummary {
    pub step: u64,
    pub alive_good: usize,
    pub alive_bad: usize,
    pub dead_good: usize,
    pub dead_bad: usize,
    pub good_dead_due_to_antibiotics: usize,
    pub bad_dead_due_to_antibiotics: usize,

    /// Total antibiotic mass on the lattice
    pub antibiotics_concentration: f64,

    /// Total food mass on the lattice
    pub food_total: f64,
}

impl StepSummary {
    fn from_census(step: u64, census: &Census) -> Self {
        Self {
            step,
            alive_good: census.alive_good,
            alive_bad: census.alive_bad,
            dead_good: census.dead_good,
            dead_bad: census.dead_bad,
            good_dead_due_to_antibiotics: census.good_dead_due_to_antibiotics,
            bad_dead_due_to_antibiotics: census.bad_dead_due_to_antibiotics,
            antibiotics_concentration: census.antibiotics_total,
            food_total: census.food_total,
        }
    }

    pub fn alive(&self) -> usize {
        self.alive_good + self.alive_bad
    }
}

/// Aggregates deaths and per-step summaries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bookkeeper {
    /// Deaths by strain and cause
    pub death_counts: DeathTable,

    /// Reproductions performed before death, keyed by site
    pub reproduction_records: BTreeMap<usize, u32>,

    /// Recorded lifespans of good cells
    pub alive_times_good: Vec<f64>,

    /// Recorded lifespans of bad cells
    pub alive_times_bad: Vec<f64>,

    /// One entry per completed time unit
    pub step_summaries: Vec<StepSummary>,
}

impl Bookkeeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lifespans recorded for `kind`.
    pub fn alive_times(&self, kind: CellKind) -> &[f64] {
        match kind {
            CellKind::Good => &self.alive_times_good,
            CellKind::Bad => &self.alive_times_bad,
        }
    }

    /// Mean recorded lifespan for `kind`, if any cell of it has died.
    pub fn mean_alive_time(&self, kind: CellKind) -> Option<f64> {
        let times = self.alive_times(kind);
        if times.is_empty() {
            None
        } else {
            Some(times.iter().sum::<f64>() / times.len() as f64)
        }
    }

    /// Mean reproduction count over all dead cells.
    pub fn mean_reproductions(&self) -> Option<f64> {
        if self.reproduction_records.is_empty() {
            return None;
        }
        let total: u64 = self.reproduction_records.values().map(|&n| n as u64).sum();
        Some(total as f64 / self.reproduction_records.len() as f64)
    }

    pub fn total_deaths(&self) -> u64 {
        self.death_counts.total()
    }

    pub fn last_summary(&self) -> Option<&StepSummary> {
        self.step_summaries.last()
    }
}

impl Recorder for Bookkeeper {
    fn record_death(&mut self, event: &DeathEvent) {
        self.death_counts.of_mut(event.kind).bump(event.cause);
        self.reproduction_records
            .insert(event.index, event.reproduction_count);
        match event.kind {
            CellKind::Good => self.alive_times_good.push(event.alive_time),
            CellKind::Bad => self.alive_times_bad.push(event.alive_time),
        }
    }

    fn record_step_summary(&mut self, step: u64, cells: &[CellAgent], resources: &ResourceField) {
        let census = Census::new(cells, resources);
        self.step_summaries
            .push(StepSummary::from_census(step, &census));
    }
}
