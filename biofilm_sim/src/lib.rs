//! Biofilm Scenario Harness
//!
//! Drives [`biofilm_core`] colonies through named scenarios, records every
//! death and per-step census in a [`Bookkeeper`], and verifies the model's
//! invariants after each time unit.
//!
//! # Core Principle: One Seed, Whole Run
//!
//! A run is reproducible from its master seed alone:
//! - **Dynamics**: the colony RNG is seeded from the master seed
//! - **Placement**: initial cell positions come from a separate derived stream
//! - **Sweeps**: `--seeds N` runs master seed, master seed + 1, ...
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   ScenarioRunner                     │
//! │                                                      │
//! │  ScenarioId ──► ScenarioSetup ──► BiofilmWorld       │
//! │       (config, fields, placement)     │ tick         │
//! │                                       ▼              │
//! │                 invariant checks ◄── Bookkeeper      │
//! └───────────────────────┬──────────────────────────────┘
//!                         │
//!              ScenarioResult / SimExport (JSON)
//! ```
//!
//! # Usage
//!
//! ```
//! use biofilm_sim::{ScenarioId, ScenarioRunner};
//!
//! let result = ScenarioRunner::new(42).with_steps(5).run(ScenarioId::Baseline);
//! assert!(result.passed);
//! assert_eq!(result.total_ticks, 5);
//! ```

pub mod bookkeeper;
mod context;
mod error;
pub mod exporter;
pub mod runner;
pub mod scenarios;

pub use bookkeeper::{Bookkeeper, CauseCounts, DeathTable, StepSummary};
pub use context::SeedContext;
pub use error::HarnessError;
pub use exporter::{SimExport, SimFrame};
pub use runner::{apply_overrides, load_overrides, ScenarioMetrics, ScenarioResult, ScenarioRunner};
pub use scenarios::{Dose, Placement, ScenarioId, ScenarioSetup};
