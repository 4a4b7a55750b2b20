//! Biofilm Core - stochastic lattice model of competing bacteria
//!
//! Good and bad bacteria live on a `size × size × height` lattice, one cell
//! per site. Each living cell runs on two exponential clocks (death and
//! division) and is further threatened by the local antibiotic level and by
//! running out of food. Food and antibiotics diffuse over the same lattice,
//! more slowly through occupied sites.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                       BiofilmWorld                         │
//! │                                                            │
//! │   1. agent pass (index order)      2. diffusion sub-steps  │
//! │  ┌──────────────────────────┐     ┌──────────────────────┐ │
//! │  │ CellAgent × N            │────►│ ResourceField        │ │
//! │  │  age / divide / poison / │◄────│  food, antibiotics,  │ │
//! │  │  starve                  │     │  D per site          │ │
//! │  └────────────┬─────────────┘     └──────────▲───────────┘ │
//! │               │  3. occupancy → coefficients │             │
//! │               └──────────────────────────────┘             │
//! │                         Lattice                            │
//! │           (shared 6-connected adjacency table)             │
//! └──────────────────────────┬─────────────────────────────────┘
//!                            │ 4. deaths, step summaries
//!                            ▼
//!                        Recorder
//! ```
//!
//! # Usage
//!
//! ```
//! use biofilm_core::{BiofilmWorld, CellKind, ColonyConfig, EventLog, Resource};
//!
//! let config = ColonyConfig::default().with_dimensions(5, 2).with_seed(7);
//! let mut world = BiofilmWorld::new(config).unwrap();
//! world.resources_mut().fill(Resource::Food, 5.0);
//! world.seed_cell(12, CellKind::Good).unwrap();
//!
//! let mut log = EventLog::new();
//! world.run(20, &mut log);
//! assert_eq!(log.steps.len(), 20);
//! ```

pub mod cell;
pub mod config;
mod error;
pub mod lattice;
pub mod recorder;
pub mod resources;
mod world;

pub use cell::{
    CellAgent, CellKind, CellState, DeathCause, DeathEvent, Lifecycle, LifecycleRules, AGENT_DT,
};
pub use config::{BirthVisibility, ColonyConfig};
pub use error::{ColonyError, Result};
pub use lattice::{Coord, Lattice};
pub use recorder::{Census, EventLog, NullRecorder, Recorder};
pub use resources::{Resource, ResourceField, ResourceSnapshot};
pub use world::BiofilmWorld;
