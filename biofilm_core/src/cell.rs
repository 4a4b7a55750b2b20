//! Per-site lifecycle state machine.
//!
//! ```text
//!            seed / reproduction          age | antibiotics | food
//!   Empty ─────────────────────────► Good ───────────────────────► DeadGood
//!         ─────────────────────────► Bad  ───────────────────────► DeadBad
//! ```
//!
//! Each alive cell carries two countdown timers drawn from exponential
//! distributions whose means depend on the cell kind: the time until death
//! (mean `3/λ`) and the time until the next division (mean `1/λ`). Dead
//! states are absorbing.

use crate::config::ColonyConfig;
use crate::error::{ColonyError, Result};
use crate::lattice::Lattice;
use crate::recorder::Recorder;
use crate::resources::{Resource, ResourceField};
use rand::seq::IteratorRandom;
use rand::Rng;
use rand_distr::{Distribution, Exp};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Length of one agent step in simulation time.
pub const AGENT_DT: f64 = 1.0;

/// Bacterial strain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Good,
    Bad,
}

impl CellKind {
    pub fn name(&self) -> &'static str {
        match self {
            CellKind::Good => "good",
            CellKind::Bad => "bad",
        }
    }

    /// State of a living cell of this kind.
    pub fn alive_state(&self) -> CellState {
        match self {
            CellKind::Good => CellState::Good,
            CellKind::Bad => CellState::Bad,
        }
    }

    /// Terminal state of this kind.
    pub fn dead_state(&self) -> CellState {
        match self {
            CellKind::Good => CellState::DeadGood,
            CellKind::Bad => CellState::DeadBad,
        }
    }
}

impl std::fmt::Display for CellKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Observable state of a lattice site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellState {
    Empty,
    Good,
    Bad,
    DeadGood,
    DeadBad,
}

impl CellState {
    pub fn is_alive(&self) -> bool {
        matches!(self, CellState::Good | CellState::Bad)
    }

    pub fn is_dead(&self) -> bool {
        matches!(self, CellState::DeadGood | CellState::DeadBad)
    }

    /// Anything but `Empty`. Used for diffusion coefficient modulation.
    pub fn is_occupied(&self) -> bool {
        !matches!(self, CellState::Empty)
    }

    /// Strain of a living or dead cell.
    pub fn kind(&self) -> Option<CellKind> {
        match self {
            CellState::Good | CellState::DeadGood => Some(CellKind::Good),
            CellState::Bad | CellState::DeadBad => Some(CellKind::Bad),
            CellState::Empty => None,
        }
    }
}

/// Why a cell died.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Age,
    Antibiotics,
    Food,
}

impl DeathCause {
    pub fn all() -> [DeathCause; 3] {
        [DeathCause::Age, DeathCause::Antibiotics, DeathCause::Food]
    }

    pub fn name(&self) -> &'static str {
        match self {
            DeathCause::Age => "age",
            DeathCause::Antibiotics => "antibiotics",
            DeathCause::Food => "food",
        }
    }
}

impl std::fmt::Display for DeathCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A terminal transition, as reported to the recorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathEvent {
    pub index: usize,
    pub kind: CellKind,
    pub cause: DeathCause,
    pub reproduction_count: u32,

    /// Originally drawn lifespan; for antibiotic and food deaths, reduced by
    /// the death timer still remaining.
    pub alive_time: f64,
}

/// Timers of a living cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lifecycle {
    pub kind: CellKind,

    /// Time left until death of age
    pub death_timer: f64,

    /// Time left until the next division
    pub reproduction_timer: f64,

    /// Lifespan drawn at birth, kept for reporting
    pub alive_time: f64,
}

impl Lifecycle {
    /// Lifecycle with explicit timers (tests and hand-placed cells). The
    /// strain's λ comes from the colony's rules, not from the lifecycle.
    pub fn with_timers(kind: CellKind, death_timer: f64, reproduction_timer: f64) -> Self {
        Self {
            kind,
            death_timer,
            reproduction_timer,
            alive_time: death_timer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Empty,
    Alive(Lifecycle),
    Dead(CellKind),
}

/// One lattice site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellAgent {
    phase: Phase,
    reproduction_count: u32,
    antibiotic_death: bool,
}

impl Default for CellAgent {
    fn default() -> Self {
        Self::empty()
    }
}

impl CellAgent {
    /// An unoccupied site.
    pub fn empty() -> Self {
        Self {
            phase: Phase::Empty,
            reproduction_count: 0,
            antibiotic_death: false,
        }
    }

    /// A fresh living cell.
    pub fn alive(lifecycle: Lifecycle) -> Self {
        Self {
            phase: Phase::Alive(lifecycle),
            reproduction_count: 0,
            antibiotic_death: false,
        }
    }

    pub fn state(&self) -> CellState {
        match self.phase {
            Phase::Empty => CellState::Empty,
            Phase::Alive(life) => life.kind.alive_state(),
            Phase::Dead(kind) => kind.dead_state(),
        }
    }

    /// Strain of a living or dead cell.
    pub fn kind(&self) -> Option<CellKind> {
        match self.phase {
            Phase::Empty => None,
            Phase::Alive(life) => Some(life.kind),
            Phase::Dead(kind) => Some(kind),
        }
    }

    /// Timers, present only while alive.
    pub fn lifecycle(&self) -> Option<&Lifecycle> {
        match &self.phase {
            Phase::Alive(life) => Some(life),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.phase, Phase::Empty)
    }

    pub fn is_alive(&self) -> bool {
        matches!(self.phase, Phase::Alive(_))
    }

    pub fn is_dead(&self) -> bool {
        matches!(self.phase, Phase::Dead(_))
    }

    pub fn reproduction_count(&self) -> u32 {
        self.reproduction_count
    }

    /// True when the terminal death was caused by antibiotics.
    pub fn antibiotic_death(&self) -> bool {
        self.antibiotic_death
    }
}

/// Exponential clocks for one strain.
#[derive(Debug, Clone, Copy)]
struct Clocks {
    lifespan: Exp<f64>,
    interval: Exp<f64>,
}

impl Clocks {
    fn new(field: &'static str, rate: f64) -> Result<Self> {
        let lifespan = Exp::new(rate / 3.0)
            .map_err(|e| ColonyError::config(field, format!("{e:?}")))?;
        let interval =
            Exp::new(rate).map_err(|e| ColonyError::config(field, format!("{e:?}")))?;
        Ok(Self { lifespan, interval })
    }
}

/// Parameters of the per-cell state machine.
#[derive(Debug, Clone)]
pub struct LifecycleRules {
    good: Clocks,
    bad: Clocks,
    mutation_probability: f64,
    antibiotic_decay: f64,
    antibiotic_resistance: f64,
    antibiotic_kill_cost: f64,
    food_consumption: f64,
}

impl LifecycleRules {
    /// Builds the rules and their samplers. Expects a validated config.
    pub fn new(config: &ColonyConfig) -> Result<Self> {
        Ok(Self {
            good: Clocks::new("good_rate", config.good_rate)?,
            bad: Clocks::new("bad_rate", config.bad_rate)?,
            mutation_probability: config.mutation_probability,
            antibiotic_decay: config.antibiotic_decay,
            antibiotic_resistance: config.antibiotic_resistance,
            antibiotic_kill_cost: config.antibiotic_kill_cost,
            food_consumption: config.food_consumption,
        })
    }

    fn clocks(&self, kind: CellKind) -> &Clocks {
        match kind {
            CellKind::Good => &self.good,
            CellKind::Bad => &self.bad,
        }
    }

    /// Draws fresh timers for a newly seeded cell.
    pub fn spawn<R: Rng + ?Sized>(&self, kind: CellKind, rng: &mut R) -> Lifecycle {
        let clocks = self.clocks(kind);
        let death_timer = clocks.lifespan.sample(rng);
        let reproduction_timer = clocks.interval.sample(rng);
        Lifecycle {
            kind,
            death_timer,
            reproduction_timer,
            alive_time: death_timer,
        }
    }

    /// Advances the cell at `index` by one time unit.
    ///
    /// Runs age/reproduction, then antibiotics, then food; the first stage
    /// that kills the cell ends the step. Children are written straight into
    /// `cells` and their indices pushed to `births`.
    #[allow(clippy::too_many_arguments)]
    pub fn step<R: Rng + ?Sized>(
        &self,
        index: usize,
        cells: &mut [CellAgent],
        lattice: &Lattice,
        resources: &mut ResourceField,
        rng: &mut R,
        recorder: &mut dyn Recorder,
        births: &mut Vec<usize>,
    ) {
        let Phase::Alive(mut life) = cells[index].phase else {
            return;
        };

        // Age and reproduction
        life.death_timer -= AGENT_DT;
        if life.reproduction_timer >= 0.0 {
            life.reproduction_timer -= AGENT_DT;
        }

        if life.reproduction_timer <= 0.0 {
            let dies_first = life.death_timer <= 0.0 && life.death_timer < life.reproduction_timer;
            if !dies_first {
                self.reproduce(index, &mut life, cells, lattice, rng, births);
            }
        }

        if life.death_timer <= 0.0 {
            let alive_time = life.alive_time;
            kill(index, &mut cells[index], life.kind, DeathCause::Age, alive_time, recorder);
            return;
        }

        // Antibiotics
        let local = (resources.get(Resource::Antibiotics, index) - self.antibiotic_decay * AGENT_DT)
            .max(0.0);
        resources.set(Resource::Antibiotics, index, local);

        let kill_probability = match life.kind {
            CellKind::Bad => local,
            CellKind::Good => local * self.antibiotic_resistance,
        };
        if rng.gen::<f64>() < kill_probability {
            resources.set(
                Resource::Antibiotics,
                index,
                local - self.antibiotic_kill_cost,
            );
            let alive_time = life.alive_time - life.death_timer;
            kill(
                index,
                &mut cells[index],
                life.kind,
                DeathCause::Antibiotics,
                alive_time,
                recorder,
            );
            return;
        }

        // Food
        let food = resources.get(Resource::Food, index) - self.food_consumption * AGENT_DT;
        resources.set(Resource::Food, index, food);
        if food <= 0.0 {
            let alive_time = life.alive_time - life.death_timer;
            kill(index, &mut cells[index], life.kind, DeathCause::Food, alive_time, recorder);
            return;
        }

        cells[index].phase = Phase::Alive(life);
    }

    /// Divides while the reproduction timer is due and an empty neighbor
    /// exists. Each division pushes the parent's timer forward by a fresh
    /// interval, so a deeply negative timer yields several children.
    fn reproduce<R: Rng + ?Sized>(
        &self,
        index: usize,
        life: &mut Lifecycle,
        cells: &mut [CellAgent],
        lattice: &Lattice,
        rng: &mut R,
        births: &mut Vec<usize>,
    ) {
        while life.reproduction_timer <= 0.0 {
            let Some(&target) = lattice
                .neighbors(index)
                .iter()
                .filter(|&&k| cells[k].is_empty())
                .choose(rng)
            else {
                break;
            };

            let mutates =
                life.kind == CellKind::Good && rng.gen::<f64>() < self.mutation_probability;
            let kind = if mutates { CellKind::Bad } else { life.kind };

            let clocks = self.clocks(kind);
            let offset = life.reproduction_timer;
            let death_timer = offset + clocks.lifespan.sample(rng);
            let reproduction_timer = offset + clocks.interval.sample(rng);
            cells[target] = CellAgent::alive(Lifecycle {
                kind,
                death_timer,
                reproduction_timer,
                alive_time: death_timer,
            });
            births.push(target);

            cells[index].reproduction_count += 1;
            life.reproduction_timer += self.clocks(life.kind).interval.sample(rng);

            trace!(parent = index, child = target, %kind, "division");
        }
    }
}

fn kill(
    index: usize,
    cell: &mut CellAgent,
    kind: CellKind,
    cause: DeathCause,
    alive_time: f64,
    recorder: &mut dyn Recorder,
) {
    cell.phase = Phase::Dead(kind);
    cell.antibiotic_death = cause == DeathCause::Antibiotics;

    debug!(index, %kind, %cause, reproductions = cell.reproduction_count, "cell died");
    recorder.record_death(&DeathEvent {
        index,
        kind,
        cause,
        reproduction_count: cell.reproduction_count,
        alive_time,
    });
}
