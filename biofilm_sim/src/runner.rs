//! Scenario runner - executes colony scenarios and checks the model's
//! invariants after every time unit.

use crate::bookkeeper::{Bookkeeper, DeathTable};
use crate::context::SeedContext;
use crate::error::HarnessError;
use crate::scenarios::ScenarioId;

use biofilm_core::{BiofilmWorld, CellKind, CellState, Census, ColonyConfig, Resource};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether every invariant held for the whole run
    pub passed: bool,

    /// Time units executed
    pub total_ticks: u64,

    /// Counts at the end of the run
    pub final_census: Census,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default)]
pub struct ScenarioMetrics {
    /// Deaths by strain and cause
    pub deaths: DeathTable,

    /// Empty-to-alive transitions
    pub births: u64,

    /// Largest living population seen after any step
    pub peak_alive: usize,

    /// Mean recorded lifespan of good cells
    pub mean_alive_time_good: Option<f64>,

    /// Mean recorded lifespan of bad cells
    pub mean_alive_time_bad: Option<f64>,

    /// Mean divisions per dead cell
    pub mean_reproductions: Option<f64>,
}

impl ScenarioMetrics {
    fn collect(book: &Bookkeeper, births: u64, peak_alive: usize) -> Self {
        Self {
            deaths: book.death_counts,
            births,
            peak_alive,
            mean_alive_time_good: book.mean_alive_time(CellKind::Good),
            mean_alive_time_bad: book.mean_alive_time(CellKind::Bad),
            mean_reproductions: book.mean_reproductions(),
        }
    }
}

/// Runs colony scenarios.
pub struct ScenarioRunner {
    /// Master seed
    seeds: SeedContext,

    /// Time units per run
    steps: u64,

    /// Config fields applied over each scenario's defaults
    overrides: Map<String, Value>,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seeds: SeedContext::new(seed),
            steps: 100,
            overrides: Map::new(),
        }
    }

    /// Sets the number of time units.
    pub fn with_steps(mut self, steps: u64) -> Self {
        self.steps = steps;
        self
    }

    /// Replaces config fields by name. Unknown fields fail the run.
    pub fn with_overrides(mut self, overrides: Map<String, Value>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seeds.master_seed()
    }

    /// Scenario config with overrides applied and the runner's seed set.
    pub fn config_for(&self, scenario: ScenarioId) -> Result<ColonyConfig, HarnessError> {
        let base = scenario.setup().config;
        let config = if self.overrides.is_empty() {
            base
        } else {
            apply_overrides(&base, &self.overrides)?
        };
        Ok(config.with_seed(self.seeds.colony_seed()))
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.run_recorded(scenario).0
    }

    /// Runs a scenario and also returns everything the bookkeeper saw.
    pub fn run_recorded(&self, scenario: ScenarioId) -> (ScenarioResult, Bookkeeper) {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed());

        let mut book = Bookkeeper::new();
        let mut world = match self.build(scenario) {
            Ok(world) => world,
            Err(e) => {
                warn!("Scenario {} could not start: {}", scenario.name(), e);
                let metrics = ScenarioMetrics::collect(&book, 0, 0);
                let reason = Some(format!("setup failed: {}", e));
                let result = self.finish(scenario, 0, Census::default(), metrics, reason);
                return (result, book);
            }
        };

        let dose = scenario.setup().dose.map(|d| (d.step(self.steps), d.amount));
        let mut births = 0u64;
        let mut peak_alive = world.census().alive();
        let mut failure = None;

        while world.tick_count() < self.steps {
            if let Some((at, amount)) = dose {
                if world.tick_count() == at {
                    debug!(step = at, amount, "antibiotic dose");
                    world.resources_mut().add_uniform(Resource::Antibiotics, amount);
                }
            }

            match check_tick(&mut world, &mut book) {
                Ok(born) => births += born,
                Err(reason) => {
                    warn!("Invariant violated at step {}: {}", world.tick_count(), reason);
                    failure = Some(reason);
                    break;
                }
            }
            peak_alive = peak_alive.max(world.census().alive());
        }

        let census = world.census();
        let metrics = ScenarioMetrics::collect(&book, births, peak_alive);
        let result = self.finish(scenario, world.tick_count(), census, metrics, failure);

        info!(
            scenario = scenario.name(),
            alive = census.alive(),
            dead = census.dead(),
            deaths = book.total_deaths(),
            "scenario finished"
        );
        (result, book)
    }

    fn build(&self, scenario: ScenarioId) -> Result<BiofilmWorld, HarnessError> {
        let config = self.config_for(scenario)?;
        scenario.setup().build(config, &self.seeds)
    }

    fn finish(
        &self,
        scenario: ScenarioId,
        total_ticks: u64,
        final_census: Census,
        metrics: ScenarioMetrics,
        failure_reason: Option<String>,
    ) -> ScenarioResult {
        ScenarioResult {
            scenario,
            seed: self.seed(),
            passed: failure_reason.is_none(),
            total_ticks,
            final_census,
            failure_reason,
            metrics,
        }
    }
}

/// Advances one time unit and verifies it. Returns the number of births.
fn check_tick(world: &mut BiofilmWorld, book: &mut Bookkeeper) -> Result<u64, String> {
    let before: Vec<CellState> = world.states().collect();
    let deaths_before = book.total_deaths();
    let summaries_before = book.step_summaries.len();

    world.tick(book);

    let mut transitions = 0u64;
    let mut births = 0u64;
    for (index, (old, new)) in before.iter().zip(world.states()).enumerate() {
        if old.is_dead() && *old != new {
            return Err(format!("dead site {} changed from {:?} to {:?}", index, old, new));
        }
        if new.is_dead() && !old.is_dead() {
            transitions += 1;
        }
        if *old == CellState::Empty && new.is_occupied() {
            births += 1;
        }
    }

    let recorded = book.total_deaths() - deaths_before;
    if recorded != transitions {
        return Err(format!(
            "{} deaths recorded for {} alive-to-dead transitions",
            recorded, transitions
        ));
    }

    if book.step_summaries.len() != summaries_before + 1 {
        return Err("step summary not recorded exactly once".to_string());
    }

    for resource in Resource::all() {
        let min = world.resources().min(resource);
        if min < 0.0 {
            return Err(format!("{} concentration fell to {}", resource.name(), min));
        }
    }

    Ok(births)
}

/// Overlays `overrides` on the serialized form of `base`.
pub fn apply_overrides(
    base: &ColonyConfig,
    overrides: &Map<String, Value>,
) -> Result<ColonyConfig, HarnessError> {
    let mut value = serde_json::to_value(base)?;
    if let Value::Object(fields) = &mut value {
        for (key, v) in overrides {
            if !fields.contains_key(key) {
                return Err(HarnessError::UnknownConfigField(key.clone()));
            }
            fields.insert(key.clone(), v.clone());
        }
    }
    Ok(serde_json::from_value(value)?)
}

/// Reads a JSON object of config overrides from `path`.
pub fn load_overrides(path: &str) -> Result<Map<String, Value>, HarnessError> {
    let text = std::fs::read_to_string(path)?;
    match serde_json::from_str(&text)? {
        Value::Object(map) => Ok(map),
        _ => Err(HarnessError::NotAnObject(path.to_string())),
    }
}
