//! BiofilmWorld - owns the lattice, the cells and the resource fields and
//! advances them one time unit at a time.

use crate::cell::{CellAgent, CellKind, CellState, Lifecycle, LifecycleRules};
use crate::config::{BirthVisibility, ColonyConfig};
use crate::error::{ColonyError, Result};
use crate::lattice::Lattice;
use crate::recorder::{Census, Recorder};
use crate::resources::ResourceField;
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

/// The simulation stepper.
pub struct BiofilmWorld {
    /// Configuration
    config: ColonyConfig,

    /// Shared topology
    lattice: Lattice,

    /// One agent per site
    cells: Vec<CellAgent>,

    /// Food and antibiotics
    resources: ResourceField,

    /// Lifecycle parameters and samplers
    rules: LifecycleRules,

    /// Every stochastic draw goes through this
    rng: ChaCha8Rng,

    /// Sites that received a child during the current pass
    born_this_pass: Vec<bool>,

    /// Scratch list of births from one agent step
    births: Vec<usize>,

    /// Completed time units
    tick_count: u64,
}

impl BiofilmWorld {
    /// Validates `config` and builds an empty world with zeroed fields.
    pub fn new(config: ColonyConfig) -> Result<Self> {
        config.validate()?;

        let lattice = Lattice::new(config.size, config.height);
        let resources = ResourceField::new(lattice.len(), &config);
        let rules = LifecycleRules::new(&config)?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);

        info!(
            size = config.size,
            height = config.height,
            sites = lattice.len(),
            seed = config.seed,
            "colony created"
        );

        Ok(Self {
            cells: vec![CellAgent::empty(); lattice.len()],
            born_this_pass: vec![false; lattice.len()],
            births: Vec::new(),
            config,
            lattice,
            resources,
            rules,
            rng,
            tick_count: 0,
        })
    }

    pub fn config(&self) -> &ColonyConfig {
        &self.config
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn cells(&self) -> &[CellAgent] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Option<&CellAgent> {
        self.cells.get(index)
    }

    pub fn resources(&self) -> &ResourceField {
        &self.resources
    }

    /// Mutable access for initial conditions and dose injection between
    /// time units.
    pub fn resources_mut(&mut self) -> &mut ResourceField {
        &mut self.resources
    }

    /// Completed time units.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Current state of every site.
    pub fn states(&self) -> impl Iterator<Item = CellState> + '_ {
        self.cells.iter().map(|c| c.state())
    }

    /// Counts over the current lattice and fields.
    pub fn census(&self) -> Census {
        Census::new(&self.cells, &self.resources)
    }

    /// Places a new cell of `kind` with freshly drawn timers.
    pub fn seed_cell(&mut self, index: usize, kind: CellKind) -> Result<()> {
        self.check_empty(index)?;
        let life = self.rules.spawn(kind, &mut self.rng);
        self.place(index, life);
        Ok(())
    }

    /// Places a cell with the given timers. Every timer must be finite and
    /// positive.
    pub fn seed_lifecycle(&mut self, index: usize, lifecycle: Lifecycle) -> Result<()> {
        self.check_empty(index)?;
        let timers = [
            ("death_timer", lifecycle.death_timer),
            ("reproduction_timer", lifecycle.reproduction_timer),
            ("alive_time", lifecycle.alive_time),
        ];
        for (timer, value) in timers {
            if !(value.is_finite() && value > 0.0) {
                return Err(ColonyError::InvalidTimer { index, timer, value });
            }
        }
        self.place(index, lifecycle);
        Ok(())
    }

    /// Places `count` cells of `kind` on empty sites chosen uniformly with
    /// `rng`. Returns the chosen indices.
    pub fn seed_random<R: rand::Rng + ?Sized>(
        &mut self,
        kind: CellKind,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<usize>> {
        let empty: Vec<usize> = (0..self.cells.len())
            .filter(|&i| self.cells[i].is_empty())
            .collect();
        if count > empty.len() {
            return Err(ColonyError::NotEnoughEmptySites {
                requested: count,
                available: empty.len(),
            });
        }

        let chosen: Vec<usize> = sample(rng, empty.len(), count)
            .into_iter()
            .map(|i| empty[i])
            .collect();
        for &index in &chosen {
            let life = self.rules.spawn(kind, &mut self.rng);
            self.place(index, life);
        }
        Ok(chosen)
    }

    fn check_empty(&self, index: usize) -> Result<()> {
        match self.cells.get(index) {
            None => Err(ColonyError::out_of_range(index, self.cells.len())),
            Some(cell) if !cell.is_empty() => Err(ColonyError::SiteOccupied(index)),
            Some(_) => Ok(()),
        }
    }

    fn place(&mut self, index: usize, lifecycle: Lifecycle) {
        self.cells[index] = CellAgent::alive(lifecycle);
        self.resources.update_site(index, self.cells[index].state());
    }

    /// Advances the world by one time unit.
    ///
    /// 1. Steps every agent in increasing index order. Children land in the
    ///    shared array immediately; under [`BirthVisibility::SamePass`] a
    ///    child at a higher index is stepped later in this same pass.
    /// 2. Runs the configured diffusion sub-steps.
    /// 3. Refreshes diffusion coefficients from occupancy.
    /// 4. Reports the finished step to `recorder`.
    pub fn tick(&mut self, recorder: &mut dyn Recorder) {
        let skip_newborns = self.config.birth_visibility == BirthVisibility::NextPass;
        self.born_this_pass.fill(false);

        for index in 0..self.cells.len() {
            if skip_newborns && self.born_this_pass[index] {
                continue;
            }

            self.births.clear();
            self.rules.step(
                index,
                &mut self.cells,
                &self.lattice,
                &mut self.resources,
                &mut self.rng,
                recorder,
                &mut self.births,
            );
            for &child in &self.births {
                self.born_this_pass[child] = true;
            }
        }

        self.resources.diffuse(&self.lattice);

        let occupancy = self.cells.iter().map(|c| c.state());
        self.resources.update_coefficients(occupancy);

        self.tick_count += 1;
        recorder.record_step_summary(self.tick_count, &self.cells, &self.resources);

        if self.tick_count % 10 == 0 {
            let census = self.census();
            debug!(
                step = self.tick_count,
                good = census.alive_good,
                bad = census.alive_bad,
                dead = census.dead(),
                antibiotics = census.antibiotics_total,
                "colony progress"
            );
        }
    }

    /// Runs `steps` time units.
    pub fn run(&mut self, steps: u64, recorder: &mut dyn Recorder) {
        for _ in 0..steps {
            self.tick(recorder);
        }
    }
}
