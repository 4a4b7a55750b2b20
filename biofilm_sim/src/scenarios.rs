//! Colony scenarios: named starting conditions for the runner.

use crate::context::SeedContext;
use crate::error::HarnessError;
use biofilm_core::{BiofilmWorld, CellKind, ColonyConfig, ColonyError, Resource};
use rand::seq::index::sample;
use rand::Rng;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioId {
    /// Mixed colony on the substrate with steady food
    Baseline,

    /// Baseline colony hit by an antibiotic dose a quarter of the way in
    AntibioticPulse,

    /// Mixed colony with barely any food
    Famine,

    /// Most of the lattice occupied from the start
    DenseBiofilm,

    /// Good-only colony with a high mutation probability
    MutationPressure,

    /// Narrow, tall lattice grown from one substrate site
    TallColumn,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Baseline,
            ScenarioId::AntibioticPulse,
            ScenarioId::Famine,
            ScenarioId::DenseBiofilm,
            ScenarioId::MutationPressure,
            ScenarioId::TallColumn,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Baseline => "baseline",
            ScenarioId::AntibioticPulse => "antibiotic_pulse",
            ScenarioId::Famine => "famine",
            ScenarioId::DenseBiofilm => "dense_biofilm",
            ScenarioId::MutationPressure => "mutation_pressure",
            ScenarioId::TallColumn => "tall_column",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Baseline => "10 good + 10 bad cells on a 12x12x4 substrate, food 5.0",
            ScenarioId::AntibioticPulse => {
                "baseline colony, uniform antibiotic dose of 0.5 at 25% of the run"
            }
            ScenarioId::Famine => "baseline colony with food 0.35 per site",
            ScenarioId::DenseBiofilm => "60% of an 8x8x4 lattice seeded, food 10.0",
            ScenarioId::MutationPressure => "20 good cells, mutation probability 0.2",
            ScenarioId::TallColumn => "one good and one bad cell at the base of a 4x4x16 column",
        }
    }

    /// Returns the starting conditions for this scenario.
    pub fn setup(&self) -> ScenarioSetup {
        let base = ScenarioSetup {
            config: ColonyConfig::default().with_dimensions(12, 4),
            food: 5.0,
            antibiotics: 0.0,
            good: 10,
            bad: 10,
            placement: Placement::Substrate,
            dose: None,
        };

        match self {
            ScenarioId::Baseline => base,
            ScenarioId::AntibioticPulse => ScenarioSetup {
                dose: Some(Dose {
                    at_fraction: 0.25,
                    amount: 0.5,
                }),
                ..base
            },
            ScenarioId::Famine => ScenarioSetup { food: 0.35, ..base },
            ScenarioId::DenseBiofilm => ScenarioSetup {
                config: ColonyConfig::default().with_dimensions(8, 4),
                food: 10.0,
                // 60% of 256 sites
                good: 77,
                bad: 77,
                placement: Placement::Anywhere,
                ..base
            },
            ScenarioId::MutationPressure => ScenarioSetup {
                config: ColonyConfig {
                    mutation_probability: 0.2,
                    ..base.config.clone()
                },
                good: 20,
                bad: 0,
                ..base
            },
            ScenarioId::TallColumn => ScenarioSetup {
                config: ColonyConfig::default().with_dimensions(4, 16),
                good: 1,
                bad: 1,
                placement: Placement::SubstrateCenter,
                ..base
            },
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "baseline" => Ok(ScenarioId::Baseline),
            "antibiotic_pulse" | "antibioticpulse" | "pulse" => Ok(ScenarioId::AntibioticPulse),
            "famine" => Ok(ScenarioId::Famine),
            "dense_biofilm" | "densebiofilm" | "dense" => Ok(ScenarioId::DenseBiofilm),
            "mutation_pressure" | "mutationpressure" | "mutation" => {
                Ok(ScenarioId::MutationPressure)
            }
            "tall_column" | "tallcolumn" | "column" => Ok(ScenarioId::TallColumn),
            _ => Err(HarnessError::UnknownScenario(s.to_string())),
        }
    }
}

/// Where the initial cells go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Random sites on layer 0
    Substrate,

    /// Random empty sites anywhere on the lattice
    Anywhere,

    /// The center of layer 0 and its in-layer neighbors
    SubstrateCenter,
}

/// A uniform antibiotic injection during the run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dose {
    /// Point in the run, as a fraction of the step count
    pub at_fraction: f64,

    /// Amount added to every site
    pub amount: f64,
}

impl Dose {
    /// Completed step after which the dose is applied.
    pub fn step(&self, total_steps: u64) -> u64 {
        (total_steps as f64 * self.at_fraction).floor() as u64
    }
}

/// Starting conditions of a scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioSetup {
    /// Colony parameters; the runner overwrites the seed
    pub config: ColonyConfig,

    /// Initial food on every site
    pub food: f64,

    /// Initial antibiotics on every site
    pub antibiotics: f64,

    /// Good cells to seed
    pub good: usize,

    /// Bad cells to seed
    pub bad: usize,

    pub placement: Placement,

    pub dose: Option<Dose>,
}

impl ScenarioSetup {
    /// Builds the world: fills the fields, then places cells using the
    /// placement stream of `seeds`.
    pub fn build(
        &self,
        config: ColonyConfig,
        seeds: &SeedContext,
    ) -> Result<BiofilmWorld, HarnessError> {
        let mut world = BiofilmWorld::new(config)?;
        world.resources_mut().fill(Resource::Food, self.food);
        world.resources_mut().fill(Resource::Antibiotics, self.antibiotics);

        let mut rng = seeds.placement_rng();
        match self.placement {
            Placement::Anywhere => {
                world.seed_random(CellKind::Good, self.good, &mut rng)?;
                world.seed_random(CellKind::Bad, self.bad, &mut rng)?;
            }
            Placement::Substrate => {
                let layer_len = world.lattice().layer_len();
                let sites = pick_sites(&mut rng, layer_len, self.good + self.bad, &world)?;
                self.place_split(&mut world, &sites)?;
            }
            Placement::SubstrateCenter => {
                let lattice = world.lattice();
                let center = lattice
                    .layer_center(0)
                    .ok_or(ColonyError::out_of_range(0, lattice.len()))?;
                let mut sites = vec![center];
                sites.extend(
                    lattice
                        .neighbors(center)
                        .iter()
                        .copied()
                        .filter(|&k| k < lattice.layer_len()),
                );
                let wanted = self.good + self.bad;
                if wanted > sites.len() {
                    return Err(ColonyError::NotEnoughEmptySites {
                        requested: wanted,
                        available: sites.len(),
                    }
                    .into());
                }
                sites.truncate(wanted);
                self.place_split(&mut world, &sites)?;
            }
        }

        Ok(world)
    }

    /// Good cells take the first `good` sites, bad cells the rest.
    fn place_split(&self, world: &mut BiofilmWorld, sites: &[usize]) -> Result<(), HarnessError> {
        for (n, &index) in sites.iter().enumerate() {
            let kind = if n < self.good {
                CellKind::Good
            } else {
                CellKind::Bad
            };
            world.seed_cell(index, kind)?;
        }
        Ok(())
    }
}

/// Chooses `count` distinct empty sites among the first `range` indices.
fn pick_sites<R: Rng + ?Sized>(
    rng: &mut R,
    range: usize,
    count: usize,
    world: &BiofilmWorld,
) -> Result<Vec<usize>, HarnessError> {
    let empty: Vec<usize> = (0..range)
        .filter(|&i| world.cells()[i].is_empty())
        .collect();
    if count > empty.len() {
        return Err(ColonyError::NotEnoughEmptySites {
            requested: count,
            available: empty.len(),
        }
        .into());
    }
    Ok(sample(rng, empty.len(), count)
        .into_iter()
        .map(|i| empty[i])
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(id: ScenarioId, seed: u64) -> BiofilmWorld {
        let setup = id.setup();
        let config = setup.config.clone().with_seed(seed);
        setup.build(config, &SeedContext::new(seed)).unwrap()
    }

    #[test]
    fn test_names_round_trip() {
        for id in ScenarioId::all() {
            assert_eq!(id.name().parse::<ScenarioId>().unwrap(), id);
            assert_eq!(id.to_string(), id.name());
        }
        assert_eq!("DENSE".parse::<ScenarioId>().unwrap(), ScenarioId::DenseBiofilm);
        assert!(matches!(
            "swarm".parse::<ScenarioId>(),
            Err(HarnessError::UnknownScenario(_))
        ));
    }

    #[test]
    fn test_setups_validate() {
        for id in ScenarioId::all() {
            assert!(id.setup().config.validate().is_ok(), "{}", id);
        }
    }

    #[test]
    fn test_baseline_seeds_substrate() {
        let world = build(ScenarioId::Baseline, 3);
        let census = world.census();
        assert_eq!(census.alive_good, 10);
        assert_eq!(census.alive_bad, 10);

        let layer_len = world.lattice().layer_len();
        for (i, cell) in world.cells().iter().enumerate() {
            if cell.is_alive() {
                assert!(i < layer_len, "cell {} above substrate", i);
            }
        }
    }

    #[test]
    fn test_dense_biofilm_fills_lattice() {
        let world = build(ScenarioId::DenseBiofilm, 9);
        assert_eq!(world.census().alive(), 154);
        assert_eq!(world.cells().len(), 256);
    }

    #[test]
    fn test_tall_column_starts_at_center() {
        let world = build(ScenarioId::TallColumn, 1);
        let center = world.lattice().layer_center(0).unwrap();
        assert_eq!(world.cell(center).unwrap().kind(), Some(CellKind::Good));
        assert_eq!(world.census().alive_bad, 1);
        assert_eq!(world.lattice().height(), 16);
    }

    #[test]
    fn test_placement_depends_on_seed() {
        let occupied = |seed| -> Vec<usize> {
            build(ScenarioId::Baseline, seed)
                .cells()
                .iter()
                .enumerate()
                .filter(|(_, c)| c.is_alive())
                .map(|(i, _)| i)
                .collect()
        };
        assert_eq!(occupied(5), occupied(5));
        assert_ne!(occupied(5), occupied(6));
    }

    #[test]
    fn test_dose_step() {
        let dose = Dose {
            at_fraction: 0.25,
            amount: 0.5,
        };
        assert_eq!(dose.step(100), 25);
        assert_eq!(dose.step(3), 0);
    }
}
