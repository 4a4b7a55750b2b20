//! Colony configuration.

use crate::error::{ColonyError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Whether cells born during an agent pass may act later in the same pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BirthVisibility {
    /// Scan writes are visible immediately: a child placed at a higher index
    /// is stepped later in the same time unit.
    #[default]
    SamePass,

    /// Children born in this pass wait for the next time unit.
    NextPass,
}

/// Configuration for a colony run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColonyConfig {
    /// Master seed for the colony RNG
    pub seed: u64,

    /// Edge length of each layer
    pub size: usize,

    /// Number of layers
    pub height: usize,

    /// Rate constant λ for good cells
    pub good_rate: f64,

    /// Rate constant λ for bad cells
    pub bad_rate: f64,

    /// Probability that a good parent produces a bad child
    pub mutation_probability: f64,

    /// Antibiotic lost per cell site per time unit
    pub antibiotic_decay: f64,

    /// Factor applied to the kill probability of good cells, in [0, 1]
    pub antibiotic_resistance: f64,

    /// Antibiotic spent killing one cell
    pub antibiotic_kill_cost: f64,

    /// Food eaten per cell per time unit
    pub food_consumption: f64,

    /// Base diffusion coefficient for food
    pub food_diffusion: f64,

    /// Base diffusion coefficient for antibiotics
    pub antibiotic_diffusion: f64,

    /// Food diffusion factor on occupied sites, in [0, 1]
    pub food_diffusion_multiplier: f64,

    /// Antibiotic diffusion factor on occupied sites, in [0, 1]
    pub antibiotic_diffusion_multiplier: f64,

    /// Diffusion sub-steps per time unit
    pub resource_steps_per_time_unit: u32,

    /// Spatial step
    pub dx: f64,

    /// Scan visibility of newborn cells
    pub birth_visibility: BirthVisibility,
}

impl Default for ColonyConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            size: 20,
            height: 5,
            good_rate: 0.64,
            bad_rate: 0.87,
            mutation_probability: 0.01,
            antibiotic_decay: 0.005,
            antibiotic_resistance: 0.05,
            antibiotic_kill_cost: 0.05,
            food_consumption: 0.1,
            food_diffusion: 0.1,
            antibiotic_diffusion: 0.1,
            food_diffusion_multiplier: 0.5,
            antibiotic_diffusion_multiplier: 0.5,
            resource_steps_per_time_unit: 10,
            dx: 1.0,
            birth_visibility: BirthVisibility::SamePass,
        }
    }
}

impl ColonyConfig {
    /// Sets the lattice dimensions.
    pub fn with_dimensions(mut self, size: usize, height: usize) -> Self {
        self.size = size;
        self.height = height;
        self
    }

    /// Sets the master seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the birth visibility mode.
    pub fn with_birth_visibility(mut self, visibility: BirthVisibility) -> Self {
        self.birth_visibility = visibility;
        self
    }

    /// Diffusion sub-step length.
    pub fn resource_dt(&self) -> f64 {
        1.0 / self.resource_steps_per_time_unit as f64
    }

    /// Checks every parameter and fails on the first invalid one.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(ColonyError::config("size", "must be at least 1"));
        }
        if self.height == 0 {
            return Err(ColonyError::config("height", "must be at least 1"));
        }
        if self.resource_steps_per_time_unit == 0 {
            return Err(ColonyError::config(
                "resource_steps_per_time_unit",
                "must be at least 1",
            ));
        }

        positive("good_rate", self.good_rate)?;
        positive("bad_rate", self.bad_rate)?;
        positive("antibiotic_decay", self.antibiotic_decay)?;
        positive("antibiotic_kill_cost", self.antibiotic_kill_cost)?;
        positive("food_consumption", self.food_consumption)?;
        positive("food_diffusion", self.food_diffusion)?;
        positive("antibiotic_diffusion", self.antibiotic_diffusion)?;
        positive("dx", self.dx)?;

        unit_interval("mutation_probability", self.mutation_probability)?;
        unit_interval("antibiotic_resistance", self.antibiotic_resistance)?;
        unit_interval("food_diffusion_multiplier", self.food_diffusion_multiplier)?;
        unit_interval(
            "antibiotic_diffusion_multiplier",
            self.antibiotic_diffusion_multiplier,
        )?;

        let courant = self.stability_number();
        if courant > 1.0 {
            warn!(
                courant,
                "explicit diffusion is outside its stability bound; \
                 raise resource_steps_per_time_unit"
            );
        }

        Ok(())
    }

    /// `max(D) * 6 * dt / dx²` for the explicit scheme. Above 1 the solver
    /// can oscillate; clamping keeps it non-negative but not accurate.
    pub fn stability_number(&self) -> f64 {
        let d_max = self.food_diffusion.max(self.antibiotic_diffusion);
        d_max * 6.0 * self.resource_dt() / (self.dx * self.dx)
    }
}

fn positive(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ColonyError::config(
            field,
            format!("must be strictly positive, got {value}"),
        ))
    }
}

fn unit_interval(field: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ColonyError::config(
            field,
            format!("must lie in [0, 1], got {value}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ColonyConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.stability_number() <= 1.0);
    }

    #[test]
    fn test_rejects_non_positive_rates() {
        let config = ColonyConfig {
            good_rate: 0.0,
            ..Default::default()
        };
        assert_eq!(
            config.validate().unwrap_err(),
            ColonyError::config("good_rate", "must be strictly positive, got 0")
        );

        let config = ColonyConfig {
            dx: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ColonyError::InvalidConfig { field: "dx", .. })
        ));
    }

    #[test]
    fn test_rejects_out_of_range_probabilities() {
        let config = ColonyConfig {
            mutation_probability: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ColonyError::InvalidConfig { field: "mutation_probability", .. })
        ));

        let config = ColonyConfig {
            food_diffusion_multiplier: -0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_multipliers_accept_bounds() {
        let config = ColonyConfig {
            food_diffusion_multiplier: 0.0,
            antibiotic_diffusion_multiplier: 1.0,
            mutation_probability: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_lattice() {
        let config = ColonyConfig::default().with_dimensions(0, 3);
        assert!(matches!(
            config.validate(),
            Err(ColonyError::InvalidConfig { field: "size", .. })
        ));

        let config = ColonyConfig {
            resource_steps_per_time_unit: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: ColonyConfig =
            serde_json::from_str(r#"{ "size": 5, "birth_visibility": "next_pass" }"#).unwrap();
        assert_eq!(config.size, 5);
        assert_eq!(config.height, ColonyConfig::default().height);
        assert_eq!(config.birth_visibility, BirthVisibility::NextPass);
    }
}
