//! Food and antibiotic fields with occupancy-dependent diffusion.
//!
//! Each field is advanced with an explicit finite-difference scheme over the
//! lattice adjacency:
//!
//! ```text
//! flux(j)  = Σ_k 0.5 · (D[j] + D[k]) · (C[k] − C[j])
//! C'(j)    = max(0, C[j] + dt/dx² · flux(j))
//! ```
//!
//! Every sub-step reads one buffer and writes the other, then swaps them, so
//! the per-cell updates are independent. With the `parallel` feature the
//! kernel runs on rayon.

use crate::cell::CellState;
use crate::config::ColonyConfig;
use crate::lattice::Lattice;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// The two diffusing species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Food,
    Antibiotics,
}

impl Resource {
    pub fn all() -> [Resource; 2] {
        [Resource::Food, Resource::Antibiotics]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Resource::Food => "food",
            Resource::Antibiotics => "antibiotics",
        }
    }
}

/// One concentration array with its coefficients and ping-pong buffer.
#[derive(Debug, Clone)]
struct Channel {
    concentration: Vec<f64>,
    scratch: Vec<f64>,
    coefficients: Vec<f64>,
    base: f64,
    multiplier: f64,
}

impl Channel {
    fn new(len: usize, base: f64, multiplier: f64) -> Self {
        Self {
            concentration: vec![0.0; len],
            scratch: vec![0.0; len],
            coefficients: vec![base; len],
            base,
            multiplier,
        }
    }

    fn substep(&mut self, lattice: &Lattice, scale: f64) {
        diffusion_kernel(
            &self.concentration,
            &mut self.scratch,
            &self.coefficients,
            lattice,
            scale,
        );
        std::mem::swap(&mut self.concentration, &mut self.scratch);
    }

    fn set_occupied(&mut self, index: usize, occupied: bool) {
        self.coefficients[index] = if occupied {
            self.base * self.multiplier
        } else {
            self.base
        };
    }
}

/// Serializable copy of both concentration arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub food: Vec<f64>,
    pub antibiotics: Vec<f64>,
}

/// Food and antibiotic concentrations over the lattice.
#[derive(Debug, Clone)]
pub struct ResourceField {
    food: Channel,
    antibiotics: Channel,

    /// Sub-step length (1 / substeps)
    dt: f64,

    /// Spatial step
    dx: f64,

    /// Sub-steps per time unit
    substeps: u32,
}

impl ResourceField {
    /// Creates zeroed fields for `len` sites using the diffusion parameters
    /// of `config`. Coefficients start at their base values (empty lattice).
    pub fn new(len: usize, config: &ColonyConfig) -> Self {
        Self {
            food: Channel::new(
                len,
                config.food_diffusion,
                config.food_diffusion_multiplier,
            ),
            antibiotics: Channel::new(
                len,
                config.antibiotic_diffusion,
                config.antibiotic_diffusion_multiplier,
            ),
            dt: config.resource_dt(),
            dx: config.dx,
            substeps: config.resource_steps_per_time_unit,
        }
    }

    fn channel(&self, resource: Resource) -> &Channel {
        match resource {
            Resource::Food => &self.food,
            Resource::Antibiotics => &self.antibiotics,
        }
    }

    fn channel_mut(&mut self, resource: Resource) -> &mut Channel {
        match resource {
            Resource::Food => &mut self.food,
            Resource::Antibiotics => &mut self.antibiotics,
        }
    }

    /// Number of sites.
    pub fn len(&self) -> usize {
        self.food.concentration.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sub-step length.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Sub-steps per time unit.
    pub fn substeps(&self) -> u32 {
        self.substeps
    }

    pub fn food(&self) -> &[f64] {
        &self.food.concentration
    }

    pub fn antibiotics(&self) -> &[f64] {
        &self.antibiotics.concentration
    }

    pub fn food_coefficients(&self) -> &[f64] {
        &self.food.coefficients
    }

    pub fn antibiotic_coefficients(&self) -> &[f64] {
        &self.antibiotics.coefficients
    }

    /// Concentration at one site.
    #[inline]
    pub fn get(&self, resource: Resource, index: usize) -> f64 {
        self.channel(resource).concentration[index]
    }

    /// Sets the concentration at one site, floored at zero.
    #[inline]
    pub fn set(&mut self, resource: Resource, index: usize, value: f64) {
        self.channel_mut(resource).concentration[index] = value.max(0.0);
    }

    /// Sets every site to `value` (floored at zero).
    pub fn fill(&mut self, resource: Resource, value: f64) {
        let value = value.max(0.0);
        self.channel_mut(resource).concentration.fill(value);
    }

    /// Adds `amount` to every site (dose injection). Negative amounts
    /// deplete and are floored at zero.
    pub fn add_uniform(&mut self, resource: Resource, amount: f64) {
        for c in self.channel_mut(resource).concentration.iter_mut() {
            *c = (*c + amount).max(0.0);
        }
    }

    /// Total mass of `resource` over the lattice.
    pub fn total(&self, resource: Resource) -> f64 {
        self.channel(resource).concentration.iter().sum()
    }

    /// Smallest concentration of `resource`, or 0 for an empty field.
    pub fn min(&self, resource: Resource) -> f64 {
        self.channel(resource)
            .concentration
            .iter()
            .copied()
            .reduce(f64::min)
            .unwrap_or(0.0)
    }

    /// One diffusion sub-step for both species.
    pub fn diffusion_substep(&mut self, lattice: &Lattice) {
        let scale = self.dt / (self.dx * self.dx);
        self.food.substep(lattice, scale);
        self.antibiotics.substep(lattice, scale);
    }

    /// A full time unit of diffusion (`substeps` sub-steps).
    pub fn diffuse(&mut self, lattice: &Lattice) {
        for _ in 0..self.substeps {
            self.diffusion_substep(lattice);
        }
    }

    /// Resets each site's coefficients from lattice occupancy: base value on
    /// `Empty` sites, base times multiplier on any other state (dead cells
    /// included).
    pub fn update_coefficients<I>(&mut self, occupancy: I)
    where
        I: IntoIterator<Item = CellState>,
    {
        for (index, state) in occupancy.into_iter().enumerate() {
            self.update_site(index, state);
        }
    }

    /// Resets the coefficients of one site from its state.
    #[inline]
    pub fn update_site(&mut self, index: usize, state: CellState) {
        let occupied = state.is_occupied();
        self.food.set_occupied(index, occupied);
        self.antibiotics.set_occupied(index, occupied);
    }

    /// Copies both concentration arrays.
    pub fn snapshot(&self) -> ResourceSnapshot {
        ResourceSnapshot {
            food: self.food.concentration.clone(),
            antibiotics: self.antibiotics.concentration.clone(),
        }
    }
}

/// Writes one explicit sub-step of `src` into `dst`.
fn diffusion_kernel(src: &[f64], dst: &mut [f64], d: &[f64], lattice: &Lattice, scale: f64) {
    #[cfg(feature = "parallel")]
    dst.par_iter_mut()
        .enumerate()
        .for_each(|(j, out)| *out = cell_update(j, src, d, lattice, scale));

    #[cfg(not(feature = "parallel"))]
    for (j, out) in dst.iter_mut().enumerate() {
        *out = cell_update(j, src, d, lattice, scale);
    }
}

#[inline]
fn cell_update(j: usize, src: &[f64], d: &[f64], lattice: &Lattice, scale: f64) -> f64 {
    let c_j = src[j];
    let d_j = d[j];
    let flux: f64 = lattice
        .neighbors(j)
        .iter()
        .map(|&k| 0.5 * (d_j + d[k]) * (src[k] - c_j))
        .sum();
    (c_j + scale * flux).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn field(size: usize, height: usize) -> (Lattice, ResourceField) {
        let config = ColonyConfig::default().with_dimensions(size, height);
        let lattice = Lattice::new(size, height);
        let field = ResourceField::new(lattice.len(), &config);
        (lattice, field)
    }

    #[test]
    fn test_uniform_field_is_unchanged() {
        let (lattice, mut field) = field(3, 1);
        field.fill(Resource::Antibiotics, 0.7);

        field.diffusion_substep(&lattice);

        for &c in field.antibiotics() {
            assert_relative_eq!(c, 0.7, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_point_source_conserves_mass() {
        let (lattice, mut field) = field(5, 3);
        let center = lattice.index_of(crate::lattice::Coord::new(2, 2, 1)).unwrap();
        field.fill(Resource::Food, 1.0);
        field.set(Resource::Food, center, 5.0);

        let before = field.total(Resource::Food);
        field.diffusion_substep(&lattice);
        let after = field.total(Resource::Food);

        assert_relative_eq!(before, after, epsilon = 1e-9);
        assert!(field.get(Resource::Food, center) < 5.0);
        for &k in lattice.neighbors(center) {
            assert!(field.get(Resource::Food, k) > 1.0);
        }
    }

    #[test]
    fn test_mass_conserved_with_heterogeneous_coefficients() {
        let (lattice, mut field) = field(4, 2);
        for i in 0..lattice.len() {
            field.set(Resource::Antibiotics, i, 1.0 + (i % 5) as f64 * 0.1);
        }
        let occupancy: Vec<CellState> = (0..lattice.len())
            .map(|i| if i % 3 == 0 { CellState::Good } else { CellState::Empty })
            .collect();
        field.update_coefficients(occupancy);

        let before = field.total(Resource::Antibiotics);
        field.diffuse(&lattice);
        assert_relative_eq!(before, field.total(Resource::Antibiotics), epsilon = 1e-9);
    }

    #[test]
    fn test_stays_non_negative_under_unstable_step() {
        let mut config = ColonyConfig::default().with_dimensions(4, 2);
        config.food_diffusion = 5.0;
        config.resource_steps_per_time_unit = 1;
        let lattice = Lattice::new(4, 2);
        let mut field = ResourceField::new(lattice.len(), &config);
        field.set(Resource::Food, 0, 10.0);

        for _ in 0..20 {
            field.diffuse(&lattice);
            assert!(field.min(Resource::Food) >= 0.0);
            assert!(field.min(Resource::Antibiotics) >= 0.0);
        }
    }

    #[test]
    fn test_coefficients_follow_occupancy() {
        let (_, mut field) = field(2, 1);
        field.update_coefficients([
            CellState::Empty,
            CellState::Good,
            CellState::DeadBad,
            CellState::Empty,
        ]);

        let base = ColonyConfig::default().food_diffusion;
        let mult = ColonyConfig::default().food_diffusion_multiplier;
        assert_eq!(field.food_coefficients(), &[base, base * mult, base * mult, base]);

        field.update_coefficients([CellState::Empty; 4]);
        assert!(field.antibiotic_coefficients().iter().all(|&d| d == base));

        field.update_site(3, CellState::DeadGood);
        assert_eq!(field.food_coefficients(), &[base, base, base, base * mult]);
    }

    #[test]
    fn test_set_and_add_floor_at_zero() {
        let (_, mut field) = field(2, 1);
        field.set(Resource::Food, 1, -3.0);
        assert_eq!(field.get(Resource::Food, 1), 0.0);

        field.fill(Resource::Antibiotics, 0.2);
        field.add_uniform(Resource::Antibiotics, -0.5);
        assert_eq!(field.total(Resource::Antibiotics), 0.0);

        field.add_uniform(Resource::Antibiotics, 0.25);
        assert_relative_eq!(field.total(Resource::Antibiotics), 1.0);
    }

    #[test]
    fn test_snapshot_copies_arrays() {
        let (_, mut field) = field(2, 1);
        field.set(Resource::Food, 2, 0.5);
        let snapshot = field.snapshot();
        field.set(Resource::Food, 2, 0.9);
        assert_eq!(snapshot.food[2], 0.5);
        assert_eq!(snapshot.antibiotics.len(), 4);
    }
}
