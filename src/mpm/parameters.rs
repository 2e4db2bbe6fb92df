use super::models::IsotropicParameters;
use crate::initial_condition::SeedRegion;
use crate::math::*;
use crate::util::RangeExt;

use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MpmParameters {
    /// The total number of Lagrangian particles in the simulation
    pub num_particles: usize,
    /// The number of grid nodes along each axis. The domain is the unit cube, so the grid
    /// spacing is `1 / grid_resolution`.
    pub grid_resolution: usize,
    /// The size of the time step. Larger time steps will simulate faster, but may be unstable or
    /// innaccurate.
    pub delta_time: T,
    /// The amount of simulated time that passes between two displayed frames.
    pub frame_time: T,
    /// Initial volume of every particle
    pub particle_volume: T,
    pub particle_density: T,
    /// Scale applied to the (unit) gravity direction supplied from outside.
    pub gravitational_constant: T,
    /// How many nodes from each face of the domain the sticky walls extend.
    pub boundary_margin: usize,
    pub elasticity: IsotropicParameters,
    pub seed: SeedRegion,
}

impl MpmParameters {
    /// Scales the default setup. `quality = 4` gives 144000 particles on a 512³ grid.
    pub fn with_quality(quality: usize) -> Self {
        let quality = quality.max(1);
        let grid_resolution = 128 * quality;
        let h = 1. / grid_resolution as T;

        MpmParameters {
            num_particles: 9000 * quality * quality,
            grid_resolution,
            delta_time: 1e-4 / quality as T,
            particle_volume: (h * 0.5).powi(2),
            ..Default::default()
        }
    }

    /// Reads parameters from a JSON file. Missing fields take their default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read(path)
            .wrap_err_with(|| format!("Failed to read JSON settings file: {:?}", path))?;
        let mut params: MpmParameters =
            serde_json::from_slice(&json).wrap_err("Serde failed to deserialize JSON.")?;
        params.elasticity.recalculate_lame_parameters();

        Ok(params)
    }

    /// The grid spacing
    pub fn h(&self) -> T {
        1. / self.grid_resolution as T
    }

    pub fn particle_mass(&self) -> T {
        self.particle_volume * self.particle_density
    }

    /// Number of substeps that fit into one displayed frame, never less than one.
    ///
    /// This is floored division through the float remainder, so a frame time that isn't an
    /// exact multiple of the step in binary rounds down: `2e-3` over `1e-4` gives 19 steps.
    pub fn substeps_per_frame(&self) -> usize {
        let remainder = self.frame_time % self.delta_time;
        let steps = ((self.frame_time - remainder) / self.delta_time).round();
        (steps as usize).max(1)
    }

    /// The region particles may be seeded in without their stencil touching the sticky walls.
    pub fn interior(&self) -> std::ops::Range<TV> {
        let margin = self.boundary_margin as T * self.h();
        TV::from_element(margin)..TV::from_element(1. - margin)
    }

    pub fn validate(&self) -> eyre::Result<()> {
        if self.grid_resolution < 2 * self.boundary_margin + 3 {
            return Err(eyre::eyre!(
                "Grid resolution {} is too small for a boundary margin of {}",
                self.grid_resolution,
                self.boundary_margin
            ));
        }
        if !(self.delta_time > 0.) || !(self.frame_time > 0.) {
            return Err(eyre::eyre!(
                "Time step ({}) and frame time ({}) must be positive",
                self.delta_time,
                self.frame_time
            ));
        }
        if !(self.particle_volume > 0.) || !(self.particle_density > 0.) {
            return Err(eyre::eyre!(
                "Particle volume ({}) and density ({}) must be positive",
                self.particle_volume,
                self.particle_density
            ));
        }
        if self.num_particles == 0 {
            return Err(eyre::eyre!("Simulation needs at least one particle"));
        }

        let nu = self.elasticity.poissons_ratio;
        if !(nu > -1. && nu < 0.5) {
            return Err(eyre::eyre!("Poisson's ratio {} must lie in (-1, 0.5)", nu));
        }

        let interior = self.interior();
        let (lower, upper) = self.seed.bounds();
        if !interior.contains_point(&lower) || !interior.contains_point(&upper) {
            return Err(eyre::eyre!(
                "Seed region {:?}..{:?} leaves the domain interior {:?}",
                lower,
                upper,
                interior
            ));
        }

        Ok(())
    }
}

impl Default for MpmParameters {
    fn default() -> Self {
        let grid_resolution = 128;
        let h = 1. / grid_resolution as T;

        MpmParameters {
            num_particles: 9000,
            grid_resolution,
            delta_time: 1e-4,
            frame_time: 2e-3,
            particle_volume: (h * 0.5).powi(2),
            particle_density: 1.,
            gravitational_constant: 9.8,
            boundary_margin: 3,
            elasticity: IsotropicParameters::default(),
            seed: SeedRegion::default(),
        }
    }
}
