pub mod data;
pub mod particle_grid_weights;

pub use data::GridData;
pub use particle_grid_weights::{QuadraticWeights, StencilNode};

use super::MpmParameters;
use crate::math::*;
use rayon::prelude::*;

/// Stores the grid data for the Mpm Simulation. Everything here is rebuilt every substep.
#[derive(Debug, Clone)]
pub struct MpmGrid {
    pub mass: Vec<T>,
    /// Holds momentum while particles are being scattered, and velocity once
    /// `compute_velocities` has run.
    pub velocity: Vec<TV>,
    pub data: GridData,
}

impl MpmGrid {
    pub fn new(params: &MpmParameters) -> Self {
        let data = GridData::new(params.grid_resolution, params.h());

        Self {
            mass: vec![0.; data.num_cells],
            velocity: vec![TV::zeros(); data.num_cells],
            data,
        }
    }

    /// Fills each of the arrays in the grid with zeros.
    pub fn clear_grid(&mut self) {
        self.mass.par_iter_mut().for_each(|m| *m = 0.);
        self.velocity.par_iter_mut().for_each(|v| *v = TV::zeros());
    }

    pub fn total_mass(&self) -> T {
        self.mass.iter().sum()
    }

    /// Only meaningful between the particle to grid transfer and `compute_velocities`, while
    /// `velocity` still holds momentum.
    pub fn total_momentum(&self) -> TV {
        self.velocity.iter().sum()
    }

    /// Converts the accumulated momentum to velocity, adds gravity and enforces the walls.
    /// Nodes without mass are left untouched.
    pub fn compute_velocities(&mut self, params: &MpmParameters, gravity: &TV) {
        let data = &self.data;
        let delta_v = params.delta_time * params.gravitational_constant * gravity;
        let margin = params.boundary_margin;

        self.velocity
            .par_iter_mut()
            .zip(self.mass.par_iter())
            .enumerate()
            .for_each(|(i, (v, &m))| {
                // No need for an epsilon here, any node in a particle's stencil has m > 0
                if m > 0. {
                    *v /= m;
                    *v += delta_v;

                    enforce_walls(v, &data.index_to_coord(i), &data.size, margin);
                }
            });
    }
}

/// Sticky walls that only cancel the velocity component pushing out of the domain. Each axis
/// is checked independently.
fn enforce_walls(v: &mut TV, coord: &UV, size: &UV, margin: usize) {
    for axis in 0..DIM {
        if coord[axis] < margin && v[axis] < 0. {
            v[axis] = 0.;
        }
        if coord[axis] + margin > size[axis] && v[axis] > 0. {
            v[axis] = 0.;
        }
    }
}
