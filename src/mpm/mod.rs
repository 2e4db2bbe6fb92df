mod algo;
mod forces;
pub mod grid;
pub mod models;
mod parameters;
pub mod particles;

pub use forces::{Direction, ExternalForces};
pub use parameters::MpmParameters;

use crate::initial_condition::InitialCondition;
use crate::math::*;
use crate::util::VecExt;
use crate::{Frame, Simulation};

use grid::MpmGrid;
use models::{ConstitutiveModel, FixedCorotated, IsotropicParameters};
use particles::MpmParticles;
use tracing::{debug, info, trace_span, warn};

/// Contains all of the state for the Material Point Method Simulation
pub struct MpmSimulation<CM = FixedCorotated> {
    pub particles: MpmParticles,
    pub grid: MpmGrid,
    pub params: MpmParameters,
    pub model: CM,
    /// Simulated time since the last reset
    pub time: T,
    /// Number of frames since the last reset
    pub frame: usize,
}

impl<CM: ConstitutiveModel> MpmSimulation<CM> {
    /// Creates a new simulation with the given parameters and constitutive model. There are no
    /// particles until `reset` is called.
    pub fn with_model(params: MpmParameters, model: CM) -> Self {
        MpmSimulation {
            particles: MpmParticles::with_capacity(params.num_particles),
            grid: MpmGrid::new(&params),
            params,
            model,
            time: 0.,
            frame: 0,
        }
    }

    /// Reinitializes the particles from the seed region. The grid doesn't need to be touched,
    /// it gets cleared at the start of every substep anyway.
    pub fn reset(&mut self) {
        self.params
            .seed
            .add_particles(&mut self.particles, self.params.num_particles);
        self.time = 0.;
        self.frame = 0;

        info!("Reset simulation with {} particles", self.particles.len());
    }

    /// Advances the simulation by one time step: clear the grid, scatter the particles to it,
    /// update the grid velocities, then gather them back.
    pub fn substep(&mut self, forces: &ExternalForces) {
        {
            let _span = trace_span!("clear_grid").entered();
            self.grid.clear_grid();
        }
        {
            let _span = trace_span!("particle_to_grid").entered();
            algo::particle_to_grid(&self.particles, &mut self.grid, &self.params, &self.model);
        }
        {
            let _span = trace_span!("grid_update").entered();
            self.grid.compute_velocities(&self.params, &forces.gravity);
        }
        {
            let _span = trace_span!("grid_to_particle").entered();
            algo::grid_to_particle(&mut self.particles, &self.grid, &self.params);
        }

        self.time += self.params.delta_time;
    }

    /// Runs enough substeps to cover one frame, and returns what the renderer needs.
    pub fn advance_frame(&mut self, forces: &ExternalForces) -> Frame {
        let substeps = self.params.substeps_per_frame();
        for _ in 0..substeps {
            self.substep(forces);
        }
        self.frame += 1;

        debug!(
            "Frame {} done ({} substeps, t = {:.4})",
            self.frame, substeps, self.time
        );

        if let Some(p) = (0..self.particles.len()).find(|&p| !self.particle_is_finite(p)) {
            warn!(
                "Particle {} has non-finite state after frame {}: x = {:?}, F = {:?}",
                p, self.frame, self.particles.position[p], self.particles.deformation_gradient[p]
            );
        }

        self.create_frame()
    }

    /// Current particle positions and material tags, for display.
    pub fn create_frame(&self) -> Frame {
        Frame {
            index: self.frame,
            time: self.time,
            positions: self
                .particles
                .position
                .iter()
                .map(|x| [x.x as f32, x.y as f32, x.z as f32])
                .collect(),
            materials: self.particles.material.clone(),
        }
    }

    fn particle_is_finite(&self, p: usize) -> bool {
        self.particles.position[p].all_finite()
            && self.particles.velocity[p].all_finite()
            && self.particles.deformation_gradient[p]
                .iter()
                .all(|x| x.is_finite())
    }
}

impl<CM> Simulation for MpmSimulation<CM>
where
    CM: ConstitutiveModel + From<IsotropicParameters>,
{
    type Parameters = MpmParameters;

    fn new(params: MpmParameters) -> Self {
        let model = CM::from(params.elasticity.clone());
        Self::with_model(params, model)
    }

    fn reset(&mut self) {
        MpmSimulation::reset(self)
    }

    fn simulate_frame(&mut self, forces: &ExternalForces) -> Frame {
        self.advance_frame(forces)
    }
}
