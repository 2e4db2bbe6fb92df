//! An explicit Material Point Method solver for elastic solids.
//!
//! Particles carry position, velocity, an affine velocity matrix (APIC) and a deformation
//! gradient. Every substep the state is scattered onto a transient background grid, the grid
//! momentum is advanced with elastic forces, gravity and wall collisions, and the result is
//! gathered back onto the particles.

extern crate nalgebra as na;

pub mod initial_condition;
pub mod mpm;
pub mod statistics;
pub mod util;

pub use mpm::{Direction, ExternalForces, MpmParameters, MpmSimulation};

use serde::{Deserialize, Serialize};

pub mod math {
    pub const DIM: usize = 3;

    pub type Dim = na::Const<DIM>;

    pub type T = f64;
    pub type TV = na::SVector<T, DIM>;
    pub type IV = na::SVector<isize, DIM>;
    pub type UV = na::SVector<usize, DIM>;

    pub type Mat = na::SMatrix<T, DIM, DIM>;
}

/// The interface the (external) viewer or batch runner drives.
pub trait Simulation: Send {
    type Parameters;

    fn new(params: Self::Parameters) -> Self;

    /// Reinitializes every particle from the configured seeding rule.
    fn reset(&mut self);

    /// Advances the simulation by one displayed frame, i.e. a batch of substeps.
    fn simulate_frame(&mut self, forces: &ExternalForces) -> Frame;
}

/// Particle state handed to the renderer after each frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub index: usize,
    pub time: f64,
    pub positions: Vec<[f32; 3]>,
    /// Material tag of each particle. Only used to pick a display color.
    pub materials: Vec<u32>,
}
