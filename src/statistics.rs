use crate::math::*;
use crate::mpm::models::ConstitutiveModel;
use crate::MpmSimulation;
use itertools::izip;

pub trait SimulationStatistics {
    fn total_time(&self) -> T;
    fn total_mass(&self) -> T;
    fn total_linear_momentum(&self) -> TV;
    fn total_angular_momentum(&self) -> TV;
    fn total_kinetic_energy(&self) -> T;
    fn total_volume(&self) -> T;
}

impl<CM: ConstitutiveModel> SimulationStatistics for MpmSimulation<CM> {
    fn total_time(&self) -> T {
        self.time
    }

    fn total_mass(&self) -> T {
        self.params.particle_mass() * self.particles.len() as T
    }

    fn total_linear_momentum(&self) -> TV {
        self.params.particle_mass() * self.particles.velocity.iter().sum::<TV>()
    }

    /// Includes the spin stored in the affine matrices, which APIC transfers conserve along
    /// with the orbital part.
    fn total_angular_momentum(&self) -> TV {
        let m = self.params.particle_mass();
        // Inertia-like factor of the quadratic kernel, D = h^2 / 4
        let d = 0.25 * self.params.h() * self.params.h();

        izip!(
            &self.particles.position,
            &self.particles.velocity,
            &self.particles.affine_matrix
        )
        .map(|(x, v, c)| {
            let spin = d * c.transpose();
            let spin = TV::new(
                spin[(1, 2)] - spin[(2, 1)],
                spin[(2, 0)] - spin[(0, 2)],
                spin[(0, 1)] - spin[(1, 0)],
            );
            m * (x.cross(v) + spin)
        })
        .sum()
    }

    fn total_kinetic_energy(&self) -> T {
        0.5 * self.params.particle_mass()
            * self
                .particles
                .velocity
                .iter()
                .map(|v| v.dot(v))
                .sum::<T>()
    }

    fn total_volume(&self) -> T {
        self.params.particle_volume
            * self
                .particles
                .deformation_gradient
                .iter()
                .map(|f| f.determinant())
                .sum::<T>()
    }
}
