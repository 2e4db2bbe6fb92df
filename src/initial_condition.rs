use crate::math::*;
use crate::mpm::particles::MpmParticles;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub trait InitialCondition {
    /// Replaces every particle with `num_particles` freshly seeded ones.
    fn add_particles(&self, particles: &mut MpmParticles, num_particles: usize);
}

/// Uniformly random particles in one or more axis-aligned boxes.
///
/// The particles are split into `num_groups` equally sized groups, group `g` being sampled
/// from the box at `origin + g * group_offset`. The group index is used as the material tag.
/// The generator is reseeded on every call, so seeding twice produces identical particles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedRegion {
    pub origin: TV,
    pub extent: TV,
    pub group_offset: TV,
    pub num_groups: usize,
    pub rng_seed: u64,
}

impl Default for SeedRegion {
    fn default() -> Self {
        SeedRegion {
            origin: TV::new(0.3, 0.05, 0.3),
            extent: TV::from_element(0.2),
            group_offset: TV::new(0.10, 0.32, 0.10),
            num_groups: 1,
            rng_seed: 0,
        }
    }
}

impl SeedRegion {
    /// Lower and upper corner of the box containing every group.
    pub fn bounds(&self) -> (TV, TV) {
        let spread = self.num_groups.saturating_sub(1) as T * self.group_offset;
        let lower = self.origin + spread.map(|x| x.min(0.));
        let upper = self.origin + self.extent + spread.map(|x| x.max(0.));
        (lower, upper)
    }

    fn group(&self, particle: usize, num_particles: usize) -> usize {
        let num_groups = self.num_groups.max(1);
        let group_size = (num_particles / num_groups).max(1);
        (particle / group_size).min(num_groups - 1)
    }
}

impl InitialCondition for SeedRegion {
    fn add_particles(&self, particles: &mut MpmParticles, num_particles: usize) {
        let mut rng = StdRng::seed_from_u64(self.rng_seed);

        particles.clear();
        for i in 0..num_particles {
            let group = self.group(i, num_particles);

            let rand: TV = rng.gen::<[T; 3]>().into();
            let pos = self.origin
                + group as T * self.group_offset
                + rand.component_mul(&self.extent);

            particles.add_particle(pos, TV::zeros(), group as u32);
        }
    }
}
