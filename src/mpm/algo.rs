use super::grid::{MpmGrid, QuadraticWeights};
use super::models::ConstitutiveModel;
use super::particles::MpmParticles;
use super::MpmParameters;
use crate::math::*;

use rayon::prelude::*;
use smallvec::SmallVec;

/// What one particle adds to one grid node during the scatter.
#[derive(Debug, Clone, Copy)]
struct NodeContribution {
    index: usize,
    mass: T,
    momentum: TV,
}

type Contributions = SmallVec<[NodeContribution; 27]>;

/// APIC particle to grid transfer, with the explicit elastic force folded into the momentum.
///
/// The per-particle stencils (including the stress) are computed in parallel, but they are
/// added to the grid in particle order, so the result doesn't depend on the thread count.
/// Stencil nodes outside the grid are dropped.
pub fn particle_to_grid<CM: ConstitutiveModel>(
    particles: &MpmParticles,
    grid: &mut MpmGrid,
    params: &MpmParameters,
    model: &CM,
) {
    let data = &grid.data;
    let mass = params.particle_mass();
    let volume = params.particle_volume;
    let dt = params.delta_time;

    let contributions: Vec<Contributions> = (0..particles.len())
        .into_par_iter()
        .map(|p| {
            let weights = QuadraticWeights::new(&particles.position[p], data.one_over_h);
            let stress = model.kirchhoff_stress(&particles.deformation_gradient[p]);
            let velocity = particles.velocity[p];
            let affine = particles.affine_matrix[p];

            weights
                .stencil()
                .filter_map(|node| {
                    let index = data.coord_to_index(node.coord)?;

                    let force = -volume * stress * node.weight_grad;
                    let momentum = mass * node.weight * (velocity + affine * node.dpos * data.h);

                    Some(NodeContribution {
                        index,
                        mass: mass * node.weight,
                        // This is momentum, so the force isn't divided by the node mass
                        momentum: momentum + dt * force,
                    })
                })
                .collect::<Contributions>()
        })
        .collect();

    for contribution in contributions.iter().flatten() {
        grid.mass[contribution.index] += contribution.mass;
        grid.velocity[contribution.index] += contribution.momentum;
    }
}

/// APIC grid to particle transfer. Updates velocity, the affine matrix, the deformation
/// gradient, and moves the particles.
///
/// Stencil nodes outside the grid contribute nothing.
pub fn grid_to_particle(particles: &mut MpmParticles, grid: &MpmGrid, params: &MpmParameters) {
    let data = &grid.data;
    let dt = params.delta_time;

    let MpmParticles {
        position,
        velocity,
        affine_matrix,
        deformation_gradient,
        ..
    } = particles;

    (
        position.par_iter_mut(),
        velocity.par_iter_mut(),
        affine_matrix.par_iter_mut(),
        deformation_gradient.par_iter_mut(),
    )
        .into_par_iter()
        .for_each(|(x, v, c, f)| {
            let weights = QuadraticWeights::new(x, data.one_over_h);

            let mut new_v = TV::zeros();
            let mut new_c = Mat::zeros();
            let mut velocity_gradient = Mat::zeros();

            for node in weights.stencil() {
                let grid_v = match data.coord_to_index(node.coord) {
                    Some(i) => grid.velocity[i],
                    None => continue,
                };

                new_v += node.weight * grid_v;
                new_c += 4. * data.one_over_h * node.weight * grid_v * node.dpos.transpose();
                velocity_gradient += grid_v * node.weight_grad.transpose();
            }

            *v = new_v;
            *c = new_c;
            *x += dt * new_v;
            *f = (Mat::identity() + dt * velocity_gradient) * *f;
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mpm::models::FixedCorotated;
    use itertools::iproduct;
    use proptest::prelude::*;

    /// A small block of particles well inside the domain, 2 per cell along each axis.
    fn block(params: &MpmParameters, velocity: TV) -> MpmParticles {
        let h = params.h();
        let mut particles = MpmParticles::default();
        for (i, j, k) in iproduct!(0..8, 0..8, 0..8) {
            let x = TV::new(0.4, 0.4, 0.4) + 0.5 * h * TV::new(i as T, j as T, k as T);
            particles.add_particle(x + TV::new(0.13, 0.27, 0.41) * h, velocity, 0);
        }
        particles
    }

    #[test]
    fn mass_conservation() {
        let params = MpmParameters::default();
        let mut grid = MpmGrid::new(&params);
        let particles = block(&params, TV::new(0.1, -0.2, 0.3));

        particle_to_grid(&particles, &mut grid, &params, &FixedCorotated::default());

        let expected = params.particle_mass() * particles.len() as T;
        assert!((grid.total_mass() - expected).abs() <= 1e-12 * expected);
    }

    #[test]
    fn momentum_conservation_at_rest_shape() {
        let params = MpmParameters::default();
        let mut grid = MpmGrid::new(&params);
        let velocity = TV::new(0.1, -0.2, 0.3);
        let particles = block(&params, velocity);

        particle_to_grid(&particles, &mut grid, &params, &FixedCorotated::default());

        let expected = params.particle_mass() * particles.len() as T * velocity;
        assert!((grid.total_momentum() - expected).norm() <= 1e-9 * expected.norm());
    }

    #[test]
    fn scatter_is_order_independent() {
        let params = MpmParameters::default();
        let mut particles = block(&params, TV::new(0.5, 0., 0.));
        for (p, f) in particles.deformation_gradient.iter_mut().enumerate() {
            *f = Mat::identity() + 0.01 * (p % 5) as T * Mat::from_fn(|i, j| (i + 2 * j) as T);
        }

        let mut reversed = MpmParticles::default();
        for p in (0..particles.len()).rev() {
            reversed.add_particle(particles.position[p], particles.velocity[p], 0);
            reversed.deformation_gradient[particles.len() - 1 - p] =
                particles.deformation_gradient[p];
        }

        let model = FixedCorotated::default();
        let mut a = MpmGrid::new(&params);
        let mut b = MpmGrid::new(&params);
        particle_to_grid(&particles, &mut a, &params, &model);
        particle_to_grid(&reversed, &mut b, &params, &model);

        for i in 0..a.data.num_cells {
            assert!((a.mass[i] - b.mass[i]).abs() <= 1e-15);
            assert!((a.velocity[i] - b.velocity[i]).norm() <= 1e-12);
        }
    }

    #[test]
    fn uniform_grid_velocity_is_reproduced() {
        let params = MpmParameters::default();
        let mut grid = MpmGrid::new(&params);
        let mut particles = block(&params, TV::zeros());

        let grid_v = TV::new(0.3, -0.1, 0.2);
        grid.velocity.iter_mut().for_each(|v| *v = grid_v);

        grid_to_particle(&mut particles, &grid, &params);

        for p in 0..particles.len() {
            assert!((particles.velocity[p] - grid_v).norm() < 1e-12);
            assert!(particles.affine_matrix[p].norm() < 1e-9);
            assert!((particles.deformation_gradient[p] - Mat::identity()).norm() < 1e-9);
        }
    }

    #[test]
    fn linear_grid_velocity_gives_affine_matrix() {
        let params = MpmParameters::default();
        let mut grid = MpmGrid::new(&params);
        let mut particles = block(&params, TV::zeros());

        // v(x) = A x on the grid nodes
        let a = Mat::new(0.1, 0.2, 0., -0.3, 0., 0.4, 0., 0.5, -0.1);
        for i in 0..grid.data.num_cells {
            let x = grid.data.coord_to_pos(grid.data.index_to_coord(i));
            grid.velocity[i] = a * x;
        }

        let before = particles.clone();
        grid_to_particle(&mut particles, &grid, &params);

        for p in 0..particles.len() {
            let expected_v = a * before.position[p];
            assert!((particles.velocity[p] - expected_v).norm() < 1e-9);
            assert!((particles.affine_matrix[p] - a).norm() < 1e-9);

            let expected_f = Mat::identity() + params.delta_time * a;
            assert!((particles.deformation_gradient[p] - expected_f).norm() < 1e-9);
            assert!(
                (particles.position[p] - (before.position[p] + params.delta_time * expected_v))
                    .norm()
                    < 1e-12
            );
        }
    }

    proptest! {
        /// The gather must read back with exactly the weights the scatter wrote with. A lone
        /// resting particle leaves `m * w` on each node, and a grid velocity equal to the node
        /// index then gathers to the mass-weighted mean index.
        #[test]
        fn gather_uses_scatter_weights(x in 0.1f64..0.9, y in 0.1f64..0.9, z in 0.1f64..0.9) {
            let params = MpmParameters::default();
            let mut grid = MpmGrid::new(&params);
            let mut particles = MpmParticles::default();
            particles.add_particle(TV::new(x, y, z), TV::zeros(), 0);

            particle_to_grid(&particles, &mut grid, &params, &FixedCorotated::default());

            let mass = params.particle_mass();
            let touched = grid.mass.iter().filter(|&&m| m > 0.).count();
            prop_assert!(touched <= 27);

            let expected: T = grid
                .mass
                .iter()
                .enumerate()
                .map(|(i, m)| m / mass * i as T)
                .sum();
            for (i, v) in grid.velocity.iter_mut().enumerate() {
                *v = TV::new(i as T, 0., 0.);
            }

            grid_to_particle(&mut particles, &grid, &params);

            let gathered = particles.velocity[0].x;
            prop_assert!(
                (gathered - expected).abs() <= 1e-9 * expected,
                "gathered {} but the scatter weights give {}",
                gathered,
                expected
            );
        }
    }
}
