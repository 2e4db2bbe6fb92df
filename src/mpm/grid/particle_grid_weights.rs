use crate::math::*;
use itertools::iproduct;

/// A single grid node in the 3x3x3 interpolation stencil of a particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StencilNode {
    /// Grid coordinate of the node. May lie outside the grid for escaped particles.
    pub coord: IV,
    pub weight: T,
    /// Gradient of `weight` with respect to the particle position.
    pub weight_grad: TV,
    /// `x_node - x_particle`, in units of grid cells.
    pub dpos: TV,
}

/// The quadratic B-spline interpolation weights of one particle, factored per axis.
///
/// Both transfers build this from nothing but the particle position, so the scatter and the
/// gather always see identical weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticWeights {
    /// Lowest corner of the stencil
    pub base: IV,
    /// Particle position relative to `base`, in units of grid cells. Each component lies in
    /// `[0.5, 1.5)`.
    pub fx: TV,
    /// `w[i][a]` is the 1D weight of the node `base + i` along axis `a`
    pub w: [TV; 3],
    /// `dw[i][a]` is the derivative of `w[i][a]` with respect to `fx[a]`
    pub dw: [TV; 3],
    one_over_h: T,
}

impl QuadraticWeights {
    pub fn new(position: &TV, one_over_h: T) -> Self {
        let grid_space_pos = position * one_over_h;
        let base = (grid_space_pos - TV::from_element(0.5)).map(|x| x.floor() as isize);
        let fx = grid_space_pos - base.map(|b| b as T);

        // See http://mpm.graphics Eqn. 123, with x = fx, fx - 1, fx - 2
        let w = [
            fx.map(|x| 0.5 * (1.5 - x) * (1.5 - x)),
            fx.map(|x| 0.75 - (x - 1.) * (x - 1.)),
            fx.map(|x| 0.5 * (x - 0.5) * (x - 0.5)),
        ];
        let dw = [
            fx.map(|x| x - 1.5),
            fx.map(|x| -2. * (x - 1.)),
            fx.map(|x| x - 0.5),
        ];

        QuadraticWeights {
            base,
            fx,
            w,
            dw,
            one_over_h,
        }
    }

    pub fn node(&self, i: usize, j: usize, k: usize) -> StencilNode {
        let (w, dw) = (&self.w, &self.dw);
        let offset = IV::new(i as isize, j as isize, k as isize);

        let weight = w[i].x * w[j].y * w[k].z;
        let weight_grad = self.one_over_h
            * TV::new(
                dw[i].x * w[j].y * w[k].z,
                w[i].x * dw[j].y * w[k].z,
                w[i].x * w[j].y * dw[k].z,
            );

        StencilNode {
            coord: self.base.zip_map(&offset, |b, o| b.saturating_add(o)),
            weight,
            weight_grad,
            dpos: offset.map(|o| o as T) - self.fx,
        }
    }

    /// Iterates over all 27 nodes of the stencil.
    pub fn stencil(&self) -> impl Iterator<Item = StencilNode> + '_ {
        iproduct!(0..3, 0..3, 0..3).map(move |(i, j, k)| self.node(i, j, k))
    }
}

/// The quadratic B-spline N(x), MPM SIGGRAPH Course Notes 2016, Eqn. 123
pub fn kernel(x: T) -> T {
    let x = x.abs();
    if x < 0.5 {
        0.75 - x * x
    } else if x < 1.5 {
        let a = 1.5 - x;
        0.5 * a * a
    } else {
        0.
    }
}

/// The derivative of the quadratic kernel function, N'(x).
///
/// N(x) = 3/4 - |x|^2           0 <= |x| < 1/2
///        1/2(3/2 - |x|)^2      1/2 <= |x| < 3/2
///        0                     3/2 <= |x|
///
/// N'(x) =             -2|x|             0 <= |x| < 1/2
///         abs'(x)     -(3/2 - |x|)      1/2 <= |x| < 3/2
///                     0                 3/2 <= |x|
pub fn kernel_derivative(x: T) -> T {
    let chain_rule = if x < 0. { -1. } else { 1. };
    let x = x.abs();

    chain_rule
        * if x < 0.5 {
            -2. * x
        } else if x < 1.5 {
            -(1.5 - x)
        } else {
            0.
        }
}
