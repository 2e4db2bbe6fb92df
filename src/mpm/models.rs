use crate::math::*;
use serde::{Deserialize, Serialize};

/// Trait that describes a constitutive model.
///
/// The explicit solver only needs the Kirchhoff stress `τ = P Fᵀ`, which is what gets
/// multiplied against the weight gradients during the particle to grid transfer.
pub trait ConstitutiveModel: Send + Sync {
    fn kirchhoff_stress(&self, deformation_gradient: &Mat) -> Mat;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsotropicParameters {
    pub youngs_modulus: T,
    pub poissons_ratio: T,
    pub mu: T,
    pub lambda: T,
}

impl IsotropicParameters {
    pub fn new(youngs_modulus: T, poissons_ratio: T) -> Self {
        let mut base = Self {
            youngs_modulus,
            poissons_ratio,
            mu: 0.,
            lambda: 0.,
        };
        base.recalculate_lame_parameters();
        base
    }

    pub fn recalculate_lame_parameters(&mut self) {
        self.mu = self.youngs_modulus / (2. * (1. + self.poissons_ratio));
        self.lambda = self.youngs_modulus * self.poissons_ratio
            / ((1. + self.poissons_ratio) * (1. - 2. * self.poissons_ratio));
    }
}

impl Default for IsotropicParameters {
    fn default() -> Self {
        Self::new(1e3, 0.2)
    }
}

/// Singular value decomposition `F = U Σ Vᵀ` in which `U` and `V` are both proper rotations.
/// A reflection in `F` shows up as a negative smallest singular value instead.
///
/// Returns `(U, Σ, Vᵀ)`. If the decomposition doesn't produce the singular vectors, the result
/// is NaN, so the instability propagates to the particle instead of aborting the step.
#[allow(non_snake_case)]
pub fn rotation_variant_svd(F: &Mat) -> (Mat, TV, Mat) {
    let svd = F.svd(true, true);
    let (mut U, mut V_t) = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => (u, v_t),
        _ => {
            let nan = Mat::from_element(T::NAN);
            return (nan, TV::from_element(T::NAN), nan);
        }
    };
    let mut sigma = svd.singular_values;

    let smallest = sigma.imin();
    if U.determinant() < 0. {
        let mut column = U.column_mut(smallest);
        column *= -1.;
        sigma[smallest] = -sigma[smallest];
    }
    if V_t.determinant() < 0. {
        let mut row = V_t.row_mut(smallest);
        row *= -1.;
        sigma[smallest] = -sigma[smallest];
    }

    (U, sigma, V_t)
}

/// Rotational part `R = U Vᵀ` of the polar decomposition `F = R S`, and `J`, the product of the
/// (signed) singular values.
#[allow(non_snake_case)]
pub fn polar_rotation(F: &Mat) -> (Mat, T) {
    let (U, sigma, V_t) = rotation_variant_svd(F);
    (U * V_t, sigma.iter().product())
}

/// The Fixed Corotated model from Stomakhin et al. 2012. Penalizes the distance of `F` from
/// the nearest rotation, and the change in volume, independently.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedCorotated(pub IsotropicParameters);

impl From<IsotropicParameters> for FixedCorotated {
    fn from(params: IsotropicParameters) -> Self {
        FixedCorotated(params)
    }
}

impl ConstitutiveModel for FixedCorotated {
    fn kirchhoff_stress(&self, deformation_gradient: &Mat) -> Mat {
        #![allow(non_snake_case)]
        let F = deformation_gradient;
        let (R, J) = polar_rotation(F);

        let mu_term = 2. * self.0.mu * (F - R) * F.transpose();
        let lambda_term = Mat::from_diagonal_element(self.0.lambda * J * (J - 1.));

        mu_term + lambda_term
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn max_abs(m: &Mat) -> T {
        m.iter().fold(0., |acc, x| acc.max(x.abs()))
    }

    fn rotation(axis: TV, angle: T) -> Mat {
        *na::Rotation3::from_axis_angle(&na::Unit::new_normalize(axis), angle).matrix()
    }

    #[test]
    fn lame_parameters() {
        let params = IsotropicParameters::new(1e3, 0.2);
        assert!((params.mu - 1e3 / 2.4).abs() < 1e-9);
        assert!((params.lambda - 200. / 0.72).abs() < 1e-9);
    }

    #[test]
    fn no_stress_at_rest() {
        let model = FixedCorotated::default();
        let tau = model.kirchhoff_stress(&Mat::identity());
        assert!(max_abs(&tau) < 1e-9, "{:?}", tau);

        let R = rotation(TV::new(1., 2., 3.), 0.7);
        let tau = model.kirchhoff_stress(&R);
        assert!(max_abs(&tau) < 1e-9, "rigid rotation produced stress {:?}", tau);
    }

    #[test]
    fn uniform_dilation() {
        let params = IsotropicParameters::default();
        let model = FixedCorotated(params.clone());
        let s = 1.1;
        let J = s * s * s;

        let tau = model.kirchhoff_stress(&Mat::from_diagonal_element(s));
        let expected = 2. * params.mu * (s - 1.) * s + params.lambda * J * (J - 1.);

        assert!(max_abs(&(tau - Mat::from_diagonal_element(expected))) < 1e-9);
    }

    #[test]
    fn reflection_gives_proper_rotation() {
        let F = Mat::from_diagonal(&TV::new(1.2, 0.9, -0.8));
        let (U, sigma, V_t) = rotation_variant_svd(&F);

        assert!((U.determinant() - 1.).abs() < 1e-9);
        assert!((V_t.determinant() - 1.).abs() < 1e-9);
        assert!(max_abs(&(U * Mat::from_diagonal(&sigma) * V_t - F)) < 1e-9);

        let (R, J) = polar_rotation(&F);
        assert!((R.determinant() - 1.).abs() < 1e-9);
        assert!((J - F.determinant()).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn stress_is_rotation_equivariant(
            entries in proptest::collection::vec(-0.3f64..0.3, 9),
            axis in proptest::collection::vec(-1f64..1., 3),
            angle in -3f64..3.,
        ) {
            prop_assume!(TV::from_column_slice(&axis).norm() > 0.1);

            let F = Mat::identity() + Mat::from_column_slice(&entries);
            prop_assume!(F.determinant() > 0.2);

            let Q = rotation(TV::from_column_slice(&axis), angle);
            let model = FixedCorotated::default();

            let rotated = model.kirchhoff_stress(&(Q * F));
            let expected = Q * model.kirchhoff_stress(&F) * Q.transpose();

            prop_assert!(max_abs(&(rotated - expected)) < 1e-6 * (1. + max_abs(&expected)));
        }

        #[test]
        fn stress_is_symmetric(entries in proptest::collection::vec(-0.3f64..0.3, 9)) {
            let F = Mat::identity() + Mat::from_column_slice(&entries);
            prop_assume!(F.determinant() > 0.2);

            let tau = FixedCorotated::default().kirchhoff_stress(&F);
            prop_assert!(max_abs(&(tau - tau.transpose())) < 1e-6 * (1. + max_abs(&tau)));
        }
    }
}
