use crate::math::*;

/// Contains all of the particle data: position, velocity, deformation gradient, etc.
///
/// Every particle has the same mass and initial volume, so those live in `MpmParameters`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MpmParticles {
    pub position: Vec<TV>,
    pub velocity: Vec<TV>,
    /// The APIC affine velocity matrix `C`
    pub affine_matrix: Vec<Mat>,
    pub deformation_gradient: Vec<Mat>,
    /// Plastic volume ratio `Jp`. Stays at 1 for purely elastic materials.
    pub plastic_scalar: Vec<T>,
    pub material: Vec<u32>,
}

impl MpmParticles {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            position: Vec::with_capacity(capacity),
            velocity: Vec::with_capacity(capacity),
            affine_matrix: Vec::with_capacity(capacity),
            deformation_gradient: Vec::with_capacity(capacity),
            plastic_scalar: Vec::with_capacity(capacity),
            material: Vec::with_capacity(capacity),
        }
    }

    /// Adds a new, undeformed particle at the given position.
    pub fn add_particle(&mut self, position: TV, velocity: TV, material: u32) {
        self.position.push(position);
        self.velocity.push(velocity);
        self.affine_matrix.push(Mat::zeros());
        self.deformation_gradient.push(Mat::identity());
        self.plastic_scalar.push(1.);
        self.material.push(material);
    }

    /// Removes every particle, keeping the allocations.
    pub fn clear(&mut self) {
        self.position.clear();
        self.velocity.clear();
        self.affine_matrix.clear();
        self.deformation_gradient.clear();
        self.plastic_scalar.clear();
        self.material.clear();
    }

    pub fn len(&self) -> usize {
        self.position.len()
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }
}
