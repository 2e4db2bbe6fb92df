use crate::math::*;

/// Stores the metadata associated with the `MpmGrid`
#[derive(Debug, Clone, PartialEq)]
pub struct GridData {
    /// The total number of nodes in the grid
    pub num_cells: usize,
    /// The number of nodes in each direction
    pub size: UV,
    /// The grid spacing
    pub h: T,
    /// Reciprocal of the grid spacing, for efficient computation
    pub one_over_h: T,
}

impl GridData {
    /// Creates a grid with `resolution` nodes along each axis, spaced `h` apart, with node
    /// `(0, 0, 0)` at the origin.
    pub fn new(resolution: usize, h: T) -> GridData {
        let size = UV::from_element(resolution);
        let num_cells = size.iter().product();

        tracing::info!(
            "Using Grid w/ Size: [{}, {}, {}] and {} cells",
            size.x,
            size.y,
            size.z,
            num_cells
        );

        GridData {
            num_cells,
            size,
            h,
            one_over_h: 1. / h,
        }
    }

    pub fn coord_to_pos(&self, coord: UV) -> TV {
        coord.map(|c| c as T) * self.h
    }

    /// Flat index of a node, or `None` if the coordinate lies outside the grid.
    pub fn coord_to_index(&self, coord: IV) -> Option<usize> {
        let mut index = 0;
        let mut stride = 1;
        for i in 0..DIM {
            if coord[i] < 0 || coord[i] as usize >= self.size[i] {
                return None;
            }
            index += coord[i] as usize * stride;
            stride *= self.size[i];
        }
        Some(index)
    }

    pub fn index_to_coord(&self, mut i: usize) -> UV {
        let z = i / (self.size.x * self.size.y);
        i -= z * self.size.x * self.size.y;
        let y = i / self.size.x;
        let x = i % self.size.x;
        UV::new(x, y, z)
    }
}
