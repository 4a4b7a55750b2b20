//! Lattice topology for a `size × size × height` volume.
//!
//! Sites are addressed by a linear index, layer-major and row-major within a
//! layer: `index = layer * size² + row * size + col`. Each site's face-sharing
//! neighbors are computed once and stored in a flat adjacency table so the
//! diffusion kernel and the reproduction logic read the same slices.

use serde::{Deserialize, Serialize};

/// Spatial position of a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
    pub layer: usize,
}

impl Coord {
    pub fn new(row: usize, col: usize, layer: usize) -> Self {
        Self { row, col, layer }
    }
}

/// Immutable lattice with precomputed 6-connected adjacency.
#[derive(Debug, Clone)]
pub struct Lattice {
    size: usize,
    height: usize,

    /// `offsets[i]..offsets[i + 1]` is the slice of `adjacency` for site `i`
    offsets: Vec<usize>,

    /// All neighbor lists, packed
    adjacency: Vec<usize>,
}

impl Lattice {
    /// Builds the lattice and its adjacency table.
    ///
    /// A zero `size` or `height` yields an empty lattice; configuration
    /// validation rejects those before a world is built.
    pub fn new(size: usize, height: usize) -> Self {
        let len = size * size * height;
        let mut offsets = Vec::with_capacity(len + 1);
        let mut adjacency = Vec::with_capacity(len * 6);

        offsets.push(0);
        for index in 0..len {
            push_face_neighbors(index, size, height, &mut adjacency);
            offsets.push(adjacency.len());
        }

        Self {
            size,
            height,
            offsets,
            adjacency,
        }
    }

    /// Edge length of one layer.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of layers.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of sites in one layer.
    pub fn layer_len(&self) -> usize {
        self.size * self.size
    }

    /// Total number of sites.
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Face-sharing neighbors of `index`.
    ///
    /// Order: row-1, row+1, col-1, col+1, layer-1, layer+1 (in-bounds only).
    ///
    /// # Panics
    /// Panics if `index >= self.len()`.
    #[inline]
    pub fn neighbors(&self, index: usize) -> &[usize] {
        &self.adjacency[self.offsets[index]..self.offsets[index + 1]]
    }

    /// Number of face-sharing neighbors of `index`.
    #[inline]
    pub fn degree(&self, index: usize) -> usize {
        self.offsets[index + 1] - self.offsets[index]
    }

    /// Converts a linear index to coordinates.
    pub fn coords(&self, index: usize) -> Coord {
        let layer_len = self.layer_len();
        let layer = index / layer_len;
        let rem = index % layer_len;
        Coord {
            row: rem / self.size,
            col: rem % self.size,
            layer,
        }
    }

    /// Converts coordinates to a linear index, or `None` outside the volume.
    pub fn index_of(&self, coord: Coord) -> Option<usize> {
        if coord.row >= self.size || coord.col >= self.size || coord.layer >= self.height {
            return None;
        }
        Some(coord.layer * self.layer_len() + coord.row * self.size + coord.col)
    }

    /// Index of the site at the center of the given layer.
    pub fn layer_center(&self, layer: usize) -> Option<usize> {
        self.index_of(Coord::new(self.size / 2, self.size / 2, layer))
    }
}

fn push_face_neighbors(index: usize, size: usize, height: usize, out: &mut Vec<usize>) {
    let layer_len = size * size;
    let layer = index / layer_len;
    let rem = index % layer_len;
    let row = rem / size;
    let col = rem % size;

    if row > 0 {
        out.push(index - size);
    }
    if row + 1 < size {
        out.push(index + size);
    }
    if col > 0 {
        out.push(index - 1);
    }
    if col + 1 < size {
        out.push(index + 1);
    }
    if layer > 0 {
        out.push(index - layer_len);
    }
    if layer + 1 < height {
        out.push(index + layer_len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_coords_roundtrip_small_volume() {
        let lattice = Lattice::new(4, 3);
        assert_eq!(lattice.len(), 48);

        for index in 0..lattice.len() {
            let coord = lattice.coords(index);
            assert_eq!(lattice.index_of(coord), Some(index));
        }
    }

    #[test]
    fn test_index_layout_is_layer_major() {
        let lattice = Lattice::new(3, 2);
        assert_eq!(lattice.coords(0), Coord::new(0, 0, 0));
        assert_eq!(lattice.coords(1), Coord::new(0, 1, 0));
        assert_eq!(lattice.coords(3), Coord::new(1, 0, 0));
        assert_eq!(lattice.coords(9), Coord::new(0, 0, 1));
        assert_eq!(lattice.index_of(Coord::new(3, 0, 0)), None);
        assert_eq!(lattice.index_of(Coord::new(0, 0, 2)), None);
    }

    #[test]
    fn test_boundary_degrees() {
        let lattice = Lattice::new(3, 3);
        let at = |r, c, l| lattice.index_of(Coord::new(r, c, l)).unwrap();

        assert_eq!(lattice.degree(at(0, 0, 0)), 3); // corner
        assert_eq!(lattice.degree(at(0, 1, 0)), 4); // edge
        assert_eq!(lattice.degree(at(1, 1, 0)), 5); // face
        assert_eq!(lattice.degree(at(1, 1, 1)), 6); // interior
    }

    #[test]
    fn test_single_layer_center_has_four_neighbors() {
        let lattice = Lattice::new(3, 1);
        let center = lattice.layer_center(0).unwrap();
        assert_eq!(center, 4);

        let mut neighbors = lattice.neighbors(center).to_vec();
        neighbors.sort_unstable();
        assert_eq!(neighbors, vec![1, 3, 5, 7]);
    }

    #[test]
    fn test_neighbor_order() {
        let lattice = Lattice::new(3, 3);
        // Interior site 13 = (1, 1, 1)
        assert_eq!(lattice.neighbors(13), &[10, 16, 12, 14, 4, 22]);
    }

    #[test]
    fn test_single_site_has_no_neighbors() {
        let lattice = Lattice::new(1, 1);
        assert_eq!(lattice.len(), 1);
        assert!(lattice.neighbors(0).is_empty());
    }

    proptest! {
        #[test]
        fn prop_neighbors_symmetric(size in 1usize..6, height in 1usize..5) {
            let lattice = Lattice::new(size, height);
            for i in 0..lattice.len() {
                for &j in lattice.neighbors(i) {
                    prop_assert!(lattice.neighbors(j).contains(&i));
                }
            }
        }

        #[test]
        fn prop_neighbors_differ_by_one_step(size in 1usize..6, height in 1usize..5) {
            let lattice = Lattice::new(size, height);
            for i in 0..lattice.len() {
                let a = lattice.coords(i);
                prop_assert!(lattice.degree(i) <= 6);
                for &j in lattice.neighbors(i) {
                    let b = lattice.coords(j);
                    let dist = a.row.abs_diff(b.row)
                        + a.col.abs_diff(b.col)
                        + a.layer.abs_diff(b.layer);
                    prop_assert_eq!(dist, 1);
                }
            }
        }
    }
}
