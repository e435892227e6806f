//! Grid builder trait
use crate::types::RealScalar;

/// An object that can be used to build a grid cell by cell
pub trait Builder {
    /// Scalar type
    type T: RealScalar;

    /// The type of the grid that the builder creates
    type Grid;

    /// Add a point to the grid
    fn add_point(&mut self, id: usize, data: &[Self::T]);

    /// Add a cell to the grid
    ///
    /// The cell's points are given in the dof order of the geometry element
    fn add_cell(&mut self, id: usize, points: &[usize]);

    /// Number of points added so far
    fn point_count(&self) -> usize;

    /// Number of cells added so far
    fn cell_count(&self) -> usize;

    /// Create the grid
    fn create_grid(self) -> Self::Grid;
}
