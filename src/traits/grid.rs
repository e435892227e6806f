//! Traits for a grid
use super::GeometryMap;
use crate::types::RealScalar;
use ndelement::{traits::FiniteElement, types::ReferenceCellType};

/// A grid in which every cell is the same element
pub trait Grid {
    /// Scalar type
    type T: RealScalar;

    /// The finite element describing the geometry of each cell
    type FE: FiniteElement<CellType = ReferenceCellType, T = Self::T>;

    /// Geometry map type
    type GeometryMap<'a>: GeometryMap<T = Self::T>
    where
        Self: 'a;

    /// Dimension of the geometry of this grid
    fn geometry_dim(&self) -> usize;

    /// Dimension of the topology of this grid
    fn topology_dim(&self) -> usize;

    /// Cell type of every cell of this grid
    fn cell_type(&self) -> ReferenceCellType;

    /// Polynomial degree of the geometry of every cell
    fn geometry_degree(&self) -> usize;

    /// The element describing the geometry of every cell
    fn element(&self) -> &Self::FE;

    /// Number of cells
    fn cell_count(&self) -> usize;

    /// Number of geometry points
    fn point_count(&self) -> usize;

    /// Coordinates of the geometry point with the given index
    fn point(&self, index: usize) -> &[Self::T];

    /// Geometry point indices of a cell, in the element's dof order
    fn cell_points(&self, cell: usize) -> &[usize];

    /// Geometry map from the reference cell to the physical cells at the given points
    ///
    /// `points` should have shape [topology_dim, npts] and use column-major ordering
    fn geometry_map(&self, points: &[Self::T]) -> Self::GeometryMap<'_>;
}
