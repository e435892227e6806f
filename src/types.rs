//! Types

use ndelement::types::ReferenceCellType;
use num::Float;
use rlst::{DynamicArray, RlstScalar};
use thiserror::Error;

/// Scalar types usable for grid coordinates and field values
pub trait RealScalar: Float + RlstScalar<Real = Self> {}

impl<T: Float + RlstScalar<Real = T>> RealScalar for T {}

/// A 2-dimensional array
pub type Array2D<T> = DynamicArray<T, 2>;

/// An N-dimensional array
pub type ArrayND<const N: usize, T> = DynamicArray<T, N>;

/// An error that can occur while preparing a grid for point searches
#[derive(Error, Debug)]
pub enum SearchError {
    /// Cell type is not one of the supported kinds
    #[error("Unsupported cell type: {0:?}")]
    UnsupportedCellType(ReferenceCellType),
    /// Geometry degree cannot be searched
    #[error("Unsupported geometry degree: {0}")]
    UnsupportedDegree(usize),
    /// Geometry dimension cannot be searched
    #[error("Unsupported dimension: {0}")]
    UnsupportedDimension(usize),
    /// The geometry element is not nodal on the reference point lattice
    #[error("Geometry basis is not a nodal tensor-product basis")]
    NonTensorBasis,
    /// The grid contains no cells
    #[error("Grid contains no cells")]
    EmptyGrid,
}

/// Outcome of locating a single query point
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum QueryCode {
    /// The point lies inside a cell
    Internal,
    /// The point lies on the boundary of a cell
    Border,
    /// The point was not found in any cell
    NotFound,
}

/// Results of a point search, one entry per query point
///
/// For simplex grids, `cells` holds sub-cell indices: the owning grid cell is
/// `cells[i] / sub_cell_count` and the reference coordinate is relative to the
/// sub-cell of the reference sub-mesh.
#[derive(Debug, Clone)]
pub struct FoundPoints<T: RealScalar> {
    /// Status of each query point
    pub codes: Vec<QueryCode>,
    /// Rank of the process owning each query point
    pub procs: Vec<usize>,
    /// Cell in which each query point was found
    pub cells: Vec<usize>,
    /// Reference coordinates of each query point, `dim` values per point
    pub reference_coords: Vec<T>,
    /// Distance between each query point and the mapped reference coordinate
    pub dists: Vec<T>,
}

impl<T: RealScalar> FoundPoints<T> {
    /// Number of query points
    pub fn len(&self) -> usize {
        self.codes.len()
    }
    /// True if there are no query points
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
