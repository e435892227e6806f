//! Single element grid
use crate::{
    geometry::GeometryMap,
    traits::Grid,
    types::{Array2D, RealScalar},
};
use ndelement::{
    ciarlet::{CiarletElement, LagrangeElementFamily},
    reference_cell,
    traits::{ElementFamily, FiniteElement},
    types::{Continuity, ReferenceCellType},
};
use rlst::{rlst_array_from_slice2, rlst_dynamic_array2, RawAccess, RawAccessMut, Shape};

/// Grid in which every cell is the same element
///
/// Holds the geometry points in a [gdim, npoints] array and the cells as a
/// [points_per_cell, ncells] array of point indices in the element's dof order.
#[derive(Debug)]
pub struct SingleElementGrid<T: RealScalar, E: FiniteElement<CellType = ReferenceCellType, T = T>> {
    points: Array2D<T>,
    cells: Array2D<usize>,
    element: E,
    degree: usize,
}

impl<T: RealScalar> SingleElementGrid<T, CiarletElement<T>> {
    /// Create a grid from raw coordinate and connectivity data
    ///
    /// `coordinates` holds interleaved point coordinates (gdim values per point);
    /// `cells` holds the point indices of each cell in the element's dof order.
    pub fn new_from_raw_data(
        coordinates: &[T],
        gdim: usize,
        cells: &[usize],
        cell_type: ReferenceCellType,
        degree: usize,
    ) -> Self {
        let family = LagrangeElementFamily::<T>::new(degree, Continuity::Standard);
        let element = family.element(cell_type);
        let points_per_cell = element.dim();

        let npts = coordinates.len() / gdim;
        let mut points = rlst_dynamic_array2!(T, [gdim, npts]);
        points.data_mut().copy_from_slice(coordinates);

        let mut cell_array =
            rlst_dynamic_array2!(usize, [points_per_cell, cells.len() / points_per_cell]);
        cell_array.data_mut().copy_from_slice(cells);

        Self {
            points,
            cells: cell_array,
            element,
            degree,
        }
    }
}

impl<T: RealScalar, E: FiniteElement<CellType = ReferenceCellType, T = T>> Grid
    for SingleElementGrid<T, E>
{
    type T = T;
    type FE = E;
    type GeometryMap<'a>
        = GeometryMap<'a, T>
    where
        Self: 'a;

    fn geometry_dim(&self) -> usize {
        self.points.shape()[0]
    }
    fn topology_dim(&self) -> usize {
        reference_cell::dim(self.element.cell_type())
    }
    fn cell_type(&self) -> ReferenceCellType {
        self.element.cell_type()
    }
    fn geometry_degree(&self) -> usize {
        self.degree
    }
    fn element(&self) -> &E {
        &self.element
    }
    fn cell_count(&self) -> usize {
        self.cells.shape()[1]
    }
    fn point_count(&self) -> usize {
        self.points.shape()[1]
    }
    fn point(&self, index: usize) -> &[T] {
        let gdim = self.points.shape()[0];
        &self.points.data()[gdim * index..gdim * (index + 1)]
    }
    fn cell_points(&self, cell: usize) -> &[usize] {
        let ppc = self.cells.shape()[0];
        &self.cells.data()[ppc * cell..ppc * (cell + 1)]
    }
    fn geometry_map(&self, points: &[T]) -> GeometryMap<'_, T> {
        let tdim = self.topology_dim();
        let npoints = points.len() / tdim;
        let rlst_points = rlst_array_from_slice2!(points, [tdim, npoints]);
        GeometryMap::new(&self.element, &rlst_points, &self.points, &self.cells)
    }
}
