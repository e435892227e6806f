//! Geometry map
use crate::{
    traits::GeometryMap as GeometryMapTrait,
    types::{Array2D, ArrayND, RealScalar},
};
use ndelement::{reference_cell, traits::FiniteElement, types::ReferenceCellType};
use rlst::{rlst_dynamic_array4, RandomAccessByRef, Shape};

/// Map from a reference cell to the physical cells of a single element grid
///
/// The geometry basis is tabulated once at the reference points; mapping a cell
/// is a contraction of the table with the cell's geometry points.
#[derive(Debug)]
pub struct GeometryMap<'a, T: RealScalar> {
    geometry_points: &'a Array2D<T>,
    cells: &'a Array2D<usize>,
    tdim: usize,
    gdim: usize,
    table: ArrayND<4, T>,
}

impl<'a, T: RealScalar> GeometryMap<'a, T> {
    /// Create new
    pub fn new<A2D: RandomAccessByRef<2, Item = T> + Shape<2>>(
        element: &impl FiniteElement<CellType = ReferenceCellType, T = T>,
        points: &A2D,
        geometry_points: &'a Array2D<T>,
        cells: &'a Array2D<usize>,
    ) -> Self {
        let tdim = reference_cell::dim(element.cell_type());
        debug_assert!(points.shape()[0] == tdim);
        let gdim = geometry_points.shape()[0];
        let npoints = points.shape()[1];

        let mut table = rlst_dynamic_array4!(T, element.tabulate_array_shape(0, npoints));
        element.tabulate(points, 0, &mut table);

        Self {
            geometry_points,
            cells,
            tdim,
            gdim,
            table,
        }
    }
}

impl<T: RealScalar> GeometryMapTrait for GeometryMap<'_, T> {
    type T = T;

    fn topology_dimension(&self) -> usize {
        self.tdim
    }
    fn geometry_dimension(&self) -> usize {
        self.gdim
    }
    fn point_count(&self) -> usize {
        self.table.shape()[1]
    }
    fn points(&self, cell_index: usize, points: &mut [T]) {
        let npts = self.table.shape()[1];
        debug_assert!(points.len() == self.gdim * npts);

        points.fill(T::zero());
        for i in 0..self.cells.shape()[0] {
            let v = self.cells[[i, cell_index]];
            for point_index in 0..npts {
                let t = self.table[[0, point_index, i, 0]];
                for gd in 0..self.gdim {
                    points[gd + self.gdim * point_index] += self.geometry_points[[gd, v]] * t;
                }
            }
        }
    }
    fn evaluate(&self, cell_index: usize, data: &[T], values: &mut [T]) {
        let npts = self.table.shape()[1];
        debug_assert!(values.len() == npts);

        values.fill(T::zero());
        for i in 0..self.cells.shape()[0] {
            let d = data[self.cells[[i, cell_index]]];
            for (point_index, value) in values.iter_mut().enumerate() {
                *value += self.table[[0, point_index, i, 0]] * d;
            }
        }
    }
}
