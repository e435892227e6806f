//! Grid functions
use crate::traits::Grid;

/// A function given by nodal values at a grid's geometry points
///
/// Vector-valued functions are stored component-major: all values of component
/// 0, then all values of component 1, and so on. A single component is an
/// offset view into the same storage, so no data is copied when a vector
/// function is sampled component by component.
#[derive(Debug)]
pub struct GridFunction<'a, G: Grid> {
    grid: &'a G,
    data: &'a [G::T],
    components: usize,
}

impl<'a, G: Grid> GridFunction<'a, G> {
    /// Create new
    pub fn new(grid: &'a G, data: &'a [G::T], components: usize) -> Self {
        assert_eq!(
            data.len(),
            components * grid.point_count(),
            "Grid function data has wrong length"
        );
        Self {
            grid,
            data,
            components,
        }
    }

    /// The grid this function is defined on
    pub fn grid(&self) -> &'a G {
        self.grid
    }

    /// Number of components
    pub fn component_count(&self) -> usize {
        self.components
    }

    /// Nodal values of one component
    pub fn component(&self, component: usize) -> &'a [G::T] {
        let npts = self.grid.point_count();
        &self.data[component * npts..(component + 1) * npts]
    }

    /// Values of one component at the dofs of a cell, in the element's dof order
    pub fn cell_values(&self, component: usize, cell: usize, values: &mut [G::T]) {
        let data = self.component(component);
        for (value, index) in values.iter_mut().zip(self.grid.cell_points(cell)) {
            *value = data[*index];
        }
    }
}

impl<G: Grid> Clone for GridFunction<'_, G> {
    fn clone(&self) -> Self {
        Self {
            grid: self.grid,
            data: self.data,
            components: self.components,
        }
    }
}
