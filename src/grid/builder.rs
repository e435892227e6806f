//! Grid builder
use super::SingleElementGrid;
use crate::{traits::Builder, types::RealScalar};
use ndelement::{
    ciarlet::{lagrange, CiarletElement},
    traits::FiniteElement,
    types::{Continuity, ReferenceCellType},
};
use std::collections::HashMap;

/// Grid builder for a single element grid
#[derive(Debug)]
pub struct SingleElementGridBuilder<T: RealScalar> {
    gdim: usize,
    element_data: (ReferenceCellType, usize),
    points_per_cell: usize,
    points: Vec<T>,
    cells: Vec<usize>,
    point_indices_to_ids: Vec<usize>,
    point_ids_to_indices: HashMap<usize, usize>,
    cell_indices_to_ids: Vec<usize>,
    cell_ids_to_indices: HashMap<usize, usize>,
}

impl<T: RealScalar> SingleElementGridBuilder<T> {
    /// Create a new grid builder
    pub fn new(gdim: usize, data: (ReferenceCellType, usize)) -> Self {
        Self::new_with_capacity(gdim, 0, 0, data)
    }

    /// Create a new grid builder with capacity for a given number of points and cells
    pub fn new_with_capacity(
        gdim: usize,
        npoints: usize,
        ncells: usize,
        data: (ReferenceCellType, usize),
    ) -> Self {
        let points_per_cell = lagrange::create::<T>(data.0, data.1, Continuity::Standard).dim();
        Self {
            gdim,
            element_data: data,
            points_per_cell,
            points: Vec::with_capacity(npoints * gdim),
            cells: Vec::with_capacity(ncells * points_per_cell),
            point_indices_to_ids: Vec::with_capacity(npoints),
            point_ids_to_indices: HashMap::new(),
            cell_indices_to_ids: Vec::with_capacity(ncells),
            cell_ids_to_indices: HashMap::new(),
        }
    }

    /// True if a point with the given id has already been added
    pub fn contains_point(&self, id: usize) -> bool {
        self.point_ids_to_indices.contains_key(&id)
    }
}

impl<T: RealScalar> Builder for SingleElementGridBuilder<T> {
    type T = T;
    type Grid = SingleElementGrid<T, CiarletElement<T>>;

    fn add_point(&mut self, id: usize, data: &[T]) {
        if data.len() != self.gdim {
            panic!("Point has wrong number of coordinates");
        }
        if self.point_ids_to_indices.contains_key(&id) {
            panic!("Cannot add point with duplicate id.");
        }
        self.point_ids_to_indices
            .insert(id, self.point_indices_to_ids.len());
        self.point_indices_to_ids.push(id);
        self.points.extend_from_slice(data);
    }

    fn add_cell(&mut self, id: usize, points: &[usize]) {
        if self.cell_ids_to_indices.contains_key(&id) {
            panic!("Cannot add cell with duplicate id.");
        }
        assert_eq!(points.len(), self.points_per_cell);
        self.cell_ids_to_indices
            .insert(id, self.cell_indices_to_ids.len());
        self.cell_indices_to_ids.push(id);
        for id in points {
            self.cells.push(self.point_ids_to_indices[id]);
        }
    }

    fn point_count(&self) -> usize {
        self.point_indices_to_ids.len()
    }

    fn cell_count(&self) -> usize {
        self.cell_indices_to_ids.len()
    }

    fn create_grid(self) -> SingleElementGrid<T, CiarletElement<T>> {
        SingleElementGrid::new_from_raw_data(
            &self.points,
            self.gdim,
            &self.cells,
            self.element_data.0,
            self.element_data.1,
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    #[should_panic]
    fn test_duplicate_point_id() {
        let mut b = SingleElementGridBuilder::<f64>::new(2, (ReferenceCellType::Triangle, 1));

        b.add_point(2, &[0.0, 0.0]);
        b.add_point(0, &[1.0, 0.0]);
        b.add_point(1, &[0.0, 1.0]);
        b.add_point(2, &[1.0, 1.0]);
    }

    #[test]
    #[should_panic]
    fn test_duplicate_cell_id() {
        let mut b = SingleElementGridBuilder::<f64>::new(2, (ReferenceCellType::Triangle, 1));

        b.add_point(0, &[0.0, 0.0]);
        b.add_point(1, &[1.0, 0.0]);
        b.add_point(2, &[0.0, 1.0]);
        b.add_point(3, &[1.0, 1.0]);

        b.add_cell(0, &[0, 1, 2]);
        b.add_cell(0, &[1, 2, 3]);
    }

    #[test]
    fn test_non_contiguous_ids() {
        let mut b = SingleElementGridBuilder::<f64>::new(2, (ReferenceCellType::Triangle, 1));

        b.add_point(0, &[0.0, 0.0]);
        b.add_point(1, &[1.0, 0.0]);
        b.add_point(2, &[0.0, 1.0]);
        b.add_point(4, &[1.0, 1.0]);

        b.add_cell(0, &[0, 1, 2]);
        b.add_cell(2, &[1, 2, 4]);

        b.create_grid();
    }
}
