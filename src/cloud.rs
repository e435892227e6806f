//! Point cloud extraction
//!
//! Search engines consume the grid as a flat dimension-major buffer: all
//! first coordinates, then all second coordinates, then all third. Within a
//! dimension the values are ordered cell by cell, each cell contributing its
//! nodes in lexicographic order.
use crate::traits::{GeometryMap, Grid};

/// Build the point cloud of a grid of tensor-product cells
///
/// Each cell's geometry points are reordered with `lex_map` (see
/// [`crate::dofmap::lex_dof_map`]).
pub fn tensor_point_cloud<G: Grid>(grid: &G, lex_map: &[usize]) -> Vec<G::T> {
    let gdim = grid.geometry_dim();
    let points_per_cell = lex_map.len();
    let npts = grid.cell_count() * points_per_cell;

    let mut cloud = vec![G::T::zero(); gdim * npts];
    for cell in 0..grid.cell_count() {
        let cell_points = grid.cell_points(cell);
        for (j, &lex) in lex_map.iter().enumerate() {
            let x = grid.point(cell_points[lex]);
            for d in 0..gdim {
                cloud[d * npts + cell * points_per_cell + j] = x[d];
            }
        }
    }
    cloud
}

/// Build the point cloud of a grid of simplex cells
///
/// `map` must be the grid's geometry map at the integration points of the
/// cell type's reference sub-mesh: each cell's own geometry is evaluated at
/// those points, so curved cells contribute their true shape.
pub fn simplex_point_cloud<G: Grid>(grid: &G, map: &G::GeometryMap<'_>) -> Vec<G::T> {
    let gdim = grid.geometry_dim();
    let points_per_cell = map.point_count();
    let npts = grid.cell_count() * points_per_cell;

    let mut cloud = vec![G::T::zero(); gdim * npts];
    let mut mapped = vec![G::T::zero(); gdim * points_per_cell];
    for cell in 0..grid.cell_count() {
        map.points(cell, &mut mapped);
        for p in 0..points_per_cell {
            for d in 0..gdim {
                cloud[d * npts + cell * points_per_cell + p] = mapped[d + gdim * p];
            }
        }
    }
    cloud
}
