//! Splitting of simplex cells into tensor-product sub-cells
//!
//! Point search operates on per-cell tensor lattices, so triangles, tetrahedra
//! and prisms are covered by a fixed sub-mesh of quadrilaterals or hexahedra
//! whose union is exactly the reference cell. The sub-mesh is curved to the
//! degree of the grid's geometry, and the lattice of every sub-cell is pulled
//! back into the reference cell to form an integration-point table. The table
//! depends only on the cell type and degree: each physical cell maps it through
//! its own geometry, so curved cells trace out their true shape.
use crate::{
    dofmap,
    grid::{SingleElementGrid, SingleElementGridBuilder},
    traits::{Builder, Grid},
    types::{RealScalar, SearchError},
};
use ndelement::{
    ciarlet::{lagrange, CiarletElement},
    reference_cell,
    traits::FiniteElement,
    types::{Continuity, ReferenceCellType},
};
use rlst::{rlst_array_from_slice2, rlst_dynamic_array4};

/// Decomposition of a reference cell into tensor-product sub-cells
///
/// `vertices` holds interleaved reference coordinates; `connectivity` holds the
/// vertex indices of each sub-cell in the vertex order of `sub_cell_type`.
#[derive(Debug)]
pub struct SplitTable {
    /// Topological dimension of the cell
    pub tdim: usize,
    /// Cell type of the sub-cells
    pub sub_cell_type: ReferenceCellType,
    /// Reference coordinates of the sub-mesh vertices
    pub vertices: &'static [f64],
    /// Vertex indices of each sub-cell
    pub connectivity: &'static [usize],
}

const TRIANGLE_SPLIT: SplitTable = SplitTable {
    tdim: 2,
    sub_cell_type: ReferenceCellType::Quadrilateral,
    vertices: &[
        0.0, 0.0, //
        0.5, 0.0, //
        1.0, 0.0, //
        0.0, 0.5, //
        1.0 / 3.0, 1.0 / 3.0, //
        0.5, 0.5, //
        0.0, 1.0,
    ],
    connectivity: &[
        3, 4, 0, 1, //
        4, 5, 1, 2, //
        6, 5, 3, 4,
    ],
};

const TETRAHEDRON_SPLIT: SplitTable = SplitTable {
    tdim: 3,
    sub_cell_type: ReferenceCellType::Hexahedron,
    vertices: &[
        0.0, 0.0, 0.0, //
        1.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, //
        0.0, 0.0, 1.0, //
        0.5, 0.0, 0.0, //
        0.5, 0.5, 0.0, //
        0.0, 0.5, 0.0, //
        0.0, 0.0, 0.5, //
        0.5, 0.0, 0.5, //
        0.0, 0.5, 0.5, //
        1.0 / 3.0, 0.0, 1.0 / 3.0, //
        1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0, //
        0.0, 1.0 / 3.0, 1.0 / 3.0, //
        1.0 / 3.0, 1.0 / 3.0, 0.0, //
        0.25, 0.25, 0.25,
    ],
    connectivity: &[
        0, 4, 7, 10, 6, 13, 12, 14, //
        4, 1, 10, 8, 13, 5, 14, 11, //
        13, 5, 14, 11, 6, 2, 12, 9, //
        10, 8, 7, 3, 14, 11, 12, 9,
    ],
};

const PRISM_SPLIT: SplitTable = SplitTable {
    tdim: 3,
    sub_cell_type: ReferenceCellType::Hexahedron,
    vertices: &[
        0.0, 0.0, 0.0, //
        0.5, 0.0, 0.0, //
        1.0, 0.0, 0.0, //
        0.0, 0.5, 0.0, //
        1.0 / 3.0, 1.0 / 3.0, 0.0, //
        0.5, 0.5, 0.0, //
        0.0, 1.0, 0.0, //
        0.0, 0.0, 1.0, //
        0.5, 0.0, 1.0, //
        1.0, 0.0, 1.0, //
        0.0, 0.5, 1.0, //
        1.0 / 3.0, 1.0 / 3.0, 1.0, //
        0.5, 0.5, 1.0, //
        0.0, 1.0, 1.0,
    ],
    connectivity: &[
        3, 4, 0, 1, 10, 11, 7, 8, //
        4, 5, 1, 2, 11, 12, 8, 9, //
        6, 5, 3, 4, 13, 12, 10, 11,
    ],
};

/// The decomposition of a simplex cell type into tensor-product sub-cells
pub fn split_table(cell_type: ReferenceCellType) -> Result<&'static SplitTable, SearchError> {
    match cell_type {
        ReferenceCellType::Triangle => Ok(&TRIANGLE_SPLIT),
        ReferenceCellType::Tetrahedron => Ok(&TETRAHEDRON_SPLIT),
        ReferenceCellType::Prism => Ok(&PRISM_SPLIT),
        _ => Err(SearchError::UnsupportedCellType(cell_type)),
    }
}

/// A reference sub-mesh curved to a given degree, together with the
/// lexicographic integration-point table derived from its nodes
#[derive(Debug)]
pub struct SimplexSubMesh<T: RealScalar> {
    grid: SingleElementGrid<T, CiarletElement<T>>,
    integration_points: Vec<T>,
    sub_cell_count: usize,
    points_per_sub_cell: usize,
}

impl<T: RealScalar> SimplexSubMesh<T> {
    /// The sub-mesh grid
    pub fn grid(&self) -> &SingleElementGrid<T, CiarletElement<T>> {
        &self.grid
    }
    /// Reference coordinates of every sub-cell node, sub-cell by sub-cell and in
    /// lexicographic order within each sub-cell, as interleaved coordinates
    pub fn integration_points(&self) -> &[T] {
        &self.integration_points
    }
    /// Number of sub-cells
    pub fn sub_cell_count(&self) -> usize {
        self.sub_cell_count
    }
    /// Number of nodes of each sub-cell
    pub fn points_per_sub_cell(&self) -> usize {
        self.points_per_sub_cell
    }
    /// Total number of integration points
    pub fn point_count(&self) -> usize {
        self.sub_cell_count * self.points_per_sub_cell
    }
}

/// Split a simplex reference cell into a sub-mesh of tensor-product cells
/// curved to the given degree
pub fn split_reference_cell<T: RealScalar>(
    cell_type: ReferenceCellType,
    degree: usize,
) -> Result<SimplexSubMesh<T>, SearchError> {
    if degree == 0 {
        return Err(SearchError::UnsupportedDegree(0));
    }
    let table = split_table(cell_type)?;
    let tdim = table.tdim;
    let nvertices = reference_cell::entity_counts(table.sub_cell_type)[0];
    let sub_cell_count = table.connectivity.len() / nvertices;

    let sub_element = lagrange::create::<T>(table.sub_cell_type, degree, Continuity::Standard);
    let nodes = dofmap::reference_interpolation_points(&sub_element, degree)?;
    let nodes_per_cell = sub_element.dim();

    // Vertex weights of the multilinear map at each node of a sub-cell.
    let linear = lagrange::create::<T>(table.sub_cell_type, 1, Continuity::Standard);
    let rlst_nodes = rlst_array_from_slice2!(nodes.as_slice(), [tdim, nodes_per_cell]);
    let mut weights = rlst_dynamic_array4!(T, linear.tabulate_array_shape(0, nodes_per_cell));
    linear.tabulate(&rlst_nodes, 0, &mut weights);

    let mut b = SingleElementGridBuilder::<T>::new(tdim, (table.sub_cell_type, degree));
    let mut point_id = 0;
    for (cell_id, cell) in table.connectivity.chunks(nvertices).enumerate() {
        let mut cell_points = Vec::with_capacity(nodes_per_cell);
        for node in 0..nodes_per_cell {
            let mut x = vec![T::zero(); tdim];
            for (v, vertex) in cell.iter().enumerate() {
                let w = weights[[0, node, v, 0]];
                for (xd, d) in x.iter_mut().zip(0..tdim) {
                    *xd += w * T::from(table.vertices[tdim * vertex + d]).unwrap();
                }
            }
            b.add_point(point_id, &x);
            cell_points.push(point_id);
            point_id += 1;
        }
        b.add_cell(cell_id, &cell_points);
    }
    let grid = b.create_grid();

    // Reorder each sub-cell's nodes into lexicographic order.
    let lex_map = dofmap::lex_dof_map(grid.element(), degree)?;
    let mut integration_points = Vec::with_capacity(tdim * sub_cell_count * nodes_per_cell);
    for cell in 0..sub_cell_count {
        let cell_points = grid.cell_points(cell);
        for &lex in &lex_map {
            integration_points.extend_from_slice(grid.point(cell_points[lex]));
        }
    }

    Ok(SimplexSubMesh {
        grid,
        integration_points,
        sub_cell_count,
        points_per_sub_cell: nodes_per_cell,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use itertools::izip;
    use rlst::{rlst_dynamic_array2, RandomAccessMut};

    /// Sum of the volumes of the sub-cells, by tensor Gauss quadrature of the
    /// multilinear map's Jacobian determinant
    fn sub_mesh_volume(table: &SplitTable) -> f64 {
        let tdim = table.tdim;
        let nvertices = reference_cell::entity_counts(table.sub_cell_type)[0];
        let gauss = [0.5 - 0.5 / 3.0_f64.sqrt(), 0.5 + 0.5 / 3.0_f64.sqrt()];

        let npts = 1 << tdim;
        let mut points = rlst_dynamic_array2!(f64, [tdim, npts]);
        for p in 0..npts {
            for d in 0..tdim {
                *points.get_mut([d, p]).unwrap() = gauss[(p >> d) & 1];
            }
        }
        let linear = lagrange::create::<f64>(table.sub_cell_type, 1, Continuity::Standard);
        let mut derivs = rlst_dynamic_array4!(f64, linear.tabulate_array_shape(1, npts));
        linear.tabulate(&points, 1, &mut derivs);

        let mut volume = 0.0;
        for cell in table.connectivity.chunks(nvertices) {
            for p in 0..npts {
                let mut jac = [[0.0; 3]; 3];
                for (v, vertex) in cell.iter().enumerate() {
                    for td in 0..tdim {
                        let dw = derivs[[1 + td, p, v, 0]];
                        for gd in 0..tdim {
                            jac[gd][td] += table.vertices[tdim * vertex + gd] * dw;
                        }
                    }
                }
                let det = if tdim == 2 {
                    jac[0][0] * jac[1][1] - jac[0][1] * jac[1][0]
                } else {
                    jac[0][0] * (jac[1][1] * jac[2][2] - jac[1][2] * jac[2][1])
                        - jac[0][1] * (jac[1][0] * jac[2][2] - jac[1][2] * jac[2][0])
                        + jac[0][2] * (jac[1][0] * jac[2][1] - jac[1][1] * jac[2][0])
                };
                volume += det.abs() / npts as f64;
            }
        }
        volume
    }

    #[test]
    fn test_triangle_split_volume() {
        assert_relative_eq!(sub_mesh_volume(&TRIANGLE_SPLIT), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_tetrahedron_split_volume() {
        assert_relative_eq!(
            sub_mesh_volume(&TETRAHEDRON_SPLIT),
            1.0 / 6.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_prism_split_volume() {
        assert_relative_eq!(sub_mesh_volume(&PRISM_SPLIT), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_triangle_sub_mesh_points_cover_reference_cell() {
        let sub_mesh = split_reference_cell::<f64>(ReferenceCellType::Triangle, 3).unwrap();
        assert_eq!(sub_mesh.sub_cell_count(), 3);
        assert_eq!(sub_mesh.points_per_sub_cell(), 16);
        assert_eq!(sub_mesh.point_count(), 48);
        for point in sub_mesh.integration_points().chunks(2) {
            assert!(point[0] > -1e-12);
            assert!(point[1] > -1e-12);
            assert!(point[0] + point[1] < 1.0 + 1e-12);
        }
    }

    #[test]
    fn test_tetrahedron_sub_mesh_points_cover_reference_cell() {
        let sub_mesh = split_reference_cell::<f64>(ReferenceCellType::Tetrahedron, 2).unwrap();
        assert_eq!(sub_mesh.sub_cell_count(), 4);
        assert_eq!(sub_mesh.point_count(), 4 * 27);
        for point in sub_mesh.integration_points().chunks(3) {
            for x in point {
                assert!(*x > -1e-12);
            }
            assert!(point.iter().sum::<f64>() < 1.0 + 1e-12);
        }
    }

    #[test]
    fn test_prism_sub_mesh_points_cover_reference_cell() {
        let sub_mesh = split_reference_cell::<f64>(ReferenceCellType::Prism, 2).unwrap();
        assert_eq!(sub_mesh.sub_cell_count(), 3);
        assert_eq!(sub_mesh.point_count(), 3 * 27);
        for point in sub_mesh.integration_points().chunks(3) {
            assert!(point[0] > -1e-12);
            assert!(point[1] > -1e-12);
            assert!(point[0] + point[1] < 1.0 + 1e-12);
            assert!(point[2] > -1e-12 && point[2] < 1.0 + 1e-12);
        }
    }

    #[test]
    fn test_vertices_appear_in_sub_mesh() {
        let sub_mesh = split_reference_cell::<f64>(ReferenceCellType::Triangle, 1).unwrap();
        for vertex in [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]] {
            assert!(sub_mesh
                .integration_points()
                .chunks(2)
                .any(|p| izip!(p, &vertex).all(|(a, b)| (a - b).abs() < 1e-12)));
        }
    }

    #[test]
    fn test_tensor_cells_are_not_split() {
        assert!(split_table(ReferenceCellType::Quadrilateral).is_err());
        assert!(split_table(ReferenceCellType::Hexahedron).is_err());
    }

    #[test]
    fn test_degree_zero_is_rejected() {
        assert!(matches!(
            split_reference_cell::<f64>(ReferenceCellType::Triangle, 0),
            Err(SearchError::UnsupportedDegree(0))
        ));
    }
}
