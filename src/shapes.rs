//! Functions to create simple example grids
use crate::{
    dofmap,
    grid::{SingleElementGrid, SingleElementGridBuilder},
    traits::Builder,
    types::RealScalar,
};
use ndelement::{
    ciarlet::{lagrange, CiarletElement},
    traits::FiniteElement,
    types::{Continuity, ReferenceCellType},
};
use rlst::{rlst_array_from_slice2, rlst_dynamic_array4};

/// Assemble a grid over the unit square/cube from cells given by the integer
/// coordinates of their corners, placing geometry points on the global lattice
/// with `extent[d] * degree + 1` points along axis `d`
fn build_grid<T: RealScalar>(
    gdim: usize,
    extent: [usize; 3],
    cells: &[Vec<[usize; 3]>],
    degree: usize,
    cell_type: ReferenceCellType,
) -> SingleElementGrid<T, CiarletElement<T>> {
    let element = lagrange::create::<T>(cell_type, degree, Continuity::Standard);
    let nodes = dofmap::reference_interpolation_points(&element, degree).unwrap();
    let nodes_per_cell = nodes.len() / gdim;

    let linear = lagrange::create::<T>(cell_type, 1, Continuity::Standard);
    let rlst_nodes = rlst_array_from_slice2!(nodes.as_slice(), [gdim, nodes_per_cell]);
    let mut weights = rlst_dynamic_array4!(T, linear.tabulate_array_shape(0, nodes_per_cell));
    linear.tabulate(&rlst_nodes, 0, &mut weights);

    let mut b = SingleElementGridBuilder::<T>::new(gdim, (cell_type, degree));
    for (cell_id, corners) in cells.iter().enumerate() {
        let mut cell_points = Vec::with_capacity(nodes_per_cell);
        for node in 0..nodes_per_cell {
            let mut x = vec![T::zero(); gdim];
            for (v, corner) in corners.iter().enumerate() {
                let w = weights[[0, node, v, 0]];
                for (xd, c) in x.iter_mut().zip(corner) {
                    *xd += w * T::from(*c).unwrap();
                }
            }
            let mut id = 0;
            for d in (0..gdim).rev() {
                let lattice = (x[d] * T::from(degree).unwrap()).to_f64().unwrap().round() as usize;
                id = id * (extent[d] * degree + 1) + lattice;
            }
            if !b.contains_point(id) {
                let mut coords = vec![T::zero(); gdim];
                for (c, (xd, e)) in coords.iter_mut().zip(x.iter().zip(extent)) {
                    *c = *xd / T::from(e).unwrap();
                }
                b.add_point(id, &coords);
            }
            cell_points.push(id);
        }
        b.add_cell(cell_id, &cell_points);
    }
    b.create_grid()
}

/// Create a grid of the unit square
///
/// The unit square is divided into an `nx` by `ny` grid of squares, each of
/// which is one quadrilateral cell or two triangle cells; the geometry of
/// every cell has the given degree.
pub fn unit_square<T: RealScalar>(
    nx: usize,
    ny: usize,
    degree: usize,
    cell_type: ReferenceCellType,
) -> SingleElementGrid<T, CiarletElement<T>> {
    let mut cells = vec![];
    for j in 0..ny {
        for i in 0..nx {
            match cell_type {
                ReferenceCellType::Quadrilateral => {
                    cells.push(vec![
                        [i, j, 0],
                        [i + 1, j, 0],
                        [i, j + 1, 0],
                        [i + 1, j + 1, 0],
                    ]);
                }
                ReferenceCellType::Triangle => {
                    cells.push(vec![[i, j, 0], [i + 1, j, 0], [i, j + 1, 0]]);
                    cells.push(vec![[i + 1, j, 0], [i + 1, j + 1, 0], [i, j + 1, 0]]);
                }
                _ => {
                    panic!("Unsupported cell type: {cell_type:?}");
                }
            }
        }
    }
    build_grid(2, [nx, ny, 1], &cells, degree, cell_type)
}

/// Create a grid of the unit cube
///
/// The unit cube is divided into an `nx` by `ny` by `nz` grid of cubes, each
/// of which is one hexahedron cell, two prism cells or six tetrahedron cells;
/// the geometry of every cell has the given degree.
pub fn unit_cube<T: RealScalar>(
    nx: usize,
    ny: usize,
    nz: usize,
    degree: usize,
    cell_type: ReferenceCellType,
) -> SingleElementGrid<T, CiarletElement<T>> {
    let mut cells = vec![];
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let corner =
                    |dx: usize, dy: usize, dz: usize| -> [usize; 3] { [i + dx, j + dy, k + dz] };
                match cell_type {
                    ReferenceCellType::Hexahedron => {
                        cells.push(vec![
                            corner(0, 0, 0),
                            corner(1, 0, 0),
                            corner(0, 1, 0),
                            corner(1, 1, 0),
                            corner(0, 0, 1),
                            corner(1, 0, 1),
                            corner(0, 1, 1),
                            corner(1, 1, 1),
                        ]);
                    }
                    ReferenceCellType::Prism => {
                        cells.push(vec![
                            corner(0, 0, 0),
                            corner(1, 0, 0),
                            corner(0, 1, 0),
                            corner(0, 0, 1),
                            corner(1, 0, 1),
                            corner(0, 1, 1),
                        ]);
                        cells.push(vec![
                            corner(1, 0, 0),
                            corner(1, 1, 0),
                            corner(0, 1, 0),
                            corner(1, 0, 1),
                            corner(1, 1, 1),
                            corner(0, 1, 1),
                        ]);
                    }
                    ReferenceCellType::Tetrahedron => {
                        for axes in [
                            [0, 1, 2],
                            [0, 2, 1],
                            [1, 0, 2],
                            [1, 2, 0],
                            [2, 0, 1],
                            [2, 1, 0],
                        ] {
                            let mut vertex = [i, j, k];
                            let mut tet = vec![vertex];
                            for axis in axes {
                                vertex[axis] += 1;
                                tet.push(vertex);
                            }
                            cells.push(tet);
                        }
                    }
                    _ => {
                        panic!("Unsupported cell type: {cell_type:?}");
                    }
                }
            }
        }
    }
    build_grid(3, [nx, ny, nz], &cells, degree, cell_type)
}
