//! Lexicographic dof maps
//!
//! A nodal element numbers its dofs by sub-entity (vertices, then edges, then
//! faces, then interiors). Point search works on per-cell tensor lattices with
//! the first axis varying fastest, so the two orderings have to be reconciled.
//! The permutations are recovered from the basis itself: tabulating a nodal
//! basis at its own interpolation points gives a permuted identity matrix.
use crate::types::{RealScalar, SearchError};
use ndelement::{reference_cell, traits::FiniteElement, types::ReferenceCellType};
use rlst::{rlst_array_from_slice2, rlst_dynamic_array4};

/// Reference point lattice of a cell type at the given degree, in lexicographic
/// order (first coordinate varying fastest), as interleaved coordinates
pub fn reference_lattice<T: RealScalar>(
    cell_type: ReferenceCellType,
    degree: usize,
) -> Result<Vec<T>, SearchError> {
    if degree == 0 {
        return Err(SearchError::UnsupportedDegree(0));
    }
    let h = T::one() / T::from(degree).unwrap();
    let coord = |i: usize| T::from(i).unwrap() * h;
    let mut pts = vec![];
    match cell_type {
        ReferenceCellType::Quadrilateral => {
            for j in 0..=degree {
                for i in 0..=degree {
                    pts.extend_from_slice(&[coord(i), coord(j)]);
                }
            }
        }
        ReferenceCellType::Hexahedron => {
            for k in 0..=degree {
                for j in 0..=degree {
                    for i in 0..=degree {
                        pts.extend_from_slice(&[coord(i), coord(j), coord(k)]);
                    }
                }
            }
        }
        ReferenceCellType::Triangle => {
            for j in 0..=degree {
                for i in 0..=degree - j {
                    pts.extend_from_slice(&[coord(i), coord(j)]);
                }
            }
        }
        ReferenceCellType::Tetrahedron => {
            for k in 0..=degree {
                for j in 0..=degree - k {
                    for i in 0..=degree - j - k {
                        pts.extend_from_slice(&[coord(i), coord(j), coord(k)]);
                    }
                }
            }
        }
        ReferenceCellType::Prism => {
            for k in 0..=degree {
                for j in 0..=degree {
                    for i in 0..=degree - j {
                        pts.extend_from_slice(&[coord(i), coord(j), coord(k)]);
                    }
                }
            }
        }
        _ => {
            return Err(SearchError::UnsupportedCellType(cell_type));
        }
    }
    Ok(pts)
}

/// Match each of `points` (interleaved, tdim values per point) to the basis
/// function of `element` that is one there and zero at every other point
fn nodal_permutation<T: RealScalar>(
    element: &impl FiniteElement<CellType = ReferenceCellType, T = T>,
    points: &[T],
) -> Result<Vec<usize>, SearchError> {
    let tdim = reference_cell::dim(element.cell_type());
    let npts = points.len() / tdim;
    if element.dim() != npts {
        return Err(SearchError::NonTensorBasis);
    }

    let rlst_points = rlst_array_from_slice2!(points, [tdim, npts]);
    let mut table = rlst_dynamic_array4!(T, element.tabulate_array_shape(0, npts));
    element.tabulate(&rlst_points, 0, &mut table);

    let tol = T::from(1e-6).unwrap();
    let mut map = Vec::with_capacity(npts);
    let mut used = vec![false; npts];
    for point_index in 0..npts {
        let mut found = None;
        for i in 0..npts {
            if (table[[0, point_index, i, 0]] - T::one()).abs() < tol {
                if found.is_some() {
                    return Err(SearchError::NonTensorBasis);
                }
                found = Some(i);
            }
        }
        match found {
            Some(i) if !used[i] => {
                used[i] = true;
                map.push(i);
            }
            _ => {
                return Err(SearchError::NonTensorBasis);
            }
        }
    }
    Ok(map)
}

/// Map from lexicographic point indices to the native dof indices of `element`
///
/// Entry `i` of the result is the dof whose interpolation point is the `i`th
/// point of the lexicographic lattice. Only tensor-product cells admit such a
/// map; for other cells, and for elements that are not nodal on the lattice,
/// this fails so that unsupported setups are rejected before any search runs.
pub fn lex_dof_map<T: RealScalar>(
    element: &impl FiniteElement<CellType = ReferenceCellType, T = T>,
    degree: usize,
) -> Result<Vec<usize>, SearchError> {
    match element.cell_type() {
        ReferenceCellType::Quadrilateral | ReferenceCellType::Hexahedron => {}
        _ => {
            return Err(SearchError::NonTensorBasis);
        }
    }
    let lattice = reference_lattice::<T>(element.cell_type(), degree)?;
    nodal_permutation(element, &lattice)
}

/// Interpolation points of a nodal element in native dof order, interleaved
pub fn reference_interpolation_points<T: RealScalar>(
    element: &impl FiniteElement<CellType = ReferenceCellType, T = T>,
    degree: usize,
) -> Result<Vec<T>, SearchError> {
    let tdim = reference_cell::dim(element.cell_type());
    let lattice = reference_lattice::<T>(element.cell_type(), degree)?;
    let map = nodal_permutation(element, &lattice)?;

    let mut points = vec![T::zero(); lattice.len()];
    for (lex_index, &dof) in map.iter().enumerate() {
        points[tdim * dof..tdim * (dof + 1)]
            .copy_from_slice(&lattice[tdim * lex_index..tdim * (lex_index + 1)]);
    }
    Ok(points)
}
