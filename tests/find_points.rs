//! Test point search and interpolation
use approx::assert_relative_eq;
use ndelement::{
    ciarlet::lagrange,
    types::{Continuity, ReferenceCellType},
};
use ndfind::{
    dofmap, shapes,
    traits::{Builder, Grid},
    types::QueryCode,
    GridFunction, GridSearch, SingleElementGrid, SingleElementGridBuilder,
};

fn nodal_values<G: Grid<T = f64>>(grid: &G, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    (0..grid.point_count()).map(|i| f(grid.point(i))).collect()
}

#[test]
fn test_four_unit_squares() {
    // A 2 by 2 mesh of unit squares covering [0, 2] x [0, 2]
    let mut b = SingleElementGridBuilder::<f64>::new(2, (ReferenceCellType::Quadrilateral, 1));
    for j in 0..3 {
        for i in 0..3 {
            b.add_point(3 * j + i, &[i as f64, j as f64]);
        }
    }
    for j in 0..2 {
        for i in 0..2 {
            b.add_cell(
                2 * j + i,
                &[3 * j + i, 3 * j + i + 1, 3 * (j + 1) + i, 3 * (j + 1) + i + 1],
            );
        }
    }
    let grid = b.create_grid();

    let mut search = GridSearch::new(&grid);
    search.setup(0.1, 1e-12, 256).unwrap();

    // Points (0.5, 0.5), (1.5, 0.5) and (0.5, 1.5), dimension-major
    let found = search.find_points(&[0.5, 1.5, 0.5, 0.5, 0.5, 1.5]);
    assert_eq!(found.codes, vec![QueryCode::Internal; 3]);
    assert_eq!(found.cells, vec![0, 1, 2]);
    assert_relative_eq!(found.reference_coords[0], 0.5, epsilon = 1e-10);
    assert_relative_eq!(found.reference_coords[1], 0.5, epsilon = 1e-10);

    let data = nodal_values(&grid, |x| x[0] + x[1]);
    let f = GridFunction::new(&grid, &data, 1);
    let values = search.interpolate(&found, &f);
    assert_relative_eq!(values[0], 1.0, epsilon = 1e-10);
    assert_relative_eq!(values[1], 2.0, epsilon = 1e-10);
    assert_relative_eq!(values[2], 2.0, epsilon = 1e-10);
}

#[test]
fn test_outside_bounding_box_is_not_found() {
    let grid = shapes::unit_square::<f64>(2, 2, 1, ReferenceCellType::Quadrilateral);
    let mut search = GridSearch::new(&grid);
    search.setup(0.1, 1e-12, 256).unwrap();
    let found = search.find_points(&[5.0, 5.0]);
    assert_eq!(found.codes[0], QueryCode::NotFound);
}

#[test]
fn test_node_query_resolves_to_reference_position() {
    let grid = shapes::unit_square::<f64>(1, 1, 2, ReferenceCellType::Quadrilateral);
    let mut search = GridSearch::new(&grid);
    search.setup(0.1, 1e-12, 256).unwrap();
    let found = search.find_points(&[0.5, 0.5]);
    assert_eq!(found.codes[0], QueryCode::Internal);
    assert_eq!(found.cells[0], 0);
    assert_relative_eq!(found.reference_coords[0], 0.5, epsilon = 1e-8);
    assert_relative_eq!(found.reference_coords[1], 0.5, epsilon = 1e-8);
    assert!(found.dists[0] < 1e-10);
}

#[test]
fn test_affine_field_on_quadrilaterals() {
    let grid = shapes::unit_square::<f64>(2, 2, 2, ReferenceCellType::Quadrilateral);
    let mut search = GridSearch::new(&grid);
    search.setup(0.1, 1e-12, 256).unwrap();

    let queries = [(0.3, 0.7), (0.85, 0.1), (0.5, 0.25)];
    let points = queries
        .iter()
        .map(|(x, _)| *x)
        .chain(queries.iter().map(|(_, y)| *y))
        .collect::<Vec<_>>();
    let found = search.find_points(&points);

    let data = nodal_values(&grid, |x| 2.0 * x[0] + 3.0 * x[1] - 1.0);
    let f = GridFunction::new(&grid, &data, 1);
    let values = search.interpolate(&found, &f);
    for ((x, y), value) in queries.iter().zip(&values) {
        assert_relative_eq!(*value, 2.0 * x + 3.0 * y - 1.0, epsilon = 1e-10);
    }
}

#[test]
fn test_affine_field_on_triangles() {
    let grid = shapes::unit_square::<f64>(2, 2, 1, ReferenceCellType::Triangle);
    let mut search = GridSearch::new(&grid);
    search.setup(0.1, 1e-12, 256).unwrap();

    let found = search.find_points(&[0.3, 0.8, 0.65, 0.1, 0.55, 0.4]);
    let data = nodal_values(&grid, |x| x[0] - 2.0 * x[1] + 0.5);
    let f = GridFunction::new(&grid, &data, 1);
    let values = search.interpolate(&found, &f);
    for ((x, y), value) in [(0.3, 0.1), (0.8, 0.55), (0.65, 0.4)].iter().zip(&values) {
        assert_relative_eq!(*value, x - 2.0 * y + 0.5, epsilon = 1e-10);
    }
}

#[test]
fn test_affine_field_on_tetrahedra() {
    let grid = shapes::unit_cube::<f64>(2, 2, 2, 1, ReferenceCellType::Tetrahedron);
    let mut search = GridSearch::new(&grid);
    search.setup(0.1, 1e-12, 256).unwrap();

    let queries = [(0.3, 0.45, 0.85), (0.7, 0.15, 0.4)];
    let mut points = vec![];
    for d in 0..3 {
        for q in &queries {
            points.push([q.0, q.1, q.2][d]);
        }
    }
    let found = search.find_points(&points);
    let data = nodal_values(&grid, |x| x[0] + x[1] + x[2]);
    let f = GridFunction::new(&grid, &data, 1);
    let values = search.interpolate(&found, &f);
    for ((x, y, z), value) in queries.iter().zip(&values) {
        assert_relative_eq!(*value, x + y + z, epsilon = 1e-10);
    }
}

#[test]
fn test_affine_field_on_prisms() {
    let grid = shapes::unit_cube::<f64>(1, 1, 1, 1, ReferenceCellType::Prism);
    let mut search = GridSearch::new(&grid);
    search.setup(0.1, 1e-12, 256).unwrap();

    let found = search.find_points(&[0.3, 0.7, 0.2, 0.6, 0.6, 0.3]);
    let data = nodal_values(&grid, |x| x[0] - x[1] + 2.0 * x[2]);
    let f = GridFunction::new(&grid, &data, 1);
    let values = search.interpolate(&found, &f);
    for ((x, y, z), value) in [(0.3, 0.2, 0.6), (0.7, 0.6, 0.3)].iter().zip(&values) {
        assert_relative_eq!(*value, x - y + 2.0 * z, epsilon = 1e-10);
    }
}

#[test]
fn test_affine_field_on_hexahedra() {
    let grid = shapes::unit_cube::<f64>(2, 2, 2, 2, ReferenceCellType::Hexahedron);
    let mut search = GridSearch::new(&grid);
    search.setup(0.1, 1e-12, 256).unwrap();

    let found = search.find_points(&[0.3, 0.8, 0.45, 0.15, 0.9, 0.6]);
    let data = nodal_values(&grid, |x| x[0] + 2.0 * x[1] + 3.0 * x[2]);
    let f = GridFunction::new(&grid, &data, 1);
    let values = search.interpolate(&found, &f);
    for ((x, y, z), value) in [(0.3, 0.45, 0.9), (0.8, 0.15, 0.6)].iter().zip(&values) {
        assert_relative_eq!(*value, x + 2.0 * y + 3.0 * z, epsilon = 1e-10);
    }
}

#[test]
fn test_constant_field_on_curved_triangle() {
    // A single order 2 reference triangle with a curved hypotenuse
    let element = lagrange::create::<f64>(ReferenceCellType::Triangle, 2, Continuity::Standard);
    let mut coordinates = dofmap::reference_interpolation_points(&element, 2).unwrap();
    for point in coordinates.chunks_mut(2) {
        if (point[0] - 0.5).abs() < 1e-12 && (point[1] - 0.5).abs() < 1e-12 {
            point[0] = 0.55;
            point[1] = 0.55;
        }
    }
    let grid = SingleElementGrid::<f64, _>::new_from_raw_data(
        &coordinates,
        2,
        &[0, 1, 2, 3, 4, 5],
        ReferenceCellType::Triangle,
        2,
    );

    let mut search = GridSearch::new(&grid);
    search.setup(0.1, 1e-12, 256).unwrap();
    let found = search.find_points(&[0.2, 0.1, 0.3, 0.2, 0.6, 0.1]);
    for code in &found.codes {
        assert_ne!(*code, QueryCode::NotFound);
    }
    let data = vec![1.0; grid.point_count()];
    let f = GridFunction::new(&grid, &data, 1);
    let values = search.interpolate(&found, &f);
    for value in &values {
        assert_relative_eq!(*value, 1.0, epsilon = 1e-10);
    }
}

#[test]
fn test_field_on_curved_quadrilateral_matches_coordinates() {
    // A single biquadratic cell with a curved upper edge; the field x + y is in
    // the geometry space, so interpolating it must reproduce the query point's
    // own coordinates.
    let element =
        lagrange::create::<f64>(ReferenceCellType::Quadrilateral, 2, Continuity::Standard);
    let reference = dofmap::reference_interpolation_points(&element, 2).unwrap();
    let mut coordinates = vec![];
    for point in reference.chunks(2) {
        coordinates.push(point[0]);
        coordinates.push(point[1] * (1.0 + 0.2 * point[0] * (1.0 - point[0])));
    }
    let grid = SingleElementGrid::<f64, _>::new_from_raw_data(
        &coordinates,
        2,
        &[0, 1, 2, 3, 4, 5, 6, 7, 8],
        ReferenceCellType::Quadrilateral,
        2,
    );

    let mut search = GridSearch::new(&grid);
    search.setup(0.1, 1e-12, 256).unwrap();
    let found = search.find_points(&[0.5, 0.3, 0.5, 0.8]);
    assert_eq!(found.codes, vec![QueryCode::Internal; 2]);

    let data = nodal_values(&grid, |x| x[0] + x[1]);
    let f = GridFunction::new(&grid, &data, 1);
    let values = search.interpolate(&found, &f);
    assert_relative_eq!(values[0], 1.0, epsilon = 1e-8);
    assert_relative_eq!(values[1], 1.1, epsilon = 1e-8);
}

#[test]
fn test_vector_field_components() {
    let grid = shapes::unit_square::<f64>(2, 2, 1, ReferenceCellType::Quadrilateral);
    let mut search = GridSearch::new(&grid);
    search.setup(0.1, 1e-12, 256).unwrap();

    let mut data = nodal_values(&grid, |x| x[0] + x[1]);
    data.extend(nodal_values(&grid, |x| x[0] - x[1]));
    let f = GridFunction::new(&grid, &data, 2);

    let found = search.find_points(&[0.3, 0.8, 0.7, 0.2]);
    let values = search.interpolate(&found, &f);
    assert_eq!(values.len(), 4);
    assert_relative_eq!(values[0], 1.0, epsilon = 1e-10);
    assert_relative_eq!(values[1], 1.0, epsilon = 1e-10);
    assert_relative_eq!(values[2], -0.4, epsilon = 1e-10);
    assert_relative_eq!(values[3], 0.6, epsilon = 1e-10);
}

#[test]
fn test_simplex_results_address_sub_cells() {
    let grid = shapes::unit_square::<f64>(1, 1, 1, ReferenceCellType::Triangle);
    let mut search = GridSearch::new(&grid);
    search.setup(0.1, 1e-12, 256).unwrap();
    assert_eq!(search.sub_cell_count(), Some(3));

    let found = search.find_points(&[0.1, 0.9, 0.2, 0.8]);
    assert_eq!(found.codes[0], QueryCode::Internal);
    assert_eq!(found.cells[0] / 3, 0);
    assert_eq!(found.cells[1] / 3, 1);
}

#[test]
fn test_rebuild_after_free() {
    let grid = shapes::unit_square::<f64>(2, 2, 1, ReferenceCellType::Quadrilateral);
    let mut search = GridSearch::new(&grid);
    search.setup(0.1, 1e-12, 256).unwrap();
    search.free_data();
    search.free_data();
    search.setup(0.1, 1e-12, 256).unwrap();
    let found = search.find_points(&[0.25, 0.75]);
    assert_eq!(found.codes[0], QueryCode::Internal);
}
