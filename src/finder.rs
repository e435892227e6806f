//! Point search on a grid
use crate::{
    cloud, dofmap,
    engine::PointLocator,
    function::GridFunction,
    split::{self, SimplexSubMesh},
    traits::{GeometryMap as _, Grid},
    types::{FoundPoints, QueryCode, RealScalar, SearchError},
};
use log::{debug, warn};
use ndelement::types::ReferenceCellType;

enum CellPath<'g, T: RealScalar, G: Grid<T = T>> {
    Tensor {
        lex_map: Vec<usize>,
    },
    Simplex {
        sub_mesh: SimplexSubMesh<T>,
        map: G::GeometryMap<'g>,
    },
}

struct SetupData<'g, T: RealScalar, G: Grid<T = T>> {
    locator: PointLocator<T>,
    path: CellPath<'g, T, G>,
    points_per_cell: usize,
    sub_cells: usize,
}

/// Point search on a single element grid
///
/// The search is prepared by [`GridSearch::setup`], which extracts the grid's
/// point cloud and builds the locator over it; queries and interpolation are
/// then read-only. Calling `setup` again rebuilds everything from scratch,
/// and [`GridSearch::free_data`] (or dropping the search) releases it.
pub struct GridSearch<'g, G: Grid> {
    grid: &'g G,
    data: Option<SetupData<'g, G::T, G>>,
}

impl<'g, G: Grid> GridSearch<'g, G> {
    /// Create a search for a grid, without building any search structure
    pub fn new(grid: &'g G) -> Self {
        Self { grid, data: None }
    }

    /// Build the point cloud and the search structure
    ///
    /// `bbox_inflation` is the relative inflation of the cell bounding boxes,
    /// `newton_tol` the tolerance of the reference coordinate solve and
    /// `max_candidates` the maximum number of candidate cells examined per
    /// query point. Any previously built structure is released first.
    pub fn setup(
        &mut self,
        bbox_inflation: G::T,
        newton_tol: G::T,
        max_candidates: usize,
    ) -> Result<(), SearchError> {
        self.data = None;

        let grid = self.grid;
        let dim = grid.geometry_dim();
        if dim != grid.topology_dim() || !(2..=3).contains(&dim) {
            return Err(SearchError::UnsupportedDimension(dim));
        }
        if grid.cell_count() == 0 {
            return Err(SearchError::EmptyGrid);
        }
        let degree = grid.geometry_degree();
        if degree == 0 {
            return Err(SearchError::UnsupportedDegree(0));
        }

        let (cloud, path, sub_cells) = match grid.cell_type() {
            ReferenceCellType::Quadrilateral | ReferenceCellType::Hexahedron => {
                let lex_map = dofmap::lex_dof_map(grid.element(), degree)?;
                let cloud = cloud::tensor_point_cloud(grid, &lex_map);
                (cloud, CellPath::Tensor { lex_map }, 1)
            }
            ReferenceCellType::Triangle
            | ReferenceCellType::Tetrahedron
            | ReferenceCellType::Prism => {
                let sub_mesh = split::split_reference_cell(grid.cell_type(), degree)?;
                let map = grid.geometry_map(sub_mesh.integration_points());
                let cloud = cloud::simplex_point_cloud(grid, &map);
                let sub_cells = sub_mesh.sub_cell_count();
                (cloud, CellPath::Simplex { sub_mesh, map }, sub_cells)
            }
            other => {
                return Err(SearchError::UnsupportedCellType(other));
            }
        };

        let points_per_cell = (degree + 1).pow(dim as u32);
        let cell_count = grid.cell_count() * sub_cells;
        let npts = cell_count * points_per_cell;
        let nodes_per_dim = vec![degree + 1; dim];
        let accel_per_dim = vec![2 * (degree + 1); dim];
        let planes = (0..dim)
            .map(|d| &cloud[d * npts..(d + 1) * npts])
            .collect::<Vec<_>>();
        let locator = PointLocator::new(
            dim,
            &planes,
            &nodes_per_dim,
            cell_count,
            &accel_per_dim,
            bbox_inflation,
            newton_tol,
            max_candidates,
        );
        debug!(
            "search over {} cells of {:?} degree {} ({} cloud points)",
            grid.cell_count(),
            grid.cell_type(),
            degree,
            npts
        );

        self.data = Some(SetupData {
            locator,
            path,
            points_per_cell,
            sub_cells,
        });
        Ok(())
    }

    /// Locate query points
    ///
    /// `points` holds the query coordinates dimension-major: all first
    /// coordinates, then all second coordinates, then all third. One result is
    /// returned per query point, in query order; points that are not found are
    /// reported in the result codes, not as errors.
    pub fn find_points(&self, points: &[G::T]) -> FoundPoints<G::T> {
        let data = self
            .data
            .as_ref()
            .expect("setup() must be called before find_points()");
        let dim = self.grid.geometry_dim();
        assert_eq!(points.len() % dim, 0, "Query points have wrong dimension");
        let count = points.len() / dim;
        if count == 0 {
            warn!("searching for an empty set of points");
        }

        let mut found = FoundPoints {
            codes: vec![QueryCode::NotFound; count],
            procs: vec![0; count],
            cells: vec![0; count],
            reference_coords: vec![G::T::zero(); dim * count],
            dists: vec![G::T::zero(); count],
        };
        let planes = (0..dim)
            .map(|d| &points[d * count..(d + 1) * count])
            .collect::<Vec<_>>();
        data.locator.find(
            &mut found.codes,
            &mut found.procs,
            &mut found.cells,
            &mut found.reference_coords,
            &mut found.dists,
            &planes,
            1,
            count,
        );
        found
    }

    /// Interpolate a grid function at located points
    ///
    /// Components are sampled independently; the output is component-major,
    /// one slice of `found.len()` values per component. Points that were not
    /// found receive 0 in every component.
    pub fn interpolate(
        &self,
        found: &FoundPoints<G::T>,
        function: &GridFunction<'_, G>,
    ) -> Vec<G::T> {
        let data = self
            .data
            .as_ref()
            .expect("setup() must be called before interpolate()");
        assert!(
            std::ptr::eq(self.grid, function.grid()),
            "Grid function is not defined on the searched grid"
        );

        let grid = self.grid;
        let count = found.len();
        let node_count = grid.cell_count() * data.sub_cells * data.points_per_cell;
        let mut node_values = vec![G::T::zero(); node_count];
        let mut values = vec![G::T::zero(); function.component_count() * count];

        for component in 0..function.component_count() {
            let component_data = function.component(component);
            match &data.path {
                CellPath::Tensor { lex_map } => {
                    for cell in 0..grid.cell_count() {
                        let cell_points = grid.cell_points(cell);
                        for (j, &lex) in lex_map.iter().enumerate() {
                            node_values[cell * data.points_per_cell + j] =
                                component_data[cell_points[lex]];
                        }
                    }
                }
                CellPath::Simplex { map, .. } => {
                    let per_cell = data.sub_cells * data.points_per_cell;
                    for cell in 0..grid.cell_count() {
                        map.evaluate(
                            cell,
                            component_data,
                            &mut node_values[cell * per_cell..(cell + 1) * per_cell],
                        );
                    }
                }
            }
            data.locator.eval(
                &mut values[component * count..(component + 1) * count],
                &found.codes,
                &found.procs,
                &found.cells,
                &found.reference_coords,
                count,
                &node_values,
            );
        }
        values
    }

    /// Release the search structure and the point cloud
    ///
    /// Safe to call any number of times; also runs when the search is dropped.
    pub fn free_data(&mut self) {
        self.data = None;
    }

    /// Number of sub-cells each grid cell was split into (1 for tensor cells)
    pub fn sub_cell_count(&self) -> Option<usize> {
        self.data.as_ref().map(|data| data.sub_cells)
    }

    /// The reference sub-mesh used to cover the grid's cells, if the grid's
    /// cell type required splitting
    pub fn sub_mesh(&self) -> Option<&SimplexSubMesh<G::T>> {
        match &self.data.as_ref()?.path {
            CellPath::Simplex { sub_mesh, .. } => Some(sub_mesh),
            CellPath::Tensor { .. } => None,
        }
    }
}
