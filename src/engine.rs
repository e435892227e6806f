//! Serial point-location engine
//!
//! The engine consumes a point cloud in which every cell is an equispaced
//! tensor lattice of nodes, given as one base array per dimension. Candidate
//! cells for a query are read from a uniform hash grid of inflated cell
//! bounding boxes; each candidate's map is then inverted by a clamped Newton
//! iteration on the reference cell. All query and result arrays are allocated
//! and owned by the caller.
use crate::types::{QueryCode, RealScalar};
use itertools::izip;
use log::debug;

const MAX_NEWTON_ITERATIONS: usize = 50;

fn lagrange_1d<T: RealScalar>(nodes: &[T], t: T, values: &mut [T]) {
    for (i, value) in values.iter_mut().enumerate() {
        let mut product = T::one();
        for (j, node) in nodes.iter().enumerate() {
            if j != i {
                product = product * (t - *node) / (nodes[i] - *node);
            }
        }
        *value = product;
    }
}

fn lagrange_1d_derivative<T: RealScalar>(nodes: &[T], t: T, values: &mut [T]) {
    for (i, value) in values.iter_mut().enumerate() {
        let mut sum = T::zero();
        for k in 0..nodes.len() {
            if k == i {
                continue;
            }
            let mut product = T::one() / (nodes[i] - nodes[k]);
            for (j, node) in nodes.iter().enumerate() {
                if j != i && j != k {
                    product = product * (t - *node) / (nodes[i] - *node);
                }
            }
            sum = sum + product;
        }
        *value = sum;
    }
}

fn solve<T: RealScalar>(dim: usize, jac: &[[T; 3]; 3], rhs: &[T; 3]) -> Option<[T; 3]> {
    if dim == 2 {
        let det = jac[0][0] * jac[1][1] - jac[0][1] * jac[1][0];
        if det.abs() < T::epsilon() {
            return None;
        }
        Some([
            (jac[1][1] * rhs[0] - jac[0][1] * rhs[1]) / det,
            (jac[0][0] * rhs[1] - jac[1][0] * rhs[0]) / det,
            T::zero(),
        ])
    } else {
        let c00 = jac[1][1] * jac[2][2] - jac[1][2] * jac[2][1];
        let c01 = jac[1][2] * jac[2][0] - jac[1][0] * jac[2][2];
        let c02 = jac[1][0] * jac[2][1] - jac[1][1] * jac[2][0];
        let det = jac[0][0] * c00 + jac[0][1] * c01 + jac[0][2] * c02;
        if det.abs() < T::epsilon() {
            return None;
        }
        let c10 = jac[0][2] * jac[2][1] - jac[0][1] * jac[2][2];
        let c11 = jac[0][0] * jac[2][2] - jac[0][2] * jac[2][0];
        let c12 = jac[0][1] * jac[2][0] - jac[0][0] * jac[2][1];
        let c20 = jac[0][1] * jac[1][2] - jac[0][2] * jac[1][1];
        let c21 = jac[0][2] * jac[1][0] - jac[0][0] * jac[1][2];
        let c22 = jac[0][0] * jac[1][1] - jac[0][1] * jac[1][0];
        Some([
            (c00 * rhs[0] + c10 * rhs[1] + c20 * rhs[2]) / det,
            (c01 * rhs[0] + c11 * rhs[1] + c21 * rhs[2]) / det,
            (c02 * rhs[0] + c12 * rhs[1] + c22 * rhs[2]) / det,
        ])
    }
}

struct Scratch<T> {
    values: [Vec<T>; 3],
    derivatives: [Vec<T>; 3],
}

impl<T: RealScalar> Scratch<T> {
    fn new(nodes_per_dim: &[usize; 3]) -> Self {
        Self {
            values: [
                vec![T::zero(); nodes_per_dim[0]],
                vec![T::zero(); nodes_per_dim[1]],
                vec![T::zero(); nodes_per_dim[2]],
            ],
            derivatives: [
                vec![T::zero(); nodes_per_dim[0]],
                vec![T::zero(); nodes_per_dim[1]],
                vec![T::zero(); nodes_per_dim[2]],
            ],
        }
    }
}

/// Point locator over a cloud of tensor-lattice cells
pub struct PointLocator<T: RealScalar> {
    dim: usize,
    cell_count: usize,
    nodes_per_dim: [usize; 3],
    points_per_cell: usize,
    coords: Vec<T>,
    nodes: [Vec<T>; 3],
    boxes: Vec<T>,
    tolerances: Vec<T>,
    hash_origin: [T; 3],
    hash_width: [T; 3],
    hash_count: [usize; 3],
    hash_offsets: Vec<usize>,
    hash_items: Vec<usize>,
    newton_tol: T,
    max_candidates: usize,
}

impl<T: RealScalar> PointLocator<T> {
    /// Create a locator for a point cloud
    ///
    /// `coords` holds one base array per dimension, each listing the node
    /// coordinates of all cells, cell by cell and lexicographically within a
    /// cell. `accel_per_dim` is the per-axis sampling resolution used for the
    /// cell bounding boxes; `bbox_inflation` is the relative amount by which
    /// each box is grown.
    pub fn new(
        dim: usize,
        coords: &[&[T]],
        nodes_per_dim: &[usize],
        cell_count: usize,
        accel_per_dim: &[usize],
        bbox_inflation: T,
        newton_tol: T,
        max_candidates: usize,
    ) -> Self {
        assert!(dim == 2 || dim == 3, "Unsupported dimension: {dim}");
        assert_eq!(coords.len(), dim);
        assert_eq!(nodes_per_dim.len(), dim);
        assert_eq!(accel_per_dim.len(), dim);

        let mut nr = [1; 3];
        nr[..dim].copy_from_slice(nodes_per_dim);
        let points_per_cell = nr[0] * nr[1] * nr[2];
        let npts = cell_count * points_per_cell;

        let mut flat = Vec::with_capacity(dim * npts);
        for plane in coords {
            assert_eq!(plane.len(), npts);
            flat.extend_from_slice(plane);
        }

        let nodes = std::array::from_fn(|d| {
            (0..nr[d])
                .map(|i| {
                    if nr[d] == 1 {
                        T::zero()
                    } else {
                        T::from(i).unwrap() / T::from(nr[d] - 1).unwrap()
                    }
                })
                .collect::<Vec<_>>()
        });

        let mut locator = Self {
            dim,
            cell_count,
            nodes_per_dim: nr,
            points_per_cell,
            coords: flat,
            nodes,
            boxes: vec![T::zero(); 2 * dim * cell_count],
            tolerances: vec![T::zero(); cell_count],
            hash_origin: [T::zero(); 3],
            hash_width: [T::one(); 3],
            hash_count: [1; 3],
            hash_offsets: vec![],
            hash_items: vec![],
            newton_tol,
            max_candidates,
        };
        locator.compute_boxes(accel_per_dim, bbox_inflation);
        locator.build_hash();
        debug!(
            "point locator over {} cells ({} nodes), hash grid {:?}",
            cell_count,
            npts,
            &locator.hash_count[..dim]
        );
        locator
    }

    /// Bounding box of each cell, sampled on the accelerator lattice and inflated
    fn compute_boxes(&mut self, accel_per_dim: &[usize], inflation: T) {
        let dim = self.dim;
        let mut mr = [1; 3];
        mr[..dim].copy_from_slice(accel_per_dim);

        let samples: [Vec<T>; 3] = std::array::from_fn(|d| {
            let mut w = vec![T::zero(); mr[d] * self.nodes_per_dim[d]];
            for m in 0..mr[d] {
                let t = if mr[d] == 1 {
                    T::zero()
                } else {
                    T::from(m).unwrap() / T::from(mr[d] - 1).unwrap()
                };
                lagrange_1d(
                    &self.nodes[d],
                    t,
                    &mut w[m * self.nodes_per_dim[d]..(m + 1) * self.nodes_per_dim[d]],
                );
            }
            w
        });

        let npts = self.cell_count * self.points_per_cell;
        let nsamples = mr[0] * mr[1] * mr[2];
        for cell in 0..self.cell_count {
            let base = cell * self.points_per_cell;
            let mut low = [T::infinity(); 3];
            let mut high = [T::neg_infinity(); 3];
            for s in 0..nsamples {
                let si = [s % mr[0], (s / mr[0]) % mr[1], s / (mr[0] * mr[1])];
                for gd in 0..dim {
                    let mut x = T::zero();
                    for p in 0..self.points_per_cell {
                        let pi = [
                            p % self.nodes_per_dim[0],
                            (p / self.nodes_per_dim[0]) % self.nodes_per_dim[1],
                            p / (self.nodes_per_dim[0] * self.nodes_per_dim[1]),
                        ];
                        let mut w = T::one();
                        for d in 0..dim {
                            w = w * samples[d][si[d] * self.nodes_per_dim[d] + pi[d]];
                        }
                        x = x + self.coords[gd * npts + base + p] * w;
                    }
                    low[gd] = low[gd].min(x);
                    high[gd] = high[gd].max(x);
                }
            }
            let mut diag2 = T::zero();
            for gd in 0..dim {
                let pad = inflation * (high[gd] - low[gd]);
                diag2 = diag2 + (high[gd] - low[gd]) * (high[gd] - low[gd]);
                self.boxes[2 * dim * cell + gd] = low[gd] - pad;
                self.boxes[2 * dim * cell + dim + gd] = high[gd] + pad;
            }
            self.tolerances[cell] = self.newton_tol.sqrt() * diag2.sqrt();
        }
    }

    fn build_hash(&mut self) {
        let dim = self.dim;
        let mut low = [T::infinity(); 3];
        let mut high = [T::neg_infinity(); 3];
        for cell in 0..self.cell_count {
            for gd in 0..dim {
                low[gd] = low[gd].min(self.boxes[2 * dim * cell + gd]);
                high[gd] = high[gd].max(self.boxes[2 * dim * cell + dim + gd]);
            }
        }

        let per_axis = (self.cell_count as f64)
            .powf(1.0 / dim as f64)
            .ceil()
            .max(1.0) as usize;
        for gd in 0..dim {
            self.hash_count[gd] = per_axis;
            self.hash_origin[gd] = low[gd];
            let width = (high[gd] - low[gd]) / T::from(per_axis).unwrap();
            self.hash_width[gd] = if width > T::zero() { width } else { T::one() };
        }

        let nhash = self.hash_count[0] * self.hash_count[1] * self.hash_count[2];
        let mut counts = vec![0; nhash];
        let ranges = (0..self.cell_count)
            .map(|cell| {
                let mut range = [[0; 3]; 2];
                for gd in 0..dim {
                    range[0][gd] = self.hash_index(gd, self.boxes[2 * dim * cell + gd]);
                    range[1][gd] = self.hash_index(gd, self.boxes[2 * dim * cell + dim + gd]);
                }
                range
            })
            .collect::<Vec<_>>();
        for range in &ranges {
            for iz in range[0][2]..=range[1][2] {
                for iy in range[0][1]..=range[1][1] {
                    for ix in range[0][0]..=range[1][0] {
                        counts[ix + self.hash_count[0] * (iy + self.hash_count[1] * iz)] += 1;
                    }
                }
            }
        }
        self.hash_offsets = vec![0; nhash + 1];
        for i in 0..nhash {
            self.hash_offsets[i + 1] = self.hash_offsets[i] + counts[i];
        }
        self.hash_items = vec![0; self.hash_offsets[nhash]];
        let mut cursor = self.hash_offsets.clone();
        for (cell, range) in ranges.iter().enumerate() {
            for iz in range[0][2]..=range[1][2] {
                for iy in range[0][1]..=range[1][1] {
                    for ix in range[0][0]..=range[1][0] {
                        let h = ix + self.hash_count[0] * (iy + self.hash_count[1] * iz);
                        self.hash_items[cursor[h]] = cell;
                        cursor[h] += 1;
                    }
                }
            }
        }
    }

    fn hash_index(&self, axis: usize, x: T) -> usize {
        let i = ((x - self.hash_origin[axis]) / self.hash_width[axis])
            .floor()
            .to_isize()
            .unwrap_or(0);
        i.clamp(0, self.hash_count[axis] as isize - 1) as usize
    }

    fn basis_weights(&self, r: &[T; 3], scratch: &mut Scratch<T>, with_derivatives: bool) {
        for d in 0..self.dim {
            lagrange_1d(&self.nodes[d], r[d], &mut scratch.values[d]);
            if with_derivatives {
                lagrange_1d_derivative(&self.nodes[d], r[d], &mut scratch.derivatives[d]);
            }
        }
    }

    fn eval_cell(&self, cell: usize, scratch: &Scratch<T>) -> ([T; 3], [[T; 3]; 3]) {
        let npts = self.cell_count * self.points_per_cell;
        let base = cell * self.points_per_cell;
        let mut x = [T::zero(); 3];
        let mut jac = [[T::zero(); 3]; 3];
        for p in 0..self.points_per_cell {
            let pi = [
                p % self.nodes_per_dim[0],
                (p / self.nodes_per_dim[0]) % self.nodes_per_dim[1],
                p / (self.nodes_per_dim[0] * self.nodes_per_dim[1]),
            ];
            let mut w = T::one();
            for d in 0..self.dim {
                w = w * scratch.values[d][pi[d]];
            }
            for gd in 0..self.dim {
                let c = self.coords[gd * npts + base + p];
                x[gd] = x[gd] + c * w;
                for td in 0..self.dim {
                    let mut dw = T::one();
                    for d in 0..self.dim {
                        dw = dw
                            * if d == td {
                                scratch.derivatives[d][pi[d]]
                            } else {
                                scratch.values[d][pi[d]]
                            };
                    }
                    jac[gd][td] = jac[gd][td] + c * dw;
                }
            }
        }
        (x, jac)
    }

    /// Invert the cell's map for the query point; returns the clamped reference
    /// coordinate and the distance between the query and its image
    fn invert_map(&self, cell: usize, xq: &[T; 3], scratch: &mut Scratch<T>) -> ([T; 3], T) {
        let half = T::from(0.5).unwrap();
        let mut r = [T::zero(); 3];
        r[..self.dim].fill(half);
        for _ in 0..MAX_NEWTON_ITERATIONS {
            self.basis_weights(&r, scratch, true);
            let (x, jac) = self.eval_cell(cell, scratch);
            let mut residual = [T::zero(); 3];
            for gd in 0..self.dim {
                residual[gd] = x[gd] - xq[gd];
            }
            let Some(step) = solve(self.dim, &jac, &residual) else {
                break;
            };
            let mut moved = T::zero();
            for d in 0..self.dim {
                let next = (r[d] - step[d]).max(T::zero()).min(T::one());
                moved = moved.max((next - r[d]).abs());
                r[d] = next;
            }
            if moved < self.newton_tol {
                break;
            }
        }
        self.basis_weights(&r, scratch, false);
        let (x, _) = self.eval_cell(cell, scratch);
        let mut dist2 = T::zero();
        for gd in 0..self.dim {
            dist2 = dist2 + (x[gd] - xq[gd]) * (x[gd] - xq[gd]);
        }
        (r, dist2.sqrt())
    }

    /// Locate query points, writing one result per point into the caller's arrays
    ///
    /// `query` holds one base array per dimension; consecutive points of an
    /// array are `stride` values apart.
    pub fn find(
        &self,
        codes: &mut [QueryCode],
        procs: &mut [usize],
        cells: &mut [usize],
        ref_coords: &mut [T],
        dists: &mut [T],
        query: &[&[T]],
        stride: usize,
        count: usize,
    ) {
        assert_eq!(query.len(), self.dim, "Query has wrong dimension");
        let border_tol = self.newton_tol.sqrt();
        let mut scratch = Scratch::new(&self.nodes_per_dim);

        for (i, (code, proc, cell_out, dist_out)) in
            izip!(&mut *codes, &mut *procs, &mut *cells, &mut *dists)
                .enumerate()
                .take(count)
        {
            let mut xq = [T::zero(); 3];
            for d in 0..self.dim {
                xq[d] = query[d][i * stride];
            }

            let mut best: Option<(usize, T, usize, [T; 3])> = None;
            let mut inside_hash = true;
            let mut h = 0;
            for gd in (0..self.dim).rev() {
                let span = self.hash_width[gd] * T::from(self.hash_count[gd]).unwrap();
                if xq[gd] < self.hash_origin[gd] || xq[gd] > self.hash_origin[gd] + span {
                    inside_hash = false;
                    break;
                }
                h = h * self.hash_count[gd] + self.hash_index(gd, xq[gd]);
            }
            if inside_hash {
                let candidates = &self.hash_items[self.hash_offsets[h]..self.hash_offsets[h + 1]];
                let mut tried = 0;
                for &cell in candidates {
                    if tried == self.max_candidates {
                        break;
                    }
                    if (0..self.dim).any(|gd| {
                        xq[gd] < self.boxes[2 * self.dim * cell + gd]
                            || xq[gd] > self.boxes[2 * self.dim * cell + self.dim + gd]
                    }) {
                        continue;
                    }
                    tried += 1;
                    let (r, dist) = self.invert_map(cell, &xq, &mut scratch);
                    let rank = if dist > self.tolerances[cell] {
                        2
                    } else if (0..self.dim)
                        .any(|d| r[d] < border_tol || r[d] > T::one() - border_tol)
                    {
                        1
                    } else {
                        0
                    };
                    if best
                        .as_ref()
                        .map(|(brank, bdist, _, _)| (rank, dist) < (*brank, *bdist))
                        .unwrap_or(true)
                    {
                        best = Some((rank, dist, cell, r));
                    }
                }
            }

            *proc = 0;
            match best {
                Some((rank, dist, cell, r)) => {
                    *code = match rank {
                        0 => QueryCode::Internal,
                        1 => QueryCode::Border,
                        _ => QueryCode::NotFound,
                    };
                    *cell_out = cell;
                    *dist_out = dist;
                    ref_coords[i * self.dim..(i + 1) * self.dim].copy_from_slice(&r[..self.dim]);
                }
                None => {
                    *code = QueryCode::NotFound;
                    *cell_out = 0;
                    *dist_out = T::infinity();
                    ref_coords[i * self.dim..(i + 1) * self.dim].fill(T::zero());
                }
            }
        }
    }

    /// Evaluate per-cell nodal data at located points
    ///
    /// `data` holds one value per cloud node, cell by cell and
    /// lexicographically within a cell. Points that were not found receive 0.
    pub fn eval(
        &self,
        values: &mut [T],
        codes: &[QueryCode],
        _procs: &[usize],
        cells: &[usize],
        ref_coords: &[T],
        count: usize,
        data: &[T],
    ) {
        assert_eq!(data.len(), self.cell_count * self.points_per_cell);
        let mut scratch = Scratch::new(&self.nodes_per_dim);

        for (i, value) in values.iter_mut().enumerate().take(count) {
            if codes[i] == QueryCode::NotFound {
                *value = T::zero();
                continue;
            }
            let mut r = [T::zero(); 3];
            r[..self.dim].copy_from_slice(&ref_coords[i * self.dim..(i + 1) * self.dim]);
            self.basis_weights(&r, &mut scratch, false);

            let base = cells[i] * self.points_per_cell;
            let mut sum = T::zero();
            for p in 0..self.points_per_cell {
                let pi = [
                    p % self.nodes_per_dim[0],
                    (p / self.nodes_per_dim[0]) % self.nodes_per_dim[1],
                    p / (self.nodes_per_dim[0] * self.nodes_per_dim[1]),
                ];
                let mut w = T::one();
                for d in 0..self.dim {
                    w = w * scratch.values[d][pi[d]];
                }
                sum = sum + data[base + p] * w;
            }
            *value = sum;
        }
    }

    /// Number of cells in the cloud
    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    /// Number of lattice nodes per cell
    pub fn points_per_cell(&self) -> usize {
        self.points_per_cell
    }
}
