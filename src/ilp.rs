//! Exact Steiner trees through a multi-commodity flow MIP.
//!
//! Every undirected edge `e = {v, w}` gets a binary selection column `x_e` and two
//! arcs, `2e` (`v -> w`) and `2e + 1` (`w -> v`). Every non-root terminal `k` owns a
//! commodity with one continuous flow column `f^k_a` in `[0, 1]` per arc. The model:
//!
//! ```text
//! minimise    sum_e cost_e * x_e
//! subject to  f^k_a - x_edge(a) <= 0                     for every k, a
//!             sum_out(v) f^k - sum_in(v) f^k = b^k_v       for every k, v
//!             sum_e cost_e * x_e <= UB                     (optional)
//! ```
//!
//! with `b^k_root = 1`, `b^k_k = -1` and `0` elsewhere. Columns are ordered
//! `x_0..x_{m-1}` followed by one block of `2m` flow columns per commodity; all
//! indices are 0-based.

use crate::graph::{EdgeIndex, Graph, VertexId};
use crate::paths::{dijkstra, PathsData};
use crate::tree::SteinerTree;
use crate::two_apx::parallel_two_apx;
use good_lp::{default_solver, variable, variables, Expression, Solution, SolverModel, Variable};
use log::{debug, info, warn};
use rayon::prelude::*;
use thiserror::Error;

/// Column values above this threshold count as a selected edge.
const SELECTION_THRESHOLD: f64 = 0.5;

// ============================================================================
// Errors
// ============================================================================

/// Failures of the exact strategy. All of them are fatal for the solve.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum IlpError {
    /// The MIP backend reported an error or an infeasible/unbounded model.
    #[error("MIP solver failed: {0}")]
    Solver(String),
    /// The backend returned the wrong number of column values.
    #[error("MIP solver returned {found} column values, expected {expected}")]
    SolutionLength {
        /// Number of columns of the model.
        expected: usize,
        /// Number of values returned.
        found: usize,
    },
}

// ============================================================================
// Model sizes and index scheme
// ============================================================================

/// Dimensions of the flow model and the mapping from (commodity, arc/vertex) to
/// column and row indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IlpParams {
    /// Number of vertices.
    pub n: usize,
    /// Number of undirected edges.
    pub m: usize,
    /// Number of terminals, root included.
    pub terminals: usize,
    /// Number of directed arcs, `2m`.
    pub arcs: usize,
    /// Number of commodities, `terminals - 1`.
    pub commodities: usize,
    /// Whether the cost cutoff row is present.
    pub bound_row: bool,
    /// Sum of all vertex degrees.
    pub degree_sum: usize,
}

impl IlpParams {
    /// Sizes the model for `graph` with `terminals` terminals (at least 2).
    pub fn new(graph: &Graph, terminals: usize, bound_row: bool) -> Self {
        debug_assert!(terminals >= 2);
        Self {
            n: graph.vertex_count(),
            m: graph.edge_count(),
            terminals,
            arcs: 2 * graph.edge_count(),
            commodities: terminals - 1,
            bound_row,
            degree_sum: graph.degree_sum(),
        }
    }

    /// Total number of columns: `m + (t - 1) * 2m`.
    #[inline]
    pub fn columns(&self) -> usize {
        self.m + self.commodities * self.arcs
    }

    /// Number of edge-selection rows, one per commodity and arc.
    #[inline]
    pub fn edge_rows(&self) -> usize {
        self.commodities * self.arcs
    }

    /// Number of flow-conservation rows, one per commodity and vertex.
    #[inline]
    pub fn flow_rows(&self) -> usize {
        self.commodities * self.n
    }

    /// Total number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.edge_rows() + self.flow_rows() + usize::from(self.bound_row)
    }

    /// Exact number of nonzeros: 2 per edge-selection row, `2 * deg(v)` per flow
    /// row and `m` for the bound row.
    pub fn nonzeros(&self) -> usize {
        2 * self.edge_rows()
            + self.commodities * 2 * self.degree_sum
            + if self.bound_row { self.m } else { 0 }
    }

    /// Column of `x_e`.
    #[inline(always)]
    pub fn x_column(&self, e: EdgeIndex) -> usize {
        e
    }

    /// Column of `f^k_a` for commodity `k` in `1..terminals`.
    #[inline(always)]
    pub fn flow_column(&self, k: usize, arc: usize) -> usize {
        debug_assert!((1..self.terminals).contains(&k) && arc < self.arcs);
        self.m + (k - 1) * self.arcs + arc
    }

    /// Row of the selection constraint `f^k_a <= x_edge(a)`.
    #[inline(always)]
    pub fn edge_row(&self, k: usize, arc: usize) -> usize {
        (k - 1) * self.arcs + arc
    }

    /// Row of the conservation constraint of commodity `k` at vertex `v`.
    #[inline(always)]
    pub fn flow_row(&self, k: usize, v: VertexId) -> usize {
        self.edge_rows() + (k - 1) * self.n + v
    }

    /// Row of the cost cutoff, if present.
    pub fn bound_row_index(&self) -> Option<usize> {
        self.bound_row.then(|| self.edge_rows() + self.flow_rows())
    }
}

// ============================================================================
// Model
// ============================================================================

/// Sparse constraint matrix in coordinate form, entries sorted by row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConstraintMatrix {
    rows: Vec<usize>,
    columns: Vec<usize>,
    values: Vec<f64>,
}

impl ConstraintMatrix {
    fn with_capacity(nnz: usize) -> Self {
        Self {
            rows: Vec::with_capacity(nnz),
            columns: Vec::with_capacity(nnz),
            values: Vec::with_capacity(nnz),
        }
    }

    #[inline(always)]
    fn push(&mut self, row: usize, column: usize, value: f64) {
        self.rows.push(row);
        self.columns.push(column);
        self.values.push(value);
    }

    /// Number of stored entries.
    #[inline]
    pub fn nonzeros(&self) -> usize {
        self.values.len()
    }

    /// Iterates over `(row, column, value)` triples.
    pub fn entries(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.rows
            .iter()
            .zip(&self.columns)
            .zip(&self.values)
            .map(|((&r, &c), &v)| (r, c, v))
    }
}

/// Right-hand side of a row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RowBound {
    /// `row <= value`.
    Upper(f64),
    /// `row == value`.
    Fixed(f64),
}

/// Kind of a column. Every column is bounded to `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    /// Integral, 0 or 1.
    Binary,
    /// Any value in `[0, 1]`.
    Continuous,
}

/// A complete MIP handed to a [`MipSolver`]: minimise `objective . x` subject to
/// `matrix x (row_bounds)`.
#[derive(Clone, Debug, PartialEq)]
pub struct MipModel {
    /// Dimensions and index scheme.
    pub params: IlpParams,
    /// Constraint coefficients.
    pub matrix: ConstraintMatrix,
    /// One bound per row.
    pub row_bounds: Vec<RowBound>,
    /// One kind per column.
    pub column_kinds: Vec<ColumnKind>,
    /// One objective coefficient per column.
    pub objective: Vec<f64>,
}

/// Builds the flow model of `graph` rooted at `terminals[0]`, with a cost cutoff
/// row when `upper_bound` is given. `terminals` must hold at least two vertices.
pub fn build_model(graph: &Graph, terminals: &[VertexId], upper_bound: Option<f64>) -> MipModel {
    let params = IlpParams::new(graph, terminals.len(), upper_bound.is_some());
    let mut matrix = ConstraintMatrix::with_capacity(params.nonzeros());
    let mut row_bounds = Vec::with_capacity(params.rows());

    // Edge selection: f^k_a - x_edge(a) <= 0.
    for k in 1..params.terminals {
        for arc in 0..params.arcs {
            let row = params.edge_row(k, arc);
            matrix.push(row, params.flow_column(k, arc), 1.0);
            matrix.push(row, params.x_column(arc / 2), -1.0);
            row_bounds.push(RowBound::Upper(0.0));
        }
    }

    // Flow conservation: net outflow of commodity k.
    let root = terminals[0];
    for (k, &sink) in terminals.iter().enumerate().skip(1) {
        for v in 0..params.n {
            let row = params.flow_row(k, v);
            for (position, &e) in graph.incident(v).iter().enumerate() {
                let (out_arc, in_arc) = arcs_at(graph, v, e, position);
                matrix.push(row, params.flow_column(k, out_arc), 1.0);
                matrix.push(row, params.flow_column(k, in_arc), -1.0);
            }
            let supply = if v == root {
                1.0
            } else if v == sink {
                -1.0
            } else {
                0.0
            };
            row_bounds.push(RowBound::Fixed(supply));
        }
    }

    if let (Some(bound), Some(row)) = (upper_bound, params.bound_row_index()) {
        for (e, edge) in graph.edges().iter().enumerate() {
            matrix.push(row, params.x_column(e), edge.cost);
        }
        row_bounds.push(RowBound::Upper(bound));
    }

    debug_assert_eq!(matrix.nonzeros(), params.nonzeros());
    debug_assert_eq!(row_bounds.len(), params.rows());

    let mut column_kinds = vec![ColumnKind::Binary; params.m];
    column_kinds.resize(params.columns(), ColumnKind::Continuous);
    let mut objective: Vec<f64> = graph.edges().iter().map(|edge| edge.cost).collect();
    objective.resize(params.columns(), 0.0);

    MipModel {
        params,
        matrix,
        row_bounds,
        column_kinds,
        objective,
    }
}

/// Returns `(arc leaving v, arc entering v)` for the adjacency entry of edge `e` at
/// position `position` of `v`'s list. A loop is listed twice; its second entry
/// takes the reverse orientation so that the loop's net flow is zero.
fn arcs_at(graph: &Graph, v: VertexId, e: EdgeIndex, position: usize) -> (usize, usize) {
    let forward = (2 * e, 2 * e + 1);
    let edge = graph.edge(e);
    if edge.is_loop() {
        let second = graph.incident(v)[..position].contains(&e);
        if second {
            (forward.1, forward.0)
        } else {
            forward
        }
    } else if edge.v == v {
        forward
    } else {
        (forward.1, forward.0)
    }
}

// ============================================================================
// Solver backend
// ============================================================================

/// A mixed-integer solver backend.
pub trait MipSolver {
    /// Solves `model` to optimality and returns one value per column, in column order.
    ///
    /// # Errors
    /// Returns [`IlpError::Solver`] if no optimal solution is found.
    fn solve(&self, model: &MipModel) -> Result<Vec<f64>, IlpError>;
}

/// [`MipSolver`] backed by `good_lp`'s default solver.
#[derive(Clone, Copy, Debug, Default)]
pub struct GoodLpSolver;

impl MipSolver for GoodLpSolver {
    fn solve(&self, model: &MipModel) -> Result<Vec<f64>, IlpError> {
        let mut vars = variables!();
        let columns: Vec<Variable> = model
            .column_kinds
            .iter()
            .map(|kind| match kind {
                ColumnKind::Binary => vars.add(variable().binary()),
                ColumnKind::Continuous => vars.add(variable().min(0.0).max(1.0)),
            })
            .collect();

        let mut objective = Expression::with_capacity(model.params.m);
        for (&cost, &column) in model.objective.iter().zip(&columns) {
            if cost != 0.0 {
                objective.add_mul(cost, column);
            }
        }

        let mut rows: Vec<Expression> = vec![Expression::default(); model.row_bounds.len()];
        for (row, column, value) in model.matrix.entries() {
            rows[row].add_mul(value, columns[column]);
        }

        let mut problem = vars.minimise(objective).using(default_solver);
        for (row, bound) in rows.into_iter().zip(&model.row_bounds) {
            problem = problem.with(match *bound {
                RowBound::Upper(value) => row.leq(value),
                RowBound::Fixed(value) => row.eq(value),
            });
        }

        let solution = problem
            .solve()
            .map_err(|err| IlpError::Solver(err.to_string()))?;
        Ok(columns.iter().map(|&column| solution.value(column)).collect())
    }
}

// ============================================================================
// Reduction
// ============================================================================

/// Outcome of [`reduce_graph`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reduction {
    /// Number of removed edges.
    pub removed: usize,
    /// For every remaining edge, its index before the reduction.
    pub kept: Vec<EdgeIndex>,
}

/// Removes every edge `{v, w}` whose endpoints are joined by a strictly cheaper
/// path. Such an edge is never part of a minimum Steiner tree: replacing it with
/// the path and dropping any resulting cycle lowers the cost.
///
/// Edges are tested in parallel, each worker with private scratch space; the graph
/// is then compacted on the calling thread.
pub fn reduce_graph(graph: &mut Graph) -> Reduction {
    let n = graph.vertex_count();
    let shared: &Graph = graph;
    let keep: Vec<bool> = (0..shared.edge_count())
        .into_par_iter()
        .map_init(
            || PathsData::new(n),
            |paths, e| {
                let edge = shared.edge(e);
                dijkstra(edge.v, paths, shared);
                let keep = paths.distance(edge.w) >= edge.cost;
                paths.reset();
                keep
            },
        )
        .collect();

    let before = graph.edge_count();
    let kept = graph.retain_edges(&keep);
    Reduction {
        removed: before - kept.len(),
        kept,
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Options of the exact strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IlpOptions {
    /// Run [`reduce_graph`] first.
    pub reduce: bool,
    /// Add a cost cutoff row bounded by a parallel 2-approximation.
    pub upper_bound: bool,
}

/// Computes a minimum Steiner tree with `solver`.
///
/// With `options.reduce` the graph is reduced in place first, and the returned edge
/// indices refer to the reduced graph. A single terminal yields the empty tree
/// without calling the solver.
///
/// # Errors
/// Returns an error if the solver fails, which happens when the terminals are not
/// connected.
pub fn ilp<S: MipSolver + ?Sized>(
    graph: &mut Graph,
    terminals: &[VertexId],
    options: IlpOptions,
    solver: &S,
) -> Result<SteinerTree, IlpError> {
    if terminals.len() <= 1 {
        return Ok(SteinerTree::empty());
    }

    if options.reduce {
        let reduction = reduce_graph(graph);
        info!(
            "reduction removed {} of {} edges",
            reduction.removed,
            reduction.removed + reduction.kept.len()
        );
    }

    let upper_bound = if options.upper_bound {
        let heuristic = parallel_two_apx(graph, terminals);
        if heuristic.is_empty() {
            warn!("no 2-approximation available; solving without a cost cutoff");
            None
        } else {
            Some(heuristic.cost(graph))
        }
    } else {
        None
    };

    let model = build_model(graph, terminals, upper_bound);
    info!(
        "flow model: {} rows, {} columns, {} nonzeros{}",
        model.params.rows(),
        model.params.columns(),
        model.matrix.nonzeros(),
        upper_bound.map_or(String::new(), |ub| format!(", cutoff {ub:.2}"))
    );

    let values = solver.solve(&model)?;
    if values.len() != model.params.columns() {
        return Err(IlpError::SolutionLength {
            expected: model.params.columns(),
            found: values.len(),
        });
    }

    let selected: Vec<bool> = values[..model.params.m]
        .iter()
        .map(|&x| x > SELECTION_THRESHOLD)
        .collect();
    debug!(
        "solver selected {} edges",
        selected.iter().filter(|&&s| s).count()
    );

    // Zero-cost edges may be selected without carrying flow; span the component
    // of the root to return a tree.
    let root = terminals[0];
    let mut vertices = vec![root];
    let mut touched = vec![false; graph.vertex_count()];
    touched[root] = true;
    for (e, _) in selected.iter().enumerate().filter(|&(_, &s)| s) {
        let edge = graph.edge(e);
        for u in [edge.v, edge.w] {
            if !touched[u] {
                touched[u] = true;
                vertices.push(u);
            }
        }
    }
    Ok(SteinerTree::span_subgraph(graph, &vertices, &selected))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::*;
    use crate::graph::Terminals;
    use crate::validate::validate_steiner_tree;

    fn solve_exact(graph: &mut Graph, terminals: &[VertexId], options: IlpOptions) -> SteinerTree {
        ilp(graph, terminals, options, &GoodLpSolver).unwrap()
    }

    /// Backend returning a fixed answer, for exercising the extraction path.
    struct Canned(Vec<f64>);

    impl MipSolver for Canned {
        fn solve(&self, _: &MipModel) -> Result<Vec<f64>, IlpError> {
            Ok(self.0.clone())
        }
    }

    struct Failing;

    impl MipSolver for Failing {
        fn solve(&self, _: &MipModel) -> Result<Vec<f64>, IlpError> {
            Err(IlpError::Solver("infeasible".into()))
        }
    }

    #[test]
    fn params_on_scenario_a() {
        let (g, t) = scenario_a();
        let p = IlpParams::new(&g, t.len(), true);
        assert_eq!((p.n, p.m, p.arcs, p.commodities), (4, 5, 10, 2));
        assert_eq!(p.columns(), 5 + 2 * 10);
        assert_eq!(p.rows(), 2 * 10 + 2 * 4 + 1);
        assert_eq!(p.nonzeros(), 2 * 20 + 2 * 2 * 10 + 5);
        assert_eq!(p.flow_column(1, 0), 5);
        assert_eq!(p.flow_column(2, 9), 24);
        assert_eq!(p.flow_row(2, 3), 20 + 4 + 3);
        assert_eq!(p.bound_row_index(), Some(28));
    }

    #[test]
    fn model_fill_matches_closed_form() {
        for bound in [None, Some(5.0)] {
            let (g, t) = parsed(WIKI);
            let model = build_model(&g, &t, bound);
            assert_eq!(model.matrix.nonzeros(), model.params.nonzeros());
            assert_eq!(model.row_bounds.len(), model.params.rows());
            assert_eq!(model.column_kinds.len(), model.params.columns());
            let rows: Vec<usize> = model.matrix.entries().map(|(r, _, _)| r).collect();
            assert!(rows.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn flow_rows_carry_supply_and_balance() {
        let (g, t) = scenario_a();
        let model = build_model(&g, &t, None);
        let p = model.params;
        assert_eq!(model.row_bounds[p.flow_row(1, 0)], RowBound::Fixed(1.0));
        assert_eq!(model.row_bounds[p.flow_row(1, 1)], RowBound::Fixed(-1.0));
        assert_eq!(model.row_bounds[p.flow_row(1, 2)], RowBound::Fixed(0.0));
        assert_eq!(model.row_bounds[p.flow_row(2, 2)], RowBound::Fixed(-1.0));

        // Vertex 0 is the tail of edges 0 and 4 and the head of edge 3.
        let mut row: Vec<(usize, f64)> = model
            .matrix
            .entries()
            .filter(|&(r, _, _)| r == p.flow_row(1, 0))
            .map(|(_, c, v)| (c - p.flow_column(1, 0), v))
            .collect();
        row.sort_by_key(|&(arc, _)| arc);
        assert_eq!(
            row,
            vec![(0, 1.0), (1, -1.0), (6, -1.0), (7, 1.0), (8, 1.0), (9, -1.0)]
        );
    }

    #[test]
    fn loops_have_zero_net_flow() {
        let mut g = Graph::new(2);
        g.add_edge(0, 1, 1.0);
        g.add_edge(1, 1, 1.0);
        let model = build_model(&g, &[0, 1], None);
        let p = model.params;
        let mut net = [0.0; 4];
        for (r, c, v) in model.matrix.entries() {
            if r == p.flow_row(1, 1) {
                net[c - p.flow_column(1, 0)] += v;
            }
        }
        assert_eq!(net, [-1.0, 1.0, 0.0, 0.0]);
        assert_eq!(model.matrix.nonzeros(), p.nonzeros());
    }

    #[test]
    fn reduction_removes_dominated_edges() {
        let (mut g, _) = parsed(SHORTCUT);
        let reduction = reduce_graph(&mut g);
        assert_eq!(reduction.removed, 2);
        assert_eq!(reduction.kept, vec![0, 1, 2]);
        assert_eq!(g.edge_count(), 3);
        assert_eq!(g.degree_sum(), 6);
        assert!(g.edges().iter().all(|e| e.cost < 4.0));
    }

    #[test]
    fn reduction_keeps_equal_cost_parallel_edges() {
        let mut g = Graph::new(2);
        g.add_edge(0, 1, 2.0);
        g.add_edge(0, 1, 3.0);
        g.add_edge(1, 0, 2.0);
        let reduction = reduce_graph(&mut g);
        assert_eq!(reduction.kept, vec![0, 2]);
    }

    #[test]
    fn reduction_preserves_optimum() {
        for seed in 0..15 {
            let (g, t) = random_instance(seed, 7, 0.4, 3);
            let optimum = brute_force_optimum(&g, &t);
            let mut reduced = g.clone();
            reduce_graph(&mut reduced);
            assert_eq!(brute_force_optimum(&reduced, &t), optimum, "seed {seed}");
        }
    }

    #[test]
    fn exact_on_scenario_a() {
        let (mut g, t) = scenario_a();
        let tree = solve_exact(&mut g, &t, IlpOptions::default());
        let mut edges = tree.edges().to_vec();
        edges.sort_unstable();
        assert_eq!(edges, vec![0, 1]);
    }

    #[test]
    fn exact_on_wiki_example_with_all_options() {
        for (reduce, upper_bound) in [(false, false), (true, false), (false, true), (true, true)] {
            let (mut g, t) = parsed(WIKI);
            let tree = solve_exact(&mut g, &t, IlpOptions { reduce, upper_bound });
            assert_eq!(validate_steiner_tree(&tree, &t, &g), Ok(()));
            assert_eq!(tree.cost(&g), 190.0);
        }
    }

    #[test]
    fn exact_matches_brute_force() {
        for seed in 0..12 {
            let (g, t) = random_instance(seed, 7, 0.3, 2 + (seed as usize % 3));
            let optimum = brute_force_optimum(&g, &t);
            let mut work = g.clone();
            let tree = solve_exact(&mut work, &t, IlpOptions { reduce: seed % 2 == 0, upper_bound: true });
            assert_eq!(validate_steiner_tree(&tree, &t, &work), Ok(()), "seed {seed}");
            assert!((tree.cost(&work) - optimum).abs() < 1e-6, "seed {seed}");
        }
    }

    #[test]
    fn single_terminal_skips_the_solver() {
        let (mut g, _) = scenario_a();
        let t = Terminals::new(vec![2]).unwrap();
        assert!(ilp(&mut g, &t, IlpOptions::default(), &Failing).unwrap().is_empty());
    }

    #[test]
    fn solver_failure_is_propagated() {
        let (mut g, t) = scenario_a();
        assert_eq!(
            ilp(&mut g, &t, IlpOptions::default(), &Failing),
            Err(IlpError::Solver("infeasible".into()))
        );
        assert_eq!(
            ilp(&mut g, &t, IlpOptions::default(), &Canned(vec![1.0])),
            Err(IlpError::SolutionLength { expected: 25, found: 1 })
        );
    }

    #[test]
    fn extraction_spans_the_selected_component() {
        // Selects the optimum plus edges 2-3 and 3-0, closing a cycle.
        let (mut g, t) = scenario_a();
        let mut values = vec![0.0; 25];
        values[..5].copy_from_slice(&[1.0, 0.9, 0.7, 0.6, 0.2]);
        let tree = ilp(&mut g, &t, IlpOptions::default(), &Canned(values)).unwrap();
        assert_eq!(validate_steiner_tree(&tree, &t, &g), Ok(()));
        assert_eq!(tree.len(), 3);
    }
}
