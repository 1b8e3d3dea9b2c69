//! Metric-closure 2-approximation.
//!
//! 1. Build the metric closure over the terminals (pairwise shortest distances).
//! 2. Take a minimum spanning tree of the closure.
//! 3. Expand every closure-MST edge into its shortest path in the input graph,
//!    collecting the union of path edges and the vertices they touch.
//! 4. Span the subgraph induced by the collected vertices and edges with another
//!    MST, which removes cycles created by overlapping paths.
//!
//! The result costs at most twice the optimum. Step 3 runs either serially
//! ([`two_apx`]) or on the rayon pool ([`parallel_two_apx`]); both collect the same
//! edge union. The metric closure is always built in parallel.

use crate::graph::{Edge, EdgeIndex, Graph, VertexId};
use crate::mst::{prim, tree_edges};
use crate::paths::{dijkstra, PathsData};
use crate::tree::SteinerTree;
use log::{debug, warn};
use rayon::prelude::*;

// ============================================================================
// Worker context
// ============================================================================

/// Private state of one parallel worker: scratch shortest-path data and an
/// append-only output buffer. Never shared between workers.
#[derive(Clone, Debug)]
pub struct WorkerContext<T> {
    /// Scratch space, cleared after every query.
    pub paths: PathsData,
    /// Output collected by this worker, in processing order.
    pub buffer: Vec<T>,
}

impl<T> WorkerContext<T> {
    /// Creates a context for a graph with `n` vertices.
    pub fn new(n: usize) -> Self {
        Self {
            paths: PathsData::new(n),
            buffer: Vec::new(),
        }
    }
}

// ============================================================================
// Metric closure
// ============================================================================

/// Builds the metric closure over `terminals`: a graph on `terminals.len()` vertices
/// where vertex `i` stands for `terminals[i]` and edge `{i, j}` costs the shortest
/// distance between them. Unreachable pairs get no edge.
///
/// One Dijkstra per terminal except the last runs on the rayon pool; each worker
/// appends to its own buffer and the buffers are concatenated in terminal order.
pub fn metric_closure(graph: &Graph, terminals: &[VertexId]) -> Graph {
    let n = graph.vertex_count();
    let t = terminals.len();

    let contexts: Vec<WorkerContext<Edge>> = (0..t.saturating_sub(1))
        .into_par_iter()
        .fold(
            || WorkerContext::new(n),
            |mut ctx, i| {
                dijkstra(terminals[i], &mut ctx.paths, graph);
                for (j, &target) in terminals.iter().enumerate().skip(i + 1) {
                    let cost = ctx.paths.distance(target);
                    if cost.is_finite() {
                        ctx.buffer.push(Edge { v: i, w: j, cost });
                    }
                }
                ctx.paths.reset();
                ctx
            },
        )
        .collect();

    let mut closure = Graph::with_capacity(t, t * t.saturating_sub(1) / 2);
    for edge in contexts.iter().flat_map(|ctx| &ctx.buffer) {
        closure.add_edge(edge.v, edge.w, edge.cost);
    }
    debug!("metric closure: {} terminals, {} edges", t, closure.edge_count());
    closure
}

/// Returns the `(source, target)` terminal pairs of a closure MST, grouped by source.
///
/// `None` if there is nothing to connect or some terminal is unreachable from the first.
fn closure_mst_pairs(graph: &Graph, terminals: &[VertexId]) -> Option<Vec<(VertexId, VertexId)>> {
    if terminals.len() <= 1 {
        return None;
    }
    let closure = metric_closure(graph, terminals);
    let pred = prim(&closure, 0);
    if pred[1..].iter().any(Option::is_none) {
        warn!("terminals are not mutually reachable; returning an empty tree");
        return None;
    }

    let mut pairs: Vec<(VertexId, VertexId)> = tree_edges(&pred)
        .map(|e| {
            let edge = closure.edge(e);
            (terminals[edge.v], terminals[edge.w])
        })
        .collect();
    // Consecutive pairs with the same source share one Dijkstra run in the serial mode.
    pairs.sort_by_key(|&(source, _)| source);
    Some(pairs)
}

// ============================================================================
// Path expansion
// ============================================================================

/// Accumulates the union of path edges and the vertices they touch, never
/// inserting an edge twice.
struct EdgeCollector {
    edges: Vec<EdgeIndex>,
    visited: Vec<bool>,
    in_tree: Vec<bool>,
    vertices: Vec<VertexId>,
}

impl EdgeCollector {
    fn new(graph: &Graph) -> Self {
        Self {
            edges: Vec::new(),
            visited: vec![false; graph.edge_count()],
            in_tree: vec![false; graph.vertex_count()],
            vertices: Vec::new(),
        }
    }

    fn touch(&mut self, v: VertexId) {
        if !self.in_tree[v] {
            self.in_tree[v] = true;
            self.vertices.push(v);
        }
    }

    /// Inserts `e` unless already present; first writer wins.
    fn insert(&mut self, graph: &Graph, e: EdgeIndex) {
        if self.visited[e] {
            return;
        }
        self.visited[e] = true;
        self.edges.push(e);
        let edge = graph.edge(e);
        self.touch(edge.v);
        self.touch(edge.w);
    }

    /// Inserts a path, skipping its longest already-collected prefix and suffix.
    /// Interior edges are still checked, so a path that re-enters the collected
    /// set in several places is handled too.
    fn insert_path(&mut self, graph: &Graph, path: &[EdgeIndex]) {
        let prefix = path.iter().take_while(|&&e| self.visited[e]).count();
        if prefix == path.len() {
            return;
        }
        let suffix = path[prefix..]
            .iter()
            .rev()
            .take_while(|&&e| self.visited[e])
            .count();
        for &e in &path[prefix..path.len() - suffix] {
            self.insert(graph, e);
        }
    }

    /// Spans the collected subgraph with an MST and maps its edges back.
    fn into_tree(self, graph: &Graph) -> SteinerTree {
        debug!(
            "collected {} edges on {} vertices; pruning with an MST",
            self.edges.len(),
            self.vertices.len()
        );
        SteinerTree::span_subgraph(graph, &self.vertices, &self.visited)
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Serial 2-approximation.
///
/// Reuses one Dijkstra run for consecutive closure-MST edges with the same source.
/// Returns the empty tree for a single terminal or mutually unreachable terminals.
pub fn two_apx(graph: &Graph, terminals: &[VertexId]) -> SteinerTree {
    let Some(pairs) = closure_mst_pairs(graph, terminals) else {
        return SteinerTree::empty();
    };

    let mut collector = EdgeCollector::new(graph);
    let mut paths = PathsData::new(graph.vertex_count());
    let mut path = Vec::new();
    let mut last_source = None;

    for (source, target) in pairs {
        if last_source != Some(source) {
            paths.reset();
            dijkstra(source, &mut paths, graph);
            last_source = Some(source);
        }
        path.clear();
        path.extend(paths.walk_back(graph, target).map(|(e, _)| e));
        collector.insert_path(graph, &path);
    }
    collector.into_tree(graph)
}

/// Parallel 2-approximation.
///
/// Closure-MST edges are spread over the rayon pool; each worker runs its own
/// Dijkstra and appends every path edge to a private buffer. The buffers are then
/// merged sequentially in job order, deduplicating through a shared visited marker.
pub fn parallel_two_apx(graph: &Graph, terminals: &[VertexId]) -> SteinerTree {
    let Some(pairs) = closure_mst_pairs(graph, terminals) else {
        return SteinerTree::empty();
    };
    let n = graph.vertex_count();

    let contexts: Vec<WorkerContext<EdgeIndex>> = pairs
        .par_iter()
        .fold(
            || WorkerContext::new(n),
            |mut ctx, &(source, target)| {
                dijkstra(source, &mut ctx.paths, graph);
                ctx.buffer
                    .extend(ctx.paths.walk_back(graph, target).map(|(e, _)| e));
                ctx.paths.reset();
                ctx
            },
        )
        .collect();

    let mut collector = EdgeCollector::new(graph);
    for &e in contexts.iter().flat_map(|ctx| &ctx.buffer) {
        collector.insert(graph, e);
    }
    collector.into_tree(graph)
}

// ============================================================================
// Tests
// ============================================================================
