//! Shortest-path forests and multi-source Dijkstra.

use crate::graph::{EdgeIndex, Graph, VertexId};
use crate::heap::LazyMinHeap;

// ============================================================================
// PathsData
// ============================================================================

/// Per-vertex tentative distance and predecessor edge of a shortest-path forest.
///
/// A fresh (or [reset](PathsData::reset)) instance has every distance at `+inf`
/// and no predecessors. Scratch object: reuse it across queries with an explicit reset.
#[derive(Clone, Debug, PartialEq)]
pub struct PathsData {
    dist: Vec<f64>,
    pred_edge: Vec<Option<EdgeIndex>>,
}

impl PathsData {
    /// Creates cleared scratch space for a graph with `n` vertices.
    pub fn new(n: usize) -> Self {
        Self {
            dist: vec![f64::INFINITY; n],
            pred_edge: vec![None; n],
        }
    }

    /// Restores the cleared state.
    pub fn reset(&mut self) {
        self.dist.fill(f64::INFINITY);
        self.pred_edge.fill(None);
    }

    /// Distance from the source set to `v` (`+inf` if unreachable).
    #[inline(always)]
    pub fn distance(&self, v: VertexId) -> f64 {
        self.dist[v]
    }

    /// All distances.
    #[inline]
    pub fn distances(&self) -> &[f64] {
        &self.dist
    }

    /// Edge through which `v` was reached (`None` for sources and unreachable vertices).
    #[inline(always)]
    pub fn predecessor_edge(&self, v: VertexId) -> Option<EdgeIndex> {
        self.pred_edge[v]
    }

    /// Returns `true` if `v` was reached from the source set.
    #[inline]
    pub fn is_reachable(&self, v: VertexId) -> bool {
        self.dist[v].is_finite()
    }

    /// Walks the forest from `target` back to its source, yielding each predecessor
    /// edge together with the vertex it leads to (the one closer to the source).
    pub fn walk_back<'a>(&'a self, graph: &'a Graph, target: VertexId) -> PathWalk<'a> {
        PathWalk {
            paths: self,
            graph,
            current: target,
        }
    }

    /// Collects the edges on the path from the source set to `target`, in walk order
    /// (starting at `target`).
    pub fn path_edges(&self, graph: &Graph, target: VertexId) -> Vec<EdgeIndex> {
        self.walk_back(graph, target).map(|(e, _)| e).collect()
    }
}

/// Iterator produced by [`PathsData::walk_back`].
pub struct PathWalk<'a> {
    paths: &'a PathsData,
    graph: &'a Graph,
    current: VertexId,
}

impl Iterator for PathWalk<'_> {
    type Item = (EdgeIndex, VertexId);

    fn next(&mut self) -> Option<Self::Item> {
        let e = self.paths.pred_edge[self.current]?;
        self.current = self.graph.edge(e).other(self.current);
        Some((e, self.current))
    }
}

// ============================================================================
// Dijkstra
// ============================================================================

/// Multi-source Dijkstra: every vertex of `sources` starts at distance 0.
///
/// `paths` must be cleared (fresh or reset). Edge costs must be non-negative.
/// Vertices unreachable from the sources keep `+inf` and no predecessor.
pub fn multi_dijkstra(sources: &[VertexId], paths: &mut PathsData, graph: &Graph) {
    debug_assert!(!sources.is_empty());
    debug_assert_eq!(paths.dist.len(), graph.vertex_count());

    let mut heap = LazyMinHeap::with_capacity(graph.vertex_count());
    for &s in sources {
        paths.dist[s] = 0.0;
        heap.push(s, 0.0);
    }

    while let Some(entry) = heap.pop() {
        if entry.is_stale(&paths.dist) {
            continue;
        }
        let u = entry.key;
        for &e in graph.incident(u) {
            let edge = graph.edge(e);
            let w = edge.other(u);
            let candidate = entry.value + edge.cost;
            if candidate < paths.dist[w] {
                paths.dist[w] = candidate;
                paths.pred_edge[w] = Some(e);
                heap.push(w, candidate);
            }
        }
    }
}

/// Single-source Dijkstra from `source`.
#[inline]
pub fn dijkstra(source: VertexId, paths: &mut PathsData, graph: &Graph) {
    multi_dijkstra(&[source], paths, graph);
}

// ============================================================================
// Tests
// ============================================================================
