//! Adjacency-indexed weighted undirected graphs, terminal sets and the STP instance format.

use log::warn;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::ops::Deref;
use std::path::Path;
use thiserror::Error;

/// Vertex identifier (0-based).
pub type VertexId = usize;

/// Index into the edge sequence of a [`Graph`].
pub type EdgeIndex = usize;

// ============================================================================
// Edge
// ============================================================================

/// An undirected edge `{v, w}` with a non-negative cost.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    /// First endpoint (the tail of the edge's first arc in the exact model).
    pub v: VertexId,
    /// Second endpoint.
    pub w: VertexId,
    /// Non-negative edge cost.
    pub cost: f64,
}

impl Edge {
    /// Returns the endpoint opposite to `u`.
    #[inline(always)]
    pub fn other(&self, u: VertexId) -> VertexId {
        debug_assert!(u == self.v || u == self.w, "{u} is not an endpoint");
        if self.w == u {
            self.v
        } else {
            self.w
        }
    }

    /// Returns `true` if both endpoints coincide.
    #[inline(always)]
    pub fn is_loop(&self) -> bool {
        self.v == self.w
    }
}

// ============================================================================
// Graph
// ============================================================================

/// A weighted undirected graph with per-vertex adjacency lists of edge indices.
///
/// Invariant: every index stored in `adjacency[u]` refers to an edge having `u`
/// as an endpoint. Each edge index appears in the lists of both endpoints.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graph {
    edges: Vec<Edge>,
    adjacency: Vec<Vec<EdgeIndex>>,
}

impl Graph {
    /// Creates a graph with `n` isolated vertices.
    pub fn new(n: usize) -> Self {
        Self::with_capacity(n, 0)
    }

    /// Creates a graph with `n` isolated vertices and room for `m` edges.
    pub fn with_capacity(n: usize, m: usize) -> Self {
        Self {
            edges: Vec::with_capacity(m),
            adjacency: vec![Vec::new(); n],
        }
    }

    /// Adds the undirected edge `{v, w}` and returns its index.
    ///
    /// # Panics
    /// Panics if `v` or `w` is not a vertex of the graph.
    pub fn add_edge(&mut self, v: VertexId, w: VertexId, cost: f64) -> EdgeIndex {
        debug_assert!(cost >= 0.0, "negative edge cost {cost} on ({v}, {w})");
        let index = self.edges.len();
        self.adjacency[v].push(index);
        self.adjacency[w].push(index);
        self.edges.push(Edge { v, w, cost });
        index
    }

    /// Number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of edges.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns the edge with index `e`.
    #[inline(always)]
    pub fn edge(&self, e: EdgeIndex) -> &Edge {
        &self.edges[e]
    }

    /// All edges in index order.
    #[inline]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Indices of the edges incident to `u`.
    #[inline(always)]
    pub fn incident(&self, u: VertexId) -> &[EdgeIndex] {
        &self.adjacency[u]
    }

    /// Number of adjacency entries of `u` (a loop counts twice).
    #[inline(always)]
    pub fn degree(&self, u: VertexId) -> usize {
        self.adjacency[u].len()
    }

    /// Sum of all vertex degrees, `2m` for a well-formed graph.
    pub fn degree_sum(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    /// Sums the costs of the given edges.
    pub fn cost_of<I: IntoIterator<Item = EdgeIndex>>(&self, edges: I) -> f64 {
        edges.into_iter().map(|e| self.edges[e].cost).sum()
    }

    /// Builds the subgraph induced by `vertices`, optionally restricted to the edges
    /// whose entry in `edge_mask` is `true`.
    ///
    /// Vertex `vertices[i]` becomes vertex `i` of the subgraph. Every qualifying edge is
    /// emitted exactly once; loops are never emitted.
    pub fn induced_subgraph(
        &self,
        vertices: &[VertexId],
        edge_mask: Option<&[bool]>,
    ) -> InducedSubGraph {
        let mut new_id: Vec<Option<VertexId>> = vec![None; self.vertex_count()];
        let mut degree_bound = 0;
        for (i, &v) in vertices.iter().enumerate() {
            new_id[v] = Some(i);
            degree_bound += self.degree(v);
        }

        let mut graph = Graph::with_capacity(vertices.len(), degree_bound / 2);
        let mut original_edge = Vec::with_capacity(degree_bound / 2);

        for &u in vertices {
            for &e in &self.adjacency[u] {
                if edge_mask.is_some_and(|mask| !mask[e]) {
                    continue;
                }
                let edge = &self.edges[e];
                // Emitted from the `w` side only, so the `v` side skips it.
                if edge.is_loop() || u != edge.w {
                    continue;
                }
                let (Some(a), Some(b)) = (new_id[edge.v], new_id[edge.w]) else {
                    continue;
                };
                graph.add_edge(a, b, edge.cost);
                original_edge.push(e);
            }
        }

        InducedSubGraph {
            graph,
            original_vertex: vertices.to_vec(),
            original_edge,
        }
    }

    /// Removes every edge whose entry in `keep` is `false`, compacting the edge
    /// sequence in place (kept edges preserve their relative order) and remapping
    /// all adjacency lists.
    ///
    /// Returns, for every kept edge, its index before the call.
    pub fn retain_edges(&mut self, keep: &[bool]) -> Vec<EdgeIndex> {
        debug_assert_eq!(keep.len(), self.edges.len());
        let mut new_position: Vec<Option<EdgeIndex>> = vec![None; self.edges.len()];
        let mut kept = Vec::with_capacity(self.edges.len());

        let mut write = 0;
        for read in 0..self.edges.len() {
            if keep[read] {
                self.edges[write] = self.edges[read];
                new_position[read] = Some(write);
                kept.push(read);
                write += 1;
            }
        }
        self.edges.truncate(write);

        for list in &mut self.adjacency {
            list.retain_mut(|e| match new_position[*e] {
                Some(p) => {
                    *e = p;
                    true
                }
                None => false,
            });
        }
        kept
    }

    /// Generates a connected graph: a random spanning tree plus every other vertex pair
    /// independently with probability `extra_edge_probability`. Costs are integral,
    /// drawn uniformly from `1..=max_cost`.
    pub fn random_connected<R: Rng>(
        rng: &mut R,
        n: usize,
        extra_edge_probability: f64,
        max_cost: u32,
    ) -> Self {
        debug_assert!((0.0..=1.0).contains(&extra_edge_probability));
        debug_assert!(max_cost >= 1);

        let mut order: Vec<VertexId> = (0..n).collect();
        order.shuffle(rng);

        let mut graph = Graph::new(n);
        let mut present = HashSet::new();
        for i in 1..n {
            let parent = order[rng.random_range(0..i)];
            let child = order[i];
            present.insert((parent.min(child), parent.max(child)));
            graph.add_edge(parent, child, f64::from(rng.random_range(1..=max_cost)));
        }
        for v in 0..n {
            for w in (v + 1)..n {
                if !present.contains(&(v, w)) && rng.random_bool(extra_edge_probability) {
                    graph.add_edge(v, w, f64::from(rng.random_range(1..=max_cost)));
                }
            }
        }
        graph
    }
}

// ============================================================================
// InducedSubGraph
// ============================================================================

/// A subgraph with index mappings back to the graph it was extracted from.
#[derive(Clone, Debug)]
pub struct InducedSubGraph {
    /// The renumbered subgraph.
    pub graph: Graph,
    /// `original_vertex[i]` is the source-graph id of subgraph vertex `i`.
    pub original_vertex: Vec<VertexId>,
    /// `original_edge[e]` is the source-graph index of subgraph edge `e`.
    pub original_edge: Vec<EdgeIndex>,
}

// ============================================================================
// Terminals
// ============================================================================

/// A non-empty, duplicate-free, ordered set of terminal vertices.
///
/// The first terminal is the root of the exact model and the seed of
/// Takahashi–Matsuyama.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Terminals(Vec<VertexId>);

impl Terminals {
    /// Builds a terminal set, dropping repeated vertices (the first occurrence wins).
    ///
    /// Returns `None` if `vertices` is empty.
    pub fn new(vertices: Vec<VertexId>) -> Option<Self> {
        if vertices.is_empty() {
            return None;
        }
        let mut seen = HashSet::with_capacity(vertices.len());
        let distinct: Vec<VertexId> = vertices.into_iter().filter(|v| seen.insert(*v)).collect();
        Some(Self(distinct))
    }

    /// The first terminal.
    #[inline]
    pub fn root(&self) -> VertexId {
        self.0[0]
    }

    /// Per-vertex membership flags for a graph with `n` vertices.
    pub fn mask(&self, n: usize) -> Vec<bool> {
        let mut is_terminal = vec![false; n];
        for &t in &self.0 {
            is_terminal[t] = true;
        }
        is_terminal
    }

    /// Draws `k` distinct terminals uniformly from `0..n`.
    ///
    /// # Panics
    /// Panics if `k == 0` or `k > n`.
    pub fn random<R: Rng>(rng: &mut R, n: usize, k: usize) -> Self {
        assert!(k >= 1 && k <= n, "cannot draw {k} terminals from {n} vertices");
        Self(rand::seq::index::sample(rng, n, k).into_vec())
    }
}

impl Deref for Terminals {
    type Target = [VertexId];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// A parsed problem instance.
#[derive(Clone, Debug)]
pub struct Instance {
    /// The input graph.
    pub graph: Graph,
    /// The terminal set.
    pub terminals: Terminals,
}

impl Instance {
    /// Reads and parses an instance file.
    ///
    /// # Errors
    /// Returns an error if the file can't be read or is not a valid instance.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, GraphParseError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| GraphParseError::Io {
            path: path.display().to_string(),
            source,
        })?;
        parse_instance(&text)
    }
}

/// Errors encountered while parsing an instance. Line numbers are 1-based.
#[derive(Debug, Error)]
pub enum GraphParseError {
    /// Input ended before a required line.
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEnd {
        /// What the parser was looking for.
        expected: &'static str,
    },
    /// A line did not have the expected shape.
    #[error("line {line}: expected {expected}, found {found:?}")]
    Malformed {
        /// Line number.
        line: usize,
        /// Description of the expected content.
        expected: &'static str,
        /// The offending line.
        found: String,
    },
    /// A vertex id outside `1..=n`.
    #[error("line {line}: vertex {vertex} is out of range 1..={n}")]
    VertexOutOfRange {
        /// Line number.
        line: usize,
        /// The 1-based id as written.
        vertex: usize,
        /// Number of vertices.
        n: usize,
    },
    /// A negative or non-finite edge cost.
    #[error("line {line}: invalid edge cost {cost}")]
    InvalidCost {
        /// Line number.
        line: usize,
        /// The offending cost.
        cost: f64,
    },
    /// The edge section did not contain the announced number of edges.
    #[error("edge section announces {announced} edges but contains {found}")]
    EdgeCountMismatch {
        /// Count from the `Edges` line.
        announced: usize,
        /// Edge lines actually read.
        found: usize,
    },
    /// The terminal section is empty.
    #[error("instance has no terminals")]
    NoTerminals,
    /// The file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// Path of the file.
        path: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

/// Line cursor yielding trimmed, non-blank lines with their 1-based numbers.
struct LineCursor<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> LineCursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
        }
    }

    fn next_line(&mut self, expected: &'static str) -> Result<(usize, &'a str), GraphParseError> {
        self.lines
            .by_ref()
            .map(|(i, l)| (i + 1, l.trim()))
            .find(|(_, l)| !l.is_empty())
            .ok_or(GraphParseError::UnexpectedEnd { expected })
    }

    /// Skips forward to the first line starting with `prefix`.
    fn seek(&mut self, prefix: &str, expected: &'static str) -> Result<(usize, &'a str), GraphParseError> {
        loop {
            let (line, text) = self.next_line(expected)?;
            if text.starts_with(prefix) {
                return Ok((line, text));
            }
        }
    }
}

fn malformed(line: usize, expected: &'static str, found: &str) -> GraphParseError {
    GraphParseError::Malformed {
        line,
        expected,
        found: found.to_string(),
    }
}

/// Parses `KEY value` into `value`.
fn key_value(line: usize, text: &str, key: &str, expected: &'static str) -> Result<usize, GraphParseError> {
    text.strip_prefix(key)
        .and_then(|rest| rest.trim().parse().ok())
        .ok_or_else(|| malformed(line, expected, text))
}

/// Converts a 1-based vertex id from the file into a 0-based [`VertexId`].
fn vertex_id(line: usize, raw: usize, n: usize) -> Result<VertexId, GraphParseError> {
    if raw == 0 || raw > n {
        return Err(GraphParseError::VertexOutOfRange { line, vertex: raw, n });
    }
    Ok(raw - 1)
}

fn parse_edge_line(line: usize, text: &str, n: usize) -> Result<(VertexId, VertexId, f64), GraphParseError> {
    const EXPECTED: &str = "`E v w cost`";
    let mut fields = text.split_whitespace();
    if fields.next() != Some("E") {
        return Err(malformed(line, EXPECTED, text));
    }
    let mut vertex = || -> Result<VertexId, GraphParseError> {
        let raw = fields
            .next()
            .and_then(|f| f.parse().ok())
            .ok_or_else(|| malformed(line, EXPECTED, text))?;
        vertex_id(line, raw, n)
    };
    let v = vertex()?;
    let w = vertex()?;
    let cost: f64 = fields
        .next()
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| malformed(line, EXPECTED, text))?;
    if !cost.is_finite() || cost < 0.0 {
        return Err(GraphParseError::InvalidCost { line, cost });
    }
    Ok((v, w, cost))
}

/// Parses an instance in the STP text format.
///
/// Layout:
/// - `Nodes n` and `Edges m` (anything before `Nodes` is treated as header);
/// - edge lines `E v w cost` with 1-based ids, terminated by `END`;
/// - any lines up to `Terminals t`, then `t` lines `T v`.
///
/// Repeated terminals are dropped with a warning.
///
/// # Errors
/// Returns an error if a required line is missing or malformed, an id is out of range,
/// a cost is negative, or the edge count does not match its announcement.
pub fn parse_instance(text: &str) -> Result<Instance, GraphParseError> {
    let mut cursor = LineCursor::new(text);

    let (line, nodes) = cursor.seek("Nodes", "`Nodes n`")?;
    let n = key_value(line, nodes, "Nodes", "`Nodes n`")?;
    let (line, edges) = cursor.next_line("`Edges m`")?;
    let m = key_value(line, edges, "Edges", "`Edges m`")?;

    let mut graph = Graph::with_capacity(n, m);
    loop {
        let (line, text) = cursor.next_line("`E v w cost` or `END`")?;
        if text.starts_with("END") {
            break;
        }
        let (v, w, cost) = parse_edge_line(line, text, n)?;
        graph.add_edge(v, w, cost);
    }
    if graph.edge_count() != m {
        return Err(GraphParseError::EdgeCountMismatch {
            announced: m,
            found: graph.edge_count(),
        });
    }

    let (line, header) = cursor.seek("Terminals", "`Terminals t`")?;
    let t = key_value(line, header, "Terminals", "`Terminals t`")?;
    let mut vertices = Vec::with_capacity(t);
    for _ in 0..t {
        let (line, text) = cursor.next_line("`T v`")?;
        let raw = key_value(line, text, "T", "`T v`")?;
        vertices.push(vertex_id(line, raw, n)?);
    }

    let terminals = Terminals::new(vertices).ok_or(GraphParseError::NoTerminals)?;
    if terminals.len() != t {
        warn!("dropped {} repeated terminal lines", t - terminals.len());
    }
    Ok(Instance { graph, terminals })
}

// ============================================================================
// Test fixtures
// ============================================================================

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::validate::is_steiner_tree;
    use crate::SteinerTree;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    /// Square `0-1-2-3-0` with unit costs plus the diagonal `0-2` of cost 3.
    /// Terminals `{0, 1, 2}`, optimum 2 via `{0-1, 1-2}`.
    pub(crate) fn scenario_a() -> (Graph, Terminals) {
        let mut g = Graph::new(4);
        g.add_edge(0, 1, 1.0);
        g.add_edge(1, 2, 1.0);
        g.add_edge(2, 3, 1.0);
        g.add_edge(3, 0, 1.0);
        g.add_edge(0, 2, 3.0);
        (g, Terminals::new(vec![0, 1, 2]).unwrap())
    }

    /// Star with center `0` and `k` unit-cost spokes; the leaves are the terminals.
    pub(crate) fn star(k: usize) -> (Graph, Terminals) {
        let mut g = Graph::new(k + 1);
        for leaf in 1..=k {
            g.add_edge(0, leaf, 1.0);
        }
        (g, Terminals::new((1..=k).collect()).unwrap())
    }

    /// ```text
    ///    1
    ///  0----1
    ///  |  / |
    /// 7| /1 |2
    ///  |/   |
    ///  2----3
    ///    4
    /// ```
    /// Terminals `{0, 2}`, optimum 2.
    pub(crate) const SHORTCUT: &str = "SECTION Graph\n\
        Nodes 4\n\
        Edges 5\n\
        E 2 1 1\n\
        E 2 4 2\n\
        E 2 3 1\n\
        E 4 3 4\n\
        E 1 3 7\n\
        END\n\
        \n\
        SECTION Terminals\n\
        Terminals 2\n\
        T 1\n\
        T 3\n\
        END\n\
        \n\
        EOF\n";

    /// Wikipedia's Steiner tree example, optimum 190.
    pub(crate) const WIKI: &str = "SECTION Graph\n\
        Nodes 12\n\
        Edges 15\n\
        E 1 2 15\n\
        E 2 3 30\n\
        E 3 4 50\n\
        E 4 7 30\n\
        E 1 5 25\n\
        E 2 9 50\n\
        E 2 6 45\n\
        E 3 6 40\n\
        E 6 8 60\n\
        E 7 8 20\n\
        E 5 9 30\n\
        E 9 11 15\n\
        E 8 10 50\n\
        E 11 10 40\n\
        E 12 11 10\n\
        END\n\
        \n\
        SECTION Terminals\n\
        Terminals 5\n\
        T 1\n\
        T 9\n\
        T 12\n\
        T 7\n\
        T 8\n\
        END\n\
        \n\
        EOF\n";

    pub(crate) fn parsed(text: &str) -> (Graph, Terminals) {
        let instance = parse_instance(text).unwrap();
        (instance.graph, instance.terminals)
    }

    /// Seeded random connected instance with `k` terminals.
    pub(crate) fn random_instance(seed: u64, n: usize, p: f64, k: usize) -> (Graph, Terminals) {
        let mut rng = XorShiftRng::seed_from_u64(seed);
        let graph = Graph::random_connected(&mut rng, n, p, 9);
        let terminals = Terminals::random(&mut rng, n, k);
        (graph, terminals)
    }

    /// Minimum Steiner tree cost by enumerating all edge subsets (small graphs only).
    pub(crate) fn brute_force_optimum(graph: &Graph, terminals: &Terminals) -> f64 {
        let m = graph.edge_count();
        assert!(m <= 20, "brute force is limited to 20 edges");
        let mut best = f64::INFINITY;
        for subset in 0u32..(1 << m) {
            let edges: Vec<EdgeIndex> = (0..m).filter(|&e| subset & (1 << e) != 0).collect();
            let cost = graph.cost_of(edges.iter().copied());
            if cost >= best {
                continue;
            }
            if is_steiner_tree(&SteinerTree::from_edges(edges), terminals, graph) {
                best = cost;
            }
        }
        best
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    fn assert_adjacency_consistent(g: &Graph) {
        for u in 0..g.vertex_count() {
            for &e in g.incident(u) {
                assert!(e < g.edge_count(), "dangling edge index {e} at {u}");
                let edge = g.edge(e);
                assert!(edge.v == u || edge.w == u);
            }
        }
        assert_eq!(g.degree_sum(), 2 * g.edge_count());
    }

    #[test]
    fn add_edge_registers_both_endpoints() {
        let mut g = Graph::new(3);
        let a = g.add_edge(0, 1, 2.0);
        let b = g.add_edge(1, 2, 5.0);
        assert_eq!((a, b), (0, 1));
        assert_eq!(g.incident(0), &[0]);
        assert_eq!(g.incident(1), &[0, 1]);
        assert_eq!(g.incident(2), &[1]);
        assert_eq!(g.degree_sum(), 4);
        assert_eq!(g.edge(1).other(2), 1);
    }

    #[test]
    fn induced_subgraph_emits_each_edge_once() {
        let (g, _) = scenario_a();
        let sub = g.induced_subgraph(&[0, 1, 2], None);
        assert_eq!(sub.graph.vertex_count(), 3);
        assert_eq!(sub.graph.edge_count(), 3);
        let mut original = sub.original_edge.clone();
        original.sort_unstable();
        assert_eq!(original, vec![0, 1, 4]);
        for (e, &orig) in sub.original_edge.iter().enumerate() {
            let edge = sub.graph.edge(e);
            let source = g.edge(orig);
            let mapped = [sub.original_vertex[edge.v], sub.original_vertex[edge.w]];
            assert!(mapped.contains(&source.v) && mapped.contains(&source.w));
            assert_eq!(edge.cost, source.cost);
        }
        assert_adjacency_consistent(&sub.graph);
    }

    #[test]
    fn induced_subgraph_respects_edge_mask() {
        let (g, _) = scenario_a();
        let mask = [true, false, true, true, false];
        let sub = g.induced_subgraph(&[3, 2, 0], Some(&mask));
        assert_eq!(sub.original_vertex, vec![3, 2, 0]);
        let mut original = sub.original_edge.clone();
        original.sort_unstable();
        assert_eq!(original, vec![2, 3]);
    }

    #[test]
    fn retain_edges_compacts_and_remaps() {
        let (mut g, _) = scenario_a();
        let kept = g.retain_edges(&[true, false, true, false, true]);
        assert_eq!(kept, vec![0, 2, 4]);
        assert_eq!(g.edge_count(), 3);
        assert_eq!(g.edge(1), &Edge { v: 2, w: 3, cost: 1.0 });
        assert_eq!(g.edge(2), &Edge { v: 0, w: 2, cost: 3.0 });
        assert_eq!(g.incident(1), &[0]);
        assert_adjacency_consistent(&g);
    }

    #[test]
    fn random_connected_is_connected_and_consistent() {
        let mut rng = XorShiftRng::seed_from_u64(0xC0FFEE);
        for n in [1, 2, 7, 30] {
            let g = Graph::random_connected(&mut rng, n, 0.2, 10);
            assert!(g.edge_count() >= n.saturating_sub(1));
            assert_adjacency_consistent(&g);

            let mut seen = vec![false; n];
            let mut stack = vec![0];
            seen[0] = true;
            while let Some(u) = stack.pop() {
                for &e in g.incident(u) {
                    let w = g.edge(e).other(u);
                    if !seen[w] {
                        seen[w] = true;
                        stack.push(w);
                    }
                }
            }
            assert!(seen.iter().all(|&s| s));
        }
    }

    #[test]
    fn terminals_drop_duplicates_and_keep_order() {
        let t = Terminals::new(vec![4, 1, 4, 2, 1]).unwrap();
        assert_eq!(&*t, &[4, 1, 2]);
        assert_eq!(t.root(), 4);
        assert!(Terminals::new(vec![]).is_none());
        assert_eq!(t.mask(5), vec![false, true, true, false, true]);
    }

    #[test]
    fn parse_wiki_example() {
        let (g, t) = parsed(WIKI);
        assert_eq!(g.vertex_count(), 12);
        assert_eq!(g.edge_count(), 15);
        assert_eq!(g.edge(0), &Edge { v: 0, w: 1, cost: 15.0 });
        assert_eq!(g.edge(14), &Edge { v: 11, w: 10, cost: 10.0 });
        assert_eq!(&*t, &[0, 8, 11, 6, 7]);
        assert_adjacency_consistent(&g);
    }

    #[test]
    fn parse_accepts_fractional_costs() {
        let text = "header\nNodes 2\nEdges 1\nE 1 2 2.5\nEND\nTerminals 1\nT 2\nEND\n";
        let (g, t) = parsed(text);
        assert_eq!(g.edge(0).cost, 2.5);
        assert_eq!(&*t, &[1]);
    }

    #[test]
    fn parse_rejects_out_of_range_vertex() {
        let text = "header\nNodes 2\nEdges 1\nE 1 3 1\nEND\nTerminals 1\nT 1\nEND\n";
        let err = parse_instance(text).unwrap_err();
        assert!(matches!(
            err,
            GraphParseError::VertexOutOfRange { line: 4, vertex: 3, n: 2 }
        ));
    }

    #[test]
    fn parse_rejects_negative_cost() {
        let text = "header\nNodes 2\nEdges 1\nE 1 2 -1\nEND\nTerminals 1\nT 1\nEND\n";
        assert!(matches!(
            parse_instance(text),
            Err(GraphParseError::InvalidCost { line: 4, .. })
        ));
    }

    #[test]
    fn parse_rejects_edge_count_mismatch() {
        let text = "header\nNodes 2\nEdges 2\nE 1 2 1\nEND\nTerminals 1\nT 1\nEND\n";
        assert!(matches!(
            parse_instance(text),
            Err(GraphParseError::EdgeCountMismatch { announced: 2, found: 1 })
        ));
    }

    #[test]
    fn parse_rejects_truncated_terminals() {
        let text = "header\nNodes 2\nEdges 1\nE 1 2 1\nEND\nTerminals 2\nT 1\n";
        assert!(matches!(
            parse_instance(text),
            Err(GraphParseError::UnexpectedEnd { .. })
        ));
    }

    #[test]
    fn parse_rejects_malformed_edge() {
        let text = "header\nNodes 2\nEdges 1\nE 1 x 1\nEND\nTerminals 1\nT 1\nEND\n";
        let err = parse_instance(text).unwrap_err();
        assert!(matches!(err, GraphParseError::Malformed { line: 4, .. }));
        assert!(err.to_string().contains("line 4"));
    }

    #[test]
    fn parse_rejects_zero_terminals() {
        let text = "header\nNodes 2\nEdges 1\nE 1 2 1\nEND\nTerminals 0\nEND\n";
        assert!(matches!(parse_instance(text), Err(GraphParseError::NoTerminals)));
    }

    #[test]
    fn load_missing_file_reports_io_error() {
        let err = Instance::load_from_file("/definitely/not/here.stp").unwrap_err();
        assert!(matches!(err, GraphParseError::Io { .. }));
    }
}
