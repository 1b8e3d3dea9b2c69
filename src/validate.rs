//! Deterministic validation of Steiner trees and cost checks against known optima.

use crate::graph::{Graph, VertexId};
use crate::solve::Strategy;
use crate::tree::SteinerTree;
use thiserror::Error;

/// Absolute tolerance used when comparing costs.
const COST_TOLERANCE: f64 = 1e-6;

// ============================================================================
// Public API
// ============================================================================

/// Reasons a tree is rejected by [`validate_steiner_tree`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TreeValidationError {
    /// An edge index does not exist in the graph.
    #[error("edge index {edge} is out of range (graph has {edge_count} edges)")]
    InvalidEdge {
        /// The offending index.
        edge: usize,
        /// Number of edges of the graph.
        edge_count: usize,
    },
    /// An edge index occurs more than once.
    #[error("edge {0} occurs more than once")]
    DuplicateEdge(usize),
    /// A single terminal needs no edges.
    #[error("a single terminal requires an empty tree, got {0} edges")]
    NotEmpty(usize),
    /// `edges != vertices - 1`.
    #[error("structure is not a tree: {edges} edges on {vertices} vertices")]
    EdgeCountMismatch {
        /// Number of edges.
        edges: usize,
        /// Number of touched vertices.
        vertices: usize,
    },
    /// A terminal is not touched by any edge.
    #[error("terminal {0} is not in the tree")]
    MissingTerminal(VertexId),
    /// The touched vertices form more than one component.
    #[error("tree vertices are not connected")]
    Disconnected,
}

/// Checks that `tree` is a Steiner tree for `terminals` in `graph`:
/// valid and distinct edge indices, `|E| = |V| - 1` over the touched vertices,
/// every terminal touched, and all touched vertices in one component.
/// A single terminal is only satisfied by the empty tree.
///
/// # Errors
/// Returns the first violated property.
pub fn validate_steiner_tree(
    tree: &SteinerTree,
    terminals: &[VertexId],
    graph: &Graph,
) -> Result<(), TreeValidationError> {
    let mut used = vec![false; graph.edge_count()];
    for &e in tree.edges() {
        if e >= graph.edge_count() {
            return Err(TreeValidationError::InvalidEdge {
                edge: e,
                edge_count: graph.edge_count(),
            });
        }
        if used[e] {
            return Err(TreeValidationError::DuplicateEdge(e));
        }
        used[e] = true;
    }

    if terminals.len() <= 1 {
        return if tree.is_empty() {
            Ok(())
        } else {
            Err(TreeValidationError::NotEmpty(tree.len()))
        };
    }

    let mut components = UnionFind::new(graph.vertex_count());
    let mut in_tree = vec![false; graph.vertex_count()];
    for &e in tree.edges() {
        let edge = graph.edge(e);
        in_tree[edge.v] = true;
        in_tree[edge.w] = true;
        components.union(edge.v, edge.w);
    }

    let vertices = in_tree.iter().filter(|&&t| t).count();
    if tree.len() + 1 != vertices {
        return Err(TreeValidationError::EdgeCountMismatch {
            edges: tree.len(),
            vertices,
        });
    }

    if let Some(&t) = terminals.iter().find(|&&t| !in_tree[t]) {
        return Err(TreeValidationError::MissingTerminal(t));
    }

    let root = components.find(terminals[0]);
    for v in (0..graph.vertex_count()).filter(|&v| in_tree[v]) {
        if components.find(v) != root {
            return Err(TreeValidationError::Disconnected);
        }
    }
    Ok(())
}

/// Returns `true` iff [`validate_steiner_tree`] accepts the tree.
pub fn is_steiner_tree(tree: &SteinerTree, terminals: &[VertexId], graph: &Graph) -> bool {
    validate_steiner_tree(tree, terminals, graph).is_ok()
}

/// Outcome of comparing a result cost with a known optimum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CostVerdict {
    /// The cost equals the optimum.
    Optimal,
    /// Feasible, off the optimum by the given amount, within the strategy's guarantee.
    WithinGap(f64),
    /// The exact strategy missed the optimum.
    NotOptimal(f64),
    /// The 2-approximation exceeded twice the optimum.
    BoundViolated(f64),
}

impl CostVerdict {
    /// Returns `true` if the verdict breaks the strategy's guarantee.
    pub fn is_failure(&self) -> bool {
        matches!(self, CostVerdict::NotOptimal(_) | CostVerdict::BoundViolated(_))
    }
}

/// Compares `cost` with the known `optimum` under the guarantee of `strategy`.
pub fn check_cost(strategy: Strategy, cost: f64, optimum: f64) -> CostVerdict {
    let diff = (cost - optimum).abs();
    if diff <= COST_TOLERANCE {
        return CostVerdict::Optimal;
    }
    match strategy {
        Strategy::Exact => CostVerdict::NotOptimal(diff),
        Strategy::TwoApprox if cost > 2.0 * optimum + COST_TOLERANCE => {
            CostVerdict::BoundViolated(diff)
        }
        _ => CostVerdict::WithinGap(diff),
    }
}

/// Errors reading a table of known optima.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum OptimumTableError {
    /// A row is not `name, cost`.
    #[error("line {line}: expected `name, cost`, found {found:?}")]
    Malformed {
        /// 1-based line number.
        line: usize,
        /// The offending row.
        found: String,
    },
}

/// Looks up the optimum cost of `instance_name` in a CSV table of `name, cost` rows.
/// The first line is a header and is skipped.
///
/// Returns `Ok(None)` if the instance is not listed.
///
/// # Errors
/// Returns an error on the first malformed row before a match.
pub fn lookup_known_optimum(
    csv_text: &str,
    instance_name: &str,
) -> Result<Option<f64>, OptimumTableError> {
    for (i, line) in csv_text.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty());
        let (Some(name), Some(cost)) = (fields.next(), fields.next().and_then(|c| c.parse::<f64>().ok()))
        else {
            return Err(OptimumTableError::Malformed {
                line: i + 1,
                found: line.to_string(),
            });
        };
        if name == instance_name {
            return Ok(Some(cost));
        }
    }
    Ok(None)
}

// ============================================================================
// Internal
// ============================================================================

/// Disjoint sets with union by rank and path compression.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut x = x;
        while x != root {
            let next = self.parent[x];
            self.parent[x] = root;
            x = next;
        }
        root
    }

    fn union(&mut self, x: usize, y: usize) {
        let (mut a, mut b) = (self.find(x), self.find(y));
        if a == b {
            return;
        }
        if self.rank[a] < self.rank[b] {
            std::mem::swap(&mut a, &mut b);
        }
        self.parent[b] = a;
        if self.rank[a] == self.rank[b] {
            self.rank[a] += 1;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
