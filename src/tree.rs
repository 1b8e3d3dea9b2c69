//! The result type shared by all strategies.

use crate::graph::{EdgeIndex, Graph, VertexId};
use crate::mst::{prim, tree_edges};
use std::fmt;

/// A Steiner tree given as a duplicate-free list of edge indices into the input graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SteinerTree {
    edges: Vec<EdgeIndex>,
}

impl SteinerTree {
    /// The empty tree (the answer for a single terminal).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wraps a list of edge indices. The list must not contain duplicates.
    pub fn from_edges(edges: Vec<EdgeIndex>) -> Self {
        debug_assert!(
            {
                let mut sorted = edges.clone();
                sorted.sort_unstable();
                sorted.windows(2).all(|w| w[0] != w[1])
            },
            "duplicate edge in Steiner tree"
        );
        Self { edges }
    }

    /// Spans the subgraph of `graph` induced by `vertices` and restricted to the edges
    /// flagged in `edge_mask`, using an MST grown from `vertices[0]`.
    ///
    /// Vertices outside the component of `vertices[0]` are left out.
    pub fn span_subgraph(graph: &Graph, vertices: &[VertexId], edge_mask: &[bool]) -> Self {
        if vertices.is_empty() {
            return Self::empty();
        }
        let sub = graph.induced_subgraph(vertices, Some(edge_mask));
        let pred = prim(&sub.graph, 0);
        Self::from_edges(tree_edges(&pred).map(|e| sub.original_edge[e]).collect())
    }

    /// Edge indices in insertion order.
    #[inline]
    pub fn edges(&self) -> &[EdgeIndex] {
        &self.edges
    }

    /// Number of edges.
    #[inline]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` if the tree has no edges.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Total edge cost in `graph`.
    pub fn cost(&self, graph: &Graph) -> f64 {
        graph.cost_of(self.edges.iter().copied())
    }

    /// Vertices touched by at least one edge, ascending.
    pub fn vertices(&self, graph: &Graph) -> Vec<VertexId> {
        let mut touched = vec![false; graph.vertex_count()];
        for &e in &self.edges {
            let edge = graph.edge(e);
            touched[edge.v] = true;
            touched[edge.w] = true;
        }
        touched
            .iter()
            .enumerate()
            .filter_map(|(v, &t)| t.then_some(v))
            .collect()
    }

    /// Formats the tree as `{v w cost}` triples, one per edge.
    pub fn display<'a>(&'a self, graph: &'a Graph) -> TreeDisplay<'a> {
        TreeDisplay { tree: self, graph }
    }
}

/// Display adapter returned by [`SteinerTree::display`].
pub struct TreeDisplay<'a> {
    tree: &'a SteinerTree,
    graph: &'a Graph,
}

impl fmt::Display for TreeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, &e) in self.tree.edges.iter().enumerate() {
            let edge = self.graph.edge(e);
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{{{} {} {:.2}}}", edge.v, edge.w, edge.cost)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::*;

    #[test]
    fn cost_vertices_and_display() {
        let (g, _) = scenario_a();
        let tree = SteinerTree::from_edges(vec![1, 0]);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.cost(&g), 2.0);
        assert_eq!(tree.vertices(&g), vec![0, 1, 2]);
        assert_eq!(tree.display(&g).to_string(), "{1 2 1.00}, {0 1 1.00}");
    }

    #[test]
    fn span_subgraph_drops_cycles_and_stray_components() {
        let (g, _) = scenario_a();
        let all = [true; 5];
        let tree = SteinerTree::span_subgraph(&g, &[0, 1, 2, 3], &all);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.cost(&g), 3.0);

        // Only {0-1} and {2-3} are allowed: the component of 0 is a single edge.
        let mask = [true, false, true, false, false];
        let tree = SteinerTree::span_subgraph(&g, &[0, 1, 2, 3], &mask);
        assert_eq!(tree.edges(), &[0]);
        assert!(SteinerTree::span_subgraph(&g, &[], &mask).is_empty());
    }

    #[test]
    fn empty_tree() {
        let (g, _) = scenario_a();
        let tree = SteinerTree::empty();
        assert!(tree.is_empty());
        assert_eq!(tree.cost(&g), 0.0);
        assert!(tree.vertices(&g).is_empty());
        assert_eq!(tree.display(&g).to_string(), "");
    }
}
