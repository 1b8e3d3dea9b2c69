//! Prim's minimum spanning tree.

use crate::graph::{EdgeIndex, Graph, VertexId};
use crate::heap::LazyMinHeap;

/// Computes a minimum spanning tree of the component containing `root`.
///
/// Returns the predecessor edge of every vertex: `None` for `root` and for vertices
/// outside its component. The tree edges are the `Some` entries.
pub fn prim(graph: &Graph, root: VertexId) -> Vec<Option<EdgeIndex>> {
    let n = graph.vertex_count();
    let mut best = vec![f64::INFINITY; n];
    let mut pred_edge = vec![None; n];
    // Cleared once a vertex is extracted; settled vertices never change again.
    let mut eligible = vec![true; n];
    let mut heap = LazyMinHeap::with_capacity(n);

    best[root] = 0.0;
    heap.push(root, 0.0);

    while let Some(entry) = heap.pop() {
        let u = entry.key;
        if !eligible[u] {
            continue;
        }
        eligible[u] = false;

        for &e in graph.incident(u) {
            let edge = graph.edge(e);
            let w = edge.other(u);
            if eligible[w] && edge.cost < best[w] {
                best[w] = edge.cost;
                pred_edge[w] = Some(e);
                heap.push(w, edge.cost);
            }
        }
    }
    pred_edge
}

/// Iterates over the tree edges of a predecessor array produced by [`prim`].
pub fn tree_edges(pred_edge: &[Option<EdgeIndex>]) -> impl Iterator<Item = EdgeIndex> + '_ {
    pred_edge.iter().filter_map(|&e| e)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::*;

    /// Kruskal with a naive component relabelling, as a reference.
    fn kruskal_cost(graph: &Graph) -> f64 {
        let mut order: Vec<EdgeIndex> = (0..graph.edge_count()).collect();
        order.sort_by(|&a, &b| graph.edge(a).cost.total_cmp(&graph.edge(b).cost));
        let mut component: Vec<usize> = (0..graph.vertex_count()).collect();
        let mut total = 0.0;
        for e in order {
            let edge = graph.edge(e);
            let (a, b) = (component[edge.v], component[edge.w]);
            if a != b {
                total += edge.cost;
                for c in &mut component {
                    if *c == b {
                        *c = a;
                    }
                }
            }
        }
        total
    }

    #[test]
    fn prim_on_scenario_a() {
        let (g, _) = scenario_a();
        let pred = prim(&g, 0);
        assert_eq!(pred[0], None);
        let edges: Vec<_> = tree_edges(&pred).collect();
        assert_eq!(edges.len(), 3);
        assert_eq!(g.cost_of(edges.iter().copied()), 3.0);
        assert!(!edges.contains(&4));
    }

    #[test]
    fn prim_matches_kruskal_on_random_graphs() {
        for seed in 0..20 {
            let (g, t) = random_instance(seed, 20, 0.2, 1);
            let pred = prim(&g, t.root());
            assert_eq!(tree_edges(&pred).count(), g.vertex_count() - 1);
            assert_eq!(g.cost_of(tree_edges(&pred)), kruskal_cost(&g));
        }
    }

    #[test]
    fn prim_leaves_other_components_untouched() {
        let mut g = Graph::new(5);
        g.add_edge(0, 1, 2.0);
        g.add_edge(1, 2, 1.0);
        g.add_edge(3, 4, 1.0);
        let pred = prim(&g, 1);
        assert_eq!(pred, vec![Some(0), None, Some(1), None, None]);
    }
}
