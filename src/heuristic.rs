//! Fast constructive heuristics built on [`prim`] and [`multi_dijkstra`].

use crate::graph::{EdgeIndex, Graph, VertexId};
use crate::mst::{prim, tree_edges};
use crate::paths::{multi_dijkstra, PathsData};
use crate::tree::SteinerTree;
use log::{debug, warn};

/// Minimum spanning tree of the component of the first terminal.
///
/// Every vertex of that component is spanned, so the result is a Steiner tree but
/// rarely a good one. A single terminal yields the empty tree.
pub fn mst_st(graph: &Graph, terminals: &[VertexId]) -> SteinerTree {
    if terminals.len() <= 1 {
        return SteinerTree::empty();
    }
    let pred = prim(graph, terminals[0]);
    SteinerTree::from_edges(tree_edges(&pred).collect())
}

/// [`mst_st`] followed by repeatedly cutting non-terminal leaves until every leaf is
/// a terminal.
pub fn pruned_mst(graph: &Graph, terminals: &[VertexId]) -> SteinerTree {
    if terminals.len() <= 1 {
        return SteinerTree::empty();
    }
    let pred = prim(graph, terminals[0]);

    let mut alive = vec![false; graph.edge_count()];
    let mut degree = vec![0usize; graph.vertex_count()];
    for e in tree_edges(&pred) {
        alive[e] = true;
        let edge = graph.edge(e);
        degree[edge.v] += 1;
        degree[edge.w] += 1;
    }

    let mut is_terminal = vec![false; graph.vertex_count()];
    for &t in terminals {
        is_terminal[t] = true;
    }

    let mut worklist: Vec<VertexId> = (0..graph.vertex_count())
        .filter(|&v| degree[v] == 1 && !is_terminal[v])
        .collect();
    let mut pruned = 0;
    while let Some(leaf) = worklist.pop() {
        if degree[leaf] != 1 {
            continue;
        }
        let Some(&e) = graph.incident(leaf).iter().find(|&&e| alive[e]) else {
            continue;
        };
        alive[e] = false;
        degree[leaf] = 0;
        pruned += 1;

        let parent = graph.edge(e).other(leaf);
        degree[parent] -= 1;
        if degree[parent] == 1 && !is_terminal[parent] {
            worklist.push(parent);
        }
    }
    debug!("pruned {pruned} non-terminal leaves");

    SteinerTree::from_edges(tree_edges(&pred).filter(|&e| alive[e]).collect())
}

/// Takahashi–Matsuyama: grows a tree from the first terminal by repeatedly
/// attaching the terminal closest to the current tree along its shortest path.
///
/// If some terminal cannot be reached, the tree built so far is returned and a
/// warning is logged; the result then fails validation.
pub fn takahashi_matsuyama(graph: &Graph, terminals: &[VertexId]) -> SteinerTree {
    if terminals.len() <= 1 {
        return SteinerTree::empty();
    }

    let mut in_tree = vec![false; graph.vertex_count()];
    let mut edge_in_tree = vec![false; graph.edge_count()];
    let mut tree_vertices = vec![terminals[0]];
    let mut edges: Vec<EdgeIndex> = Vec::new();
    in_tree[terminals[0]] = true;

    let mut paths = PathsData::new(graph.vertex_count());
    loop {
        let mut pending = terminals.iter().copied().filter(|&t| !in_tree[t]).peekable();
        if pending.peek().is_none() {
            break;
        }

        multi_dijkstra(&tree_vertices, &mut paths, graph);
        let nearest = pending
            .filter(|&t| paths.is_reachable(t))
            .fold(None, |best: Option<VertexId>, t| match best {
                Some(b) if paths.distance(b) <= paths.distance(t) => Some(b),
                _ => Some(t),
            });
        let Some(nearest) = nearest else {
            warn!("some terminals are unreachable; returning a partial tree");
            break;
        };

        in_tree[nearest] = true;
        tree_vertices.push(nearest);
        for (e, next) in paths.walk_back(graph, nearest) {
            if !edge_in_tree[e] {
                edge_in_tree[e] = true;
                edges.push(e);
            }
            if in_tree[next] {
                break;
            }
            in_tree[next] = true;
            tree_vertices.push(next);
        }
        paths.reset();
    }

    debug!(
        "Takahashi-Matsuyama tree: {} edges on {} vertices",
        edges.len(),
        tree_vertices.len()
    );
    SteinerTree::from_edges(edges)
}

// ============================================================================
// Tests
// ============================================================================
