//! # Steiner Tree Solvers
//!
//! Exact, approximate and heuristic solvers for the minimum Steiner tree problem in
//! undirected graphs with non-negative edge costs.
//!
//! This crate provides:
//! - An adjacency-indexed graph with stable edge indices, induced subgraphs and a
//!   parser for the STP text format.
//! - Multi-source Dijkstra over a lazy-deletion binary heap, and Prim's MST.
//! - The metric-closure **2-approximation**, serial or with parallel path expansion.
//! - An **exact** multi-commodity flow MIP with optional graph reduction and a
//!   cost cutoff, solved through a pluggable [`ilp::MipSolver`] backend.
//! - Takahashi–Matsuyama, pruned-MST and plain-MST heuristics.
//! - A deterministic validator for Steiner trees.
//!
//! ## Quick Start
//!
//! ```
//! use steiner::prelude::*;
//!
//! // Square 0-1-2-3 with unit costs and a diagonal 0-2 of cost 3.
//! let mut graph = Graph::new(4);
//! graph.add_edge(0, 1, 1.0);
//! graph.add_edge(1, 2, 1.0);
//! graph.add_edge(2, 3, 1.0);
//! graph.add_edge(3, 0, 1.0);
//! graph.add_edge(0, 2, 3.0);
//! let terminals = Terminals::new(vec![0, 1, 2]).unwrap();
//!
//! let config = SolverConfig::with_strategy(Strategy::TwoApprox);
//! let tree = solve(&mut graph, &terminals, &config).unwrap();
//! assert!(is_steiner_tree(&tree, &terminals, &graph));
//! assert_eq!(tree.cost(&graph), 2.0);
//! ```
//!
//! ## Parsing Instances
//!
//! ```
//! use steiner::graph::parse_instance;
//!
//! let text = "header\nNodes 3\nEdges 2\nE 1 2 4\nE 2 3 1.5\nEND\nTerminals 2\nT 1\nT 3\nEND\n";
//! let instance = parse_instance(text).unwrap();
//! assert_eq!(instance.graph.edge_count(), 2);
//! assert_eq!(&*instance.terminals, &[0, 2]);
//! ```
//!
//! ## Modules
//!
//! - [`graph`]: Graph, terminals, induced subgraphs, random instances and parsing.
//! - [`heap`]: Lazy-deletion binary min-heap.
//! - [`paths`]: Shortest-path forests and multi-source Dijkstra.
//! - [`mst`]: Prim's minimum spanning tree.
//! - [`tree`]: The [`SteinerTree`] result type.
//! - [`two_apx`]: Metric-closure 2-approximation.
//! - [`ilp`]: Flow-based exact model, reduction and MIP backends.
//! - [`heuristic`]: Constructive heuristics.
//! - [`validate`]: Tree validation and known-optimum checks.
//! - [`solve`]: Strategy selection, configuration and the worker pool.
//!
//! ## Parallelism
//!
//! Reduction, metric-closure construction and parallel path expansion run on a
//! rayon pool of [`SolverConfig::threads`] workers. Workers own private scratch
//! space; their outputs are merged on the calling thread in a fixed order, so the
//! result does not depend on the pool size.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::inline_always)] // Intentional for hot-path code
#![allow(clippy::many_single_char_names)] // Graph-theory variable names
#![allow(clippy::float_cmp)] // Integral costs compare exactly
#![allow(clippy::doc_markdown)]
#![allow(clippy::multiple_crate_versions)] // Cargo.lock management is external

pub mod graph;
pub mod heap;
pub mod heuristic;
pub mod ilp;
pub mod mst;
pub mod paths;
pub mod solve;
pub mod tree;
pub mod two_apx;
pub mod validate;

pub use graph::{Graph, Instance, Terminals};
pub use solve::{solve, SolverConfig, Strategy};
pub use tree::SteinerTree;

/// Re-export commonly used types for convenience.
pub mod prelude {
    pub use crate::graph::{parse_instance, Edge, EdgeIndex, Graph, Instance, Terminals, VertexId};
    pub use crate::heuristic::{mst_st, pruned_mst, takahashi_matsuyama};
    pub use crate::ilp::{ilp, GoodLpSolver, IlpOptions, MipSolver};
    pub use crate::solve::{solve, solve_with, SolveError, SolverConfig, Strategy};
    pub use crate::tree::SteinerTree;
    pub use crate::two_apx::{parallel_two_apx, two_apx};
    pub use crate::validate::{is_steiner_tree, validate_steiner_tree};
}
