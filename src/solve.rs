//! Strategy selection, configuration and the worker pool every solve runs on.

use crate::graph::{Graph, Terminals, VertexId};
use crate::heuristic::{mst_st, pruned_mst, takahashi_matsuyama};
use crate::ilp::{ilp, GoodLpSolver, IlpError, IlpOptions, MipSolver};
use crate::tree::SteinerTree;
use crate::two_apx::{parallel_two_apx, two_apx};
use log::info;
use rayon::ThreadPoolBuilder;
use std::fmt;
use std::time::Instant;
use thiserror::Error;

// ============================================================================
// Configuration
// ============================================================================

/// Algorithm used to build the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Flow-based MIP, optimal.
    Exact,
    /// Metric-closure 2-approximation.
    TwoApprox,
    /// Takahashi–Matsuyama shortest-path heuristic.
    TakahashiMatsuyama,
    /// MST with non-terminal leaves pruned.
    PrunedMst,
    /// Plain MST rooted at the first terminal.
    Mst,
}

impl Strategy {
    /// All strategies, exact first.
    pub const ALL: [Strategy; 5] = [
        Strategy::Exact,
        Strategy::TwoApprox,
        Strategy::TakahashiMatsuyama,
        Strategy::PrunedMst,
        Strategy::Mst,
    ];

    /// Short name used in logs and reports.
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Exact => "exact",
            Strategy::TwoApprox => "2-approx",
            Strategy::TakahashiMatsuyama => "takahashi-matsuyama",
            Strategy::PrunedMst => "pruned-mst",
            Strategy::Mst => "mst",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Solver configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolverConfig {
    /// Algorithm to run.
    pub strategy: Strategy,
    /// Expand closure paths on the worker pool (2-approximation only).
    pub parallel: bool,
    /// Remove dominated edges before solving (exact only).
    pub reduce: bool,
    /// Bound the objective by a 2-approximation (exact only).
    pub upper_bound: bool,
    /// Size of the worker pool.
    pub threads: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        let threads = std::thread::available_parallelism()
            .map(std::num::NonZero::get)
            .unwrap_or(1);

        Self {
            strategy: Strategy::TwoApprox,
            parallel: false,
            reduce: false,
            upper_bound: false,
            threads,
        }
    }
}

impl SolverConfig {
    /// Default configuration running `strategy`.
    pub fn with_strategy(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Rejects option combinations that have no meaning for the chosen strategy.
    ///
    /// # Errors
    /// Returns the first conflicting option.
    pub fn check(&self) -> Result<(), SolveError> {
        if self.threads == 0 {
            return Err(SolveError::NoThreads);
        }
        if self.parallel && self.strategy != Strategy::TwoApprox {
            return Err(SolveError::UnsupportedOption {
                option: "parallel",
                strategy: self.strategy,
            });
        }
        if self.strategy != Strategy::Exact {
            for (enabled, option) in [(self.reduce, "reduce"), (self.upper_bound, "upper bound")] {
                if enabled {
                    return Err(SolveError::UnsupportedOption {
                        option,
                        strategy: self.strategy,
                    });
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors returned by [`solve`].
#[derive(Debug, Error)]
pub enum SolveError {
    /// An option was combined with a strategy that does not support it.
    #[error("the {option} option is not available for the {strategy} strategy")]
    UnsupportedOption {
        /// Name of the option.
        option: &'static str,
        /// The configured strategy.
        strategy: Strategy,
    },
    /// The worker pool must have at least one thread.
    #[error("the worker pool needs at least one thread")]
    NoThreads,
    /// A terminal id does not name a vertex.
    #[error("terminal {terminal} is not a vertex (graph has {n} vertices)")]
    TerminalOutOfRange {
        /// The offending terminal.
        terminal: VertexId,
        /// Number of vertices.
        n: usize,
    },
    /// The worker pool could not be started.
    #[error("cannot start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    /// The exact strategy failed.
    #[error(transparent)]
    Ilp(#[from] IlpError),
}

// ============================================================================
// Public API
// ============================================================================

/// Solves with the default MIP backend. See [`solve_with`].
///
/// # Errors
/// See [`solve_with`].
pub fn solve(
    graph: &mut Graph,
    terminals: &Terminals,
    config: &SolverConfig,
) -> Result<SteinerTree, SolveError> {
    solve_with(graph, terminals, config, &GoodLpSolver)
}

/// Runs the configured strategy on a dedicated pool of `config.threads` workers.
///
/// Only the exact strategy with `reduce` modifies `graph`; the returned edge
/// indices always refer to `graph` as it is after the call.
///
/// # Errors
/// Returns an error if the configuration is inconsistent, a terminal is out of
/// range, the pool cannot be built or the MIP backend fails.
pub fn solve_with<S: MipSolver + Sync + ?Sized>(
    graph: &mut Graph,
    terminals: &Terminals,
    config: &SolverConfig,
    solver: &S,
) -> Result<SteinerTree, SolveError> {
    config.check()?;
    let n = graph.vertex_count();
    if let Some(&terminal) = terminals.iter().find(|&&t| t >= n) {
        return Err(SolveError::TerminalOutOfRange { terminal, n });
    }

    let pool = ThreadPoolBuilder::new().num_threads(config.threads).build()?;
    info!(
        "{}: {} vertices, {} edges, {} terminals, {} threads",
        config.strategy,
        n,
        graph.edge_count(),
        terminals.len(),
        config.threads
    );

    let start = Instant::now();
    let tree = pool.install(|| -> Result<SteinerTree, SolveError> {
        let tree = match config.strategy {
            Strategy::Exact => ilp(
                graph,
                terminals,
                IlpOptions {
                    reduce: config.reduce,
                    upper_bound: config.upper_bound,
                },
                solver,
            )?,
            Strategy::TwoApprox if config.parallel => parallel_two_apx(graph, terminals),
            Strategy::TwoApprox => two_apx(graph, terminals),
            Strategy::TakahashiMatsuyama => takahashi_matsuyama(graph, terminals),
            Strategy::PrunedMst => pruned_mst(graph, terminals),
            Strategy::Mst => mst_st(graph, terminals),
        };
        Ok(tree)
    })?;

    info!(
        "{} finished in {:.3}s: {} edges, cost {:.2}",
        config.strategy,
        start.elapsed().as_secs_f64(),
        tree.len(),
        tree.cost(graph)
    );
    Ok(tree)
}

// ============================================================================
// Tests
// ============================================================================
