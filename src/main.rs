use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::io;
use std::path::{Path, PathBuf};
use steiner::graph::GraphParseError;
use steiner::solve::SolveError;
use steiner::validate::{check_cost, lookup_known_optimum, validate_steiner_tree, CostVerdict, OptimumTableError};
use steiner::{solve, Graph, Instance, SolverConfig, Strategy, Terminals};
use thiserror::Error;

/// Where the instance comes from.
enum Source {
    File(PathBuf),
    Random { n: usize, terminals: Option<usize>, seed: u64 },
}

struct Options {
    config: SolverConfig,
    total_cost_only: bool,
    self_test: bool,
    verbose: bool,
    optimum_table: Option<PathBuf>,
    source: Source,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Parse(#[from] GraphParseError),
    #[error(transparent)]
    Solve(#[from] SolveError),
    #[error("cannot read optimum table {path}: {source}")]
    Table {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("optimum table: {0}")]
    OptimumTable(#[from] OptimumTableError),
}

fn main() {
    let opts = parse_args();

    let level = if opts.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&opts) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Solves the instance and prints the result. Returns `false` if a requested
/// self test failed.
fn run(opts: &Options) -> Result<bool, CliError> {
    let Instance { mut graph, terminals } = load(&opts.source)?;
    let tree = solve(&mut graph, &terminals, &opts.config)?;
    let cost = tree.cost(&graph);

    if opts.total_cost_only {
        println!("Total cost: {cost:.2}");
    } else {
        println!("{}", tree.display(&graph));
    }

    if !opts.self_test {
        return Ok(true);
    }
    if let Err(e) = validate_steiner_tree(&tree, &terminals, &graph) {
        eprintln!("Result is not a Steiner tree: {e}");
        return Ok(false);
    }

    let (Some(table), Source::File(path)) = (&opts.optimum_table, &opts.source) else {
        println!("Result is a Steiner tree");
        return Ok(true);
    };
    let csv = std::fs::read_to_string(table).map_err(|source| CliError::Table {
        path: table.display().to_string(),
        source,
    })?;
    let name = instance_name(path);
    let Some(optimum) = lookup_known_optimum(&csv, &name)? else {
        warn!("no known optimum for {name}");
        println!("Result is a Steiner tree");
        return Ok(true);
    };

    let verdict = check_cost(opts.config.strategy, cost, optimum);
    match verdict {
        CostVerdict::Optimal => println!("Result is a minimum cost Steiner tree"),
        CostVerdict::WithinGap(diff) => {
            println!("Result is a Steiner tree with difference of {diff:.2} to the minimum");
        }
        CostVerdict::NotOptimal(diff) => {
            eprintln!("Result does not have minimum cost ({diff:.2} above {optimum:.2})");
        }
        CostVerdict::BoundViolated(_) => {
            eprintln!("Result exceeds twice the minimum cost {optimum:.2}");
        }
    }
    Ok(!verdict.is_failure())
}

fn load(source: &Source) -> Result<Instance, CliError> {
    match *source {
        Source::File(ref path) => {
            let instance = Instance::load_from_file(path)?;
            info!(
                "loaded {}: {} vertices, {} edges, {} terminals",
                path.display(),
                instance.graph.vertex_count(),
                instance.graph.edge_count(),
                instance.terminals.len()
            );
            Ok(instance)
        }
        Source::Random { n, terminals, seed } => {
            let mut rng = SmallRng::seed_from_u64(seed);
            let k = terminals.unwrap_or(n / 10).clamp(1, n);
            let p = (4.0 / n as f64).min(1.0);
            let graph = Graph::random_connected(&mut rng, n, p, 100);
            let terminals = Terminals::random(&mut rng, n, k);
            info!("random instance (seed {seed}): {} edges, {k} terminals", graph.edge_count());
            Ok(Instance { graph, terminals })
        }
    }
}

fn instance_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

fn parse_args() -> Options {
    let mut config = SolverConfig::default();
    let mut strategy: Option<Strategy> = None;
    let mut total_cost_only = false;
    let mut self_test = false;
    let mut verbose = false;
    let mut optimum_table = None;
    let mut file = None;
    let mut random: Option<usize> = None;
    let mut random_terminals = None;
    let mut seed = 0xC0FFEE;

    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        let mode = match args[i].as_str() {
            "-x" => Some(Strategy::Exact),
            "-a" => Some(Strategy::TwoApprox),
            "-h" => Some(Strategy::TakahashiMatsuyama),
            "-s" => Some(Strategy::PrunedMst),
            "-m" => Some(Strategy::Mst),
            _ => None,
        };
        if let Some(mode) = mode {
            if strategy.replace(mode).is_some() {
                eprintln!("Error: multiple modes specified; select exactly one of -x, -a, -h, -s, -m.");
                std::process::exit(2);
            }
            i += 1;
            continue;
        }

        match args[i].as_str() {
            "-p" => config.parallel = true,
            "-r" => config.reduce = true,
            "-u" => config.upper_bound = true,
            "-c" => total_cost_only = true,
            "-t" => self_test = true,
            "-v" => verbose = true,
            "--threads" => {
                config.threads = value(&args, i);
                i += 1;
            }
            "--optimum-table" => {
                optimum_table = Some(PathBuf::from(value::<String>(&args, i)));
                i += 1;
            }
            "--random" => {
                random = Some(value(&args, i));
                i += 1;
            }
            "--terminals" => {
                random_terminals = Some(value(&args, i));
                i += 1;
            }
            "--seed" => {
                seed = value(&args, i);
                i += 1;
            }
            "--help" => usage_and_exit(0),
            arg if arg.starts_with('-') => usage_and_exit(2),
            arg => {
                if file.replace(PathBuf::from(arg)).is_some() {
                    usage_and_exit(2);
                }
            }
        }
        i += 1;
    }

    let Some(strategy) = strategy else {
        eprintln!("Error: select exactly one of -x, -a, -h, -s, -m.");
        std::process::exit(2);
    };
    config.strategy = strategy;
    if let Err(e) = config.check() {
        eprintln!("Error: {e}");
        std::process::exit(2);
    }

    let source = match (file, random) {
        (Some(path), None) => Source::File(path),
        (None, Some(n)) if n > 0 => Source::Random {
            n,
            terminals: random_terminals,
            seed,
        },
        _ => usage_and_exit(2),
    };

    Options {
        config,
        total_cost_only,
        self_test,
        verbose,
        optimum_table,
        source,
    }
}

/// Parses the argument following the flag at `i`.
fn value<T: std::str::FromStr>(args: &[String], i: usize) -> T {
    let v = args.get(i + 1).unwrap_or_else(|| usage_and_exit(2));
    v.parse().unwrap_or_else(|_| usage_and_exit(2))
}

fn usage_and_exit(code: i32) -> ! {
    eprintln!(
        "Usage:\n  min-cost-st (-x|-a|-h|-s|-m) [-p] [-r] [-u] [-c] [-t] [-v] [--threads N] [--optimum-table CSV] <graph-file>\n  min-cost-st (-x|-a|-h|-s|-m) [options] --random N [--terminals K] [--seed SEED]\n\nModes:\n  -x                     Exact flow-based MIP\n  -a                     Metric-closure 2-approximation\n  -h                     Takahashi-Matsuyama heuristic\n  -s                     MST with non-terminal leaves pruned\n  -m                     Plain MST\n\nOptions:\n  -p                     Parallel path expansion (-a only)\n  -r                     Remove dominated edges first (-x only)\n  -u                     Bound the objective by a 2-approximation (-x only)\n  -c                     Print only the total cost\n  -t                     Validate the result; with --optimum-table also check its cost\n  -v                     Log progress (RUST_LOG overrides)\n  --threads N            Worker pool size (default: auto-detect)\n  --optimum-table CSV    Table of `name, cost` rows keyed by instance file name\n  --random N             Solve a random connected instance on N vertices\n  --terminals K          Terminals of the random instance (default: N/10)\n  --seed SEED            Seed of the random instance (default: 12648430)\n"
    );
    std::process::exit(code)
}
