use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;
use tree_semilattice::driver::SearchConfig;
use tree_semilattice::error::Error;
use tree_semilattice::io::{read_solution, write_lp_model};
use tree_semilattice::problem::{Problem, ProblemKind};

/// Build the symmetry-reduced feasibility model for meet-semilattice or
/// consensus structures on the phylogenetic trees over X = {1, ..., n},
/// write it as an LP file and optionally decode a solver's solution.
#[derive(Parser, Debug)]
#[command(name = "tree-semilattice", version, about = "Symmetry-reduced tree consensus models")]
struct Args {
    /// Number of leaves n
    #[arg(default_value_t = 3)]
    n: usize,

    /// Worker threads for the normal-form computation (0 = all cores)
    #[arg(short = 't', long = "threads", default_value_t = 1)]
    threads: usize,

    /// Problem to build: meet | consensus
    #[arg(long = "kind", value_enum, default_value_t = KindArg::Meet)]
    kind: KindArg,

    /// Output path for the LP model (.gz for gzip)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Solver solution file (`name value` per line) to decode
    #[arg(long = "solution")]
    solution: Option<PathBuf>,

    /// Quiet mode: suppresses progress messages on stdout
    #[arg(short = 'q', long = "quiet", default_value_t = false)]
    quiet: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum KindArg { Meet, Consensus }

fn exit_code(e: &Error) -> i32 {
    match e {
        Error::InvalidConfig(_) => 2,
        Error::Io(_) => 4,
        _ => 3,
    }
}

fn fail(context: &str, e: Error) -> ! {
    eprintln!("{context}: {e}");
    std::process::exit(exit_code(&e));
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let config = SearchConfig { leaf_count: args.n, threads: args.threads };
    let (kind, kind_label) = match args.kind {
        KindArg::Meet => (ProblemKind::Meet, "meet-semilattice"),
        KindArg::Consensus => (ProblemKind::Consensus, "consensus"),
    };

    let t0 = Instant::now();
    let problem = match Problem::build(kind, &config) {
        Ok(p) => p,
        Err(e) => fail("Failed to build model", e),
    };
    let build_s = t0.elapsed().as_secs_f64();

    let forms = problem.forms();
    log_if(!args.quiet, format!("Building {kind_label} model for X = {:?} {build_s:.3}s", problem.leaves()));
    log_if(!args.quiet, format!(
        "{} trees, {} normal trees, {} normal pairs, {} normal triples",
        forms.trees.len(),
        forms.normal_trees.len(),
        forms.pairs.len(),
        forms.triples.len()
    ));
    let model = problem.model();
    log_if(!args.quiet, format!("{} variables, {} constraints", model.num_variables(), model.constraints().len()));
    for (family, count) in model.constraint_counts() {
        log_if(!args.quiet, format!("  {family}: {count}"));
    }

    if let Some(output) = &args.output {
        let t1 = Instant::now();
        if let Err(e) = write_lp_model(output, model) {
            eprintln!("Failed to write output {:?}: {e}", output);
            std::process::exit(4);
        }
        let write_s = t1.elapsed().as_secs_f64();
        log_if(!args.quiet, format!("Writing to output {write_s:.3}s"));
    }

    if let Some(solution) = &args.solution {
        let assignment = match read_solution(solution, model) {
            Ok(a) => a,
            Err(e) => fail(&format!("Failed to read solution {:?}", solution), e),
        };
        match assignment {
            None => println!("{}", problem.infeasible_message()),
            Some(assignment) => {
                let violated = model.violations(&assignment).count();
                if violated > 0 {
                    eprintln!("Warning: solution violates {violated} constraint(s)");
                }
                for line in problem.describe(&assignment) {
                    println!("{line}");
                }
            }
        }
    }
}

fn log_if(show: bool, msg: String) {
    if show { println!("{}", msg); }
}
