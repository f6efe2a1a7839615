//! Searches minimum cost multiplication sequences for constants.
//!
//! Constants come from the command line or, interactively, from standard
//! input. Exit codes: 0 success, 1 out of memory, 2 usage, 3 bad verbosity,
//! 4 bad constant, 5 internal error, 6 counter overflow.

use anyhow::Result;
use clap::Parser;
use env_param::EnvParam;
use mulseq::cost::{Cost, CostModel};
use mulseq::search::{binary_cost, SearchContext};
use mulseq::value::Value;
use std::io::{self, BufRead, Write};
use std::process::exit;

/// Report the search counters after every constant.
static PRINT_STATS: EnvParam<bool> = EnvParam::new("MULSEQ_PRINT_STATS", "false");

const EXIT_BADMODE: i32 = 3;
const EXIT_BADCONST: i32 = 4;
const EXIT_INTERNAL: i32 = 5;

/// Minimum cost multiplication sequences built from shifts, additions and
/// subtractions.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Only compute the binary method cost.
    #[arg(short = 'b', long)]
    binary: bool,

    /// Verbosity: 0 prints costs, 1 adds the reconstructed sequences,
    /// 2 per-node search progress, 3 per-lookup traces.
    #[arg(value_name = "VERBOSITY", required_unless_present = "binary")]
    verbosity: Option<String>,

    /// Constants to process; read from standard input when absent.
    #[arg(value_name = "CONSTANT")]
    constants: Vec<String>,
}

fn main() {
    let args = Args::parse();

    let mut constants = Vec::new();
    let verbosity = if args.binary {
        // the first positional is a constant, not a verbosity level
        constants.extend(args.verbosity.iter().cloned());
        1
    } else {
        let raw = args.verbosity.as_deref().unwrap_or("");
        match raw.parse::<u8>() {
            Ok(v) if v <= 3 => v,
            _ => {
                eprintln!("bernstein: bad verbosity '{raw}'");
                exit(EXIT_BADMODE);
            }
        }
    };
    constants.extend(args.constants.iter().cloned());

    let level = match verbosity {
        0 | 1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    if let Err(e) = run(&constants, verbosity, args.binary) {
        eprintln!("bernstein: {e:#}");
        exit(EXIT_INTERNAL);
    }
}

fn run(constants: &[String], verbosity: u8, binary_only: bool) -> Result<()> {
    let mut ctx = SearchContext::new(CostModel::default());
    if !constants.is_empty() {
        for token in constants {
            process(&mut ctx, token, verbosity, binary_only)?;
        }
        return Ok(());
    }

    if binary_only {
        println!("Using the binary method to show costs only.");
    } else {
        println!("Using the search method with verbosity level {verbosity}.");
    }
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut line = String::new();
    loop {
        print!("Enter a positive number (or Ctrl-d to exit): ");
        io::stdout().flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }
        for token in line.split_whitespace() {
            process(&mut ctx, token, verbosity, binary_only)?;
        }
    }
    Ok(())
}

fn process(ctx: &mut SearchContext, token: &str, verbosity: u8, binary_only: bool) -> Result<()> {
    let n = parse_constant(token);
    if binary_only {
        print_cost(n, binary_cost(n, ctx.costs()));
    } else {
        let plan = ctx.plan(n)?;
        print_cost(n, plan.cost);
        if verbosity >= 1 {
            print!("{plan}");
        }
        if PRINT_STATS.get() {
            println!("{}", ctx.stats);
        }
    }
    io::stdout().flush()?;
    Ok(())
}

fn parse_constant(token: &str) -> Value {
    match token.parse::<Value>() {
        Ok(n) if n > 0 => n,
        _ => {
            eprintln!("bernstein: bad constant '{token}'");
            exit(EXIT_BADCONST);
        }
    }
}

fn print_cost(n: Value, cost: Cost) {
    println!("{n} = {n:b}, cost: {cost}");
}
