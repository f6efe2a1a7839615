//! Evaluates DAGs read from standard input, recording for every value up to
//! mrec the minimum operation count at which it occurs, and dumps the
//! resulting tables after every DAG.
//!
//! Exit codes follow the failing stage: bad bounds 2..=5, malformed input
//! 6..=8, table dump 11..=13.

use anyhow::Result;
use clap::Parser;
use mulseq::dag::eval::Evaluator;
use mulseq::dag::{Dag, MAX_NODES};
use mulseq::table::{save_bytes, SaveError, SaveStage};
use mulseq::value::Value;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::exit;

/// Exhaustive evaluation of shift-and-add DAGs over a value range.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Largest recorded value.
    #[arg(value_name = "MREC")]
    mrec: String,

    /// Largest value explored by the search.
    #[arg(value_name = "MMAX")]
    mmax: String,

    /// Destination of the cost table.
    #[arg(value_name = "COST")]
    cost: PathBuf,

    /// Destinations of the shift statistics: cinf, csup and program codes.
    #[arg(value_name = "CINF CSUP CODE", num_args = 3)]
    shifts: Vec<PathBuf>,
}

fn main() {
    let args = Args::parse();
    let mrec: Value = match args.mrec.parse() {
        Ok(v) => v,
        Err(_) => die(3, "mrec is too large or not a number"),
    };
    if mrec < 1 {
        die(2, "mrec must be at least 1");
    }
    let mmax: Value = match args.mmax.parse() {
        Ok(v) => v,
        Err(_) => die(5, "mmax is too large or not a number"),
    };
    if mmax < mrec {
        die(4, "mmax must be greater or equal to mrec");
    }

    let subscriber = tracing_subscriber::fmt().with_writer(io::stderr).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    if let Err(e) = run(&args, mrec, mmax) {
        eprintln!("dagsearch: {e:#}");
        exit(exit_code(&e));
    }
}

fn run(args: &Args, mrec: Value, mmax: Value) -> Result<()> {
    let mut eval = Evaluator::new(mrec, mmax, !args.shifts.is_empty())?;
    let stdin = io::stdin();
    let mut line_no: u32 = 0;
    for line in stdin.lock().lines() {
        let line = line?;
        line_no += 1;
        if line.trim().is_empty() {
            die(8, &format!("input error at line {line_no}"));
        }
        if line.split_whitespace().count() > MAX_NODES {
            die(6, &format!("too many nodes at line {line_no}"));
        }
        let dag: Dag = match line.parse() {
            Ok(dag) => dag,
            Err(_) => die(7, &format!("input error at line {line_no}")),
        };
        println!("DAG [ {dag} ]");
        io::stdout().flush()?;

        eval.search(&dag, line_no as u16)?;
        eval.table.propagate_doublings();
        save_tables(&eval, args)?;
    }
    Ok(())
}

fn save_tables(eval: &Evaluator, args: &Args) -> Result<()> {
    save_bytes(&eval.table.cost, &args.cost)?;
    if let Some(shifts) = &eval.table.shifts {
        save_bytes(&shifts.cinf, &args.shifts[0])?;
        save_bytes(&shifts.csup, &args.shifts[1])?;
        save_bytes(&shifts.code, &args.shifts[2])?;
    }
    Ok(())
}

fn die(code: i32, msg: &str) -> ! {
    eprintln!("dagsearch: {msg}");
    exit(code)
}

fn exit_code(e: &anyhow::Error) -> i32 {
    match e.downcast_ref::<SaveError>().map(|save| save.stage) {
        Some(SaveStage::Create) => 11,
        Some(SaveStage::Write) => 12,
        Some(SaveStage::Close) => 13,
        None => 1,
    }
}
