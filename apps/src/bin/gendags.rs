//! Enumerates the canonical DAGs of q shift-and-add operations, one per
//! line.

use anyhow::Result;
use clap::Parser;
use mulseq::dag::gen::{DagGen, Level};
use std::io::{self, BufWriter, Write};
use std::process::exit;
use streaming_iterator::StreamingIterator;

/// Enumerates the DAGs of q shift-and-add operations up to isomorphism.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Enumeration level: 0 orders the pairs only, 1 also drops simple
    /// isomorphisms.
    #[arg(value_name = "LEVEL", value_parser = clap::value_parser!(u8).range(0..=1))]
    level: u8,

    /// Number of operation nodes.
    #[arg(value_name = "Q", value_parser = clap::value_parser!(u8).range(1..=31))]
    q: u8,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("gendags: {e:#}");
        exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let level = match args.level {
        0 => Level::Ordered,
        _ => Level::Reduced,
    };
    let mut gen = DagGen::new(args.q as usize, level)?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    while let Some(dag) = gen.next() {
        writeln!(out, "{dag}")?;
    }
    out.flush()?;
    Ok(())
}
