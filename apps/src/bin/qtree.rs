//! Computes the cost lattice f_m over [0, m], reporting the smallest new
//! integer of every cost level, and optionally dumps the cost bytes.

use anyhow::Result;
use clap::Parser;
use mulseq::lattice::Lattice;
use mulseq::table::{save_bytes, SaveError, SaveStage};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::exit;

/// Cost lattice of multiplication by the constants in [0, m].
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Largest cost level to compute; negative for no cap.
    #[arg(value_name = "CMAX", allow_hyphen_values = true)]
    cmax: i64,

    /// Upper bound of the computed range.
    #[arg(value_name = "M")]
    m: String,

    /// Destination of the cost bytes; a leading '-' saves after every
    /// level instead of once at the end.
    #[arg(value_name = "DEST", allow_hyphen_values = true)]
    dest: Option<String>,
}

fn main() {
    let args = Args::parse();
    let m: usize = match args.m.parse() {
        Ok(m) => m,
        Err(_) => die(2, "bad value for m"),
    };
    if m < 1 {
        die(2, "m must be at least 1");
    }
    if m >= (1 << 31) {
        die(3, "m too large");
    }
    let (dest, every_level) = match args.dest.as_deref() {
        Some(name) => match name.strip_prefix('-') {
            Some(stripped) => (Some(PathBuf::from(stripped)), true),
            None => (Some(PathBuf::from(name)), false),
        },
        None => (None, false),
    };

    let subscriber = tracing_subscriber::fmt().with_writer(io::stderr).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    if let Err(e) = run(args.cmax, m, dest.as_deref(), every_level) {
        eprintln!("qtree: {e:#}");
        exit(exit_code(&e));
    }
}

fn run(cmax: i64, m: usize, dest: Option<&Path>, every_level: bool) -> Result<()> {
    let mut lattice = Lattice::new(m)?;
    while !lattice.is_complete() && (cmax < 0 || (lattice.levels() as i64) < cmax) {
        let summary = lattice.advance_level();
        if let Some(nmin) = summary.nmin {
            println!("Nmin({}) = {nmin}", summary.level);
        }
        io::stdout().flush()?;
        if every_level {
            if let Some(dest) = dest {
                save_bytes(lattice.costs(), dest)?;
            }
        }
    }
    if let Some(dest) = dest {
        save_bytes(lattice.costs(), dest)?;
    }
    Ok(())
}

fn die(code: i32, msg: &str) -> ! {
    eprintln!("qtree: {msg}");
    exit(code)
}

fn exit_code(e: &anyhow::Error) -> i32 {
    match e.downcast_ref::<SaveError>().map(|save| save.stage) {
        Some(SaveStage::Create) => 6,
        Some(SaveStage::Write) => 8,
        Some(SaveStage::Close) => 9,
        None => 1,
    }
}
