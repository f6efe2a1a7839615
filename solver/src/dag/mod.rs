//! DAGs of shift-and-add operations.
//!
//! A DAG of `q` operations has `q + 1` nodes: node 0 is the source (holding
//! the value 1) and node `i` for `i >= 1` combines the values of two earlier
//! nodes `(x, y)` with `y <= x < i`. Every node except the target `q` must
//! be the parent of at least one later node.
//!
//! The wire format, one DAG per line, lists the pairs as
//! `(x,y) (x,y) ...` in node order.

pub mod eval;
pub mod gen;

use anyhow::{bail, ensure, Result};
use itertools::Itertools;
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// Largest supported number of operation nodes.
pub const MAX_NODES: usize = 31;

/// A DAG of shift-and-add operations over a source node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dag {
    pairs: SmallVec<[(u8, u8); 8]>,
}

impl Dag {
    /// Builds a DAG from the parent pairs of nodes `1..=q`.
    pub fn new(pairs: impl IntoIterator<Item = (u8, u8)>) -> Result<Dag> {
        let pairs: SmallVec<[(u8, u8); 8]> = pairs.into_iter().collect();
        ensure!(!pairs.is_empty(), "a DAG needs at least one node");
        ensure!(pairs.len() <= MAX_NODES, "too many nodes ({})", pairs.len());
        for (i, &(x, y)) in pairs.iter().enumerate() {
            ensure!(
                y <= x && (x as usize) <= i,
                "pair ({x},{y}) of node {} references a later node or is unordered",
                i + 1
            );
        }
        Ok(Dag { pairs })
    }

    /// Number of operation nodes.
    pub fn num_ops(&self) -> usize {
        self.pairs.len()
    }

    /// Parents of node `i`, `1 <= i <= num_ops()`.
    pub fn parents(&self, i: usize) -> (usize, usize) {
        let (x, y) = self.pairs[i - 1];
        (x as usize, y as usize)
    }

    pub fn pairs(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.pairs.iter().copied()
    }
}

impl fmt::Display for Dag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.pairs
                .iter()
                .format_with(" ", |(x, y), f| f(&format_args!("({x},{y})")))
        )
    }
}

impl FromStr for Dag {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Dag> {
        let mut pairs: SmallVec<[(u8, u8); 8]> = SmallVec::new();
        for token in s.split_whitespace() {
            let Some(body) = token.strip_prefix('(').and_then(|t| t.strip_suffix(')')) else {
                bail!("bad pair '{token}'");
            };
            let Some((x, y)) = body.split_once(',') else {
                bail!("bad pair '{token}'");
            };
            let x: u8 = x.parse().map_err(|_| anyhow::anyhow!("bad pair '{token}'"))?;
            let y: u8 = y.parse().map_err(|_| anyhow::anyhow!("bad pair '{token}'"))?;
            pairs.push((x, y));
        }
        Dag::new(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let dag: Dag = "(0,0) (1,0) (2,1)".parse().unwrap();
        assert_eq!(dag.num_ops(), 3);
        assert_eq!(dag.parents(1), (0, 0));
        assert_eq!(dag.parents(3), (2, 1));
        assert_eq!(dag.to_string(), "(0,0) (1,0) (2,1)");
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert!("".parse::<Dag>().is_err());
        assert!("(0,0) (2,0)".parse::<Dag>().is_err()); // node 2 not created yet
        assert!("(0,1)".parse::<Dag>().is_err()); // unordered pair
        assert!("(0 0)".parse::<Dag>().is_err());
        assert!("0,0".parse::<Dag>().is_err());
    }
}
