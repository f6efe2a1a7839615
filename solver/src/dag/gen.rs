//! Enumeration of canonical DAGs.
//!
//! DAGs are produced in lexicographic order of their flattened pair arrays.
//! The enumeration advances the array in place and therefore implements
//! [`StreamingIterator`] rather than `Iterator`.
//!
//! Two levels are supported:
//! - [`Level::Ordered`]: pairs are individually ordered (`x >= y`), the
//!   sequence of pairs is non-decreasing, and every non-target node has at
//!   least one child.
//! - [`Level::Reduced`]: additionally rejects a DAG when a group of
//!   identical consecutive pairs is later referenced through its second copy
//!   before its first, which relabels a DAG already produced.

use super::{Dag, MAX_NODES};
use anyhow::{ensure, Result};
use streaming_iterator::StreamingIterator;

/// Enumeration level.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Level {
    /// Canonically ordered pairs only.
    Ordered,
    /// Ordered pairs plus the isomorphism rejection pass.
    Reduced,
}

/// Generates every DAG of `q` operation nodes, in place.
pub struct DagGen {
    q: usize,
    level: Level,
    /// Flattened pairs: positions `2i` and `2i+1` hold the parents of node
    /// `i + 1`.
    state: Vec<usize>,
    current: Option<Dag>,
    done: bool,
}

impl DagGen {
    pub fn new(q: usize, level: Level) -> Result<DagGen> {
        ensure!(q >= 1, "q must be at least 1");
        ensure!(q <= MAX_NODES, "q must be at most {MAX_NODES}");
        Ok(DagGen {
            q,
            level,
            state: vec![0; 2 * q],
            current: None,
            done: false,
        })
    }

    /// Advances the pair array to the next tuple whose parent set covers
    /// every non-target node. Returns false once the space is exhausted.
    fn advance_raw(&mut self) -> bool {
        let q = self.q;
        let s = &mut self.state;
        loop {
            // Scan from the tail for the rightmost coordinate that can move.
            let mut i = 2 * q - 1;
            let (x, y) = loop {
                debug_assert!(i % 2 == 1 && s[i] <= s[i - 1]);
                if s[i] != s[i - 1] {
                    let y = s[i] + 1;
                    i -= 1;
                    break (s[i], y);
                }
                i -= 1;
                debug_assert!(i % 2 == 0 && s[i] <= i / 2);
                if s[i] != i / 2 {
                    break (s[i] + 1, 0);
                }
                if i <= 2 {
                    return false;
                }
                i -= 1;
            };

            // Copy the advanced pair forward to the end and collect the
            // referenced parents.
            let mut used = (1u64 << x) | (1u64 << y);
            for &p in s[..i].iter() {
                used |= 1 << p;
            }
            while i < 2 * q {
                s[i] = x;
                s[i + 1] = y;
                i += 2;
            }

            if used == (1 << q) - 1 {
                return true;
            }
        }
    }

    /// The level-1 filter: a group of identical consecutive pairs whose
    /// second copy is referenced before its first is a relabeling of a DAG
    /// that was already emitted.
    fn is_reduced(&self) -> bool {
        let q = self.q;
        let s = &self.state;
        for i in 0..q.saturating_sub(2) {
            let (x, y) = (s[2 * i], s[2 * i + 1]);
            let mut j = i + 1;
            // the last pair references the target's parents and always
            // differs from pair i, so the scan stays in bounds
            while s[2 * j] == x && s[2 * j + 1] == y {
                j += 1;
                debug_assert!(j < q);
            }
            if j - i > 1 {
                while j < q {
                    let refs = (((1u64 << s[2 * j]) | (1u64 << s[2 * j + 1])) >> (i + 1)) & 3;
                    if refs == 1 {
                        break; // first copy referenced, not the second
                    }
                    if refs == 2 {
                        return false; // second copy referenced first
                    }
                    j += 1;
                }
            }
        }
        true
    }

    fn as_dag(&self) -> Dag {
        let pairs = self
            .state
            .chunks_exact(2)
            .map(|p| (p[0] as u8, p[1] as u8));
        Dag::new(pairs).expect("enumerated pairs are canonical")
    }
}

impl StreamingIterator for DagGen {
    type Item = Dag;

    fn advance(&mut self) {
        if self.done {
            self.current = None;
            return;
        }
        if self.q == 1 {
            // single node: the only DAG is (0,0)
            self.done = true;
            self.current = Some(Dag::new([(0, 0)]).expect("valid single pair"));
            return;
        }
        loop {
            if !self.advance_raw() {
                self.done = true;
                self.current = None;
                return;
            }
            if self.level == Level::Reduced && !self.is_reduced() {
                continue;
            }
            self.current = Some(self.as_dag());
            return;
        }
    }

    fn get(&self) -> Option<&Dag> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(q: usize, level: Level) -> Vec<Dag> {
        let mut gen = DagGen::new(q, level).unwrap();
        let mut out = Vec::new();
        while let Some(dag) = gen.next() {
            out.push(dag.clone());
        }
        out
    }

    #[test]
    fn test_single_node() {
        let dags = collect(1, Level::Reduced);
        assert_eq!(dags.len(), 1);
        assert_eq!(dags[0].to_string(), "(0,0)");
    }

    #[test]
    fn test_two_nodes() {
        let dags: Vec<String> = collect(2, Level::Reduced).iter().map(Dag::to_string).collect();
        assert_eq!(dags, ["(0,0) (1,0)", "(0,0) (1,1)"]);
    }

    #[test]
    fn test_counts() {
        assert_eq!(collect(3, Level::Ordered).len(), 7);
        assert_eq!(collect(3, Level::Reduced).len(), 7);
        assert_eq!(collect(4, Level::Ordered).len(), 35);
        assert_eq!(collect(4, Level::Reduced).len(), 32);
        assert_eq!(collect(5, Level::Ordered).len(), 229);
        assert_eq!(collect(5, Level::Reduced).len(), 194);
    }

    #[test]
    fn test_reduction_drops_relabelings() {
        let ordered = collect(4, Level::Ordered);
        let reduced = collect(4, Level::Reduced);
        let dropped: Vec<String> = ordered
            .iter()
            .filter(|d| !reduced.contains(d))
            .map(Dag::to_string)
            .collect();
        assert_eq!(
            dropped,
            [
                "(0,0) (0,0) (2,0) (3,1)",
                "(0,0) (0,0) (2,1) (3,2)",
                "(0,0) (0,0) (2,2) (3,1)",
            ]
        );
    }

    #[test]
    fn test_every_node_is_used() {
        for dag in collect(5, Level::Reduced) {
            let q = dag.num_ops();
            let mut used = vec![false; q];
            for (x, y) in dag.pairs() {
                used[x as usize] = true;
                used[y as usize] = true;
            }
            assert!(used.iter().all(|&u| u), "useless node in {dag}");
        }
    }

    #[test]
    fn test_lexicographic_order() {
        let dags = collect(5, Level::Ordered);
        for pair in dags.windows(2) {
            let a: Vec<_> = pair[0].pairs().collect();
            let b: Vec<_> = pair[1].pairs().collect();
            assert!(a < b);
        }
    }
}
