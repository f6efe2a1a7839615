//! The cost lattice `f_m` over `[0, m]`.
//!
//! `f_m` is the least function vanishing on 0 and on the powers of two and
//! satisfying `f(a + b) <= f(a) + f(b) + 1`, `f(|a - b|) <= f(a) + f(b) + 1`
//! and `f(a * b) <= f(a) + f(b)`. It is computed one cost level at a time:
//! level `c` combines the members of earlier levels, so each cell is written
//! exactly once and the per-level bucket lists stay sorted.

use anyhow::{ensure, Result};
use tracing::debug;

/// Cost byte of a cell not assigned yet.
pub const UNASSIGNED: u8 = u8::MAX;

/// Chain terminator of the bucket lists.
const NIL: usize = usize::MAX;

/// Outcome of one completed cost level.
#[derive(Copy, Clone, Debug)]
pub struct LevelSummary {
    pub level: u8,
    /// Smallest integer first assigned at this level, if any.
    pub nmin: Option<usize>,
    /// Number of cells assigned at this level.
    pub assigned: usize,
}

pub struct Lattice {
    m: usize,
    cost: Vec<u8>,
    /// Ascending chain through the cells of each completed level.
    next: Vec<usize>,
    /// Head cell of each completed level.
    first: Vec<usize>,
    /// Cells not assigned yet.
    remaining: usize,
}

impl Lattice {
    /// Prepares the lattice over `[0, m]`: level 0 holds 0 and the powers of
    /// two, everything else is unassigned.
    pub fn new(m: usize) -> Result<Lattice> {
        ensure!(m >= 1, "m must be at least 1");
        ensure!(m < (1 << 31), "m too large");
        let mut cost = vec![UNASSIGNED; m + 1];
        let mut next = vec![NIL; m + 1];
        cost[0] = 0;
        let mut remaining = m;
        let mut head = 0;
        let mut p = 1;
        while p <= m {
            cost[p] = 0;
            next[head] = p;
            head = p;
            remaining -= 1;
            p <<= 1;
        }
        Ok(Lattice {
            m,
            cost,
            next,
            first: vec![0],
            remaining,
        })
    }

    pub fn bound(&self) -> usize {
        self.m
    }

    /// Number of completed positive levels.
    pub fn levels(&self) -> usize {
        self.first.len() - 1
    }

    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }

    /// Cost bytes of every cell, `UNASSIGNED` where no level reached.
    pub fn costs(&self) -> &[u8] {
        &self.cost
    }

    pub fn cost(&self, n: usize) -> Option<u8> {
        let c = self.cost[n];
        (c != UNASSIGNED).then_some(c)
    }

    /// Finds every `n` with `f_m(n)` equal to the next level and chains the
    /// new cells in ascending order.
    pub fn advance_level(&mut self) -> LevelSummary {
        let c = self.first.len();
        let cost = c as u8;
        let mut nmin = NIL;
        let mut assigned = 0;

        // additive pass: one extra operation on top of two earlier levels
        for ca in 0..c {
            let cb = c - 1 - ca;
            if cb < ca {
                break;
            }
            let mut a = self.first[ca];
            while a != NIL {
                let mut b = self.first[cb];
                while b != NIL {
                    let n = a + b;
                    if n <= self.m && self.cost[n] == UNASSIGNED {
                        self.assign(n, cost, &mut nmin, &mut assigned);
                    }
                    let n = a.abs_diff(b);
                    if self.cost[n] == UNASSIGNED {
                        self.assign(n, cost, &mut nmin, &mut assigned);
                    }
                    b = self.next[b];
                }
                a = self.next[a];
            }
        }

        // multiplicative pass: products cost the sum of their factor levels
        for ca in 1..=c {
            let cb = c - ca;
            if cb < ca {
                break;
            }
            let mut a = self.first[ca];
            while a != NIL {
                let mut b = self.first[cb];
                while b != NIL {
                    let n = a as u64 * b as u64;
                    if n > self.m as u64 {
                        break; // the b chain is ascending
                    }
                    let n = n as usize;
                    if self.cost[n] == UNASSIGNED {
                        self.assign(n, cost, &mut nmin, &mut assigned);
                    }
                    b = self.next[b];
                }
                a = self.next[a];
            }
        }

        // power-of-two pass: doublings of the cells newly at this level;
        // a cell whose half sits at the same level was handled through it
        for b in 3..=self.m {
            if self.cost[b] == cost && (b & 1 == 1 || self.cost[b >> 1] != cost) {
                let mut n = b;
                loop {
                    n <<= 1;
                    if n > self.m {
                        break;
                    }
                    if self.cost[n] == UNASSIGNED {
                        self.assign(n, cost, &mut nmin, &mut assigned);
                    }
                }
            }
        }

        // chain the level in ascending order
        self.first.push(nmin);
        if nmin != NIL {
            let mut prev = nmin;
            for b in nmin + 1..=self.m {
                if self.cost[b] == cost {
                    self.next[prev] = b;
                    prev = b;
                }
            }
            self.next[prev] = NIL;
        }

        debug!("level {c}: {assigned} cells, {} remaining", self.remaining);
        LevelSummary {
            level: cost,
            nmin: (nmin != NIL).then_some(nmin),
            assigned,
        }
    }

    fn assign(&mut self, n: usize, cost: u8, nmin: &mut usize, assigned: &mut usize) {
        self.cost[n] = cost;
        if n < *nmin {
            *nmin = n;
        }
        *assigned += 1;
        self.remaining -= 1;
    }
}
