//! Hash-consed store of the best known derivation for each odd constant.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]; the hash table is
//! a fixed array of buckets chained through the nodes themselves, keyed on
//! `value % HASH_SIZE`. A node starts *invalid* (no derivation known, its
//! `cost` field holding a lower bound) and is promoted when the search finds
//! a derivation within budget.

use crate::cost::Cost;
use crate::value::Value;
use anyhow::{ensure, Result};
use env_param::EnvParam;
use std::num::NonZeroU32;
use std::ops::{Index, IndexMut};

/// Number of buckets of the memo hash table.
static HASH_SIZE: EnvParam<usize> = EnvParam::new("MULSEQ_HASH_SIZE", "16383");

/// Population above which the memo is flushed between two queries.
static MAXNON: EnvParam<usize> = EnvParam::new("MULSEQ_MAXNON", "65536");

/// Operation deriving the value of a node from its parent.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Op {
    /// The value 1, i.e. the multiplicand itself.
    Identity,
    /// `parent + 1`
    Add1,
    /// `parent - 1`
    Sub1,
    /// `parent * (2^k + 1)`
    FactorAdd,
    /// `parent * (2^k - 1)`
    FactorSub,
}

impl Op {
    pub const fn sign(self) -> char {
        match self {
            Op::Identity => ' ',
            Op::Add1 | Op::FactorAdd => '+',
            Op::Sub1 | Op::FactorSub => '-',
        }
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Op::Identity => "noop",
            Op::Add1 => "add(1)",
            Op::Sub1 => "subtract(1)",
            Op::FactorAdd => "add(n)",
            Op::FactorSub => "subtract(n)",
        };
        write!(f, "{name}")
    }
}

/// Index of a node in the memo arena.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Debug)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    fn from_index(index: usize) -> NodeId {
        NodeId(NonZeroU32::new(index as u32 + 1).unwrap())
    }

    fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// Best known derivation of an odd constant.
#[derive(Clone, Debug)]
pub struct Node {
    /// Odd value of this node.
    pub value: Value,
    /// Cost of the value or, while `op` is `None`, a lower bound on it valid
    /// under the budget the node was last searched with.
    pub cost: Cost,
    /// Operation producing `value` from `parent`; `None` while no derivation
    /// within budget is known.
    pub op: Option<Op>,
    /// Shift applied to the parent before the operation.
    pub shift: u32,
    /// Node this one is derived from.
    pub parent: Option<NodeId>,
    /// Next node in the same hash bucket.
    next: Option<NodeId>,
}

pub struct Memo {
    buckets: Vec<Option<NodeId>>,
    nodes: Vec<Node>,
    /// Live node count, cross-checked against the chains on reset.
    population: usize,
}

impl Memo {
    pub fn new() -> Memo {
        Memo {
            buckets: vec![None; HASH_SIZE.get().max(1)],
            nodes: Vec::new(),
            population: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn over_capacity(&self) -> bool {
        self.population > MAXNON.get()
    }

    fn bucket(&self, n: Value) -> usize {
        (n as usize) % self.buckets.len()
    }

    /// Looks up the node for `n`, if any.
    pub fn find(&self, n: Value) -> Option<NodeId> {
        let mut cur = self.buckets[self.bucket(n)];
        while let Some(id) = cur {
            let node = &self.nodes[id.index()];
            if node.value == n {
                return Some(id);
            }
            cur = node.next;
        }
        None
    }

    /// Creates an invalid node for `n` and chains it into its bucket.
    /// The caller is responsible for not inserting a value twice.
    pub fn insert(&mut self, n: Value) -> NodeId {
        debug_assert!(self.find(n).is_none());
        let bucket = self.bucket(n);
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node {
            value: n,
            cost: 0,
            op: None,
            shift: 0,
            parent: None,
            next: self.buckets[bucket],
        });
        self.buckets[bucket] = Some(id);
        self.population += 1;
        id
    }

    /// Frees every node and empties the buckets.
    ///
    /// Fails when the chains do not account for exactly the tracked
    /// population, which indicates the table was corrupted.
    pub fn reset(&mut self) -> Result<()> {
        let mut chained = 0usize;
        for bucket in &mut self.buckets {
            let mut cur = bucket.take();
            while let Some(id) = cur {
                chained += 1;
                cur = self.nodes[id.index()].next;
            }
        }
        ensure!(
            chained == self.population && self.population == self.nodes.len(),
            "internal error: memo population mismatch ({} chained, {} tracked)",
            chained,
            self.population
        );
        self.nodes.clear();
        self.population = 0;
        Ok(())
    }
}

impl Default for Memo {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<NodeId> for Memo {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

impl IndexMut<NodeId> for Memo {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_find() {
        let mut memo = Memo::new();
        assert!(memo.find(51).is_none());
        let id = memo.insert(51);
        assert_eq!(memo.find(51), Some(id));
        assert_eq!(memo[id].value, 51);
        assert_eq!(memo[id].op, None);
        assert_eq!(memo.len(), 1);
    }

    #[test]
    fn test_chained_bucket_collisions() {
        let mut memo = Memo::new();
        // values congruent modulo any plausible bucket count still resolve
        let ids: Vec<_> = (0..64).map(|k| memo.insert(2 * k + 1)).collect();
        for (k, id) in ids.iter().enumerate() {
            assert_eq!(memo.find(2 * k as Value + 1), Some(*id));
        }
    }

    #[test]
    fn test_reset() {
        let mut memo = Memo::new();
        for k in 0..100 {
            memo.insert(2 * k + 1);
        }
        assert_eq!(memo.len(), 100);
        memo.reset().unwrap();
        assert!(memo.is_empty());
        assert!(memo.find(1).is_none());
        let id = memo.insert(7);
        assert_eq!(memo.find(7), Some(id));
    }
}
