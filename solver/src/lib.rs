//! Search engines for multiplication by an integer constant.
//!
//! Given a positive constant `n`, the crate computes straight-line programs
//! that multiply an arbitrary value by `n` using only shifts, additions and
//! subtractions, together with cost tables over ranges of constants:
//!
//! - [`search`] implements Bernstein's memoized branch-and-bound over factor
//!   and increment/decrement transformations of odd constants.
//! - [`dag`] enumerates the canonical DAGs of `q` shift-and-add operations
//!   and exhaustively evaluates their parameter spaces, recording the
//!   minimum operation count for every reachable value.
//! - [`lattice`] computes the cost function `f_m` over `[0, m]` under the
//!   inductive addition/multiplication rules, one cost level at a time.

pub mod cost;
pub mod dag;
pub mod lattice;
pub mod memo;
pub mod search;
pub mod table;
pub mod value;
