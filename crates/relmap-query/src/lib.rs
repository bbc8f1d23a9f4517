//! Query rendering for relmap.
//!
//! Builds SELECT and INSERT statements as SQL text plus named parameters.
//! Identifiers are quoted by the dialect chain, and values carrying a type
//! token are written through the converter the chain resolves, so their
//! placeholders pick up any cast or function wrapper the engine needs.
//!
//! Joined tables are aliased by property path and their columns selected as
//! `"<path>.<column>"`, the naming the row mapper's prefixed views read.

pub mod clause;
pub mod insert;
pub mod select;

pub use clause::{Condition, Direction, Op, OrderBy};
pub use insert::Insert;
pub use select::{Join, JoinKind, Select};
