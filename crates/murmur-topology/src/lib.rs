//! Murmur Communication Topology
//!
//! Fixed undirected communication graphs over which the averaging protocol
//! gossips. A topology is built once from a square 0/1 adjacency matrix and
//! never mutated afterward.
//!
//! # Invariants
//!
//! - The matrix is square with a zero diagonal (no self-loops).
//! - The matrix is symmetric: if A lists B as a neighbor, B lists A.
//! - Connectivity is a *precondition* of the averaging protocol, not of the
//!   type: [`Topology::is_connected`] lets callers fail fast, and test code
//!   may deliberately construct disconnected graphs.
//!
//! # Generators
//!
//! [`path`], [`ring`], [`complete`] and [`random_connected`] build common
//! graphs directly; `random_connected` is seeded and reproducible.

mod adjacency;
mod generate;

pub use adjacency::{Topology, TopologyError};
pub use generate::{complete, path, random_connected, ring};
