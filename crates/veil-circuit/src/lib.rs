#![cfg_attr(docsrs, feature(doc_cfg))]

//! # veil-circuit
//!
//! The circuit-constraint IR a function's private computation lowers into:
//! a flat, ordered [`CircuitStatement`] list plus a [`CircuitBuilder`] that
//! tracks the active guard stack while it is assembled. The back-end that
//! turns this list into an actual arithmetic circuit is out of scope here —
//! this crate only guarantees the list is well-formed (guards balanced,
//! source order preserved).

pub mod builder;
pub mod statement;

pub use builder::CircuitBuilder;
pub use statement::{CircuitStatement, CircuitVar};
