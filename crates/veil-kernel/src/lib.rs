#![cfg_attr(docsrs, feature(doc_cfg))]

//! # veil-kernel
//!
//! The privacy-label and type algebra at the centre of veil's static
//! checks, kept free of any AST or I/O concern:
//!
//! - [`Label`] — `all` / `me` / `Id(name)`, the three forms a privacy
//!   annotation can take
//! - [`PartitionState`] — a union-find over labels; two labels in the same
//!   class are currently provable to name the same principal
//! - [`Type`]/[`AnnotatedType`] — the elementary and composite types, and
//!   the `T@L` pairing of a type with the label that restricts who may read
//!   it
//!
//! Everything here is pure data and pure functions over that data: no
//! parsing, no symbol tables, no file access. Higher-level crates
//! (`veil-ast`, `veil-analysis`) own the business of walking a program and
//! calling into this algebra at each step.

pub mod label;
pub mod partition;
pub mod types;

pub use label::Label;
pub use partition::PartitionState;
pub use types::{AnnotatedType, Type};
