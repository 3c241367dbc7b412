#![cfg_attr(docsrs, feature(doc_cfg))]

//! # veil-base
//!
//! Pure structural atoms shared across the veil compiler front-end.
//!
//! This crate provides the foundational types used throughout veil:
//!
//! - [`Arena`]/[`NodeId`] — `Vec`-backed allocation with stable integer handles
//! - [`Interner`]/[`Symbol`] — string interning for O(1) equality
//! - [`Span`] — source location tracking
//! - [`Diagnostic`]/[`Result`] — tagged errors with source positions
//!
//! # Design Principles
//!
//! This crate has **no knowledge of privacy labels, types, or the AST**. It
//! provides only generic, reusable infrastructure that higher-level crates
//! build upon.
//!
//! # Example
//!
//! ```
//! use veil_base::{Arena, Interner, Span};
//!
//! let mut arena: Arena<&str> = Arena::new();
//! let mut interner = Interner::new();
//!
//! let hello = interner.intern("hello");
//! let span = Span::new(0, 5);
//!
//! let id = arena.alloc("hello");
//! assert_eq!(*arena.get(id), "hello");
//! ```

pub mod arena;
pub mod intern;
pub mod span;
pub mod error;

pub use arena::{Arena, NodeId};
pub use intern::{Interner, Symbol, SymbolEq};
pub use span::Span;
pub use error::{Diagnostic, ErrorKind, Result};
