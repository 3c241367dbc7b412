#![cfg_attr(docsrs, feature(doc_cfg))]

//! # veil-surrogate
//!
//! Rewrites privacy-annotated source into the byte-length-preserving subset
//! its host-language back-end can type-check on its own: comments and
//! string contents blanked, `final`/`@owner`/`!tag` stripped, `reveal(...)`
//! unwrapped to its inner expression, and a `me` declaration spliced into
//! every contract body. No parsing, no AST — this crate only ever sees the
//! source text.

pub mod rewrite;

pub use rewrite::rewrite as surrogate;
