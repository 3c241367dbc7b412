#![cfg_attr(docsrs, feature(doc_cfg))]

//! # veil-analysis
//!
//! The three passes that run after symbol resolution and the return checker
//! (`veil-ast`) and before the back-end takes over:
//!
//! 1. [`alias`] — flow-sensitive partition refinement over ownership labels
//! 2. [`typecheck`] — bottom-up type and privacy-label synthesis
//! 3. [`hybrid`] — which functions need a zero-knowledge proof
//!
//! `alias::run` must complete before `typecheck::run` — the type checker
//! reads each statement's `before_analysis` partition straight off the AST.
//! `hybrid::run` reads each expression's `annotated_type`, so it runs last.

pub mod alias;
pub mod hybrid;
pub mod typecheck;

pub use alias::run as analyze_aliases;
pub use hybrid::run as detect_hybrid_functions;
pub use typecheck::run as check_types;
