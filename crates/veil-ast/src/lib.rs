#![cfg_attr(docsrs, feature(doc_cfg))]

//! # veil-ast
//!
//! The arena-based AST plus the three passes that prepare it for type
//! checking:
//!
//! 1. [`parents::set_parents`] — records `parent` back-pointers
//! 2. [`resolve::resolve`] — binds every identifier and label use to its
//!    declaration
//! 3. [`returns::check_returns`] — every non-void function returns on every
//!    path
//!
//! These three run in that order, once, before alias analysis and type
//! checking begin (`veil-analysis`).

pub mod ast;
pub mod parents;
pub mod resolve;
pub mod returns;

pub use ast::{
    BinOpKind, Constructor, Contract, Expr, Function, Literal, Node, Param, SourceUnit, StateVar,
    Stmt, UnOpKind,
};
pub use ast::Ast;
pub use parents::set_parents;
pub use resolve::resolve;
pub use returns::check_returns;
