#![cfg_attr(docsrs, feature(doc_cfg))]

//! # veil-crypto
//!
//! Baby-step giant-step discrete log recovery on Baby Jubjub, plus the
//! ElGamal encryption layer that is the solver's only caller. [`compute_dlog`]
//! is the function downstream code is expected to call; [`babyjubjub`] and
//! [`elgamal`] are exposed because the solver is meaningless without them,
//! not as a second public contract.

pub mod babyjubjub;
pub mod dlog;
pub mod elgamal;

pub use dlog::compute_dlog;
