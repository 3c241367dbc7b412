//! Baby-step giant-step discrete log.
//!
//! Finds the smallest `k < 2^32` with `y = [k]G` for the fixed generator
//! `G`. `k` grows as large as a sum of 32-bit addends after homomorphic
//! ElGamal addition, so the full range has to be covered; the naive linear
//! scan is infeasible, hence BSGS.

use std::collections::HashMap;

use veil_base::{Diagnostic, ErrorKind, Result, Span};

use crate::babyjubjub::{self, Fq, Fr, Point};

/// `m = 2^16`; the table holds `m` baby steps, the scan covers `m` giant
/// steps, for a total search space of `m^2 = 2^32`.
const STEP: u64 = 1 << 16;

/// Finds `k` with `target = [k]G`, or fails with [`ErrorKind::DlogNotFound`]
/// if no such `k < 2^32` exists.
pub(crate) fn solve(target: Point) -> Result<u64> {
    let g = babyjubjub::generator();

    let mut baby_steps: HashMap<Fq, u64> = HashMap::with_capacity(STEP as usize);
    let mut acc = babyjubjub::identity();
    for j in 0..STEP {
        baby_steps.entry(acc.x).or_insert(j);
        acc = babyjubjub::add(acc, g);
    }

    let giant_stride = babyjubjub::scalar_mul(g, Fr::from(STEP));
    let neg_giant_stride = babyjubjub::neg(giant_stride);

    let mut y_i = target;
    for i in 0..STEP {
        if let Some(&j) = baby_steps.get(&y_i.x) {
            let k = i * STEP + j;
            if babyjubjub::scalar_mul(g, Fr::from(k)) == target {
                return Ok(k);
            }
            // u-coordinate collision between (u,v) and (u,-v); keep scanning.
        }
        y_i = babyjubjub::add(y_i, neg_giant_stride);
    }

    Err(Diagnostic::new(
        ErrorKind::DlogNotFound,
        "no k in [0, 2^32) satisfies y = [k]G",
        Span::new(0, 0),
    ))
}

/// Recovers `k` from the little-endian `Fq` encoding of `y`'s `u` and `v`
/// coordinates. Returns `k` formatted as decimal with no leading zeros.
pub fn compute_dlog(x_le_bytes: [u8; 32], y_le_bytes: [u8; 32]) -> Result<String> {
    let u = babyjubjub::decode_fq(x_le_bytes);
    let v = babyjubjub::decode_fq(y_le_bytes);
    let target = Point::new(u, v);
    solve(target).map(|k| k.to_string())
}
