//! Baby Jubjub curve arithmetic.
//!
//! Baby Jubjub is the twisted-Edwards curve `a*u^2 + v^2 = 1 + d*u^2*v^2`
//! with `a = 168700`, `d = 168696`, defined over `Fq`, the scalar field of
//! BN254 — exactly what `ark-ed-on-bn254` implements. This module only adds
//! the generator this crate commits to (the standard prime-order subgroup
//! generator, known as `Base8` in circomlib's naming) and the 32-byte
//! little-endian wire encoding for a single coordinate.

use ark_ec::CurveGroup;
use ark_ff::{MontFp, PrimeField};

pub use ark_ed_on_bn254::{EdwardsAffine as Point, Fq, Fr};

/// `u`-coordinate of the standard Baby Jubjub subgroup generator.
pub const GENERATOR_U: Fq =
    MontFp!("5299619240641551281634865583518297030282874472190772894086521144482721001553");
/// `v`-coordinate of the standard Baby Jubjub subgroup generator.
pub const GENERATOR_V: Fq =
    MontFp!("16950150798460657717958625567821834550301663161624707787222815936182638968203");

pub fn generator() -> Point {
    Point::new(GENERATOR_U, GENERATOR_V)
}

pub fn identity() -> Point {
    Point::new(Fq::from(0u64), Fq::from(1u64))
}

pub fn add(a: Point, b: Point) -> Point {
    (a + b).into_affine()
}

pub fn neg(a: Point) -> Point {
    -a
}

pub fn scalar_mul(p: Point, k: Fr) -> Point {
    (p * k).into_affine()
}

/// Encodes an `Fq` element as 32 little-endian bytes.
pub fn encode_fq(x: Fq) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    let repr = x.into_bigint().to_bytes_le();
    bytes[..repr.len()].copy_from_slice(&repr);
    bytes
}

/// Decodes 32 little-endian bytes into an `Fq` element, reducing modulo the
/// field order if the encoding is out of range.
pub fn decode_fq(bytes: [u8; 32]) -> Fq {
    Fq::from_le_bytes_mod_order(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_round_trips_through_the_wire_encoding() {
        let g = generator();
        let u = decode_fq(encode_fq(g.x));
        let v = decode_fq(encode_fq(g.y));
        assert_eq!(u, g.x);
        assert_eq!(v, g.y);
    }

    #[test]
    fn adding_identity_is_a_no_op() {
        let g = generator();
        assert_eq!(add(g, identity()), g);
    }

    #[test]
    fn scalar_mul_by_zero_is_identity() {
        let g = generator();
        assert_eq!(scalar_mul(g, Fr::from(0u64)), identity());
    }

    #[test]
    fn negation_is_its_own_inverse() {
        let g = generator();
        assert_eq!(neg(neg(g)), g);
    }

    #[test]
    fn point_plus_its_negation_is_identity() {
        let g = generator();
        assert_eq!(add(g, neg(g)), identity());
    }
}
