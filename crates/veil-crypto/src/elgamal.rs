//! ElGamal encryption over Baby Jubjub.
//!
//! Not itself the headline public contract of this crate, but the actual
//! reason `compute_dlog` exists: this is what embeds a plaintext as
//! `[plain]G` and later needs the discrete log back out.

use veil_base::{Diagnostic, ErrorKind, Result, Span};

use crate::babyjubjub::{self, Fr, Point};
use crate::dlog;

/// A two-point ElGamal ciphertext: `c1 = [r]G`, `c2 = [plain]G + [r]pk`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ciphertext {
    pub c1: Point,
    pub c2: Point,
}

pub fn encrypt(plain: u32, randomness: Fr, pk: Point) -> Ciphertext {
    let g = babyjubjub::generator();
    let plain_embedded = babyjubjub::scalar_mul(g, Fr::from(plain));
    let shared_secret = babyjubjub::scalar_mul(pk, randomness);
    Ciphertext {
        c1: babyjubjub::scalar_mul(g, randomness),
        c2: babyjubjub::add(plain_embedded, shared_secret),
    }
}

/// Recovers the plaintext, de-embedding `[plain]G` via BSGS. Fails with
/// [`ErrorKind::DlogNotFound`] if the ciphertext does not embed a value in
/// `[0, 2^32)`.
pub fn decrypt(cipher: &Ciphertext, sk: Fr) -> Result<u32> {
    let shared_secret = babyjubjub::scalar_mul(cipher.c1, sk);
    let plain_embedded = babyjubjub::add(cipher.c2, babyjubjub::neg(shared_secret));
    let k = dlog::solve(plain_embedded)?;
    u32::try_from(k).map_err(|_| {
        Diagnostic::new(ErrorKind::DlogNotFound, "decrypted value exceeds u32 range", Span::new(0, 0))
    })
}

/// Homomorphic ciphertext addition: `add(Enc(a), Enc(b))` decrypts to `a + b`.
pub fn add(lhs: &Ciphertext, rhs: &Ciphertext) -> Ciphertext {
    Ciphertext {
        c1: babyjubjub::add(lhs.c1, rhs.c1),
        c2: babyjubjub::add(lhs.c2, rhs.c2),
    }
}
