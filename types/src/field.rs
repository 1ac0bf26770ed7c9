//! Arithmetic modulo the fixed ~512-bit modulus `P`.
//!
//! Every DAG entry is a nonnegative integer below `P`. The modulus is the
//! square of the secp256k1 field prime `2^256 - 4294968273` and therefore
//! composite; the scheme leans on the cost of modular exponentiation, not
//! on any group structure.

use crate::{U1024, U512};
use lazy_static::lazy_static;

lazy_static! {
    /// `P = (2^256 - 4294968273)^2`.
    pub static ref P: U512 = {
        let base = (U1024::one() << 256) - U1024::from(4_294_968_273u64);
        (base * base).to_u512()
    };

    // `P` at the operand width of the reduction step.
    static ref P_WIDE: U1024 = P.widen();
}

/// `(a * b) mod P`, over the full 1024-bit product.
pub fn mulmod(a: U512, b: U512) -> U512 {
    (a.full_mul(b) % *P_WIDE).to_u512()
}

/// `base^exp mod P` by square-and-multiply. The exponents used here stay
/// small (the entry exponent `w`, or an entry index below `dag_size`), but
/// any `u64` exponent is handled.
pub fn powmod(base: U512, mut exp: u64) -> U512 {
    let mut result = U512::one();
    let mut square = base;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mulmod(result, square);
        }
        exp >>= 1;
        if exp > 0 {
            square = mulmod(square, square);
        }
    }
    result
}

/// Reduces a 512-bit value to an index below `modulus`.
pub fn mod_index(value: U512, modulus: usize) -> usize {
    (value % (modulus as u64)).as_u64() as usize
}

/// The acceptance boundary for a difficulty: `2^512 / diff`. The boundary
/// is kept at 1024 bits because `diff = 1` puts it at `2^512` itself.
pub fn difficulty_to_boundary(diff: u64) -> U1024 {
    debug_assert!(diff != 0);
    (U1024::one() << 512) / U1024::from(diff)
}

/// The difficulty predicate: a mix is accepted iff it does not exceed the
/// boundary.
pub fn meets_boundary(mix: U512, boundary: U1024) -> bool {
    mix.widen() <= boundary
}
