// SPDX-License-Identifier: BSD-3-Clause-Clear

use crypto_bigint::{Encoding, NonZero, Uint};

/// Euclidean gcd over `Uint`s.
///
/// Only key generation needs a big-integer gcd (for $\lambda =
/// \phi/\gcd(p_1-1, p_2-1)$), so a plain remainder loop is enough; all other
/// coprimality checks in this crate reduce to `u64` first.
pub(crate) fn gcd<const LIMBS: usize>(mut a: Uint<LIMBS>, mut b: Uint<LIMBS>) -> Uint<LIMBS> {
    while b != Uint::ZERO {
        // `b` was just checked to be non-zero.
        let modulus = NonZero::new(b).unwrap();
        let remainder = a % modulus;
        a = b;
        b = remainder;
    }
    a
}

/// The lowest 64 bits of `x`.
///
/// Callers invoke this on reduction results that are already known to be
/// below $2^{64}$ (e.g. a residue mod a `u64`), where the remaining limbs
/// are zero.
pub(crate) fn lowest_u64<const LIMBS: usize>(x: &Uint<LIMBS>) -> u64
where
    Uint<LIMBS>: Encoding,
{
    let bytes = x.to_le_bytes();
    let mut low = [0u8; 8];
    low.copy_from_slice(&bytes.as_ref()[..8]);
    u64::from_le_bytes(low)
}

/// Exact $\lceil\sqrt{x}\rceil$.
///
/// The float square root seeds the search; the integer correction loops fix
/// the few-ulp error `f64` leaves for large `x` (and the overflow of
/// squaring $2^{32}$ for `x` near `u64::MAX`).
pub(crate) fn ceil_sqrt(x: u64) -> u64 {
    if x <= 1 {
        return x;
    }

    let mut root = (x as f64).sqrt() as u64;
    while root.checked_mul(root).is_some_and(|square| square < x) {
        root += 1;
    }
    // An overflowing square is certainly >= x, so keep stepping down.
    while root > 1 && (root - 1).checked_mul(root - 1).map_or(true, |square| square >= x) {
        root -= 1;
    }
    root
}

#[cfg(test)]
mod tests {
    use crypto_bigint::U2048;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(48, 18, 6)]
    #[case(18, 48, 6)]
    #[case(17, 5, 1)]
    #[case(12, 0, 12)]
    #[case(0, 12, 12)]
    fn computes_gcd(#[case] a: u64, #[case] b: u64, #[case] expected: u64) {
        assert_eq!(
            gcd(U2048::from(a), U2048::from(b)),
            U2048::from(expected)
        );
    }

    #[test]
    fn extracts_lowest_u64() {
        assert_eq!(lowest_u64(&U2048::from(0u64)), 0);
        assert_eq!(lowest_u64(&U2048::from(u64::MAX)), u64::MAX);
        assert_eq!(lowest_u64(&U2048::from(1_000_000_007u64)), 1_000_000_007);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(2, 2)]
    #[case(3, 2)]
    #[case(4, 2)]
    #[case(5, 3)]
    #[case(9, 3)]
    #[case(10, 4)]
    #[case(1_000_000_007, 31_623)]
    #[case(u64::MAX, 1 << 32)]
    fn computes_ceil_sqrt(#[case] x: u64, #[case] expected: u64) {
        assert_eq!(ceil_sqrt(x), expected);
    }

    #[test]
    fn ceil_sqrt_is_tight_around_perfect_squares() {
        for root in [2u64, 3, 1_000, 65_536, 4_294_967_295] {
            let square = root * root;
            assert_eq!(ceil_sqrt(square), root);
            assert_eq!(ceil_sqrt(square - 1), root);
            assert_eq!(ceil_sqrt(square + 1), root + 1);
        }
    }
}
