// SPDX-License-Identifier: BSD-3-Clause-Clear

use crypto_bigint::{rand_core::CryptoRngCore, NonZero};

use crate::{
    arithmetic::lowest_u64,
    error::{Error, Result},
    LargePrimeSizedNumber,
};

const SMALL_PRIMES: [u64; 16] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53];

/// The product of [`SMALL_PRIMES`].
const SMALL_PRIMES_PRODUCT: u64 = 16_294_579_238_595_022_365;

/// Generates a prime `p` of exactly `bits` bits with $p \equiv 1 \pmod r$.
///
/// Rejection-sampling generic primes and testing `p mod r == 1` afterwards
/// is infeasible for large `r` (the density of suitable primes falls off as
/// $1/(r \ln p)$), so the congruence is forced up-front: a random candidate
/// is snapped down to the congruence class, then shifted through it in
/// `delta * r` steps with a small-prime sieve filtering candidates before
/// the expensive probabilistic test.
///
/// `r = 1` degenerates to a standard prime generator.
pub fn generate_prime_with_congruence(
    rng: &mut impl CryptoRngCore,
    bits: usize,
    r: u64,
) -> Result<LargePrimeSizedNumber> {
    if !(2..=LargePrimeSizedNumber::BITS).contains(&bits) {
        return Err(Error::InvalidSecurityParameter(bits));
    }
    if r == 0 {
        return Err(Error::InvalidPlaintextModulus(r));
    }

    let byte_length = bits.div_ceil(8);
    // Bits of the candidate living in its most significant byte.
    let top_bits = match bits % 8 {
        0 => 8,
        partial => partial,
    };

    let r_wide = LargePrimeSizedNumber::from(r);
    let r_nonzero = NonZero::new(r_wide).unwrap();
    let sieve_modulus = NonZero::new(LargePrimeSizedNumber::from(SMALL_PRIMES_PRODUCT)).unwrap();

    loop {
        let mut bytes = [0u8; LargePrimeSizedNumber::BYTES];
        let first = LargePrimeSizedNumber::BYTES - byte_length;
        rng.fill_bytes(&mut bytes[first..]);

        // Trim the most significant byte so the candidate has at most `bits`
        // bits, then set the top two bits: a product of two such primes
        // never comes out one bit short.
        bytes[first] &= ((1u16 << top_bits) - 1) as u8;
        if top_bits >= 2 {
            bytes[first] |= 3u8 << (top_bits - 2);
        } else {
            bytes[first] |= 1;
            if byte_length > 1 {
                bytes[first + 1] |= 0x80;
            }
        }
        // An even number this large certainly isn't prime.
        bytes[LargePrimeSizedNumber::BYTES - 1] |= 1;

        let mut p = LargePrimeSizedNumber::from_be_slice(&bytes);

        // Snap down into the congruence class: $p \gets p - ((p - 1) \bmod r)$.
        // Candidates not exceeding `r` can't satisfy both `p mod r == 1` and
        // primality, so resample.
        if p <= r_wide {
            continue;
        }
        let excess = p.wrapping_sub(&LargePrimeSizedNumber::ONE) % r_nonzero;
        p = p.wrapping_sub(&excess);

        // Walk the congruence class in `delta * r` steps, sieving with the
        // small-prime product; `delta` stays even, which keeps the candidate
        // odd whenever `r` is odd. `delta_max` caps the walk so that
        // `residue + delta * r` cannot overflow a `u64`.
        let residue = lowest_u64(&(p % sieve_modulus));
        let delta_max = (u64::MAX - residue) / r;
        let mut delta = 0u64;
        while delta < 1 << 20 && delta <= delta_max {
            let candidate = residue + delta * r;
            if SMALL_PRIMES
                .iter()
                .any(|&q| candidate % q == 0 && (bits > 6 || candidate != q))
            {
                delta += 2;
                continue;
            }

            if delta > 0 {
                p = p.wrapping_add(&LargePrimeSizedNumber::from(delta * r));
            }
            break;
        }

        // The shift may have pushed the candidate one bit past `bits`, so
        // the bit length is re-checked alongside primality.
        if crypto_primes::is_prime_with_rng(rng, &p) && p.bits_vartime() == bits {
            return Ok(p);
        }
    }
}
