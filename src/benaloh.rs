// SPDX-License-Identifier: BSD-3-Clause-Clear

//! The Benaloh cryptosystem over the ring $\mathbb{Z}_N$, with a tunable
//! prime plaintext modulus `r` embedded exactly once in $\phi(N)$.
//!
//! Decryption recovers the plaintext as a discrete logarithm in the
//! order-`r` subgroup via baby-step/giant-step: an $O(\sqrt{r})$-space table
//! pair is built at key generation, making each decryption $O(\sqrt{r})$
//! ring operations instead of an $O(r)$ scan.

use crypto_bigint::modular::runtime_mod::{DynResidue, DynResidueParams};
use crypto_bigint::rand_core::{CryptoRngCore, RngCore, SeedableRng};
use crypto_bigint::{NonZero, RandomMod, U64};
use gcd::Gcd;
use rand_chacha::ChaCha20Rng;

use crate::{
    arithmetic::{ceil_sqrt, lowest_u64},
    error::{Error, Result},
    primes, AsNaturalNumber, BiPrimeRingElement, Ciphertext, LargeBiPrimeSizedNumber,
    LargePrimeSizedNumber, PublicKey, SecretKey,
};

/// A giant-step table entry: the residue $x^{power} \bmod N$ keyed by its
/// exponent. The table is sorted by residue, so the pair must travel
/// together.
#[derive(Clone, Debug)]
struct RootPower {
    power: u64,
    residue: LargeBiPrimeSizedNumber,
}

/// Generates a Benaloh key pair for plaintext modulus `r` from two
/// `security_bits`-bit primes.
///
/// `r` is bumped to the next prime if it isn't one already; the effective
/// modulus is observable via [`EncryptionKey::r`]. The primes are chosen so
/// that $r \mid \phi(N)$ and $r^2 \nmid \phi(N)$: $\gcd(p_1 - 1, r) = 1$,
/// while $p_2 \equiv 1 \pmod r$ comes from the
/// [constrained generator](crate::primes::generate_prime_with_congruence)
/// with $\gcd((p_2 - 1)/r, r) = 1$.
pub fn generate_keys(
    r: u64,
    security_bits: usize,
    rng: &mut impl CryptoRngCore,
) -> Result<(EncryptionKey, DecryptionKey)> {
    if !(2..=LargePrimeSizedNumber::BITS).contains(&security_bits) {
        return Err(Error::InvalidSecurityParameter(security_bits));
    }
    // An even or unit modulus can never satisfy `gcd(p1 - 1, r) = 1` for an
    // odd prime `p1`, and the constrained generator needs room for `p > r`.
    if r < 3 {
        return Err(Error::InvalidPlaintextModulus(r));
    }
    if security_bits < 64 && r >> security_bits != 0 {
        return Err(Error::InvalidPlaintextModulus(r));
    }

    let r = next_prime(r, rng);
    let r_big = LargeBiPrimeSizedNumber::from(r);
    let r_nonzero_wide = NonZero::new(r_big).unwrap();
    let r_nonzero = NonZero::new(LargePrimeSizedNumber::from(r)).unwrap();

    // $p_1$ with $\gcd(p_1 - 1, r) = 1$.
    let p1_minus_one = loop {
        let p1: LargePrimeSizedNumber =
            crypto_primes::generate_prime_with_rng(rng, Some(security_bits));
        let p1_minus_one = p1.wrapping_sub(&LargePrimeSizedNumber::ONE);
        if lowest_u64(&(p1_minus_one % r_nonzero)).gcd(r) == 1 {
            break p1_minus_one;
        }
    };

    // $p_2 \equiv 1 \pmod r$ with $\gcd((p_2 - 1)/r, r) = 1$, so that
    // $p_2 - 1 = r q$ with $\gcd(q, r) = 1$ and `r` divides $\phi(N)$
    // exactly once.
    let p2_minus_one = loop {
        let p2 = primes::generate_prime_with_congruence(rng, security_bits, r)?;
        let p2_minus_one = p2.wrapping_sub(&LargePrimeSizedNumber::ONE);
        let quotient = p2_minus_one / r_nonzero;
        if lowest_u64(&(quotient % r_nonzero)).gcd(r) == 1 {
            break p2_minus_one;
        }
    };

    let p1: LargePrimeSizedNumber = p1_minus_one.wrapping_add(&LargePrimeSizedNumber::ONE);
    let p2: LargePrimeSizedNumber = p2_minus_one.wrapping_add(&LargePrimeSizedNumber::ONE);
    let n: LargeBiPrimeSizedNumber = p1
        .resize::<{ LargeBiPrimeSizedNumber::LIMBS }>()
        .wrapping_mul(&p2.resize::<{ LargeBiPrimeSizedNumber::LIMBS }>());
    let n_params = DynResidueParams::new(&n);

    let phi: LargeBiPrimeSizedNumber =
        p1_minus_one
            .resize::<{ LargeBiPrimeSizedNumber::LIMBS }>()
            .wrapping_mul(&p2_minus_one.resize::<{ LargeBiPrimeSizedNumber::LIMBS }>());
    let phi_over_r = phi / r_nonzero_wide;

    // $y$ must generate an element of order exactly `r` in the quotient:
    // $x = y^{\phi/r} \ne 1$, and $x^r = y^\phi = 1$ forces the order to be
    // `r` since `r` is prime.
    let (y, x) = loop {
        let candidate =
            LargeBiPrimeSizedNumber::random_mod(rng, &NonZero::new(n).unwrap());
        if candidate == LargeBiPrimeSizedNumber::ZERO {
            continue;
        }
        let y = DynResidue::new(&candidate, n_params);
        let x = y.pow(&phi_over_r);
        if x.as_natural_number() != LargeBiPrimeSizedNumber::ONE {
            break (y, x);
        }
    };
    // A non-invertible `y` would reveal a factor of `n`; sampling one is
    // beyond negligible.
    let y_inv = y.invert().0;

    let sqrt_r = ceil_sqrt(r);
    let table_length = sqrt_r as usize;

    // Baby steps: $x^{-i} \bmod N$ for $i \in [0, \lceil\sqrt r\rceil)$.
    // Both tables store natural numbers: a `DynResidue` carries a copy of
    // its ring parameters, which would multiply the footprint of
    // $O(\sqrt{r})$-sized tables.
    let x_inv = x.invert().0;
    let mut x_inv_powers = Vec::with_capacity(table_length);
    let mut baby_step = DynResidue::one(n_params);
    x_inv_powers.push(baby_step.as_natural_number());
    for _ in 1..table_length {
        baby_step = baby_step * x_inv;
        x_inv_powers.push(baby_step.as_natural_number());
    }

    // Giant steps: $(i \cdot \lceil\sqrt r\rceil, x^{i \lceil\sqrt r\rceil})$,
    // sorted by residue for binary search.
    let x_sqrt = x.pow_bounded_exp(&LargeBiPrimeSizedNumber::from(sqrt_r), 64);
    let mut x_sqrt_powers = Vec::with_capacity(table_length);
    let mut giant_step = DynResidue::one(n_params);
    x_sqrt_powers.push(RootPower {
        power: 0,
        residue: LargeBiPrimeSizedNumber::ONE,
    });
    for i in 1..table_length {
        giant_step = giant_step * x_sqrt;
        x_sqrt_powers.push(RootPower {
            power: i as u64 * sqrt_r,
            residue: giant_step.as_natural_number(),
        });
    }
    x_sqrt_powers.sort_unstable_by(|lhs, rhs| lhs.residue.cmp(&rhs.residue));

    let mut seed = [0u8; 32];
    rng.fill_bytes(&mut seed);

    let encryption_key = EncryptionKey {
        n,
        n_params,
        y,
        y_inv,
        r,
        r_big,
        rng: ChaCha20Rng::from_seed(seed),
    };
    let decryption_key = DecryptionKey {
        n_params,
        r,
        sqrt_r,
        phi,
        phi_over_r,
        x_inv_powers,
        x_sqrt_powers,
    };

    Ok((encryption_key, decryption_key))
}

/// The smallest prime not less than `r`.
///
/// Below $2^{30}$ a deterministic trial-division test is cheap enough;
/// beyond that the probabilistic test takes over.
fn next_prime(mut r: u64, rng: &mut impl CryptoRngCore) -> u64 {
    if r < 1 << 30 {
        while !is_prime_by_trial_division(r) {
            r += 1;
        }
    } else {
        while !crypto_primes::is_prime_with_rng(rng, &U64::from(r)) {
            r += 1;
        }
    }
    r
}

fn is_prime_by_trial_division(r: u64) -> bool {
    if r == 2 || r == 3 || r == 5 {
        return true;
    }
    if r < 2 || r.gcd(30) != 1 {
        return false;
    }

    // Primes above 5 are 1 or 5 mod 6, so only those residues need trial
    // divisors.
    let mut divisor = 7u64;
    while divisor * divisor <= r {
        if r % divisor == 0 || r % (divisor + 4) == 0 {
            return false;
        }
        divisor += 6;
    }
    true
}

/// A Benaloh public encryption key, holding the bi-prime modulus `n`, the
/// plaintext modulus `r`, the generator `y` with its inverse, and the PRNG
/// that drives randomness sampling.
#[derive(Debug)]
pub struct EncryptionKey {
    n: LargeBiPrimeSizedNumber,
    n_params: DynResidueParams<{ LargeBiPrimeSizedNumber::LIMBS }>,
    y: BiPrimeRingElement,
    y_inv: BiPrimeRingElement,
    r: u64,
    r_big: LargeBiPrimeSizedNumber,
    rng: ChaCha20Rng,
}

impl EncryptionKey {
    /// The effective plaintext modulus, after any bump to the next prime.
    pub fn r(&self) -> u64 {
        self.r
    }

    /// The ciphertext modulus $N$.
    pub fn modulus(&self) -> LargeBiPrimeSizedNumber {
        self.n
    }

    /// Encrypt `plaintext` using `randomness`: $ c = y^m * u^r mod N $.
    ///
    /// This is the deterministic variant of the Benaloh encryption scheme,
    /// as it takes the randomness as an input.
    pub fn encrypt_with_randomness(
        &self,
        plaintext: &LargeBiPrimeSizedNumber,
        randomness: &LargeBiPrimeSizedNumber,
    ) -> Ciphertext {
        let ym = self.y.pow(plaintext);

        self.ciphertext_from(ym, randomness)
    }

    fn ciphertext_from(
        &self,
        ym: BiPrimeRingElement,
        randomness: &LargeBiPrimeSizedNumber,
    ) -> Ciphertext {
        let ur = DynResidue::new(randomness, self.n_params)
            .pow_bounded_exp(&self.r_big, 64);

        Ciphertext((ym * ur).as_natural_number().resize())
    }

    fn sample_randomness(&mut self) -> LargeBiPrimeSizedNumber {
        LargeBiPrimeSizedNumber::random_mod(&mut self.rng, &NonZero::new(self.n).unwrap())
    }

    fn ring_element(&self, ciphertext: &Ciphertext) -> BiPrimeRingElement {
        let value: LargeBiPrimeSizedNumber = ciphertext.0.resize();
        DynResidue::new(&value, self.n_params)
    }
}

impl PublicKey for EncryptionKey {
    fn encrypt_u64(&mut self, message: u64) -> Ciphertext {
        let randomness = self.sample_randomness();
        let ym = self
            .y
            .pow_bounded_exp(&LargeBiPrimeSizedNumber::from(message), 64);

        self.ciphertext_from(ym, &randomness)
    }

    fn encrypt_i64(&mut self, message: i64) -> Ciphertext {
        let randomness = self.sample_randomness();
        // Negative plaintexts are encrypted as $y^{-|m|}$, landing on
        // $r - (|m| \bmod r)$ under decryption.
        let base = if message < 0 { self.y_inv } else { self.y };
        let ym = base.pow_bounded_exp(
            &LargeBiPrimeSizedNumber::from(message.unsigned_abs()),
            64,
        );

        self.ciphertext_from(ym, &randomness)
    }

    fn encrypt(&mut self, message: &LargeBiPrimeSizedNumber) -> Ciphertext {
        let randomness = self.sample_randomness();

        self.encrypt_with_randomness(message, &randomness)
    }

    /// $ Add(a, b) = a * b mod N $
    fn add(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> Ciphertext {
        Ciphertext(
            (self.ring_element(lhs) * self.ring_element(rhs))
                .as_natural_number()
                .resize(),
        )
    }

    fn mul_u64(&self, ciphertext: &Ciphertext, scalar: u64) -> Ciphertext {
        Ciphertext(
            self.ring_element(ciphertext)
                .pow_bounded_exp(&LargeBiPrimeSizedNumber::from(scalar), 64)
                .as_natural_number()
                .resize(),
        )
    }

    fn mul_i64(&self, ciphertext: &Ciphertext, scalar: i64) -> Ciphertext {
        let base = if scalar < 0 {
            // Well-formed ciphertexts are units mod $N$, so inversion cannot
            // fail.
            self.ring_element(ciphertext).invert().0
        } else {
            self.ring_element(ciphertext)
        };

        Ciphertext(
            base.pow_bounded_exp(&LargeBiPrimeSizedNumber::from(scalar.unsigned_abs()), 64)
                .as_natural_number()
                .resize(),
        )
    }

    fn mul(&self, ciphertext: &Ciphertext, scalar: &LargeBiPrimeSizedNumber) -> Ciphertext {
        Ciphertext(
            self.ring_element(ciphertext)
                .pow(scalar)
                .as_natural_number()
                .resize(),
        )
    }

    /// In the Benaloh cryptosystem the plaintexts live modulo `r`.
    fn plaintext_modulus(&self) -> LargeBiPrimeSizedNumber {
        self.r_big
    }

    fn deep_copy(&mut self) -> Self {
        let mut seed = [0u8; 32];
        self.rng.fill_bytes(&mut seed);

        EncryptionKey {
            n: self.n,
            n_params: self.n_params,
            y: self.y,
            y_inv: self.y_inv,
            r: self.r,
            r_big: self.r_big,
            rng: ChaCha20Rng::from_seed(seed),
        }
    }
}

/// A Benaloh secret decryption key, holding $\phi$, $\phi/r$ and the two
/// precomputed discrete-logarithm lookup tables.
#[derive(Clone, Debug)]
pub struct DecryptionKey {
    n_params: DynResidueParams<{ LargeBiPrimeSizedNumber::LIMBS }>,
    r: u64,
    #[allow(dead_code)]
    sqrt_r: u64,
    #[allow(dead_code)]
    phi: LargeBiPrimeSizedNumber,
    phi_over_r: LargeBiPrimeSizedNumber,
    x_inv_powers: Vec<LargeBiPrimeSizedNumber>,
    x_sqrt_powers: Vec<RootPower>,
}

impl DecryptionKey {
    /// Whether `ciphertext` encrypts zero, without the discrete-log search.
    ///
    /// Preferable to a full [`decrypt`](SecretKey::decrypt) whenever only
    /// the zero test is needed and `r` is large.
    pub fn is_zero(&self, ciphertext: &Ciphertext) -> bool {
        self.root_of_unity(ciphertext).as_natural_number() == LargeBiPrimeSizedNumber::ONE
    }

    /// $ c^{\phi/r} \bmod N $, which equals $x^m$ for plaintext `m`.
    fn root_of_unity(&self, ciphertext: &Ciphertext) -> BiPrimeRingElement {
        let value: LargeBiPrimeSizedNumber = ciphertext.0.resize();
        DynResidue::new(&value, self.n_params).pow(&self.phi_over_r)
    }
}

impl SecretKey for DecryptionKey {
    /// Recovers `m` from $x^m = c^{\phi/r}$ by baby-step/giant-step:
    /// for each baby step `k`, $x^{m-k}$ is looked up among the sorted
    /// giant-step residues; a hit at exponent $j \lceil\sqrt r\rceil$ yields
    /// $m = j \lceil\sqrt r\rceil + k \bmod r$.
    fn decrypt(&self, ciphertext: &Ciphertext) -> Result<LargeBiPrimeSizedNumber> {
        let a = self.root_of_unity(ciphertext);

        for (baby_step, x_inv_power) in self.x_inv_powers.iter().enumerate() {
            let target = (a * DynResidue::new(x_inv_power, self.n_params)).as_natural_number();
            if let Ok(found) = self
                .x_sqrt_powers
                .binary_search_by(|entry| entry.residue.cmp(&target))
            {
                let giant_step = self.x_sqrt_powers[found].power;
                // The sum can exceed `r` (and for `r` close to `2^64`, wrap
                // a `u64`), so reduce in 128 bits.
                let message = ((giant_step as u128 + baby_step as u128)
                    % u128::from(self.r)) as u64;

                return Ok(LargeBiPrimeSizedNumber::from(message));
            }
        }

        // No baby step matched: `ciphertext` is not an encryption of any
        // plaintext under this key.
        Err(Error::MalformedCiphertext)
    }

    fn deep_copy(&self) -> Self {
        self.clone()
    }
}
