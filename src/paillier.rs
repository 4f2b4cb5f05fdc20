// SPDX-License-Identifier: BSD-3-Clause-Clear

//! The Paillier cryptosystem over the ring $\mathbb{Z}_{N^2}$.

use crypto_bigint::modular::runtime_mod::{DynResidue, DynResidueParams};
use crypto_bigint::rand_core::{CryptoRngCore, RngCore, SeedableRng};
use crypto_bigint::{NonZero, RandomMod};
use rand_chacha::ChaCha20Rng;

use crate::{
    arithmetic,
    error::{Error, Result},
    AsNaturalNumber, AsRingElement, BiPrimeRingElement, Ciphertext, LargeBiPrimeSizedNumber,
    LargePrimeSizedNumber, PaillierModulusSizedNumber, PaillierRingElement, PublicKey, SecretKey,
};

/// Generates a Paillier key pair from two independent `security_bits`-bit
/// primes.
///
/// Computes $N = p_1 p_2$, $\phi = (p_1-1)(p_2-1)$,
/// $\lambda = \phi / \gcd(p_1-1, p_2-1)$, $g = N + 1$ and
/// $\mu = L(g^\lambda \bmod N^2)^{-1} \bmod N$ where $L(x) = (x-1)/N$.
pub fn generate_keys(
    security_bits: usize,
    rng: &mut impl CryptoRngCore,
) -> Result<(EncryptionKey, DecryptionKey)> {
    if !(2..=LargePrimeSizedNumber::BITS).contains(&security_bits) {
        return Err(Error::InvalidSecurityParameter(security_bits));
    }

    let p1: LargePrimeSizedNumber = crypto_primes::generate_prime_with_rng(rng, Some(security_bits));
    let p2: LargePrimeSizedNumber = crypto_primes::generate_prime_with_rng(rng, Some(security_bits));
    let p1_minus_one = p1.wrapping_sub(&LargePrimeSizedNumber::ONE);
    let p2_minus_one = p2.wrapping_sub(&LargePrimeSizedNumber::ONE);

    let n: LargeBiPrimeSizedNumber = p1
        .resize::<{ LargeBiPrimeSizedNumber::LIMBS }>()
        .wrapping_mul(&p2.resize::<{ LargeBiPrimeSizedNumber::LIMBS }>());
    let n2: PaillierModulusSizedNumber = n.square();
    let n_params = DynResidueParams::new(&n);
    let n2_params = DynResidueParams::new(&n2);

    let phi: LargeBiPrimeSizedNumber =
        p1_minus_one
            .resize::<{ LargeBiPrimeSizedNumber::LIMBS }>()
            .wrapping_mul(&p2_minus_one.resize::<{ LargeBiPrimeSizedNumber::LIMBS }>());
    let gcd: LargeBiPrimeSizedNumber =
        arithmetic::gcd(p1_minus_one, p2_minus_one).resize();
    let lambda = phi / NonZero::new(gcd).unwrap();

    // $g = N + 1$ is the customary base; its inverse backs negative
    // plaintexts.
    let g_natural: PaillierModulusSizedNumber =
        n.resize().wrapping_add(&PaillierModulusSizedNumber::ONE);
    let g = g_natural.as_ring_element(&n2);
    // $\gcd(g, N^2) = 1$, so inversion cannot fail.
    let g_inv = g.invert().0;

    // $\mu = L(g^\lambda \bmod N^2)^{-1} \bmod N$
    let g_lambda = g.pow_bounded_exp(&lambda, LargeBiPrimeSizedNumber::BITS);
    let l: LargeBiPrimeSizedNumber = (g_lambda
        .as_natural_number()
        .wrapping_sub(&PaillierModulusSizedNumber::ONE)
        / NonZero::new(n.resize::<{ PaillierModulusSizedNumber::LIMBS }>()).unwrap())
    .resize();
    // $L(g^\lambda)$ is invertible mod $N$ by construction of $\lambda$.
    let mu = l.as_ring_element(&n).invert().0;

    let mut seed = [0u8; 32];
    rng.fill_bytes(&mut seed);

    let encryption_key = EncryptionKey {
        n,
        n2,
        n2_params,
        g,
        g_inv,
        rng: ChaCha20Rng::from_seed(seed),
    };
    let decryption_key = DecryptionKey {
        n,
        n_params,
        n2_params,
        phi,
        lambda,
        mu,
    };

    Ok((encryption_key, decryption_key))
}

/// A Paillier public encryption key, holding the bi-prime `n` ($N = PQ$),
/// the Paillier modulus ($N^2$), the base $g = N + 1$ with its inverse, and
/// the PRNG that drives randomness sampling.
#[derive(Debug)]
pub struct EncryptionKey {
    n: LargeBiPrimeSizedNumber,
    n2: PaillierModulusSizedNumber,
    n2_params: DynResidueParams<{ PaillierModulusSizedNumber::LIMBS }>,
    g: PaillierRingElement,
    g_inv: PaillierRingElement,
    rng: ChaCha20Rng,
}

impl EncryptionKey {
    /// Encrypt `plaintext` to `self.n` using `randomness`.
    ///
    /// This is the deterministic variant of the Paillier encryption scheme,
    /// as it takes the randomness as an input.
    pub fn encrypt_with_randomness(
        &self,
        plaintext: &LargeBiPrimeSizedNumber,
        randomness: &LargeBiPrimeSizedNumber,
    ) -> Ciphertext {
        let gm = self
            .g
            .pow_bounded_exp(plaintext, LargeBiPrimeSizedNumber::BITS);

        // $ c = (g^m) * (u^N) mod N^2 $
        Ciphertext((gm * self.randomizer_from(randomness)).as_natural_number())
    }

    /// $ u^N mod N^2 $ for a given `u`.
    fn randomizer_from(&self, u: &LargeBiPrimeSizedNumber) -> PaillierRingElement {
        DynResidue::new(&u.resize(), self.n2_params)
            .pow_bounded_exp(&self.n, LargeBiPrimeSizedNumber::BITS)
    }

    /// A fresh $ u^N mod N^2 $ with `u` sampled uniformly below `n`.
    fn sample_randomizer(&mut self) -> PaillierRingElement {
        let u = LargeBiPrimeSizedNumber::random_mod(&mut self.rng, &NonZero::new(self.n).unwrap());

        self.randomizer_from(&u)
    }

    /// Encrypts a vector of `u64` messages reusing a single randomizer.
    ///
    /// One $\rho = u^N$ is sampled and every message is encrypted as
    /// $g^{m_i} \cdot \rho^{s_i}$ for a fresh 64-bit exponent $s_i$. This
    /// downgrades the indistinguishability of the whole vector to that of a
    /// single element: recovering one $m_i$ lets an attacker recover every
    /// other entry in about $c \cdot 2^{64}$ tries. Use only where that
    /// trade-off is acceptable.
    pub fn encrypt_vector_u64_fast(&mut self, messages: &[u64]) -> Vec<Ciphertext> {
        let rho = self.sample_randomizer();

        let mut ciphertexts = Vec::with_capacity(messages.len());
        for message in messages {
            let exponent = self.rng.next_u64();
            let gm = self
                .g
                .pow_bounded_exp(&PaillierModulusSizedNumber::from(*message), 64);
            let rerandomized =
                rho.pow_bounded_exp(&PaillierModulusSizedNumber::from(exponent), 64);

            ciphertexts.push(Ciphertext((gm * rerandomized).as_natural_number()));
        }
        ciphertexts
    }

    /// The ciphertext modulus $N^2$.
    pub fn ciphertext_modulus(&self) -> PaillierModulusSizedNumber {
        self.n2
    }

    fn ring_element(&self, ciphertext: &Ciphertext) -> PaillierRingElement {
        DynResidue::new(&ciphertext.0, self.n2_params)
    }
}

impl PublicKey for EncryptionKey {
    fn encrypt_u64(&mut self, message: u64) -> Ciphertext {
        let rho = self.sample_randomizer();
        let gm = self
            .g
            .pow_bounded_exp(&PaillierModulusSizedNumber::from(message), 64);

        Ciphertext((gm * rho).as_natural_number())
    }

    fn encrypt_i64(&mut self, message: i64) -> Ciphertext {
        let rho = self.sample_randomizer();
        // Negative plaintexts are encrypted as $g^{-|m|}$, landing on
        // $N - |m|$ under decryption.
        let base = if message < 0 { self.g_inv } else { self.g };
        let gm = base.pow_bounded_exp(
            &PaillierModulusSizedNumber::from(message.unsigned_abs()),
            64,
        );

        Ciphertext((gm * rho).as_natural_number())
    }

    fn encrypt(&mut self, message: &LargeBiPrimeSizedNumber) -> Ciphertext {
        let u = LargeBiPrimeSizedNumber::random_mod(&mut self.rng, &NonZero::new(self.n).unwrap());

        self.encrypt_with_randomness(message, &u)
    }

    /// $ Add(a, b) = a * b mod N^2 $
    fn add(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> Ciphertext {
        Ciphertext((self.ring_element(lhs) * self.ring_element(rhs)).as_natural_number())
    }

    fn mul_u64(&self, ciphertext: &Ciphertext, scalar: u64) -> Ciphertext {
        Ciphertext(
            self.ring_element(ciphertext)
                .pow_bounded_exp(&PaillierModulusSizedNumber::from(scalar), 64)
                .as_natural_number(),
        )
    }

    fn mul_i64(&self, ciphertext: &Ciphertext, scalar: i64) -> Ciphertext {
        let base = if scalar < 0 {
            // Well-formed ciphertexts are units mod $N^2$, so inversion
            // cannot fail.
            self.ring_element(ciphertext).invert().0
        } else {
            self.ring_element(ciphertext)
        };

        Ciphertext(
            base.pow_bounded_exp(&PaillierModulusSizedNumber::from(scalar.unsigned_abs()), 64)
                .as_natural_number(),
        )
    }

    fn mul(&self, ciphertext: &Ciphertext, scalar: &LargeBiPrimeSizedNumber) -> Ciphertext {
        Ciphertext(
            self.ring_element(ciphertext)
                .pow_bounded_exp(scalar, LargeBiPrimeSizedNumber::BITS)
                .as_natural_number(),
        )
    }

    fn plaintext_modulus(&self) -> LargeBiPrimeSizedNumber {
        self.n
    }

    fn deep_copy(&mut self) -> Self {
        let mut seed = [0u8; 32];
        self.rng.fill_bytes(&mut seed);

        EncryptionKey {
            n: self.n,
            n2: self.n2,
            n2_params: self.n2_params,
            g: self.g,
            g_inv: self.g_inv,
            rng: ChaCha20Rng::from_seed(seed),
        }
    }
}

/// A Paillier secret decryption key, holding $N$, $\phi$,
/// $\lambda = \phi/\gcd(p_1-1, p_2-1)$ and $\mu$.
#[derive(Clone, Debug)]
pub struct DecryptionKey {
    n: LargeBiPrimeSizedNumber,
    n_params: DynResidueParams<{ LargeBiPrimeSizedNumber::LIMBS }>,
    n2_params: DynResidueParams<{ PaillierModulusSizedNumber::LIMBS }>,
    #[allow(dead_code)]
    phi: LargeBiPrimeSizedNumber,
    lambda: LargeBiPrimeSizedNumber,
    mu: BiPrimeRingElement,
}

impl SecretKey for DecryptionKey {
    /// $ D(c) = L(c^\lambda \bmod N^2) \cdot \mu \bmod N $
    fn decrypt(&self, ciphertext: &Ciphertext) -> Result<LargeBiPrimeSizedNumber> {
        let c_lambda = DynResidue::new(&ciphertext.0, self.n2_params)
            .pow_bounded_exp(&self.lambda, LargeBiPrimeSizedNumber::BITS);
        let l: LargeBiPrimeSizedNumber = (c_lambda
            .as_natural_number()
            .wrapping_sub(&PaillierModulusSizedNumber::ONE)
            / NonZero::new(self.n.resize::<{ PaillierModulusSizedNumber::LIMBS }>()).unwrap())
        .resize();

        Ok((DynResidue::new(&l, self.n_params) * self.mu).as_natural_number())
    }

    fn deep_copy(&self) -> Self {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use rand_core::OsRng;
    use rstest::rstest;

    use super::*;

    const SECURITY_BITS: usize = 512;

    #[test]
    fn rejects_invalid_security_parameters() {
        assert!(matches!(
            generate_keys(1, &mut OsRng),
            Err(Error::InvalidSecurityParameter(1))
        ));
        assert!(matches!(
            generate_keys(LargePrimeSizedNumber::BITS + 1, &mut OsRng),
            Err(Error::InvalidSecurityParameter(_))
        ));
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(42)]
    #[case(u64::MAX)]
    fn encrypt_decrypts(#[case] message: u64) {
        let (mut public_key, secret_key) = generate_keys(SECURITY_BITS, &mut OsRng).unwrap();

        assert_eq!(
            secret_key.decrypt(&public_key.encrypt_u64(message)).unwrap(),
            LargeBiPrimeSizedNumber::from(message)
        );
    }

    #[test]
    fn encrypts_deterministically_with_fixed_randomness() {
        let (mut public_key, secret_key) = generate_keys(SECURITY_BITS, &mut OsRng).unwrap();

        let plaintext = LargeBiPrimeSizedNumber::from(123_456_789u64);
        let randomness =
            LargeBiPrimeSizedNumber::random_mod(&mut OsRng, &NonZero::new(public_key.n).unwrap());

        let first = public_key.encrypt_with_randomness(&plaintext, &randomness);
        let second = public_key.encrypt_with_randomness(&plaintext, &randomness);
        assert_eq!(first, second);
        assert_eq!(secret_key.decrypt(&first).unwrap(), plaintext);

        // A probabilistic encryption of the same plaintext differs.
        assert_ne!(public_key.encrypt(&plaintext), first);
    }

    #[test]
    fn adds_homomorphically() {
        let (mut public_key, secret_key) = generate_keys(SECURITY_BITS, &mut OsRng).unwrap();

        let lhs = public_key.encrypt_u64(u64::MAX);
        let rhs = public_key.encrypt_u64(3);
        let expected = LargeBiPrimeSizedNumber::from(u64::MAX)
            .wrapping_add(&LargeBiPrimeSizedNumber::from(3u64));

        assert_eq!(
            secret_key.decrypt(&public_key.add(&lhs, &rhs)).unwrap(),
            expected
        );
    }

    #[rstest]
    #[case(7, 6, 42)]
    #[case(1 << 40, 1 << 20, 1 << 60)]
    fn multiplies_by_scalars(#[case] message: u64, #[case] scalar: u64, #[case] expected: u64) {
        let (mut public_key, secret_key) = generate_keys(SECURITY_BITS, &mut OsRng).unwrap();

        let ciphertext = public_key.encrypt_u64(message);
        assert_eq!(
            secret_key
                .decrypt(&public_key.mul_u64(&ciphertext, scalar))
                .unwrap(),
            LargeBiPrimeSizedNumber::from(expected)
        );
        assert_eq!(
            secret_key
                .decrypt(&public_key.mul(&ciphertext, &LargeBiPrimeSizedNumber::from(scalar)))
                .unwrap(),
            LargeBiPrimeSizedNumber::from(expected)
        );
    }

    #[test]
    fn negative_scalars_invert_the_ciphertext() {
        let (mut public_key, secret_key) = generate_keys(SECURITY_BITS, &mut OsRng).unwrap();

        let ciphertext = public_key.encrypt_u64(5);
        let product = public_key.mul_i64(&ciphertext, -3);

        // $5 \cdot (-3) \equiv N - 15 \pmod N$
        assert_eq!(
            secret_key.decrypt(&product).unwrap(),
            public_key
                .plaintext_modulus()
                .wrapping_sub(&LargeBiPrimeSizedNumber::from(15u64))
        );
    }

    #[test]
    fn fast_vector_encryption_decrypts() {
        let (mut public_key, secret_key) = generate_keys(SECURITY_BITS, &mut OsRng).unwrap();

        let messages: Vec<u64> = (0..16).map(|i| i * i + 1).collect();
        let ciphertexts = public_key.encrypt_vector_u64_fast(&messages);

        for (message, ciphertext) in messages.iter().zip(ciphertexts) {
            assert_eq!(
                secret_key.decrypt(&ciphertext).unwrap(),
                LargeBiPrimeSizedNumber::from(*message)
            );
        }
    }
}
