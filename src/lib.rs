// SPDX-License-Identifier: BSD-3-Clause-Clear

//! Two partially homomorphic public-key cryptosystems — [Paillier](paillier)
//! and [Benaloh](benaloh) — behind one ciphertext algebra.
//!
//! Both schemes are additively homomorphic: multiplying two ciphertexts
//! modulo the public modulus yields a ciphertext of the sum of the
//! plaintexts, and raising a ciphertext to a plaintext exponent yields a
//! ciphertext of the product. The [`PublicKey`]/[`SecretKey`] contracts let
//! callers drive either scheme generically, including the bulk vector
//! operations re-exported at the crate root.

use crypto_bigint::modular::runtime_mod::{DynResidue, DynResidueParams};
use crypto_bigint::{Concat, Uint, U2048};

mod arithmetic;
pub mod benaloh;
mod ciphertext;
mod error;
pub mod paillier;
pub mod primes;
mod vector;

pub use ciphertext::Ciphertext;
pub use error::{Error, Result};
pub use vector::{
    decrypt_vector, decrypt_vector_parallel, encrypt_vector_u64, encrypt_vector_u64_parallel,
};

/* Types & Trait (impls) around `crypto_bigint` for internal use */

pub type LargePrimeSizedNumber = U2048;
pub type LargeBiPrimeSizedNumber = <LargePrimeSizedNumber as Concat>::Output;
pub type PaillierModulusSizedNumber = <LargeBiPrimeSizedNumber as Concat>::Output;
pub(crate) type BiPrimeRingElement = DynResidue<{ LargeBiPrimeSizedNumber::LIMBS }>;
pub(crate) type PaillierRingElement = DynResidue<{ PaillierModulusSizedNumber::LIMBS }>;

pub(crate) trait AsNaturalNumber<const LIMBS: usize> {
    fn as_natural_number(&self) -> Uint<LIMBS>;
}

pub(crate) trait AsRingElement<const LIMBS: usize> {
    fn as_ring_element(&self, n: &Self) -> DynResidue<LIMBS>;
}

impl<const LIMBS: usize> AsNaturalNumber<LIMBS> for DynResidue<LIMBS> {
    fn as_natural_number(&self) -> Uint<LIMBS> {
        self.retrieve()
    }
}

impl<const LIMBS: usize> AsRingElement<LIMBS> for Uint<LIMBS> {
    fn as_ring_element(&self, n: &Self) -> DynResidue<LIMBS> {
        let ring_params = DynResidueParams::new(n);
        DynResidue::new(self, ring_params)
    }
}

/// The public half of a partially homomorphic key pair.
///
/// Encryption takes `&mut self`: every public key owns the PRNG feeding its
/// randomness sampling, and that state must not be shared across threads —
/// [`deep_copy`](PublicKey::deep_copy) hands each worker its own key with an
/// independently seeded PRNG.
pub trait PublicKey: Send {
    /// Encrypts a `u64` plaintext.
    fn encrypt_u64(&mut self, message: u64) -> Ciphertext;

    /// Encrypts an `i64` plaintext, mapped into the plaintext ring by
    /// $m \mapsto m \bmod M$.
    fn encrypt_i64(&mut self, message: i64) -> Ciphertext;

    /// Encrypts an arbitrary-precision nonnegative plaintext.
    fn encrypt(&mut self, message: &LargeBiPrimeSizedNumber) -> Ciphertext;

    /// Adds two ciphertexts: the result decrypts to the sum of the
    /// plaintexts modulo the plaintext modulus.
    fn add(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> Ciphertext;

    /// Multiplies a ciphertext by a `u64` scalar.
    fn mul_u64(&self, ciphertext: &Ciphertext, scalar: u64) -> Ciphertext;

    /// Multiplies a ciphertext by an `i64` scalar; negative scalars invert
    /// the ciphertext before exponentiating by the magnitude.
    fn mul_i64(&self, ciphertext: &Ciphertext, scalar: i64) -> Ciphertext;

    /// Multiplies a ciphertext by an arbitrary-precision nonnegative scalar.
    fn mul(&self, ciphertext: &Ciphertext, scalar: &LargeBiPrimeSizedNumber) -> Ciphertext;

    /// The modulus the plaintexts live in: $N$ for Paillier, $r$ for
    /// Benaloh.
    fn plaintext_modulus(&self) -> LargeBiPrimeSizedNumber;

    /// A deep copy whose PRNG is freshly seeded from this key's stream.
    fn deep_copy(&mut self) -> Self
    where
        Self: Sized;
}

/// The secret half of a partially homomorphic key pair.
pub trait SecretKey: Send {
    /// Decrypts a ciphertext into `[0, M)`.
    fn decrypt(&self, ciphertext: &Ciphertext) -> Result<LargeBiPrimeSizedNumber>;

    /// A deep copy usable independently of (and concurrently with) `self`.
    fn deep_copy(&self) -> Self
    where
        Self: Sized;
}
