// SPDX-License-Identifier: BSD-3-Clause-Clear

//! Bulk encryption and decryption over plaintext and ciphertext vectors,
//! generic over both cryptosystems.
//!
//! The `*_parallel` variants partition the input into contiguous blocks of
//! $\lceil N/W \rceil$ elements for `max_workers` workers and hand every
//! block a freshly copied key: the PRNG inside a public key is stateful, so
//! workers must never share one key instance. Output position `i` always
//! corresponds to input position `i`, and the call returns only once every
//! block has completed.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{Ciphertext, LargeBiPrimeSizedNumber, PublicKey, Result, SecretKey};

/// Encrypts `messages` one by one with `public_key`.
pub fn encrypt_vector_u64<K: PublicKey>(
    public_key: &mut K,
    messages: &[u64],
) -> Vec<Ciphertext> {
    messages
        .iter()
        .map(|message| public_key.encrypt_u64(*message))
        .collect()
}

/// Encrypts `messages` in contiguous blocks across at most `max_workers`
/// workers, each holding its own copy of `public_key`.
pub fn encrypt_vector_u64_parallel<K: PublicKey>(
    public_key: &mut K,
    messages: &[u64],
    max_workers: usize,
) -> Vec<Ciphertext> {
    if messages.is_empty() {
        return vec![];
    }

    let block_size = messages.len().div_ceil(max_workers.max(1));
    let blocks: Vec<(&[u64], K)> = messages
        .chunks(block_size)
        .map(|block| (block, public_key.deep_copy()))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let iter = blocks.into_iter();
    #[cfg(feature = "parallel")]
    let iter = blocks.into_par_iter();

    let encrypted: Vec<Vec<Ciphertext>> = iter
        .map(|(block, mut key)| {
            block
                .iter()
                .map(|message| key.encrypt_u64(*message))
                .collect()
        })
        .collect();

    encrypted.into_iter().flatten().collect()
}

/// Decrypts `ciphertexts` one by one with `secret_key`.
pub fn decrypt_vector<K: SecretKey>(
    secret_key: &K,
    ciphertexts: &[Ciphertext],
) -> Result<Vec<LargeBiPrimeSizedNumber>> {
    ciphertexts
        .iter()
        .map(|ciphertext| secret_key.decrypt(ciphertext))
        .collect()
}

/// Decrypts `ciphertexts` in contiguous blocks across at most `max_workers`
/// workers, each holding its own copy of `secret_key`.
pub fn decrypt_vector_parallel<K: SecretKey>(
    secret_key: &K,
    ciphertexts: &[Ciphertext],
    max_workers: usize,
) -> Result<Vec<LargeBiPrimeSizedNumber>> {
    if ciphertexts.is_empty() {
        return Ok(vec![]);
    }

    let block_size = ciphertexts.len().div_ceil(max_workers.max(1));
    let blocks: Vec<(&[Ciphertext], K)> = ciphertexts
        .chunks(block_size)
        .map(|block| (block, secret_key.deep_copy()))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let iter = blocks.into_iter();
    #[cfg(feature = "parallel")]
    let iter = blocks.into_par_iter();

    let decrypted: Vec<Vec<LargeBiPrimeSizedNumber>> = iter
        .map(|(block, key)| {
            block
                .iter()
                .map(|ciphertext| key.decrypt(ciphertext))
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(decrypted.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use rand_chacha::ChaCha20Rng;
    use rand_core::{OsRng, RngCore, SeedableRng};

    use super::*;
    use crate::{benaloh, paillier};

    const SECURITY_BITS: usize = 512;

    fn assert_vector_roundtrip(
        public_key: &mut impl PublicKey,
        secret_key: &impl SecretKey,
        lhs: &[u64],
        rhs: &[u64],
    ) {
        let max_workers = std::thread::available_parallelism()
            .map(usize::from)
            .unwrap_or(4);

        let encrypted_lhs = encrypt_vector_u64_parallel(public_key, lhs, max_workers);
        let encrypted_rhs = encrypt_vector_u64_parallel(public_key, rhs, max_workers);
        let encrypted_sums: Vec<Ciphertext> = encrypted_lhs
            .iter()
            .zip(encrypted_rhs.iter())
            .map(|(a, b)| public_key.add(a, b))
            .collect();

        let sums = decrypt_vector_parallel(secret_key, &encrypted_sums, max_workers).unwrap();
        for ((a, b), sum) in lhs.iter().zip(rhs.iter()).zip(sums) {
            assert_eq!(sum, LargeBiPrimeSizedNumber::from(a + b));
        }
    }

    #[test]
    fn paillier_vectors_roundtrip() {
        const N: usize = 256;

        let mut rng = ChaCha20Rng::from_seed([7u8; 32]);
        let (mut public_key, secret_key) =
            paillier::generate_keys(SECURITY_BITS, &mut OsRng).unwrap();

        let lhs: Vec<u64> = (0..N).map(|_| rng.next_u64() >> 2).collect();
        let rhs: Vec<u64> = (0..N).map(|_| rng.next_u64() >> 2).collect();

        assert_vector_roundtrip(&mut public_key, &secret_key, &lhs, &rhs);
    }

    #[test]
    fn benaloh_vectors_roundtrip() {
        const N: usize = 64;

        let mut rng = ChaCha20Rng::from_seed([7u8; 32]);
        let (mut public_key, secret_key) =
            benaloh::generate_keys(1 << 20, SECURITY_BITS, &mut OsRng).unwrap();

        // Operand sums must stay below the plaintext modulus, which is the
        // first prime at or above 2^20.
        let lhs: Vec<u64> = (0..N).map(|_| rng.next_u64() >> 45).collect();
        let rhs: Vec<u64> = (0..N).map(|_| rng.next_u64() >> 45).collect();

        assert_vector_roundtrip(&mut public_key, &secret_key, &lhs, &rhs);
    }

    #[test]
    fn parallel_and_sequential_decryption_agree() {
        let (mut public_key, secret_key) =
            paillier::generate_keys(SECURITY_BITS, &mut OsRng).unwrap();

        let messages: Vec<u64> = (0..37).collect();
        let ciphertexts = encrypt_vector_u64(&mut public_key, &messages);
        let sequential = decrypt_vector(&secret_key, &ciphertexts).unwrap();

        for max_workers in [1, 2, 3, 8, 64] {
            assert_eq!(
                decrypt_vector_parallel(&secret_key, &ciphertexts, max_workers).unwrap(),
                sequential
            );
        }
    }

    #[test]
    fn empty_vectors_are_preserved() {
        let (mut public_key, secret_key) =
            paillier::generate_keys(SECURITY_BITS, &mut OsRng).unwrap();

        assert!(encrypt_vector_u64_parallel(&mut public_key, &[], 8).is_empty());
        assert!(decrypt_vector_parallel(&secret_key, &[], 8)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn parallel_encryption_preserves_order() {
        let (mut public_key, secret_key) =
            paillier::generate_keys(SECURITY_BITS, &mut OsRng).unwrap();

        let messages: Vec<u64> = (0..100).collect();
        let ciphertexts = encrypt_vector_u64_parallel(&mut public_key, &messages, 7);

        assert_eq!(ciphertexts.len(), messages.len());
        for (message, ciphertext) in messages.iter().zip(ciphertexts.iter()) {
            assert_eq!(
                secret_key.decrypt(ciphertext).unwrap(),
                LargeBiPrimeSizedNumber::from(*message)
            );
        }
    }
}
