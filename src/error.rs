// SPDX-License-Identifier: BSD-3-Clause-Clear

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("invalid security parameter: {0} bits per prime")]
    InvalidSecurityParameter(usize),
    #[error("invalid plaintext modulus: {0}")]
    InvalidPlaintextModulus(u64),
    #[error("the ciphertext could not be decrypted under this key")]
    MalformedCiphertext,
}

pub type Result<T> = std::result::Result<T, Error>;
