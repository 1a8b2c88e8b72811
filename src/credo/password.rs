//! Password hashing for the credential store.
//!
//! Each account gets a fresh 16-byte salt from the OS CSPRNG and a 64-byte
//! scrypt-derived hash. Verification re-derives the hash under the stored salt
//! and compares in constant time; buffers of unequal length are rejected
//! before the timed comparison runs.

use anyhow::{anyhow, Result};
use rand::{rngs::OsRng, RngCore};
use scrypt::Params;
use subtle::ConstantTimeEq;

pub const SALT_LEN: usize = 16;
pub const HASH_LEN: usize = 64;

// Matches the interactive-login cost the store was provisioned with:
// N=2^14, r=8, p=1.
const SCRYPT_LOG_N: u8 = 14;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;

/// Generate a fresh per-account salt.
#[must_use]
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive the 64-byte scrypt hash of `password` under `salt`.
/// # Errors
/// Returns an error if the scrypt parameters are rejected.
pub fn derive(password: &str, salt: &[u8]) -> Result<[u8; HASH_LEN]> {
    let params = Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, HASH_LEN)
        .map_err(|_| anyhow!("invalid scrypt parameters"))?;

    let mut hash = [0u8; HASH_LEN];
    scrypt::scrypt(password.as_bytes(), salt, &params, &mut hash)
        .map_err(|_| anyhow!("invalid scrypt output length"))?;

    Ok(hash)
}

/// Check `password` against a stored hash in constant time.
/// # Errors
/// Returns an error if the hash derivation fails.
pub fn verify(password: &str, salt: &[u8], stored_hash: &[u8]) -> Result<bool> {
    let derived = derive(password, salt)?;

    // Length mismatch is an immediate reject, no timed comparison needed
    if stored_hash.len() != HASH_LEN {
        return Ok(false);
    }

    Ok(derived.ct_eq(stored_hash).into())
}
