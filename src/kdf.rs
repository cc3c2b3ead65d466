//! Key and IV derivation.
//!
//! The whole cipher state is recoverable from the password alone: the key is
//! an iterated SHA-256 of the password, the initial IV is an iterated SHA-256
//! of the key, and each batch steps the IV with two more rounds. Artifacts
//! therefore carry no key or IV material at all. This is an iterated hash,
//! not a memory-hard KDF; the trade-off is documented in the README.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

use crate::types::EncDirError;

/// Apply `rounds` iterations of `s <- hex(sha256(s))`.
///
/// The first round hashes the raw input bytes; every later round hashes the
/// lowercase-hex ASCII of the previous digest. Fails when `rounds < 1`.
pub fn sha256_hex_iter(input: &[u8], rounds: u32) -> Result<String, EncDirError> {
    if rounds < 1 {
        return Err(EncDirError::Config("iteration count must be at least 1"));
    }

    let mut hex_str = hex::encode(Sha256::digest(input));
    for _ in 1..rounds {
        hex_str = hex::encode(Sha256::digest(hex_str.as_bytes()));
    }

    Ok(hex_str)
}

/// Derive the 32-byte AES key from a password.
///
/// The key bytes are the first 32 ASCII characters of the 10-fold iterated
/// SHA-256 hex digest. Fails on an empty password.
pub fn derive_key(password: &SecretString) -> Result<[u8; 32], EncDirError> {
    let secret = password.expose_secret();
    if secret.is_empty() {
        return Err(EncDirError::Config("empty password provided"));
    }

    let digest = sha256_hex_iter(secret.as_bytes(), 10)?;
    let mut key = [0u8; 32];
    key.copy_from_slice(&digest.as_bytes()[..32]);
    Ok(key)
}

/// Derive the initial IV from the key material.
pub fn derive_initial_iv(key: &[u8; 32]) -> Result<[u8; 16], EncDirError> {
    Ok(format_iv(&sha256_hex_iter(key, 10)?))
}

/// Truncate to 16 bytes, right-padding with ASCII `'x'` when shorter.
/// Idempotent on its own output.
pub fn format_iv(s: &str) -> [u8; 16] {
    let mut iv = [b'x'; 16];
    let bytes = s.as_bytes();
    let n = bytes.len().min(16);
    iv[..n].copy_from_slice(&bytes[..n]);
    iv
}

/// Step the IV chain once: two hash rounds over the current 16 IV bytes.
pub fn next_iv(iv: &[u8; 16]) -> Result<[u8; 16], EncDirError> {
    Ok(format_iv(&sha256_hex_iter(iv, 2)?))
}

/// The deterministic IV sequence `IV0, next_iv(IV0), next_iv^2(IV0), ...`.
///
/// The drivers own exactly one chain each and advance it once per batch
/// (encrypt) or once per artifact (decrypt/validate). `skip` fast-forwards
/// past the positions consumed by pre-existing artifacts on a resumed
/// encrypt.
pub(crate) struct IvChain {
    iv: [u8; 16],
}

impl IvChain {
    pub fn new(initial: [u8; 16]) -> Self {
        Self { iv: initial }
    }

    /// Advance one position and return the new IV.
    pub fn advance(&mut self) -> Result<[u8; 16], EncDirError> {
        self.iv = next_iv(&self.iv)?;
        Ok(self.iv)
    }

    /// Advance `n` positions, discarding the intermediate IVs.
    pub fn skip(&mut self, n: usize) -> Result<(), EncDirError> {
        for _ in 0..n {
            self.advance()?;
        }
        Ok(())
    }
}
