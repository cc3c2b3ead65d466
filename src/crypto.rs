//! The block codec: AES-256-CBC with PKCS#7 padding, base64-armored.
//!
//! Ciphertexts are standard-alphabet base64, so the record delimiters `$` and
//! `?` can never occur inside an encrypted blob and the framed stream needs
//! no length prefixes.

use aes::Aes256;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use cbc::cipher::block_padding::{NoPadding, Pkcs7};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use cbc::{Decryptor, Encryptor};

use crate::types::EncDirError;

const BLOCK_SIZE: usize = 16;

/// Encrypt a plaintext block into base64-encoded AES-256-CBC ciphertext.
///
/// Padding is standard PKCS#7 with block size 16: an already aligned
/// plaintext gains a full extra block. Fails on empty plaintext.
pub fn encrypt_block(
    plaintext: &[u8],
    key: &[u8; 32],
    iv: &[u8; 16],
) -> Result<Vec<u8>, EncDirError> {
    if plaintext.is_empty() {
        return Err(EncDirError::Encrypt("empty data payload provided"));
    }

    let cipher =
        Encryptor::<Aes256>::new_from_slices(key, iv).map_err(|_| EncDirError::CryptoInit)?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    Ok(BASE64.encode(ciphertext).into_bytes())
}

/// Decrypt a base64-encoded AES-256-CBC ciphertext produced by
/// [`encrypt_block`].
///
/// Fails when the base64 is invalid, when the decoded ciphertext length is
/// not a multiple of the block size, or when the trailing padding byte is 0
/// or exceeds `len - 1`. The padding check is the codec's only integrity
/// check and doubles as the wrong-password signal.
pub fn decrypt_block(
    encoded: &[u8],
    key: &[u8; 32],
    iv: &[u8; 16],
) -> Result<Vec<u8>, EncDirError> {
    let ciphertext = BASE64
        .decode(encoded)
        .map_err(|_| EncDirError::Decrypt("failed to decode encrypted base64 string"))?;

    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(EncDirError::Decrypt("ciphertext is not block-aligned"));
    }

    let cipher =
        Decryptor::<Aes256>::new_from_slices(key, iv).map_err(|_| EncDirError::CryptoInit)?;
    let mut plaintext = cipher
        .decrypt_padded_vec_mut::<NoPadding>(&ciphertext)
        .map_err(|_| EncDirError::Decrypt("ciphertext is not block-aligned"))?;

    // The original format validates only the final padding byte, not the
    // whole padding run; keep that exact rule.
    let pad = match plaintext.last() {
        Some(&b) => b as usize,
        None => return Err(EncDirError::Decrypt("invalid encryption key")),
    };
    if pad == 0 || pad > plaintext.len() - 1 {
        return Err(EncDirError::Decrypt("invalid encryption key"));
    }
    plaintext.truncate(plaintext.len() - pad);

    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8; 32] = b"0123456789abcdef0123456789abcdef";
    const IV: &[u8; 16] = b"fedcba9876543210";

    #[test]
    fn roundtrip_various_lengths() {
        for len in [1usize, 15, 16, 17, 31, 32, 1000] {
            let plaintext: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let ct = encrypt_block(&plaintext, KEY, IV).unwrap();
            assert_eq!(decrypt_block(&ct, KEY, IV).unwrap(), plaintext, "len={len}");
        }
    }

    #[test]
    fn ciphertext_is_delimiter_free_base64() {
        let ct = encrypt_block(&[0u8; 300], KEY, IV).unwrap();
        assert!(ct.iter().all(|&b| {
            b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'='
        }));
    }

    #[test]
    fn aligned_plaintext_gains_full_padding_block() {
        let ct = encrypt_block(&[7u8; 16], KEY, IV).unwrap();
        assert_eq!(BASE64.decode(&ct).unwrap().len(), 32);
    }

    #[test]
    fn empty_plaintext_is_rejected() {
        assert!(encrypt_block(&[], KEY, IV).is_err());
    }

    #[test]
    fn invalid_base64_is_rejected() {
        assert!(decrypt_block(b"not!!base64??", KEY, IV).is_err());
    }

    #[test]
    fn unaligned_ciphertext_is_rejected() {
        // Valid base64, but decodes to 3 bytes.
        assert!(decrypt_block(b"AAAA", KEY, IV).is_err());
    }

    #[test]
    fn wrong_key_fails_or_garbles() {
        let plaintext = b"some file contents".to_vec();
        let ct = encrypt_block(&plaintext, KEY, IV).unwrap();
        let wrong: [u8; 32] = *b"ffffffffffffffffffffffffffffffff";
        match decrypt_block(&ct, &wrong, IV) {
            Err(_) => {}
            Ok(out) => assert_ne!(out, plaintext),
        }
    }

    #[test]
    fn wrong_iv_garbles_first_block_only() {
        let plaintext: Vec<u8> = (0..40).collect();
        let ct = encrypt_block(&plaintext, KEY, IV).unwrap();
        let other_iv: [u8; 16] = *b"0000000000000000";
        if let Ok(out) = decrypt_block(&ct, KEY, &other_iv) {
            assert_eq!(out.len(), plaintext.len());
            assert_ne!(out[..16], plaintext[..16]);
            assert_eq!(out[16..], plaintext[16..]);
        }
    }
}
