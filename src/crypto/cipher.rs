//! AES-ECB frame decryption
//!
//! Frames are encrypted with AES in ECB mode and PKCS#7 padding. The key
//! length picks the variant: 16 bytes for AES-128, 24 for AES-192, 32 for
//! AES-256.
//!
//! # Security
//!
//! ECB has no IV and encrypts every 16-byte block independently, so equal
//! plaintext blocks give equal ciphertext blocks, within a frame and across
//! frames. This is the wire format producers speak today; switching modes
//! means changing the envelope as well.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyInit};
use aes::{Aes128, Aes192, Aes256};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;

use super::envelope::Envelope;
use super::error::CipherError;

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// Stateless envelope parser and decryptor
///
/// The key is supplied per call; the cipher holds no per-session state.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCipher;

impl FrameCipher {
    /// Create a cipher
    pub fn new() -> Self {
        Self
    }

    /// Parse, decode and decrypt one envelope
    pub fn decrypt(&self, envelope: &str, key: &[u8]) -> Result<Bytes, CipherError> {
        let envelope = Envelope::parse(envelope)?;
        let ciphertext = STANDARD.decode(envelope.payload)?;
        decrypt_ecb(key, &ciphertext).map(Bytes::from)
    }

    /// Encrypt a frame into an envelope with the given tag
    pub fn encrypt(&self, plaintext: &[u8], key: &[u8], tag: &str) -> Result<String, CipherError> {
        let ciphertext = encrypt_ecb(key, plaintext)?;
        Envelope::encode(tag, &STANDARD.encode(ciphertext))
            .ok_or(CipherError::MalformedEnvelope("tag must be 8 characters"))
    }
}

fn decrypt_ecb(key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CipherError::TruncatedCiphertext(ciphertext.len()));
    }

    let bad_key = |_| CipherError::InvalidKeyLength(key.len());
    let result = match key.len() {
        16 => ecb::Decryptor::<Aes128>::new_from_slice(key)
            .map_err(bad_key)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        24 => ecb::Decryptor::<Aes192>::new_from_slice(key)
            .map_err(bad_key)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        32 => ecb::Decryptor::<Aes256>::new_from_slice(key)
            .map_err(bad_key)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        n => return Err(CipherError::InvalidKeyLength(n)),
    };

    result.map_err(|_| CipherError::BadPadding)
}

fn encrypt_ecb(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
    let bad_key = |_| CipherError::InvalidKeyLength(key.len());
    let ciphertext = match key.len() {
        16 => ecb::Encryptor::<Aes128>::new_from_slice(key)
            .map_err(bad_key)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        24 => ecb::Encryptor::<Aes192>::new_from_slice(key)
            .map_err(bad_key)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        32 => ecb::Encryptor::<Aes256>::new_from_slice(key)
            .map_err(bad_key)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        n => return Err(CipherError::InvalidKeyLength(n)),
    };
    Ok(ciphertext)
}
