//! Client-side file encryption.
//!
//! Files are sealed before upload into a self-contained envelope: the
//! contents are encrypted with a random per-file content key (AES-256-GCM),
//! and that content key travels inside the envelope wrapped by a key derived
//! from the caller's passphrase (Argon2id). The server only ever stores the
//! opaque envelope; anyone holding the passphrase can open it after
//! download. Losing the passphrase loses the file.
//!
//! Envelope layout:
//! `magic (4) | version (1) | salt (16) | kek nonce (12) | wrapped key (48) |
//! content nonce (12) | ciphertext`

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use anyhow::{Result, anyhow, bail};
use argon2::Argon2;
use rand::RngCore;
use rand::rngs::OsRng;

const MAGIC: &[u8; 4] = b"SDRP";
const VERSION: u8 = 1;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
/// AES-GCM appends a 16-byte tag to the 32-byte wrapped content key.
const WRAPPED_KEY_LEN: usize = KEY_LEN + 16;

const HEADER_LEN: usize = 4 + 1 + SALT_LEN + NONCE_LEN + WRAPPED_KEY_LEN + NONCE_LEN;

/// Returns whether the bytes look like a sealed envelope.
pub fn is_sealed(bytes: &[u8]) -> bool {
    bytes.len() >= HEADER_LEN && &bytes[..4] == MAGIC
}

/// Derives the key-encryption key from a passphrase and salt.
fn derive_kek(passphrase: &str, salt: &[u8]) -> Result<[u8; KEY_LEN]> {
    let mut kek = [0u8; KEY_LEN];
    Argon2::default()
        .hash_password_into(passphrase.as_bytes(), salt, &mut kek)
        .map_err(|e| anyhow!("Failed to derive key from passphrase: {e}"))?;
    Ok(kek)
}

/// Seals file contents under a passphrase.
pub fn seal(plaintext: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    let mut content_key = [0u8; KEY_LEN];
    OsRng.fill_bytes(&mut content_key);

    let mut content_nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut content_nonce);

    let content_cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&content_key));
    let ciphertext = content_cipher
        .encrypt(Nonce::from_slice(&content_nonce), plaintext)
        .map_err(|_| anyhow!("Failed to encrypt file contents"))?;

    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let kek = derive_kek(passphrase, &salt)?;

    let mut kek_nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut kek_nonce);

    let kek_cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&kek));
    let wrapped_key = kek_cipher
        .encrypt(Nonce::from_slice(&kek_nonce), content_key.as_slice())
        .map_err(|_| anyhow!("Failed to wrap content key"))?;
    debug_assert_eq!(wrapped_key.len(), WRAPPED_KEY_LEN);

    let mut envelope = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    envelope.extend_from_slice(MAGIC);
    envelope.push(VERSION);
    envelope.extend_from_slice(&salt);
    envelope.extend_from_slice(&kek_nonce);
    envelope.extend_from_slice(&wrapped_key);
    envelope.extend_from_slice(&content_nonce);
    envelope.extend_from_slice(&ciphertext);
    Ok(envelope)
}

/// Opens a sealed envelope with the passphrase it was sealed under.
pub fn open(envelope: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    if envelope.len() < HEADER_LEN || &envelope[..4] != MAGIC {
        bail!("Not a sealed file envelope");
    }
    let version = envelope[4];
    if version != VERSION {
        bail!("Unsupported envelope version {version}");
    }

    let mut offset = 5;
    let salt = &envelope[offset..offset + SALT_LEN];
    offset += SALT_LEN;
    let kek_nonce = &envelope[offset..offset + NONCE_LEN];
    offset += NONCE_LEN;
    let wrapped_key = &envelope[offset..offset + WRAPPED_KEY_LEN];
    offset += WRAPPED_KEY_LEN;
    let content_nonce = &envelope[offset..offset + NONCE_LEN];
    offset += NONCE_LEN;
    let ciphertext = &envelope[offset..];

    let kek = derive_kek(passphrase, salt)?;
    let kek_cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&kek));
    let content_key = kek_cipher
        .decrypt(Nonce::from_slice(kek_nonce), wrapped_key)
        .map_err(|_| anyhow!("Wrong passphrase or corrupted key envelope"))?;

    let content_cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&content_key));
    content_cipher
        .decrypt(Nonce::from_slice(content_nonce), ciphertext)
        .map_err(|_| anyhow!("File contents failed authentication"))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sealed contents open back to the original bytes.
    #[test]
    fn test_seal_open_roundtrip() {
        let plaintext = b"ten bytes!";
        let envelope = seal(plaintext, "correct horse").unwrap();

        assert!(is_sealed(&envelope));
        assert_ne!(&envelope[HEADER_LEN..], plaintext);

        let opened = open(&envelope, "correct horse").unwrap();
        assert_eq!(opened, plaintext);
    }

    /// Two seals of the same contents differ (fresh key, salt, nonces).
    #[test]
    fn test_seal_is_randomized() {
        let a = seal(b"same contents", "pw").unwrap();
        let b = seal(b"same contents", "pw").unwrap();
        assert_ne!(a, b);
    }

    /// The wrong passphrase fails at the key envelope, not with garbage.
    #[test]
    fn test_wrong_passphrase_rejected() {
        let envelope = seal(b"secret", "right").unwrap();
        let err = open(&envelope, "wrong").unwrap_err();
        assert!(err.to_string().contains("passphrase"));
    }

    /// A flipped ciphertext byte fails authentication.
    #[test]
    fn test_tampered_contents_rejected() {
        let mut envelope = seal(b"secret", "pw").unwrap();
        let last = envelope.len() - 1;
        envelope[last] ^= 0x01;

        let err = open(&envelope, "pw").unwrap_err();
        assert!(err.to_string().contains("authentication"));
    }

    /// Plain bytes are rejected up front.
    #[test]
    fn test_unsealed_bytes_rejected() {
        assert!(!is_sealed(b"just a text file"));
        let err = open(b"just a text file", "pw").unwrap_err();
        assert!(err.to_string().contains("Not a sealed"));
    }

    /// Empty files still roundtrip.
    #[test]
    fn test_empty_contents_roundtrip() {
        let envelope = seal(b"", "pw").unwrap();
        assert_eq!(open(&envelope, "pw").unwrap(), b"");
    }
}
