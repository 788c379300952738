// internal_crypto.rs - Sphinx crypto primitives
// Copyright (C) 2019  Jeffrey Burdges and David Stainton.

//! Sphinx crypto primitives
//!
//! The key schedule, the layer stream cipher and the header MAC. All
//! of it is deterministic: the sender and every relay must reproduce
//! each other's bytes exactly.

use aes::cipher::{KeyIvInit, StreamCipher as StreamCipherOp};
use aes::Aes256;
use ctr::Ctr128BE;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::constants::{CURVE25519_SIZE, K, MAC_SIZE};
use crate::error::SphinxError;

/// The size in bytes of the KDF output and of every derived key.
pub const HASH_SIZE: usize = 32;
/// The size in bytes of a stream cipher key.
pub const STREAM_KEY_SIZE: usize = HASH_SIZE;
/// The size in bytes of a stream cipher IV.
pub const STREAM_IV_SIZE: usize = K;

type Aes256Ctr = Ctr128BE<Aes256>;
type HmacSha256 = Hmac<Sha256>;

// The block encrypted by compute_shared_secret_hash: sixteen ASCII
// zero characters, not zero bytes.
const SECRET_HASH_PLAINTEXT: [u8; K] = *b"0000000000000000";

// Layer keys are used exactly once, so the layer stream IV is zero.
const STREAM_IV: [u8; STREAM_IV_SIZE] = [0u8; STREAM_IV_SIZE];

/// Derive a symmetric key from a raw shared secret.
pub fn kdf(input: &[u8; CURVE25519_SIZE]) -> [u8; HASH_SIZE] {
    let digest = Sha256::digest(input);
    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(&digest);
    out
}

/// Stream cipher for sphinx crypto usage: AES-256-CTR.
pub struct StreamCipher {
    cipher: Aes256Ctr,
}

impl StreamCipher {
    /// Create a new StreamCipher with the fixed zero IV.
    pub fn new(key: &[u8; STREAM_KEY_SIZE]) -> StreamCipher {
        StreamCipher {
            cipher: Aes256Ctr::new(key.into(), (&STREAM_IV).into()),
        }
    }

    /// Create a new StreamCipher under an explicit IV.
    pub fn new_with_iv(key: &[u8; STREAM_KEY_SIZE], iv: &[u8; STREAM_IV_SIZE]) -> StreamCipher {
        StreamCipher {
            cipher: Aes256Ctr::new(key.into(), iv.into()),
        }
    }

    /// Return a cipher stream of length n.
    pub fn generate(&mut self, n: usize) -> Vec<u8> {
        let mut output = vec![0u8; n];
        self.cipher.apply_keystream(&mut output);
        output
    }

    /// XOR the key stream into `data` in place.
    pub fn xor_key_stream(&mut self, data: &mut [u8]) {
        self.cipher.apply_keystream(data);
    }
}

/// Length preserving encryption or decryption of `data` under `key`.
pub fn aes_ctr(key: &[u8; STREAM_KEY_SIZE], data: &[u8]) -> Vec<u8> {
    let mut out = data.to_vec();
    StreamCipher::new(key).xor_key_stream(&mut out);
    out
}

/// Compute the truncated HMAC-SHA256 of `data` under `key`.
pub fn compute_mac(key: &[u8; HASH_SIZE], data: &[u8]) -> Result<[u8; MAC_SIZE], SphinxError> {
    hmac_list(key, &[data])
}

/// Compute the truncated HMAC-SHA256 over the concatenation of `parts`.
pub fn hmac_list(key: &[u8; HASH_SIZE], parts: &[&[u8]]) -> Result<[u8; MAC_SIZE], SphinxError> {
    let mut m = HmacSha256::new_from_slice(key).map_err(|_| SphinxError::CryptoFailure)?;
    for part in parts {
        m.update(part);
    }
    let digest = m.finalize().into_bytes();
    let mut out = [0u8; MAC_SIZE];
    out.copy_from_slice(&digest[..MAC_SIZE]);
    Ok(out)
}

/// Hash a derived key down to one block by encrypting a fixed
/// plaintext under `(key, iv)`; the result seeds the blinding factor.
pub fn compute_shared_secret_hash(
    key: &[u8; STREAM_KEY_SIZE],
    iv: &[u8; STREAM_IV_SIZE],
) -> [u8; K] {
    let mut block = SECRET_HASH_PLAINTEXT;
    StreamCipher::new_with_iv(key, iv).xor_key_stream(&mut block);
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FIXED_IV;

    #[test]
    fn kdf_is_deterministic() {
        let secret = [0x42_u8; CURVE25519_SIZE];
        assert_eq!(kdf(&secret), kdf(&secret));
        let mut other = secret;
        other[0] ^= 1;
        assert_ne!(kdf(&secret), kdf(&other));
    }

    #[test]
    fn stream_cipher_round_trip() {
        let key = [0x17_u8; STREAM_KEY_SIZE];
        let plaintext = b"the quick brown fox jumps over the lazy dog".to_vec();
        let ciphertext = aes_ctr(&key, &plaintext);
        assert_eq!(ciphertext.len(), plaintext.len());
        assert_ne!(ciphertext, plaintext);
        assert_eq!(aes_ctr(&key, &ciphertext), plaintext);
    }

    #[test]
    fn generate_matches_xor_of_zeros() {
        let key = [0x99_u8; STREAM_KEY_SIZE];
        let stream = StreamCipher::new(&key).generate(100);
        let zeros = vec![0u8; 100];
        assert_eq!(stream, aes_ctr(&key, &zeros));
    }

    #[test]
    fn mac_is_truncated_and_keyed() {
        let key_a = [0x01_u8; HASH_SIZE];
        let key_b = [0x02_u8; HASH_SIZE];
        let mac_a = compute_mac(&key_a, b"data").unwrap();
        let mac_b = compute_mac(&key_b, b"data").unwrap();
        assert_eq!(mac_a.len(), MAC_SIZE);
        assert_ne!(mac_a, mac_b);
        assert_eq!(
            mac_a,
            hmac_list(&key_a, &[b"da", b"ta"]).unwrap(),
        );
    }

    #[test]
    fn shared_secret_hash_is_one_block() {
        let key = [0x33_u8; STREAM_KEY_SIZE];
        let h1 = compute_shared_secret_hash(&key, &FIXED_IV);
        let h2 = compute_shared_secret_hash(&key, &FIXED_IV);
        assert_eq!(h1, h2);
        let other_iv = [0x44_u8; STREAM_IV_SIZE];
        assert_ne!(h1, compute_shared_secret_hash(&key, &other_iv));
    }
}
