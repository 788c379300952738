// ecdh.rs - wrapping library for curve25519 dh operations
// Copyright (C) 2019  David Anthony Stainton.

//! Curve25519 scalar and group element operations.
//!
//! Scalars are raw 32 byte strings; X25519 clamps a scalar every time
//! it is applied. The chain helpers below therefore apply scalars one
//! at a time and never collapse them into a single product first: the
//! clamped iterated form is what both the sender and every relay
//! compute, and the two forms disagree modulo the group order.

use rand::{CryptoRng, RngCore};
use subtle::ConstantTimeEq;
use x25519_dalek::{x25519, X25519_BASEPOINT_BYTES};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::CURVE25519_SIZE;
use crate::error::SphinxError;

/// KEY_SIZE is the size in bytes of the keys.
pub const KEY_SIZE: usize = CURVE25519_SIZE;

/// Scalar multiplication of the group element `x` by the scalar `y`.
pub fn exp(x: &[u8; KEY_SIZE], y: &[u8; KEY_SIZE]) -> [u8; KEY_SIZE] {
    x25519(*y, *x)
}

/// Scalar multiplication of the base point by the scalar `y`.
pub fn exp_g(y: &[u8; KEY_SIZE]) -> [u8; KEY_SIZE] {
    x25519(*y, X25519_BASEPOINT_BYTES)
}

/// Chain exponentiation: computes `((x·s1)·s2)…·sn`, one scalar
/// multiplication per element of `scalars`.
pub fn expo(x: &[u8; KEY_SIZE], scalars: &[[u8; KEY_SIZE]]) -> [u8; KEY_SIZE] {
    scalars.iter().fold(*x, |acc, s| x25519(*s, acc))
}

/// Chain exponentiation starting from the base point.
pub fn expo_group_base(scalars: &[[u8; KEY_SIZE]]) -> [u8; KEY_SIZE] {
    expo(&X25519_BASEPOINT_BYTES, scalars)
}

/// Widen a byte string of at most 32 bytes into a scalar by zero
/// extension; the blinding factor hash is only 16 bytes long.
pub fn bytes_to_scalar(b: &[u8]) -> Result<[u8; KEY_SIZE], SphinxError> {
    if b.is_empty() || b.len() > KEY_SIZE {
        return Err(SphinxError::InvalidKey);
    }
    let mut out = [0u8; KEY_SIZE];
    out[..b.len()].copy_from_slice(b);
    Ok(out)
}

/// Whether a group element is the all zero string, the output X25519
/// produces for the identity and other low order inputs.
pub fn is_identity_element(b: &[u8; KEY_SIZE]) -> bool {
    b.ct_eq(&[0u8; KEY_SIZE]).unwrap_u8() == 1
}

/// A curve25519 public key or, equally, a blinded group element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicKey {
    key: [u8; KEY_SIZE],
}

impl PublicKey {
    /// Deserialize a public key, rejecting anything that is not 32
    /// bytes or that decodes to the identity element.
    pub fn from_bytes(b: &[u8]) -> Result<PublicKey, SphinxError> {
        if b.len() != KEY_SIZE {
            return Err(SphinxError::InvalidKey);
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(b);
        if is_identity_element(&key) {
            return Err(SphinxError::InvalidKey);
        }
        Ok(PublicKey { key })
    }

    /// Multiply this element by a blinding factor in place.
    pub fn blind(&mut self, blinding_factor: &[u8; KEY_SIZE]) {
        self.key = exp(&self.key, blinding_factor);
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.key.to_vec()
    }

    pub fn as_array(&self) -> [u8; KEY_SIZE] {
        self.key
    }
}

/// A curve25519 private key. The raw bytes are wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    key: [u8; KEY_SIZE],
}

impl PrivateKey {
    /// Generate a fresh private key from the given CSPRNG.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Result<PrivateKey, SphinxError> {
        let mut key = [0u8; KEY_SIZE];
        rng.try_fill_bytes(&mut key)?;
        Ok(PrivateKey { key })
    }

    pub fn from_bytes(b: &[u8]) -> Result<PrivateKey, SphinxError> {
        if b.len() != KEY_SIZE {
            return Err(SphinxError::InvalidKey);
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(b);
        Ok(PrivateKey { key })
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey { key: exp_g(&self.key) }
    }

    /// Calculate the shared secret with the provided group element.
    pub fn exp(&self, public_key: &PublicKey) -> [u8; KEY_SIZE] {
        exp(&public_key.key, &self.key)
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.key.to_vec()
    }

    pub fn as_array(&self) -> [u8; KEY_SIZE] {
        self.key
    }
}

/// Generate a keypair from the given CSPRNG.
pub fn generate_keypair<R: RngCore + CryptoRng>(
    rng: &mut R,
) -> Result<(PrivateKey, PublicKey), SphinxError> {
    let private_key = PrivateKey::generate(rng)?;
    let public_key = private_key.public_key();
    Ok((private_key, public_key))
}

/// Deserialize a private key from raw bytes.
pub fn bytes_to_private_key(b: &[u8]) -> Result<PrivateKey, SphinxError> {
    PrivateKey::from_bytes(b)
}

/// Deserialize a public key from raw bytes.
pub fn bytes_to_public_key(b: &[u8]) -> Result<PublicKey, SphinxError> {
    PublicKey::from_bytes(b)
}
