// server.rs - sphinx packet unwrapping
// Copyright (C) 2019  David Stainton.

//! Per hop Sphinx packet processing.
//!
//! A relay hands its private key and the raw packet bytes to
//! [`process_sphinx_packet`] and receives the routing command, the
//! next hop and the packet to pass on. The MAC is verified in constant
//! time before any decryption happens; a packet failing the check must
//! be dropped silently by the caller.

use subtle::ConstantTimeEq;

use crate::commands::{Commands, Hop, RoutingFlag, RoutingInfo};
use crate::constants::{BETA_SIZE, CURVE25519_SIZE, FIXED_IV, ROUTING_SLOT_SIZE};
use crate::ecdh::{bytes_to_scalar, exp, is_identity_element, PrivateKey, PublicKey};
use crate::error::SphinxError;
use crate::internal_crypto::{aes_ctr, compute_mac, compute_shared_secret_hash, kdf, StreamCipher};
use crate::packet::{Header, SphinxPacket};

/// The result of unwrapping one layer of a Sphinx packet.
///
/// On [`RoutingFlag::Relay`] the caller forwards `packet` to
/// `next_hop.address` after `command.delay` seconds; on
/// [`RoutingFlag::LastHop`] it delivers `packet.payload` to the local
/// client named by `next_hop.id`.
#[derive(Clone, Debug)]
pub struct ProcessedPacket {
    pub next_hop: Hop,
    pub command: Commands,
    pub packet: SphinxPacket,
}

/// Unwrap a layer of sphinx packet encryption.
///
/// # Arguments
///
/// * `packet_bytes` - a Sphinx packet in wire form
/// * `private_key` - the processing relay's private key
///
/// # Returns
///
/// * the routing command, the next hop and the transformed packet, or
///   a `SphinxError` which the relay must treat as a silent drop
pub fn process_sphinx_packet(
    packet_bytes: &[u8],
    private_key: &PrivateKey,
) -> Result<ProcessedPacket, SphinxError> {
    let packet = SphinxPacket::from_bytes(packet_bytes)?;
    let (next_hop, command, new_header) = process_sphinx_header(&packet.header, private_key)?;
    let new_payload = process_sphinx_payload(&packet.header.alpha, &packet.payload, private_key)?;
    Ok(ProcessedPacket {
        next_hop,
        command,
        packet: SphinxPacket {
            header: new_header,
            payload: new_payload,
        },
    })
}

/// Unwrap one layer of encryption from a Sphinx packet header.
///
/// Recomputes the shared key, checks the MAC, strips one layer of
/// routing information, recomputes the blinding factor and advances
/// the public element for the next hop.
pub fn process_sphinx_header(
    header: &Header,
    private_key: &PrivateKey,
) -> Result<(Hop, Commands, Header), SphinxError> {
    let alpha = PublicKey::from_bytes(&header.alpha)?;
    let shared_secret = private_key.exp(&alpha);
    if is_identity_element(&shared_secret) {
        return Err(SphinxError::InvalidKey);
    }
    let derived_key = kdf(&shared_secret);
    let layer_key = kdf(&derived_key);

    // Validate the header MAC before decrypting anything.
    let computed_mac = compute_mac(&layer_key, &header.beta)?;
    if computed_mac.ct_eq(&header.mac).unwrap_u8() == 0 {
        return Err(SphinxError::MacMismatch);
    }

    // Recompute the blinding factor and advance alpha.
    let blinder = bytes_to_scalar(&compute_shared_secret_hash(&derived_key, &FIXED_IV))?;
    let new_alpha = exp(&header.alpha, &blinder);

    // Extend beta by one routing slot to preserve length invariance,
    // decrypt, and split off this hop's record.
    let mut beta_ext = [0u8; BETA_SIZE + ROUTING_SLOT_SIZE];
    beta_ext[..BETA_SIZE].copy_from_slice(&header.beta);
    StreamCipher::new(&layer_key).xor_key_stream(&mut beta_ext);

    let routing = RoutingInfo::from_slot(&beta_ext[..ROUTING_SLOT_SIZE])?;
    match routing.command.flag {
        RoutingFlag::Relay | RoutingFlag::LastHop => {}
        other => return Err(SphinxError::UnknownFlag(other.to_byte())),
    }

    let mut new_beta = [0u8; BETA_SIZE];
    new_beta.copy_from_slice(&beta_ext[ROUTING_SLOT_SIZE..]);

    let new_header = Header {
        alpha: new_alpha,
        beta: new_beta,
        mac: routing.mac,
    };
    Ok((routing.next_hop, routing.command, new_header))
}

/// Unwrap a single layer of encryption from the packet payload.
pub fn process_sphinx_payload(
    alpha: &[u8; CURVE25519_SIZE],
    payload: &[u8],
    private_key: &PrivateKey,
) -> Result<Vec<u8>, SphinxError> {
    let alpha = PublicKey::from_bytes(alpha)?;
    let shared_secret = private_key.exp(&alpha);
    if is_identity_element(&shared_secret) {
        return Err(SphinxError::InvalidKey);
    }
    let layer_key = kdf(&kdf(&shared_secret));
    Ok(aes_ctr(&layer_key, payload))
}
