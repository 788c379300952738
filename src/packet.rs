// packet.rs - sphinx packet wire encoding
// Copyright (C) 2019  David Stainton.

//! The Sphinx packet and its wire form.
//!
//! A packet on the wire is the fixed size header followed by the
//! payload: `alpha || beta || mac || payload`. The header never
//! changes size; the payload length is set by the sender's padding
//! policy and preserved at every hop.

use arrayref::{array_ref, array_refs};

use crate::commands::RoutingFlag;
use crate::constants::{BETA_SIZE, CURVE25519_SIZE, HEADER_SIZE, MAC_SIZE};
use crate::error::SphinxError;

/// The Sphinx packet header.
#[derive(Clone, Debug)]
pub struct Header {
    /// The blinded ephemeral group element for this hop.
    pub alpha: [u8; CURVE25519_SIZE],
    /// The onion encrypted routing information.
    pub beta: [u8; BETA_SIZE],
    /// MAC over beta under this hop's layer key.
    pub mac: [u8; MAC_SIZE],
}

/// A Sphinx packet: header plus onion encrypted payload.
#[derive(Clone, Debug)]
pub struct SphinxPacket {
    pub header: Header,
    pub payload: Vec<u8>,
}

impl SphinxPacket {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.payload.len());
        out.extend_from_slice(&self.header.alpha);
        out.extend_from_slice(&self.header.beta);
        out.extend_from_slice(&self.header.mac);
        out.extend_from_slice(&self.payload);
        out
    }

    pub fn from_bytes(b: &[u8]) -> Result<SphinxPacket, SphinxError> {
        if b.len() < HEADER_SIZE {
            return Err(SphinxError::MalformedPacket);
        }
        let header_bytes = array_ref![b, 0, HEADER_SIZE];
        let (alpha, beta, mac) = array_refs![header_bytes, CURVE25519_SIZE, BETA_SIZE, MAC_SIZE];
        Ok(SphinxPacket {
            header: Header {
                alpha: *alpha,
                beta: *beta,
                mac: *mac,
            },
            payload: b[HEADER_SIZE..].to_vec(),
        })
    }
}

/// The envelope nodes speak to each other outside the Sphinx header:
/// a flag byte naming the kind of traffic, then the raw data. Sphinx
/// packets in transit travel under [`RoutingFlag::Comm`]; the other
/// envelope flags carry provider registration and inbox traffic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneralPacket {
    pub flag: RoutingFlag,
    pub data: Vec<u8>,
}

impl GeneralPacket {
    pub fn wrap_with_flag(flag: RoutingFlag, data: Vec<u8>) -> GeneralPacket {
        GeneralPacket { flag, data }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.data.len());
        out.push(self.flag.to_byte());
        out.extend_from_slice(&self.data);
        out
    }

    pub fn from_bytes(b: &[u8]) -> Result<GeneralPacket, SphinxError> {
        if b.is_empty() {
            return Err(SphinxError::MalformedPacket);
        }
        Ok(GeneralPacket {
            flag: RoutingFlag::from_byte(b[0])?,
            data: b[1..].to_vec(),
        })
    }
}
