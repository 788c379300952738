// commands.rs - sphinx routing commands and their wire form
// Copyright (C) 2019  David Stainton.

//! Routing commands and the per hop routing information record.
//!
//! Each hop of the header holds one routing record in a fixed size
//! slot. The record names the next hop, carries the command for the
//! processing relay and the MAC the next relay will verify. Records
//! are encoded at fixed offsets so a slot is the same size no matter
//! how short the identifiers inside it are.

use byteorder::{ByteOrder, LittleEndian};

use crate::constants::{ADDRESS_MAX_SIZE, MAC_SIZE, NODE_ID_MAX_SIZE, ROUTING_SLOT_SIZE};
use crate::ecdh::KEY_SIZE;
use crate::error::SphinxError;

/// The Sphinx routing flag assignments.
const RELAY_FLAG: u8 = 0xf1;
const LAST_HOP_FLAG: u8 = 0xf0;

/// Flags spoken between nodes outside the Sphinx header.
const ASSIGN_FLAG: u8 = 0xa2;
const PULL_FLAG: u8 = 0xff;
const COMM_FLAG: u8 = 0xc6;
const TOKEN_FLAG: u8 = 0xa9;

// Fixed offsets of the record fields within a routing slot.
const FLAG_OFFSET: usize = 0;
const DELAY_OFFSET: usize = 1;
const DELAY_SIZE: usize = 8;
const ID_OFFSET: usize = DELAY_OFFSET + DELAY_SIZE;
const ADDRESS_OFFSET: usize = ID_OFFSET + 1 + NODE_ID_MAX_SIZE;
const PUB_KEY_OFFSET: usize = ADDRESS_OFFSET + 1 + ADDRESS_MAX_SIZE;
const MAC_FIELD_OFFSET: usize = PUB_KEY_OFFSET + 1 + KEY_SIZE;

/// The number of meaningful bytes in a routing slot; the remainder of
/// the slot is zero padding.
pub const ROUTING_RECORD_SIZE: usize = MAC_FIELD_OFFSET + MAC_SIZE;

/// The closed set of packet flags this system assigns.
///
/// Only `Relay` and `LastHop` ever appear inside a Sphinx header; the
/// remaining four are spoken on the wire between clients, mixes and
/// providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingFlag {
    /// Forward the unwrapped packet to the next hop.
    Relay,
    /// Deliver the payload to the local client named by the record.
    LastHop,
    /// A client registering with its provider.
    Assign,
    /// A client fetching its inbox from its provider.
    Pull,
    /// A Sphinx packet in transit between nodes.
    Comm,
    /// A provider granting an authentication token.
    Token,
}

impl RoutingFlag {
    pub fn to_byte(self) -> u8 {
        match self {
            RoutingFlag::Relay => RELAY_FLAG,
            RoutingFlag::LastHop => LAST_HOP_FLAG,
            RoutingFlag::Assign => ASSIGN_FLAG,
            RoutingFlag::Pull => PULL_FLAG,
            RoutingFlag::Comm => COMM_FLAG,
            RoutingFlag::Token => TOKEN_FLAG,
        }
    }

    pub fn from_byte(b: u8) -> Result<RoutingFlag, SphinxError> {
        match b {
            RELAY_FLAG => Ok(RoutingFlag::Relay),
            LAST_HOP_FLAG => Ok(RoutingFlag::LastHop),
            ASSIGN_FLAG => Ok(RoutingFlag::Assign),
            PULL_FLAG => Ok(RoutingFlag::Pull),
            COMM_FLAG => Ok(RoutingFlag::Comm),
            TOKEN_FLAG => Ok(RoutingFlag::Token),
            _ => Err(SphinxError::UnknownFlag(b)),
        }
    }
}

/// The per hop command: how long to hold the packet and what to do
/// with it afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Commands {
    /// Delay in seconds the relay should apply before forwarding.
    pub delay: f64,
    pub flag: RoutingFlag,
}

/// A node on the path, or the recipient named by the final record.
///
/// `pub_key` is a 32 byte curve25519 public key for path nodes and
/// empty in the final record, where the next hop is a client rather
/// than a relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    pub id: String,
    pub address: String,
    pub pub_key: Vec<u8>,
}

impl Hop {
    pub fn new(id: &str, address: &str, pub_key: Vec<u8>) -> Hop {
        Hop {
            id: id.to_string(),
            address: address.to_string(),
            pub_key,
        }
    }
}

/// One decrypted layer of routing information: the next hop, the
/// command for this relay and the MAC protecting the next layer. The
/// rest of the decrypted beta is the next hop's routing metadata and
/// travels alongside this record rather than inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingInfo {
    pub next_hop: Hop,
    pub command: Commands,
    pub mac: [u8; MAC_SIZE],
}

impl RoutingInfo {
    /// Serialize this record into a routing slot. The identifiers are
    /// length prefixed and the slot is zero padded out to
    /// `ROUTING_SLOT_SIZE`.
    pub fn encode_into(&self, slot: &mut [u8]) -> Result<(), SphinxError> {
        if slot.len() != ROUTING_SLOT_SIZE {
            return Err(SphinxError::MalformedPacket);
        }
        let id = self.next_hop.id.as_bytes();
        let address = self.next_hop.address.as_bytes();
        if id.len() > NODE_ID_MAX_SIZE || address.len() > ADDRESS_MAX_SIZE {
            return Err(SphinxError::MalformedPacket);
        }
        if !self.next_hop.pub_key.is_empty() && self.next_hop.pub_key.len() != KEY_SIZE {
            return Err(SphinxError::InvalidKey);
        }

        slot.fill(0);
        slot[FLAG_OFFSET] = self.command.flag.to_byte();
        LittleEndian::write_f64(
            &mut slot[DELAY_OFFSET..DELAY_OFFSET + DELAY_SIZE],
            self.command.delay,
        );
        slot[ID_OFFSET] = id.len() as u8;
        slot[ID_OFFSET + 1..ID_OFFSET + 1 + id.len()].copy_from_slice(id);
        slot[ADDRESS_OFFSET] = address.len() as u8;
        slot[ADDRESS_OFFSET + 1..ADDRESS_OFFSET + 1 + address.len()].copy_from_slice(address);
        slot[PUB_KEY_OFFSET] = self.next_hop.pub_key.len() as u8;
        slot[PUB_KEY_OFFSET + 1..PUB_KEY_OFFSET + 1 + self.next_hop.pub_key.len()]
            .copy_from_slice(&self.next_hop.pub_key);
        slot[MAC_FIELD_OFFSET..MAC_FIELD_OFFSET + MAC_SIZE].copy_from_slice(&self.mac);
        Ok(())
    }

    /// Deserialize a routing record from a decrypted slot.
    pub fn from_slot(slot: &[u8]) -> Result<RoutingInfo, SphinxError> {
        if slot.len() != ROUTING_SLOT_SIZE {
            return Err(SphinxError::MalformedPacket);
        }
        let flag = RoutingFlag::from_byte(slot[FLAG_OFFSET])?;
        let delay = LittleEndian::read_f64(&slot[DELAY_OFFSET..DELAY_OFFSET + DELAY_SIZE]);

        let id_len = slot[ID_OFFSET] as usize;
        if id_len > NODE_ID_MAX_SIZE {
            return Err(SphinxError::MalformedPacket);
        }
        let id = String::from_utf8(slot[ID_OFFSET + 1..ID_OFFSET + 1 + id_len].to_vec())
            .map_err(|_| SphinxError::MalformedPacket)?;

        let address_len = slot[ADDRESS_OFFSET] as usize;
        if address_len > ADDRESS_MAX_SIZE {
            return Err(SphinxError::MalformedPacket);
        }
        let address =
            String::from_utf8(slot[ADDRESS_OFFSET + 1..ADDRESS_OFFSET + 1 + address_len].to_vec())
                .map_err(|_| SphinxError::MalformedPacket)?;

        let pub_key_len = slot[PUB_KEY_OFFSET] as usize;
        if pub_key_len != 0 && pub_key_len != KEY_SIZE {
            return Err(SphinxError::MalformedPacket);
        }
        let pub_key = slot[PUB_KEY_OFFSET + 1..PUB_KEY_OFFSET + 1 + pub_key_len].to_vec();

        let mut mac = [0u8; MAC_SIZE];
        mac.copy_from_slice(&slot[MAC_FIELD_OFFSET..MAC_FIELD_OFFSET + MAC_SIZE]);

        Ok(RoutingInfo {
            next_hop: Hop { id, address, pub_key },
            command: Commands { delay, flag },
            mac,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_fits_the_slot() {
        assert!(ROUTING_RECORD_SIZE <= ROUTING_SLOT_SIZE);
    }

    #[test]
    fn flag_wire_assignments_are_stable() {
        assert_eq!(RoutingFlag::Relay.to_byte(), 0xf1);
        assert_eq!(RoutingFlag::LastHop.to_byte(), 0xf0);
        assert_eq!(RoutingFlag::Assign.to_byte(), 0xa2);
        assert_eq!(RoutingFlag::Pull.to_byte(), 0xff);
        assert_eq!(RoutingFlag::Comm.to_byte(), 0xc6);
        assert_eq!(RoutingFlag::Token.to_byte(), 0xa9);
        for flag in [
            RoutingFlag::Relay,
            RoutingFlag::LastHop,
            RoutingFlag::Assign,
            RoutingFlag::Pull,
            RoutingFlag::Comm,
            RoutingFlag::Token,
        ] {
            assert_eq!(RoutingFlag::from_byte(flag.to_byte()).unwrap(), flag);
        }
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let err = RoutingFlag::from_byte(0x07).unwrap_err();
        assert!(matches!(err, SphinxError::UnknownFlag(0x07)));
    }

    #[test]
    fn routing_record_slot_round_trip() {
        let info = RoutingInfo {
            next_hop: Hop::new("Mix2", "localhost:3331", vec![0x5c; KEY_SIZE]),
            command: Commands {
                delay: 0.25,
                flag: RoutingFlag::Relay,
            },
            mac: [0xaa; MAC_SIZE],
        };
        let mut slot = [0u8; ROUTING_SLOT_SIZE];
        info.encode_into(&mut slot).unwrap();
        let decoded = RoutingInfo::from_slot(&slot).unwrap();
        assert_eq!(decoded, info);

        // final hop record: empty public key, zero mac
        let last = RoutingInfo {
            next_hop: Hop::new("Recipient", "localhost:9999", vec![]),
            command: Commands {
                delay: 0.0,
                flag: RoutingFlag::LastHop,
            },
            mac: [0u8; MAC_SIZE],
        };
        last.encode_into(&mut slot).unwrap();
        assert_eq!(RoutingInfo::from_slot(&slot).unwrap(), last);
    }

    #[test]
    fn oversized_identifiers_are_rejected() {
        let info = RoutingInfo {
            next_hop: Hop::new(
                "this node identifier is considerably too long for a slot",
                "localhost:3331",
                vec![0x5c; KEY_SIZE],
            ),
            command: Commands {
                delay: 0.1,
                flag: RoutingFlag::Relay,
            },
            mac: [0u8; MAC_SIZE],
        };
        let mut slot = [0u8; ROUTING_SLOT_SIZE];
        assert!(matches!(
            info.encode_into(&mut slot).unwrap_err(),
            SphinxError::MalformedPacket
        ));
    }
}
