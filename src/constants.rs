// constants.rs - sphinx cryptographic packet format constants
// Copyright (C) 2019  David Anthony Stainton.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! The Sphinx packet geometry parameterization.
//!
//! Every length here is fixed so that a packet looks identical no
//! matter how many hops its path contains.

/// The security parameter, in bytes. This is the AES block size and
/// the quantum in which header padding is produced and consumed.
pub const K: usize = 16;

/// The size in bytes of a curve25519 key or group element.
pub const CURVE25519_SIZE: usize = 32;

/// The maximum number of hops a packet may traverse: an ingress
/// provider, up to three mixes and an egress provider.
pub const MAX_HOPS: usize = 5;

/// The size in bytes of the truncated header MAC.
pub const MAC_SIZE: usize = K;

/// The maximum length in bytes of a node or recipient identifier.
pub const NODE_ID_MAX_SIZE: usize = 32;

/// The maximum length in bytes of a "host:port" node address.
pub const ADDRESS_MAX_SIZE: usize = 32;

/// The size in bytes of one hop's routing information slot within
/// beta. A serialized routing record is padded out to this size so
/// that each layer of the header consumes a constant amount.
pub const ROUTING_SLOT_SIZE: usize = 8 * K;

/// The size in bytes of beta, the onion encrypted routing information
/// section of the packet header.
pub const BETA_SIZE: usize = ROUTING_SLOT_SIZE * MAX_HOPS;

/// The size of the Sphinx packet header in bytes: alpha, beta and the
/// header MAC.
pub const HEADER_SIZE: usize = CURVE25519_SIZE + BETA_SIZE + MAC_SIZE;

/// The fixed initialization vector used when deriving blinding
/// factors from a shared secret hash.
pub const FIXED_IV: [u8; K] = *b"initialvector000";
