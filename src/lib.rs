// lib.rs - The Sphinx cryptographic packet library
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

//! An implementation of the Sphinx cryptographic packet format for
//! Loopix style mix networks.
//!
//! # The Sphinx Cryptographic Packet Format
//!
//! The Sphinx cryptographic packet format is a compact and provably
//! secure design introduced by George Danezis and Ian Goldberg. A
//! sender builds an onion encrypted packet traversing a sequence of
//! relays; each relay removes one layer of encryption, learns only its
//! predecessor and successor, and forwards the rest to the next hop.
//!
//! # Security Features
//!
//! * per hop bitwise unlinkability
//! * hidden path length and relay position via constant size headers
//! * tagging attack detection via per hop MACs
//!
//! This library is pure and stateless: it performs no I/O, keeps no
//! global state, and leaves delay enforcement and replay detection to
//! the relay that calls it.
//!
//! **[Sphinx: A Compact and Provably Secure Mix Format](https://cypherpunks.ca/~iang/pubs/Sphinx_Oakland09.pdf)**

pub mod client;
pub mod commands;
pub mod constants;
pub mod ecdh;
pub mod error;
pub mod packet;
pub mod server;

mod internal_crypto;
mod utils;
