// error.rs - sphinx cryptographic packet format errors
// Copyright (C) 2019  David Stainton.

use thiserror::Error;

/// Errors produced while building or unwrapping Sphinx packets.
///
/// A relay handling [`SphinxError::MacMismatch`] must drop the packet
/// silently; surfacing anything about the failure to the network would
/// hand an oracle to an active attacker.
#[derive(Debug, Error)]
pub enum SphinxError {
    /// The path description is inconsistent: the number of delays does
    /// not match the number of traversed nodes, or the node list is
    /// empty or longer than the packet geometry allows.
    #[error("the number of delays must match the number of traversed nodes")]
    BadArity,

    /// Key material was not a valid curve25519 element.
    #[error("invalid curve25519 key material")]
    InvalidKey,

    /// The system random source failed to produce bytes.
    #[error("randomness unavailable: {0}")]
    RandomnessUnavailable(#[from] rand::Error),

    /// The packet bytes failed structural validation.
    #[error("sphinx packet failed structural validation")]
    MalformedPacket,

    /// The recomputed header MAC did not match the received one.
    #[error("message authentication code did not match")]
    MacMismatch,

    /// The routing flag byte is not one this system assigns.
    #[error("unrecognized routing flag {0:#04x}")]
    UnknownFlag(u8),

    /// A symmetric primitive rejected its inputs.
    #[error("symmetric crypto operation failed")]
    CryptoFailure,

    /// The shared secret chain produced a different number of entries
    /// than there are nodes on the path.
    #[error("the number of shared secrets must match the number of traversed nodes")]
    SharedSecretCountMismatch,
}
