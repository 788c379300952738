// client.rs - sphinx packet construction
// Copyright (C) 2019  David Stainton.

//! Sphinx packet construction.
//!
//! The sender derives one shared secret per hop from a single
//! ephemeral scalar, layer encrypts the routing information from the
//! innermost hop outward, and wraps the payload in one stream cipher
//! layer per hop. Only the first hop's alpha is transmitted; every
//! relay recomputes the next alpha from the blinding factor it derives
//! itself.

use rand::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::commands::{Commands, Hop, RoutingFlag, RoutingInfo};
use crate::constants::{BETA_SIZE, FIXED_IV, MAC_SIZE, MAX_HOPS, ROUTING_SLOT_SIZE};
use crate::ecdh::{
    bytes_to_public_key, bytes_to_scalar, expo, expo_group_base, is_identity_element, PrivateKey,
    KEY_SIZE,
};
use crate::error::SphinxError;
use crate::internal_crypto::{
    aes_ctr, compute_shared_secret_hash, hmac_list, kdf, StreamCipher, HASH_SIZE,
};
use crate::packet::{Header, SphinxPacket};
use crate::utils::xor_assign;

/// An end to end path: the sender's provider, the mixes, the
/// recipient's provider and finally the recipient itself.
#[derive(Debug, Clone)]
pub struct E2EPath {
    pub ingress_provider: Hop,
    pub mixes: Vec<Hop>,
    pub egress_provider: Hop,
    pub recipient: Hop,
}

impl E2EPath {
    /// The ordered list of traversed nodes.
    pub fn nodes(&self) -> Vec<Hop> {
        let mut nodes = Vec::with_capacity(2 + self.mixes.len());
        nodes.push(self.ingress_provider.clone());
        nodes.extend(self.mixes.iter().cloned());
        nodes.push(self.egress_provider.clone());
        nodes
    }
}

/// The per hop values computed while building a header: the blinded
/// group element, the raw shared secret, the blinding factor and the
/// derived key. Secret material is wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct HeaderInitials {
    /// The group element this hop will receive. Only the first entry
    /// is ever transmitted.
    pub alpha: [u8; KEY_SIZE],
    /// The raw DH shared secret with this hop.
    pub shared_secret: [u8; KEY_SIZE],
    /// The blinding factor advancing alpha past this hop.
    pub blinder: [u8; KEY_SIZE],
    /// KDF of the shared secret; the blinding factor derives from it
    /// and one further KDF invocation yields the layer key.
    pub derived_key: [u8; HASH_SIZE],
}

/// Compute the chain of per hop secrets for the given nodes under the
/// ephemeral scalar `x`.
///
/// Each hop's secret is `expo(P_i, [x, b_0, …, b_{i-1}])` and each
/// alpha is the same chain applied to the base point. The scalars are
/// applied one multiplication at a time; collapsing them into a single
/// product first would not survive the per application clamping.
pub fn get_shared_secrets(
    nodes: &[Hop],
    x: &PrivateKey,
) -> Result<Vec<HeaderInitials>, SphinxError> {
    let mut blind_factors: Vec<[u8; KEY_SIZE]> = vec![x.as_array()];
    let mut tuples = Vec::with_capacity(nodes.len());
    for node in nodes.iter() {
        let alpha = expo_group_base(&blind_factors);
        let node_key = bytes_to_public_key(&node.pub_key)?;
        let shared_secret = expo(&node_key.as_array(), &blind_factors);
        if is_identity_element(&shared_secret) {
            return Err(SphinxError::InvalidKey);
        }
        let derived_key = kdf(&shared_secret);
        let blinder = bytes_to_scalar(&compute_shared_secret_hash(&derived_key, &FIXED_IV))?;
        blind_factors.push(blinder);
        tuples.push(HeaderInitials {
            alpha,
            shared_secret,
            blinder,
            derived_key,
        });
    }
    blind_factors.zeroize();
    Ok(tuples)
}

/// Build the Sphinx header for the given nodes, delays and final
/// destination, returning the per hop secrets alongside it.
fn create_header<R: RngCore + CryptoRng>(
    rng: &mut R,
    nodes: &[Hop],
    delays: &[f64],
    destination: &Hop,
) -> Result<(Vec<HeaderInitials>, Header), SphinxError> {
    let x = PrivateKey::generate(rng)?;
    let header_initials = get_shared_secrets(nodes, &x)?;
    if header_initials.len() != nodes.len() {
        return Err(SphinxError::SharedSecretCountMismatch);
    }

    let mut commands = Vec::with_capacity(nodes.len());
    for i in 0..nodes.len() {
        let flag = if i == nodes.len() - 1 {
            RoutingFlag::LastHop
        } else {
            RoutingFlag::Relay
        };
        commands.push(Commands {
            delay: delays[i],
            flag,
        });
    }

    let header = encapsulate_header(rng, &header_initials, nodes, &commands, destination)?;
    Ok((header_initials, header))
}

/// Layer encrypt the routing information, innermost hop first.
///
/// Every layer consumes one routing slot of beta, so each relay strips
/// a constant amount; the keystream tails that spill past the end of
/// beta accumulate into the padding a later hop's MAC must cover. The
/// slots beyond the path length are filled with random bytes, which
/// keeps the header identical in size and appearance for every path
/// length up to `MAX_HOPS`.
fn encapsulate_header<R: RngCore + CryptoRng>(
    rng: &mut R,
    header_initials: &[HeaderInitials],
    nodes: &[Hop],
    commands: &[Commands],
    destination: &Hop,
) -> Result<Header, SphinxError> {
    let num_hops = nodes.len();

    // One further KDF invocation separates the layer key from the
    // blinding material.
    let layer_keys: Vec<[u8; HASH_SIZE]> = header_initials
        .iter()
        .map(|initials| kdf(&initials.derived_key))
        .collect();

    // Derive the routing info keystream and encrypted padding for each
    // hop. The padding is the tail of the keystream a relay applies
    // past the end of its beta; each later layer folds the previous
    // tail in so the accumulated value matches what the relays produce.
    let mut ri_keystream: Vec<Vec<u8>> = Vec::with_capacity(num_hops);
    let mut ri_padding: Vec<Vec<u8>> = Vec::with_capacity(num_hops);
    for i in 0..num_hops {
        let mut stream_cipher = StreamCipher::new(&layer_keys[i]);
        let stream = stream_cipher.generate(BETA_SIZE + ROUTING_SLOT_SIZE);
        let ks_len = stream.len() - (i + 1) * ROUTING_SLOT_SIZE;
        ri_keystream.push(stream[..ks_len].to_vec());
        ri_padding.push(stream[ks_len..].to_vec());
        if i > 0 {
            let prev = ri_padding[i - 1].clone();
            xor_assign(&mut ri_padding[i][..prev.len()], &prev);
        }
    }

    // Create the routing information block.
    let mut beta = [0u8; BETA_SIZE];
    if num_hops < MAX_HOPS {
        rng.try_fill_bytes(&mut beta[num_hops * ROUTING_SLOT_SIZE..])?;
    }

    let mut mac = [0u8; MAC_SIZE];
    let mut hop_index = num_hops - 1;
    loop {
        let routing = if hop_index == num_hops - 1 {
            // The final record names the recipient; there is no next
            // relay, so the public key is empty and the MAC is zero.
            RoutingInfo {
                next_hop: Hop {
                    id: destination.id.clone(),
                    address: destination.address.clone(),
                    pub_key: Vec::new(),
                },
                command: commands[hop_index],
                mac: [0u8; MAC_SIZE],
            }
        } else {
            RoutingInfo {
                next_hop: nodes[hop_index + 1].clone(),
                command: commands[hop_index],
                mac,
            }
        };

        let slot_start = hop_index * ROUTING_SLOT_SIZE;
        routing.encode_into(&mut beta[slot_start..slot_start + ROUTING_SLOT_SIZE])?;
        xor_assign(&mut beta[slot_start..], &ri_keystream[hop_index]);

        // The MAC covers the beta this hop will actually see: the
        // layered slots plus the padding accumulated so far.
        let padding: &[u8] = if hop_index > 0 {
            &ri_padding[hop_index - 1]
        } else {
            &[]
        };
        mac = hmac_list(&layer_keys[hop_index], &[&beta[slot_start..], padding])?;

        if hop_index == 0 {
            break;
        }
        hop_index -= 1;
    }

    Ok(Header {
        alpha: header_initials[0].alpha,
        beta,
        mac,
    })
}

/// Wrap the message in one stream cipher layer per hop, innermost
/// layer first. Length preserving; padding policy belongs to the
/// sender.
fn encapsulate_content(header_initials: &[HeaderInitials], message: &[u8]) -> Vec<u8> {
    let mut payload = message.to_vec();
    for initials in header_initials.iter().rev() {
        let layer_key = kdf(&initials.derived_key);
        payload = aes_ctr(&layer_key, &payload);
    }
    payload
}

/// Build a Sphinx packet traversing `nodes` and terminating at
/// `destination`.
///
/// # Arguments
///
/// * `rng` - a CSPRNG supplying the ephemeral scalar and header padding
/// * `nodes` - the ordered relays the packet will traverse
/// * `delays` - one delay in seconds per traversed node
/// * `destination` - the recipient named by the final routing record
/// * `message` - the payload plaintext
pub fn new_packet<R: RngCore + CryptoRng>(
    rng: &mut R,
    nodes: &[Hop],
    delays: &[f64],
    destination: &Hop,
    message: &[u8],
) -> Result<SphinxPacket, SphinxError> {
    if nodes.is_empty() || nodes.len() > MAX_HOPS || delays.len() != nodes.len() {
        return Err(SphinxError::BadArity);
    }
    let (header_initials, header) = create_header(rng, nodes, delays, destination)?;
    let payload = encapsulate_content(&header_initials, message);
    Ok(SphinxPacket { header, payload })
}

/// Encapsulate the given message into a Sphinx packet along the end to
/// end path: the ingress provider, the mixes, the egress provider and
/// finally the recipient.
pub fn pack_forward_message<R: RngCore + CryptoRng>(
    rng: &mut R,
    path: &E2EPath,
    delays: &[f64],
    message: &[u8],
) -> Result<SphinxPacket, SphinxError> {
    let nodes = path.nodes();
    new_packet(rng, &nodes, delays, &path.recipient, message)
}
