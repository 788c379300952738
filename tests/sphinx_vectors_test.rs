// sphinx_vectors_test.rs - sphinx cryptographic packet format vector tests
// Copyright (C) 2019  David Stainton.
//
// Deterministic vectors: with a fixed ephemeral scalar and fixed node
// keys, every run and every compliant implementation must derive the
// same bytes. The relay side arithmetic is checked against the sender
// side chain directly, which is the same bit compatibility a second
// implementation would be held to.

use rand::rngs::StdRng;
use rand::SeedableRng;

use sphinxmix::client::{get_shared_secrets, new_packet};
use sphinxmix::commands::Hop;
use sphinxmix::ecdh::{bytes_to_private_key, bytes_to_public_key, exp, PrivateKey};
use sphinxmix::server::process_sphinx_packet;

fn fixed_nodes() -> (Vec<PrivateKey>, Vec<Hop>) {
    let seeds: [[u8; 32]; 3] = [[0x11; 32], [0x22; 32], [0x33; 32]];
    let mut keys = vec![];
    let mut hops = vec![];
    for (i, seed) in seeds.iter().enumerate() {
        let private_key = bytes_to_private_key(seed).unwrap();
        hops.push(Hop::new(
            &format!("N{}", i),
            &format!("localhost:{}", 3330 + i),
            private_key.public_key().to_vec(),
        ));
        keys.push(private_key);
    }
    (keys, hops)
}

fn recipient() -> Hop {
    Hop::new("Recipient", "localhost:9999", Vec::new())
}

#[test]
fn shared_secret_chain_is_deterministic() {
    let (_, hops) = fixed_nodes();
    let x = PrivateKey::from_bytes(&[0x77; 32]).unwrap();
    let a = get_shared_secrets(&hops, &x).unwrap();
    let b = get_shared_secrets(&hops, &x).unwrap();
    assert_eq!(a.len(), hops.len());
    for (l, r) in a.iter().zip(b.iter()) {
        assert_eq!(hex::encode(l.alpha), hex::encode(r.alpha));
        assert_eq!(hex::encode(l.shared_secret), hex::encode(r.shared_secret));
        assert_eq!(hex::encode(l.blinder), hex::encode(r.blinder));
        assert_eq!(hex::encode(l.derived_key), hex::encode(r.derived_key));
    }
}

#[test]
fn relay_side_arithmetic_matches_sender_chain() {
    let (keys, hops) = fixed_nodes();
    let x = PrivateKey::from_bytes(&[0x77; 32]).unwrap();
    let initials = get_shared_secrets(&hops, &x).unwrap();

    for i in 0..hops.len() {
        // the relay derives the shared secret from the alpha it
        // receives and its own private key
        let alpha = bytes_to_public_key(&initials[i].alpha).unwrap();
        let relay_secret = keys[i].exp(&alpha);
        assert_eq!(
            hex::encode(relay_secret),
            hex::encode(initials[i].shared_secret)
        );

        // and advances alpha with a blinder it computes itself
        if i + 1 < hops.len() {
            let next_alpha = exp(&initials[i].alpha, &initials[i].blinder);
            assert_eq!(hex::encode(next_alpha), hex::encode(initials[i + 1].alpha));
        }
    }
}

#[test]
fn per_hop_keys_are_distinct() {
    let (_, hops) = fixed_nodes();
    let x = PrivateKey::from_bytes(&[0x77; 32]).unwrap();
    let initials = get_shared_secrets(&hops, &x).unwrap();
    for i in 0..initials.len() {
        for j in i + 1..initials.len() {
            assert_ne!(initials[i].derived_key, initials[j].derived_key);
            assert_ne!(initials[i].shared_secret, initials[j].shared_secret);
        }
    }
}

#[test]
fn packet_build_is_deterministic() {
    let (_, hops) = fixed_nodes();
    let delays = [0.1, 0.2, 0.3];
    let message = b"reference vector message";

    let mut rng = StdRng::from_seed([0x5a; 32]);
    let p1 = new_packet(&mut rng, &hops, &delays, &recipient(), message).unwrap();
    let mut rng = StdRng::from_seed([0x5a; 32]);
    let p2 = new_packet(&mut rng, &hops, &delays, &recipient(), message).unwrap();

    assert_eq!(hex::encode(p1.to_bytes()), hex::encode(p2.to_bytes()));

    // a different seed moves the ephemeral scalar, so everything moves
    let mut rng = StdRng::from_seed([0x5b; 32]);
    let p3 = new_packet(&mut rng, &hops, &delays, &recipient(), message).unwrap();
    assert_ne!(hex::encode(p1.to_bytes()), hex::encode(p3.to_bytes()));
}

#[test]
fn deterministic_packet_round_trips() {
    let (keys, hops) = fixed_nodes();
    let delays = [0.1, 0.2, 0.3];
    let message = b"reference vector message";

    let mut rng = StdRng::from_seed([0x5a; 32]);
    let packet = new_packet(&mut rng, &hops, &delays, &recipient(), message).unwrap();

    let mut packet_bytes = packet.to_bytes();
    for (i, key) in keys.iter().enumerate() {
        let unwrapped = process_sphinx_packet(&packet_bytes, key).unwrap();
        if i == keys.len() - 1 {
            assert_eq!(unwrapped.packet.payload.as_slice(), &message[..]);
        } else {
            packet_bytes = unwrapped.packet.to_bytes();
        }
    }
}
