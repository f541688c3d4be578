//! VNC authentication (RFB security type 2).
//!
//! The server sends a 16-byte random challenge. The client encrypts it as two
//! independent DES-ECB blocks and returns the 16-byte result. The key is the
//! password truncated or zero-padded to 8 bytes, with the bit order of every
//! key byte reversed.

use crate::messages::types::VNC_AUTH_CHALLENGE_LEN;
use des::cipher::generic_array::GenericArray;
use des::cipher::{BlockEncrypt, KeyInit};
use des::Des;

/// Number of password bytes that take part in the key.
pub const VNC_KEY_LEN: usize = 8;

/// Derive the DES key from a password.
pub fn vnc_key(password: &str) -> [u8; VNC_KEY_LEN] {
    let mut key = [0u8; VNC_KEY_LEN];
    for (slot, &b) in key.iter_mut().zip(password.as_bytes()) {
        *slot = b.reverse_bits();
    }
    key
}

/// Compute the response to a VNC authentication challenge.
pub fn vnc_auth_response(
    password: &str,
    challenge: &[u8; VNC_AUTH_CHALLENGE_LEN],
) -> [u8; VNC_AUTH_CHALLENGE_LEN] {
    let cipher = Des::new(&GenericArray::from(vnc_key(password)));

    let mut response = *challenge;
    for block in response.chunks_exact_mut(8) {
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
    }
    response
}
