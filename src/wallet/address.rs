//! Lisk32 address derivation.
//!
//! An address is the first 20 bytes of `SHA-256(publicKey)`, regrouped into
//! 5-bit words, followed by a 6-word BCH checksum and rendered with the Lisk32
//! alphabet behind the `lsk` prefix.

use sha2::{Digest, Sha256};

pub const LISK32_PREFIX: &str = "lsk";
const CHARSET: &[u8; 32] = b"zxvcpmbn3465o978uyrtkqew2adsjhfg";
const GENERATOR: [u32; 5] = [0x3b6a57b2, 0x26508e6d, 0x1ea119fa, 0x3d4233dd, 0x2a1462b3];
const ADDRESS_LENGTH: usize = 20;
const CHECKSUM_LENGTH: usize = 6;

fn polymod(values: &[u8]) -> u32 {
    let mut chk: u32 = 1;
    for &value in values {
        let top = chk >> 25;
        chk = ((chk & 0x1ff_ffff) << 5) ^ value as u32;
        for (i, generator) in GENERATOR.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= generator;
            }
        }
    }
    chk
}

fn create_checksum(words: &[u8]) -> [u8; CHECKSUM_LENGTH] {
    let mut values = words.to_vec();
    values.extend_from_slice(&[0; CHECKSUM_LENGTH]);
    let modulo = polymod(&values) ^ 1;
    let mut checksum = [0u8; CHECKSUM_LENGTH];
    for (p, word) in checksum.iter_mut().enumerate() {
        *word = ((modulo >> (5 * (5 - p))) & 31) as u8;
    }
    checksum
}

/// Regroups 8-bit bytes into 5-bit words, zero-padding the final word.
fn to_words(bytes: &[u8]) -> Vec<u8> {
    let mut acc: u32 = 0;
    let mut bits = 0;
    let mut words = Vec::with_capacity((bytes.len() * 8 + 4) / 5);
    for &byte in bytes {
        acc = (acc << 8) | byte as u32;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            words.push(((acc >> bits) & 31) as u8);
        }
    }
    if bits > 0 {
        words.push(((acc << (5 - bits)) & 31) as u8);
    }
    words
}

/// Derives the Lisk32 address for a raw public key.
pub fn lisk32_address_from_public_key(public_key: &[u8]) -> String {
    let digest = Sha256::digest(public_key);
    lisk32_address_from_address(&digest[..ADDRESS_LENGTH])
}

/// Encodes a 20-byte binary address as Lisk32.
pub fn lisk32_address_from_address(address: &[u8]) -> String {
    let words = to_words(address);
    let checksum = create_checksum(&words);
    let mut encoded = String::with_capacity(LISK32_PREFIX.len() + words.len() + CHECKSUM_LENGTH);
    encoded.push_str(LISK32_PREFIX);
    for word in words.iter().chain(checksum.iter()) {
        encoded.push(CHARSET[*word as usize] as char);
    }
    encoded
}

/// Checks prefix, alphabet, length and checksum of a Lisk32 address.
pub fn is_valid_lisk32_address(address: &str) -> bool {
    let Some(body) = address.strip_prefix(LISK32_PREFIX) else {
        return false;
    };
    if body.len() != 32 + CHECKSUM_LENGTH {
        return false;
    }
    let words: Option<Vec<u8>> = body
        .bytes()
        .map(|c| CHARSET.iter().position(|&x| x == c).map(|p| p as u8))
        .collect();
    match words {
        Some(words) => polymod(&words) == 1,
        None => false,
    }
}
