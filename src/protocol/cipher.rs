//! Write-key derivation.
//!
//! A `write` command must carry a `key` field proving knowledge of the
//! gateway password. The key is the gateway's latest token encrypted with
//! AES-128-CBC under the password and a fixed IV, hex encoded.
//!
//! Only complete 16-byte blocks of the token are encrypted and no padding
//! block is emitted. Gateway tokens are 16 ASCII characters, so in practice
//! the key is always one block (32 hex characters).

use aes::Aes128;
use aes::cipher::{BlockEncrypt, KeyInit};

/// AES block length in bytes.
pub const BLOCK_LEN: usize = 16;

/// Protocol-fixed initialization vector.
pub const IV: [u8; BLOCK_LEN] = [
    0x17, 0x99, 0x6d, 0x09, 0x3d, 0x28, 0xdd, 0xb3, 0xba, 0x69, 0x5a, 0x2e, 0x6f, 0x58, 0x56, 0x2e,
];

/// Key sent when no token has been observed for the gateway yet.
///
/// Gateways reject writes carrying this key. It is kept so the command is
/// still emitted on the wire the way existing deployments expect.
pub const FALLBACK_KEY: &str = "hello";

/// Encrypts `token` with `password` and returns the hex-encoded write key.
#[must_use]
pub fn derive_key(password: &[u8; BLOCK_LEN], token: &str) -> String {
    let cipher = Aes128::new(password.into());

    let mut chain = IV;
    let mut output = Vec::with_capacity(token.len());

    for chunk in token.as_bytes().chunks_exact(BLOCK_LEN) {
        let mut block = [0u8; BLOCK_LEN];
        for (out, (plain, prev)) in block.iter_mut().zip(chunk.iter().zip(chain.iter())) {
            *out = plain ^ prev;
        }
        cipher.encrypt_block((&mut block).into());
        output.extend_from_slice(&block);
        chain = block;
    }

    hex::encode(output)
}

/// Returns the write key for a gateway, falling back to [`FALLBACK_KEY`]
/// when the token is unknown.
#[must_use]
pub fn write_key(password: &[u8; BLOCK_LEN], token: Option<&str>) -> String {
    match token {
        Some(token) => derive_key(password, token),
        None => {
            tracing::warn!("no token known for gateway, sending placeholder key");
            FALLBACK_KEY.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSWORD: &[u8; 16] = b"0987654321qwerty";

    #[test]
    fn test_known_vector() {
        assert_eq!(
            derive_key(PASSWORD, "1234567890abcdef"),
            "3eb43e37c20aff4c5872cc0d04d81314"
        );
    }

    #[test]
    fn test_deterministic() {
        let a = derive_key(PASSWORD, "1234567890abcdef");
        let b = derive_key(PASSWORD, "1234567890abcdef");
        assert_eq!(a, b);
    }

    #[test]
    fn test_token_change_changes_key() {
        let a = derive_key(PASSWORD, "1234567890abcdef");
        let b = derive_key(PASSWORD, "fedcba0987654321");
        assert_eq!(b, "6c15012b37cc02837e3bc8c44d423dbe");
        assert_ne!(a, b);
    }

    #[test]
    fn test_partial_block_dropped() {
        assert_eq!(derive_key(PASSWORD, "short"), "");
        assert_eq!(derive_key(PASSWORD, "1234567890abcdefXY").len(), 32);
    }

    #[test]
    fn test_fallback_key() {
        assert_eq!(write_key(PASSWORD, None), FALLBACK_KEY);
        assert_eq!(write_key(PASSWORD, Some("1234567890abcdef")).len(), 32);
    }
}
