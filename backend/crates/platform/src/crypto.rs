//! Cryptographic Utilities

use base64::{Engine, engine::general_purpose};
use hmac::{Hmac, Mac};
use rand::{RngCore, rngs::OsRng};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Random 32-byte key, e.g. a session signing secret for local runs
pub fn random_key() -> [u8; 32] {
    let mut key = [0u8; 32];
    OsRng.fill_bytes(&mut key);
    key
}

pub fn to_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

pub fn from_base64(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD.decode(s)
}

/// URL-safe base64 without padding, suitable for cookies and headers
pub fn to_base64url(bytes: &[u8]) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

pub fn from_base64url(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::URL_SAFE_NO_PAD.decode(s)
}

/// HMAC-SHA256 tag over `data`
pub fn hmac_sign(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().into()
}

/// Verify an HMAC-SHA256 tag in constant time
pub fn hmac_verify(key: &[u8], data: &[u8], tag: &[u8]) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return false;
    };
    mac.update(data);
    mac.verify_slice(tag).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_key() {
        let key = random_key();
        assert!(key.iter().any(|&b| b != 0));
        assert_ne!(key, random_key());
    }

    #[test]
    fn test_base64_roundtrip() {
        let data = [0xfbu8, 0xff, 0x00, 0x10];
        assert_eq!(from_base64(&to_base64(&data)).unwrap(), data);

        let url = to_base64url(&data);
        assert!(!url.contains('+') && !url.contains('/') && !url.contains('='));
        assert_eq!(from_base64url(&url).unwrap(), data);
    }

    #[test]
    fn test_hmac_rfc4231_case_2() {
        let tag = hmac_sign(b"Jefe", b"what do ya want for nothing?");
        let expected =
            hex::decode("5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843")
                .unwrap();
        assert_eq!(tag.to_vec(), expected);
    }

    #[test]
    fn test_hmac_verify() {
        let key = [42u8; 32];
        let tag = hmac_sign(&key, b"session");
        assert!(hmac_verify(&key, b"session", &tag));
        assert!(!hmac_verify(&key, b"sessions", &tag));
        assert!(!hmac_verify(&[7u8; 32], b"session", &tag));
        assert!(!hmac_verify(&key, b"session", &tag[..16]));
    }
}
