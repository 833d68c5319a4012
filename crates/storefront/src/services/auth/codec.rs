//! Compact token segments: URL-safe base64 and HMAC-SHA256 signatures.

use base64::{
    Engine, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// URL-safe alphabet, no padding on encode, padding optional on decode.
const SEGMENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode bytes as one token segment.
#[must_use]
pub fn encode_segment(bytes: impl AsRef<[u8]>) -> String {
    SEGMENT.encode(bytes)
}

/// Decode one token segment, with or without trailing `=` padding.
///
/// # Errors
///
/// Returns `base64::DecodeError` for characters outside the URL-safe alphabet
/// or an impossible length.
pub fn decode_segment(segment: &str) -> Result<Vec<u8>, base64::DecodeError> {
    SEGMENT.decode(segment)
}

/// HMAC-SHA256 of `message` under `secret`, encoded as a segment.
///
/// # Errors
///
/// Returns `InvalidLength` if the key is rejected; HMAC accepts keys of any
/// length, so this only surfaces through a broken digest implementation.
pub fn sign(message: &str, secret: &[u8]) -> Result<String, hmac::digest::InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret)?;
    mac.update(message.as_bytes());
    Ok(encode_segment(mac.finalize().into_bytes()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_is_url_safe_without_padding() {
        // 0xfb 0xff encodes to "+/8=" in the standard alphabet
        assert_eq!(encode_segment([0xfb, 0xff]), "-_8");
        assert_eq!(encode_segment(b"a"), "YQ");
    }

    #[test]
    fn test_decode_accepts_padding_either_way() {
        assert_eq!(decode_segment("YQ").unwrap(), b"a");
        assert_eq!(decode_segment("YQ==").unwrap(), b"a");
        assert_eq!(decode_segment("-_8").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn test_decode_rejects_standard_alphabet() {
        assert!(decode_segment("+/8").is_err());
        assert!(decode_segment("not base64!").is_err());
    }

    #[test]
    fn test_sign_known_vector() {
        // RFC 4231 test case 2
        let sig = sign("what do ya want for nothing?", b"Jefe").unwrap();
        let raw = decode_segment(&sig).unwrap();
        assert_eq!(
            hex::encode(raw),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
        assert!(!sig.contains('='));
    }

    #[test]
    fn test_sign_depends_on_secret() {
        let a = sign("header.payload", b"first-key").unwrap();
        let b = sign("header.payload", b"second-key").unwrap();
        assert_ne!(a, b);
    }
}
