//! GitHub webhook signatures (HMAC-SHA256).
//!
//! The signature arrives in the `X-Hub-Signature-256` header as
//! `sha256=<hex>` and covers the raw request body.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const PREFIX: &str = "sha256=";

/// Header value GitHub would send for `body` signed with `secret`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take any size key");
    mac.update(body);
    format!("{PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
}

/// Verify a signature header against `body` in constant time.
///
/// A header without the `sha256=` prefix or with invalid hex never verifies.
pub fn verify(secret: &str, body: &[u8], header: &str) -> bool {
    let Some(sig_hex) = header.strip_prefix(PREFIX) else {
        return false;
    };
    let Ok(sig_bytes) = hex::decode(sig_hex) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&sig_bytes).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        // Example from GitHub's webhook documentation.
        assert_eq!(
            sign("It's a Secret to Everybody", b"Hello, World!"),
            "sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17"
        );
    }

    #[test]
    fn test_verify() {
        let body = br#"{"repository":{"name":"api"}}"#;
        let header = sign("secret-a", body);

        assert!(verify("secret-a", body, &header));
        assert!(!verify("secret-b", body, &header));
        assert!(!verify("secret-a", b"tampered", &header));
    }

    #[test]
    fn test_malformed_headers() {
        let body = b"payload";
        let hex_only = sign("s", body).trim_start_matches(PREFIX).to_string();

        assert!(!verify("s", body, &hex_only));
        assert!(!verify("s", body, &format!("sha1={hex_only}")));
        assert!(!verify("s", body, "sha256=not-hex"));
        assert!(!verify("s", body, ""));
    }
}
