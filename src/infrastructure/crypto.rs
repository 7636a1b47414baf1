//! Small cryptographic helpers shared by keys, verification codes and webhooks

use hmac::{Hmac, Mac};
use rand::{distributions::Uniform, Rng};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Constant-time string comparison to prevent timing attacks
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Hex-encoded HMAC-SHA256 of `payload`
pub fn hmac_sha256_hex(secret: &str, payload: &[u8]) -> String {
    // HMAC accepts keys of any length
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC can take key of any size"),
    };
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Random code over `A-Z0-9`, each character drawn uniformly
pub fn random_code(length: usize) -> String {
    let dist = Uniform::from(0..CODE_ALPHABET.len());
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| CODE_ALPHABET[rng.sample(dist)] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "abcd"));
        assert!(constant_time_eq("", ""));
    }

    #[test]
    fn test_hmac_sha256_hex() {
        // RFC 4231 test case 2
        assert_eq!(
            hmac_sha256_hex("Jefe", b"what do ya want for nothing?"),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_random_code() {
        let code = random_code(6);

        assert_eq!(code.len(), 6);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        assert_eq!(random_code(0), "");
    }

    #[test]
    fn test_random_codes_differ() {
        let codes: std::collections::HashSet<String> = (0..20).map(|_| random_code(12)).collect();
        assert!(codes.len() > 1);
    }
}
