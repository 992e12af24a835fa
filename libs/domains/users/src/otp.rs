//! Six-digit one-time codes. Only the SHA-256 hex digest is stored.

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

pub const OTP_LENGTH: usize = 6;

/// Wrong guesses allowed before the pending code is discarded
pub const MAX_ATTEMPTS: i32 = 5;

/// A freshly minted code. `code` goes into the email, `hash` into the row.
#[derive(Clone)]
pub struct IssuedOtp {
    pub code: String,
    pub hash: String,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for IssuedOtp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedOtp")
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

pub fn issue(ttl: Duration) -> IssuedOtp {
    let code = format!("{:06}", rand::random_range(0..1_000_000u32));
    let hash = hash_code(&code);
    IssuedOtp {
        code,
        hash,
        expires_at: Utc::now() + ttl,
    }
}

pub fn hash_code(code: &str) -> String {
    const_hex::encode(Sha256::digest(code.trim().as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_six_digits() {
        for _ in 0..50 {
            let otp = issue(Duration::minutes(10));
            assert_eq!(otp.code.len(), OTP_LENGTH);
            assert!(otp.code.chars().all(|c| c.is_ascii_digit()));
            assert_eq!(otp.hash, hash_code(&otp.code));
        }
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let hash = hash_code("123456");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_code(" 123456 "));
        assert_ne!(hash, hash_code("123457"));
    }

    #[test]
    fn test_debug_hides_code() {
        let rendered = format!("{:?}", issue(Duration::minutes(1)));
        assert!(!rendered.contains("code"));
        assert!(!rendered.contains("hash"));
    }
}
