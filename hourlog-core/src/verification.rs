//! Email verification codes.
//!
//! A 6-digit code is bound to `(code, email, expiry)` with an
//! HMAC-SHA256 signature so verification is stateless: no server-side
//! session has to remember which code was issued.

use base64::prelude::*;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use thiserror::Error;

use crate::domain::normalize_email;

type HmacSha256 = Hmac<Sha256>;

/// Codes expire 10 minutes after issuance.
pub const CODE_TTL_MILLIS: i64 = 10 * 60 * 1000;

#[derive(Debug, Error, PartialEq)]
pub enum VerificationError {
    #[error("verification code is invalid")]
    SignatureMismatch,
    #[error("verification code has expired")]
    Expired,
}

/// A uniformly random 6-digit numeric code, zero-padded.
pub fn generate_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

/// Signs `(code, email, expiry)` with the shared secret. The email is
/// normalized (trim + lowercase) so the address the user typed at
/// signup and the one they verify with compare equal.
pub fn sign_code(secret: &[u8], code: &str, email: &str, expires_at_millis: i64) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(payload(code, email, expires_at_millis).as_bytes());
    BASE64_STANDARD.encode(mac.finalize().into_bytes())
}

/// Re-derives the signature and compares it in constant time, then
/// checks expiry. The signature check runs first: an attacker must not
/// learn whether a forged code would otherwise have been fresh.
pub fn verify_code(
    secret: &[u8],
    code: &str,
    email: &str,
    signature: &str,
    expires_at_millis: i64,
    now_millis: i64,
) -> Result<(), VerificationError> {
    let provided = BASE64_STANDARD
        .decode(signature)
        .map_err(|_| VerificationError::SignatureMismatch)?;

    let mut mac =
        HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(payload(code, email, expires_at_millis).as_bytes());
    mac.verify_slice(&provided)
        .map_err(|_| VerificationError::SignatureMismatch)?;

    if now_millis > expires_at_millis {
        return Err(VerificationError::Expired);
    }
    Ok(())
}

fn payload(code: &str, email: &str, expires_at_millis: i64) -> String {
    let email = normalize_email(email).unwrap_or_default();
    format!("{code}|{email}|{expires_at_millis}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn signature_verifies_immediately_after_signing() {
        let code = generate_code();
        let expires = 1_000_000;
        let signature = sign_code(SECRET, &code, "Trainee@Example.com", expires);
        assert_eq!(
            verify_code(SECRET, &code, "trainee@example.com", &signature, expires, 0),
            Ok(())
        );
    }

    #[test]
    fn mutating_any_input_breaks_verification() {
        let expires = 1_000_000;
        let signature = sign_code(SECRET, "123456", "trainee@example.com", expires);

        assert_eq!(
            verify_code(SECRET, "123457", "trainee@example.com", &signature, expires, 0),
            Err(VerificationError::SignatureMismatch)
        );
        assert_eq!(
            verify_code(SECRET, "123456", "other@example.com", &signature, expires, 0),
            Err(VerificationError::SignatureMismatch)
        );
        assert_eq!(
            verify_code(SECRET, "123456", "trainee@example.com", &signature, expires + 1, 0),
            Err(VerificationError::SignatureMismatch)
        );

        let mut bytes = BASE64_STANDARD.decode(&signature).unwrap();
        bytes[0] ^= 0x01;
        let tampered = BASE64_STANDARD.encode(&bytes);
        assert_eq!(
            verify_code(SECRET, "123456", "trainee@example.com", &tampered, expires, 0),
            Err(VerificationError::SignatureMismatch)
        );
    }

    #[test]
    fn expired_codes_are_rejected_after_the_signature_check() {
        let expires = 1_000;
        let signature = sign_code(SECRET, "123456", "trainee@example.com", expires);
        assert_eq!(
            verify_code(SECRET, "123456", "trainee@example.com", &signature, expires, expires + 1),
            Err(VerificationError::Expired)
        );
        // A tampered signature on an expired code still reports the
        // signature problem, not the expiry.
        assert_eq!(
            verify_code(SECRET, "999999", "trainee@example.com", &signature, expires, expires + 1),
            Err(VerificationError::SignatureMismatch)
        );
    }
}
