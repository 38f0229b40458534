//! TOTP/HOTP (RFC 4226 / RFC 6238), HMAC-SHA1, matching the digits/period
//! used by common authenticator apps (§4.7, §6 `hotp.{totp, fixOtpKey}`).

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::error::Error;

type HmacSha1 = Hmac<Sha1>;

pub const DEFAULT_PERIOD_SECS: u64 = 30;
pub const DEFAULT_DIGITS: u32 = 6;

pub fn hotp(secret: &[u8], counter: u64, digits: u32) -> String {
    let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let truncated = ((digest[offset] as u32 & 0x7f) << 24)
        | ((digest[offset + 1] as u32) << 16)
        | ((digest[offset + 2] as u32) << 8)
        | (digest[offset + 3] as u32);

    let modulus = 10u32.pow(digits);
    format!("{:0width$}", truncated % modulus, width = digits as usize)
}

pub fn totp_at(secret: &[u8], time: SystemTime, period_secs: u64, digits: u32) -> String {
    let unix = time
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    hotp(secret, unix / period_secs, digits)
}

/// Decodes `secret_base32` (a user-facing `otpKey`) and produces the current
/// TOTP code at the default period/digits.
pub fn totp(secret_base32: &str) -> Result<String, Error> {
    let secret = crate::crypto::codecs::base32_decode(&fix_otp_key(secret_base32))?;
    Ok(totp_at(&secret, SystemTime::now(), DEFAULT_PERIOD_SECS, DEFAULT_DIGITS))
}

/// §6 `fixOtpKey`: normalize a user-typed/scanned otp secret before
/// base32-decoding — strip whitespace and hyphens, uppercase.
pub fn fix_otp_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .flat_map(char::to_uppercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 4226 Appendix D test vectors, secret = ASCII "12345678901234567890".
    const RFC4226_SECRET: &[u8] = b"12345678901234567890";
    const RFC4226_CODES: [&str; 10] = [
        "755224", "287082", "359152", "969429", "338314", "254676", "287922", "162583", "399871", "520489",
    ];

    #[test]
    fn hotp_matches_rfc4226_vectors() {
        for (counter, expected) in RFC4226_CODES.iter().enumerate() {
            assert_eq!(hotp(RFC4226_SECRET, counter as u64, 6), *expected);
        }
    }

    #[test]
    fn totp_matches_rfc6238_vector_at_time_59() {
        // RFC 6238 Appendix B, SHA1 secret, T=59 -> T0/X = 1 -> "94287082"
        // truncated to 8 digits in the RFC; this crate defaults to 6 digits,
        // so compare against the low-order 6 digits of the published vector.
        let code = totp_at(RFC4226_SECRET, UNIX_EPOCH + std::time::Duration::from_secs(59), 30, 8);
        assert_eq!(code, "94287082");
    }

    #[test]
    fn fix_otp_key_strips_whitespace_hyphens_and_uppercases() {
        assert_eq!(fix_otp_key(" ab cd-ef "), "ABCDEF");
    }
}
