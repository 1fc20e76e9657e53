//! Time-based one-time passwords (RFC 6238, HMAC-SHA1).
//!
//! The storefront uses the authenticator-app defaults: a base32 seed,
//! 30 second steps and 6 digits.

use std::time::{SystemTime, UNIX_EPOCH};

use data_encoding::BASE32_NOPAD;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::error::{Error, Result};

type HmacSha1 = Hmac<Sha1>;

/// Number of digits in a code (and of input cells on the OTP form).
pub const TOTP_DIGITS: usize = 6;

/// Length of one time step in seconds.
pub const TOTP_STEP_SECS: u64 = 30;

/// A TOTP generator for one seed.
#[derive(Clone)]
pub struct Totp {
    mac: HmacSha1,
}

impl std::fmt::Debug for Totp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Totp").finish_non_exhaustive()
    }
}

impl Totp {
    /// Builds a generator from a base32 seed.
    ///
    /// Whitespace, lowercase letters and `=` padding are accepted.
    pub fn from_base32(secret: &str) -> Result<Self> {
        let key = decode_base32(secret)?;
        if key.is_empty() {
            return Err(Error::Totp("secret is empty".into()));
        }
        let mac = HmacSha1::new_from_slice(&key).map_err(|e| Error::Totp(e.to_string()))?;
        Ok(Self { mac })
    }

    /// Code for the time step containing `unix_seconds`.
    pub fn code_at(&self, unix_seconds: u64) -> String {
        let counter = unix_seconds / TOTP_STEP_SECS;
        hotp(self.mac.clone(), counter)
    }

    /// Code for the current system time.
    pub fn now(&self) -> Result<String> {
        Ok(self.code_at(unix_now()?))
    }
}

/// Seconds until the code computed at `unix_seconds` rotates.
pub fn seconds_remaining(unix_seconds: u64) -> u64 {
    TOTP_STEP_SECS - unix_seconds % TOTP_STEP_SECS
}

/// Current unix time in seconds.
pub fn unix_now() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| Error::Session(format!("system clock before unix epoch: {e}")))
}

fn hotp(mut mac: HmacSha1, counter: u64) -> String {
    mac.update(&counter.to_be_bytes());
    let hash = mac.finalize().into_bytes();

    let offset = (hash[hash.len() - 1] & 0x0f) as usize;
    let binary = (u32::from(hash[offset] & 0x7f) << 24)
        | (u32::from(hash[offset + 1]) << 16)
        | (u32::from(hash[offset + 2]) << 8)
        | u32::from(hash[offset + 3]);

    let code = binary % 10u32.pow(TOTP_DIGITS as u32);
    format!("{code:0width$}", width = TOTP_DIGITS)
}

/// Decodes a seed as shown by authenticator apps: case, spacing and `=`
/// padding are ignored.
fn decode_base32(input: &str) -> Result<Vec<u8>> {
    let normalized: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    BASE32_NOPAD
        .decode(normalized.as_bytes())
        .map_err(|e| Error::Totp(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 6238 appendix B seed ("12345678901234567890") in base32.
    const RFC_SEED: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn rfc6238_vectors() {
        let totp = Totp::from_base32(RFC_SEED).unwrap();
        let cases = [
            (59, "287082"),
            (1_111_111_109, "081804"),
            (1_111_111_111, "050471"),
            (1_234_567_890, "005924"),
            (2_000_000_000, "279037"),
            (20_000_000_000, "353130"),
        ];
        for (time, expected) in cases {
            assert_eq!(totp.code_at(time), expected, "t={time}");
        }
    }

    #[test]
    fn codes_are_six_digits_and_deterministic() {
        let totp = Totp::from_base32("JBSWY3DPEHPK3PXP").unwrap();
        for t in [0u64, 29, 30, 1_700_000_000, 1_700_000_029] {
            let code = totp.code_at(t);
            assert_eq!(code.len(), TOTP_DIGITS);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_eq!(code, totp.code_at(t));
        }
        assert_eq!(totp.code_at(30), totp.code_at(59));
    }

    #[test]
    fn seed_formatting_is_lenient() {
        let canonical = Totp::from_base32(RFC_SEED).unwrap();
        let spaced = Totp::from_base32("gezd gnbv gy3t qojq gezd gnbv gy3t qojq").unwrap();
        assert_eq!(canonical.code_at(59), spaced.code_at(59));
    }

    #[test]
    fn decode_known_value() {
        assert_eq!(decode_base32("MZXW6YTBOI======").unwrap(), b"foobar");
    }

    #[test]
    fn invalid_seeds_are_rejected() {
        assert!(matches!(Totp::from_base32("not-base32!"), Err(Error::Totp(_))));
        assert!(matches!(Totp::from_base32("  "), Err(Error::Totp(_))));
    }

    #[test]
    fn remaining_seconds_within_step() {
        assert_eq!(seconds_remaining(0), 30);
        assert_eq!(seconds_remaining(29), 1);
        assert_eq!(seconds_remaining(30), 30);
    }

    #[test]
    fn debug_hides_key() {
        let totp = Totp::from_base32(RFC_SEED).unwrap();
        assert!(!format!("{totp:?}").contains("GEZD"));
    }
}
