use anyhow::{Context, Result, bail};
use egc::Settings;
use egc::totp::{Totp, seconds_remaining, unix_now};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpReport {
    pub code: String,
    pub valid_for: u64,
}

/// Computes the code for `at`, or for the current time.
pub fn otp_report(settings: &Settings, at: Option<u64>) -> Result<OtpReport> {
    let Some(secret) = settings.credentials.totp_secret.as_ref() else {
        bail!("no TOTP secret configured (EPIC_TOTP_SECRET)");
    };
    let totp = Totp::from_base32(secret.expose()).context("configured TOTP secret is unusable")?;
    let at = match at {
        Some(at) => at,
        None => unix_now()?,
    };
    Ok(OtpReport {
        code: totp.code_at(at),
        valid_for: seconds_remaining(at),
    })
}

pub fn execute(settings: &Settings, at: Option<u64>) -> Result<bool> {
    let report = otp_report(settings, at)?;
    println!("{} (valid for {}s)", report.code, report.valid_for);
    Ok(true)
}
