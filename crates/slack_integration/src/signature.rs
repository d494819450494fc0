//! Request signing check for inbound platform callbacks.
//!
//! The platform signs `v0:<timestamp>:<raw body>` with HMAC-SHA256 keyed by the
//! app's signing secret and sends the hex digest as `v0=<hex>`.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
const SIGNATURE_VERSION: &str = "v0";
/// Requests older (or further in the future) than this are replays.
pub const MAX_CLOCK_SKEW_SECONDS: i64 = 60 * 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing {0} header")]
    MissingHeader(&'static str),
    #[error("malformed request timestamp")]
    MalformedTimestamp,
    #[error("request timestamp outside the accepted window")]
    StaleTimestamp,
    #[error("malformed signature")]
    MalformedSignature,
    #[error("signature mismatch")]
    Mismatch,
    #[error("signing secret is not configured")]
    MissingSecret,
}

#[derive(Clone)]
pub struct SignatureVerifier {
    signing_secret: String,
}

impl SignatureVerifier {
    pub fn new(signing_secret: impl Into<String>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
        }
    }

    pub fn verify(
        &self,
        timestamp: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<(), SignatureError> {
        self.verify_at(timestamp, signature, body, Utc::now().timestamp())
    }

    pub fn verify_at(
        &self,
        timestamp: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
        now: i64,
    ) -> Result<(), SignatureError> {
        if self.signing_secret.is_empty() {
            return Err(SignatureError::MissingSecret);
        }
        let timestamp = timestamp.ok_or(SignatureError::MissingHeader(TIMESTAMP_HEADER))?;
        let signature = signature.ok_or(SignatureError::MissingHeader(SIGNATURE_HEADER))?;

        let sent_at: i64 = timestamp
            .trim()
            .parse()
            .map_err(|_| SignatureError::MalformedTimestamp)?;
        let skewed = now
            .checked_sub(sent_at)
            .map_or(true, |skew| skew.abs() > MAX_CLOCK_SKEW_SECONDS);
        if skewed {
            return Err(SignatureError::StaleTimestamp);
        }

        let digest_hex = signature
            .trim()
            .strip_prefix(SIGNATURE_VERSION)
            .and_then(|rest| rest.strip_prefix('='))
            .ok_or(SignatureError::MalformedSignature)?;
        let digest = hex::decode(digest_hex).map_err(|_| SignatureError::MalformedSignature)?;

        self.mac_for(timestamp.trim(), body)?
            .verify_slice(&digest)
            .map_err(|_| SignatureError::Mismatch)
    }

    /// Produces the `v0=<hex>` header value for a body; used by callers that
    /// need to sign requests themselves (tests, local replay tooling).
    pub fn sign(&self, timestamp: &str, body: &[u8]) -> Result<String, SignatureError> {
        let digest = self.mac_for(timestamp, body)?.finalize().into_bytes();
        Ok(format!("{SIGNATURE_VERSION}={}", hex::encode(digest)))
    }

    fn mac_for(&self, timestamp: &str, body: &[u8]) -> Result<HmacSha256, SignatureError> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.signing_secret.as_bytes())
            .map_err(|_| SignatureError::MissingSecret)?;
        mac.update(SIGNATURE_VERSION.as_bytes());
        mac.update(b":");
        mac.update(timestamp.as_bytes());
        mac.update(b":");
        mac.update(body);
        Ok(mac)
    }
}

#[cfg(test)]
#[path = "tests/signature_tests.rs"]
mod tests;
