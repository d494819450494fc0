use super::*;

const NOW: i64 = 1_700_000_000;

fn verifier() -> SignatureVerifier {
    SignatureVerifier::new("8f742231b10e8888abcd99yyyzzz85a5")
}

#[test]
fn accepts_body_signed_with_same_secret() {
    let body = b"token=abc&payload=%7B%7D";
    let signature = verifier().sign("1700000000", body).expect("sign");
    assert!(signature.starts_with("v0="));

    verifier()
        .verify_at(Some("1700000000"), Some(&signature), body, NOW)
        .expect("valid signature");
}

#[test]
fn rejects_tampered_body() {
    let signature = verifier().sign("1700000000", b"original").expect("sign");
    let err = verifier()
        .verify_at(Some("1700000000"), Some(&signature), b"tampered", NOW)
        .expect_err("should fail");
    assert_eq!(err, SignatureError::Mismatch);
}

#[test]
fn rejects_signature_from_other_secret() {
    let signature = SignatureVerifier::new("other-secret")
        .sign("1700000000", b"body")
        .expect("sign");
    let err = verifier()
        .verify_at(Some("1700000000"), Some(&signature), b"body", NOW)
        .expect_err("should fail");
    assert_eq!(err, SignatureError::Mismatch);
}

#[test]
fn rejects_replayed_timestamp() {
    let stale = (NOW - MAX_CLOCK_SKEW_SECONDS - 1).to_string();
    let signature = verifier().sign(&stale, b"body").expect("sign");
    let err = verifier()
        .verify_at(Some(&stale), Some(&signature), b"body", NOW)
        .expect_err("should fail");
    assert_eq!(err, SignatureError::StaleTimestamp);
}

#[test]
fn reports_missing_and_malformed_headers() {
    assert_eq!(
        verifier().verify_at(None, Some("v0=00"), b"", NOW),
        Err(SignatureError::MissingHeader(TIMESTAMP_HEADER))
    );
    assert_eq!(
        verifier().verify_at(Some("1700000000"), None, b"", NOW),
        Err(SignatureError::MissingHeader(SIGNATURE_HEADER))
    );
    assert_eq!(
        verifier().verify_at(Some("yesterday"), Some("v0=00"), b"", NOW),
        Err(SignatureError::MalformedTimestamp)
    );
    assert_eq!(
        verifier().verify_at(Some("1700000000"), Some("v1=00"), b"", NOW),
        Err(SignatureError::MalformedSignature)
    );
    assert_eq!(
        verifier().verify_at(Some("1700000000"), Some("v0=not-hex"), b"", NOW),
        Err(SignatureError::MalformedSignature)
    );
}

#[test]
fn empty_secret_never_verifies() {
    let err = SignatureVerifier::new("")
        .verify_at(Some("1700000000"), Some("v0=00"), b"", NOW)
        .expect_err("should fail");
    assert_eq!(err, SignatureError::MissingSecret);
}

#[test]
fn extreme_timestamps_are_stale_not_fatal() {
    for timestamp in ["-9223372036854775808", "9223372036854775807"] {
        assert_eq!(
            verifier().verify_at(Some(timestamp), Some("v0=00"), b"{}", NOW),
            Err(SignatureError::StaleTimestamp),
            "timestamp {timestamp}"
        );
    }
}
