//! Per-session anti-forgery tokens for destructive form submissions.

use std::fmt::Write;

use sha2::{Digest, Sha256};
use tablekeeper_core::{AppError, AppResult};

/// Generates a random 32-byte token encoded as lowercase hex.
pub fn issue_token() -> AppResult<String> {
    let mut bytes = [0u8; 32];
    getrandom::fill(&mut bytes).map_err(|error| {
        AppError::Internal(format!("failed to generate anti-forgery token: {error}"))
    })?;

    Ok(to_hex(&bytes))
}

/// Checks a submitted token against the one stored in the session.
///
/// Missing or empty tokens never verify. Digests are compared without
/// short-circuiting on the first differing byte.
pub fn verify_token(expected: Option<&str>, submitted: Option<&str>) -> AppResult<()> {
    let (Some(expected), Some(submitted)) = (expected, submitted) else {
        return Err(AppError::SecurityCheckFailed(
            "anti-forgery token is missing".to_owned(),
        ));
    };

    if expected.is_empty() || submitted.is_empty() {
        return Err(AppError::SecurityCheckFailed(
            "anti-forgery token is missing".to_owned(),
        ));
    }

    let expected_digest = Sha256::digest(expected.as_bytes());
    let submitted_digest = Sha256::digest(submitted.as_bytes());
    let difference = expected_digest
        .iter()
        .zip(submitted_digest.iter())
        .fold(0u8, |acc, (left, right)| acc | (left ^ right));

    if difference != 0 {
        return Err(AppError::SecurityCheckFailed(
            "anti-forgery token does not match the session".to_owned(),
        ));
    }

    Ok(())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        })
}
