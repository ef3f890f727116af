// src/tools/breach.rs
use sha1::{Digest, Sha1};
use thiserror::Error;

const RANGE_API: &str = "https://api.pwnedpasswords.com/range";

#[derive(Debug, Error)]
pub enum BreachError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Unexpected response status: {0}")]
    BadStatus(reqwest::StatusCode),
}

#[derive(Debug, Clone, Copy)]
pub struct BreachReport {
    pub breached: bool,
    pub times_seen: u64,
}

// Split a secret's SHA-1 into the 5-char prefix sent to the range API
// and the suffix that never leaves this process
fn hash_prefix_suffix(secret: &str) -> (String, String) {
    let hash = hex::encode_upper(Sha1::digest(secret.as_bytes()));
    let (prefix, suffix) = hash.split_at(5);
    (prefix.to_string(), suffix.to_string())
}

// Scan a range response ("SUFFIX:COUNT" per line) for our suffix
fn match_suffix(body: &str, suffix: &str) -> Option<u64> {
    for line in body.lines() {
        let mut parts = line.trim().splitn(2, ':');
        let candidate = parts.next()?;
        if candidate.eq_ignore_ascii_case(suffix) {
            return Some(parts.next().and_then(|c| c.parse().ok()).unwrap_or(0));
        }
    }
    None
}

/// k-anonymity breach lookup: only the first 5 hex characters of the
/// secret's SHA-1 are sent to the remote service.
pub async fn check_secret(secret: &str) -> Result<BreachReport, BreachError> {
    let (prefix, suffix) = hash_prefix_suffix(secret);

    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/{}", RANGE_API, prefix))
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(BreachError::BadStatus(response.status()));
    }

    let body = response.text().await?;

    match match_suffix(&body, &suffix) {
        Some(times_seen) => Ok(BreachReport {
            breached: true,
            times_seen,
        }),
        None => Ok(BreachReport {
            breached: false,
            times_seen: 0,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_split_matches_known_vector() {
        // SHA-1("password") = 5BAA61E4C9B93F3F0682250B6CF8331B7EE68FD8
        let (prefix, suffix) = hash_prefix_suffix("password");
        assert_eq!(prefix, "5BAA6");
        assert_eq!(suffix, "1E4C9B93F3F0682250B6CF8331B7EE68FD8");
        assert_eq!(prefix.len(), 5);
        assert_eq!(suffix.len(), 35);
    }

    #[test]
    fn suffix_matching_parses_range_lines() {
        let body = "0018A45C4D1DEF81644B54AB7F969B88D65:1\r\n\
                    1E4C9B93F3F0682250B6CF8331B7EE68FD8:3861493\r\n\
                    011053FD0102E94D6AE2F8B83D76FAF94F6:13";

        assert_eq!(
            match_suffix(body, "1E4C9B93F3F0682250B6CF8331B7EE68FD8"),
            Some(3861493)
        );
        // Case-insensitive on the hex digits
        assert_eq!(
            match_suffix(body, "1e4c9b93f3f0682250b6cf8331b7ee68fd8"),
            Some(3861493)
        );
        assert_eq!(match_suffix(body, "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF"), None);
        assert_eq!(match_suffix("", "ABC"), None);
    }

    #[test]
    fn malformed_counts_still_count_as_breached() {
        let body = "1E4C9B93F3F0682250B6CF8331B7EE68FD8:not-a-number";
        assert_eq!(
            match_suffix(body, "1E4C9B93F3F0682250B6CF8331B7EE68FD8"),
            Some(0)
        );
    }
}
