//! Inline signed-comment format: `<comment> rye:signed:<iso8601>:<sha256-hex>:<b64url-sig>:<key-fp>`.
//!
//! # Multiple signature lines
//!
//! Decision (spec §9 open question, pinned in `DESIGN.md`): when more than
//! one `rye:signed:` line is present, the *last one by file position* is
//! authoritative. Earlier signed-comment lines are left in the content and
//! count toward the hashed bytes like any other line — they are not
//! stripped before hashing.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::error::IntegrityError;

const MARKER: &str = "rye:signed:";
const LEGACY_MARKERS: &[&str] = &["rye:validated:", "kiwi-mcp:validated:"];
const TIMESTAMP_LEN: usize = 20; // "YYYY-MM-DDTHH:MM:SSZ"

/// A parsed signed-comment line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedComment {
    /// Signing timestamp.
    pub timestamp: DateTime<Utc>,
    /// Hex-encoded SHA-256 of the content at signing time.
    pub content_hash: String,
    /// Base64url-encoded Ed25519 signature.
    pub signature_b64: String,
    /// 16-hex-char fingerprint of the signing key.
    pub key_fingerprint: String,
}

/// Parse one line's `rye:signed:...` payload, ignoring whatever comment
/// marker precedes it (the host language's comment syntax is irrelevant
/// to parsing — we only look for the literal marker substring).
pub fn parse_signed_line(line: &str) -> Result<SignedComment, IntegrityError> {
    let idx = line
        .find(MARKER)
        .ok_or_else(|| IntegrityError::MalformedSignature(line.to_string()))?;
    let rest = &line[idx + MARKER.len()..];
    if rest.len() < TIMESTAMP_LEN + 1 {
        return Err(IntegrityError::MalformedSignature(line.to_string()));
    }
    let (ts_str, tail) = rest.split_at(TIMESTAMP_LEN);
    let tail = tail
        .strip_prefix(':')
        .ok_or_else(|| IntegrityError::MalformedSignature(line.to_string()))?;
    let mut parts = tail.trim_end().splitn(3, ':');
    let (hash, sig, fp) = match (parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(s), Some(f)) => (h, s, f),
        _ => return Err(IntegrityError::MalformedSignature(line.to_string())),
    };
    let timestamp = DateTime::parse_from_rfc3339(ts_str)
        .map_err(|e| IntegrityError::MalformedSignature(format!("bad timestamp: {e}")))?
        .with_timezone(&Utc);

    if hash.len() != 64 || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(IntegrityError::MalformedSignature(
            "content hash must be 64 hex chars".into(),
        ));
    }
    if fp.len() != 16 || !fp.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(IntegrityError::MalformedSignature(
            "key fingerprint must be 16 hex chars".into(),
        ));
    }

    Ok(SignedComment {
        timestamp,
        content_hash: hash.to_string(),
        signature_b64: sig.to_string(),
        key_fingerprint: fp.to_string(),
    })
}

/// Format a signed-comment line with the given host-language comment
/// marker (e.g. `#`, `//`, `--`).
pub fn format_signed_line(comment_marker: &str, comment: &SignedComment) -> String {
    format!(
        "{marker} {lit}{ts}:{hash}:{sig}:{fp}",
        marker = comment_marker,
        lit = MARKER,
        ts = comment.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        hash = comment.content_hash,
        sig = comment.signature_b64,
        fp = comment.key_fingerprint,
    )
}

/// Locate every line containing a legacy (rejected) signature marker.
fn legacy_line(line: &str) -> Option<&'static str> {
    LEGACY_MARKERS
        .iter()
        .find(|m| line.contains(**m))
        .copied()
}

/// Find the authoritative signed-comment line: the last `rye:signed:` line
/// by position. Returns the zero-based line index and the parsed comment.
pub fn latest_signed_comment(
    content: &str,
) -> Result<(usize, SignedComment), IntegrityError> {
    let mut found: Option<(usize, SignedComment)> = None;
    let mut saw_legacy = false;

    for (idx, line) in content.lines().enumerate() {
        if line.contains(MARKER) {
            match parse_signed_line(line) {
                Ok(sc) => found = Some((idx, sc)),
                Err(_) => continue,
            }
        } else if legacy_line(line).is_some() {
            saw_legacy = true;
        }
    }

    match found {
        Some(f) => Ok(f),
        None if saw_legacy => Err(IntegrityError::LegacyFormatRejected(
            "legacy rye:validated:/kiwi-mcp:validated: marker found, rejected".into(),
        )),
        None => Err(IntegrityError::SignatureMissing),
    }
}

/// Content hash input: the file with the authoritative signed-comment
/// line removed, all other lines (including earlier signature lines)
/// left intact, rejoined with `\n`.
pub fn content_without_signature_line(content: &str, sig_line_index: usize) -> String {
    content
        .lines()
        .enumerate()
        .filter(|(idx, _)| *idx != sig_line_index)
        .map(|(_, line)| line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_comment() -> SignedComment {
        SignedComment {
            timestamp: DateTime::parse_from_rfc3339("2024-01-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            content_hash: "a".repeat(64),
            signature_b64: "c2lnbmF0dXJl".to_string(),
            key_fingerprint: "0123456789abcdef".to_string(),
        }
    }

    #[test]
    fn format_then_parse_roundtrips() {
        let sc = sample_comment();
        let line = format_signed_line("#", &sc);
        let parsed = parse_signed_line(&line).unwrap();
        assert_eq!(parsed, sc);
    }

    #[test]
    fn latest_signed_comment_picks_last_line_by_position() {
        let sc1 = sample_comment();
        let mut sc2 = sample_comment();
        sc2.key_fingerprint = "fedcba9876543210".to_string();

        let content = format!(
            "# header\n{}\nbody text\n{}\n",
            format_signed_line("#", &sc1),
            format_signed_line("#", &sc2),
        );

        let (idx, latest) = latest_signed_comment(&content).unwrap();
        assert_eq!(latest.key_fingerprint, "fedcba9876543210");
        assert_eq!(content.lines().nth(idx).unwrap(), format_signed_line("#", &sc2));
    }

    #[test]
    fn earlier_signature_line_still_counts_toward_hash() {
        let sc1 = sample_comment();
        let mut sc2 = sample_comment();
        sc2.key_fingerprint = "fedcba9876543210".to_string();
        let first_line = format_signed_line("#", &sc1);
        let second_line = format_signed_line("#", &sc2);
        let content = format!("body\n{first_line}\nmore body\n{second_line}\n");

        let (idx, _) = latest_signed_comment(&content).unwrap();
        let without = content_without_signature_line(&content, idx);
        assert!(without.contains(&first_line));
        assert!(!without.contains(&second_line));
    }

    #[test]
    fn legacy_marker_is_rejected() {
        let content = "# rye:validated:2024-01-01:deadbeef\nbody\n";
        let err = latest_signed_comment(content).unwrap_err();
        assert!(matches!(err, IntegrityError::LegacyFormatRejected(_)));
    }

    #[test]
    fn missing_signature_is_reported() {
        let err = latest_signed_comment("just some content\n").unwrap_err();
        assert!(matches!(err, IntegrityError::SignatureMissing));
    }

    #[test]
    fn sha256_hex_is_deterministic() {
        assert_eq!(sha256_hex(b"hello"), sha256_hex(b"hello"));
        assert_ne!(sha256_hex(b"hello"), sha256_hex(b"world"));
    }
}
