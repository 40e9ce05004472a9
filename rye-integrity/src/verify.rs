//! The atomic five-step verify algorithm from spec §4.A, and its
//! counterpart for producing a new signed comment.

use base64::Engine;
use std::sync::Arc;

use crate::error::IntegrityError;
use crate::keystore::{verify_with_public_key, KeyStore};
use crate::signing::{
    content_without_signature_line, format_signed_line, latest_signed_comment, sha256_hex,
    SignedComment,
};
use crate::trust::TrustStore;

fn b64url() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::URL_SAFE_NO_PAD
}

/// Verify `content`'s embedded signature against `trust_store`.
///
/// Steps, atomic (spec §4.A):
/// 1. extract latest signed line
/// 2. recompute sha256 over the content with that line removed
/// 3. compare hex
/// 4. look up the key fingerprint in the trust store
/// 5. Ed25519-verify the signature over the hashed content
///
/// Any failure yields a specific [`IntegrityError`] variant naming the
/// step that failed.
pub fn verify(content: &str, trust_store: &TrustStore) -> Result<SignedComment, IntegrityError> {
    let (line_idx, comment) = latest_signed_comment(content)?;

    let without_sig = content_without_signature_line(content, line_idx);
    let actual_hash = sha256_hex(without_sig.as_bytes());
    if actual_hash != comment.content_hash {
        return Err(IntegrityError::HashMismatch {
            expected: comment.content_hash.clone(),
            actual: actual_hash,
        });
    }

    if !trust_store.is_trusted(&comment.key_fingerprint) {
        return Err(IntegrityError::UntrustedFingerprint(
            comment.key_fingerprint.clone(),
        ));
    }

    let sig_bytes = b64url()
        .decode(&comment.signature_b64)
        .map_err(|e| IntegrityError::MalformedSignature(e.to_string()))?;

    // The signature covers the hashed content bytes, not the full file —
    // it's a signature over the same bytes that were hashed in step 2.
    let public_key = trust_store
        .public_key_of(&comment.key_fingerprint)
        .ok_or_else(|| IntegrityError::UntrustedFingerprint(comment.key_fingerprint.clone()))?;

    let valid = verify_with_public_key(&public_key, without_sig.as_bytes(), &sig_bytes)?;
    if !valid {
        return Err(IntegrityError::SignatureInvalid(comment.key_fingerprint.clone()));
    }

    Ok(comment)
}

/// Sign `content` (which must not already contain a signature line for
/// this pass — callers append the result as a new line), returning the
/// formatted signed-comment line to append.
pub async fn sign(
    content: &str,
    comment_marker: &str,
    fingerprint: &str,
    key_store: &Arc<dyn KeyStore>,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<String, IntegrityError> {
    let hash = sha256_hex(content.as_bytes());
    let signature = key_store.sign(fingerprint, content.as_bytes()).await?;
    let comment = SignedComment {
        timestamp: now,
        content_hash: hash,
        signature_b64: b64url().encode(signature),
        key_fingerprint: fingerprint.to_string(),
    };
    Ok(format_signed_line(comment_marker, &comment))
}
