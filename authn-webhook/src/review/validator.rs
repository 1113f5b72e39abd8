use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use thiserror::Error;

/// Reasons a credential is refused before GitHub is asked
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    #[error("token is empty")]
    EmptyCredential,
    #[error("token is unsupported format (JWT).")]
    UnsupportedFormat,
}

/// Refuses credentials that can never be a GitHub token.
pub fn validate(credential: &str) -> Result<(), RejectionReason> {
    if credential.is_empty() {
        return Err(RejectionReason::EmptyCredential);
    }
    if looks_like_jwt(credential) {
        return Err(RejectionReason::UnsupportedFormat);
    }
    Ok(())
}

/// Three dot separated unpadded base64url segments, the first of which
/// decodes to a JSON object. The signature is not verified.
fn looks_like_jwt(credential: &str) -> bool {
    let segments: Vec<&str> = credential.split('.').collect();
    let [header, claims, signature] = segments.as_slice() else {
        return false;
    };

    let Ok(header) = URL_SAFE_NO_PAD.decode(header) else {
        return false;
    };
    if URL_SAFE_NO_PAD.decode(claims).is_err() || URL_SAFE_NO_PAD.decode(signature).is_err() {
        return false;
    }
    matches!(
        serde_json::from_slice::<serde_json::Value>(&header),
        Ok(serde_json::Value::Object(_))
    )
}
