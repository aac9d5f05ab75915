//! Word redaction.

use shared_types::REDACTION_MARKER;

/// Result of redacting one message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redaction {
    pub body: String,
    /// Number of tokens replaced.
    pub redacted: usize,
}

/// Replace every whitespace-separated token for which `is_denied` holds
/// with the redaction marker, and rejoin the tokens with single spaces.
///
/// Tokens are looked up exactly as they appear: `bad,` and `bad` are
/// different words.
pub fn redact<F>(body: &str, is_denied: F) -> Redaction
where
    F: Fn(&str) -> bool,
{
    let mut redacted = 0;
    let tokens: Vec<&str> = body
        .split_whitespace()
        .map(|token| {
            if is_denied(token) {
                redacted += 1;
                REDACTION_MARKER
            } else {
                token
            }
        })
        .collect();

    Redaction {
        body: tokens.join(" "),
        redacted,
    }
}
