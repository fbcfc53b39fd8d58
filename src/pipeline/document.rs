//! Pure text transforms applied to a source file: removing a previous
//! documentation block, wrapping new documentation, and fingerprinting the
//! content that is sent to the model.

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

/// One or more `/* ... */` blocks at the very start of the file, each with
/// the spaces and single line break that follow it. Non-greedy so a block
/// ends at its first `*/`.
static LEADING_DOC_BLOCKS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\A(?:[ \t\r\n]*/\*[\s\S]*?\*/[ \t]*(?:\r?\n)?)+")
        .expect("leading doc block pattern is valid")
});

/// Input-size budget for a single prompt. Content beyond either limit is
/// neither sent to the model nor part of the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncationLimits {
    pub max_lines: usize,
    pub max_chars: usize,
}

impl Default for TruncationLimits {
    fn default() -> Self {
        Self {
            max_lines: 1000,
            max_chars: 4000,
        }
    }
}

/// Remove any documentation block(s) at the start of `content`.
/// Idempotent: stripped content has no leading block left to remove.
pub fn strip_docs(content: &str) -> &str {
    match LEADING_DOC_BLOCKS.find(content) {
        Some(m) => &content[m.end()..],
        None => content,
    }
}

/// Prepend `doc` as a comment block. A `*/` inside the documentation would
/// close the block early, so it is broken up first.
pub fn wrap_docs(doc: &str, content: &str) -> String {
    format!("/* {} */\n{}", doc.replace("*/", "* /"), content)
}

/// Keep the first `max_lines` lines, then the first `max_chars` characters.
pub fn truncate(content: &str, limits: &TruncationLimits) -> String {
    let joined = content
        .lines()
        .take(limits.max_lines)
        .collect::<Vec<_>>()
        .join("\n");

    match joined.char_indices().nth(limits.max_chars) {
        Some((byte_idx, _)) => joined[..byte_idx].to_string(),
        None => joined,
    }
}

/// Cache key for `content`: SHA-256 of the truncated text, lowercase hex.
///
/// Two files that only differ past the truncation boundary share a key and
/// therefore share documentation. That is a known approximation, kept so
/// the key always matches exactly what the model was shown.
pub fn fingerprint(content: &str, limits: &TruncationLimits) -> String {
    digest_hex(&truncate(content, limits))
}

pub(crate) fn digest_hex(text: &str) -> String {
    Sha256::digest(text.as_bytes())
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect()
}
