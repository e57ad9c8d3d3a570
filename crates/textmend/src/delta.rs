//! Wire and presentation forms of a diff.
//!
//! The delta format is a compact tab-separated encoding of a diff
//! against a known source text: `=N` keeps N units, `-N` drops N units,
//! `+text` inserts percent-encoded text. Counts are in UTF-16 code
//! units, so a supplementary-plane character contributes two.

use thiserror::Error;

use crate::diff::{Diff, Op};
use crate::unit::{self, Units};
use textmend_percent::{decode, encode, PercentError};

/// Errors produced while parsing a delta string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeltaError {
    /// The delta walked past the end of the source text, or stopped
    /// short of it.
    #[error("delta consumed {consumed} source units, text has {expected}")]
    LengthMismatch { consumed: usize, expected: usize },
    /// A token started with something other than `=`, `-`, or `+`.
    #[error("unknown operation in delta token {0:?}")]
    InvalidToken(String),
    /// A `=` or `-` token carried a non-numeric or negative count.
    #[error("invalid count in delta token {0:?}")]
    InvalidCount(String),
    /// An insertion payload failed to decode.
    #[error("invalid escape in delta: {0}")]
    Codec(#[from] PercentError),
}

/// The source text a diff was computed from (Equal + Delete payloads).
pub fn source_text(diffs: &[Diff]) -> String {
    unit::string(&source_units(diffs))
}

/// The target text a diff produces (Equal + Insert payloads).
pub fn target_text(diffs: &[Diff]) -> String {
    unit::string(&target_units(diffs))
}

pub(crate) fn source_units(diffs: &[Diff]) -> Units {
    let mut text = Units::new();
    for diff in diffs {
        if diff.op != Op::Insert {
            text.extend_from_slice(&diff.data);
        }
    }
    text
}

pub(crate) fn target_units(diffs: &[Diff]) -> Units {
    let mut text = Units::new();
    for diff in diffs {
        if diff.op != Op::Delete {
            text.extend_from_slice(&diff.data);
        }
    }
    text
}

/// Translates a source-text index into the corresponding target-text
/// index. An index inside a deletion maps to the position just past it.
pub fn x_index(diffs: &[Diff], loc: usize) -> usize {
    let mut chars1 = 0;
    let mut chars2 = 0;
    let mut last_chars1 = 0;
    let mut last_chars2 = 0;
    let mut hit: Option<&Diff> = None;
    for diff in diffs {
        if diff.op != Op::Insert {
            chars1 += diff.data.len();
        }
        if diff.op != Op::Delete {
            chars2 += diff.data.len();
        }
        if chars1 > loc {
            hit = Some(diff);
            break;
        }
        last_chars1 = chars1;
        last_chars2 = chars2;
    }
    if hit.is_some_and(|diff| diff.op == Op::Delete) {
        return last_chars2;
    }
    last_chars2 + (loc - last_chars1)
}

/// The edit distance a diff represents: each replacement run counts the
/// larger of its inserted and deleted lengths.
pub fn levenshtein(diffs: &[Diff]) -> usize {
    let mut total = 0;
    let mut insertions = 0;
    let mut deletions = 0;
    for diff in diffs {
        match diff.op {
            Op::Insert => insertions += diff.data.len(),
            Op::Delete => deletions += diff.data.len(),
            Op::Equal => {
                total += insertions.max(deletions);
                insertions = 0;
                deletions = 0;
            }
        }
    }
    total + insertions.max(deletions)
}

/// Serializes a diff into the tab-separated delta format.
pub fn to_delta(diffs: &[Diff]) -> String {
    let tokens: Vec<String> = diffs
        .iter()
        .map(|diff| match diff.op {
            Op::Insert => format!("+{}", encode(&diff.data)),
            Op::Delete => format!("-{}", diff.data.len()),
            Op::Equal => format!("={}", diff.data.len()),
        })
        .collect();
    tokens.join("\t")
}

/// Rebuilds the diff a delta describes, given the source text it was
/// computed from.
pub fn from_delta(text1: &str, delta: &str) -> Result<Vec<Diff>, DeltaError> {
    let text = unit::units(text1);
    let mut diffs = Vec::new();
    // Number of source units consumed so far.
    let mut pointer = 0;
    for token in delta.split('\t') {
        if token.is_empty() {
            // Blank tokens are ok, e.g. from a trailing tab.
            continue;
        }
        let mut chars = token.chars();
        let op = chars.next().expect("token is non-empty");
        let param = chars.as_str();
        match op {
            '+' => diffs.push(Diff::from_units(Op::Insert, decode(param)?)),
            '-' | '=' => {
                let count: usize = param
                    .parse()
                    .map_err(|_| DeltaError::InvalidCount(token.to_string()))?;
                let end = pointer + count;
                if end > text.len() {
                    return Err(DeltaError::LengthMismatch {
                        consumed: end,
                        expected: text.len(),
                    });
                }
                let chunk = text[pointer..end].to_vec();
                pointer = end;
                let kind = if op == '=' { Op::Equal } else { Op::Delete };
                diffs.push(Diff::from_units(kind, chunk));
            }
            _ => return Err(DeltaError::InvalidToken(token.to_string())),
        }
    }
    if pointer != text.len() {
        return Err(DeltaError::LengthMismatch {
            consumed: pointer,
            expected: text.len(),
        });
    }
    Ok(diffs)
}

/// Renders a diff as HTML: deletions on red, insertions on green,
/// newlines shown as a pilcrow plus a line break.
pub fn pretty_html(diffs: &[Diff]) -> String {
    let mut html = String::new();
    for diff in diffs {
        let text = diff
            .text()
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('\n', "&para;<br>");
        match diff.op {
            Op::Insert => {
                html.push_str("<ins style=\"background:#e6ffe6;\">");
                html.push_str(&text);
                html.push_str("</ins>");
            }
            Op::Delete => {
                html.push_str("<del style=\"background:#ffe6e6;\">");
                html.push_str(&text);
                html.push_str("</del>");
            }
            Op::Equal => {
                html.push_str("<span>");
                html.push_str(&text);
                html.push_str("</span>");
            }
        }
    }
    html
}
