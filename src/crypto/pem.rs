//! PEM text codec: base64 DER between `-----BEGIN <LABEL>-----` and
//! `-----END <LABEL>-----` marker lines.
//!
//! Encoding wraps the body at 64 columns and joins lines with `\n` without a
//! trailing newline. Decoding is lenient about layout (CRLF, indentation,
//! single-line bodies) and strict about framing.

#[cfg(test)]
#[path = "pem_test.rs"]
mod tests;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

const LINE_WIDTH: usize = 64;
const BEGIN_PREFIX: &str = "-----BEGIN ";
const END_PREFIX: &str = "-----END ";
const MARKER_SUFFIX: &str = "-----";

/// Errors produced when decoding PEM text.
#[derive(Debug, thiserror::Error)]
pub enum PemError {
    #[error("missing `-----BEGIN <LABEL>-----` line")]
    MissingBegin,
    #[error("missing `-----END <LABEL>-----` line")]
    MissingEnd,
    #[error("BEGIN label `{begin}` does not match END label `{end}`")]
    LabelMismatch { begin: String, end: String },
    #[error("expected PEM label `{expected}`, found `{found}`")]
    UnexpectedLabel { expected: String, found: String },
    #[error("PEM body is empty")]
    EmptyBody,
    #[error("PEM body is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// A decoded PEM block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pem {
    pub label: String,
    pub contents: Vec<u8>,
}

/// Encode `der` as PEM text under `label`.
#[must_use]
pub fn encode(label: &str, der: &[u8]) -> String {
    let body = STANDARD.encode(der);
    let mut out = String::with_capacity(body.len() + body.len() / LINE_WIDTH + 64);
    out.push_str(BEGIN_PREFIX);
    out.push_str(label);
    out.push_str(MARKER_SUFFIX);
    out.push('\n');
    for start in (0..body.len()).step_by(LINE_WIDTH) {
        let end = (start + LINE_WIDTH).min(body.len());
        out.push_str(&body[start..end]);
        out.push('\n');
    }
    out.push_str(END_PREFIX);
    out.push_str(label);
    out.push_str(MARKER_SUFFIX);
    out
}

/// Decode the first PEM block in `text`. Lines before the BEGIN marker,
/// such as an OpenSSL attribute preamble, are skipped.
///
/// # Errors
///
/// Returns [`PemError`] when either marker line is missing, the labels
/// disagree, the body is empty, or the body is not base64.
pub fn decode(text: &str) -> Result<Pem, PemError> {
    let mut lines = text.lines().map(str::trim);

    let begin = lines
        .by_ref()
        .find_map(|line| marker_label(line, BEGIN_PREFIX))
        .ok_or(PemError::MissingBegin)?;

    let mut body = String::new();
    let mut end = None;
    for line in lines {
        if let Some(label) = marker_label(line, END_PREFIX) {
            end = Some(label);
            break;
        }
        body.extend(line.chars().filter(|c| !c.is_whitespace()));
    }

    let end = end.ok_or(PemError::MissingEnd)?;
    if begin != end {
        return Err(PemError::LabelMismatch { begin: begin.to_owned(), end: end.to_owned() });
    }
    if body.is_empty() {
        return Err(PemError::EmptyBody);
    }

    let contents = STANDARD.decode(body.as_bytes())?;
    Ok(Pem { label: begin.to_owned(), contents })
}

/// Decode a PEM block and require it to carry `label`.
///
/// # Errors
///
/// Returns [`PemError::UnexpectedLabel`] for a well-formed block with a
/// different label, or any error from [`decode`].
pub fn decode_labeled(text: &str, label: &str) -> Result<Vec<u8>, PemError> {
    let pem = decode(text)?;
    if pem.label != label {
        return Err(PemError::UnexpectedLabel { expected: label.to_owned(), found: pem.label });
    }
    Ok(pem.contents)
}

fn marker_label<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    line.strip_prefix(prefix)?.strip_suffix(MARKER_SUFFIX)
}
