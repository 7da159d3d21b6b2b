//! Status parser: porcelain status output → typed change records.
//!
//! Each non-blank line has the shape `<code> <path>`. The whole batch is
//! rejected on the first malformed line; a partial change list could hide a
//! real difference from the reviewer.

use thiserror::Error;

use crate::models::{ChangeKind, ChangeRecord};

/// Errors from status parsing.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StatusError {
    #[error("invalid status line: '{0}'")]
    MalformedLine(String),

    #[error("unrecognized status code '{code}' in line: '{line}'")]
    UnknownCode { code: String, line: String },

    #[error("path is not valid UTF-8 in line: '{0}'")]
    NonUtf8Path(String),
}

/// Parse raw status output into change records, in input order.
///
/// Untracked (`??`) records are dropped unless `include_untracked` is set.
/// Returns an error, and no records at all, if any line is malformed.
/// Paths that are not valid UTF-8 are rejected, never rewritten lossily.
pub fn parse_status(output: &[u8], include_untracked: bool) -> Result<Vec<ChangeRecord>, StatusError> {
    let mut changes = Vec::new();
    for raw in trimmed_lines(output) {
        let line = std::str::from_utf8(raw)
            .map_err(|_| StatusError::NonUtf8Path(String::from_utf8_lossy(raw).into_owned()))?;
        let change = parse_status_line(line)?;
        if change.kind == ChangeKind::Untracked && !include_untracked {
            continue;
        }
        changes.push(change);
    }
    Ok(changes)
}

/// Parse a single already-trimmed status line.
pub fn parse_status_line(line: &str) -> Result<ChangeRecord, StatusError> {
    let Some((code, rest)) = line.split_once(' ') else {
        return Err(StatusError::MalformedLine(line.to_string()));
    };

    let path = unquote_path(rest.trim()).ok_or_else(|| StatusError::NonUtf8Path(line.to_string()))?;
    if code.is_empty() || path.is_empty() {
        return Err(StatusError::MalformedLine(line.to_string()));
    }

    let kind = ChangeKind::from_code(code).ok_or_else(|| StatusError::UnknownCode {
        code: code.to_string(),
        line: line.to_string(),
    })?;

    Ok(ChangeRecord::new(kind, path))
}

/// Split into lines, trim each, and drop the blank ones.
fn trimmed_lines(output: &[u8]) -> impl Iterator<Item = &[u8]> {
    output
        .split(|b| *b == b'\n')
        .map(<[u8]>::trim_ascii)
        .filter(|l| !l.is_empty())
}

/// Undo git's C-style quoting of unusual paths (`"dir/a b\tc.txt"`).
///
/// Unquoted paths are returned unchanged. Octal escapes are decoded as raw
/// bytes so multi-byte UTF-8 names survive; `None` if the decoded bytes are
/// not UTF-8.
fn unquote_path(raw: &str) -> Option<String> {
    let Some(inner) = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
    else {
        return Some(raw.to_string());
    };

    let bytes = inner.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b != b'\\' || i + 1 >= bytes.len() {
            out.push(b);
            i += 1;
            continue;
        }
        let next = bytes[i + 1];
        match next {
            b'n' => out.push(b'\n'),
            b't' => out.push(b'\t'),
            b'r' => out.push(b'\r'),
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'v' => out.push(0x0b),
            b'"' => out.push(b'"'),
            b'\\' => out.push(b'\\'),
            b'0'..=b'7' if is_octal_triplet(&bytes[i + 1..]) => {
                let value = (bytes[i + 1] - b'0') as u32 * 64
                    + (bytes[i + 2] - b'0') as u32 * 8
                    + (bytes[i + 3] - b'0') as u32;
                out.push(value as u8);
                i += 4;
                continue;
            }
            other => {
                out.push(b'\\');
                out.push(other);
            }
        }
        i += 2;
    }
    String::from_utf8(out).ok()
}

fn is_octal_triplet(bytes: &[u8]) -> bool {
    bytes.len() >= 3 && bytes[..3].iter().all(|b| (b'0'..=b'7').contains(b))
}
