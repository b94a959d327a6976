//! Recipient header rewriting on raw message bytes.
//!
//! The message is never parsed as MIME: only the header block is scanned,
//! and every byte outside the replaced `To` field is copied as is.

/// Errors returned while rewriting the recipient header.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RewriteError {
    /// The header block contains no `To` field.
    #[error("message has no To header")]
    MissingTo,
}

/// Byte range of one header field, including folded continuation lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FieldSpan {
    /// Offset of the field name.
    start: usize,

    /// Offset just past the last line terminator of the field.
    end: usize,

    /// Whether the replacement line should end in CRLF.
    crlf: bool,
}

/// Replace the first `To` field with `To: <recipient>`.
pub fn rewrite_recipient(raw: &[u8], recipient: &str) -> Result<Vec<u8>, RewriteError> {
    let span = find_field(raw, b"to").ok_or(RewriteError::MissingTo)?;
    let eol: &[u8] = if span.crlf { b"\r\n" } else { b"\n" };

    let mut out = Vec::with_capacity(raw.len() + recipient.len());
    out.extend_from_slice(&raw[..span.start]);
    out.extend_from_slice(b"To: ");
    out.extend_from_slice(recipient.as_bytes());
    out.extend_from_slice(eol);
    out.extend_from_slice(&raw[span.end..]);
    Ok(out)
}

/// Locate the first header field called `name` (ASCII case-insensitive).
fn find_field(raw: &[u8], name: &[u8]) -> Option<FieldSpan> {
    let mut found: Option<FieldSpan> = None;
    // Line ending of the last terminated line seen.
    let mut previous_crlf: Option<bool> = None;
    let mut pos = 0;

    while pos < raw.len() {
        let line_end = raw[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(raw.len(), |i| pos + i + 1);
        let line = &raw[pos..line_end];

        // Blank line: end of the header block.
        if matches!(line, b"\r\n" | b"\n") {
            break;
        }

        let continuation = matches!(line.first(), Some(b' ' | b'\t'));
        if let Some(span) = found.as_mut() {
            if !continuation {
                break;
            }
            span.end = line_end;
        } else if !continuation && field_name(line).is_some_and(|n| n.eq_ignore_ascii_case(name)) {
            // An unterminated last line follows the style of the lines above it.
            let crlf = if line.ends_with(b"\n") {
                line.ends_with(b"\r\n")
            } else {
                previous_crlf.unwrap_or(true)
            };
            found = Some(FieldSpan {
                start: pos,
                end: line_end,
                crlf,
            });
        }

        if line.ends_with(b"\n") {
            previous_crlf = Some(line.ends_with(b"\r\n"));
        }
        pos = line_end;
    }

    found
}

/// The name of a header field line, without trailing whitespace.
fn field_name(line: &[u8]) -> Option<&[u8]> {
    let colon = line.iter().position(|&b| b == b':')?;
    Some(line[..colon].trim_ascii_end())
}
