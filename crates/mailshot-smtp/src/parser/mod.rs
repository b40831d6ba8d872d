//! SMTP reply reader.
//!
//! A reply is one or more lines. Every line but the last is a continuation
//! line, the last one is final:
//!
//! ```text
//! continuation  [2-5][0-5][0-9]-.*
//! final         [2-5][0-5][0-9]( .*)?
//! ```
//!
//! Any other line means framing with the server is lost. That is always
//! fatal; nothing is skipped or coerced. Text after the code is not required
//! to be UTF-8; invalid bytes are replaced when the line is stored.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::trace;

use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// Kind of a single reply line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `250-...`: more lines follow.
    Continuation,
    /// `250 ...` or `250`: last line of the reply.
    Final,
}

/// Classifies a reply line (without its line terminator).
///
/// Returns `None` if the line matches neither grammar.
#[must_use]
pub fn classify_line(line: &str) -> Option<LineKind> {
    classify_bytes(line.as_bytes())
}

fn classify_bytes(bytes: &[u8]) -> Option<LineKind> {
    let [first, second, third, rest @ ..] = bytes else {
        return None;
    };

    if !(b'2'..=b'5').contains(first)
        || !(b'0'..=b'5').contains(second)
        || !third.is_ascii_digit()
    {
        return None;
    }

    match rest.first() {
        None | Some(b' ') => Some(LineKind::Final),
        Some(b'-') => Some(LineKind::Continuation),
        Some(_) => None,
    }
}

/// Extracts the reply code from a line already accepted by [`classify_line`].
fn line_code(line: &[u8]) -> ReplyCode {
    let code = line
        .iter()
        .take(3)
        .fold(0u16, |acc, digit| acc * 10 + u16::from(digit - b'0'));
    ReplyCode::new(code)
}

/// Builds a reply from already collected lines.
///
/// Every line but the last must be a continuation line and the last one must
/// be final.
///
/// # Errors
///
/// Returns [`Error::MalformedResponse`] for the first line that breaks the
/// grammar, or if the lines end without a final line.
pub fn parse_reply<S: AsRef<str>>(lines: &[S]) -> Result<Reply> {
    let mut collected = Vec::with_capacity(lines.len());

    for (index, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        let is_last = index + 1 == lines.len();

        match classify_line(line) {
            Some(LineKind::Continuation) if !is_last => collected.push(line.to_string()),
            Some(LineKind::Final) if is_last => {
                collected.push(line.to_string());
                return Ok(Reply::new(line_code(line.as_bytes()), collected));
            }
            _ => {
                return Err(Error::MalformedResponse {
                    line: line.to_string(),
                });
            }
        }
    }

    Err(Error::MalformedResponse {
        line: String::new(),
    })
}

/// Reads one complete reply from the stream.
///
/// Lines are read until a final line arrives. The code of the final line
/// becomes the reply code.
///
/// # Errors
///
/// Returns [`Error::MalformedResponse`] on a line matching neither grammar,
/// and [`Error::Io`] if the stream fails or ends mid-reply.
pub async fn read_reply<R>(reader: &mut R) -> Result<Reply>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = Vec::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed while waiting for a reply",
            )));
        }

        let raw = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = String::from_utf8_lossy(raw).into_owned();
        trace!("S: {line}");

        match classify_bytes(raw) {
            Some(LineKind::Continuation) => lines.push(line),
            Some(LineKind::Final) => {
                let code = line_code(raw);
                lines.push(line);
                return Ok(Reply::new(code, lines));
            }
            None => return Err(Error::MalformedResponse { line }),
        }
    }
}
