use std::fmt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::StatusCode;
use crate::error::{Error, FtpResult};

/// A complete reply read from the control channel.
///
/// Lines of a multi-line reply are joined with `\n` into `message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: StatusCode,
    pub message: String,
}

impl Reply {
    pub fn new<M: Into<String>>(code: StatusCode, message: M) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Turns the reply into an error unless its code is one of `expected`.
    pub fn expect(self, expected: &[StatusCode]) -> FtpResult<Self> {
        if expected.contains(&self.code) {
            Ok(self)
        } else {
            Err(Error::Status(self))
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.message)
    }
}

async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R, line: &mut String) -> FtpResult<()> {
    line.clear();
    if reader.read_line(line).await? == 0 {
        return Err(Error::IO("control connection closed by server".to_owned()));
    }

    let len = line.trim_end_matches(['\r', '\n']).len();
    line.truncate(len);
    Ok(())
}

fn split_status_line(line: &str) -> Option<(StatusCode, char, &str)> {
    let code = line.get(..3)?;
    if !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let code = StatusCode(code.parse().ok()?);
    match line[3..].chars().next() {
        None => Some((code, ' ', "")),
        Some(sep @ (' ' | '-')) => Some((code, sep, &line[4..])),
        Some(_) => None,
    }
}

/// Reads one reply, following continuation lines of a multi-line reply.
pub async fn read_reply<R: AsyncBufRead + Unpin>(reader: &mut R) -> FtpResult<Reply> {
    let mut line = String::new();
    read_line(reader, &mut line).await?;

    let Some((code, sep, text)) = split_status_line(&line) else {
        return Err(Error::UnexpectedBehavior(format!("invalid reply line {line:?}")));
    };

    let mut reply = Reply::new(code, text);
    if sep == ' ' {
        return Ok(reply);
    }

    loop {
        read_line(reader, &mut line).await?;
        reply.message.push('\n');

        match split_status_line(&line) {
            Some((last, ' ', text)) if last == code => {
                reply.message.push_str(text);
                return Ok(reply);
            }
            _ => reply.message.push_str(line.trim_start()),
        }
    }
}
