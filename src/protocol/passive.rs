use crate::error::{Error, FtpResult};

fn between(message: &str, open: char, close: char) -> Option<&str> {
    let start = message.find(open)? + 1;
    let end = start + message[start..].find(close)?;
    Some(&message[start..end])
}

fn invalid(message: &str) -> Error {
    Error::UnexpectedBehavior(format!("invalid passive mode reply {message:?}"))
}

/// Extracts the data port from a 229 reply, e.g.
/// `Entering Extended Passive Mode (|||6446|)`.
pub fn parse_epsv_port(message: &str) -> FtpResult<u16> {
    let inner = between(message, '(', ')').ok_or_else(|| invalid(message))?;

    // the delimiter is whatever the server used as the first character
    let delim = inner.chars().next().ok_or_else(|| invalid(message))?;
    let fields: Vec<&str> = inner.split(delim).collect();
    if fields.len() != 5 {
        return Err(invalid(message));
    }

    fields[3].parse().map_err(|_| invalid(message))
}

/// Extracts the data port from a 227 reply, e.g.
/// `Entering Passive Mode (192,168,1,2,19,136)`.
///
/// The advertised host is ignored; the data connection goes to the peer of
/// the control connection.
pub fn parse_pasv_port(message: &str) -> FtpResult<u16> {
    let inner = between(message, '(', ')').ok_or_else(|| invalid(message))?;

    let fields = inner
        .split(',')
        .map(|f| f.trim().parse::<u8>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid(message))?;
    if fields.len() != 6 {
        return Err(invalid(message));
    }

    Ok((u16::from(fields[4]) << 8) | u16::from(fields[5]))
}
