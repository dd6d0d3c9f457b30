use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use crate::error::Error;

/// Commands sent on the control channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    User(&'a str),
    Pass(&'a str),
    TypeBinary,
    Noop,
    Epsv,
    Pasv,
    List(&'a str),
    MakeDir(&'a str),
    RemoveDir(&'a str),
    RenameFrom(&'a str),
    RenameTo(&'a str),
    Delete(&'a str),
    Rest(u64),
    Retr(&'a str),
    Stor(&'a str),
    Quit,
}

impl Command<'_> {
    fn verb(&self) -> &'static str {
        match self {
            Self::User(_) => "USER",
            Self::Pass(_) => "PASS",
            Self::TypeBinary => "TYPE",
            Self::Noop => "NOOP",
            Self::Epsv => "EPSV",
            Self::Pasv => "PASV",
            Self::List(_) => "LIST",
            Self::MakeDir(_) => "MKD",
            Self::RemoveDir(_) => "RMD",
            Self::RenameFrom(_) => "RNFR",
            Self::RenameTo(_) => "RNTO",
            Self::Delete(_) => "DELE",
            Self::Rest(_) => "REST",
            Self::Retr(_) => "RETR",
            Self::Stor(_) => "STOR",
            Self::Quit => "QUIT",
        }
    }

    fn argument(&self) -> Option<String> {
        match self {
            Self::User(arg)
            | Self::Pass(arg)
            | Self::List(arg)
            | Self::MakeDir(arg)
            | Self::RemoveDir(arg)
            | Self::RenameFrom(arg)
            | Self::RenameTo(arg)
            | Self::Delete(arg)
            | Self::Retr(arg)
            | Self::Stor(arg) => Some((*arg).to_owned()),
            Self::TypeBinary => Some("I".to_owned()),
            Self::Rest(offset) => Some(offset.to_string()),
            Self::Noop | Self::Epsv | Self::Pasv | Self::Quit => None,
        }
    }
}

/// Log-safe rendering, the password is never printed.
impl fmt::Display for Command<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.argument()) {
            (Self::Pass(_), _) => write!(f, "PASS ****"),
            (_, Some(arg)) => write!(f, "{} {}", self.verb(), arg),
            (_, None) => write!(f, "{}", self.verb()),
        }
    }
}

impl TryFrom<&Command<'_>> for Bytes {
    type Error = Error;

    fn try_from(command: &Command<'_>) -> Result<Self, Self::Error> {
        let verb = command.verb();
        let arg = command.argument();

        let len = verb.len() + arg.as_ref().map_or(0, |a| a.len() + 1) + 2;
        let mut bytes = BytesMut::with_capacity(len);
        bytes.put_slice(verb.as_bytes());

        if let Some(arg) = arg {
            // a line break inside an argument would start a second command
            if arg.contains(['\r', '\n']) {
                return Err(Error::UnexpectedBehavior(format!(
                    "line break in {verb} argument"
                )));
            }
            bytes.put_u8(b' ');
            bytes.put_slice(arg.as_bytes());
        }

        bytes.put_slice(b"\r\n");
        Ok(bytes.freeze())
    }
}
