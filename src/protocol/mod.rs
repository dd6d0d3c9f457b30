//! FTP control channel vocabulary: reply codes, replies, commands and the
//! parsers for passive-mode and directory-listing responses.

mod command;
mod list;
mod passive;
mod reply;
mod status;

pub use self::{
    command::Command,
    list::{parse_listing, Entry, EntryType},
    passive::{parse_epsv_port, parse_pasv_port},
    reply::{read_reply, Reply},
    status::StatusCode,
};

/// Default control channel port
pub const DEFAULT_PORT: u16 = 21;
