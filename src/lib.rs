//! Remote FTP servers as filesystems.
//!
//! [`Fs`] maps path oriented operations (listing, reading, writing,
//! recursive directory creation, moves) onto FTP commands. FTP sessions
//! are half duplex, so every operation checks a session out of a
//! [`ConnectionPool`] for its whole duration and hands it back, probed or
//! discarded as the outcome requires.

#[macro_use]
extern crate log;
#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate async_trait;

mod classify;
/// Protocol sessions
pub mod client;
mod config;
mod error;
pub mod fs;
mod path;
mod pool;
/// Protocol implementation
pub mod protocol;

pub use config::{Config, ConfigStore, Endpoint};
pub use error::{Error, FtpResult, ResultExt};
pub use fs::{
    DirEntry, Directory, Features, FileInfo, Fs, Object, OpenOption, Opened, ReadStream,
};
pub use pool::{ConnectionPool, Disposition, PoolOptions};
