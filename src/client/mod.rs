//! Protocol sessions.
//!
//! [`Session`] is one authenticated control connection able to run one
//! command at a time; [`Connector`] opens new ones. The pool and the
//! filesystem only talk to these traits, [`FtpConnection`] and
//! [`FtpConnector`] are the implementation over TCP.

mod connection;
mod connector;

pub use connection::FtpConnection;
pub use connector::FtpConnector;

use tokio::io::AsyncRead;

use crate::{error::FtpResult, protocol::Entry};

/// Incoming side of a data connection
pub type DataStream = Box<dyn AsyncRead + Send + Unpin>;

/// One authenticated protocol session. This is `async_trait`
///
/// Commands are strictly sequential: the session is borrowed mutably for
/// every call, and after [`Session::retrieve_from`] nothing but
/// [`Session::finish_transfer`] may be issued.
#[async_trait]
pub trait Session: Send {
    /// Lightweight command used to check the session is still usable.
    async fn noop(&mut self) -> FtpResult<()>;

    async fn list(&mut self, path: &str) -> FtpResult<Vec<Entry>>;

    async fn make_dir(&mut self, path: &str) -> FtpResult<()>;

    async fn remove_dir(&mut self, path: &str) -> FtpResult<()>;

    async fn rename(&mut self, from: &str, to: &str) -> FtpResult<()>;

    async fn delete(&mut self, path: &str) -> FtpResult<()>;

    /// Starts downloading `path` from byte `offset`.
    async fn retrieve_from(&mut self, path: &str, offset: u64) -> FtpResult<DataStream>;

    /// Reads the completion reply of a retrieve once its data stream is
    /// closed. An early close is reported by the server as an error here.
    async fn finish_transfer(&mut self) -> FtpResult<()>;

    /// Uploads everything `reader` yields to `path`.
    async fn store(
        &mut self,
        path: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> FtpResult<()>;

    /// Logs out and closes the session. Best effort.
    async fn quit(&mut self) -> FtpResult<()>;
}

/// Opens new authenticated sessions to one endpoint. This is `async_trait`
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> FtpResult<Box<dyn Session>>;
}
