//! Filesystem view of an FTP remote.
//!
//! Paths given to [`Fs`] and [`Object`] are relative to the root the
//! filesystem was opened with and always use `/` as separator.

use chrono::{DateTime, Utc};
use std::{fmt, sync::Arc, time::Duration};
use tokio::io::AsyncRead;

use crate::{
    classify,
    client::{Connector, FtpConnector},
    config::{Config, Endpoint},
    error::{Error, FtpResult, ResultExt},
    path::{self, Resolved},
    pool::{ConnectionPool, PoolOptions},
    protocol::{Entry, EntryType},
};

/// Runs one command on a pooled session and hands the session back with
/// the outcome of the command. A failed acquire returns early.
macro_rules! with_session {
    ($fs:expr, $context:expr, |$session:ident| $command:expr) => {{
        let mut $session = $fs.pool.acquire().await.context($context)?;
        let result = $command.await;
        $fs.pool.release($session, result.as_ref().err()).await;
        result
    }};
}

mod dir;
mod listing;
mod object;
mod stream;

pub use listing::{DirEntry, Directory};
pub use object::{FileInfo, Object, OpenOption};
pub use stream::ReadStream;

bitflags! {
    /// Optional capabilities of a filesystem
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Features: u32 {
        const CAN_HAVE_EMPTY_DIRECTORIES = 0x0000_0001;
        const MOVE = 0x0000_0002;
        const DIR_MOVE = 0x0000_0004;
        const PUT_STREAM = 0x0000_0008;
    }
}

/// Result of opening a filesystem.
#[derive(Debug)]
pub enum Opened {
    /// The root is a directory, or does not exist yet
    Directory(Fs),
    /// The root names an existing file; the filesystem is rooted at its
    /// parent so the file is reachable as an object
    File(Fs),
}

impl Opened {
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }

    pub fn into_fs(self) -> Fs {
        match self {
            Self::Directory(fs) | Self::File(fs) => fs,
        }
    }
}

/// A remote FTP server seen as a filesystem.
///
/// Cloning is cheap, clones share the connection pool.
#[derive(Clone)]
pub struct Fs {
    name: String,
    root: String,
    url: String,
    endpoint: Endpoint,
    features: Features,
    pool: Arc<ConnectionPool>,
}

impl Fs {
    /// Opens the remote `name` described by `config` at `root`.
    pub async fn new(name: &str, root: &str, config: &Config) -> FtpResult<Opened> {
        let connector = FtpConnector::new(config.endpoint(), config.connect_timeout());
        Self::with_connector(name, root, config, connector).await
    }

    /// Like [`Fs::new`] with sessions opened by `connector`.
    pub async fn with_connector<C: Connector + 'static>(
        name: &str,
        root: &str,
        config: &Config,
        connector: C,
    ) -> FtpResult<Opened> {
        let endpoint = config.endpoint();
        let url = format!("ftp://{}", path::clean(&format!("{}/{}", endpoint.addr, root)));

        let mut fs = Self {
            name: name.to_owned(),
            root: root.to_owned(),
            url,
            endpoint,
            features: Features::CAN_HAVE_EMPTY_DIRECTORIES
                | Features::MOVE
                | Features::DIR_MOVE
                | Features::PUT_STREAM,
            pool: Arc::new(ConnectionPool::new(connector, PoolOptions::from(config))),
        };

        // connect once so a bad host or bad credentials fail here
        let session = fs.pool.acquire().await.context("new fs")?;
        fs.pool.release(session, None).await;

        if root.is_empty() {
            return Ok(Opened::Directory(fs));
        }

        let remote = path::base(root);
        fs.root = match path::dir(root) {
            parent if parent == "." => String::new(),
            parent => parent,
        };

        match fs.new_object(&remote).await {
            Ok(_) => Ok(Opened::File(fs)),
            Err(Error::ObjectNotFound) => {
                fs.root = root.to_owned();
                Ok(Opened::Directory(fs))
            }
            Err(err) => Err(err),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn features(&self) -> Features {
        self.features
    }

    /// Content hashes are not available over FTP.
    pub fn hashes(&self) -> &'static [&'static str] {
        &[]
    }

    /// Modification times can't be set, so there is no precision to offer.
    pub fn precision(&self) -> Option<Duration> {
        None
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    fn resolve(&self, remote: &str) -> Resolved {
        Resolved::new(&self.root, remote)
    }

    async fn list_raw(&self, dir: &str, context: &str) -> FtpResult<Vec<Entry>> {
        with_session!(self, context, |session| session.list(dir))
    }

    /// Finds the object at `remote`. Directories are not objects.
    pub async fn new_object(&self, remote: &str) -> FtpResult<Object> {
        let resolved = self.resolve(remote);

        let entries = self
            .list_raw(&resolved.dir, "new object")
            .await
            .map_err(|err| classify::file_error(err, "new object"))?;

        entries
            .iter()
            .find(|e| e.entry_type != EntryType::Folder && e.name == resolved.base)
            .map(|e| Object::new(self.clone(), remote, FileInfo::from_entry(remote, e)))
            .ok_or(Error::ObjectNotFound)
    }

    /// Lists `dir`, which is `""` for the root. Entries come in server order.
    pub async fn list(&self, dir: &str) -> FtpResult<Vec<DirEntry>> {
        let resolved = self.resolve(dir);

        let entries = self
            .list_raw(&resolved.full, "list")
            .await
            .map_err(|err| classify::dir_error(err, "list"))?;

        Ok(listing::convert(self, dir, entries))
    }

    /// Looks up an unrooted path in its parent's listing.
    async fn get_info(&self, full: &str) -> FtpResult<FileInfo> {
        let resolved = Resolved::from_full(full.to_owned());

        let entries = self
            .list_raw(&resolved.dir, "get info")
            .await
            .map_err(|err| classify::file_error(err, "get info"))?;

        entries
            .iter()
            .find(|e| e.name == resolved.base)
            .map(|e| FileInfo::from_entry(full, e))
            .ok_or(Error::ObjectNotFound)
    }

    /// Uploads `reader` to `remote`, creating parent directories first.
    pub async fn put<R>(&self, reader: R, remote: &str) -> FtpResult<Object>
    where
        R: AsyncRead + Send + Unpin,
    {
        self.mk_parent_dir(remote)
            .await
            .context("put: creating parent directory failed")?;

        let mut object = Object::new(self.clone(), remote, FileInfo::empty(remote));
        object.update(reader).await?;
        Ok(object)
    }

    /// Uploads a stream of unknown length; FTP doesn't need the size up
    /// front, so this is [`Fs::put`].
    pub async fn put_stream<R>(&self, reader: R, remote: &str) -> FtpResult<Object>
    where
        R: AsyncRead + Send + Unpin,
    {
        self.put(reader, remote).await
    }
}

impl fmt::Display for Fs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl fmt::Debug for Fs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fs")
            .field("name", &self.name)
            .field("root", &self.root)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// Modification time of an entry never seen in a listing
fn unknown_time() -> DateTime<Utc> {
    DateTime::default()
}
