use chrono::{DateTime, Utc};
use std::{fmt, sync::Arc};
use tokio::io::AsyncRead;

use super::{unknown_time, Fs, ReadStream};
use crate::{
    classify,
    error::{Error, FtpResult, ResultExt},
    path,
    protocol::{Entry, EntryType},
};

/// Metadata of a remote path, as found in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub mod_time: DateTime<Utc>,
    pub is_dir: bool,
}

impl FileInfo {
    pub(crate) fn from_entry(name: &str, entry: &Entry) -> Self {
        Self {
            name: name.to_owned(),
            size: entry.size,
            mod_time: entry.time,
            is_dir: entry.entry_type == EntryType::Folder,
        }
    }

    pub(crate) fn empty(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            size: 0,
            mod_time: unknown_time(),
            is_dir: false,
        }
    }
}

/// Options for [`Object::open`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOption {
    /// Start reading at `offset`
    Seek { offset: u64 },
    /// Read bytes `start..=end`. Without `start`, read the last `end`
    /// bytes; without `end`, read to the end of the file.
    Range { start: Option<u64>, end: Option<u64> },
}

impl OpenOption {
    /// Resolves the option against the object size into the offset to
    /// start from and the number of bytes to read, if limited.
    pub fn decode(&self, size: u64) -> (u64, Option<u64>) {
        match *self {
            Self::Seek { offset } => (offset, None),
            Self::Range {
                start: Some(start),
                end: Some(end),
            } => (start, Some(end.saturating_add(1).saturating_sub(start))),
            Self::Range {
                start: Some(start),
                end: None,
            } => (start, None),
            Self::Range {
                start: None,
                end: Some(end),
            } => (size.saturating_sub(end), None),
            Self::Range {
                start: None,
                end: None,
            } => (0, None),
        }
    }
}

/// A file on the remote.
///
/// The [`FileInfo`] is a snapshot from the listing the object came from
/// and is only refreshed by [`Object::update`].
#[derive(Debug, Clone)]
pub struct Object {
    fs: Fs,
    remote: String,
    info: FileInfo,
}

impl Object {
    pub(crate) fn new(fs: Fs, remote: &str, info: FileInfo) -> Self {
        Self {
            fs,
            remote: remote.to_owned(),
            info,
        }
    }

    pub fn fs(&self) -> &Fs {
        &self.fs
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    pub fn info(&self) -> &FileInfo {
        &self.info
    }

    pub fn size(&self) -> u64 {
        self.info.size
    }

    pub fn mod_time(&self) -> DateTime<Utc> {
        self.info.mod_time
    }

    /// Hashes are not supported
    pub fn hash(&self) -> FtpResult<String> {
        Err(Error::HashUnsupported)
    }

    /// FTP can't set modification times; this succeeds without doing
    /// anything.
    pub fn set_mod_time(&mut self, _mod_time: DateTime<Utc>) -> FtpResult<()> {
        Ok(())
    }

    pub fn storable(&self) -> bool {
        true
    }

    pub(crate) fn full_path(&self) -> String {
        path::join(self.fs.root(), &self.remote)
    }

    /// Opens the object for reading. The last option wins.
    ///
    /// The stream owns a connection until it is closed, see [`ReadStream`].
    pub async fn open(&self, options: &[OpenOption]) -> FtpResult<ReadStream> {
        let (offset, limit) = options
            .last()
            .map_or((0, None), |option| option.decode(self.size()));

        let full = self.full_path();
        let mut session = self.fs.pool.acquire().await.context("open")?;

        match session.retrieve_from(&full, offset).await {
            Ok(data) => Ok(ReadStream::new(
                data,
                limit,
                session,
                Arc::clone(&self.fs.pool),
            )),
            Err(err) => {
                self.fs.pool.release(session, Some(&err)).await;
                Err(err.context("open"))
            }
        }
    }

    /// Replaces the object's content with everything `reader` yields.
    ///
    /// A failed upload may leave a partial file behind, so it is removed
    /// before the upload error is returned. A failure to remove it is only
    /// logged.
    pub async fn update<R>(&mut self, mut reader: R) -> FtpResult<()>
    where
        R: AsyncRead + Send + Unpin,
    {
        let full = self.full_path();
        let mut session = self.fs.pool.acquire().await.context("update")?;

        if let Err(err) = session.store(&full, &mut reader).await {
            // the session is mid-transfer or broken, never reuse it
            self.fs.pool.discard(session).await;

            match self.remove().await {
                Ok(()) => debug!("{}: removed after failed upload: {}", self, err),
                Err(remove_err) => debug!("{}: failed to remove: {}", self, remove_err),
            }

            return Err(err.context("update stor"));
        }

        self.fs.pool.release(session, None).await;

        let mut info = self
            .fs
            .get_info(&full)
            .await
            .context("update get info")?;
        info.name.clone_from(&self.remote);
        self.info = info;

        Ok(())
    }

    /// Removes the object; a directory at the same path is removed as one.
    pub async fn remove(&self) -> FtpResult<()> {
        let full = self.full_path();

        if self.fs.get_info(&full).await?.is_dir {
            return self.fs.rmdir(&self.remote).await;
        }

        with_session!(self.fs, "remove", |session| session.delete(&full))
            .map_err(|err| classify::file_error(err, "remove"))
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.remote)
    }
}
