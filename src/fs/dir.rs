use super::{Fs, Object};
use crate::{
    classify,
    error::{Error, FtpResult, ResultExt},
    path,
};

impl Fs {
    /// Creates `dir` and any missing parents. Existing directories are
    /// fine, an existing file anywhere on the way is [`Error::IsFile`].
    pub async fn mkdir(&self, dir: &str) -> FtpResult<()> {
        self.make_dirs(&path::join(&self.root, dir)).await
    }

    /// Makes sure the directory holding `remote` exists.
    pub(crate) async fn mk_parent_dir(&self, remote: &str) -> FtpResult<()> {
        self.make_dirs(&path::join(&self.root, &path::dir(remote)))
            .await
    }

    /// Walks up from `full` until an existing directory is found, then
    /// creates the missing directories top down.
    async fn make_dirs(&self, full: &str) -> FtpResult<()> {
        let mut missing = Vec::new();
        let mut current = full.to_owned();

        while !path::is_top(&current) {
            match self.get_info(&current).await {
                Ok(info) if info.is_dir => break,
                Ok(_) => return Err(Error::IsFile),
                Err(Error::ObjectNotFound) => {
                    let parent = path::dir(&current);
                    missing.push(current);
                    current = parent;
                }
                Err(err) => return Err(err.context(format!("mkdir {current:?} failed"))),
            }
        }

        for dir in missing.iter().rev() {
            with_session!(self, "mkdir", |session| session.make_dir(dir))
                .context(format!("mkdir {dir:?} failed"))?;
        }

        Ok(())
    }

    /// Removes the empty directory `dir`.
    ///
    /// Whether it is empty is up to the server to decide.
    pub async fn rmdir(&self, dir: &str) -> FtpResult<()> {
        let full = path::join(&self.root, dir);

        let Err(err) = with_session!(self, "rmdir", |session| session.remove_dir(&full)) else {
            return Ok(());
        };

        // servers answer 550 for "not empty" as well as for "no such directory"
        let classified = classify::dir_error(err.clone(), "rmdir");
        if matches!(classified, Error::DirNotFound)
            && self.get_info(&full).await.is_ok_and(|info| info.is_dir)
        {
            return Err(err.context("rmdir"));
        }

        Err(classified)
    }

    /// Fails unless nothing exists at `full`.
    async fn ensure_vacant(&self, full: &str) -> FtpResult<()> {
        match self.get_info(full).await {
            Ok(info) if info.is_dir => Err(Error::DirExists),
            Ok(_) => Err(Error::IsFile),
            Err(Error::ObjectNotFound) => Ok(()),
            Err(err) => Err(err.context("checking destination")),
        }
    }

    /// Moves `src` to `remote` on this filesystem with a server side
    /// rename. The destination must not exist.
    pub async fn move_object(&self, src: &Object, remote: &str) -> FtpResult<Object> {
        if src.fs().endpoint != self.endpoint {
            debug!("{}: can't move - not same remote", src);
            return Err(Error::CantMove);
        }

        let from = src.full_path();
        let to = path::join(&self.root, remote);

        self.ensure_vacant(&to).await?;
        self.mk_parent_dir(remote)
            .await
            .context("move: creating parent directory failed")?;

        with_session!(self, "move", |session| session.rename(&from, &to))
            .context("move: rename failed")?;

        self.new_object(remote)
            .await
            .context("move: looking up destination failed")
    }

    /// Moves the directory `src_remote` of `src` to `dst_remote` on this
    /// filesystem with a server side rename.
    ///
    /// Both filesystems must use the same endpoint and credentials, and
    /// the destination must not exist.
    pub async fn dir_move(&self, src: &Fs, src_remote: &str, dst_remote: &str) -> FtpResult<()> {
        if src.endpoint != self.endpoint {
            debug!("{}: can't move directory - not same remote", src);
            return Err(Error::CantDirMove);
        }

        let from = path::join(&src.root, src_remote);
        let to = path::join(&self.root, dst_remote);

        self.ensure_vacant(&to).await?;
        self.make_dirs(&path::dir(&to))
            .await
            .context("dir move: creating parent directory failed")?;

        with_session!(self, "dir move", |session| session.rename(&from, &to))
            .context(format!("dir move: rename({from:?}, {to:?}) failed"))
    }
}
