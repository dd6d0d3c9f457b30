use std::{
    io,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tokio::{
    io::{AsyncRead, AsyncReadExt, ReadBuf},
    runtime::Handle,
};

use crate::{
    classify,
    client::{DataStream, Session},
    error::{FtpResult, ResultExt},
    pool::ConnectionPool,
};

/// Download stream returned by [`Object::open`](super::Object::open).
///
/// The stream owns the session it was opened on: nothing else can be sent
/// on it until the transfer is over. Call [`ReadStream::close`] to hand it
/// back. A stream dropped without closing discards its session in the
/// background.
pub struct ReadStream {
    data: Option<DataStream>,
    session: Option<Box<dyn Session>>,
    pool: Arc<ConnectionPool>,
    failed: bool,
}

impl ReadStream {
    pub(crate) fn new(
        data: DataStream,
        limit: Option<u64>,
        session: Box<dyn Session>,
        pool: Arc<ConnectionPool>,
    ) -> Self {
        let data: DataStream = match limit {
            Some(limit) => Box::new(data.take(limit)),
            None => data,
        };

        Self {
            data: Some(data),
            session: Some(session),
            pool,
            failed: false,
        }
    }

    /// Ends the transfer and hands the session back.
    ///
    /// The session is pooled again only if every read succeeded and the
    /// server confirmed the transfer. Closing before the end of the data is
    /// not an error even though the server reports the transfer aborted.
    pub async fn close(mut self) -> FtpResult<()> {
        drop(self.data.take());

        let Some(mut session) = self.session.take() else {
            return Ok(());
        };

        let result = session.finish_transfer().await;

        if result.is_err() || self.failed {
            self.pool.discard(session).await;
        } else {
            self.pool.release(session, None).await;
        }

        match result {
            Err(err) if classify::is_benign_close(&err) => Ok(()),
            result => result.context("close"),
        }
    }
}

impl AsyncRead for ReadStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = &mut *self;

        let Some(data) = this.data.as_mut() else {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::Other,
                "read on closed stream",
            )));
        };

        let poll = Pin::new(data).poll_read(cx, buf);
        if let Poll::Ready(Err(_)) = poll {
            this.failed = true;
        }

        poll
    }
}

impl Drop for ReadStream {
    fn drop(&mut self) {
        drop(self.data.take());

        let Some(session) = self.session.take() else {
            return;
        };

        if let Ok(handle) = Handle::try_current() {
            let pool = Arc::clone(&self.pool);

            let _ = handle.spawn(async move {
                debug!("Read stream dropped before close, discarding connection");
                pool.discard(session).await;
            });
        }
    }
}
