use std::{
    collections::VecDeque,
    fmt,
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use crate::{
    client::{Connector, Session},
    config::Config,
    error::{Error, FtpResult},
};

/// What happens to a session handed back after an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The session is known to be healthy and goes back to the pool
    Return,
    /// The failure says nothing about the server's view of the command, so
    /// the session is probed before it is trusted again
    Probe,
}

impl Disposition {
    pub fn of(err: Option<&Error>) -> Self {
        match err.map(Error::cause) {
            None
            | Some(
                Error::Status(_)
                | Error::ObjectNotFound
                | Error::DirNotFound
                | Error::IsFile
                | Error::DirExists
                | Error::CantMove
                | Error::CantDirMove
                | Error::HashUnsupported,
            ) => Self::Return,
            Some(_) => Self::Probe,
        }
    }
}

/// Bounds on the idle side of the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    pub max_idle: usize,
    pub idle_timeout: Duration,
}

impl From<&Config> for PoolOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_idle: config.max_idle,
            idle_timeout: config.idle_timeout(),
        }
    }
}

struct Idle {
    session: Box<dyn Session>,
    since: Instant,
}

/// Idle sessions to one endpoint.
///
/// A session is owned by exactly one caller between [`acquire`] and
/// [`release`]/[`discard`]; the lock only guards the idle queue and is
/// never held across a network call.
///
/// [`acquire`]: ConnectionPool::acquire
/// [`release`]: ConnectionPool::release
/// [`discard`]: ConnectionPool::discard
pub struct ConnectionPool {
    connector: Box<dyn Connector>,
    options: PoolOptions,
    idle: Mutex<VecDeque<Idle>>,
}

impl ConnectionPool {
    pub fn new<C: Connector + 'static>(connector: C, options: PoolOptions) -> Self {
        Self {
            connector: Box::new(connector),
            options,
            idle: Mutex::new(VecDeque::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Idle>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes an idle session, or opens a new one when none is left.
    /// Sessions idle for longer than the idle timeout are closed on the way.
    pub async fn acquire(&self) -> FtpResult<Box<dyn Session>> {
        let mut expired = Vec::new();

        let session = {
            let mut idle = self.lock();
            loop {
                match idle.pop_front() {
                    Some(entry) if entry.since.elapsed() > self.options.idle_timeout => {
                        expired.push(entry.session);
                    }
                    Some(entry) => break Some(entry.session),
                    None => break None,
                }
            }
        };

        for session in expired {
            debug!("Closing connection idle for more than {:?}", self.options.idle_timeout);
            self.discard(session).await;
        }

        match session {
            Some(session) => Ok(session),
            None => self.connector.connect().await,
        }
    }

    /// Hands a session back after an operation that ended with `err`.
    pub async fn release(&self, mut session: Box<dyn Session>, err: Option<&Error>) {
        if Disposition::of(err) == Disposition::Probe {
            if let Err(probe) = session.noop().await {
                debug!("Connection failed, closing: {}", probe);
                self.discard(session).await;
                return;
            }
        }

        let overflow = {
            let mut idle = self.lock();
            if idle.len() < self.options.max_idle {
                idle.push_back(Idle {
                    session,
                    since: Instant::now(),
                });
                None
            } else {
                Some(session)
            }
        };

        if let Some(session) = overflow {
            info!("Pool holds {} idle connections, closing", self.options.max_idle);
            self.discard(session).await;
        }
    }

    /// Closes a session for good.
    pub async fn discard(&self, mut session: Box<dyn Session>) {
        if let Err(err) = session.quit().await {
            debug!("Error while closing connection: {}", err);
        }
    }

    pub fn idle_len(&self) -> usize {
        self.lock().len()
    }

    pub fn options(&self) -> PoolOptions {
        self.options
    }
}

impl fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("options", &self.options)
            .field("idle", &self.idle_len())
            .finish_non_exhaustive()
    }
}
