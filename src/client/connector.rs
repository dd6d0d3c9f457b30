use std::time::Duration;
use tokio::time;

use super::{Connector, FtpConnection, Session};
use crate::{config::Endpoint, error::FtpResult};

/// Dials and logs in to one FTP endpoint.
#[derive(Debug, Clone)]
pub struct FtpConnector {
    endpoint: Endpoint,
    timeout: Duration,
}

impl FtpConnector {
    /// `timeout` bounds the TCP connect, the greeting and the login.
    pub fn new(endpoint: Endpoint, timeout: Duration) -> Self {
        Self { endpoint, timeout }
    }

    async fn dial(&self) -> FtpResult<FtpConnection> {
        let addr = &self.endpoint.addr;

        let mut conn = FtpConnection::connect(addr).await.map_err(|err| {
            error!("Error while dialing {}: {}", addr, err);
            err.context("dial")
        })?;

        if let Err(err) = conn.login(&self.endpoint.user, &self.endpoint.pass).await {
            let _ = conn.quit().await;
            error!("Error while logging in to {}: {}", addr, err);
            return Err(err.context("login"));
        }

        Ok(conn)
    }
}

#[async_trait]
impl Connector for FtpConnector {
    async fn connect(&self) -> FtpResult<Box<dyn Session>> {
        debug!("Connecting to FTP server {}", self.endpoint.addr);
        let conn = time::timeout(self.timeout, self.dial()).await??;
        Ok(Box::new(conn))
    }
}
