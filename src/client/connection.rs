use bytes::Bytes;
use chrono::Utc;
use std::net::IpAddr;
use tokio::{
    io::{self, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
};

use super::{DataStream, Session};
use crate::{
    error::{Error, FtpResult},
    protocol::{
        parse_epsv_port, parse_listing, parse_pasv_port, read_reply, Command, Entry, Reply,
        StatusCode,
    },
};

const TRANSFER_STARTED: &[StatusCode] = &[StatusCode::ALREADY_OPEN, StatusCode::ABOUT_TO_SEND];
const TRANSFER_COMPLETE: &[StatusCode] = &[
    StatusCode::CLOSING_DATA_CONNECTION,
    StatusCode::REQUESTED_FILE_ACTION_OK,
];

/// A control connection to an FTP server.
///
/// Data connections are always passive and are opened to the same host
/// as the control connection.
pub struct FtpConnection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    peer: IpAddr,
    epsv: bool,
    transfer: bool,
}

impl FtpConnection {
    /// Connects and waits for the server greeting.
    pub async fn connect(addr: &str) -> FtpResult<Self> {
        let stream = TcpStream::connect(addr).await?;
        let peer = stream.peer_addr()?.ip();
        let (reader, writer) = stream.into_split();

        let mut conn = Self {
            reader: BufReader::new(reader),
            writer,
            peer,
            epsv: true,
            transfer: false,
        };

        let mut greeting = conn.read_reply().await?;
        while greeting.code.is_preliminary() {
            greeting = conn.read_reply().await?;
        }
        let _ = greeting.expect(&[StatusCode::READY])?;

        Ok(conn)
    }

    /// Authenticates and switches to binary transfers.
    pub async fn login(&mut self, user: &str, pass: &str) -> FtpResult<()> {
        let reply = self.execute(Command::User(user)).await?;
        match reply.code {
            StatusCode::LOGGED_IN => (),
            StatusCode::USER_OK => {
                let _ = self
                    .execute(Command::Pass(pass))
                    .await?
                    .expect(&[StatusCode::LOGGED_IN, StatusCode::COMMAND_SUPERFLUOUS])?;
            }
            _ => return Err(Error::Status(reply)),
        }

        self.simple(Command::TypeBinary, &[StatusCode::COMMAND_OK])
            .await
    }

    async fn send(&mut self, command: Command<'_>) -> FtpResult<()> {
        if self.transfer {
            return Err(Error::UnexpectedBehavior(format!(
                "{command} issued while a transfer is in progress"
            )));
        }

        let bytes = Bytes::try_from(&command)?;
        debug!("> {}", command);
        self.writer.write_all(&bytes).await?;
        Ok(())
    }

    async fn read_reply(&mut self) -> FtpResult<Reply> {
        let reply = read_reply(&mut self.reader).await?;
        debug!("< {}", reply);
        Ok(reply)
    }

    async fn execute(&mut self, command: Command<'_>) -> FtpResult<Reply> {
        self.send(command).await?;
        self.read_reply().await
    }

    async fn simple(&mut self, command: Command<'_>, expected: &[StatusCode]) -> FtpResult<()> {
        self.execute(command).await?.expect(expected).map(|_| ())
    }

    async fn open_data(&mut self) -> FtpResult<TcpStream> {
        let mut port = None;

        if self.epsv {
            let reply = self.execute(Command::Epsv).await?;
            if reply.code == StatusCode::EXTENDED_PASSIVE_MODE {
                port = Some(parse_epsv_port(&reply.message)?);
            } else {
                debug!("EPSV refused ({}), falling back to PASV", reply);
                self.epsv = false;
            }
        }

        let port = match port {
            Some(port) => port,
            None => {
                let reply = self
                    .execute(Command::Pasv)
                    .await?
                    .expect(&[StatusCode::PASSIVE_MODE])?;
                parse_pasv_port(&reply.message)?
            }
        };

        Ok(TcpStream::connect((self.peer, port)).await?)
    }

    /// Opens a data connection, then issues the command that uses it.
    async fn start_transfer(&mut self, command: Command<'_>) -> FtpResult<TcpStream> {
        let data = self.open_data().await?;
        self.simple(command, TRANSFER_STARTED).await?;
        Ok(data)
    }

    async fn end_transfer(&mut self) -> FtpResult<()> {
        let _ = self.read_reply().await?.expect(TRANSFER_COMPLETE)?;
        Ok(())
    }
}

#[async_trait]
impl Session for FtpConnection {
    async fn noop(&mut self) -> FtpResult<()> {
        self.simple(Command::Noop, &[StatusCode::COMMAND_OK]).await
    }

    async fn list(&mut self, path: &str) -> FtpResult<Vec<Entry>> {
        let mut data = self.start_transfer(Command::List(path)).await?;

        let mut raw = Vec::new();
        let _ = data.read_to_end(&mut raw).await?;
        drop(data);

        self.end_transfer().await?;
        Ok(parse_listing(&String::from_utf8_lossy(&raw), Utc::now()))
    }

    async fn make_dir(&mut self, path: &str) -> FtpResult<()> {
        self.simple(Command::MakeDir(path), &[StatusCode::PATH_CREATED])
            .await
    }

    async fn remove_dir(&mut self, path: &str) -> FtpResult<()> {
        self.simple(
            Command::RemoveDir(path),
            &[StatusCode::REQUESTED_FILE_ACTION_OK],
        )
        .await
    }

    async fn rename(&mut self, from: &str, to: &str) -> FtpResult<()> {
        self.simple(
            Command::RenameFrom(from),
            &[StatusCode::REQUEST_FILE_PENDING],
        )
        .await?;
        self.simple(
            Command::RenameTo(to),
            &[StatusCode::REQUESTED_FILE_ACTION_OK],
        )
        .await
    }

    async fn delete(&mut self, path: &str) -> FtpResult<()> {
        self.simple(
            Command::Delete(path),
            &[StatusCode::REQUESTED_FILE_ACTION_OK],
        )
        .await
    }

    async fn retrieve_from(&mut self, path: &str, offset: u64) -> FtpResult<DataStream> {
        let data = self.open_data().await?;

        if offset > 0 {
            self.simple(Command::Rest(offset), &[StatusCode::REQUEST_FILE_PENDING])
                .await?;
        }
        self.simple(Command::Retr(path), TRANSFER_STARTED).await?;

        self.transfer = true;
        Ok(Box::new(data))
    }

    async fn finish_transfer(&mut self) -> FtpResult<()> {
        if !self.transfer {
            return Err(Error::UnexpectedBehavior("no transfer in progress".to_owned()));
        }

        self.transfer = false;
        self.end_transfer().await
    }

    async fn store(
        &mut self,
        path: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> FtpResult<()> {
        let mut data = self.start_transfer(Command::Stor(path)).await?;

        let _ = io::copy(reader, &mut data).await?;
        data.shutdown().await?;
        drop(data);

        self.end_transfer().await
    }

    async fn quit(&mut self) -> FtpResult<()> {
        self.transfer = false;
        let reply = self.execute(Command::Quit).await;
        let _ = self.writer.shutdown().await;
        reply.map(|_| ())
    }
}
