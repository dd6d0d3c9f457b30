#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use std::{
    collections::BTreeMap,
    io,
    pin::Pin,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard,
    },
    task::{Context, Poll},
};
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

use ftpfs::{
    client::{Connector, DataStream, Session},
    protocol::{Entry, EntryType, Reply, StatusCode},
    Config, Error, FtpResult, Fs, Opened,
};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn mtime() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 0).unwrap()
}

pub fn config() -> Config {
    Config {
        user: Some("tester".to_owned()),
        pass: "secret".to_owned(),
        ..Config::new("memory")
    }
}

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(Vec<u8>),
}

#[derive(Default)]
struct State {
    nodes: BTreeMap<String, Node>,
    broken: bool,
    fail_next: bool,
    fail_reads: bool,
    refuse_login: bool,
    log: Vec<String>,
}

#[derive(Default)]
pub struct Counters {
    dials: AtomicUsize,
    quits: AtomicUsize,
    probes: AtomicUsize,
}

fn normalize(path: &str) -> String {
    match path.trim_start_matches('/') {
        "." => String::new(),
        p => p.to_owned(),
    }
}

fn parent(path: &str) -> String {
    path.rfind('/')
        .map_or_else(String::new, |i| path[..i].to_owned())
}

fn name(path: &str) -> &str {
    path.rfind('/').map_or(path, |i| &path[i + 1..])
}

fn unavailable(message: &str) -> Error {
    Error::Status(Reply::new(StatusCode::FILE_UNAVAILABLE, message))
}

impl State {
    fn is_dir(&self, path: &str) -> bool {
        path.is_empty() || matches!(self.nodes.get(path), Some(Node::Dir))
    }

    fn exists(&self, path: &str) -> bool {
        path.is_empty() || self.nodes.contains_key(path)
    }

    fn children(&self, dir: &str) -> Vec<String> {
        self.nodes
            .keys()
            .filter(|k| parent(k) == dir)
            .cloned()
            .collect()
    }
}

/// An FTP server kept in memory, with knobs to inject failures and
/// counters for what happened to its sessions.
#[derive(Clone, Default)]
pub struct MemoryServer {
    state: Arc<Mutex<State>>,
    counters: Arc<Counters>,
}

impl MemoryServer {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn mkdir_all(&self, path: &str) {
        let mut state = self.state();
        let mut current = String::new();
        for part in path.split('/') {
            current = if current.is_empty() {
                part.to_owned()
            } else {
                format!("{current}/{part}")
            };
            let _ = state.nodes.entry(current.clone()).or_insert(Node::Dir);
        }
    }

    pub fn put_file(&self, path: &str, data: &[u8]) {
        let dir = parent(path);
        if !dir.is_empty() {
            self.mkdir_all(&dir);
        }
        let _ = self
            .state()
            .nodes
            .insert(path.to_owned(), Node::File(data.to_vec()));
    }

    pub fn exists(&self, path: &str) -> bool {
        self.state().exists(path)
    }

    pub fn is_dir(&self, path: &str) -> bool {
        self.state().is_dir(path)
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        match self.state().nodes.get(path) {
            Some(Node::File(data)) => Some(data.clone()),
            _ => None,
        }
    }

    /// Every command fails at the transport level, probes included
    pub fn set_broken(&self, broken: bool) {
        self.state().broken = broken;
    }

    /// Only the next command fails at the transport level
    pub fn fail_next(&self) {
        self.state().fail_next = true;
    }

    /// Data streams of downloads fail on the first read
    pub fn set_fail_reads(&self, fail: bool) {
        self.state().fail_reads = fail;
    }

    pub fn set_refuse_login(&self, refuse: bool) {
        self.state().refuse_login = refuse;
    }

    /// Commands received so far, e.g. `MKD a/b`
    pub fn log(&self) -> Vec<String> {
        self.state().log.clone()
    }

    pub fn clear_log(&self) {
        self.state().log.clear();
    }

    pub fn count(&self, verb: &str) -> usize {
        self.log()
            .iter()
            .filter(|c| c.split(' ').next() == Some(verb))
            .count()
    }

    pub fn dials(&self) -> usize {
        self.counters.dials.load(Ordering::SeqCst)
    }

    pub fn quits(&self) -> usize {
        self.counters.quits.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.counters.probes.load(Ordering::SeqCst)
    }

    pub fn connector(&self) -> MemoryConnector {
        MemoryConnector {
            server: self.clone(),
        }
    }

    pub async fn open(&self, root: &str) -> FtpResult<Opened> {
        self.open_with(root, &config()).await
    }

    pub async fn open_with(&self, root: &str, config: &Config) -> FtpResult<Opened> {
        Fs::with_connector("memory", root, config, self.connector()).await
    }

    pub async fn fs(&self, root: &str) -> Fs {
        self.open(root).await.unwrap().into_fs()
    }
}

pub struct MemoryConnector {
    server: MemoryServer,
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self) -> FtpResult<Box<dyn Session>> {
        let _ = self.server.counters.dials.fetch_add(1, Ordering::SeqCst);

        if self.server.state().refuse_login {
            let reply = Reply::new(StatusCode::NOT_LOGGED_IN, "Login incorrect");
            return Err(Error::Status(reply).context("login"));
        }

        Ok(Box::new(MemorySession {
            server: self.server.clone(),
            transfer: None,
        }))
    }
}

struct MemorySession {
    server: MemoryServer,
    transfer: Option<Arc<AtomicBool>>,
}

impl MemorySession {
    fn command(&self, line: String) -> FtpResult<MutexGuard<'_, State>> {
        let mut state = self.server.state();
        state.log.push(line.clone());

        if state.broken || std::mem::take(&mut state.fail_next) {
            return Err(Error::IO("connection reset by peer".to_owned()));
        }
        if self.transfer.is_some() {
            return Err(Error::UnexpectedBehavior(format!(
                "{line} issued while a transfer is in progress"
            )));
        }

        Ok(state)
    }
}

#[async_trait]
impl Session for MemorySession {
    async fn noop(&mut self) -> FtpResult<()> {
        let _ = self.server.counters.probes.fetch_add(1, Ordering::SeqCst);
        self.command("NOOP".to_owned()).map(|_| ())
    }

    async fn list(&mut self, path: &str) -> FtpResult<Vec<Entry>> {
        let state = self.command(format!("LIST {path}"))?;
        let path = normalize(path);

        if !state.is_dir(&path) {
            return Err(unavailable("No such directory"));
        }

        let folder = |name: &str| Entry {
            name: name.to_owned(),
            entry_type: EntryType::Folder,
            size: 0,
            time: mtime(),
        };

        let mut entries = vec![folder("."), folder("..")];
        for child in state.children(&path) {
            entries.push(match &state.nodes[&child] {
                Node::Dir => folder(name(&child)),
                Node::File(data) => Entry {
                    name: name(&child).to_owned(),
                    entry_type: EntryType::File,
                    size: data.len() as u64,
                    time: mtime(),
                },
            });
        }

        Ok(entries)
    }

    async fn make_dir(&mut self, path: &str) -> FtpResult<()> {
        let mut state = self.command(format!("MKD {path}"))?;
        let path = normalize(path);

        if state.exists(&path) {
            return Err(unavailable("File exists"));
        }
        if !state.is_dir(&parent(&path)) {
            return Err(unavailable("No such directory"));
        }

        let _ = state.nodes.insert(path, Node::Dir);
        Ok(())
    }

    async fn remove_dir(&mut self, path: &str) -> FtpResult<()> {
        let mut state = self.command(format!("RMD {path}"))?;
        let path = normalize(path);

        if path.is_empty() || !state.is_dir(&path) {
            return Err(unavailable("No such directory"));
        }
        if !state.children(&path).is_empty() {
            return Err(unavailable("Directory not empty"));
        }

        let _ = state.nodes.remove(&path);
        Ok(())
    }

    async fn rename(&mut self, from: &str, to: &str) -> FtpResult<()> {
        let mut state = self.command(format!("RNFR {from}"))?;
        state.log.push(format!("RNTO {to}"));
        let (from, to) = (normalize(from), normalize(to));

        if from.is_empty() || !state.exists(&from) {
            return Err(unavailable("No such file or directory"));
        }
        if !state.is_dir(&parent(&to)) {
            return Err(unavailable("No such directory"));
        }

        let prefix = format!("{from}/");
        let moved: Vec<String> = state
            .nodes
            .keys()
            .filter(|k| **k == from || k.starts_with(&prefix))
            .cloned()
            .collect();

        for old in moved {
            if let Some(node) = state.nodes.remove(&old) {
                let new = format!("{to}{}", &old[from.len()..]);
                let _ = state.nodes.insert(new, node);
            }
        }

        Ok(())
    }

    async fn delete(&mut self, path: &str) -> FtpResult<()> {
        let mut state = self.command(format!("DELE {path}"))?;
        let path = normalize(path);

        match state.nodes.get(&path) {
            Some(Node::File(_)) => {
                let _ = state.nodes.remove(&path);
                Ok(())
            }
            _ => Err(unavailable("No such file")),
        }
    }

    async fn retrieve_from(&mut self, path: &str, offset: u64) -> FtpResult<DataStream> {
        let state = self.command(format!("RETR {path} @{offset}"))?;

        let Some(Node::File(data)) = state.nodes.get(&normalize(path)) else {
            return Err(unavailable("No such file"));
        };

        let start = usize::try_from(offset).unwrap().min(data.len());
        let data = Bytes::copy_from_slice(&data[start..]);
        let done = Arc::new(AtomicBool::new(data.is_empty()));
        let fail = state.fail_reads;
        drop(state);

        self.transfer = Some(Arc::clone(&done));
        Ok(Box::new(TrackedReader { data, done, fail }))
    }

    async fn finish_transfer(&mut self) -> FtpResult<()> {
        let Some(done) = self.transfer.take() else {
            return Err(Error::UnexpectedBehavior("no transfer in progress".to_owned()));
        };

        drop(self.command("FINISH".to_owned())?);

        if done.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::Status(Reply::new(
                StatusCode::TRANSFER_ABORTED,
                "Transfer aborted",
            )))
        }
    }

    async fn store(
        &mut self,
        path: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> FtpResult<()> {
        let path = normalize(path);
        {
            let mut state = self.command(format!("STOR {path}"))?;
            if !state.is_dir(&parent(&path)) {
                return Err(unavailable("No such directory"));
            }
            let _ = state.nodes.insert(path.clone(), Node::File(Vec::new()));
        }

        let mut data = Vec::new();
        let result = reader.read_to_end(&mut data).await;

        // whatever arrived before a failure stays on the server
        let _ = self.server.state().nodes.insert(path, Node::File(data));
        result.map(|_| ()).map_err(Error::from)
    }

    async fn quit(&mut self) -> FtpResult<()> {
        let _ = self.server.counters.quits.fetch_add(1, Ordering::SeqCst);
        self.server.state().log.push("QUIT".to_owned());
        Ok(())
    }
}

/// Data channel of a download; remembers whether it was read to the end.
struct TrackedReader {
    data: Bytes,
    done: Arc<AtomicBool>,
    fail: bool,
}

impl AsyncRead for TrackedReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.fail {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "data connection reset",
            )));
        }

        let n = self.data.len().min(buf.remaining());
        let chunk = self.data.split_to(n);
        buf.put_slice(&chunk);

        if self.data.is_empty() {
            self.done.store(true, Ordering::SeqCst);
        }

        Poll::Ready(Ok(()))
    }
}

/// Yields `prefix`, then fails.
pub struct FailingReader {
    prefix: Option<Vec<u8>>,
}

impl FailingReader {
    pub fn new(prefix: &[u8]) -> Self {
        Self {
            prefix: Some(prefix.to_vec()),
        }
    }
}

impl AsyncRead for FailingReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.prefix.take() {
            Some(prefix) => {
                buf.put_slice(&prefix);
                Poll::Ready(Ok(()))
            }
            None => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "source went away",
            ))),
        }
    }
}
