//! IPC Client
//!
//! Blocking Unix socket client used by `clipmind-ctl` and the tests.

use anyhow::Result;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use super::{socket_path, IpcRequest, IpcResponse};

static NEXT_SEQ_ID: AtomicU64 = AtomicU64::new(1);

pub fn next_seq_id() -> u64 {
    NEXT_SEQ_ID.fetch_add(1, Ordering::SeqCst)
}

/// IPC Client for the presentation layer
pub struct IpcClient {
    path: PathBuf,
    timeout: Duration,
}

impl Default for IpcClient {
    fn default() -> Self {
        Self::new(socket_path())
    }
}

impl IpcClient {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the daemon is running
    pub fn is_daemon_running(&self) -> bool {
        self.path.exists() && UnixStream::connect(&self.path).is_ok()
    }

    fn connect(&self, request: &IpcRequest) -> Result<BufReader<UnixStream>> {
        let mut stream = UnixStream::connect(&self.path)?;
        stream.set_write_timeout(Some(self.timeout))?;

        let request_json = serde_json::to_string(request)? + "\n";
        stream.write_all(request_json.as_bytes())?;
        Ok(BufReader::new(stream))
    }

    fn read_response(reader: &mut BufReader<UnixStream>) -> Result<IpcResponse> {
        let mut line = String::new();
        let read = reader.read_line(&mut line)?;
        if read == 0 {
            anyhow::bail!("daemon closed the connection");
        }
        let response: IpcResponse = serde_json::from_str(line.trim())?;
        debug!("📨 IPC response: {:?}", response);
        Ok(response)
    }

    /// Send one request and wait for its reply
    pub fn send(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let mut reader = self.connect(request)?;
        reader.get_ref().set_read_timeout(Some(self.timeout))?;
        let response = Self::read_response(&mut reader)?;

        let expected = request.seq_id();
        match &response {
            IpcResponse::Ack { seq_id, .. } | IpcResponse::StatusResponse { seq_id, .. }
                if *seq_id != expected && *seq_id != 0 =>
            {
                anyhow::bail!(
                    "IPC sequence ID mismatch: expected {}, got {}",
                    expected,
                    seq_id
                )
            }
            _ => Ok(response),
        }
    }

    /// Open a subscription; the returned stream yields events until the
    /// daemon goes away.
    pub fn subscribe(&self) -> Result<Subscription> {
        let request = IpcRequest::Subscribe {
            seq_id: next_seq_id(),
        };
        let mut reader = self.connect(&request)?;
        reader.get_ref().set_read_timeout(Some(self.timeout))?;
        match Self::read_response(&mut reader)? {
            IpcResponse::Ack { success: true, .. } => {}
            other => anyhow::bail!("Unexpected subscribe response: {:?}", other),
        }
        reader.get_ref().set_read_timeout(None)?;
        Ok(Subscription { reader })
    }
}

/// Streaming connection created by [`IpcClient::subscribe`]
pub struct Subscription {
    reader: BufReader<UnixStream>,
}

impl Subscription {
    /// Bound the wait for the next event
    pub fn set_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        self.reader.get_ref().set_read_timeout(timeout)?;
        Ok(())
    }

    /// Block for the next event
    pub fn next_event(&mut self) -> Result<IpcResponse> {
        IpcClient::read_response(&mut self.reader)
    }
}
