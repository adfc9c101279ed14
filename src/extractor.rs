use std::{io, process::Stdio};

use axum::body::Bytes;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::{Child, ChildStdout, Command},
    task::JoinHandle,
};
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ApiError;

pub const DEFAULT_PROGRAM: &str = "yt-dlp";

const STDERR_TAIL_BYTES: usize = 8 * 1024;

#[derive(Debug, Default, Deserialize)]
pub struct YtDlpInfo {
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<f64>,
    #[serde(default)]
    pub formats: Vec<YtDlpFormat>,
}

impl YtDlpInfo {
    pub fn duration_seconds(&self) -> u64 {
        self.duration
            .filter(|value| value.is_finite() && *value > 0.0)
            .map(|value| value as u64)
            .unwrap_or_default()
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct YtDlpFormat {
    pub ext: Option<String>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub height: Option<u32>,
    pub resolution: Option<String>,
    pub format_note: Option<String>,
    pub filesize: Option<f64>,
    pub filesize_approx: Option<f64>,
    pub url: Option<String>,
}

impl YtDlpFormat {
    pub fn byte_size(&self) -> u64 {
        self.filesize
            .or(self.filesize_approx)
            .filter(|value| value.is_finite() && *value > 0.0)
            .map(|value| value as u64)
            .unwrap_or_default()
    }
}

/// Handle on the external extraction program.
#[derive(Debug, Clone)]
pub struct Extractor {
    program: String,
    base_args: Vec<String>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl Extractor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
        }
    }

    /// Arguments placed before every invocation's own arguments.
    pub fn with_base_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base_args = args.into_iter().map(Into::into).collect();
        self
    }

    fn command(&self, args: &[&str], url: &str) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.base_args)
            .args(args)
            .arg("--")
            .arg(url)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        command
    }

    fn launch_error(&self, error: &io::Error) -> String {
        if error.kind() == io::ErrorKind::NotFound {
            format!(
                "{} is not installed on this system. Install it and restart the server.",
                self.program
            )
        } else {
            format!("Could not run {}: {error}", self.program)
        }
    }

    pub async fn fetch_info(&self, url: &str) -> Result<YtDlpInfo, ApiError> {
        let output = self
            .command(&["-J", "--no-playlist", "--no-warnings"], url)
            .output()
            .await
            .map_err(|error| ApiError::extraction_failed(self.launch_error(&error)))?;

        if !output.status.success() {
            return Err(ApiError::extraction_failed(run_error_message(
                &output.stderr,
            )));
        }

        serde_json::from_slice(&output.stdout).map_err(|error| {
            warn!("Could not parse extractor JSON for URL {:?}: {error}", url);
            ApiError::extraction_failed("Could not read the media metadata returned by the extractor.")
        })
    }

    /// Spawns the extractor writing raw media bytes to stdout and waits for
    /// the first chunk, so a process that fails up front is reported as an
    /// error rather than an empty download.
    pub async fn open_stream(&self, url: &str) -> Result<MediaStream, ApiError> {
        let stream_id = Uuid::new_v4();
        let mut child = self
            .command(&["-o", "-", "--no-playlist", "--no-warnings"], url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| ApiError::stream_failed(self.launch_error(&error)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ApiError::stream_failed("Could not capture extractor output."))?;
        let stderr = child
            .stderr
            .take()
            .map(|pipe| tokio::spawn(drain_tail(pipe)));

        debug!("Stream {stream_id} spawned extractor pid {:?}", child.id());

        let mut media = MediaStream {
            id: stream_id,
            child,
            stdout: ReaderStream::new(stdout),
            stderr,
            pending: None,
            bytes_sent: 0,
            done: false,
            reaped: false,
        };

        match media.stdout.next().await {
            Some(Ok(chunk)) => {
                debug!("Stream {stream_id} received first {} bytes", chunk.len());
                media.pending = Some(chunk);
                Ok(media)
            }
            Some(Err(error)) => Err(ApiError::stream_failed(format!(
                "Could not read extractor output: {error}"
            ))),
            None => {
                let status = media.child.wait().await.map_err(|error| {
                    ApiError::stream_failed(format!("Could not wait for extractor: {error}"))
                })?;
                media.reaped = true;
                let diagnostics = media.stderr_tail().await;

                if status.success() {
                    Err(ApiError::stream_failed("The extractor produced no data."))
                } else {
                    Err(ApiError::stream_failed(run_error_message(&diagnostics)))
                }
            }
        }
    }
}

/// A running extractor whose stdout is being relayed.
///
/// Dropping it before the process has been reaped kills the process; this is
/// how a client disconnect reaches the extractor.
pub struct MediaStream {
    id: Uuid,
    child: Child,
    stdout: ReaderStream<ChildStdout>,
    stderr: Option<JoinHandle<Vec<u8>>>,
    pending: Option<Bytes>,
    bytes_sent: u64,
    done: bool,
    reaped: bool,
}

impl MediaStream {
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[cfg(test)]
    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    async fn stderr_tail(&mut self) -> Vec<u8> {
        match self.stderr.take() {
            Some(handle) => handle.await.unwrap_or_default(),
            None => Vec::new(),
        }
    }

    async fn next_chunk(&mut self) -> Option<io::Result<Bytes>> {
        if self.done {
            return None;
        }

        if let Some(chunk) = self.pending.take() {
            self.bytes_sent += chunk.len() as u64;
            return Some(Ok(chunk));
        }

        match self.stdout.next().await {
            Some(Ok(chunk)) => {
                self.bytes_sent += chunk.len() as u64;
                Some(Ok(chunk))
            }
            Some(Err(error)) => {
                self.done = true;
                Some(Err(error))
            }
            None => {
                self.done = true;
                let status = match self.child.wait().await {
                    Ok(status) => status,
                    Err(error) => return Some(Err(error)),
                };
                self.reaped = true;

                if status.success() {
                    info!(
                        "Stream {} finished after {} bytes",
                        self.id, self.bytes_sent
                    );
                    None
                } else {
                    let diagnostics = self.stderr_tail().await;
                    let message = run_error_message(&diagnostics);
                    warn!(
                        "Stream {} failed after {} bytes: {message}",
                        self.id, self.bytes_sent
                    );
                    Some(Err(io::Error::other(message)))
                }
            }
        }
    }

    /// Byte stream suitable for a response body. An extractor failure after
    /// the first byte surfaces as an error item, which aborts the response.
    pub fn into_body_stream(self) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
        futures::stream::unfold(self, |mut media| async move {
            let item = media.next_chunk().await?;
            Some((item, media))
        })
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        if self.reaped {
            return;
        }

        info!(
            "Stream {} closed after {} bytes; stopping extractor",
            self.id, self.bytes_sent
        );
        if let Err(error) = self.child.start_kill() {
            debug!("Stream {} kill failed: {error}", self.id);
        }
    }
}

async fn drain_tail<R: AsyncRead + Unpin>(mut reader: R) -> Vec<u8> {
    let mut tail = Vec::new();
    let mut buffer = [0u8; 4096];

    loop {
        match reader.read(&mut buffer).await {
            Ok(0) | Err(_) => break,
            Ok(read) => {
                tail.extend_from_slice(&buffer[..read]);
                if tail.len() > STDERR_TAIL_BYTES {
                    let excess = tail.len() - STDERR_TAIL_BYTES;
                    tail.drain(..excess);
                }
            }
        }
    }

    tail
}

pub fn run_error_message(stderr: &[u8]) -> String {
    let message = String::from_utf8_lossy(stderr)
        .lines()
        .flat_map(|line| line.split('\r'))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .next_back()
        .unwrap_or("The extractor could not complete the request.")
        .to_string();

    if message.to_ascii_lowercase().contains("unsupported url") {
        "Unsupported or invalid URL for download.".to_string()
    } else {
        message
    }
}
