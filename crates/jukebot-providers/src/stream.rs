// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stream openers shared by the providers: helper subprocesses whose
//! stdout is the media stream, and plain HTTP downloads.

use std::pin::Pin;
use std::process::Stdio;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::TryStreamExt;
use jukebot_core::{JukebotError, MediaOpener, MediaStream, ProviderErrorKind};
use tokio::io::{AsyncRead, ReadBuf};
use tokio::process::{Child, ChildStdout, Command};
use tokio_util::io::StreamReader;
use tracing::debug;

/// Opens a media stream by spawning a helper process and reading its
/// stdout. Dropping the stream terminates and reaps the process.
pub struct CommandOpener {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandOpener {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
impl MediaOpener for CommandOpener {
    async fn open(&self) -> Result<MediaStream, JukebotError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                JukebotError::provider(
                    ProviderErrorKind::Internal,
                    format!("failed to start {}: {e}", self.program),
                )
            })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            JukebotError::provider(ProviderErrorKind::Internal, "helper stdout unavailable")
        })?;
        debug!(program = %self.program, "helper process started");
        Ok(Box::new(ProcessStream { child, stdout }))
    }
}

/// A subprocess-backed stream. The child handle rides along so the
/// process dies with the stream.
struct ProcessStream {
    // Held for kill_on_drop.
    #[allow(dead_code)]
    child: Child,
    stdout: ChildStdout,
}

impl AsyncRead for ProcessStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.stdout).poll_read(cx, buf)
    }
}

/// Opens a media stream over HTTP.
pub struct HttpOpener {
    pub client: reqwest::Client,
    pub url: String,
}

#[async_trait]
impl MediaOpener for HttpOpener {
    async fn open(&self) -> Result<MediaStream, JukebotError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| JukebotError::provider(ProviderErrorKind::Network, e.to_string()))?;
        if !response.status().is_success() {
            return Err(JukebotError::provider(
                ProviderErrorKind::Network,
                format!("stream request failed: {}", response.status()),
            ));
        }
        let stream = Box::pin(
            response
                .bytes_stream()
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e)),
        );
        Ok(Box::new(StreamReader::new(stream)))
    }
}
