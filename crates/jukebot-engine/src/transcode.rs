// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transcode pipeline: provider bytes in, fixed-size opus frames out.
//!
//! The production implementation decodes through an ffmpeg subprocess
//! (any container/codec to raw PCM, with optional loudness
//! normalization) and encodes 20 ms opus frames. The engine only sees
//! the [`Transcoder`] / [`FrameStream`] traits, so tests can run the
//! sender without ffmpeg installed.

use async_trait::async_trait;
use bytes::Bytes;
use jukebot_core::{JukebotError, MediaStream};
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Output sample rate. Fixed by the voice transport.
pub const SAMPLE_RATE: u32 = 48_000;
/// Output channel count.
pub const CHANNELS: usize = 2;
/// Frame length in milliseconds.
pub const FRAME_MILLIS: u64 = 20;
/// One frame of playback time.
pub const FRAME_DURATION: std::time::Duration = std::time::Duration::from_millis(FRAME_MILLIS);
/// Samples per channel in one frame.
pub const SAMPLES_PER_FRAME: usize = (SAMPLE_RATE as usize / 1000) * FRAME_MILLIS as usize;
/// Bytes of s16le PCM in one interleaved stereo frame.
pub const PCM_FRAME_BYTES: usize = SAMPLES_PER_FRAME * CHANNELS * 2;
/// Encoder bitrate in bits per second.
pub const BITRATE: i32 = 128_000;
/// Upper bound on one encoded opus frame.
const MAX_OPUS_FRAME: usize = 4000;

/// Opens transcode pipelines over provider streams.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Wraps the source in an opus-frame producer. `loudness` is an
    /// integrated loudness target; `None` leaves the stream unchanged.
    async fn open(
        &self,
        source: MediaStream,
        loudness: Option<f64>,
    ) -> Result<Box<dyn FrameStream>, JukebotError>;
}

/// Produces encoded opus frames until the source is exhausted.
#[async_trait]
pub trait FrameStream: Send {
    /// The next 20 ms frame, or `None` at end of stream. Errors are
    /// fatal for the play. Implementations must be cancellation-safe:
    /// a dropped call loses no buffered input.
    async fn next_frame(&mut self) -> Result<Option<Bytes>, JukebotError>;

    /// Tears the pipeline down, releasing subprocesses and the source.
    async fn close(&mut self) -> Result<(), JukebotError>;
}

/// ffmpeg-backed transcoder.
pub struct FfmpegTranscoder {
    ffmpeg_path: String,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn open(
        &self,
        mut source: MediaStream,
        loudness: Option<f64>,
    ) -> Result<Box<dyn FrameStream>, JukebotError> {
        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.args(["-hide_banner", "-loglevel", "error", "-i", "pipe:0"]);
        if let Some(target) = loudness {
            cmd.arg("-af").arg(format!("loudnorm=I={target:.1}"));
        }
        cmd.args(["-f", "s16le", "-ar"])
            .arg(SAMPLE_RATE.to_string())
            .arg("-ac")
            .arg(CHANNELS.to_string())
            .arg("pipe:1");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| JukebotError::Internal(format!("failed to spawn ffmpeg: {e}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| JukebotError::Internal("ffmpeg stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| JukebotError::Internal("ffmpeg stdout unavailable".into()))?;

        // Feed the provider stream into ffmpeg; dropping stdin at EOF
        // closes the pipe and lets ffmpeg flush.
        let feed = tokio::spawn(async move {
            if let Err(e) = tokio::io::copy(&mut source, &mut stdin).await {
                debug!(error = %e, "provider stream copy ended");
            }
        });

        let mut encoder =
            opus::Encoder::new(SAMPLE_RATE, opus::Channels::Stereo, opus::Application::Audio)
                .map_err(map_opus_err)?;
        encoder
            .set_bitrate(opus::Bitrate::Bits(BITRATE))
            .map_err(map_opus_err)?;

        debug!(loudness = ?loudness, "transcode pipeline opened");

        Ok(Box::new(FfmpegFrameStream {
            child,
            stdout,
            feed,
            encoder,
            pcm: [0u8; PCM_FRAME_BYTES],
            fill: 0,
            samples: [0i16; SAMPLES_PER_FRAME * CHANNELS],
            encoded: [0u8; MAX_OPUS_FRAME],
            eof: false,
        }))
    }
}

struct FfmpegFrameStream {
    child: Child,
    stdout: ChildStdout,
    feed: JoinHandle<()>,
    encoder: opus::Encoder,
    /// Partial PCM frame carried across cancelled reads.
    pcm: [u8; PCM_FRAME_BYTES],
    fill: usize,
    samples: [i16; SAMPLES_PER_FRAME * CHANNELS],
    encoded: [u8; MAX_OPUS_FRAME],
    eof: bool,
}

impl FfmpegFrameStream {
    fn encode_current(&mut self) -> Result<Bytes, JukebotError> {
        for (i, chunk) in self.pcm.chunks_exact(2).enumerate() {
            self.samples[i] = i16::from_le_bytes([chunk[0], chunk[1]]);
        }
        let written = self
            .encoder
            .encode(&self.samples, &mut self.encoded)
            .map_err(map_opus_err)?;
        self.fill = 0;
        Ok(Bytes::copy_from_slice(&self.encoded[..written]))
    }
}

#[async_trait]
impl FrameStream for FfmpegFrameStream {
    async fn next_frame(&mut self) -> Result<Option<Bytes>, JukebotError> {
        if self.eof {
            return Ok(None);
        }
        // Single `read` calls are cancellation-safe; `self.fill` carries
        // partial frames across dropped futures.
        while self.fill < PCM_FRAME_BYTES {
            let n = self
                .stdout
                .read(&mut self.pcm[self.fill..])
                .await
                .map_err(|e| JukebotError::Internal(format!("transcode read: {e}")))?;
            if n == 0 {
                self.eof = true;
                if self.fill == 0 {
                    return Ok(None);
                }
                // Zero-pad the trailing partial frame.
                self.pcm[self.fill..].fill(0);
                return self.encode_current().map(Some);
            }
            self.fill += n;
        }
        self.encode_current().map(Some)
    }

    async fn close(&mut self) -> Result<(), JukebotError> {
        self.feed.abort();
        if let Err(e) = self.child.start_kill() {
            debug!(error = %e, "ffmpeg already exited");
        }
        match self.child.wait().await {
            Ok(status) => debug!(?status, "ffmpeg reaped"),
            Err(e) => warn!(error = %e, "failed to reap ffmpeg"),
        }
        Ok(())
    }
}

fn map_opus_err(err: opus::Error) -> JukebotError {
    JukebotError::Internal(format!("opus encoder: {err}"))
}
