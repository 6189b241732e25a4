// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted transcoder for running the playback engine without ffmpeg.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use jukebot_core::{JukebotError, MediaStream};
use jukebot_engine::{FrameStream, Transcoder};

/// Emits a fixed number of dummy opus frames, pacing them with a
/// simulated decode gap. Under tokio's paused clock the gap advances
/// virtually, so long "tracks" play out instantly.
pub struct MockTranscoder {
    pub frames: usize,
    pub frame_gap: Duration,
}

impl MockTranscoder {
    /// A transcoder whose stream spans `duration` at one frame per
    /// 20 ms.
    pub fn for_duration(duration: Duration) -> Self {
        Self {
            frames: (duration.as_millis() / 20) as usize,
            frame_gap: Duration::from_millis(20),
        }
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    async fn open(
        &self,
        _source: MediaStream,
        _loudness: Option<f64>,
    ) -> Result<Box<dyn FrameStream>, JukebotError> {
        Ok(Box::new(MockFrames {
            remaining: self.frames,
            gap: self.frame_gap,
        }))
    }
}

struct MockFrames {
    remaining: usize,
    gap: Duration,
}

#[async_trait]
impl FrameStream for MockFrames {
    async fn next_frame(&mut self) -> Result<Option<Bytes>, JukebotError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        tokio::time::sleep(self.gap).await;
        self.remaining -= 1;
        Ok(Some(Bytes::from_static(&[0u8; 8])))
    }

    async fn close(&mut self) -> Result<(), JukebotError> {
        Ok(())
    }
}
