// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The sender: the single worker task that drives playback.
//!
//! One play at a time: acquire the voice channel, open the transcode
//! pipeline, pump frames, report progress, and deliver the end callback
//! exactly once. An empty queue for the idle quiescence runs the
//! configured idle routine.

use std::sync::Arc;
use std::time::{Duration, Instant};

use jukebot_core::{ChannelId, TrackMetadata};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::play::{EndReason, NowPlaying, Play, PlayHooks};
use crate::transcode::FRAME_DURATION;
use crate::{EngineInner, Phase};

pub(crate) async fn run(inner: Arc<EngineInner>) {
    let mut idle_ran = false;
    loop {
        if inner.closing.is_cancelled() {
            break;
        }
        let play = match inner.queue.pop() {
            Some(play) => play,
            None => {
                tokio::select! {
                    _ = inner.closing.cancelled() => break,
                    _ = inner.queue.notified() => continue,
                    _ = tokio::time::sleep(inner.config.idle_quiescence), if !idle_ran => {
                        if let Some(hook) = &inner.idle_hook {
                            debug!("queue quiescent, running idle routine");
                            hook().await;
                        }
                        idle_ran = true;
                        continue;
                    }
                }
            }
        };
        idle_ran = false;
        play_one(&inner, play).await;
    }
    debug!("sender drained");
}

async fn play_one(inner: &Arc<EngineInner>, play: Play) {
    let Play {
        metadata,
        voice_channel,
        loudness,
        mut hooks,
        sequence,
        skip,
    } = play;

    {
        let mut shared = inner.shared.lock().expect("engine state lock poisoned");
        shared.phase = Phase::Playing;
        shared.elapsed = Duration::ZERO;
        shared.skip = Some(skip.clone());
        shared.current = Some(NowPlaying {
            title: metadata.title.clone(),
            duration: metadata.duration,
            metadata: metadata.clone(),
            voice_channel: voice_channel.clone(),
            sequence,
        });
    }
    inner.pause.send_replace(false);

    let (elapsed, reason) = pump(inner, &metadata, &voice_channel, loudness, &skip, &mut hooks).await;

    {
        let mut shared = inner.shared.lock().expect("engine state lock poisoned");
        shared.phase = if inner.closing.is_cancelled() {
            Phase::Closing
        } else {
            Phase::Idle
        };
        shared.current = None;
        shared.skip = None;
        shared.elapsed = Duration::ZERO;
    }

    if reason.is_error() {
        warn!(title = %metadata.title, reason = %reason, "play ended");
    } else {
        info!(title = %metadata.title, elapsed = ?elapsed, reason = %reason, "play ended");
    }

    let voice_failure = matches!(reason, EndReason::VoiceError(_));
    (hooks.on_end)(elapsed, reason).await;

    // Back off briefly after a voice failure so a guild-wide outage
    // does not become a tight dequeue loop.
    if voice_failure && !inner.closing.is_cancelled() {
        tokio::select! {
            _ = inner.closing.cancelled() => {}
            _ = tokio::time::sleep(inner.config.voice_error_cooldown) => {}
        }
    }
}

async fn pump(
    inner: &Arc<EngineInner>,
    metadata: &Arc<TrackMetadata>,
    voice_channel: &ChannelId,
    loudness: Option<f64>,
    skip: &CancellationToken,
    hooks: &mut PlayHooks,
) -> (Duration, EndReason) {
    // Every setup step races against engine close so shutdown is never
    // held up by a slow join or resolve.
    let mut sink = tokio::select! {
        _ = inner.closing.cancelled() => return (Duration::ZERO, EndReason::Closed),
        opened = inner.device.open(voice_channel) => match opened {
            Ok(sink) => sink,
            Err(e) => return (Duration::ZERO, EndReason::VoiceError(e)),
        },
    };

    let source = tokio::select! {
        _ = inner.closing.cancelled() => {
            let _ = sink.close().await;
            return (Duration::ZERO, EndReason::Closed);
        }
        opened = metadata.open_audio() => match opened {
            Ok(source) => source,
            Err(e) => {
                let _ = sink.close().await;
                return (Duration::ZERO, EndReason::ProviderError(e));
            }
        },
    };

    let mut frames = tokio::select! {
        _ = inner.closing.cancelled() => {
            let _ = sink.close().await;
            return (Duration::ZERO, EndReason::Closed);
        }
        opened = inner.transcoder.open(source, loudness) => match opened {
            Ok(frames) => frames,
            Err(e) => {
                let _ = sink.close().await;
                return (Duration::ZERO, EndReason::ProviderError(e));
            }
        },
    };

    (hooks.on_start)().await;

    let mut elapsed = Duration::ZERO;
    let mut frame_times: Vec<Instant> = Vec::new();
    let mut pause_rx = inner.pause.subscribe();
    // Wall-clock cadence, first tick a full interval in; keeps ticking
    // while paused so the view stays fresh.
    let mut progress = tokio::time::interval_at(
        tokio::time::Instant::now() + inner.config.progress_interval,
        inner.config.progress_interval,
    );
    progress.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let reason = 'pump: loop {
        if *pause_rx.borrow_and_update() {
            (hooks.on_pause)(elapsed).await;
            loop {
                tokio::select! {
                    _ = skip.cancelled() => break 'pump EndReason::Skipped,
                    _ = inner.closing.cancelled() => break 'pump EndReason::Closed,
                    _ = progress.tick() => {
                        (hooks.on_progress)(elapsed, std::mem::take(&mut frame_times)).await;
                    }
                    changed = pause_rx.changed() => {
                        if changed.is_err() || !*pause_rx.borrow_and_update() {
                            (hooks.on_resume)(elapsed).await;
                            break;
                        }
                    }
                }
            }
            continue;
        }

        tokio::select! {
            _ = skip.cancelled() => break EndReason::Skipped,
            _ = inner.closing.cancelled() => break EndReason::Closed,
            _ = progress.tick() => {
                (hooks.on_progress)(elapsed, std::mem::take(&mut frame_times)).await;
            }
            _ = pause_rx.changed() => {
                // Handled at the top of the loop.
            }
            frame = frames.next_frame() => match frame {
                Ok(Some(frame)) => {
                    if let Err(e) = sink.write_frame(&frame).await {
                        break EndReason::StreamError(e);
                    }
                    frame_times.push(Instant::now());
                    elapsed += FRAME_DURATION;
                    inner
                        .shared
                        .lock()
                        .expect("engine state lock poisoned")
                        .elapsed = elapsed;
                }
                Ok(None) => break EndReason::Completed,
                Err(e) => break EndReason::StreamError(e),
            },
        }
    };

    if let Err(e) = frames.close().await {
        debug!(error = %e, "transcode close");
    }
    if let Err(e) = sink.close().await {
        debug!(error = %e, "voice sink close");
    }

    (elapsed, reason)
}
