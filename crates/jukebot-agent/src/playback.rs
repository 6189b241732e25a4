// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-tenant playback glue: wires the engine's play callbacks to the
//! status view.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use jukebot_core::{ChannelId, JukebotError, TrackMetadata, VoiceDevice};
use jukebot_engine::{
    EndReason, EngineConfig, HookFuture, IdleHook, NowPlaying, Phase, PlayHooks, PlayRequest,
    PlaybackEngine, Transcoder,
};
use jukebot_status::{debug_footer, now_playing_embed, StatusView};
use tracing::{debug, warn};

/// A tenant's playback engine plus the status view that mirrors it.
pub struct TenantPlayer {
    engine: PlaybackEngine,
    view: Arc<StatusView>,
}

/// Rebuilds and renders the status embed for one play. Shared by all
/// of the play's hooks.
struct StatusRefresher {
    view: Arc<StatusView>,
    engine: PlaybackEngine,
    footer: Mutex<Option<String>>,
    status_channel: ChannelId,
    title: String,
    duration: Duration,
    /// Set once this play has rendered the status message. The view is
    /// shared by every play of the tenant; only the play that rendered
    /// it may clear it. Plays dropped from the queue never render.
    started: AtomicBool,
}

impl StatusRefresher {
    async fn refresh(self: Arc<Self>, paused: bool, elapsed: Duration) {
        let embed = now_playing_embed(
            &self.title,
            paused,
            elapsed,
            self.duration,
            &self.engine.playlist(),
            self.footer.lock().expect("footer lock poisoned").clone(),
        );
        if let Err(e) = self.view.render(&self.status_channel, &embed).await {
            warn!(error = %e, "failed to refresh player status");
        }
    }

    fn set_footer(&self, times: &[Instant]) {
        if let Some(text) = debug_footer(times) {
            *self.footer.lock().expect("footer lock poisoned") = Some(text);
        }
    }
}

impl TenantPlayer {
    /// Builds the engine, idling in `idle_channel` when the queue goes
    /// quiet.
    pub fn new(
        device: Arc<dyn VoiceDevice>,
        transcoder: Arc<dyn Transcoder>,
        view: Arc<StatusView>,
        idle_channel: Option<ChannelId>,
        engine_config: EngineConfig,
    ) -> Self {
        let idle_hook: Option<IdleHook> = idle_channel.map(|channel| {
            let device = device.clone();
            let hook: IdleHook = Box::new(move || {
                let device = device.clone();
                let channel = channel.clone();
                Box::pin(async move {
                    // Join and release: the connection stays parked in
                    // the idle channel.
                    if device.is_voice_channel(&channel).await {
                        match device.open(&channel).await {
                            Ok(mut sink) => {
                                if let Err(e) = sink.close().await {
                                    debug!(error = %e, "idle sink close");
                                }
                            }
                            Err(e) => debug!(error = %e, "idle join failed"),
                        }
                    }
                })
            });
            hook
        });

        Self {
            engine: PlaybackEngine::new(device, transcoder, idle_hook, engine_config),
            view,
        }
    }

    /// Admits a track, wiring its callbacks to the status view: create
    /// on start, edit on pause/resume/progress, delete on end.
    pub async fn enqueue(
        &self,
        metadata: Arc<TrackMetadata>,
        voice_channel: ChannelId,
        status_channel: ChannelId,
        loudness: Option<f64>,
    ) -> Result<(), JukebotError> {
        let refresher = Arc::new(StatusRefresher {
            view: self.view.clone(),
            engine: self.engine.clone(),
            footer: Mutex::new(None),
            status_channel,
            title: metadata.title.clone(),
            duration: metadata.duration,
            started: AtomicBool::new(false),
        });

        let start_ref = refresher.clone();
        let pause_ref = refresher.clone();
        let resume_ref = refresher.clone();
        let end_ref = refresher.clone();
        let progress_ref = refresher;

        let hooks = PlayHooks {
            on_start: Box::new(move || -> HookFuture {
                let refresher = start_ref.clone();
                Box::pin(async move {
                    refresher.started.store(true, Ordering::Release);
                    refresher.refresh(false, Duration::ZERO).await;
                })
            }),
            on_pause: Box::new(move |elapsed: Duration| -> HookFuture {
                Box::pin(pause_ref.clone().refresh(true, elapsed))
            }),
            on_resume: Box::new(move |elapsed: Duration| -> HookFuture {
                Box::pin(resume_ref.clone().refresh(false, elapsed))
            }),
            // Progress edits run on their own task so a slow gateway
            // round trip cannot stall the frame pump.
            on_progress: Box::new(move |elapsed: Duration, times: Vec<Instant>| -> HookFuture {
                progress_ref.set_footer(&times);
                tokio::spawn(progress_ref.clone().refresh(false, elapsed));
                Box::pin(async {})
            }),
            on_end: Box::new(move |_elapsed: Duration, _reason: EndReason| -> HookFuture {
                let refresher = end_ref.clone();
                Box::pin(async move {
                    // A play that never rendered must not delete the
                    // current play's message.
                    if !refresher.started.load(Ordering::Acquire) {
                        return;
                    }
                    if let Err(e) = refresher.view.clear().await {
                        warn!(error = %e, "failed to clear player status");
                    }
                })
            }),
        };

        self.engine
            .put(PlayRequest {
                metadata,
                voice_channel,
                loudness,
                hooks,
            })
            .await
    }

    pub fn skip(&self) {
        self.engine.skip();
    }

    pub fn pause(&self) {
        self.engine.pause();
    }

    pub async fn clear(&self) {
        self.engine.clear().await;
    }

    pub fn playlist(&self) -> Vec<String> {
        self.engine.playlist()
    }

    pub fn now_playing(&self) -> Option<NowPlaying> {
        self.engine.now_playing()
    }

    pub fn phase(&self) -> Phase {
        self.engine.phase()
    }

    pub fn queue_len(&self) -> usize {
        self.engine.queue_len()
    }

    /// Closes the engine (draining the sender and deleting the status
    /// message through the final play's end callback), then sweeps any
    /// leftover status message.
    pub async fn close(&self) -> Result<(), JukebotError> {
        let result = self.engine.close().await;
        if let Err(e) = self.view.clear().await {
            debug!(error = %e, "status sweep after close");
        }
        result
    }
}
