// SPDX-FileCopyrightText: 2026 Jukebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Playback engine: bounded FIFO queue plus a single-worker sender with
//! pause/skip/clear semantics, graceful idle, and progress reporting.
//!
//! The engine owns all playback state. Callers observe it only through
//! snapshot accessors; mutation happens via the public operations, all
//! of which are safe to call from any task.

mod queue;
mod sender;

pub mod play;
pub mod transcode;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use jukebot_core::{JukebotError, VoiceDevice};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub use play::{EndReason, HookFuture, NowPlaying, PlayHooks, PlayRequest};
pub use transcode::{
    FfmpegTranscoder, FrameStream, Transcoder, BITRATE, CHANNELS, FRAME_DURATION, FRAME_MILLIS,
    PCM_FRAME_BYTES, SAMPLES_PER_FRAME, SAMPLE_RATE,
};

use play::Play;
use queue::SongQueue;

/// Async routine run when the queue has been empty for the idle
/// quiescence (typically: rejoin the tenant's idle voice channel).
pub type IdleHook = Box<dyn Fn() -> HookFuture + Send + Sync>;

/// Where the engine is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    Idle,
    Playing,
    Paused,
    Skipping,
    Closing,
}

/// Engine tuning knobs. The defaults are the contract values; tests
/// shrink them where wall-clock waits would dominate.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum queued (not yet playing) plays.
    pub queue_capacity: usize,
    /// Empty-queue duration before the idle routine runs.
    pub idle_quiescence: Duration,
    /// Progress callback cadence (wall-clock; first tick one interval in).
    pub progress_interval: Duration,
    /// Pause after a voice open failure before the next dequeue.
    pub voice_error_cooldown: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 10,
            idle_quiescence: Duration::from_millis(1000),
            progress_interval: Duration::from_secs(5),
            voice_error_cooldown: Duration::from_secs(1),
        }
    }
}

pub(crate) struct Shared {
    pub phase: Phase,
    pub current: Option<NowPlaying>,
    pub skip: Option<CancellationToken>,
    pub elapsed: Duration,
}

pub(crate) struct EngineInner {
    pub device: Arc<dyn VoiceDevice>,
    pub transcoder: Arc<dyn Transcoder>,
    pub idle_hook: Option<IdleHook>,
    pub config: EngineConfig,
    pub queue: SongQueue,
    pub shared: Mutex<Shared>,
    pub pause: watch::Sender<bool>,
    pub closing: CancellationToken,
    closed: AtomicBool,
    sequence: AtomicU64,
    sender_task: Mutex<Option<JoinHandle<()>>>,
}

/// Handle to one tenant's playback engine. Cheap to clone.
#[derive(Clone)]
pub struct PlaybackEngine {
    inner: Arc<EngineInner>,
}

impl PlaybackEngine {
    /// Creates the engine and spawns its sender task. Must be called
    /// from within a tokio runtime.
    pub fn new(
        device: Arc<dyn VoiceDevice>,
        transcoder: Arc<dyn Transcoder>,
        idle_hook: Option<IdleHook>,
        config: EngineConfig,
    ) -> Self {
        let (pause, _) = watch::channel(false);
        let inner = Arc::new(EngineInner {
            device,
            transcoder,
            idle_hook,
            queue: SongQueue::new(config.queue_capacity),
            config,
            shared: Mutex::new(Shared {
                phase: Phase::Idle,
                current: None,
                skip: None,
                elapsed: Duration::ZERO,
            }),
            pause,
            closing: CancellationToken::new(),
            closed: AtomicBool::new(false),
            sequence: AtomicU64::new(0),
            sender_task: Mutex::new(None),
        });

        let handle = tokio::spawn(sender::run(inner.clone()));
        *inner
            .sender_task
            .lock()
            .expect("sender slot lock poisoned") = Some(handle);

        Self { inner }
    }

    /// Admits a play. Non-blocking: the request is either queued in
    /// insertion order or rejected.
    pub async fn put(&self, request: PlayRequest) -> Result<(), JukebotError> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(JukebotError::Closed);
        }
        if !self
            .inner
            .device
            .is_voice_channel(&request.voice_channel)
            .await
        {
            return Err(JukebotError::InvalidVoiceChannel);
        }
        let sequence = self.inner.sequence.fetch_add(1, Ordering::Relaxed);
        self.inner.queue.push(Play {
            metadata: request.metadata,
            voice_channel: request.voice_channel,
            loudness: request.loudness,
            hooks: request.hooks,
            sequence,
            skip: CancellationToken::new(),
        })
    }

    /// Ends the current play early. No-op when nothing is playing.
    pub fn skip(&self) {
        let mut shared = self.inner.shared.lock().expect("engine state lock poisoned");
        if let Some(token) = &shared.skip {
            token.cancel();
            shared.phase = Phase::Skipping;
        }
    }

    /// Toggles pause. No-op at idle.
    pub fn pause(&self) {
        let next = {
            let mut shared = self.inner.shared.lock().expect("engine state lock poisoned");
            match shared.phase {
                Phase::Playing => {
                    shared.phase = Phase::Paused;
                    Some(true)
                }
                Phase::Paused => {
                    shared.phase = Phase::Playing;
                    Some(false)
                }
                _ => None,
            }
        };
        if let Some(paused) = next {
            self.inner.pause.send_replace(paused);
        }
    }

    /// Drops every queued play (never the current one), delivering each
    /// dropped play's end callback.
    pub async fn clear(&self) {
        let drained = self.inner.queue.drain();
        let dropped = drained.len();
        for play in drained {
            (play.hooks.on_end)(Duration::ZERO, EndReason::Cleared).await;
        }
        if dropped > 0 {
            debug!(dropped, "queue cleared");
        }
    }

    /// Titles of queued plays, admission order.
    pub fn playlist(&self) -> Vec<String> {
        self.inner.queue.titles()
    }

    /// Snapshot of the current play, if any.
    pub fn now_playing(&self) -> Option<NowPlaying> {
        self.inner
            .shared
            .lock()
            .expect("engine state lock poisoned")
            .current
            .clone()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.inner
            .shared
            .lock()
            .expect("engine state lock poisoned")
            .phase
    }

    /// Elapsed playback time of the current play.
    pub fn elapsed(&self) -> Duration {
        self.inner
            .shared
            .lock()
            .expect("engine state lock poisoned")
            .elapsed
    }

    /// Number of queued (not yet playing) plays.
    pub fn queue_len(&self) -> usize {
        self.inner.queue.len()
    }

    /// Terminates the sender. The first call drops the queue (each
    /// dropped play sees its end callback), lets the current play end
    /// with `Closed`, and waits for the sender to drain. Later calls
    /// fail with `Closed`.
    pub async fn close(&self) -> Result<(), JukebotError> {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return Err(JukebotError::Closed);
        }
        self.inner
            .shared
            .lock()
            .expect("engine state lock poisoned")
            .phase = Phase::Closing;
        self.inner.closing.cancel();

        for play in self.inner.queue.drain() {
            (play.hooks.on_end)(Duration::ZERO, EndReason::Closed).await;
        }

        let handle = self
            .inner
            .sender_task
            .lock()
            .expect("sender slot lock poisoned")
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        debug!("engine closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use bytes::Bytes;
    use jukebot_core::{
        ChannelId, JukebotError, MediaOpener, MediaSource, MediaStream, TrackMetadata, VoiceSink,
    };
    use tokio::sync::Notify;

    use super::*;

    // --- test doubles -------------------------------------------------

    struct SilenceOpener;

    #[async_trait]
    impl MediaOpener for SilenceOpener {
        async fn open(&self) -> Result<MediaStream, JukebotError> {
            Ok(Box::new(tokio::io::empty()))
        }
    }

    fn track(title: &str, secs: u64) -> Arc<TrackMetadata> {
        Arc::new(TrackMetadata {
            title: title.to_string(),
            duration: Duration::from_secs(secs),
            source: MediaSource::Audio(Box::new(SilenceOpener)),
        })
    }

    struct CountingSink {
        frames: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl VoiceSink for CountingSink {
        async fn write_frame(&mut self, _frame: &[u8]) -> Result<(), JukebotError> {
            self.frames.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        async fn close(&mut self) -> Result<(), JukebotError> {
            Ok(())
        }
    }

    struct TestDevice {
        valid: bool,
        fail_open: bool,
        gate: Option<Arc<Notify>>,
        frames: Arc<AtomicUsize>,
    }

    impl TestDevice {
        fn working() -> Self {
            Self {
                valid: true,
                fail_open: false,
                gate: None,
                frames: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl VoiceDevice for TestDevice {
        async fn is_voice_channel(&self, _channel: &ChannelId) -> bool {
            self.valid
        }

        async fn open(&self, _channel: &ChannelId) -> Result<Box<dyn VoiceSink>, JukebotError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail_open {
                return Err(JukebotError::gateway("voice backend down"));
            }
            Ok(Box::new(CountingSink {
                frames: self.frames.clone(),
            }))
        }
    }

    /// Emits `frames` dummy opus frames with a simulated decode gap.
    struct ScriptTranscoder {
        frames: usize,
        gap: Duration,
    }

    #[async_trait]
    impl Transcoder for ScriptTranscoder {
        async fn open(
            &self,
            _source: MediaStream,
            _loudness: Option<f64>,
        ) -> Result<Box<dyn FrameStream>, JukebotError> {
            Ok(Box::new(ScriptFrames {
                remaining: self.frames,
                gap: self.gap,
            }))
        }
    }

    struct ScriptFrames {
        remaining: usize,
        gap: Duration,
    }

    #[async_trait]
    impl FrameStream for ScriptFrames {
        async fn next_frame(&mut self) -> Result<Option<Bytes>, JukebotError> {
            if self.remaining == 0 {
                return Ok(None);
            }
            tokio::time::sleep(self.gap).await;
            self.remaining -= 1;
            Ok(Some(Bytes::from_static(&[0u8; 4])))
        }

        async fn close(&mut self) -> Result<(), JukebotError> {
            Ok(())
        }
    }

    type EventLog = Arc<StdMutex<Vec<String>>>;

    fn recording_hooks(log: EventLog) -> PlayHooks {
        let start_log = log.clone();
        let pause_log = log.clone();
        let resume_log = log.clone();
        let progress_log = log.clone();
        let end_log = log;
        PlayHooks {
            on_start: Box::new(move || {
                start_log.lock().unwrap().push("start".into());
                Box::pin(async {})
            }),
            on_pause: Box::new(move |elapsed| {
                pause_log
                    .lock()
                    .unwrap()
                    .push(format!("pause:{}", elapsed.as_millis()));
                Box::pin(async {})
            }),
            on_resume: Box::new(move |elapsed| {
                resume_log
                    .lock()
                    .unwrap()
                    .push(format!("resume:{}", elapsed.as_millis()));
                Box::pin(async {})
            }),
            on_progress: Box::new(move |elapsed, _times| {
                progress_log
                    .lock()
                    .unwrap()
                    .push(format!("progress:{}", elapsed.as_millis()));
                Box::pin(async {})
            }),
            on_end: Box::new(move |elapsed, reason| {
                end_log
                    .lock()
                    .unwrap()
                    .push(format!("end:{}:{}", elapsed.as_millis(), short_reason(&reason)));
                Box::pin(async {})
            }),
        }
    }

    fn short_reason(reason: &EndReason) -> &'static str {
        match reason {
            EndReason::Completed => "completed",
            EndReason::Skipped => "skipped",
            EndReason::Cleared => "cleared",
            EndReason::Closed => "closed",
            EndReason::ProviderError(_) => "provider",
            EndReason::VoiceError(_) => "voice",
            EndReason::StreamError(_) => "stream",
        }
    }

    fn request(title: &str, log: &EventLog) -> PlayRequest {
        PlayRequest {
            metadata: track(title, 180),
            voice_channel: ChannelId("vc".into()),
            loudness: None,
            hooks: recording_hooks(log.clone()),
        }
    }

    fn events(log: &EventLog) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    async fn wait_for<F: Fn() -> bool>(cond: F) {
        for _ in 0..10_000 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition never became true");
    }

    fn engine_with(
        device: TestDevice,
        transcoder: ScriptTranscoder,
        config: EngineConfig,
    ) -> PlaybackEngine {
        PlaybackEngine::new(Arc::new(device), Arc::new(transcoder), None, config)
    }

    // --- tests --------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn play_completes_and_reports() {
        let device = TestDevice::working();
        let frames = device.frames.clone();
        let engine = engine_with(
            device,
            ScriptTranscoder {
                frames: 5,
                gap: Duration::from_millis(1),
            },
            EngineConfig::default(),
        );

        let log: EventLog = Default::default();
        engine.put(request("song", &log)).await.unwrap();

        wait_for(|| events(&log).iter().any(|e| e.starts_with("end:"))).await;
        let seen = events(&log);
        assert_eq!(seen[0], "start");
        // 5 frames of 20 ms each.
        assert_eq!(seen.last().unwrap(), "end:100:completed");
        assert_eq!(frames.load(Ordering::Relaxed), 5);

        wait_for(|| engine.phase() == Phase::Idle).await;
        assert!(engine.now_playing().is_none());
        assert_eq!(engine.queue_len(), 0);

        engine.close().await.unwrap();
    }

    #[tokio::test]
    async fn put_rejects_invalid_voice_channel() {
        let mut device = TestDevice::working();
        device.valid = false;
        let engine = engine_with(
            device,
            ScriptTranscoder {
                frames: 0,
                gap: Duration::ZERO,
            },
            EngineConfig::default(),
        );

        let log: EventLog = Default::default();
        let err = engine.put(request("song", &log)).await.unwrap_err();
        assert!(matches!(err, JukebotError::InvalidVoiceChannel));
        assert_eq!(engine.queue_len(), 0);
        engine.close().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn full_queue_rejects_and_close_ends_every_admitted_play() {
        let gate = Arc::new(Notify::new());
        let mut device = TestDevice::working();
        device.gate = Some(gate);
        let engine = engine_with(
            device,
            ScriptTranscoder {
                frames: 1,
                gap: Duration::ZERO,
            },
            EngineConfig::default(),
        );

        let log: EventLog = Default::default();
        // First play is dequeued and parks inside the gated device open.
        engine.put(request("current", &log)).await.unwrap();
        wait_for(|| engine.phase() == Phase::Playing).await;

        for i in 0..10 {
            engine.put(request(&format!("q{i}"), &log)).await.unwrap();
        }
        assert_eq!(engine.queue_len(), 10);

        let err = engine.put(request("overflow", &log)).await.unwrap_err();
        assert!(matches!(err, JukebotError::QueueFull));
        assert_eq!(engine.queue_len(), 10);

        engine.close().await.unwrap();
        // 1 current + 10 queued, each exactly once; the overflow play never
        // entered and gets no callback.
        let ends: Vec<String> = events(&log)
            .into_iter()
            .filter(|e| e.starts_with("end:"))
            .collect();
        assert_eq!(ends.len(), 11);
        assert!(ends.iter().all(|e| e.ends_with(":closed")));
    }

    #[tokio::test]
    async fn pause_at_idle_is_a_noop() {
        let engine = engine_with(
            TestDevice::working(),
            ScriptTranscoder {
                frames: 0,
                gap: Duration::ZERO,
            },
            EngineConfig::default(),
        );
        engine.pause();
        assert_eq!(engine.phase(), Phase::Idle);
        engine.close().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn skip_ends_current_play() {
        let engine = engine_with(
            TestDevice::working(),
            ScriptTranscoder {
                frames: usize::MAX,
                gap: Duration::from_millis(20),
            },
            EngineConfig::default(),
        );

        let log: EventLog = Default::default();
        engine.put(request("song", &log)).await.unwrap();
        wait_for(|| events(&log).contains(&"start".to_string())).await;

        engine.skip();
        wait_for(|| events(&log).iter().any(|e| e.starts_with("end:"))).await;
        assert!(events(&log).last().unwrap().ends_with(":skipped"));
        engine.close().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn pause_resume_preserves_elapsed_and_fires_hooks() {
        let engine = engine_with(
            TestDevice::working(),
            ScriptTranscoder {
                frames: 200,
                gap: Duration::from_millis(20),
            },
            EngineConfig::default(),
        );

        let log: EventLog = Default::default();
        engine.put(request("song", &log)).await.unwrap();
        wait_for(|| engine.elapsed() >= Duration::from_millis(100)).await;

        engine.pause();
        wait_for(|| events(&log).iter().any(|e| e.starts_with("pause:"))).await;
        assert_eq!(engine.phase(), Phase::Paused);
        let frozen = engine.elapsed();

        // Time passes while paused; elapsed must not move.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(engine.elapsed(), frozen);

        engine.pause();
        wait_for(|| events(&log).iter().any(|e| e.starts_with("resume:"))).await;
        assert_eq!(engine.phase(), Phase::Playing);

        engine.skip();
        wait_for(|| events(&log).iter().any(|e| e.starts_with("end:"))).await;
        engine.close().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn skip_while_paused_ends_immediately() {
        let engine = engine_with(
            TestDevice::working(),
            ScriptTranscoder {
                frames: usize::MAX,
                gap: Duration::from_millis(20),
            },
            EngineConfig::default(),
        );

        let log: EventLog = Default::default();
        engine.put(request("song", &log)).await.unwrap();
        wait_for(|| events(&log).contains(&"start".to_string())).await;

        engine.pause();
        wait_for(|| engine.phase() == Phase::Paused).await;
        engine.skip();
        wait_for(|| events(&log).iter().any(|e| e.starts_with("end:"))).await;
        assert!(events(&log).last().unwrap().ends_with(":skipped"));
        engine.close().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn progress_fires_on_wall_clock_cadence() {
        let engine = engine_with(
            TestDevice::working(),
            ScriptTranscoder {
                frames: 600,
                gap: Duration::from_millis(20),
            },
            EngineConfig::default(),
        );

        let log: EventLog = Default::default();
        engine.put(request("song", &log)).await.unwrap();
        wait_for(|| {
            events(&log)
                .iter()
                .filter(|e| e.starts_with("progress:"))
                .count()
                >= 2
        })
        .await;

        let first_progress = events(&log)
            .iter()
            .find(|e| e.starts_with("progress:"))
            .unwrap()
            .clone();
        let elapsed_ms: u64 = first_progress["progress:".len()..].parse().unwrap();
        // First tick lands a full interval (5 s) in; the frame gap keeps
        // elapsed within one frame of wall clock.
        assert!((4_000..=6_000).contains(&elapsed_ms), "{first_progress}");

        engine.skip();
        wait_for(|| events(&log).iter().any(|e| e.starts_with("end:"))).await;
        engine.close().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn clear_drops_queued_but_not_current() {
        let engine = engine_with(
            TestDevice::working(),
            ScriptTranscoder {
                frames: usize::MAX,
                gap: Duration::from_millis(20),
            },
            EngineConfig::default(),
        );

        let log: EventLog = Default::default();
        engine.put(request("current", &log)).await.unwrap();
        wait_for(|| events(&log).contains(&"start".to_string())).await;
        engine.put(request("q1", &log)).await.unwrap();
        engine.put(request("q2", &log)).await.unwrap();
        assert_eq!(engine.playlist(), vec!["q1", "q2"]);

        engine.clear().await;
        assert!(engine.playlist().is_empty());
        assert_eq!(engine.now_playing().unwrap().title, "current");

        let ends: Vec<String> = events(&log)
            .into_iter()
            .filter(|e| e.starts_with("end:"))
            .collect();
        assert_eq!(ends.len(), 2);
        assert!(ends.iter().all(|e| e.ends_with(":cleared")));

        engine.close().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn voice_failure_applies_cooldown_before_next_dequeue() {
        let mut device = TestDevice::working();
        device.fail_open = true;
        let engine = engine_with(
            device,
            ScriptTranscoder {
                frames: 0,
                gap: Duration::ZERO,
            },
            EngineConfig::default(),
        );

        let times: Arc<StdMutex<Vec<tokio::time::Instant>>> = Default::default();
        for _ in 0..2 {
            let times = times.clone();
            let mut hooks = PlayHooks::noop();
            hooks.on_end = Box::new(move |_, _| {
                times.lock().unwrap().push(tokio::time::Instant::now());
                Box::pin(async {})
            });
            engine
                .put(PlayRequest {
                    metadata: track("song", 10),
                    voice_channel: ChannelId("vc".into()),
                    loudness: None,
                    hooks,
                })
                .await
                .unwrap();
        }

        wait_for(|| times.lock().unwrap().len() == 2).await;
        let recorded = times.lock().unwrap().clone();
        assert!(recorded[1] - recorded[0] >= Duration::from_secs(1));
        engine.close().await.unwrap();
    }

    #[tokio::test]
    async fn close_is_idempotent_and_rejects_further_puts() {
        let engine = engine_with(
            TestDevice::working(),
            ScriptTranscoder {
                frames: 0,
                gap: Duration::ZERO,
            },
            EngineConfig::default(),
        );

        engine.close().await.unwrap();
        assert!(matches!(engine.close().await, Err(JukebotError::Closed)));

        let log: EventLog = Default::default();
        let err = engine.put(request("song", &log)).await.unwrap_err();
        assert!(matches!(err, JukebotError::Closed));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_hook_runs_once_per_quiescence() {
        let ran = Arc::new(AtomicUsize::new(0));
        let hook_ran = ran.clone();
        let idle: IdleHook = Box::new(move || {
            hook_ran.fetch_add(1, Ordering::Relaxed);
            Box::pin(async {})
        });
        let engine = PlaybackEngine::new(
            Arc::new(TestDevice::working()),
            Arc::new(ScriptTranscoder {
                frames: 0,
                gap: Duration::ZERO,
            }),
            Some(idle),
            EngineConfig::default(),
        );

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ran.load(Ordering::Relaxed), 1);
        engine.close().await.unwrap();
    }
}
