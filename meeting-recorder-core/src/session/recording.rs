use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::config::RecorderConfiguration;
use crate::models::diagnostics::{CompositorDiagnostics, RecordingDiagnostics};
use crate::models::error::RecorderError;
use crate::models::media::{MediaStream, SessionSources};
use crate::models::recording_result::{format_elapsed, RecordingResult};
use crate::models::state::RecordingState;
use crate::processing::chunk_buffer::{ChunkBuffer, EncodedChunk};
use crate::session::audio_mix::AudioMixGraph;
use crate::session::compositor::{CompositorLoop, FrameCompositor, FrameTarget};
use crate::session::elapsed::ElapsedTimer;
use crate::session::registry::VideoSourceRegistry;
use crate::traits::canvas::Canvas;
use crate::traits::encoder::{ChunkCallback, EncoderOptions, MediaEncoder};
use crate::traits::host::MediaHost;
use crate::traits::recording_delegate::RecordingDelegate;

const TIMER_POLL: Duration = Duration::from_millis(250);
const DEFAULT_TITLE: &str = "recording";

/// Mutable session state shared with the worker threads.
struct SessionState {
    state: RecordingState,
    limit_reached: bool,
}

impl SessionState {
    fn new() -> Self {
        Self {
            state: RecordingState::Idle,
            limit_reached: false,
        }
    }
}

/// Resources that exist only between `start` and `stop`.
struct ActiveRecording {
    title: String,
    mime_type: String,
    participants: Vec<String>,
    // Kept alive for the compositor thread; dropped after it stops.
    _canvas: Arc<Mutex<Box<dyn Canvas>>>,
    audio: AudioMixGraph,
    // Shared with the timer so the duration guard can finalize it.
    encoder: Arc<Mutex<Box<dyn MediaEncoder>>>,
    compositor: CompositorLoop,
    timer: ElapsedTimer,
}

/// One continuous capture of a meeting into a single file.
///
/// Data flow:
/// ```text
/// [sources] → [VideoSourceRegistry] → [FrameCompositor] → canvas track ─┐
///                                                                       ├→ [MediaEncoder] → [ChunkBuffer] → blob
/// [sources] → [AudioMixGraph] ─────────────────────────────→ mix track ─┘
/// ```
///
/// The compositor and the elapsed timer run on their own threads; the
/// encoder delivers chunks on its thread. `stop` joins all of them before
/// assembling the result.
pub struct RecordingSession<H: MediaHost> {
    host: Arc<H>,
    config: RecorderConfiguration,
    session_state: Arc<Mutex<SessionState>>,
    delegate: Option<Arc<dyn RecordingDelegate>>,

    // Replaced on every successful start
    diagnostics: Arc<Mutex<RecordingDiagnostics>>,

    // Shared with the compositor thread
    sources: Arc<Mutex<SessionSources>>,
    registry: Arc<Mutex<VideoSourceRegistry>>,
    compositor_stats: Arc<Mutex<CompositorDiagnostics>>,

    // Written only by the encoder callback
    chunks: Arc<Mutex<ChunkBuffer>>,
    accepting_chunks: Arc<AtomicBool>,

    elapsed: Arc<AtomicU64>,
    active: Option<ActiveRecording>,
    last_result: Option<RecordingResult>,
}

impl<H: MediaHost> RecordingSession<H> {
    pub fn new(host: Arc<H>, config: RecorderConfiguration) -> Self {
        Self {
            host,
            config,
            session_state: Arc::new(Mutex::new(SessionState::new())),
            delegate: None,
            diagnostics: Arc::new(Mutex::new(RecordingDiagnostics::default())),
            sources: Arc::new(Mutex::new(SessionSources::default())),
            registry: Arc::new(Mutex::new(VideoSourceRegistry::new())),
            compositor_stats: Arc::new(Mutex::new(CompositorDiagnostics::default())),
            chunks: Arc::new(Mutex::new(ChunkBuffer::new())),
            accepting_chunks: Arc::new(AtomicBool::new(false)),
            elapsed: Arc::new(AtomicU64::new(0)),
            active: None,
            last_result: None,
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn RecordingDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn config(&self) -> &RecorderConfiguration {
        &self.config
    }

    pub fn state(&self) -> RecordingState {
        self.session_state.lock().state.clone()
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Whole seconds recorded so far (or in the last session, once stopped).
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed.load(Ordering::SeqCst)
    }

    /// Elapsed time as `MM:SS`.
    pub fn elapsed_display(&self) -> String {
        format_elapsed(self.elapsed_secs())
    }

    pub fn audio_route_count(&self) -> usize {
        self.active.as_ref().map(|a| a.audio.route_count()).unwrap_or(0)
    }

    pub fn diagnostics(&self) -> RecordingDiagnostics {
        let mut diagnostics = self.diagnostics.lock().clone();
        diagnostics.compositor = *self.compositor_stats.lock();
        diagnostics
    }

    /// Start recording. Transitions: idle → recording.
    ///
    /// Fails without side effects when there is no local or screen stream
    /// (`NoSource`) or when none of the preferred formats can be encoded
    /// (`EncoderUnavailable`).
    pub fn start(&mut self, sources: SessionSources, title: &str) -> Result<(), RecorderError> {
        if self.active.is_some() || !self.session_state.lock().state.is_idle() {
            return Err(RecorderError::ConfigurationFailed(
                "can only start from idle state".into(),
            ));
        }

        self.config
            .validate()
            .map_err(RecorderError::ConfigurationFailed)?;

        if !sources.has_primary() {
            return Err(RecorderError::NoSource);
        }

        let mime_type = self
            .config
            .mime_preferences
            .iter()
            .find(|m| self.host.is_type_supported(m))
            .cloned()
            .ok_or_else(|| {
                RecorderError::EncoderUnavailable(format!(
                    "none of {:?} is supported",
                    self.config.mime_preferences
                ))
            })?;

        // Allocation. Everything below is dropped (and so released) if a
        // later step fails. Per-session state is built fresh and only
        // committed to `self` once the encoder is running.
        let mut canvas = self
            .host
            .create_canvas(self.config.canvas_width, self.config.canvas_height)?;
        let audio = AudioMixGraph::build(self.host.as_ref(), &sources.streams())?;
        let video_track = canvas.capture_track(self.config.frame_rate)?;
        let combined = MediaStream::new("recording", vec![video_track, audio.output_track()]);

        let chunks = Arc::new(Mutex::new(ChunkBuffer::new()));
        let diagnostics = Arc::new(Mutex::new(RecordingDiagnostics {
            audio_routes: audio.route_count(),
            mime_type: mime_type.clone(),
            ..Default::default()
        }));
        let accepting = Arc::new(AtomicBool::new(true));

        let options = EncoderOptions {
            mime_type: mime_type.clone(),
            video_bits_per_second: self.config.video_bits_per_second,
            audio_bits_per_second: self.config.audio_bits_per_second,
            frame_rate: self.config.frame_rate,
        };
        let mut encoder = self
            .host
            .create_encoder(
                combined,
                &options,
                chunk_callback(&chunks, &diagnostics, &accepting),
            )
            .map_err(into_encoder_unavailable)?;

        let participants: Vec<String> = sources.active().iter().map(|(id, _)| id.to_string()).collect();
        let sources = Arc::new(Mutex::new(sources));
        let registry = Arc::new(Mutex::new(VideoSourceRegistry::new()));
        let compositor_stats = Arc::new(Mutex::new(CompositorDiagnostics::default()));

        let canvas = Arc::new(Mutex::new(canvas));
        let mut compositor = CompositorLoop::spawn(
            FrameCompositor::new(self.config.background),
            FrameTarget {
                host: Arc::clone(&self.host),
                canvas: Arc::clone(&canvas),
                registry: Arc::clone(&registry),
                sources: Arc::clone(&sources),
                stats: Arc::clone(&compositor_stats),
            },
            self.config.frame_interval(),
        );

        if let Err(e) = encoder.start(self.config.timeslice) {
            compositor.stop();
            accepting.store(false, Ordering::SeqCst);
            registry.lock().release_all();
            log::warn!("Encoder failed to start: {}", e);
            return Err(into_encoder_unavailable(e));
        }

        // Commit
        self.chunks = chunks;
        self.diagnostics = diagnostics;
        self.accepting_chunks = accepting;
        self.sources = sources;
        self.registry = registry;
        self.compositor_stats = compositor_stats;
        self.session_state.lock().limit_reached = false;

        let encoder = Arc::new(Mutex::new(encoder));
        self.set_state(RecordingState::Recording { elapsed_secs: 0 });
        let timer = self.start_timer(compositor.running_flag(), Arc::clone(&encoder));
        self.elapsed = timer.counter();

        log::info!(
            "Recording started: {} source(s), {} audio route(s), {}",
            self.sources.lock().active().len(),
            audio.route_count(),
            mime_type
        );

        self.active = Some(ActiveRecording {
            title: title.to_string(),
            mime_type,
            participants,
            _canvas: canvas,
            audio,
            encoder,
            compositor,
            timer,
        });
        Ok(())
    }

    /// Replace the live source set while recording.
    ///
    /// New or replaced video shows up on the next frame; removed sources stop
    /// being drawn. The audio mix keeps the tracks routed at start.
    pub fn update_sources(&self, sources: SessionSources) {
        if let Some(active) = &self.active {
            let unmixed = sources
                .streams()
                .iter()
                .flat_map(|s| s.audio_tracks().cloned().collect::<Vec<_>>())
                .filter(|t| !active.audio.is_routed(t))
                .count();
            if unmixed > 0 {
                log::debug!("{} audio track(s) joined after start and are not mixed", unmixed);
            }
        }
        *self.sources.lock() = sources;
    }

    /// Stop recording and assemble the file.
    /// Transitions: recording → stopping → completed → idle.
    ///
    /// Never fails. Called while idle, it returns the previous result (or an
    /// empty one) without touching the buffer.
    pub fn stop(&mut self) -> RecordingResult {
        let Some(mut active) = self.active.take() else {
            log::debug!("stop() while idle");
            return self.idle_result();
        };

        self.set_state(RecordingState::Stopping);

        // The encoder hands over its final chunks before returning.
        if let Err(e) = active.encoder.lock().stop() {
            log::error!("Encoder did not finalize cleanly: {}", e);
            self.report_error(&into_encoding_error(e));
        }
        self.accepting_chunks.store(false, Ordering::SeqCst);

        active.compositor.stop();
        active.timer.stop();
        self.registry.lock().release_all();
        active.audio.close();

        let limit_reached = self.session_state.lock().limit_reached;
        let duration_secs = self.elapsed_secs();
        let blob = self.chunks.lock().assemble(&active.mime_type);
        let result = RecordingResult::new(
            blob,
            &active.title,
            duration_secs,
            active.participants.clone(),
            active.audio.route_count(),
            limit_reached,
        );

        log::info!(
            "Recording stopped after {}: {} bytes in {} chunk(s)",
            result.duration_display(),
            result.blob.len(),
            self.chunks.lock().len()
        );

        self.set_state(RecordingState::Completed(Box::new(result.clone())));
        if let Some(ref delegate) = self.delegate {
            delegate.on_recording_finished(&result);
        }

        // Reset for next session
        self.set_state(RecordingState::Idle);
        self.last_result = Some(result.clone());
        result
    }

    // --- Internal helpers ---

    fn set_state(&self, new_state: RecordingState) {
        self.session_state.lock().state = new_state.clone();
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(&new_state);
        }
    }

    fn report_error(&self, error: &RecorderError) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(error);
        }
    }

    fn idle_result(&self) -> RecordingResult {
        if let Some(result) = &self.last_result {
            return result.clone();
        }
        let mime_type = self
            .config
            .mime_preferences
            .first()
            .cloned()
            .unwrap_or_default();
        let blob = self.chunks.lock().assemble(&mime_type);
        RecordingResult::new(blob, DEFAULT_TITLE, 0, Vec::new(), 0, false)
    }

    /// Start the elapsed counter; enforces the duration guard if configured.
    ///
    /// When the limit is reached the compositor halts and the encoder is
    /// finalized right away, so its last chunk (frames captured before the
    /// limit) still lands in the buffer. Anything delivered after that is
    /// dropped.
    fn start_timer(
        &self,
        compositor_running: Arc<AtomicBool>,
        encoder: Arc<Mutex<Box<dyn MediaEncoder>>>,
    ) -> ElapsedTimer {
        let session_state = Arc::clone(&self.session_state);
        let accepting = Arc::clone(&self.accepting_chunks);
        let delegate = self.delegate.clone();
        let limit = self.config.max_duration_secs;

        ElapsedTimer::start(TIMER_POLL, limit, move |secs| {
            let mut guard_fired = false;
            {
                let mut s = session_state.lock();
                if s.state.is_recording() {
                    s.state = RecordingState::Recording { elapsed_secs: secs };
                }
                if limit.is_some_and(|l| secs >= l) && !s.limit_reached {
                    s.limit_reached = true;
                    guard_fired = true;
                }
            }

            if guard_fired {
                let limit_secs = limit.unwrap_or(secs);
                log::warn!("Maximum recording duration of {}s reached, halting capture", limit_secs);
                compositor_running.store(false, Ordering::SeqCst);
                let finalized = encoder.lock().stop();
                accepting.store(false, Ordering::SeqCst);

                if let Err(ref e) = finalized {
                    log::error!("Encoder did not finalize at the duration limit: {}", e);
                }
                if let Some(ref d) = delegate {
                    if let Err(e) = finalized {
                        d.on_error(&into_encoding_error(e));
                    }
                    d.on_error(&RecorderError::MaxDurationReached { limit_secs });
                }
            }

            if let Some(ref d) = delegate {
                d.on_elapsed_updated(secs);
            }
        })
    }
}

/// Encoder callback: the only writer of a session's chunk buffer.
fn chunk_callback(
    chunks: &Arc<Mutex<ChunkBuffer>>,
    diagnostics: &Arc<Mutex<RecordingDiagnostics>>,
    accepting: &Arc<AtomicBool>,
) -> ChunkCallback {
    let chunks = Arc::clone(chunks);
    let diagnostics = Arc::clone(diagnostics);
    let accepting = Arc::clone(accepting);

    Arc::new(move |chunk: EncodedChunk| {
        let size = chunk.data.len() as u64;
        if !accepting.load(Ordering::SeqCst) {
            diagnostics.lock().chunks_dropped += 1;
            return;
        }
        let kept = chunks.lock().push(chunk);

        let mut d = diagnostics.lock();
        if kept {
            d.chunks_received += 1;
            d.bytes_received += size;
        } else {
            d.empty_chunks += 1;
        }
    })
}

impl<H: MediaHost> Drop for RecordingSession<H> {
    fn drop(&mut self) {
        if self.active.is_some() {
            self.stop();
        }
    }
}

fn into_encoder_unavailable(error: RecorderError) -> RecorderError {
    match error {
        RecorderError::EncoderUnavailable(_) => error,
        other => RecorderError::EncoderUnavailable(other.to_string()),
    }
}

fn into_encoding_error(error: RecorderError) -> RecorderError {
    match error {
        RecorderError::Encoding(_) => error,
        other => RecorderError::Encoding(other.to_string()),
    }
}
