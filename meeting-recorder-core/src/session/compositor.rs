use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::models::diagnostics::CompositorDiagnostics;
use crate::models::geometry::Rgba;
use crate::models::media::SessionSources;
use crate::processing::layout::{cover_fit, GridLayout};
use crate::session::registry::VideoSourceRegistry;
use crate::traits::canvas::Canvas;
use crate::traits::host::MediaHost;

/// Draws the current set of sources into a grid, one frame at a time.
#[derive(Debug, Clone, Copy)]
pub struct FrameCompositor {
    pub background: Rgba,
}

impl FrameCompositor {
    pub fn new(background: Rgba) -> Self {
        Self { background }
    }

    /// Render one frame.
    ///
    /// The canvas is cleared first, so a source that disappears or is not
    /// ready leaves only background behind. Faults in a single cell are
    /// counted and skipped; they never abort the frame.
    pub fn render_frame<H: MediaHost + ?Sized>(
        &self,
        canvas: &mut dyn Canvas,
        registry: &mut VideoSourceRegistry,
        host: &H,
        sources: &SessionSources,
    ) -> CompositorDiagnostics {
        let mut stats = CompositorDiagnostics {
            frames_rendered: 1,
            ..Default::default()
        };

        canvas.clear(self.background);

        let active = sources.active();
        let Some(grid) = GridLayout::compute(active.len(), canvas.width() as f64, canvas.height() as f64)
        else {
            stats.empty_frames = 1;
            canvas.present();
            return stats;
        };

        for (index, (id, stream)) in active.into_iter().enumerate() {
            let Some(cell) = grid.cell(index) else {
                continue;
            };
            let Some(playback) = registry.get_or_create(host, id, stream) else {
                stats.cells_unavailable += 1;
                continue;
            };
            if !playback.ready_state().can_draw() {
                stats.cells_not_ready += 1;
                continue;
            }
            let crop = playback
                .video_size()
                .and_then(|(w, h)| cover_fit(w as f64, h as f64, &cell));
            let Some(crop) = crop else {
                stats.cells_not_ready += 1;
                continue;
            };

            match canvas.draw_video(playback, crop, cell) {
                Ok(()) => stats.cells_drawn += 1,
                Err(e) => {
                    stats.draw_errors += 1;
                    log::warn!("Skipping {} this frame: {}", id, e);
                }
            }
        }

        canvas.present();
        stats
    }
}

/// Everything the compositor thread needs to render a frame.
pub struct FrameTarget<H: MediaHost> {
    pub host: Arc<H>,
    pub canvas: Arc<Mutex<Box<dyn Canvas>>>,
    pub registry: Arc<Mutex<VideoSourceRegistry>>,
    pub sources: Arc<Mutex<SessionSources>>,
    pub stats: Arc<Mutex<CompositorDiagnostics>>,
}

/// Recurring frame task on a dedicated thread.
///
/// Each iteration checks the liveness flag before drawing; clearing it ends
/// the loop after the frame in progress.
pub struct CompositorLoop {
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl CompositorLoop {
    pub fn spawn<H: MediaHost>(compositor: FrameCompositor, target: FrameTarget<H>, interval: Duration) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("frame-compositor".into())
            .spawn(move || {
                while flag.load(Ordering::SeqCst) {
                    let frame_start = Instant::now();

                    let frame = {
                        let sources = target.sources.lock();
                        let mut registry = target.registry.lock();
                        let mut canvas = target.canvas.lock();
                        compositor.render_frame(canvas.as_mut(), &mut registry, target.host.as_ref(), &sources)
                    };
                    target.stats.lock().merge(&frame);

                    thread::sleep(interval.saturating_sub(frame_start.elapsed()));
                }
            })
            .expect("failed to spawn compositor thread");

        Self {
            running,
            handle: Some(handle),
        }
    }

    /// Flag shared with the loop; storing false halts it.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop scheduling frames and wait for the current one to finish.
    ///
    /// Returns false if the loop had already been stopped.
    pub fn stop(&mut self) -> bool {
        let was_running = self.running.swap(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Compositor thread panicked; frames stopped early");
            }
        }
        was_running
    }
}

impl Drop for CompositorLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
