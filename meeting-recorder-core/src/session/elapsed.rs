use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Whole-second recording clock.
///
/// A background thread polls a monotonic `Instant` and publishes each new
/// whole second, so the value never decreases while it runs. `cap` freezes
/// the counter at a limit.
pub struct ElapsedTimer {
    elapsed: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ElapsedTimer {
    /// Start counting from zero, calling `on_second` for every new value.
    pub fn start<F>(poll: Duration, cap: Option<u64>, mut on_second: F) -> Self
    where
        F: FnMut(u64) + Send + 'static,
    {
        let elapsed = Arc::new(AtomicU64::new(0));
        let running = Arc::new(AtomicBool::new(true));

        let value = Arc::clone(&elapsed);
        let flag = Arc::clone(&running);
        let started = Instant::now();

        let handle = thread::Builder::new()
            .name("duration-timer".into())
            .spawn(move || {
                while flag.load(Ordering::SeqCst) {
                    thread::sleep(poll);

                    let mut secs = started.elapsed().as_secs();
                    if let Some(cap) = cap {
                        secs = secs.min(cap);
                    }
                    if secs > value.load(Ordering::SeqCst) && flag.load(Ordering::SeqCst) {
                        value.store(secs, Ordering::SeqCst);
                        on_second(secs);
                    }
                }
            })
            .expect("failed to spawn timer thread");

        Self {
            elapsed,
            running,
            handle: Some(handle),
        }
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed.load(Ordering::SeqCst)
    }

    /// Shared handle to the counter, readable after the timer stops.
    pub fn counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.elapsed)
    }

    /// Stop counting; the last published value is kept.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Duration timer thread panicked");
            }
        }
    }
}

impl Drop for ElapsedTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
