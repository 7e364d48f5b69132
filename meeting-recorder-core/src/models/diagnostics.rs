/// Per-frame counters accumulated by the compositor loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositorDiagnostics {
    pub frames_rendered: u64,
    /// Frames with no active source (background only).
    pub empty_frames: u64,
    pub cells_drawn: u64,
    /// Cells left blank because the playback had no current frame yet.
    pub cells_not_ready: u64,
    /// Cells left blank because the host could not provide a playback.
    pub cells_unavailable: u64,
    pub draw_errors: u64,
}

impl CompositorDiagnostics {
    pub fn merge(&mut self, frame: &CompositorDiagnostics) {
        self.frames_rendered += frame.frames_rendered;
        self.empty_frames += frame.empty_frames;
        self.cells_drawn += frame.cells_drawn;
        self.cells_not_ready += frame.cells_not_ready;
        self.cells_unavailable += frame.cells_unavailable;
        self.draw_errors += frame.draw_errors;
    }
}

/// Diagnostics for debugging recording sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingDiagnostics {
    pub compositor: CompositorDiagnostics,
    pub chunks_received: u64,
    pub bytes_received: u64,
    pub empty_chunks: u64,
    /// Chunks discarded after the maximum-duration guard fired.
    pub chunks_dropped: u64,
    pub audio_routes: usize,
    pub mime_type: String,
}
