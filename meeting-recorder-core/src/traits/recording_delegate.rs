use crate::models::error::RecorderError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::RecordingState;

/// Event delegate for recording session notifications.
///
/// Methods are called from the session's worker threads as well as the
/// caller's thread. Implementations should marshal to a UI thread if needed.
pub trait RecordingDelegate: Send + Sync {
    fn on_state_changed(&self, state: &RecordingState);

    /// Called once per elapsed whole second while recording.
    fn on_elapsed_updated(&self, elapsed_secs: u64);

    /// Called for faults that do not stop the recording.
    fn on_error(&self, error: &RecorderError);

    fn on_recording_finished(&self, result: &RecordingResult);
}
