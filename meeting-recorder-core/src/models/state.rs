use super::recording_result::RecordingResult;

/// Recording session state machine.
///
/// State transitions:
/// ```text
/// idle → recording → stopping → completed → idle
/// ```
/// A failed start never leaves `Idle`.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordingState {
    Idle,
    Recording { elapsed_secs: u64 },
    Stopping,
    Completed(Box<RecordingResult>),
}

impl RecordingState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording { .. })
    }

    /// Short lowercase name, suitable for event payloads.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording { .. } => "recording",
            Self::Stopping => "stopping",
            Self::Completed(_) => "completed",
        }
    }

    /// Elapsed whole seconds if the state tracks a duration.
    pub fn elapsed_secs(&self) -> Option<u64> {
        match self {
            Self::Recording { elapsed_secs } => Some(*elapsed_secs),
            Self::Completed(result) => Some(result.duration_secs),
            _ => None,
        }
    }
}
