use crate::models::recording_result::RecordingBlob;

/// One flush of encoded data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedChunk {
    pub data: Vec<u8>,
    /// Milliseconds since the encoder started.
    pub timecode_ms: u64,
}

impl EncodedChunk {
    pub fn new(data: Vec<u8>, timecode_ms: u64) -> Self {
        Self { data, timecode_ms }
    }
}

/// Append-only, insertion-ordered store of encoded chunks.
///
/// Wrap in `Arc<parking_lot::Mutex<ChunkBuffer>>`: the encoder callback is the
/// only writer, and the session reads it once after the encoder has finalized.
#[derive(Debug, Default)]
pub struct ChunkBuffer {
    chunks: Vec<EncodedChunk>,
    total_bytes: usize,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk. Empty chunks are ignored; returns whether it was kept.
    pub fn push(&mut self, chunk: EncodedChunk) -> bool {
        if chunk.data.is_empty() {
            return false;
        }
        self.total_bytes += chunk.data.len();
        self.chunks.push(chunk);
        true
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn chunks(&self) -> &[EncodedChunk] {
        &self.chunks
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.total_bytes = 0;
    }

    /// Concatenate every chunk in arrival order into one blob.
    pub fn assemble(&self, mime_type: &str) -> RecordingBlob {
        let mut data = Vec::with_capacity(self.total_bytes);
        for chunk in &self.chunks {
            data.extend_from_slice(&chunk.data);
        }
        RecordingBlob {
            data,
            mime_type: mime_type.to_string(),
        }
    }
}
