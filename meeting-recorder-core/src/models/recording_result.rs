use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The assembled recording: every encoded chunk concatenated in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingBlob {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl RecordingBlob {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Hex-encoded SHA-256 of the blob contents.
    pub fn checksum(&self) -> String {
        hex_encode(&Sha256::digest(&self.data))
    }
}

/// Result returned when a recording session stops.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub blob: RecordingBlob,
    pub file_name: String,
    pub duration_secs: u64,
    pub metadata: RecordingMetadata,
}

impl RecordingResult {
    pub(crate) fn new(
        blob: RecordingBlob,
        title: &str,
        duration_secs: u64,
        participants: Vec<String>,
        audio_routes: usize,
        duration_limited: bool,
    ) -> Self {
        let file_name = suggested_file_name(title, &blob.mime_type);
        let metadata = RecordingMetadata {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            file_name: file_name.clone(),
            mime_type: blob.mime_type.clone(),
            size_bytes: blob.len() as u64,
            duration_secs,
            checksum: blob.checksum(),
            created_at: chrono::Utc::now().to_rfc3339(),
            participants,
            audio_routes,
            duration_limited,
        };
        Self {
            blob,
            file_name,
            duration_secs,
            metadata,
        }
    }

    /// Duration formatted for display.
    pub fn duration_display(&self) -> String {
        format_elapsed(self.duration_secs)
    }
}

/// Metadata handed to the upload step alongside the blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub title: String,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub duration_secs: u64,
    pub checksum: String,
    pub created_at: String,
    /// Source ids that were part of the layout at start, e.g. `remote-0`.
    pub participants: Vec<String>,
    pub audio_routes: usize,
    /// The maximum-duration guard cut the recording short.
    pub duration_limited: bool,
}

impl RecordingMetadata {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Format whole seconds as `MM:SS`. Minutes keep counting past 99.
pub fn format_elapsed(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// File extension for a MIME type, ignoring codec parameters.
pub fn extension_for_mime(mime_type: &str) -> String {
    let essence = mime_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    match essence.as_str() {
        "video/webm" | "audio/webm" => "webm".into(),
        "video/mp4" | "audio/mp4" => "mp4".into(),
        "video/x-matroska" => "mkv".into(),
        "video/x-meeting-raw" => "mraw".into(),
        other => match other.split_once('/') {
            Some((_, subtype)) if !subtype.is_empty() => {
                subtype.trim_start_matches("x-").to_string()
            }
            _ => "bin".into(),
        },
    }
}

/// `<title>.<extension>` with characters that are unsafe in file names replaced.
pub fn suggested_file_name(title: &str, mime_type: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = if cleaned.trim_matches('.').is_empty() {
        "recording".to_string()
    } else {
        cleaned
    };
    format!("{}.{}", stem, extension_for_mime(mime_type))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(59), "00:59");
        assert_eq!(format_elapsed(61), "01:01");
        assert_eq!(format_elapsed(6000), "100:00");
    }

    #[test]
    fn extension_ignores_codecs() {
        assert_eq!(extension_for_mime("video/webm;codecs=vp9,opus"), "webm");
        assert_eq!(extension_for_mime("video/mp4"), "mp4");
        assert_eq!(extension_for_mime("video/x-meeting-raw"), "mraw");
        assert_eq!(extension_for_mime("video/ogg"), "ogg");
        assert_eq!(extension_for_mime("garbage"), "bin");
    }

    #[test]
    fn file_names_are_sanitised() {
        assert_eq!(suggested_file_name("Weekly sync", "video/webm"), "Weekly sync.webm");
        assert_eq!(suggested_file_name("  a/b:c  ", "video/mp4"), "a_b_c.mp4");
        assert_eq!(suggested_file_name("   ", "video/webm"), "recording.webm");
        assert_eq!(suggested_file_name("..", "video/webm"), "recording.webm");
    }

    #[test]
    fn empty_blob_checksum_is_sha256_of_nothing() {
        let blob = RecordingBlob {
            data: Vec::new(),
            mime_type: "video/webm".into(),
        };
        assert_eq!(
            blob.checksum(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn metadata_round_trips_through_json() {
        let blob = RecordingBlob {
            data: vec![1, 2, 3],
            mime_type: "video/webm".into(),
        };
        let result = RecordingResult::new(blob, "Demo", 75, vec!["local".into()], 1, false);
        assert_eq!(result.file_name, "Demo.webm");
        assert_eq!(result.duration_display(), "01:15");
        assert_eq!(result.metadata.size_bytes, 3);

        let json = result.metadata.to_json().unwrap();
        assert!(json.contains("\"participants\""));
        let parsed = RecordingMetadata::from_json(&json).unwrap();
        assert_eq!(parsed, result.metadata);
    }
}
