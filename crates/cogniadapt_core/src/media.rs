//! Inline media payloads for multimodal requests.

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Value, json};

use crate::error::{CoreError, Result};

/// The broad modality of a media payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
    Video,
}

/// Raw media bytes plus their declared type, ready for inline transport.
#[derive(Debug, Clone)]
pub struct MediaPayload {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl MediaPayload {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Read a file and infer its media type from the extension.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let mime_type = mime_for_extension(path)
            .ok_or_else(|| CoreError::UnsupportedMedia {
                path: path.display().to_string(),
            })?
            .to_string();

        let data = tokio::fs::read(path)
            .await
            .map_err(|e| CoreError::MediaReadFailed {
                path: path.display().to_string(),
                cause: e,
            })?;

        Ok(Self { mime_type, data })
    }

    pub fn kind(&self) -> Option<MediaKind> {
        let prefix = self.mime_type.split('/').next()?;
        match prefix {
            "image" => Some(MediaKind::Image),
            "audio" => Some(MediaKind::Audio),
            "video" => Some(MediaKind::Video),
            _ => None,
        }
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.data)
    }

    /// The inline-data part shape the generation endpoint expects.
    pub fn to_inline_part(&self) -> Value {
        json!({
            "inline_data": {
                "mime_type": self.mime_type,
                "data": self.to_base64(),
            }
        })
    }
}

fn mime_for_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn infers_common_mime_types() {
        assert_eq!(
            mime_for_extension(Path::new("photo.JPG")),
            Some("image/jpeg")
        );
        assert_eq!(
            mime_for_extension(Path::new("clip.webm")),
            Some("video/webm")
        );
        assert_eq!(
            mime_for_extension(Path::new("note.wav")),
            Some("audio/wav")
        );
        assert_eq!(mime_for_extension(Path::new("document.txt")), None);
        assert_eq!(mime_for_extension(Path::new("noextension")), None);
    }

    #[test]
    fn inline_part_carries_base64_payload() {
        let payload = MediaPayload::new("image/png", vec![1, 2, 3]);
        let part = payload.to_inline_part();
        assert_eq!(part["inline_data"]["mime_type"], "image/png");
        assert_eq!(part["inline_data"]["data"], BASE64.encode([1u8, 2, 3]));
        assert_eq!(payload.kind(), Some(MediaKind::Image));
    }

    #[tokio::test]
    async fn reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        std::fs::write(&path, [0x89u8, 0x50, 0x4e, 0x47]).unwrap();

        let payload = MediaPayload::from_path(&path).await.unwrap();
        assert_eq!(payload.mime_type, "image/png");
        assert_eq!(payload.data.len(), 4);
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let result = MediaPayload::from_path(Path::new("/nonexistent/clip.mp4")).await;
        assert!(matches!(result, Err(CoreError::MediaReadFailed { .. })));
    }
}
