//! Types for chunked media upload.

use std::path::{Path, PathBuf};

use birdwire_client::{Error, ErrorKind, Result};
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};

/// Intended use of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaCategory {
    TweetImage,
    TweetGif,
    TweetVideo,
    DmImage,
    DmGif,
    DmVideo,
    Subtitles,
}

impl MediaCategory {
    /// Wire value of the `media_category` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaCategory::TweetImage => "tweet_image",
            MediaCategory::TweetGif => "tweet_gif",
            MediaCategory::TweetVideo => "tweet_video",
            MediaCategory::DmImage => "dm_image",
            MediaCategory::DmGif => "dm_gif",
            MediaCategory::DmVideo => "dm_video",
            MediaCategory::Subtitles => "subtitles",
        }
    }

    /// Category for a MIME type, in the tweet or DM family.
    pub fn infer(mime_type: &str, dm_only: bool) -> Self {
        let mime = mime_type.to_ascii_lowercase();
        match (mime.as_str(), dm_only) {
            ("application/x-subrip" | "text/srt", _) => MediaCategory::Subtitles,
            ("image/gif", false) => MediaCategory::TweetGif,
            ("image/gif", true) => MediaCategory::DmGif,
            (m, false) if m.starts_with("video/") => MediaCategory::TweetVideo,
            (m, true) if m.starts_with("video/") => MediaCategory::DmVideo,
            (_, false) => MediaCategory::TweetImage,
            (_, true) => MediaCategory::DmImage,
        }
    }
}

/// MIME type for a file extension, if it is a supported media format.
pub fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "srt" => "application/x-subrip",
        _ => return None,
    };
    Some(mime)
}

/// Where the bytes of a [`MediaFile`] come from.
#[derive(Debug, Clone)]
pub enum MediaSource {
    Path(PathBuf),
    Bytes(Bytes),
}

/// A file to upload.
#[derive(Debug, Clone)]
pub struct MediaFile {
    source: MediaSource,
    mime_type: String,
    total_bytes: u64,
    category: Option<MediaCategory>,
    dm_only: bool,
}

impl MediaFile {
    /// Describe a file on disk, inferring its MIME type from the extension.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mime = mime_from_extension(path).ok_or_else(|| {
            Error::new(ErrorKind::InvalidArgument(format!(
                "cannot infer media type of {}",
                path.display()
            )))
        })?;
        Self::open_as(path, mime).await
    }

    /// Describe a file on disk with an explicit MIME type.
    pub async fn open_as(path: impl AsRef<Path>, mime_type: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(Error::new(ErrorKind::InvalidArgument(format!(
                "{} is not a file",
                path.display()
            ))));
        }

        Ok(Self {
            source: MediaSource::Path(path.to_path_buf()),
            mime_type: mime_type.into(),
            total_bytes: metadata.len(),
            category: None,
            dm_only: false,
        })
    }

    /// Describe in-memory content.
    pub fn from_bytes(bytes: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        let bytes = bytes.into();
        Self {
            total_bytes: bytes.len() as u64,
            source: MediaSource::Bytes(bytes),
            mime_type: mime_type.into(),
            category: None,
            dm_only: false,
        }
    }

    /// Override the inferred category.
    pub fn with_category(mut self, category: MediaCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Mark the file as usable only in direct messages.
    pub fn dm_only(mut self, dm_only: bool) -> Self {
        self.dm_only = dm_only;
        self
    }

    pub fn source(&self) -> &MediaSource {
        &self.source
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn is_dm_only(&self) -> bool {
        self.dm_only
    }

    /// The explicit category, or one inferred from the MIME type.
    pub fn category(&self) -> MediaCategory {
        self.category
            .unwrap_or_else(|| MediaCategory::infer(&self.mime_type, self.dm_only))
    }
}

/// Server-side processing state of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingState {
    Pending,
    InProgress,
    Succeeded,
    Failed,
}

impl ProcessingState {
    /// Check if processing has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingState::Succeeded | ProcessingState::Failed)
    }
}

/// Error reported for failed processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `processing_info` block of FINALIZE and STATUS responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingInfo {
    pub state: ProcessingState,
    #[serde(default)]
    pub check_after_secs: Option<u64>,
    #[serde(default)]
    pub progress_percent: Option<u8>,
    #[serde(default)]
    pub error: Option<ProcessingError>,
}

/// Phase of an [`UploadSession`]. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UploadPhase {
    /// INIT has not been acknowledged.
    Init,
    /// Segments are being appended.
    Appending,
    /// Every byte was sent; FINALIZE is next.
    Finalizing,
    /// Waiting for server-side processing.
    Polling,
    /// The media is usable.
    Done,
}

/// State of one chunked upload.
#[derive(Debug, Clone)]
pub struct UploadSession {
    pub(crate) media_id: Option<String>,
    pub(crate) total_bytes: u64,
    pub(crate) bytes_sent: u64,
    pub(crate) segment_index: u32,
    pub(crate) phase: UploadPhase,
    pub(crate) processing: Option<ProcessingInfo>,
}

impl UploadSession {
    /// Continue an upload whose INIT was acknowledged elsewhere.
    ///
    /// An empty media id leaves the session without one; appending to it
    /// then fails with `InvalidArgument`.
    pub fn resume(media_id: impl Into<String>, total_bytes: u64) -> Self {
        let media_id = Some(media_id.into()).filter(|id| !id.is_empty());
        Self {
            media_id,
            total_bytes,
            bytes_sent: 0,
            segment_index: 0,
            phase: UploadPhase::Appending,
            processing: None,
        }
    }

    pub fn media_id(&self) -> Option<&str> {
        self.media_id.as_deref()
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Index the next APPEND will carry; equals the number of segments sent.
    pub fn segment_index(&self) -> u32 {
        self.segment_index
    }

    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    /// Latest processing state reported by the server.
    pub fn processing(&self) -> Option<&ProcessingInfo> {
        self.processing.as_ref()
    }

    pub(crate) fn require_phase(&self, expected: UploadPhase, command: &str) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(Error::new(ErrorKind::Upload(format!(
                "{command} is not allowed in phase {:?}",
                self.phase
            ))))
        }
    }
}

/// Response body of INIT, FINALIZE and STATUS.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UploadResponse {
    #[serde(default, deserialize_with = "deserialize_media_id")]
    pub media_id: Option<String>,
    #[serde(default)]
    pub media_id_string: Option<String>,
    #[serde(default)]
    pub media_key: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub expires_after_secs: Option<u64>,
    #[serde(default)]
    pub processing_info: Option<ProcessingInfo>,
}

impl UploadResponse {
    pub(crate) fn id(&self) -> Option<String> {
        self.media_id_string
            .clone()
            .or_else(|| self.media_id.clone())
            .filter(|id| !id.is_empty())
    }
}

/// Accept `media_id` as either a JSON number or a string.
fn deserialize_media_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MediaId {
        Number(u64),
        String(String),
    }

    Option::<MediaId>::deserialize(deserializer).map(|opt| {
        opt.map(|v| match v {
            MediaId::Number(n) => n.to_string(),
            MediaId::String(s) => s,
        })
    })
}

/// A finished upload, ready to attach to a tweet or message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHandle {
    pub media_id: String,
    pub media_key: Option<String>,
    pub size: Option<u64>,
    pub expires_after_secs: Option<u64>,
    pub processing: Option<ProcessingInfo>,
}
