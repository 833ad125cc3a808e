//! The INIT / APPEND / FINALIZE / STATUS state machine.

use std::time::{Duration, Instant};

use birdwire_client::{
    ApiRequest, Error, ErrorKind, FilePart, Payload, RequestMethod, Result, TwitterHttpClient,
};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info, instrument, warn};

use crate::types::{
    MediaFile, MediaHandle, MediaSource, ProcessingInfo, ProcessingState, UploadPhase,
    UploadResponse, UploadSession,
};

/// Default APPEND segment size (4 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Default maximum number of STATUS polls.
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 60;

/// Default maximum time to wait for processing (10 minutes).
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(600);

/// Wait used when a non-terminal processing state omits `check_after_secs`.
const DEFAULT_CHECK_AFTER: Duration = Duration::from_secs(1);

/// Configuration for chunked uploads.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Bytes per APPEND segment.
    pub chunk_size: usize,
    /// Maximum STATUS polls before giving up.
    pub max_poll_attempts: u32,
    /// Maximum total time spent waiting for processing.
    pub max_wait: Duration,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

impl UploadConfig {
    /// Set the segment size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set the maximum number of STATUS polls.
    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = attempts;
        self
    }

    /// Set the processing deadline.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }
}

/// Uploads media files to the upload host in segments.
///
/// # Example
///
/// ```rust,ignore
/// use birdwire_media::{MediaFile, MediaUploader};
///
/// let uploader = MediaUploader::new(client);
/// let file = MediaFile::open("clip.mp4").await?;
/// let handle = uploader.upload(&file).await?;
/// println!("attach media id {}", handle.media_id);
/// ```
#[derive(Debug, Clone)]
pub struct MediaUploader {
    client: TwitterHttpClient,
    config: UploadConfig,
}

impl MediaUploader {
    /// Create an uploader with the default configuration.
    pub fn new(client: TwitterHttpClient) -> Self {
        Self::with_config(client, UploadConfig::default())
    }

    /// Create an uploader with a custom configuration.
    pub fn with_config(client: TwitterHttpClient, config: UploadConfig) -> Self {
        Self { client, config }
    }

    /// Get the upload configuration.
    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    fn upload_request(&self, method: RequestMethod) -> ApiRequest {
        ApiRequest::absolute(method, self.client.config().upload_url.clone()).oauth1()
    }

    async fn send(&self, request: &ApiRequest) -> Result<Option<UploadResponse>> {
        match self.client.execute(request).await? {
            Payload::Json(value) => Ok(Some(serde_json::from_value(value)?)),
            Payload::Text(_) | Payload::Empty | Payload::EmptyCollection => Ok(None),
        }
    }

    /// Upload a file end to end: INIT, every APPEND, FINALIZE and any
    /// processing wait.
    #[instrument(skip(self, file), fields(mime = file.mime_type(), total_bytes = file.total_bytes()))]
    pub async fn upload(&self, file: &MediaFile) -> Result<MediaHandle> {
        let mut session = self.init(file).await?;

        let mut reader: Box<dyn AsyncRead + Unpin + Send> = match file.source() {
            MediaSource::Path(path) => Box::new(tokio::fs::File::open(path).await?),
            MediaSource::Bytes(bytes) => Box::new(std::io::Cursor::new(bytes.clone())),
        };

        self.append(&mut session, &mut reader).await?;
        self.finalize(&mut session).await
    }

    /// Announce an upload and obtain its media id.
    #[instrument(skip(self, file), fields(category = file.category().as_str()))]
    pub async fn init(&self, file: &MediaFile) -> Result<UploadSession> {
        let request = self
            .upload_request(RequestMethod::Post)
            .form("command", "INIT")
            .form("media_type", file.mime_type())
            .form("total_bytes", file.total_bytes().to_string())
            .form("media_category", file.category().as_str())
            .form("shared", file.is_dm_only().to_string());

        let media_id = self
            .send(&request)
            .await?
            .and_then(|res| res.id())
            .ok_or_else(|| {
                Error::new(ErrorKind::Upload(
                    "INIT response did not contain a media id".to_string(),
                ))
            })?;

        debug!(media_id = %media_id, "Upload initialized");

        Ok(UploadSession {
            media_id: Some(media_id),
            total_bytes: file.total_bytes(),
            bytes_sent: 0,
            segment_index: 0,
            phase: UploadPhase::Appending,
            processing: None,
        })
    }

    /// Send the file content in segments until every byte is sent.
    ///
    /// Segment indexes start at 0 and increase by one per APPEND.
    #[instrument(skip(self, session, reader), fields(media_id = session.media_id()))]
    pub async fn append<R>(&self, session: &mut UploadSession, reader: &mut R) -> Result<()>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let media_id = session.media_id.clone().ok_or_else(|| {
            Error::new(ErrorKind::InvalidArgument(
                "upload session has no media id".to_string(),
            ))
        })?;
        session.require_phase(UploadPhase::Appending, "APPEND")?;

        let chunk_size = self.config.chunk_size as u64;
        while session.bytes_sent < session.total_bytes {
            let want = chunk_size.min(session.total_bytes - session.bytes_sent);
            let mut chunk = Vec::with_capacity(want as usize);
            (&mut *reader).take(want).read_to_end(&mut chunk).await?;

            if chunk.is_empty() {
                return Err(Error::new(ErrorKind::Upload(format!(
                    "media source ended after {} of {} bytes",
                    session.bytes_sent, session.total_bytes
                ))));
            }

            let sent = chunk.len() as u64;
            let request = self
                .upload_request(RequestMethod::Post)
                .form("command", "APPEND")
                .form("media_id", media_id.as_str())
                .form("segment_index", session.segment_index.to_string())
                .file(FilePart::new("media", chunk));
            self.client.execute(&request).await?;

            session.bytes_sent += sent;
            session.segment_index += 1;
            debug!(
                segment_index = session.segment_index - 1,
                bytes_sent = session.bytes_sent,
                total_bytes = session.total_bytes,
                "Segment appended"
            );
        }

        session.phase = UploadPhase::Finalizing;
        Ok(())
    }

    /// Complete the upload and wait for server-side processing.
    #[instrument(skip(self, session), fields(media_id = session.media_id()))]
    pub async fn finalize(&self, session: &mut UploadSession) -> Result<MediaHandle> {
        session.require_phase(UploadPhase::Finalizing, "FINALIZE")?;
        let media_id = session.media_id.clone().ok_or_else(|| {
            Error::new(ErrorKind::InvalidArgument(
                "upload session has no media id".to_string(),
            ))
        })?;

        let request = self
            .upload_request(RequestMethod::Post)
            .form("command", "FINALIZE")
            .form("media_id", media_id.as_str());
        let response = self.send(&request).await?;

        let mut handle = MediaHandle {
            media_id: response.as_ref().and_then(|r| r.id()).unwrap_or(media_id),
            media_key: response.as_ref().and_then(|r| r.media_key.clone()),
            size: response.as_ref().and_then(|r| r.size),
            expires_after_secs: response.as_ref().and_then(|r| r.expires_after_secs),
            processing: None,
        };

        session.processing = response.and_then(|r| r.processing_info);
        session.phase = UploadPhase::Polling;

        self.wait_for_processing(session).await?;

        session.phase = UploadPhase::Done;
        handle.processing = session.processing.clone();
        info!(media_id = %handle.media_id, "Upload complete");
        Ok(handle)
    }

    /// Poll STATUS until processing succeeds, fails, or the limits run out.
    async fn wait_for_processing(&self, session: &mut UploadSession) -> Result<()> {
        let media_id = session.media_id.clone().unwrap_or_default();
        let start = Instant::now();
        let mut waited = Duration::ZERO;
        let mut attempts = 0;

        loop {
            let info = match &session.processing {
                None => return Ok(()),
                Some(info) => info,
            };

            let check_after = match info.state {
                ProcessingState::Succeeded => return Ok(()),
                ProcessingState::Failed => {
                    let message = info
                        .error
                        .as_ref()
                        .and_then(|e| e.message.clone())
                        .unwrap_or_else(|| "media processing failed".to_string());
                    return Err(Error::new(ErrorKind::Upload(format!(
                        "failed to finalize media {media_id}: {message}"
                    ))));
                }
                ProcessingState::Pending | ProcessingState::InProgress => info
                    .check_after_secs
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_CHECK_AFTER),
            };

            if attempts >= self.config.max_poll_attempts {
                return Err(Error::new(ErrorKind::Upload(format!(
                    "media {media_id} still processing after {attempts} status checks"
                ))));
            }
            if start.elapsed().max(waited) + check_after > self.config.max_wait {
                return Err(Error::new(ErrorKind::Upload(format!(
                    "media {media_id} did not finish processing within {:?}",
                    self.config.max_wait
                ))));
            }

            warn!(
                media_id = %media_id,
                state = ?info.state,
                progress = ?info.progress_percent,
                wait_secs = check_after.as_secs(),
                "Media is still processing, checking again later"
            );
            self.client.sleep(check_after).await;
            waited += check_after;
            attempts += 1;

            session.processing = self.status(&media_id).await?;
        }
    }

    /// Check the processing state of an uploaded file once.
    #[instrument(skip(self))]
    pub async fn status(&self, media_id: &str) -> Result<Option<ProcessingInfo>> {
        let request = self
            .upload_request(RequestMethod::Get)
            .query("command", "STATUS")
            .query("media_id", media_id);

        Ok(self
            .send(&request)
            .await?
            .and_then(|res| res.processing_info))
    }
}
