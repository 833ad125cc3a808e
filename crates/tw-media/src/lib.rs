//! # tw-media
//!
//! Chunked media upload for the Twitter API.
//!
//! Uploads go to a separate host and always use OAuth 1.0a. A file moves
//! through a forward-only sequence of phases:
//!
//! ```text
//! INIT ──► APPEND × n ──► FINALIZE ──► STATUS poll ──► done
//!  │         (4 MiB        │              (sleep
//!  │        segments,      │          check_after_secs,
//!  ▼       index 0..n)     ▼            bounded)
//! media id              processing_info
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use birdwire_client::TwitterHttpClient;
//! use birdwire_media::{MediaFile, MediaUploader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), birdwire_client::Error> {
//!     let client = TwitterHttpClient::with_credentials(credentials)?;
//!     let uploader = MediaUploader::new(client);
//!
//!     let file = MediaFile::open("launch.mp4").await?;
//!     let handle = uploader.upload(&file).await?;
//!
//!     println!("media id: {}", handle.media_id);
//!     Ok(())
//! }
//! ```

mod types;
mod uploader;

pub use types::{
    mime_from_extension, MediaCategory, MediaFile, MediaHandle, MediaSource, ProcessingError,
    ProcessingInfo, ProcessingState, UploadPhase, UploadSession,
};
pub use uploader::{
    MediaUploader, UploadConfig, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_MAX_WAIT,
};
