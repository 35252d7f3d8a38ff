//! # Playback Error Types
//!
//! Errors for source resolution, playlist navigation and player assembly.

use bridge_traits::media::{MediaErrorCode, ProbeFailure};
use bridge_traits::BridgeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classification of a single candidate's probe failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceErrorType {
    /// Fetch failed or timed out.
    Network,
    /// The container or MIME type is not supported.
    Format,
    /// The resource was fetched but could not be decoded.
    Decode,
    /// No usable source exists.
    Unavailable,
    Unknown,
}

impl From<MediaErrorCode> for SourceErrorType {
    fn from(code: MediaErrorCode) -> Self {
        match code {
            MediaErrorCode::Network => SourceErrorType::Network,
            MediaErrorCode::Decode => SourceErrorType::Decode,
            MediaErrorCode::SrcNotSupported => SourceErrorType::Format,
            MediaErrorCode::Aborted => SourceErrorType::Unavailable,
        }
    }
}

impl fmt::Display for SourceErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceErrorType::Network => "NETWORK",
            SourceErrorType::Format => "FORMAT",
            SourceErrorType::Decode => "DECODE",
            SourceErrorType::Unavailable => "UNAVAILABLE",
            SourceErrorType::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Why a track (or one of its candidates) could not be played.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind} source error: {message}")]
pub struct SourceError {
    pub kind: SourceErrorType,
    pub message: String,
    /// Candidate URL the error refers to, when it refers to one.
    pub url: Option<String>,
}

impl SourceError {
    pub fn new(kind: SourceErrorType, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Build from a host probe failure.
    pub fn from_probe(failure: &ProbeFailure, url: &str) -> Self {
        let kind = failure.code.map_or(SourceErrorType::Unknown, SourceErrorType::from);
        Self::new(kind, failure.message.clone()).with_url(url)
    }

    pub(crate) fn timed_out(url: &str, timeout_ms: u64) -> Self {
        Self::new(
            SourceErrorType::Network,
            format!("no playable signal within {timeout_ms} ms"),
        )
        .with_url(url)
    }
}

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Playlist Errors
    // ========================================================================
    /// The playlist has no tracks at all.
    #[error("Playlist is empty")]
    EmptyPlaylist,

    /// An index outside the playlist was addressed directly.
    #[error("Track index out of range: {index} (playlist has {len} tracks)")]
    OutOfRange { index: usize, len: usize },

    // ========================================================================
    // Source Errors
    // ========================================================================
    /// No candidate of a track could be played.
    #[error("Audio source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),

    /// A newer load request replaced this one before it settled.
    #[error("Load superseded by a newer request")]
    Superseded,

    /// Playback rates must be finite and positive.
    #[error("Invalid playback rate: {0}")]
    InvalidRate(f64),

    // ========================================================================
    // Assembly Errors
    // ========================================================================
    /// Configuration values are out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if retrying the same operation later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            PlaybackError::SourceUnavailable(error) => error.kind == SourceErrorType::Network,
            PlaybackError::Superseded => true,
            _ => false,
        }
    }

    /// Returns `true` if this error originates from source resolution.
    pub fn is_source_error(&self) -> bool {
        matches!(self, PlaybackError::SourceUnavailable(_) | PlaybackError::Superseded)
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_error_codes_map_to_source_kinds() {
        assert_eq!(SourceErrorType::from(MediaErrorCode::Network), SourceErrorType::Network);
        assert_eq!(SourceErrorType::from(MediaErrorCode::Decode), SourceErrorType::Decode);
        assert_eq!(
            SourceErrorType::from(MediaErrorCode::SrcNotSupported),
            SourceErrorType::Format
        );
        assert_eq!(
            SourceErrorType::from(MediaErrorCode::Aborted),
            SourceErrorType::Unavailable
        );
    }

    #[test]
    fn probe_failure_without_code_is_unknown() {
        let failure = ProbeFailure::new(None, "element error");
        let error = SourceError::from_probe(&failure, "https://cdn.example/a.mp3");
        assert_eq!(error.kind, SourceErrorType::Unknown);
        assert_eq!(error.url.as_deref(), Some("https://cdn.example/a.mp3"));
    }

    #[test]
    fn transient_classification() {
        let network = SourceError::new(SourceErrorType::Network, "reset");
        let format = SourceError::new(SourceErrorType::Format, "nope");
        assert!(PlaybackError::SourceUnavailable(network).is_transient());
        assert!(!PlaybackError::SourceUnavailable(format).is_transient());
        assert!(!PlaybackError::EmptyPlaylist.is_transient());
        assert!(!PlaybackError::EmptyPlaylist.is_source_error());
    }

    #[test]
    fn source_error_display() {
        let error = SourceError::new(SourceErrorType::Decode, "bad frame");
        assert_eq!(error.to_string(), "DECODE source error: bad frame");
    }
}
