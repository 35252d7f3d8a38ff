//! Media transport bridge traits.
//!
//! The core never owns a real media element. Hosts hand it a [`TransportSink`]
//! (the element that actually plays audio) and a [`SourceProber`] (a way to ask
//! whether a candidate URL can be played, using a throwaway element). Both are
//! intentionally narrow: the core only needs time, volume, rate and source
//! management, plus the lifecycle events listed in [`TransportEvent`].

use crate::{error::Result, platform::PlatformSendSync};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single playable candidate resolved from a track's declared sources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceCandidate {
    /// Location of the media resource.
    pub url: String,
    /// MIME type, either declared by the host or inferred from the extension.
    pub mime_type: Option<String>,
}

impl SourceCandidate {
    /// Create a candidate from a URL and an optional MIME type.
    pub fn new(url: impl Into<String>, mime_type: Option<String>) -> Self {
        Self {
            url: url.into(),
            mime_type,
        }
    }

    /// Returns `true` when a MIME type is known for this candidate.
    pub fn has_mime_type(&self) -> bool {
        self.mime_type.as_deref().is_some_and(|mime| !mime.is_empty())
    }
}

impl fmt::Display for SourceCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.mime_type {
            Some(mime) => write!(f, "{} ({})", self.url, mime),
            None => f.write_str(&self.url),
        }
    }
}

/// Answer of a `canPlayType`-style capability query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayCapability {
    /// The host definitely cannot play this type.
    No,
    /// The host might be able to play this type.
    Maybe,
    /// The host is confident it can play this type.
    Probably,
}

impl PlayCapability {
    /// Map the textual answer of a browser `canPlayType` call.
    pub fn from_answer(answer: &str) -> Self {
        match answer {
            "probably" => PlayCapability::Probably,
            "maybe" => PlayCapability::Maybe,
            _ => PlayCapability::No,
        }
    }

    /// Returns `true` unless the type is definitely unsupported.
    pub fn is_possible(&self) -> bool {
        !matches!(self, PlayCapability::No)
    }
}

/// Error codes reported by a host media element, mirroring `MediaError.code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaErrorCode {
    /// Fetching was aborted by the user agent.
    Aborted,
    /// A network error interrupted the fetch.
    Network,
    /// The resource was fetched but could not be decoded.
    Decode,
    /// The resource or its format is not supported.
    SrcNotSupported,
}

/// Failure signal raised while probing a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeFailure {
    /// Error code when the host exposed one.
    pub code: Option<MediaErrorCode>,
    /// Human-readable description.
    pub message: String,
}

impl ProbeFailure {
    pub fn new(code: Option<MediaErrorCode>, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{:?}: {}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// A buffered time range in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Returns `true` when `time` lies inside the range (inclusive).
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }
}

/// Native lifecycle events emitted by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportEvent {
    Play,
    Pause,
    Ended,
    TimeUpdate,
    VolumeChange,
    RateChange,
}

impl TransportEvent {
    /// The DOM event name the host listens to.
    pub fn name(&self) -> &'static str {
        match self {
            TransportEvent::Play => "play",
            TransportEvent::Pause => "pause",
            TransportEvent::Ended => "ended",
            TransportEvent::TimeUpdate => "timeupdate",
            TransportEvent::VolumeChange => "volumechange",
            TransportEvent::RateChange => "ratechange",
        }
    }

    /// Parse a DOM event name. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "play" => Some(TransportEvent::Play),
            "pause" => Some(TransportEvent::Pause),
            "ended" => Some(TransportEvent::Ended),
            "timeupdate" => Some(TransportEvent::TimeUpdate),
            "volumechange" => Some(TransportEvent::VolumeChange),
            "ratechange" => Some(TransportEvent::RateChange),
            _ => None,
        }
    }
}

/// The playback primitive the core drives.
///
/// Setters take `&self`; adapters are expected to use interior mutability (the
/// underlying element is itself a shared handle). Time values are seconds.
/// `duration` may be `NaN` or infinite before metadata resolves or for live
/// streams; callers are responsible for sanitising it.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait TransportSink: PlatformSendSync {
    /// Start playback. Fails with [`BridgeError::PlayRejected`](crate::BridgeError::PlayRejected)
    /// when the host blocks it.
    async fn play(&self) -> Result<()>;

    fn pause(&self);

    fn paused(&self) -> bool;

    fn current_time(&self) -> f64;

    fn set_current_time(&self, seconds: f64);

    fn duration(&self) -> f64;

    fn volume(&self) -> f64;

    fn set_volume(&self, volume: f64);

    fn muted(&self) -> bool;

    fn set_muted(&self, muted: bool);

    fn playback_rate(&self) -> f64;

    fn set_playback_rate(&self, rate: f64);

    /// Buffered ranges in ascending order.
    fn buffered(&self) -> Vec<TimeRange>;

    /// Detach every source currently attached to the element.
    fn remove_sources(&self);

    /// Attach sources in preference order.
    fn attach_sources(&self, sources: &[SourceCandidate]);

    /// Reload the element with the attached sources. Resets the playback rate.
    fn load(&self);
}

/// Capability probe backed by scratch media elements.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait SourceProber: PlatformSendSync {
    /// Synchronous `canPlayType` query for a MIME type.
    fn can_play_type(&self, mime_type: &str) -> PlayCapability;

    /// Attach `candidate` to a scratch element and resolve once it signals
    /// playable (`Ok`) or errors (`Err`). Implementations need not time out;
    /// the core bounds the wait.
    async fn probe(&self, candidate: &SourceCandidate) -> std::result::Result<(), ProbeFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_capability_from_answer() {
        assert_eq!(PlayCapability::from_answer("probably"), PlayCapability::Probably);
        assert_eq!(PlayCapability::from_answer("maybe"), PlayCapability::Maybe);
        assert_eq!(PlayCapability::from_answer(""), PlayCapability::No);
        assert!(!PlayCapability::No.is_possible());
        assert!(PlayCapability::Maybe.is_possible());
    }

    #[test]
    fn transport_event_names_round_trip() {
        for event in [
            TransportEvent::Play,
            TransportEvent::Pause,
            TransportEvent::Ended,
            TransportEvent::TimeUpdate,
            TransportEvent::VolumeChange,
            TransportEvent::RateChange,
        ] {
            assert_eq!(TransportEvent::from_name(event.name()), Some(event));
        }
        assert_eq!(TransportEvent::from_name("seeking"), None);
    }

    #[test]
    fn candidate_mime_detection() {
        assert!(SourceCandidate::new("a.mp3", Some("audio/mpeg".into())).has_mime_type());
        assert!(!SourceCandidate::new("a", Some(String::new())).has_mime_type());
        assert!(!SourceCandidate::new("a", None).has_mime_type());
    }

    mockall::mock! {
        pub Prober {}

        #[async_trait::async_trait]
        impl SourceProber for Prober {
            fn can_play_type(&self, mime_type: &str) -> PlayCapability;
            async fn probe(&self, candidate: &SourceCandidate) -> std::result::Result<(), ProbeFailure>;
        }
    }

    #[tokio::test]
    async fn prober_works_behind_trait_object() {
        let mut prober = MockProber::new();
        prober.expect_can_play_type().returning(|mime| {
            if mime == "audio/flac" {
                PlayCapability::No
            } else {
                PlayCapability::Maybe
            }
        });
        prober.expect_probe().times(1).returning(|candidate| {
            Err(ProbeFailure::new(
                Some(MediaErrorCode::Network),
                format!("{} unreachable", candidate.url),
            ))
        });

        let prober: std::sync::Arc<dyn SourceProber> = std::sync::Arc::new(prober);
        assert!(!prober.can_play_type("audio/flac").is_possible());
        assert!(prober.can_play_type("audio/mpeg").is_possible());

        let failure = prober
            .probe(&SourceCandidate::new("a.mp3", None))
            .await
            .unwrap_err();
        assert_eq!(failure.code, Some(MediaErrorCode::Network));
        assert_eq!(failure.to_string(), "Network: a.mp3 unreachable");
    }

    #[test]
    fn time_range_contains_bounds() {
        let range = TimeRange::new(2.0, 5.0);
        assert!(range.contains(2.0));
        assert!(range.contains(5.0));
        assert!(!range.contains(5.1));
    }
}
