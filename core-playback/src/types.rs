//! Core types for the player: tracks, their declared sources and repeat mode.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One declared source of a track.
///
/// Hosts either pass a bare URL (MIME type inferred from the extension) or an
/// explicit `{ "src": ..., "type": ... }` descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceDescriptor {
    Url(String),
    Typed {
        src: String,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
}

impl SourceDescriptor {
    pub fn url(&self) -> &str {
        match self {
            SourceDescriptor::Url(url) => url,
            SourceDescriptor::Typed { src, .. } => src,
        }
    }
}

impl From<&str> for SourceDescriptor {
    fn from(url: &str) -> Self {
        SourceDescriptor::Url(url.to_string())
    }
}

impl From<String> for SourceDescriptor {
    fn from(url: String) -> Self {
        SourceDescriptor::Url(url)
    }
}

/// A track's `source` field: a single descriptor or a preference-ordered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackSource {
    One(SourceDescriptor),
    Many(Vec<SourceDescriptor>),
}

impl TrackSource {
    /// Descriptors in declaration order.
    pub fn descriptors(&self) -> &[SourceDescriptor] {
        match self {
            TrackSource::One(descriptor) => std::slice::from_ref(descriptor),
            TrackSource::Many(descriptors) => descriptors,
        }
    }
}

impl From<&str> for TrackSource {
    fn from(url: &str) -> Self {
        TrackSource::One(url.into())
    }
}

impl From<String> for TrackSource {
    fn from(url: String) -> Self {
        TrackSource::One(url.into())
    }
}

impl From<SourceDescriptor> for TrackSource {
    fn from(descriptor: SourceDescriptor) -> Self {
        TrackSource::One(descriptor)
    }
}

impl From<Vec<SourceDescriptor>> for TrackSource {
    fn from(descriptors: Vec<SourceDescriptor>) -> Self {
        TrackSource::Many(descriptors)
    }
}

/// Display metadata supplied by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// Artwork URL
    pub thumbnail: Option<String>,
    /// Declared duration in seconds, shown before the media reports its own
    pub duration: Option<f64>,
    /// Waveform image URL drawn behind the time bar
    pub waveform: Option<String>,
}

/// A playlist entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub source: TrackSource,

    #[serde(default)]
    pub metadata: TrackMetadata,

    /// Whether the download link may point at this track
    #[serde(default = "default_allow_download", rename = "allowDownload")]
    pub allow_download: bool,

    /// Livestreams never expose a download link
    #[serde(default)]
    pub live: bool,
}

fn default_allow_download() -> bool {
    true
}

impl Track {
    pub fn new(source: impl Into<TrackSource>) -> Self {
        Self {
            source: source.into(),
            metadata: TrackMetadata::default(),
            allow_download: true,
            live: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.metadata.title = Some(title.into());
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.metadata.artist = Some(artist.into());
        self
    }

    pub fn with_metadata(mut self, metadata: TrackMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_download(mut self, allow: bool) -> Self {
        self.allow_download = allow;
        self
    }

    pub fn live(mut self) -> Self {
        self.live = true;
        self
    }

    /// Title for logs and error displays; falls back to the first source URL.
    pub fn label(&self) -> &str {
        self.metadata
            .title
            .as_deref()
            .or_else(|| self.source.descriptors().first().map(SourceDescriptor::url))
            .unwrap_or("<untitled>")
    }
}

/// Repeat policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop after the last track
    #[default]
    Off,
    /// Replay the current track
    One,
    /// Wrap to the first track after the last
    All,
}

impl RepeatMode {
    /// Numeric form used in attributes and host APIs (0, 1, 2).
    pub fn as_u8(self) -> u8 {
        match self {
            RepeatMode::Off => 0,
            RepeatMode::One => 1,
            RepeatMode::All => 2,
        }
    }

    /// Next mode in the Off → One → All → Off cycle.
    pub fn next(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::One,
            RepeatMode::One => RepeatMode::All,
            RepeatMode::All => RepeatMode::Off,
        }
    }
}

impl TryFrom<u8> for RepeatMode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RepeatMode::Off),
            1 => Ok(RepeatMode::One),
            2 => Ok(RepeatMode::All),
            other => Err(other),
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}
