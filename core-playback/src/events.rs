//! # Player Events
//!
//! The vocabulary carried by the player's [`EventBus`]. Every component that
//! publishes or observes player activity speaks in [`PlayerEvent`]s; handlers
//! subscribe by [`PlayerEventKind`].

use crate::error::SourceError;
use crate::state::PlayerState;
use crate::types::{RepeatMode, Track};
use core_runtime::events::{BusEvent, EventBus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The bus shared by one player instance.
pub type PlayerBus = EventBus<PlayerEvent>;

/// Events published by the playback core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PlayerEvent {
    /// The full state after a `set_state` merge.
    StateChange(PlayerState),

    /// The transport started playing.
    Play,

    /// The transport paused.
    Pause,

    /// A playlist entry became current.
    TrackLoaded { track: Track, index: usize },

    /// A track's sources were attached to the transport.
    SourceLoaded { track: Track },

    /// None of a track's candidates were playable.
    SourceError {
        track: Track,
        error: SourceError,
        attempt_count: u32,
    },

    /// A playlist entry failed; the cascade decides what is tried next.
    TrackLoadError {
        track: Track,
        index: usize,
        error: SourceError,
    },

    /// A load was requested on an empty playlist.
    PlaylistError { message: String },

    /// Navigation ran past either end with repeat-all off. `index` is the
    /// requested position and may be negative.
    PlaylistEnd { index: isize },

    RepeatModeChanged { mode: RepeatMode },

    RandomModeChanged { enabled: bool },

    /// The track list was replaced.
    TracksChanged { count: usize },

    TrackAdded { track: Track, index: usize },

    TrackRemoved { track: Track, index: usize },
}

/// Discriminant of [`PlayerEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerEventKind {
    StateChange,
    Play,
    Pause,
    TrackLoaded,
    SourceLoaded,
    SourceError,
    TrackLoadError,
    PlaylistError,
    PlaylistEnd,
    RepeatModeChanged,
    RandomModeChanged,
    TracksChanged,
    TrackAdded,
    TrackRemoved,
}

impl PlayerEventKind {
    /// Event name as hosts know it (`trackLoaded`, `stateChange`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            PlayerEventKind::StateChange => "stateChange",
            PlayerEventKind::Play => "play",
            PlayerEventKind::Pause => "pause",
            PlayerEventKind::TrackLoaded => "trackLoaded",
            PlayerEventKind::SourceLoaded => "sourceLoaded",
            PlayerEventKind::SourceError => "sourceError",
            PlayerEventKind::TrackLoadError => "trackLoadError",
            PlayerEventKind::PlaylistError => "playlistError",
            PlayerEventKind::PlaylistEnd => "playlistEnd",
            PlayerEventKind::RepeatModeChanged => "repeatModeChanged",
            PlayerEventKind::RandomModeChanged => "randomModeChanged",
            PlayerEventKind::TracksChanged => "tracksChanged",
            PlayerEventKind::TrackAdded => "trackAdded",
            PlayerEventKind::TrackRemoved => "trackRemoved",
        }
    }
}

impl fmt::Display for PlayerEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl PlayerEvent {
    /// Returns `true` for events an error display should surface.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            PlayerEvent::SourceError { .. }
                | PlayerEvent::TrackLoadError { .. }
                | PlayerEvent::PlaylistError { .. }
        )
    }

    /// Short description for logs.
    pub fn description(&self) -> String {
        match self {
            PlayerEvent::StateChange(state) => {
                format!("state changed (playing={}, volume={:.2})", state.playing, state.volume)
            }
            PlayerEvent::Play => "playing".to_string(),
            PlayerEvent::Pause => "paused".to_string(),
            PlayerEvent::TrackLoaded { track, index } => {
                format!("track {} loaded: {}", index, track.label())
            }
            PlayerEvent::SourceLoaded { track } => format!("sources attached: {}", track.label()),
            PlayerEvent::SourceError {
                track,
                error,
                attempt_count,
            } => format!(
                "no playable source for {} (attempt {}): {}",
                track.label(),
                attempt_count,
                error
            ),
            PlayerEvent::TrackLoadError { index, error, .. } => {
                format!("track {} failed: {}", index, error)
            }
            PlayerEvent::PlaylistError { message } => format!("playlist error: {}", message),
            PlayerEvent::PlaylistEnd { index } => format!("playlist end reached at {}", index),
            PlayerEvent::RepeatModeChanged { mode } => format!("repeat mode {}", mode),
            PlayerEvent::RandomModeChanged { enabled } => format!("random mode {}", enabled),
            PlayerEvent::TracksChanged { count } => format!("playlist replaced ({} tracks)", count),
            PlayerEvent::TrackAdded { index, .. } => format!("track added at {}", index),
            PlayerEvent::TrackRemoved { index, .. } => format!("track removed from {}", index),
        }
    }
}

impl BusEvent for PlayerEvent {
    type Kind = PlayerEventKind;

    fn kind(&self) -> PlayerEventKind {
        match self {
            PlayerEvent::StateChange(_) => PlayerEventKind::StateChange,
            PlayerEvent::Play => PlayerEventKind::Play,
            PlayerEvent::Pause => PlayerEventKind::Pause,
            PlayerEvent::TrackLoaded { .. } => PlayerEventKind::TrackLoaded,
            PlayerEvent::SourceLoaded { .. } => PlayerEventKind::SourceLoaded,
            PlayerEvent::SourceError { .. } => PlayerEventKind::SourceError,
            PlayerEvent::TrackLoadError { .. } => PlayerEventKind::TrackLoadError,
            PlayerEvent::PlaylistError { .. } => PlayerEventKind::PlaylistError,
            PlayerEvent::PlaylistEnd { .. } => PlayerEventKind::PlaylistEnd,
            PlayerEvent::RepeatModeChanged { .. } => PlayerEventKind::RepeatModeChanged,
            PlayerEvent::RandomModeChanged { .. } => PlayerEventKind::RandomModeChanged,
            PlayerEvent::TracksChanged { .. } => PlayerEventKind::TracksChanged,
            PlayerEvent::TrackAdded { .. } => PlayerEventKind::TrackAdded,
            PlayerEvent::TrackRemoved { .. } => PlayerEventKind::TrackRemoved,
        }
    }
}
