//! # Playback Coordination Core
//!
//! Drives a host media element through a playlist with cascading source
//! fallback, and keeps the player state and widgets consistent with what the
//! element is actually doing.
//!
//! ## Overview
//!
//! This crate handles:
//! - Source resolution: MIME inference, capability filtering, bounded
//!   sequential probing ([`sources`])
//! - Playlist navigation with repeat/random policy and a failure cascade
//!   across tracks ([`playlist`])
//! - Bounded transport access and volume/mute coupling ([`controller`], [`volume`])
//! - Canonical player state mirrored onto a host element ([`state`])
//! - Translation of native transport events back into state and widgets
//!   ([`handler`])
//!
//! Everything is wired on one [`PlayerBus`] per player; [`AudioPlayer`]
//! assembles the pieces.
//!
//! ## Concurrency
//!
//! Components are `Send + Sync` and never hold a lock across an `.await` or
//! while emitting. Overlapping loads are ordered by generation: only the most
//! recent navigation request may change the transport or the current index.

pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod handler;
pub mod handles;
pub mod player;
pub mod playlist;
pub mod sources;
pub mod state;
pub mod types;
pub mod volume;

pub use config::{PlayerConfig, PlayerConfigBuilder};
pub use controller::PlaybackController;
pub use error::{PlaybackError, Result, SourceError, SourceErrorType};
pub use events::{PlayerBus, PlayerEvent, PlayerEventKind};
pub use handler::EventHandler;
pub use handles::{format_time, UiHandles};
pub use player::{AudioPlayer, AudioPlayerBuilder};
pub use playlist::PlaylistManager;
pub use sources::{LoadGeneration, LoadTicket, MediaSourceManager, SourceLoad};
pub use state::{PlayerState, StateField, StateHandler, StatePatch, StateValue, Subscription};
pub use types::{RepeatMode, SourceDescriptor, Track, TrackMetadata, TrackSource};
pub use volume::VolumeController;
