//! # Audio Player
//!
//! Composition root: builds every component on one event bus and applies the
//! configured starting state.
//!
//! ```rust,ignore
//! let player = AudioPlayer::builder(PlayerConfig::default())
//!     .sink(sink)
//!     .prober(prober)
//!     .handles(handles)
//!     .tracks(tracks)
//!     .build()?;
//!
//! let (transport_events, _task) = player.spawn_event_loop();
//! player.start().await?;
//! ```

use crate::config::PlayerConfig;
use crate::controller::PlaybackController;
use crate::error::Result;
use crate::events::{PlayerBus, PlayerEvent};
use crate::handler::EventHandler;
use crate::handles::UiHandles;
use crate::playlist::PlaylistManager;
use crate::sources::MediaSourceManager;
use crate::state::{StateHandler, StatePatch};
use crate::types::Track;
use crate::volume::VolumeController;
use bridge_traits::media::{SourceProber, TransportSink};
#[cfg(not(target_arch = "wasm32"))]
use bridge_traits::media::TransportEvent;
use bridge_traits::ui::StateTarget;
use core_runtime::events::EventStream;
use std::fmt;
use std::sync::Arc;
#[cfg(not(target_arch = "wasm32"))]
use tokio::sync::mpsc;
use tracing::info;

pub struct AudioPlayer {
    config: PlayerConfig,
    sink: Arc<dyn TransportSink>,
    bus: Arc<PlayerBus>,
    state: Arc<StateHandler>,
    sources: Arc<MediaSourceManager>,
    playlist: Arc<PlaylistManager>,
    playback: Arc<PlaybackController>,
    volume: Arc<VolumeController>,
    handler: Arc<EventHandler>,
}

impl AudioPlayer {
    pub fn builder(config: PlayerConfig) -> AudioPlayerBuilder {
        AudioPlayerBuilder::new(config)
    }

    /// Load the first track, playing it if `autoplay` is configured.
    ///
    /// Returns `Ok(false)` for an empty playlist instead of an error.
    pub async fn start(&self) -> Result<bool> {
        if self.playlist.is_empty() {
            info!("Player started without tracks");
            return Ok(false);
        }
        self.playlist.load_track(0, self.config.autoplay).await
    }

    /// Start playback, surfacing a rejection from the host.
    pub async fn try_play(&self) -> Result<()> {
        self.sink.play().await?;
        Ok(())
    }

    pub fn pause(&self) {
        self.playback.pause();
    }

    /// Create the transport event channel and drive the event handler from it
    /// on the current tokio runtime.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn spawn_event_loop(
        &self,
    ) -> (
        mpsc::UnboundedSender<TransportEvent>,
        tokio::task::JoinHandle<()>,
    ) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let task = self.handler.spawn(receiver);
        (sender, task)
    }

    /// Async view of every bus event.
    pub fn stream(&self) -> EventStream<PlayerEvent> {
        self.bus.stream()
    }

    pub fn events(&self) -> &Arc<PlayerBus> {
        &self.bus
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn state(&self) -> &Arc<StateHandler> {
        &self.state
    }

    pub fn sources(&self) -> &Arc<MediaSourceManager> {
        &self.sources
    }

    pub fn playlist(&self) -> &Arc<PlaylistManager> {
        &self.playlist
    }

    pub fn playback(&self) -> &Arc<PlaybackController> {
        &self.playback
    }

    pub fn volume(&self) -> &Arc<VolumeController> {
        &self.volume
    }

    pub fn event_handler(&self) -> &Arc<EventHandler> {
        &self.handler
    }
}

impl Drop for AudioPlayer {
    fn drop(&mut self) {
        self.handler.detach();
    }
}

impl fmt::Debug for AudioPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioPlayer")
            .field("config", &self.config)
            .field("state", &self.state.state())
            .field("playlist", &self.playlist)
            .finish()
    }
}

/// Builder for [`AudioPlayer`]. The transport sink and source prober are
/// required; everything else is optional.
pub struct AudioPlayerBuilder {
    config: PlayerConfig,
    sink: Option<Arc<dyn TransportSink>>,
    prober: Option<Arc<dyn SourceProber>>,
    target: Option<Arc<dyn StateTarget>>,
    handles: UiHandles,
    tracks: Vec<Track>,
}

impl AudioPlayerBuilder {
    pub fn new(config: PlayerConfig) -> Self {
        Self {
            config,
            sink: None,
            prober: None,
            target: None,
            handles: UiHandles::default(),
            tracks: Vec::new(),
        }
    }

    pub fn sink(mut self, sink: Arc<dyn TransportSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn prober(mut self, prober: Arc<dyn SourceProber>) -> Self {
        self.prober = Some(prober);
        self
    }

    /// Element that mirrors state as attributes.
    pub fn target(mut self, target: Arc<dyn StateTarget>) -> Self {
        self.target = Some(target);
        self
    }

    pub fn handles(mut self, handles: UiHandles) -> Self {
        self.handles = handles;
        self
    }

    pub fn tracks(mut self, tracks: Vec<Track>) -> Self {
        self.tracks = tracks;
        self
    }

    /// Wire the components and apply the configured initial state.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::InvalidConfig`](crate::PlaybackError::InvalidConfig) for out-of-range settings
    /// - [`core_runtime::Error::CapabilityMissing`] (wrapped) when the sink or prober is absent
    pub fn build(self) -> Result<AudioPlayer> {
        self.config.validate()?;

        let sink = self.sink.ok_or_else(|| core_runtime::Error::CapabilityMissing {
            capability: "TransportSink".to_string(),
            message: "the player needs a media element to drive".to_string(),
        })?;
        let prober = self.prober.ok_or_else(|| core_runtime::Error::CapabilityMissing {
            capability: "SourceProber".to_string(),
            message: "source candidates cannot be probed without a prober".to_string(),
        })?;

        let config = self.config;
        let bus = Arc::new(PlayerBus::with_settings(
            config.dispatch_policy,
            config.stream_capacity,
        ));
        let state = Arc::new(StateHandler::new(bus.clone(), self.target));
        let sources = Arc::new(MediaSourceManager::new(
            sink.clone(),
            prober,
            bus.clone(),
            config.probe_timeout(),
        ));
        let playlist = Arc::new(PlaylistManager::new(
            self.tracks,
            sources.clone(),
            bus.clone(),
        ));
        let playback = Arc::new(PlaybackController::new(sink.clone(), config.skip_duration));
        let volume = Arc::new(VolumeController::new(
            sink.clone(),
            state.clone(),
            self.handles.sound_bar.clone(),
        ));
        let handler = EventHandler::new(
            bus.clone(),
            state.clone(),
            playlist.clone(),
            playback.clone(),
            volume.clone(),
            self.handles,
        );
        handler.attach();

        volume.set_initial_volume(config.volume, config.muted);
        playlist.set_repeat_mode(config.repeat);
        playlist.set_random_mode(config.random);
        playback.set_playback_rate(config.playback_rate)?;
        state.set_state(StatePatch::new().playback_rate(config.playback_rate));

        info!(tracks = playlist.len(), "Audio player assembled");

        Ok(AudioPlayer {
            config,
            sink,
            bus,
            state,
            sources,
            playlist,
            playback,
            volume,
            handler,
        })
    }
}

impl fmt::Debug for AudioPlayerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioPlayerBuilder")
            .field("config", &self.config)
            .field("has_sink", &self.sink.is_some())
            .field("has_prober", &self.prober.is_some())
            .field("tracks", &self.tracks.len())
            .finish()
    }
}
