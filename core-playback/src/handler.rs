//! # Transport Event Translation
//!
//! [`EventHandler`] is the other half of the data flow: the transport changes
//! on its own (media keys, autoplay policy, the end of a track) and reports it
//! through [`TransportEvent`]s. The handler folds those back into the state
//! store, the playlist and the widgets, and republishes `play`/`pause` on the
//! bus.
//!
//! It also listens on the bus itself, so widgets follow every `trackLoaded`
//! no matter who started the load.

use crate::controller::PlaybackController;
use crate::error::Result;
use crate::events::{PlayerBus, PlayerEvent, PlayerEventKind};
use crate::handles::{format_time, UiHandles};
use crate::playlist::PlaylistManager;
use crate::state::{StateHandler, StatePatch};
use crate::types::{RepeatMode, Track};
use crate::volume::VolumeController;
use bridge_traits::media::TransportEvent;
use bridge_traits::ui::{NowPlaying, PlaylistItemHandle};
use core_runtime::events::SubscriptionId;
use futures::stream::{FuturesUnordered, StreamExt};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

pub struct EventHandler {
    bus: Arc<PlayerBus>,
    state: Arc<StateHandler>,
    playlist: Arc<PlaylistManager>,
    playback: Arc<PlaybackController>,
    volume: Arc<VolumeController>,
    handles: UiHandles,
    playlist_items: Mutex<Vec<Arc<dyn PlaylistItemHandle>>>,
    subscriptions: Mutex<Vec<SubscriptionId>>,
}

impl EventHandler {
    pub fn new(
        bus: Arc<PlayerBus>,
        state: Arc<StateHandler>,
        playlist: Arc<PlaylistManager>,
        playback: Arc<PlaybackController>,
        volume: Arc<VolumeController>,
        handles: UiHandles,
    ) -> Arc<Self> {
        let playlist_items = Mutex::new(handles.playlist_items.clone());
        Arc::new(Self {
            bus,
            state,
            playlist,
            playback,
            volume,
            handles,
            playlist_items,
            subscriptions: Mutex::new(Vec::new()),
        })
    }

    /// Subscribe to the bus events that drive the widgets and the state
    /// mirror. Calling it again while attached does nothing.
    pub fn attach(self: &Arc<Self>) {
        let mut subscriptions = self.subscriptions.lock();
        if !subscriptions.is_empty() {
            return;
        }

        let kinds = [
            PlayerEventKind::TrackLoaded,
            PlayerEventKind::RepeatModeChanged,
            PlayerEventKind::RandomModeChanged,
        ];
        for kind in kinds {
            let weak: Weak<Self> = Arc::downgrade(self);
            let id = self.bus.on(
                kind,
                Arc::new(move |event: &PlayerEvent| {
                    if let Some(handler) = weak.upgrade() {
                        handler.handle_bus_event(event);
                    }
                }),
            );
            subscriptions.push(id);
        }
    }

    /// Remove the bus subscriptions made by [`attach`](Self::attach).
    pub fn detach(&self) {
        let ids: Vec<SubscriptionId> = self.subscriptions.lock().drain(..).collect();
        for id in ids {
            self.bus.unsubscribe(id);
        }
    }

    pub fn is_attached(&self) -> bool {
        !self.subscriptions.lock().is_empty()
    }

    /// Replace the playlist item handles, e.g. after the widget re-rendered
    /// the list.
    pub fn set_playlist_items(&self, items: Vec<Arc<dyn PlaylistItemHandle>>) {
        *self.playlist_items.lock() = items;
        self.refresh_playlist_ui();
    }

    fn handle_bus_event(&self, event: &PlayerEvent) {
        match event {
            PlayerEvent::TrackLoaded { track, index } => self.refresh_track_ui(track, *index),
            PlayerEvent::RepeatModeChanged { mode } => {
                self.state.set_state(StatePatch::new().repeat(*mode));
            }
            PlayerEvent::RandomModeChanged { enabled } => {
                self.state.set_state(StatePatch::new().random(*enabled));
            }
            _ => {}
        }
    }

    // ========================================================================
    // Transport events
    // ========================================================================

    /// Consume transport events until the sender side is dropped.
    ///
    /// `ended` advances the playlist, which may probe for a long time. Those
    /// cascades run alongside the loop so later events (a native pause, a
    /// volume key) are still reflected while they settle. Overlapping loads
    /// are ordered by the playlist's load generation.
    pub async fn run(self: Arc<Self>, mut events: mpsc::UnboundedReceiver<TransportEvent>) {
        let mut endings = FuturesUnordered::new();
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(TransportEvent::Ended) => endings.push(self.on_ended()),
                    Some(event) => {
                        if let Err(e) = self.handle_transport_event(event).await {
                            warn!(event = event.name(), "Transport event handling failed: {}", e);
                        }
                    }
                    None => break,
                },
                Some(result) = endings.next(), if !endings.is_empty() => {
                    if let Err(e) = result {
                        warn!("Advancing after track end failed: {}", e);
                    }
                }
            }
        }

        while let Some(result) = endings.next().await {
            if let Err(e) = result {
                warn!("Advancing after track end failed: {}", e);
            }
        }
        debug!("Transport event channel closed");
    }

    /// Run [`run`](Self::run) on the current tokio runtime.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn spawn(
        self: &Arc<Self>,
        events: mpsc::UnboundedReceiver<TransportEvent>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.clone().run(events))
    }

    #[instrument(skip(self), level = "trace")]
    pub async fn handle_transport_event(&self, event: TransportEvent) -> Result<()> {
        match event {
            TransportEvent::TimeUpdate => self.refresh_time(),
            TransportEvent::Play => {
                self.state
                    .set_state(StatePatch::new().playing(true).paused(false).started(true));
                self.bus.emit(&PlayerEvent::Play);
            }
            TransportEvent::Pause => {
                self.state
                    .set_state(StatePatch::new().playing(false).paused(true));
                self.bus.emit(&PlayerEvent::Pause);
            }
            TransportEvent::VolumeChange => {
                if self.volume.is_muted() {
                    self.volume.mute();
                } else {
                    self.volume.unmute();
                }
            }
            TransportEvent::RateChange => {
                if let Some(rate) = self.playback.adopt_transport_rate() {
                    self.state.set_state(StatePatch::new().playback_rate(rate));
                    if let Some(display) = &self.handles.rate_display {
                        display.update(rate);
                    }
                }
            }
            TransportEvent::Ended => self.on_ended().await?,
        }
        Ok(())
    }

    async fn on_ended(&self) -> Result<()> {
        if self.playlist.repeat_mode() == RepeatMode::One {
            debug!("Track ended, repeating");
            self.playback.set_current_time(0.0);
            self.playback.play().await;
            return Ok(());
        }

        if !self.playlist.next_track(true).await? {
            debug!("Track ended, nothing further to play");
        }
        Ok(())
    }

    // ========================================================================
    // Widget refresh
    // ========================================================================

    fn refresh_time(&self) {
        if let Some(bar) = &self.handles.time_bar {
            bar.set_value(self.playback.progress());
        }
        if let Some(bar) = &self.handles.buffer_bar {
            bar.set_value(self.playback.buffer());
        }
        if let Some(text) = &self.handles.current_time {
            text.set_text(&format_time(self.playback.current_time()));
        }
        let duration = self.playback.duration();
        if duration > 0.0 {
            if let Some(text) = &self.handles.total_time {
                text.set_text(&format_time(duration));
            }
        }
    }

    fn refresh_track_ui(&self, track: &Track, index: usize) {
        debug!(index, "Refreshing widgets for loaded track");
        let metadata = &track.metadata;

        if let Some(view) = &self.handles.metadata {
            view.show(NowPlaying {
                title: metadata.title.as_deref(),
                artist: metadata.artist.as_deref(),
                album: metadata.album.as_deref(),
                thumbnail: metadata.thumbnail.as_deref(),
            });
        }
        if let Some(bar) = &self.handles.time_bar {
            bar.set_background(metadata.waveform.as_deref());
        }
        if let (Some(text), Some(duration)) = (&self.handles.total_time, metadata.duration) {
            text.set_text(&format_time(duration));
        }
        if let Some(link) = &self.handles.download_link {
            self.playlist
                .sources()
                .update_download_button(track, link.as_ref());
        }
        self.refresh_playlist_ui();
    }

    fn refresh_playlist_ui(&self) {
        let items = self.playlist_items.lock().clone();
        self.playlist.update_playlist_ui(&items);
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandler")
            .field("attached", &self.is_attached())
            .field("handles", &self.handles)
            .finish()
    }
}
