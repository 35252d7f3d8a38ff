//! # Playlist Management
//!
//! Ordered track list with navigation under repeat and random policy.
//!
//! ## Load cascade
//!
//! A load that finds no playable source for its track does not give up: it
//! reports `TrackLoadError` and moves on to the next entry (a random untried
//! entry in random mode), wrapping to the first entry under repeat-all. Every
//! index tried is remembered for the rest of the cascade, so a cascade ends
//! as soon as it would revisit an entry. When every track fails the only
//! trace is the events already emitted.
//!
//! Each externally triggered load takes a new generation ticket. A cascade
//! overtaken by a newer load stops quietly and changes nothing.

use crate::error::{PlaybackError, Result};
use crate::events::{PlayerBus, PlayerEvent};
use crate::sources::{LoadGeneration, LoadTicket, MediaSourceManager, SourceLoad};
use crate::types::{RepeatMode, Track};
use bridge_traits::ui::PlaylistItemHandle;
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct PlaylistInner {
    tracks: Vec<Track>,
    current_index: Option<usize>,
    repeat: RepeatMode,
    random: bool,
    attempted: HashSet<usize>,
}

impl PlaylistInner {
    /// Where a failed cascade goes after `index`, or `None` to stop.
    fn cascade_step(&self, index: usize) -> Option<usize> {
        let len = self.tracks.len();
        let next = if index + 1 < len {
            if self.random {
                let untried: Vec<usize> = (0..len).filter(|i| !self.attempted.contains(i)).collect();
                untried.choose(&mut thread_rng()).copied()
            } else {
                Some(index + 1)
            }
        } else if self.repeat == RepeatMode::All {
            Some(0)
        } else {
            None
        };

        next.filter(|candidate| !self.attempted.contains(candidate))
    }
}

/// Playlist state machine over the current index.
pub struct PlaylistManager {
    inner: Mutex<PlaylistInner>,
    sources: Arc<MediaSourceManager>,
    bus: Arc<PlayerBus>,
    generation: LoadGeneration,
}

impl PlaylistManager {
    pub fn new(tracks: Vec<Track>, sources: Arc<MediaSourceManager>, bus: Arc<PlayerBus>) -> Self {
        Self {
            inner: Mutex::new(PlaylistInner {
                tracks,
                ..Default::default()
            }),
            sources,
            bus,
            generation: LoadGeneration::new(),
        }
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Load the track at `index`.
    ///
    /// Returns `Ok(true)` once a track (this one or one reached by the failure
    /// cascade) is attached, `Ok(false)` when navigation ran off the end, every
    /// track failed, or a newer load overtook this one.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::EmptyPlaylist`] when there are no tracks.
    pub async fn load_track(&self, index: usize, autoplay: bool) -> Result<bool> {
        let position = isize::try_from(index).unwrap_or(isize::MAX);
        self.load_position(position, autoplay).await
    }

    async fn load_position(&self, position: isize, autoplay: bool) -> Result<bool> {
        let (len, repeat) = {
            let inner = self.inner.lock();
            (inner.tracks.len(), inner.repeat)
        };

        if len == 0 {
            warn!("Load requested on an empty playlist");
            self.bus.emit(&PlayerEvent::PlaylistError {
                message: "No tracks in playlist".to_string(),
            });
            return Err(PlaybackError::EmptyPlaylist);
        }

        let index = match usize::try_from(position) {
            Ok(index) if index < len => index,
            _ if repeat == RepeatMode::All => 0,
            _ => {
                debug!(index = position, "Reached playlist end");
                self.bus.emit(&PlayerEvent::PlaylistEnd { index: position });
                return Ok(false);
            }
        };

        self.sources.reset_source_errors();
        let ticket = {
            let mut inner = self.inner.lock();
            inner.attempted.clear();
            self.generation.advance()
        };

        self.cascade(index, autoplay, ticket).await
    }

    async fn cascade(&self, start: usize, autoplay: bool, ticket: LoadTicket) -> Result<bool> {
        let mut index = start;

        loop {
            let track = {
                let mut inner = self.inner.lock();
                if !ticket.is_current() {
                    return Ok(false);
                }
                let Some(track) = inner.tracks.get(index).cloned() else {
                    return Ok(false);
                };
                inner.attempted.insert(index);
                track
            };

            debug!(index, "Loading track");
            match self.sources.load_track_sources(&track, autoplay, &ticket).await {
                SourceLoad::Loaded(_) => {
                    {
                        let mut inner = self.inner.lock();
                        if !ticket.is_current() {
                            return Ok(false);
                        }
                        inner.current_index = Some(index);
                        inner.attempted.clear();
                    }
                    info!(index, track = %track.label(), "Track loaded");
                    self.bus.emit(&PlayerEvent::TrackLoaded { track, index });
                    return Ok(true);
                }
                SourceLoad::Superseded => return Ok(false),
                SourceLoad::Failed(error) => {
                    if !ticket.is_current() {
                        return Ok(false);
                    }
                    self.bus.emit(&PlayerEvent::TrackLoadError {
                        track,
                        index,
                        error,
                    });

                    let next = self.inner.lock().cascade_step(index);
                    match next {
                        Some(next) => {
                            debug!(from = index, to = next, "Cascading to next track");
                            index = next;
                        }
                        None => {
                            warn!(index, "Every reachable track failed to load");
                            return Ok(false);
                        }
                    }
                }
            }
        }
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Advance to the next track, or a random one in random mode.
    pub async fn next_track(&self, autoplay: bool) -> Result<bool> {
        let (random, current) = {
            let inner = self.inner.lock();
            (inner.random, inner.current_index)
        };

        if random {
            return self.random_track(autoplay).await;
        }
        self.load_position(Self::offset(current, 1), autoplay).await
    }

    /// Step back one track. Stepping back from the first track ends the
    /// playlist unless repeat-all wraps it to the first track.
    pub async fn previous_track(&self, autoplay: bool) -> Result<bool> {
        let current = self.current_index();
        self.load_position(Self::offset(current, -1), autoplay).await
    }

    /// Load a uniformly random track other than the current one.
    ///
    /// With one track (or none) this behaves like `load_track(0)`.
    pub async fn random_track(&self, autoplay: bool) -> Result<bool> {
        let index = {
            let inner = self.inner.lock();
            let len = inner.tracks.len();
            if len <= 1 {
                0
            } else {
                let mut rng = thread_rng();
                match inner.current_index {
                    Some(current) if current < len => {
                        let pick = rng.gen_range(0..len - 1);
                        if pick >= current {
                            pick + 1
                        } else {
                            pick
                        }
                    }
                    _ => rng.gen_range(0..len),
                }
            }
        };

        self.load_track(index, autoplay).await
    }

    fn offset(current: Option<usize>, delta: isize) -> isize {
        current
            .and_then(|index| isize::try_from(index).ok())
            .unwrap_or(-1)
            .saturating_add(delta)
    }

    // ========================================================================
    // Modes
    // ========================================================================

    /// Cycle Off → One → All → Off.
    pub fn toggle_repeat_mode(&self) -> RepeatMode {
        let mode = self.inner.lock().repeat.next();
        self.set_repeat_mode(mode);
        mode
    }

    pub fn set_repeat_mode(&self, mode: RepeatMode) {
        self.inner.lock().repeat = mode;
        debug!(%mode, "Repeat mode set");
        self.bus.emit(&PlayerEvent::RepeatModeChanged { mode });
    }

    pub fn toggle_random_mode(&self) -> bool {
        let enabled = !self.inner.lock().random;
        self.set_random_mode(enabled);
        enabled
    }

    pub fn set_random_mode(&self, enabled: bool) {
        self.inner.lock().random = enabled;
        debug!(enabled, "Random mode set");
        self.bus.emit(&PlayerEvent::RandomModeChanged { enabled });
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Insert `track` at `position` (appended when `None` or past the end).
    /// Returns the index it was inserted at.
    ///
    /// Indices shift, so a load still in flight is abandoned.
    pub fn add_track(&self, track: Track, position: Option<usize>) -> usize {
        let index = {
            let mut inner = self.inner.lock();
            let len = inner.tracks.len();
            let index = position.map_or(len, |position| position.min(len));
            inner.tracks.insert(index, track.clone());
            if let Some(current) = inner.current_index {
                if index <= current {
                    inner.current_index = Some(current + 1);
                }
            }
            inner.attempted.clear();
            self.generation.advance();
            index
        };

        self.bus.emit(&PlayerEvent::TrackAdded { track, index });
        index
    }

    /// Remove the track at `index`.
    ///
    /// Removing an entry before the current one keeps the current track
    /// selected. Removing the current entry loads the nearest remaining one,
    /// playing it if the transport was playing. A load still in flight is
    /// abandoned.
    pub async fn remove_track(&self, index: usize) -> Result<Track> {
        let (removed, reload) = {
            let mut inner = self.inner.lock();
            let len = inner.tracks.len();
            if index >= len {
                return Err(PlaybackError::OutOfRange { index, len });
            }

            let removed = inner.tracks.remove(index);
            let remaining = inner.tracks.len();
            let mut reload = None;
            match inner.current_index {
                Some(current) if current == index => {
                    inner.current_index = None;
                    if remaining > 0 {
                        reload = Some(index.min(remaining - 1));
                    }
                }
                Some(current) if index < current => inner.current_index = Some(current - 1),
                _ => {}
            }
            inner.attempted.clear();
            self.generation.advance();
            (removed, reload)
        };

        self.bus.emit(&PlayerEvent::TrackRemoved {
            track: removed.clone(),
            index,
        });

        if let Some(target) = reload {
            let autoplay = !self.sources.transport_paused();
            debug!(removed = index, reload = target, "Current track removed, reloading");
            self.load_track(target, autoplay).await?;
        }

        Ok(removed)
    }

    /// Replace the whole list. Nothing is loaded; pending loads are abandoned.
    pub fn set_tracks(&self, tracks: Vec<Track>) {
        let count = tracks.len();
        {
            let mut inner = self.inner.lock();
            inner.tracks = tracks;
            inner.current_index = None;
            inner.attempted.clear();
            self.generation.advance();
        }

        info!(count, "Playlist replaced");
        self.bus.emit(&PlayerEvent::TracksChanged { count });
    }

    /// Mark only the handle at the current index as current.
    pub fn update_playlist_ui(&self, handles: &[Arc<dyn PlaylistItemHandle>]) {
        let current = self.current_index();
        for (index, handle) in handles.iter().enumerate() {
            handle.set_current(current == Some(index));
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn current_index(&self) -> Option<usize> {
        self.inner.lock().current_index
    }

    pub fn current_track(&self) -> Option<Track> {
        let inner = self.inner.lock();
        inner.current_index.and_then(|index| inner.tracks.get(index).cloned())
    }

    pub fn tracks(&self) -> Vec<Track> {
        self.inner.lock().tracks.clone()
    }

    pub fn track(&self, index: usize) -> Option<Track> {
        self.inner.lock().tracks.get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().tracks.is_empty()
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.inner.lock().repeat
    }

    pub fn is_random(&self) -> bool {
        self.inner.lock().random
    }

    pub fn sources(&self) -> &Arc<MediaSourceManager> {
        &self.sources
    }
}

impl fmt::Debug for PlaylistManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("PlaylistManager")
            .field("tracks", &inner.tracks.len())
            .field("current_index", &inner.current_index)
            .field("repeat", &inner.repeat)
            .field("random", &inner.random)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inner(len: usize) -> PlaylistInner {
        PlaylistInner {
            tracks: (0..len).map(|i| Track::new(format!("{i}.mp3"))).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn cascade_steps_forward_then_stops_at_end() {
        let mut state = inner(3);
        state.attempted.insert(1);
        assert_eq!(state.cascade_step(1), Some(2));

        state.attempted.insert(2);
        assert_eq!(state.cascade_step(2), None);
    }

    #[test]
    fn cascade_wraps_under_repeat_all_but_never_revisits() {
        let mut state = inner(3);
        state.repeat = RepeatMode::All;
        state.attempted.extend([1, 2]);
        assert_eq!(state.cascade_step(2), Some(0));

        state.attempted.insert(0);
        assert_eq!(state.cascade_step(2), None);
    }

    #[test]
    fn random_cascade_only_picks_untried_entries() {
        let mut state = inner(4);
        state.random = true;
        state.attempted.extend([0, 1, 3]);
        for _ in 0..20 {
            assert_eq!(state.cascade_step(0), Some(2));
        }

        state.attempted.insert(2);
        assert_eq!(state.cascade_step(0), None);
    }

    #[test]
    fn offset_from_no_selection() {
        assert_eq!(PlaylistManager::offset(None, 1), 0);
        assert_eq!(PlaylistManager::offset(None, -1), -2);
        assert_eq!(PlaylistManager::offset(Some(0), -1), -1);
        assert_eq!(PlaylistManager::offset(Some(4), 1), 5);
    }
}
