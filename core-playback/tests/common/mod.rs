//! Shared fakes for the integration tests.
//!
//! `FakeSink` behaves like a media element: `load()` resets the rate and the
//! clock, `play()` can be made to reject. `FakeProber` answers per URL: ok,
//! fail, hang forever, or succeed after a delay.

#![allow(dead_code)]

use bridge_traits::media::{
    MediaErrorCode, PlayCapability, ProbeFailure, SourceCandidate, SourceProber, TimeRange,
    TransportSink,
};
use bridge_traits::ui::{
    BarHandle, DownloadLink, MetadataView, NowPlaying, PlaylistItemHandle, RateDisplay,
    TextHandle, ValueHandle,
};
use bridge_traits::BridgeError;
use core_playback::{
    AudioPlayer, PlayerConfig, PlayerEvent, PlayerEventKind, Track, UiHandles,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Transport
// ============================================================================

#[derive(Debug, Clone)]
pub struct SinkState {
    pub paused: bool,
    pub current_time: f64,
    pub duration: f64,
    pub volume: f64,
    pub muted: bool,
    pub playback_rate: f64,
    pub buffered: Vec<TimeRange>,
    pub attached: Vec<SourceCandidate>,
    pub loads: u32,
    pub plays: u32,
    pub volume_writes: u32,
    pub reject_play: bool,
}

impl Default for SinkState {
    fn default() -> Self {
        Self {
            paused: true,
            current_time: 0.0,
            duration: f64::NAN,
            volume: 1.0,
            muted: false,
            playback_rate: 1.0,
            buffered: Vec::new(),
            attached: Vec::new(),
            loads: 0,
            plays: 0,
            volume_writes: 0,
            reject_play: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeSink {
    pub state: Mutex<SinkState>,
}

impl FakeSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn snapshot(&self) -> SinkState {
        self.state.lock().clone()
    }

    pub fn attached_urls(&self) -> Vec<String> {
        self.state
            .lock()
            .attached
            .iter()
            .map(|candidate| candidate.url.clone())
            .collect()
    }

    pub fn set_duration(&self, duration: f64) {
        self.state.lock().duration = duration;
    }

    pub fn set_time(&self, seconds: f64) {
        self.state.lock().current_time = seconds;
    }

    pub fn set_buffered(&self, ranges: Vec<TimeRange>) {
        self.state.lock().buffered = ranges;
    }

    pub fn reject_play(&self, reject: bool) {
        self.state.lock().reject_play = reject;
    }

    /// Change the volume the way a host would (no write counted).
    pub fn host_volume(&self, volume: f64, muted: bool) {
        let mut state = self.state.lock();
        state.volume = volume;
        state.muted = muted;
    }

    pub fn host_rate(&self, rate: f64) {
        self.state.lock().playback_rate = rate;
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl TransportSink for FakeSink {
    async fn play(&self) -> bridge_traits::error::Result<()> {
        let mut state = self.state.lock();
        if state.reject_play {
            return Err(BridgeError::PlayRejected("autoplay blocked".to_string()));
        }
        state.paused = false;
        state.plays += 1;
        Ok(())
    }

    fn pause(&self) {
        self.state.lock().paused = true;
    }

    fn paused(&self) -> bool {
        self.state.lock().paused
    }

    fn current_time(&self) -> f64 {
        self.state.lock().current_time
    }

    fn set_current_time(&self, seconds: f64) {
        self.state.lock().current_time = seconds;
    }

    fn duration(&self) -> f64 {
        self.state.lock().duration
    }

    fn volume(&self) -> f64 {
        self.state.lock().volume
    }

    fn set_volume(&self, volume: f64) {
        let mut state = self.state.lock();
        state.volume = volume;
        state.volume_writes += 1;
    }

    fn muted(&self) -> bool {
        self.state.lock().muted
    }

    fn set_muted(&self, muted: bool) {
        self.state.lock().muted = muted;
    }

    fn playback_rate(&self) -> f64 {
        self.state.lock().playback_rate
    }

    fn set_playback_rate(&self, rate: f64) {
        self.state.lock().playback_rate = rate;
    }

    fn buffered(&self) -> Vec<TimeRange> {
        self.state.lock().buffered.clone()
    }

    fn remove_sources(&self) {
        self.state.lock().attached.clear();
    }

    fn attach_sources(&self, sources: &[SourceCandidate]) {
        self.state.lock().attached.extend_from_slice(sources);
    }

    fn load(&self) {
        let mut state = self.state.lock();
        state.loads += 1;
        state.current_time = 0.0;
        state.playback_rate = 1.0;
    }
}

// ============================================================================
// Prober
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum ProbeBehaviour {
    Fail,
    Hang,
    Delay(Duration),
}

#[derive(Debug, Default)]
pub struct FakeProber {
    behaviour: Mutex<HashMap<String, ProbeBehaviour>>,
    unsupported: Mutex<HashSet<String>>,
    probed: Mutex<Vec<String>>,
}

impl FakeProber {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(&self, url: &str) {
        self.behaviour.lock().insert(url.to_string(), ProbeBehaviour::Fail);
    }

    pub fn hang(&self, url: &str) {
        self.behaviour.lock().insert(url.to_string(), ProbeBehaviour::Hang);
    }

    pub fn delay(&self, url: &str, delay: Duration) {
        self.behaviour
            .lock()
            .insert(url.to_string(), ProbeBehaviour::Delay(delay));
    }

    pub fn unsupported(&self, mime: &str) {
        self.unsupported.lock().insert(mime.to_string());
    }

    pub fn probed(&self) -> Vec<String> {
        self.probed.lock().clone()
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl SourceProber for FakeProber {
    fn can_play_type(&self, mime_type: &str) -> PlayCapability {
        if self.unsupported.lock().contains(mime_type) {
            PlayCapability::No
        } else {
            PlayCapability::Maybe
        }
    }

    async fn probe(&self, candidate: &SourceCandidate) -> Result<(), ProbeFailure> {
        self.probed.lock().push(candidate.url.clone());
        let behaviour = self.behaviour.lock().get(&candidate.url).copied();
        match behaviour {
            None => Ok(()),
            Some(ProbeBehaviour::Fail) => Err(ProbeFailure::new(
                Some(MediaErrorCode::Network),
                "connection reset",
            )),
            Some(ProbeBehaviour::Hang) => {
                std::future::pending::<()>().await;
                Ok(())
            }
            Some(ProbeBehaviour::Delay(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }
}

// ============================================================================
// Widget handles
// ============================================================================

#[derive(Debug, Default)]
pub struct RecordingBar {
    pub values: Mutex<Vec<f64>>,
    pub background: Mutex<Option<String>>,
}

impl RecordingBar {
    pub fn last(&self) -> Option<f64> {
        self.values.lock().last().copied()
    }
}

impl ValueHandle for RecordingBar {
    fn set_value(&self, value: f64) {
        self.values.lock().push(value);
    }

    fn value(&self) -> f64 {
        self.last().unwrap_or(0.0)
    }
}

impl BarHandle for RecordingBar {
    fn set_background(&self, image: Option<&str>) {
        *self.background.lock() = image.map(str::to_string);
    }
}

#[derive(Debug, Default)]
pub struct RecordingText {
    pub text: Mutex<String>,
}

impl TextHandle for RecordingText {
    fn set_text(&self, text: &str) {
        *self.text.lock() = text.to_string();
    }
}

#[derive(Debug, Default)]
pub struct RecordingLink {
    pub href: Mutex<Option<String>>,
    pub download: Mutex<Option<String>>,
    pub visible: Mutex<Option<bool>>,
}

impl DownloadLink for RecordingLink {
    fn set_href(&self, href: &str) {
        *self.href.lock() = Some(href.to_string());
    }

    fn set_download(&self, file_name: &str) {
        *self.download.lock() = Some(file_name.to_string());
    }

    fn set_visible(&self, visible: bool) {
        *self.visible.lock() = Some(visible);
    }
}

#[derive(Debug, Default)]
pub struct RecordingItem {
    pub current: Mutex<bool>,
}

impl PlaylistItemHandle for RecordingItem {
    fn set_current(&self, current: bool) {
        *self.current.lock() = current;
    }

    fn is_current(&self) -> bool {
        *self.current.lock()
    }
}

#[derive(Debug, Default)]
pub struct RecordingRate {
    pub rates: Mutex<Vec<f64>>,
}

impl RateDisplay for RecordingRate {
    fn update(&self, rate: f64) {
        self.rates.lock().push(rate);
    }
}

#[derive(Debug, Default)]
pub struct RecordingMetadata {
    pub title: Mutex<Option<String>>,
    pub artist: Mutex<Option<String>>,
}

impl MetadataView for RecordingMetadata {
    fn show(&self, now_playing: NowPlaying<'_>) {
        *self.title.lock() = now_playing.title.map(str::to_string);
        *self.artist.lock() = now_playing.artist.map(str::to_string);
    }
}

// ============================================================================
// Event log
// ============================================================================

pub const ALL_KINDS: [PlayerEventKind; 14] = [
    PlayerEventKind::StateChange,
    PlayerEventKind::Play,
    PlayerEventKind::Pause,
    PlayerEventKind::TrackLoaded,
    PlayerEventKind::SourceLoaded,
    PlayerEventKind::SourceError,
    PlayerEventKind::TrackLoadError,
    PlayerEventKind::PlaylistError,
    PlayerEventKind::PlaylistEnd,
    PlayerEventKind::RepeatModeChanged,
    PlayerEventKind::RandomModeChanged,
    PlayerEventKind::TracksChanged,
    PlayerEventKind::TrackAdded,
    PlayerEventKind::TrackRemoved,
];

#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<PlayerEvent>>>,
}

impl EventLog {
    pub fn attach(player: &AudioPlayer) -> Self {
        let log = Self::default();
        for kind in ALL_KINDS {
            let events = log.events.clone();
            player.events().on(
                kind,
                Arc::new(move |event: &PlayerEvent| events.lock().push(event.clone())),
            );
        }
        log
    }

    pub fn all(&self) -> Vec<PlayerEvent> {
        self.events.lock().clone()
    }

    pub fn of_kind(&self, kind: PlayerEventKind) -> Vec<PlayerEvent> {
        use core_runtime::events::BusEvent;
        self.events
            .lock()
            .iter()
            .filter(|event| event.kind() == kind)
            .cloned()
            .collect()
    }

    pub fn count(&self, kind: PlayerEventKind) -> usize {
        self.of_kind(kind).len()
    }

    /// Indices of `TrackLoaded` / `TrackLoadError` events, in order, tagged
    /// `true` for loaded.
    pub fn track_outcomes(&self) -> Vec<(usize, bool)> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                PlayerEvent::TrackLoaded { index, .. } => Some((*index, true)),
                PlayerEvent::TrackLoadError { index, .. } => Some((*index, false)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

// ============================================================================
// Harness
// ============================================================================

pub fn track_url(name: &str) -> String {
    format!("https://cdn.example/audio/{name}.mp3")
}

pub fn track(name: &str) -> Track {
    Track::new(track_url(name)).with_title(name)
}

pub fn tracks(names: &[&str]) -> Vec<Track> {
    names.iter().map(|name| track(name)).collect()
}

pub struct Harness {
    pub player: AudioPlayer,
    pub sink: Arc<FakeSink>,
    pub prober: Arc<FakeProber>,
    pub log: EventLog,
}

pub fn harness(tracks: Vec<Track>) -> Harness {
    harness_with(PlayerConfig::default(), tracks, UiHandles::default())
}

pub fn harness_with(config: PlayerConfig, tracks: Vec<Track>, handles: UiHandles) -> Harness {
    let sink = FakeSink::new();
    let prober = FakeProber::new();
    let player = AudioPlayer::builder(config)
        .sink(sink.clone())
        .prober(prober.clone())
        .handles(handles)
        .tracks(tracks)
        .build()
        .expect("player builds");
    let log = EventLog::attach(&player);

    Harness {
        player,
        sink,
        prober,
        log,
    }
}
