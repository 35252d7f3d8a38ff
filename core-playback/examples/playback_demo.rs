//! # Playlist Playback Example
//!
//! Drives an [`AudioPlayer`] against an in-memory transport: the second track
//! is unreachable, so loading it cascades to the third. Transport events are
//! fed through the event loop the way a host adapter would.
//!
//! Run with: `cargo run --example playback_demo --package core-playback`

use bridge_traits::logging::LogLevel;
use bridge_traits::media::{
    MediaErrorCode, PlayCapability, ProbeFailure, SourceCandidate, SourceProber, TimeRange,
    TransportEvent, TransportSink,
};
use core_playback::{AudioPlayer, PlayerConfig, PlayerEvent, RepeatMode, Track};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// In-memory transport
// ============================================================================

#[derive(Debug)]
struct MemoryElement {
    paused: bool,
    time: f64,
    volume: f64,
    muted: bool,
    rate: f64,
    sources: Vec<SourceCandidate>,
}

struct MemorySink {
    element: Mutex<MemoryElement>,
}

impl MemorySink {
    fn new() -> Self {
        Self {
            element: Mutex::new(MemoryElement {
                paused: true,
                time: 0.0,
                volume: 1.0,
                muted: false,
                rate: 1.0,
                sources: Vec::new(),
            }),
        }
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl TransportSink for MemorySink {
    async fn play(&self) -> bridge_traits::error::Result<()> {
        self.element.lock().paused = false;
        Ok(())
    }

    fn pause(&self) {
        self.element.lock().paused = true;
    }

    fn paused(&self) -> bool {
        self.element.lock().paused
    }

    fn current_time(&self) -> f64 {
        self.element.lock().time
    }

    fn set_current_time(&self, seconds: f64) {
        self.element.lock().time = seconds;
    }

    fn duration(&self) -> f64 {
        // every demo track is three minutes long
        180.0
    }

    fn volume(&self) -> f64 {
        self.element.lock().volume
    }

    fn set_volume(&self, volume: f64) {
        self.element.lock().volume = volume;
    }

    fn muted(&self) -> bool {
        self.element.lock().muted
    }

    fn set_muted(&self, muted: bool) {
        self.element.lock().muted = muted;
    }

    fn playback_rate(&self) -> f64 {
        self.element.lock().rate
    }

    fn set_playback_rate(&self, rate: f64) {
        self.element.lock().rate = rate;
    }

    fn buffered(&self) -> Vec<TimeRange> {
        vec![TimeRange::new(0.0, 90.0)]
    }

    fn remove_sources(&self) {
        self.element.lock().sources.clear();
    }

    fn attach_sources(&self, sources: &[SourceCandidate]) {
        self.element.lock().sources.extend_from_slice(sources);
    }

    fn load(&self) {
        let mut element = self.element.lock();
        element.time = 0.0;
        element.rate = 1.0;
        println!("   transport: load {:?}", element.sources.first().map(|s| &s.url));
    }
}

/// Accepts everything except URLs under `/offline/`.
struct DemoProber;

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl SourceProber for DemoProber {
    fn can_play_type(&self, mime_type: &str) -> PlayCapability {
        if mime_type == "audio/flac" {
            PlayCapability::No
        } else {
            PlayCapability::Probably
        }
    }

    async fn probe(&self, candidate: &SourceCandidate) -> Result<(), ProbeFailure> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        if candidate.url.contains("/offline/") {
            Err(ProbeFailure::new(Some(MediaErrorCode::Network), "host unreachable"))
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// Demo
// ============================================================================

#[tokio::main]
async fn main() -> core_playback::Result<()> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Debug),
    )?;

    println!("🎵 Playlist Playback Demo\n");

    let tracks = vec![
        Track::new("https://cdn.example/audio/opening.mp3")
            .with_title("Opening")
            .with_artist("Demo Band"),
        Track::new("https://cdn.example/offline/interlude.mp3").with_title("Interlude"),
        Track::new("https://cdn.example/audio/finale.ogg").with_title("Finale"),
    ];

    let config = PlayerConfig::builder()
        .volume(0.8)
        .repeat(RepeatMode::All)
        .build()?;
    let player = AudioPlayer::builder(config)
        .sink(Arc::new(MemorySink::new()))
        .prober(Arc::new(DemoProber))
        .tracks(tracks)
        .build()?;

    for kind in [
        core_playback::PlayerEventKind::TrackLoaded,
        core_playback::PlayerEventKind::TrackLoadError,
        core_playback::PlayerEventKind::Play,
        core_playback::PlayerEventKind::PlaylistEnd,
    ] {
        player.events().on(
            kind,
            Arc::new(|event: &PlayerEvent| println!("   event: {}", event.description())),
        );
    }

    let (transport, event_loop) = player.spawn_event_loop();

    println!("1. Starting playlist");
    player.start().await?;

    println!("\n2. Playing");
    player.try_play().await?;
    let _ = transport.send(TransportEvent::Play);
    tokio::time::sleep(Duration::from_millis(10)).await;

    println!("\n3. Track ended, next one is offline and gets skipped");
    let _ = transport.send(TransportEvent::Ended);
    tokio::time::sleep(Duration::from_millis(200)).await;
    println!("   current index: {:?}", player.playlist().current_index());

    println!("\n4. Skip ahead and report progress");
    player.playback().forward();
    println!(
        "   {:.0}s / {:.0}s ({:.0}% buffered)",
        player.playback().current_time(),
        player.playback().duration(),
        player.playback().buffer() * 100.0
    );

    println!("\n5. Final state");
    let state = player.state().state();
    println!("   {}", serde_json::to_string_pretty(&state).unwrap_or_default());

    drop(transport);
    let _ = event_loop.await;

    println!("\n✅ Demo complete");
    Ok(())
}
