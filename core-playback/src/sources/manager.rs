use super::mime::{file_name_from_url, normalize_sources};
use super::LoadTicket;
use crate::error::{PlaybackError, Result, SourceError, SourceErrorType};
use crate::events::{PlayerBus, PlayerEvent};
use crate::types::Track;
use bridge_traits::media::{SourceCandidate, SourceProber, TransportSink};
use bridge_traits::ui::DownloadLink;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Outcome of [`MediaSourceManager::load_track_sources`].
#[derive(Debug, Clone, PartialEq)]
pub enum SourceLoad {
    /// The track is attached to the transport; carries the candidate that
    /// passed probing.
    Loaded(SourceCandidate),
    /// No candidate was playable.
    Failed(SourceError),
    /// A newer load started while this one was probing.
    Superseded,
}

impl SourceLoad {
    pub fn is_loaded(&self) -> bool {
        matches!(self, SourceLoad::Loaded(_))
    }

    /// The winning candidate, or the reason there is none.
    pub fn into_result(self) -> Result<SourceCandidate> {
        match self {
            SourceLoad::Loaded(candidate) => Ok(candidate),
            SourceLoad::Failed(error) => Err(PlaybackError::SourceUnavailable(error)),
            SourceLoad::Superseded => Err(PlaybackError::Superseded),
        }
    }
}

/// Resolves a track's sources and attaches them to the transport.
pub struct MediaSourceManager {
    sink: Arc<dyn TransportSink>,
    prober: Arc<dyn SourceProber>,
    bus: Arc<PlayerBus>,
    probe_timeout: Duration,
    failures: AtomicU32,
}

impl MediaSourceManager {
    pub fn new(
        sink: Arc<dyn TransportSink>,
        prober: Arc<dyn SourceProber>,
        bus: Arc<PlayerBus>,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            sink,
            prober,
            bus,
            probe_timeout,
            failures: AtomicU32::new(0),
        }
    }

    /// Resolve `track` to a playable candidate and attach it.
    ///
    /// Candidates the host reports as definitely unsupported are skipped,
    /// the rest are probed one at a time in declaration order. On success
    /// every normalized candidate is attached so the host can still choose
    /// among them. A rejected `play()` is logged and does not fail the load.
    #[instrument(skip(self, track, ticket), fields(track = %track.label(), generation = ticket.generation()))]
    pub async fn load_track_sources(
        &self,
        track: &Track,
        autoplay: bool,
        ticket: &LoadTicket,
    ) -> SourceLoad {
        let candidates = normalize_sources(track);
        if candidates.is_empty() {
            return self.fail(
                track,
                SourceError::new(SourceErrorType::Unavailable, "track declares no sources"),
            );
        }

        let supported: Vec<&SourceCandidate> = candidates
            .iter()
            .filter(|candidate| self.is_supported(candidate))
            .collect();
        if supported.is_empty() {
            return self.fail(
                track,
                SourceError::new(
                    SourceErrorType::Format,
                    "no declared source type is supported by the host",
                ),
            );
        }

        let mut winner = None;
        let mut last_error = None;
        for candidate in supported {
            if !ticket.is_current() {
                break;
            }
            match self.probe(candidate).await {
                Ok(()) => {
                    debug!(url = %candidate.url, "candidate playable");
                    winner = Some(candidate.clone());
                    break;
                }
                Err(error) => {
                    warn!(url = %candidate.url, kind = %error.kind, "candidate rejected: {}", error.message);
                    last_error = Some(error);
                }
            }
        }

        if !ticket.is_current() {
            debug!("load superseded, discarding result");
            return SourceLoad::Superseded;
        }

        let Some(winner) = winner else {
            let error = last_error.unwrap_or_else(|| {
                SourceError::new(SourceErrorType::Unknown, "no candidate could be probed")
            });
            return self.fail(track, error);
        };

        self.attach(&candidates);
        if autoplay {
            if let Err(e) = self.sink.play().await {
                warn!("Playback did not start after load: {}", e);
            }
        }

        info!(url = %winner.url, "Track sources loaded");
        self.bus.emit(&PlayerEvent::SourceLoaded {
            track: track.clone(),
        });
        SourceLoad::Loaded(winner)
    }

    /// Point `link` at the track's first source, or hide it when the track
    /// may not be downloaded.
    pub fn update_download_button(&self, track: &Track, link: &dyn DownloadLink) {
        let first = normalize_sources(track).into_iter().next();
        match first {
            Some(candidate) if track.allow_download && !track.live => {
                link.set_href(&candidate.url);
                link.set_download(file_name_from_url(&candidate.url));
                link.set_visible(true);
            }
            _ => link.set_visible(false),
        }
    }

    /// Clear the failure counter. Called before every externally triggered load.
    pub fn reset_source_errors(&self) {
        self.failures.store(0, Ordering::SeqCst);
    }

    /// Failed track loads since the last reset.
    pub fn failure_count(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }

    pub fn transport_paused(&self) -> bool {
        self.sink.paused()
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    fn is_supported(&self, candidate: &SourceCandidate) -> bool {
        match candidate.mime_type.as_deref() {
            Some(mime) if !mime.is_empty() => {
                let supported = self.prober.can_play_type(mime).is_possible();
                if !supported {
                    debug!(url = %candidate.url, mime, "type not supported, skipping");
                }
                supported
            }
            _ => true,
        }
    }

    async fn probe(&self, candidate: &SourceCandidate) -> std::result::Result<(), SourceError> {
        match tokio::time::timeout(self.probe_timeout, self.prober.probe(candidate)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(failure)) => Err(SourceError::from_probe(&failure, &candidate.url)),
            Err(_) => {
                let timeout_ms = u64::try_from(self.probe_timeout.as_millis()).unwrap_or(u64::MAX);
                Err(SourceError::timed_out(&candidate.url, timeout_ms))
            }
        }
    }

    fn attach(&self, candidates: &[SourceCandidate]) {
        self.sink.remove_sources();
        self.sink.attach_sources(candidates);

        // load() resets the rate
        let rate = self.sink.playback_rate();
        self.sink.load();
        self.sink.set_playback_rate(rate);
    }

    fn fail(&self, track: &Track, error: SourceError) -> SourceLoad {
        let attempt_count = self.failures.fetch_add(1, Ordering::SeqCst) + 1;
        warn!(attempt = attempt_count, "No playable source: {}", error);
        self.bus.emit(&PlayerEvent::SourceError {
            track: track.clone(),
            error: error.clone(),
            attempt_count,
        });
        SourceLoad::Failed(error)
    }
}

impl fmt::Debug for MediaSourceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaSourceManager")
            .field("probe_timeout", &self.probe_timeout)
            .field("failures", &self.failure_count())
            .finish()
    }
}
