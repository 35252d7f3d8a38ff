//! # Playback Controller
//!
//! Bounded accessors over the transport. The transport reports raw values
//! (a `NaN` duration before metadata arrives, an infinite one for streams);
//! this wrapper keeps everything it hands out finite and in range.

use crate::error::{PlaybackError, Result};
use bridge_traits::media::TransportSink;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct PlaybackController {
    sink: Arc<dyn TransportSink>,
    skip_duration: f64,
    /// Rate last asked for by the host, re-applied after reloads.
    requested_rate: Mutex<f64>,
}

impl PlaybackController {
    pub fn new(sink: Arc<dyn TransportSink>, skip_duration: f64) -> Self {
        let requested_rate = sink.playback_rate();
        Self {
            sink,
            skip_duration,
            requested_rate: Mutex::new(sanitize_rate(requested_rate).unwrap_or(1.0)),
        }
    }

    pub fn current_time(&self) -> f64 {
        let time = self.sink.current_time();
        if time.is_finite() {
            time
        } else {
            0.0
        }
    }

    /// Seek, clamped to `[0, duration]`.
    pub fn set_current_time(&self, seconds: f64) {
        let target = if seconds.is_nan() { 0.0 } else { seconds };
        self.sink.set_current_time(target.clamp(0.0, self.duration()));
    }

    /// Media duration in seconds; `0` until the transport knows a finite one.
    pub fn duration(&self) -> f64 {
        let duration = self.sink.duration();
        if duration.is_finite() && duration > 0.0 {
            duration
        } else {
            0.0
        }
    }

    /// Played fraction in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.fraction_of_duration(self.current_time())
    }

    /// Buffered fraction in `[0, 1]`, measured at the end of the last range.
    pub fn buffer(&self) -> f64 {
        let end = self.sink.buffered().last().map_or(0.0, |range| range.end);
        self.fraction_of_duration(end)
    }

    fn fraction_of_duration(&self, seconds: f64) -> f64 {
        let duration = self.duration();
        if duration == 0.0 || !seconds.is_finite() {
            return 0.0;
        }
        (seconds / duration).clamp(0.0, 1.0)
    }

    pub fn backward(&self) {
        self.set_current_time(self.current_time() - self.skip_duration);
    }

    pub fn forward(&self) {
        self.set_current_time(self.current_time() + self.skip_duration);
    }

    pub fn skip_duration(&self) -> f64 {
        self.skip_duration
    }

    pub fn is_paused(&self) -> bool {
        self.sink.paused()
    }

    /// Play when `Some(true)`, pause when `Some(false)`, otherwise flip the
    /// transport's paused state. Returns whether playback was requested.
    ///
    /// A rejected play (autoplay blocked) is logged, not returned.
    pub async fn toggle_play(&self, play: Option<bool>) -> bool {
        let play = play.unwrap_or_else(|| self.sink.paused());
        if play {
            self.play().await;
        } else {
            self.sink.pause();
        }
        play
    }

    pub async fn play(&self) {
        if let Err(e) = self.sink.play().await {
            warn!("Play request rejected: {}", e);
        }
    }

    pub fn pause(&self) {
        self.sink.pause();
    }

    pub fn playback_rate(&self) -> f64 {
        self.sink.playback_rate()
    }

    /// Set and remember the playback rate.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::InvalidRate`] for non-finite or non-positive rates.
    pub fn set_playback_rate(&self, rate: f64) -> Result<()> {
        let rate = sanitize_rate(rate).ok_or(PlaybackError::InvalidRate(rate))?;
        *self.requested_rate.lock() = rate;
        self.sink.set_playback_rate(rate);
        debug!(rate, "Playback rate set");
        Ok(())
    }

    /// The rate last requested through [`set_playback_rate`](Self::set_playback_rate)
    /// or adopted from the transport.
    pub fn requested_rate(&self) -> f64 {
        *self.requested_rate.lock()
    }

    /// Take the transport's actual rate as the remembered one. Returns the
    /// adopted rate, or `None` when the transport reports nonsense.
    pub fn adopt_transport_rate(&self) -> Option<f64> {
        let actual = sanitize_rate(self.sink.playback_rate())?;
        let mut requested = self.requested_rate.lock();
        if *requested != actual {
            debug!(requested = *requested, actual, "Transport rate changed externally");
            *requested = actual;
        }
        Some(actual)
    }
}

fn sanitize_rate(rate: f64) -> Option<f64> {
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

impl fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackController")
            .field("skip_duration", &self.skip_duration)
            .field("requested_rate", &*self.requested_rate.lock())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_must_be_positive_and_finite() {
        assert_eq!(sanitize_rate(1.25), Some(1.25));
        assert_eq!(sanitize_rate(0.0), None);
        assert_eq!(sanitize_rate(-1.0), None);
        assert_eq!(sanitize_rate(f64::INFINITY), None);
        assert_eq!(sanitize_rate(f64::NAN), None);
    }
}
