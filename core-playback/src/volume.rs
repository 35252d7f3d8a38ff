//! Volume and mute coupling.
//!
//! The transport keeps volume and mute as independent properties. The player
//! presents them as one control: muting zeroes the sound bar but keeps the
//! stored volume, raising the volume while muted unmutes, and unmuting a
//! silent transport restores full volume.

use crate::state::{StateHandler, StatePatch};
use bridge_traits::media::TransportSink;
use bridge_traits::ui::ValueHandle;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

pub struct VolumeController {
    sink: Arc<dyn TransportSink>,
    state: Arc<StateHandler>,
    sound_bar: Option<Arc<dyn ValueHandle>>,
}

impl VolumeController {
    pub fn new(
        sink: Arc<dyn TransportSink>,
        state: Arc<StateHandler>,
        sound_bar: Option<Arc<dyn ValueHandle>>,
    ) -> Self {
        Self {
            sink,
            state,
            sound_bar,
        }
    }

    pub fn volume(&self) -> f64 {
        self.sink.volume()
    }

    /// Clamp to `[0, 1]` and apply.
    ///
    /// The sound bar always shows the clamped value; the transport is only
    /// written when the value actually changes. A non-zero volume unmutes a
    /// muted transport.
    pub fn set_volume(&self, volume: f64) {
        let volume = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };

        self.set_sound_bar(volume);
        if self.sink.volume() != volume {
            self.sink.set_volume(volume);
        }

        if self.sink.muted() && volume > 0.0 {
            debug!(volume, "Volume raised while muted, unmuting");
            self.unmute();
            return;
        }

        self.state.set_state(StatePatch::new().volume(volume));
    }

    /// Silence output without forgetting the volume.
    pub fn mute(&self) {
        self.state
            .set_state(StatePatch::new().muted(true).volume(self.sink.volume()));
        self.sink.set_muted(true);
        self.set_sound_bar(0.0);
    }

    /// Restore output. A transport at volume zero comes back at full volume.
    pub fn unmute(&self) {
        self.sink.set_muted(false);
        if self.sink.volume() == 0.0 {
            self.sink.set_volume(1.0);
        }

        let volume = self.sink.volume();
        self.state
            .set_state(StatePatch::new().muted(false).volume(volume));
        self.set_sound_bar(volume);
    }

    /// `Some(true)` unmutes, `Some(false)` mutes, `None` flips the current
    /// [`is_muted`](Self::is_muted) state.
    pub fn toggle_mute(&self, unmuted: Option<bool>) {
        let unmute = unmuted.unwrap_or_else(|| self.is_muted());
        if unmute {
            self.unmute();
        } else {
            self.mute();
        }
    }

    /// Muted when the transport's flag is set or its volume is exactly zero.
    pub fn is_muted(&self) -> bool {
        self.sink.muted() || self.sink.volume() == 0.0
    }

    /// Apply the configured starting volume, then mute if asked to.
    pub fn set_initial_volume(&self, volume: f64, muted: bool) {
        self.set_volume(volume);
        if muted {
            self.mute();
        }
    }

    fn set_sound_bar(&self, value: f64) {
        if let Some(bar) = &self.sound_bar {
            bar.set_value(value);
        }
    }
}

impl fmt::Debug for VolumeController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VolumeController")
            .field("volume", &self.sink.volume())
            .field("muted", &self.sink.muted())
            .field("has_sound_bar", &self.sound_bar.is_some())
            .finish()
    }
}
