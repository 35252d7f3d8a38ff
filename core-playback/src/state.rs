//! # Player State
//!
//! [`StateHandler`] owns the canonical [`PlayerState`]. Every mutation goes
//! through [`StateHandler::set_state`], which merges a [`StatePatch`], publishes
//! the new full state as [`PlayerEvent::StateChange`] and mirrors each field
//! onto the host's [`StateTarget`] as an attribute.
//!
//! No validation happens here; controllers clamp before writing.

use crate::events::{PlayerBus, PlayerEvent, PlayerEventKind};
use crate::types::RepeatMode;
use bridge_traits::ui::StateTarget;
use core_runtime::events::SubscriptionId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::trace;

/// Snapshot of the player's observable state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub playing: bool,
    pub paused: bool,
    pub started: bool,
    pub muted: bool,
    pub random: bool,
    pub controls: bool,
    pub repeat: RepeatMode,
    pub volume: f64,
    pub playback_rate: f64,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            playing: false,
            paused: true,
            started: false,
            muted: false,
            random: false,
            controls: true,
            repeat: RepeatMode::Off,
            volume: 1.0,
            playback_rate: 1.0,
        }
    }
}

/// A partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatePatch {
    pub playing: Option<bool>,
    pub paused: Option<bool>,
    pub started: Option<bool>,
    pub muted: Option<bool>,
    pub random: Option<bool>,
    pub controls: Option<bool>,
    pub repeat: Option<RepeatMode>,
    pub volume: Option<f64>,
    pub playback_rate: Option<f64>,
}

impl StatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn playing(mut self, playing: bool) -> Self {
        self.playing = Some(playing);
        self
    }

    pub fn paused(mut self, paused: bool) -> Self {
        self.paused = Some(paused);
        self
    }

    pub fn started(mut self, started: bool) -> Self {
        self.started = Some(started);
        self
    }

    pub fn muted(mut self, muted: bool) -> Self {
        self.muted = Some(muted);
        self
    }

    pub fn random(mut self, random: bool) -> Self {
        self.random = Some(random);
        self
    }

    pub fn controls(mut self, controls: bool) -> Self {
        self.controls = Some(controls);
        self
    }

    pub fn repeat(mut self, repeat: RepeatMode) -> Self {
        self.repeat = Some(repeat);
        self
    }

    pub fn volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn playback_rate(mut self, rate: f64) -> Self {
        self.playback_rate = Some(rate);
        self
    }

    fn apply_to(&self, state: &mut PlayerState) {
        if let Some(value) = self.playing {
            state.playing = value;
        }
        if let Some(value) = self.paused {
            state.paused = value;
        }
        if let Some(value) = self.started {
            state.started = value;
        }
        if let Some(value) = self.muted {
            state.muted = value;
        }
        if let Some(value) = self.random {
            state.random = value;
        }
        if let Some(value) = self.controls {
            state.controls = value;
        }
        if let Some(value) = self.repeat {
            state.repeat = value;
        }
        if let Some(value) = self.volume {
            state.volume = value;
        }
        if let Some(value) = self.playback_rate {
            state.playback_rate = value;
        }
    }
}

/// Addressable field of [`PlayerState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateField {
    Playing,
    Paused,
    Started,
    Muted,
    Random,
    Controls,
    Repeat,
    Volume,
    PlaybackRate,
}

impl StateField {
    pub const ALL: [StateField; 9] = [
        StateField::Playing,
        StateField::Paused,
        StateField::Started,
        StateField::Muted,
        StateField::Random,
        StateField::Controls,
        StateField::Repeat,
        StateField::Volume,
        StateField::PlaybackRate,
    ];

    /// Attribute name used when reflecting onto a [`StateTarget`].
    pub fn attribute(&self) -> &'static str {
        match self {
            StateField::Playing => "playing",
            StateField::Paused => "paused",
            StateField::Started => "started",
            StateField::Muted => "muted",
            StateField::Random => "random",
            StateField::Controls => "controls",
            StateField::Repeat => "repeat",
            StateField::Volume => "volume",
            StateField::PlaybackRate => "playbackRate",
        }
    }
}

/// Value of a single [`StateField`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateValue {
    Bool(bool),
    Repeat(RepeatMode),
    Number(f64),
}

impl StateValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StateValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StateValue::Number(value) => Some(*value),
            StateValue::Repeat(mode) => Some(f64::from(mode.as_u8())),
            StateValue::Bool(_) => None,
        }
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateValue::Bool(value) => write!(f, "{}", value),
            StateValue::Repeat(mode) => write!(f, "{}", mode),
            StateValue::Number(value) => write!(f, "{}", value),
        }
    }
}

impl PlayerState {
    pub fn get(&self, field: StateField) -> StateValue {
        match field {
            StateField::Playing => StateValue::Bool(self.playing),
            StateField::Paused => StateValue::Bool(self.paused),
            StateField::Started => StateValue::Bool(self.started),
            StateField::Muted => StateValue::Bool(self.muted),
            StateField::Random => StateValue::Bool(self.random),
            StateField::Controls => StateValue::Bool(self.controls),
            StateField::Repeat => StateValue::Repeat(self.repeat),
            StateField::Volume => StateValue::Number(self.volume),
            StateField::PlaybackRate => StateValue::Number(self.playback_rate),
        }
    }
}

/// Handle returned by [`StateHandler::subscribe`].
#[derive(Debug)]
pub struct Subscription {
    bus: Weak<PlayerBus>,
    id: SubscriptionId,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Stop receiving state changes. Returns `false` if already removed or
    /// the bus is gone.
    pub fn unsubscribe(self) -> bool {
        self.bus
            .upgrade()
            .is_some_and(|bus| bus.unsubscribe(self.id))
    }
}

/// Canonical player-state store.
pub struct StateHandler {
    state: Mutex<PlayerState>,
    bus: Arc<PlayerBus>,
    target: Option<Arc<dyn StateTarget>>,
}

impl StateHandler {
    pub fn new(bus: Arc<PlayerBus>, target: Option<Arc<dyn StateTarget>>) -> Self {
        Self::with_state(bus, target, PlayerState::default())
    }

    pub fn with_state(
        bus: Arc<PlayerBus>,
        target: Option<Arc<dyn StateTarget>>,
        initial: PlayerState,
    ) -> Self {
        Self {
            state: Mutex::new(initial),
            bus,
            target,
        }
    }

    /// A copy of the whole state.
    pub fn state(&self) -> PlayerState {
        *self.state.lock()
    }

    /// A single field.
    pub fn get(&self, field: StateField) -> StateValue {
        self.state.lock().get(field)
    }

    /// Merge `patch`, publish the new state, then reflect it onto the target.
    pub fn set_state(&self, patch: StatePatch) -> PlayerState {
        let snapshot = {
            let mut state = self.state.lock();
            patch.apply_to(&mut state);
            *state
        };

        trace!(?patch, "state updated");
        self.bus.emit(&PlayerEvent::StateChange(snapshot));
        self.reflect(&snapshot);
        snapshot
    }

    fn reflect(&self, state: &PlayerState) {
        let Some(target) = &self.target else {
            return;
        };

        for field in StateField::ALL {
            let name = field.attribute();
            match state.get(field) {
                StateValue::Bool(true) => target.set_attribute(name, "true"),
                StateValue::Bool(false) => target.remove_attribute(name),
                value => target.set_attribute(name, &value.to_string()),
            }
        }
    }

    /// Run `callback` with the full state after every change.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&PlayerState) + Send + Sync + 'static,
    {
        let id = self.bus.on(
            PlayerEventKind::StateChange,
            Arc::new(move |event: &PlayerEvent| {
                if let PlayerEvent::StateChange(state) = event {
                    callback(state);
                }
            }),
        );
        Subscription {
            bus: Arc::downgrade(&self.bus),
            id,
        }
    }
}

impl fmt::Debug for StateHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateHandler")
            .field("state", &*self.state.lock())
            .field("has_target", &self.target.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct AttributeTarget {
        attributes: Mutex<BTreeMap<String, String>>,
    }

    impl StateTarget for AttributeTarget {
        fn set_attribute(&self, name: &str, value: &str) {
            self.attributes.lock().insert(name.to_string(), value.to_string());
        }

        fn remove_attribute(&self, name: &str) {
            self.attributes.lock().remove(name);
        }
    }

    #[test]
    fn defaults_match_initial_widget_state() {
        let state = PlayerState::default();
        assert!(state.paused && !state.playing && state.controls);
        assert_eq!(state.repeat, RepeatMode::Off);
        assert_eq!(state.volume, 1.0);
    }

    #[test]
    fn state_returns_a_copy() {
        let handler = StateHandler::new(Arc::new(PlayerBus::new()), None);
        let mut copy = handler.state();
        copy.muted = true;
        assert_eq!(handler.get(StateField::Muted), StateValue::Bool(false));
    }

    #[test]
    fn set_state_merges_and_emits_full_state() {
        let bus = Arc::new(PlayerBus::new());
        let handler = StateHandler::new(bus.clone(), None);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        handler.subscribe(move |state| sink.lock().push(*state));

        handler.set_state(StatePatch::new().playing(true).paused(false));
        handler.set_state(StatePatch::new().volume(0.25));

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(seen[1].playing);
        assert_eq!(seen[1].volume, 0.25);
    }

    #[test]
    fn state_is_reflected_onto_target() {
        let target = Arc::new(AttributeTarget::default());
        let handler = StateHandler::new(Arc::new(PlayerBus::new()), Some(target.clone()));

        handler.set_state(
            StatePatch::new()
                .muted(true)
                .repeat(RepeatMode::All)
                .playback_rate(1.5)
                .volume(0.4),
        );

        let attributes = target.attributes.lock();
        assert_eq!(attributes.get("muted").map(String::as_str), Some("true"));
        assert_eq!(attributes.get("repeat").map(String::as_str), Some("2"));
        assert_eq!(attributes.get("playbackRate").map(String::as_str), Some("1.5"));
        assert_eq!(attributes.get("volume").map(String::as_str), Some("0.4"));
        assert!(!attributes.contains_key("playing"));
        assert_eq!(attributes.get("controls").map(String::as_str), Some("true"));
    }

    #[test]
    fn unsubscribe_stops_callbacks() {
        let handler = StateHandler::new(Arc::new(PlayerBus::new()), None);
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        let subscription = handler.subscribe(move |_| *counter.lock() += 1);

        handler.set_state(StatePatch::new().random(true));
        assert!(subscription.unsubscribe());
        handler.set_state(StatePatch::new().random(false));

        assert_eq!(*calls.lock(), 1);
    }
}
