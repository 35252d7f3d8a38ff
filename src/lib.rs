//! Workspace placeholder crate.
//!
//! Re-exports the player crates behind the default `player` feature so a host
//! can depend on `waveplayer` alone instead of wiring `bridge-traits`,
//! `core-runtime` and `core-playback` individually.

#[cfg(feature = "player")]
pub use bridge_traits;
#[cfg(feature = "player")]
pub use core_playback;
#[cfg(feature = "player")]
pub use core_runtime;

#[cfg(feature = "player")]
pub use core_playback::{AudioPlayer, PlayerConfig, PlayerEvent, Track};
