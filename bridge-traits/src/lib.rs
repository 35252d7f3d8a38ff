//! # Host Bridge Traits
//!
//! Capability traits the embedding host implements so the playback core can
//! drive a real media element and a real widget without knowing either.
//!
//! ## Traits
//!
//! ### Media
//! - [`TransportSink`](media::TransportSink) - the element that plays audio
//! - [`SourceProber`](media::SourceProber) - `canPlayType` plus scratch-element probing
//!
//! ### Widget handles
//! - [`ValueHandle`](ui::ValueHandle) / [`BarHandle`](ui::BarHandle) - sound bar, time bar, buffer bar
//! - [`TextHandle`](ui::TextHandle) - time labels
//! - [`DownloadLink`](ui::DownloadLink), [`PlaylistItemHandle`](ui::PlaylistItemHandle),
//!   [`RateDisplay`](ui::RateDisplay), [`MetadataView`](ui::MetadataView)
//! - [`StateTarget`](ui::StateTarget) - element that mirrors player state as attributes
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - forward structured logs to the host console
//!
//! ## Fail-Fast Strategy
//!
//! The core refuses to build a player when a required capability (transport
//! sink, source prober) is missing and reports which one. Widget handles are
//! optional: a missing handle simply receives no updates.
//!
//! ## Thread Safety
//!
//! On native targets every trait requires `Send + Sync` via
//! [`PlatformSendSync`](platform::PlatformSendSync). On `wasm32` the bound is
//! dropped because browser objects are single-threaded.

pub mod error;
pub mod logging;
pub mod media;
pub mod platform;
pub mod ui;

pub use error::BridgeError;

// Re-export commonly used types
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use media::{
    MediaErrorCode, PlayCapability, ProbeFailure, SourceCandidate, SourceProber, TimeRange,
    TransportEvent, TransportSink,
};
pub use ui::{
    BarHandle, DownloadLink, MetadataView, NowPlaying, PlaylistItemHandle, RateDisplay,
    StateTarget, TextHandle, ValueHandle,
};
