//! UI handle capabilities consumed by the playback core.
//!
//! The widget layer owns the real controls (range sliders, circular progress
//! rings, text spans, links). The core only ever writes a handful of values to
//! them, so each handle kind is modelled as the smallest capability set it
//! needs. A linear range and a circular range both satisfy [`ValueHandle`].

use crate::platform::PlatformSendSync;

/// Anything exposing a numeric `value`.
pub trait ValueHandle: PlatformSendSync {
    fn set_value(&self, value: f64);

    fn value(&self) -> f64;
}

/// A progress or buffer bar. The background can carry a waveform image.
pub trait BarHandle: ValueHandle {
    /// Set or clear the background image URL.
    fn set_background(&self, _image: Option<&str>) {}
}

/// A text display such as the current or total time label.
pub trait TextHandle: PlatformSendSync {
    fn set_text(&self, text: &str);
}

/// The download anchor.
pub trait DownloadLink: PlatformSendSync {
    fn set_href(&self, href: &str);

    fn set_download(&self, file_name: &str);

    fn set_visible(&self, visible: bool);
}

/// One entry of the rendered playlist.
pub trait PlaylistItemHandle: PlatformSendSync {
    fn set_current(&self, current: bool);

    fn is_current(&self) -> bool;
}

/// The playback-rate menu label.
pub trait RateDisplay: PlatformSendSync {
    fn update(&self, rate: f64);
}

/// Metadata shown for the loaded track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NowPlaying<'a> {
    pub title: Option<&'a str>,
    pub artist: Option<&'a str>,
    pub album: Option<&'a str>,
    pub thumbnail: Option<&'a str>,
}

/// Title/artist/album/artwork area.
pub trait MetadataView: PlatformSendSync {
    fn show(&self, now_playing: NowPlaying<'_>);
}

/// Element whose attributes mirror the player state so stylesheets and host
/// scripts can observe it.
pub trait StateTarget: PlatformSendSync {
    fn set_attribute(&self, name: &str, value: &str);

    fn remove_attribute(&self, name: &str);
}
