//! Widget handles the core writes to, and time formatting for the labels.

use bridge_traits::ui::{
    BarHandle, DownloadLink, MetadataView, PlaylistItemHandle, RateDisplay, TextHandle,
    ValueHandle,
};
use std::fmt;
use std::sync::Arc;

/// Optional widget handles. A missing handle just receives no updates.
#[derive(Clone, Default)]
pub struct UiHandles {
    pub sound_bar: Option<Arc<dyn ValueHandle>>,
    pub time_bar: Option<Arc<dyn BarHandle>>,
    pub buffer_bar: Option<Arc<dyn BarHandle>>,
    pub current_time: Option<Arc<dyn TextHandle>>,
    pub total_time: Option<Arc<dyn TextHandle>>,
    pub download_link: Option<Arc<dyn DownloadLink>>,
    pub rate_display: Option<Arc<dyn RateDisplay>>,
    pub metadata: Option<Arc<dyn MetadataView>>,
    /// One handle per playlist entry, in playlist order.
    pub playlist_items: Vec<Arc<dyn PlaylistItemHandle>>,
}

impl UiHandles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sound_bar(mut self, handle: Arc<dyn ValueHandle>) -> Self {
        self.sound_bar = Some(handle);
        self
    }

    pub fn with_time_bar(mut self, handle: Arc<dyn BarHandle>) -> Self {
        self.time_bar = Some(handle);
        self
    }

    pub fn with_buffer_bar(mut self, handle: Arc<dyn BarHandle>) -> Self {
        self.buffer_bar = Some(handle);
        self
    }

    pub fn with_time_texts(
        mut self,
        current_time: Arc<dyn TextHandle>,
        total_time: Arc<dyn TextHandle>,
    ) -> Self {
        self.current_time = Some(current_time);
        self.total_time = Some(total_time);
        self
    }

    pub fn with_download_link(mut self, handle: Arc<dyn DownloadLink>) -> Self {
        self.download_link = Some(handle);
        self
    }

    pub fn with_rate_display(mut self, handle: Arc<dyn RateDisplay>) -> Self {
        self.rate_display = Some(handle);
        self
    }

    pub fn with_metadata(mut self, handle: Arc<dyn MetadataView>) -> Self {
        self.metadata = Some(handle);
        self
    }

    pub fn with_playlist_items(mut self, items: Vec<Arc<dyn PlaylistItemHandle>>) -> Self {
        self.playlist_items = items;
        self
    }
}

impl fmt::Debug for UiHandles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiHandles")
            .field("sound_bar", &self.sound_bar.is_some())
            .field("time_bar", &self.time_bar.is_some())
            .field("buffer_bar", &self.buffer_bar.is_some())
            .field("current_time", &self.current_time.is_some())
            .field("total_time", &self.total_time.is_some())
            .field("download_link", &self.download_link.is_some())
            .field("rate_display", &self.rate_display.is_some())
            .field("metadata", &self.metadata.is_some())
            .field("playlist_items", &self.playlist_items.len())
            .finish()
    }
}

/// Format seconds as `m:ss`, or `h:mm:ss` from one hour up.
///
/// Negative and non-finite inputs render as `0:00`.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}
