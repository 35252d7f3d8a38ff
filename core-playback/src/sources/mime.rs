//! Extension-based MIME inference for source URLs.

use crate::types::{SourceDescriptor, Track};
use bridge_traits::media::SourceCandidate;

/// Known audio extensions and their MIME types.
const MIME_TABLE: &[(&str, &str)] = &[
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("oga", "audio/ogg"),
    ("opus", "audio/opus"),
    ("webm", "audio/webm"),
    ("weba", "audio/webm"),
    ("aac", "audio/aac"),
    ("m4a", "audio/mp4"),
    ("mp4", "audio/mp4"),
    ("flac", "audio/flac"),
    ("m3u8", "application/vnd.apple.mpegurl"),
];

/// The path part of `url`, without query string or fragment.
fn strip_query(url: &str) -> &str {
    url.find(|c| c == '?' || c == '#')
        .map_or(url, |end| &url[..end])
}

/// Infer a MIME type from the URL's extension.
///
/// Query strings and fragments are ignored; matching is case-insensitive.
/// Returns `None` for unknown or missing extensions.
pub fn mime_from_url(url: &str) -> Option<&'static str> {
    let path = strip_query(url);
    let file = path.rsplit('/').next().unwrap_or(path);
    let (_, extension) = file.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();

    MIME_TABLE
        .iter()
        .find(|(known, _)| *known == extension)
        .map(|(_, mime)| *mime)
}

/// Last path segment of `url`, used as the suggested download file name.
pub fn file_name_from_url(url: &str) -> &str {
    let path = strip_query(url).trim_end_matches('/');
    path.rsplit('/').next().unwrap_or(path)
}

/// Flatten a track's declared sources into candidates, in declaration order.
///
/// Bare URLs get a MIME type from the extension table; explicit descriptors
/// keep the type they declare. Empty URLs are dropped.
pub fn normalize_sources(track: &Track) -> Vec<SourceCandidate> {
    track
        .source
        .descriptors()
        .iter()
        .filter(|descriptor| !descriptor.url().is_empty())
        .map(|descriptor| match descriptor {
            SourceDescriptor::Url(url) => {
                SourceCandidate::new(url.clone(), mime_from_url(url).map(str::to_string))
            }
            SourceDescriptor::Typed { src, mime_type } => SourceCandidate::new(
                src.clone(),
                mime_type.clone().filter(|mime| !mime.is_empty()),
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions_resolve() {
        assert_eq!(mime_from_url("song.mp3"), Some("audio/mpeg"));
        assert_eq!(mime_from_url("/a/b/track.FLAC"), Some("audio/flac"));
        assert_eq!(mime_from_url("live/index.m3u8"), Some("application/vnd.apple.mpegurl"));
        assert_eq!(mime_from_url("clip.oga"), Some("audio/ogg"));
    }

    #[test]
    fn query_and_fragment_are_ignored() {
        assert_eq!(mime_from_url("https://cdn.example/a.opus?sig=abc.mp3"), Some("audio/opus"));
        assert_eq!(mime_from_url("https://cdn.example/a.m4a#t=10"), Some("audio/mp4"));
    }

    #[test]
    fn unknown_or_missing_extension() {
        assert_eq!(mime_from_url("https://cdn.example/stream"), None);
        assert_eq!(mime_from_url("https://cdn.example.com/stream"), None);
        assert_eq!(mime_from_url("notes.txt"), None);
    }

    #[test]
    fn file_name_is_last_segment() {
        assert_eq!(file_name_from_url("https://cdn.example/music/a.mp3?x=1"), "a.mp3");
        assert_eq!(file_name_from_url("a.mp3"), "a.mp3");
    }

    #[test]
    fn normalization_flattens_in_order() {
        let track = Track::new(vec![
            SourceDescriptor::from("https://cdn.example/a.webm"),
            SourceDescriptor::Typed {
                src: "https://cdn.example/a".into(),
                mime_type: Some("audio/mpeg".into()),
            },
            SourceDescriptor::from(""),
            SourceDescriptor::from("https://cdn.example/raw"),
        ]);

        let candidates = normalize_sources(&track);
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].mime_type.as_deref(), Some("audio/webm"));
        assert_eq!(candidates[1].mime_type.as_deref(), Some("audio/mpeg"));
        assert_eq!(candidates[2].mime_type, None);
    }
}
