// Session video URL normalization
use serde::Serialize;

/// Playable video for one session, normalized from whatever URL form the
/// session row carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoInfo {
    pub video_id: String,
    pub url: String,
    pub embed_url: String,
}

impl VideoInfo {
    /// Accepts watch, short, and embed YouTube URL forms. Returns `None`
    /// for anything without a recognizable video id; the view renders that
    /// as "no video" rather than failing.
    pub fn from_url(raw: &str) -> Option<VideoInfo> {
        let id = youtube_id(raw)?;
        Some(VideoInfo {
            video_id: id.to_string(),
            url: format!("https://www.youtube.com/watch?v={id}"),
            embed_url: format!(
                "https://www.youtube.com/embed/{id}?rel=0&modestbranding=1&playsinline=1&autoplay=1&mute=1&loop=1&playlist={id}&controls=1"
            ),
        })
    }
}

/// Extracts a YouTube video id from `youtu.be/<id>`, `?v=<id>`/`&v=<id>`,
/// or `embed/<id>` URL forms. Ids are at least six characters of
/// `[A-Za-z0-9_-]`.
pub fn youtube_id(url: &str) -> Option<&str> {
    let s = url.trim();
    if s.is_empty() {
        return None;
    }
    id_after(s, "youtu.be/")
        .or_else(|| id_after(s, "?v="))
        .or_else(|| id_after(s, "&v="))
        .or_else(|| id_after(s, "embed/"))
}

fn id_after<'a>(s: &'a str, marker: &str) -> Option<&'a str> {
    let start = s.find(marker)? + marker.len();
    let rest = &s[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        .unwrap_or(rest.len());
    let id = &rest[..end];
    (id.len() >= 6).then_some(id)
}
