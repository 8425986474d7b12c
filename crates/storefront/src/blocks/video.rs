//! Video URLs from the CMS mapped to embeddable players.

use url::Url;

/// How a video block shows its video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoEmbed {
    /// Player page loaded in an `<iframe>`.
    Frame(String),
    /// Direct file played by a `<video>` element.
    File(String),
}

impl VideoEmbed {
    /// Resolve a video URL.
    ///
    /// YouTube links (watch, share, shorts, embed) use the privacy-enhanced
    /// `youtube-nocookie.com` player; Vimeo links use `player.vimeo.com`.
    /// Other http(s) URLs are treated as video files. Unparseable input
    /// yields `None`.
    #[must_use]
    pub fn from_url(raw: &str) -> Option<Self> {
        let url = Url::parse(raw.trim()).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        match host {
            "youtu.be" => segments.first().and_then(|id| youtube(id)),
            "youtube.com" | "youtube-nocookie.com" => match segments.as_slice() {
                ["watch"] => url
                    .query_pairs()
                    .find(|(k, _)| k == "v")
                    .and_then(|(_, id)| youtube(&id)),
                ["embed" | "shorts" | "live", id, ..] => youtube(id),
                _ => None,
            },
            "vimeo.com" => segments
                .iter()
                .rev()
                .find(|seg| seg.chars().all(|c| c.is_ascii_digit()))
                .map(|id| Self::Frame(format!("https://player.vimeo.com/video/{id}"))),
            "player.vimeo.com" => Some(Self::Frame(url.to_string())),
            _ => Some(Self::File(url.to_string())),
        }
    }
}

fn youtube(id: &str) -> Option<VideoEmbed> {
    let valid = !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then(|| VideoEmbed::Frame(format!("https://www.youtube-nocookie.com/embed/{id}")))
}
