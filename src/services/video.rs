//! Video link extraction from the upstream `video_url` / `vidURLs` fields.
//!
//! Each platform owns an ordered list of extraction strategies. A candidate
//! URL is tried against every strategy of a platform whose host it carries;
//! the first strategy that yields a non-empty id wins. Candidates are visited
//! in priority order (`video_url`, then `vidURLs` in list order) and each
//! platform keeps the first id it finds.
use crate::domain::VideoRefs;
use serde_json::Value;

type Strategy = fn(&str) -> Option<String>;

const YOUTUBE_STRATEGIES: &[Strategy] = &[watch_query, short_link, live_path, embed_path];
const TWITTER_STRATEGIES: &[Strategy] = &[status_path];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Platform {
    YouTube,
    Twitter,
}

impl Platform {
    fn hosts(self) -> &'static [&'static str] {
        match self {
            Platform::YouTube => &["youtube.com", "youtu.be", "youtube-nocookie.com"],
            Platform::Twitter => &["twitter.com", "x.com"],
        }
    }

    fn strategies(self) -> &'static [Strategy] {
        match self {
            Platform::YouTube => YOUTUBE_STRATEGIES,
            Platform::Twitter => TWITTER_STRATEGIES,
        }
    }

    fn extract(self, url: &str) -> Option<String> {
        let host = host_of(url)?;
        let known = self
            .hosts()
            .iter()
            .any(|h| host == *h || host.ends_with(&format!(".{}", h)));
        if !known {
            return None;
        }
        self.strategies().iter().find_map(|strategy| strategy(url))
    }
}

/// Extract YouTube and Twitter ids. `video_url` is inspected first; the list
/// is scanned only for the platforms it left unresolved.
pub fn extract(video_url: Option<&str>, vid_urls: Option<&[Value]>) -> VideoRefs {
    let mut refs = VideoRefs::default();

    if let Some(url) = video_url {
        refs.youtube = Platform::YouTube.extract(url);
        refs.twitter = Platform::Twitter.extract(url);
    }

    for url in vid_urls.unwrap_or_default().iter().filter_map(candidate_url) {
        if refs.youtube.is_some() && refs.twitter.is_some() {
            break;
        }
        if refs.youtube.is_none() {
            refs.youtube = Platform::YouTube.extract(url);
        }
        if refs.twitter.is_none() {
            refs.twitter = Platform::Twitter.extract(url);
        }
    }
    refs
}

/// List entries are either bare strings or objects with a `url`
fn candidate_url(entry: &Value) -> Option<&str> {
    entry
        .as_str()
        .or_else(|| entry.get("url").and_then(Value::as_str))
}

fn host_of(url: &str) -> Option<String> {
    let rest = url.trim();
    let rest = rest.split_once("://").map_or(rest, |(_, r)| r);
    let host = rest.split(['/', '?', '#']).next()?;
    let host = host.rsplit('@').next()?.split(':').next()?.to_lowercase();
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Text after `marker`, cut at the first terminator
fn segment_after(url: &str, marker: &str, terminators: &[char]) -> Option<String> {
    let (_, tail) = url.split_once(marker)?;
    let id = tail.split(terminators).next()?;
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

fn watch_query(url: &str) -> Option<String> {
    segment_after(url, "watch?v=", &['&', '?', '#', '/'])
}

fn short_link(url: &str) -> Option<String> {
    segment_after(url, "youtu.be/", &['?', '&', '#', '/'])
}

fn live_path(url: &str) -> Option<String> {
    segment_after(url, "/live/", &['?', '&', '#', '/'])
}

fn embed_path(url: &str) -> Option<String> {
    segment_after(url, "/embed/", &['?', '&', '#', '/'])
}

fn status_path(url: &str) -> Option<String> {
    segment_after(url, "/status/", &['?', '#', '/'])
}
