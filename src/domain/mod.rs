/// Domain models for the application
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

mod filter;

pub use filter::{
    FacetOptions, FilterCriteria, FilterOptionCatalogue, LocationKey, LocationOption,
    MonthOption, ParseMonthError, ProbabilityBand, ProbabilityOption, RocketOption, StatusOption,
    YearMonth,
};

/// Fixed upstream page size
pub const PAGE_SIZE: u32 = 25;

/// A normalized upcoming launch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Launch {
    pub id: String,
    pub name: String,
    pub net: DateTime<Utc>,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub status: LaunchStatus,
    pub pad: Pad,
    pub rocket: RocketConfiguration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mission: Option<Mission>,
    pub webcast_live: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub probability: Option<u8>,
    pub weather_concerns: Option<String>,
    pub video_refs: VideoRefs,
}

impl Launch {
    pub fn location_key(&self) -> LocationKey {
        LocationKey {
            name: self.pad.location.name.clone(),
            country_code: self.pad.location.country_code.clone(),
        }
    }

    /// Pad coordinates, when upstream published both
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.pad.location.latitude?, self.pad.location.longitude?))
    }

    pub fn status_tone(&self) -> StatusTone {
        StatusTone::of(&self.status.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchStatus {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pad {
    pub name: String,
    pub location: PadLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PadLocation {
    pub name: String,
    pub country_code: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RocketConfiguration {
    pub id: String,
    pub name: String,
    pub family: String,
    pub full_name: String,
    pub variant: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mission {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// External video ids derived from the upstream video fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VideoRefs {
    pub youtube: Option<String>,
    pub twitter: Option<String>,
}

impl VideoRefs {
    pub fn is_empty(&self) -> bool {
        self.youtube.is_none() && self.twitter.is_none()
    }

    pub fn youtube_url(&self) -> Option<String> {
        self.youtube
            .as_ref()
            .map(|id| format!("https://youtube.com/watch?v={}", id))
    }

    pub fn twitter_url(&self) -> Option<String> {
        self.twitter
            .as_ref()
            .map(|id| format!("https://twitter.com/i/status/{}", id))
    }
}

/// Coarse colouring of a status name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTone {
    Go,
    Hold,
    Other,
}

impl StatusTone {
    pub fn of(status_name: &str) -> Self {
        let lower = status_name.to_lowercase();
        if lower.contains("go") {
            StatusTone::Go
        } else if lower.contains("hold") {
            StatusTone::Hold
        } else {
            StatusTone::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SunEvent {
    Sunrise,
    Sunset,
}

/// Whether a launch falls within an hour of local sunrise or sunset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SunProximity {
    pub is_near: bool,
    pub kind: Option<SunEvent>,
}

impl SunProximity {
    pub const NONE: SunProximity = SunProximity {
        is_near: false,
        kind: None,
    };

    pub fn near(kind: SunEvent) -> Self {
        Self {
            is_near: true,
            kind: Some(kind),
        }
    }
}

/// One page of raw upstream records
#[derive(Debug, Clone, Default)]
pub struct RawPage {
    pub records: Vec<Value>,
    pub has_next: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationState {
    pub page_number: u32,
    pub page_size: u32,
    pub has_more: bool,
    pub loading: bool,
    pub last_error: Option<String>,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            page_number: 1,
            page_size: PAGE_SIZE,
            has_more: true,
            loading: false,
            last_error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedStatus {
    Idle,
    Loading,
    Loaded,
    Exhausted,
    Error,
}

/// A launch plus the facts a card needs to render it
#[derive(Debug, Clone, Serialize)]
pub struct LaunchCard {
    #[serde(flatten)]
    pub launch: Launch,
    pub sun: SunProximity,
    pub status_tone: StatusTone,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter_url: Option<String>,
}

/// Read-only view of the feed
#[derive(Debug, Clone, Serialize)]
pub struct FeedSnapshot {
    pub status: FeedStatus,
    pub criteria: FilterCriteria,
    pub pagination: PaginationState,
    pub facets: FacetOptions,
    pub launches: Vec<LaunchCard>,
}

/// Health check response
#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub now: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_tone_matches_substrings() {
        assert_eq!(StatusTone::of("Go for Launch"), StatusTone::Go);
        assert_eq!(StatusTone::of("On Hold"), StatusTone::Hold);
        assert_eq!(StatusTone::of("To Be Determined"), StatusTone::Other);
    }

    #[test]
    fn watch_links_from_ids() {
        let refs = VideoRefs {
            youtube: Some("abc123".into()),
            twitter: None,
        };
        assert_eq!(
            refs.youtube_url().as_deref(),
            Some("https://youtube.com/watch?v=abc123")
        );
        assert_eq!(refs.twitter_url(), None);
        assert!(!refs.is_empty());
        assert!(VideoRefs::default().is_empty());
    }
}
