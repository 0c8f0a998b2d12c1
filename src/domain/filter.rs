use super::Launch;
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid month {0:?}, expected YYYY-MM")]
pub struct ParseMonthError(String);

/// A calendar month, written `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth(NaiveDate);

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(YearMonth)
    }

    /// The current UTC calendar month
    pub fn current() -> Self {
        Self::containing(Utc::now())
    }

    pub fn containing(instant: DateTime<Utc>) -> Self {
        let date = instant.date_naive();
        YearMonth(date - Duration::days(i64::from(date.day0())))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn next(&self) -> Self {
        YearMonth(self.0 + Months::new(1))
    }

    pub fn first_instant(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.0.and_time(NaiveTime::default()))
    }

    pub fn last_instant(&self) -> DateTime<Utc> {
        self.next().first_instant() - Duration::milliseconds(1)
    }

    pub fn label(&self) -> String {
        self.0.format("%B %Y").to_string()
    }

    /// This month followed by the next `count - 1`
    pub fn upcoming(self, count: usize) -> Vec<YearMonth> {
        std::iter::successors(Some(self), |m| Some(m.next()))
            .take(count)
            .collect()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for YearMonth {
    type Err = ParseMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseMonthError(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(err)?;
        let digits = |part: &str, len: usize| {
            part.len() == len && part.chars().all(|c| c.is_ascii_digit())
        };
        if !digits(year, 4) || !digits(month, 2) {
            return Err(err());
        }
        let year = year.parse().map_err(|_| err())?;
        let month = month.parse().map_err(|_| err())?;
        YearMonth::new(year, month).ok_or_else(err)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Pad location identity, written `<name>|<country code>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationKey {
    pub name: String,
    pub country_code: String,
}

impl LocationKey {
    pub fn parse(raw: &str) -> Option<Self> {
        let (name, country_code) = raw.split_once('|')?;
        Some(Self {
            name: name.to_string(),
            country_code: country_code.to_string(),
        })
    }

    pub fn label(&self) -> String {
        format!("{}, {}", self.name, self.country_code)
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.name, self.country_code)
    }
}

impl Serialize for LocationKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbabilityBand {
    High,
    Medium,
    Low,
    Unknown,
}

impl ProbabilityBand {
    pub const ALL: [ProbabilityBand; 4] = [
        ProbabilityBand::High,
        ProbabilityBand::Medium,
        ProbabilityBand::Low,
        ProbabilityBand::Unknown,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "high" => Some(ProbabilityBand::High),
            "medium" => Some(ProbabilityBand::Medium),
            "low" => Some(ProbabilityBand::Low),
            "unknown" => Some(ProbabilityBand::Unknown),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProbabilityBand::High => "high",
            ProbabilityBand::Medium => "medium",
            ProbabilityBand::Low => "low",
            ProbabilityBand::Unknown => "unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProbabilityBand::High => "High (>80%)",
            ProbabilityBand::Medium => "Medium (50-80%)",
            ProbabilityBand::Low => "Low (<50%)",
            ProbabilityBand::Unknown => "Unknown",
        }
    }

    /// A null probability only ever falls in `Unknown`
    pub fn matches(&self, probability: Option<u8>) -> bool {
        match (self, probability) {
            (ProbabilityBand::Unknown, p) => p.is_none(),
            (_, None) => false,
            (ProbabilityBand::High, Some(p)) => p > 80,
            (ProbabilityBand::Medium, Some(p)) => p > 50 && p <= 80,
            (ProbabilityBand::Low, Some(p)) => p <= 50,
        }
    }
}

/// Active filter facets. `None` means no constraint on that facet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterCriteria {
    pub month: YearMonth,
    pub location: Option<LocationKey>,
    pub rocket: Option<String>,
    pub probability: Option<ProbabilityBand>,
    pub status: Option<String>,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self::for_month(YearMonth::current())
    }
}

impl FilterCriteria {
    pub fn for_month(month: YearMonth) -> Self {
        Self {
            month,
            location: None,
            rocket: None,
            probability: None,
            status: None,
        }
    }

    /// Conjunction of every active facet
    pub fn matches(&self, launch: &Launch) -> bool {
        if let Some(location) = &self.location {
            if launch.pad.location.name != location.name
                || launch.pad.location.country_code != location.country_code
            {
                return false;
            }
        }
        if let Some(rocket) = &self.rocket {
            if &launch.rocket.id != rocket {
                return false;
            }
        }
        if let Some(band) = self.probability {
            if !band.matches(launch.probability) {
                return false;
            }
        }
        if let Some(status) = &self.status {
            if &launch.status.name != status {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationOption {
    pub value: String,
    pub label: String,
    pub name: String,
    pub country_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RocketOption {
    pub value: String,
    pub label: String,
    pub name: String,
    pub family: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusOption {
    pub value: String,
    pub label: String,
}

/// Selector options observed on the last reset fetch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FacetOptions {
    pub locations: Vec<LocationOption>,
    pub rockets: Vec<RocketOption>,
    pub statuses: Vec<StatusOption>,
}

impl FacetOptions {
    pub fn from_launches(launches: &[Launch]) -> Self {
        let mut facets = FacetOptions::default();
        let mut seen_locations = HashSet::new();
        let mut seen_rockets = HashSet::new();
        let mut seen_statuses = HashSet::new();

        for launch in launches {
            let key = launch.location_key();
            if seen_locations.insert(key.to_string()) {
                facets.locations.push(LocationOption {
                    value: key.to_string(),
                    label: key.label(),
                    name: key.name,
                    country_code: key.country_code,
                });
            }

            let rocket = &launch.rocket;
            if seen_rockets.insert(rocket.id.clone()) {
                let label = if rocket.family.is_empty() {
                    rocket.name.clone()
                } else {
                    format!("{} ({})", rocket.name, rocket.family)
                };
                facets.rockets.push(RocketOption {
                    value: rocket.id.clone(),
                    label,
                    name: rocket.name.clone(),
                    family: rocket.family.clone(),
                });
            }

            if seen_statuses.insert(launch.status.name.clone()) {
                facets.statuses.push(StatusOption {
                    value: launch.status.name.clone(),
                    label: launch.status.name.clone(),
                });
            }
        }

        facets
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// Everything a filter panel offers
#[derive(Debug, Clone, Serialize)]
pub struct FilterOptionCatalogue {
    pub months: Vec<MonthOption>,
    pub probabilities: Vec<ProbabilityOption>,
    #[serde(flatten)]
    pub facets: FacetOptions,
}

impl FilterOptionCatalogue {
    pub fn new(facets: FacetOptions, from: YearMonth) -> Self {
        let months = from
            .upcoming(12)
            .into_iter()
            .map(|m| MonthOption {
                value: m.to_string(),
                label: m.label(),
            })
            .collect();
        let probabilities = ProbabilityBand::ALL
            .iter()
            .map(|band| ProbabilityOption {
                value: band.name(),
                label: band.label(),
            })
            .collect();
        Self {
            months,
            probabilities,
            facets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn april() -> YearMonth {
        YearMonth::new(2025, 4).unwrap()
    }

    #[test]
    fn month_parses_and_prints() {
        let month: YearMonth = "2025-04".parse().unwrap();
        assert_eq!(month, april());
        assert_eq!(month.to_string(), "2025-04");
        assert_eq!(month.label(), "April 2025");
    }

    #[test]
    fn month_rejects_bad_shapes() {
        for raw in ["2025-4", "2025-13", "25-04", "april", "2025/04", ""] {
            assert!(raw.parse::<YearMonth>().is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn month_bounds_cover_whole_month() {
        let month = april();
        assert_eq!(
            month.first_instant().to_rfc3339(),
            "2025-04-01T00:00:00+00:00"
        );
        assert_eq!(
            month.last_instant().to_rfc3339(),
            "2025-04-30T23:59:59.999+00:00"
        );
    }

    #[test]
    fn upcoming_months_roll_over_year() {
        let months = YearMonth::new(2025, 11).unwrap().upcoming(12);
        assert_eq!(months.len(), 12);
        assert_eq!(months[1].to_string(), "2025-12");
        assert_eq!(months[2].to_string(), "2026-01");
        assert_eq!(months[11].to_string(), "2026-10");
    }

    #[test]
    fn containing_instant() {
        let instant = "2025-04-17T08:00:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(YearMonth::containing(instant), april());
    }

    #[test]
    fn location_key_round_trips_through_text() {
        let key = LocationKey::parse("Cape Canaveral, FL, USA|USA").unwrap();
        assert_eq!(key.name, "Cape Canaveral, FL, USA");
        assert_eq!(key.country_code, "USA");
        assert_eq!(key.label(), "Cape Canaveral, FL, USA, USA");
        assert_eq!(LocationKey::parse("no separator"), None);
    }

    #[test]
    fn probability_bands_partition() {
        let samples: Vec<Option<u8>> = (0..=100).map(Some).chain([None]).collect();
        for p in samples {
            let hits: Vec<_> = ProbabilityBand::ALL
                .iter()
                .filter(|band| band.matches(p))
                .collect();
            assert_eq!(hits.len(), 1, "probability {:?} matched {:?}", p, hits);
            assert_eq!(
                ProbabilityBand::Unknown.matches(p),
                p.is_none(),
                "unknown iff null"
            );
        }
    }

    #[test]
    fn probability_band_edges() {
        assert!(ProbabilityBand::High.matches(Some(81)));
        assert!(!ProbabilityBand::High.matches(Some(80)));
        assert!(ProbabilityBand::Medium.matches(Some(80)));
        assert!(!ProbabilityBand::Medium.matches(Some(50)));
        assert!(ProbabilityBand::Low.matches(Some(50)));
        assert!(ProbabilityBand::Low.matches(Some(0)));
        assert!(!ProbabilityBand::Low.matches(None));
    }

    #[test]
    fn catalogue_lists_twelve_months_and_four_bands() {
        let catalogue = FilterOptionCatalogue::new(FacetOptions::default(), april());
        assert_eq!(catalogue.months.len(), 12);
        assert_eq!(catalogue.months[0].value, "2025-04");
        assert_eq!(catalogue.months[0].label, "April 2025");
        let values: Vec<_> = catalogue.probabilities.iter().map(|p| p.value).collect();
        assert_eq!(values, ["high", "medium", "low", "unknown"]);
    }
}
