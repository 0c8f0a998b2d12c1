/// HTTP request handlers
use crate::domain::{
    FeedSnapshot, FilterCriteria, FilterOptionCatalogue, Health, LocationKey, ProbabilityBand,
    SunProximity, YearMonth,
};
use crate::errors::{ApiError, ApiResult};
use crate::services::{sun_proximity, LaunchFeedAggregator, LoadOutcome};
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<LaunchFeedAggregator>,
}

/// Successful response wrapper
#[derive(Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub ok: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { ok: true, data }
    }
}

/// Result of a feed operation together with the state it left behind
#[derive(Serialize)]
pub struct FeedResponse {
    #[serde(flatten)]
    pub outcome: LoadOutcome,
    pub feed: FeedSnapshot,
}

#[derive(Serialize)]
pub struct SunResponse {
    pub id: String,
    pub net: DateTime<Utc>,
    pub sun: SunProximity,
}

/// Filter selection as sent by a client. Absent or empty fields mean
/// "no constraint"; an absent month means the current one.
#[derive(Debug, Default, Deserialize)]
pub struct FilterRequest {
    pub month: Option<String>,
    pub location: Option<String>,
    pub rocket: Option<String>,
    pub probability: Option<String>,
    pub status: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl FilterRequest {
    pub fn into_criteria(self) -> ApiResult<FilterCriteria> {
        let month = match non_empty(self.month) {
            Some(raw) => raw
                .parse::<YearMonth>()
                .map_err(|e| ApiError::InvalidInput(e.to_string()))?,
            None => YearMonth::current(),
        };
        let location = non_empty(self.location)
            .map(|raw| {
                LocationKey::parse(&raw).ok_or_else(|| {
                    ApiError::InvalidInput(format!("invalid location {:?}, expected name|country", raw))
                })
            })
            .transpose()?;
        let probability = non_empty(self.probability)
            .map(|raw| {
                ProbabilityBand::from_name(&raw).ok_or_else(|| {
                    ApiError::InvalidInput(format!("unknown probability band {:?}", raw))
                })
            })
            .transpose()?;

        Ok(FilterCriteria {
            month,
            location,
            rocket: non_empty(self.rocket),
            probability,
            status: non_empty(self.status),
        })
    }
}

/// Health check handler
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        now: Utc::now(),
    })
}

/// Current feed snapshot
pub async fn get_launches(State(state): State<AppState>) -> Json<SuccessResponse<FeedSnapshot>> {
    Json(SuccessResponse::new(state.feed.snapshot().await))
}

/// Load the next page
pub async fn load_more(State(state): State<AppState>) -> Json<SuccessResponse<FeedResponse>> {
    let outcome = state.feed.load_more().await;
    respond(&state, outcome).await
}

pub async fn retry(State(state): State<AppState>) -> Json<SuccessResponse<FeedResponse>> {
    let outcome = state.feed.retry().await;
    respond(&state, outcome).await
}

/// Sun proximity for a launch currently in the feed
pub async fn get_launch_sun(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse<SunResponse>>, ApiError> {
    let launch = state
        .feed
        .launch(&id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("launch {}", id)))?;

    Ok(Json(SuccessResponse::new(SunResponse {
        sun: sun_proximity(&launch),
        net: launch.net,
        id: launch.id,
    })))
}

/// Apply a new filter selection and reload from page 1
pub async fn put_filters(
    State(state): State<AppState>,
    Json(request): Json<FilterRequest>,
) -> Result<Json<SuccessResponse<FeedResponse>>, ApiError> {
    let criteria = request.into_criteria()?;
    let outcome = state.feed.reset_and_load(criteria).await;
    Ok(respond(&state, outcome).await)
}

pub async fn reset_filters(State(state): State<AppState>) -> Json<SuccessResponse<FeedResponse>> {
    let outcome = state.feed.reset_filters().await;
    respond(&state, outcome).await
}

/// Options for every filter selector
pub async fn get_filter_options(
    State(state): State<AppState>,
) -> Json<SuccessResponse<FilterOptionCatalogue>> {
    let facets = state.feed.facets().await;
    Json(SuccessResponse::new(FilterOptionCatalogue::new(
        facets,
        YearMonth::current(),
    )))
}

async fn respond(state: &AppState, outcome: LoadOutcome) -> Json<SuccessResponse<FeedResponse>> {
    Json(SuccessResponse::new(FeedResponse {
        outcome,
        feed: state.feed.snapshot().await,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::fake::{raw_launch, ScriptedSource};
    use crate::domain::FeedStatus;
    use crate::repo::MemoryPreferenceRepo;
    use crate::services::PreferenceStore;
    use serde_json::json;

    fn state_with(source: &Arc<ScriptedSource>) -> AppState {
        let store = PreferenceStore::new(Arc::new(MemoryPreferenceRepo::new()), "prefs");
        AppState {
            feed: Arc::new(LaunchFeedAggregator::new(source.clone(), store)),
        }
    }

    fn april_request() -> FilterRequest {
        FilterRequest {
            month: Some("2025-04".into()),
            ..FilterRequest::default()
        }
    }

    #[test]
    fn empty_fields_mean_no_constraint() {
        let request: FilterRequest = serde_json::from_value(json!({
            "month": "2025-04",
            "location": "",
            "rocket": "164",
            "probability": "high",
            "status": " "
        }))
        .unwrap();
        let criteria = request.into_criteria().unwrap();
        assert_eq!(criteria.month.to_string(), "2025-04");
        assert_eq!(criteria.location, None);
        assert_eq!(criteria.rocket.as_deref(), Some("164"));
        assert_eq!(criteria.probability, Some(ProbabilityBand::High));
        assert_eq!(criteria.status, None);
    }

    #[test]
    fn missing_month_is_current() {
        let criteria = FilterRequest::default().into_criteria().unwrap();
        assert_eq!(criteria, FilterCriteria::default());
    }

    #[test]
    fn bad_values_are_invalid_input() {
        for request in [
            FilterRequest {
                month: Some("April".into()),
                ..FilterRequest::default()
            },
            FilterRequest {
                probability: Some("certain".into()),
                ..FilterRequest::default()
            },
            FilterRequest {
                location: Some("Cape Canaveral".into()),
                ..FilterRequest::default()
            },
        ] {
            let err = request.into_criteria().unwrap_err();
            assert!(matches!(err, ApiError::InvalidInput(_)), "{}", err);
        }
    }

    #[tokio::test]
    async fn put_filters_reloads_feed() {
        let source = Arc::new(ScriptedSource::new());
        source.push_page(vec![raw_launch("a", "2025-04-02T12:00:00Z")], true);
        let state = state_with(&source);

        let Json(body) = put_filters(State(state.clone()), Json(april_request()))
            .await
            .unwrap();
        assert!(body.ok);
        assert_eq!(body.data.outcome, LoadOutcome::Applied { fetched: 1, kept: 1 });
        assert_eq!(body.data.feed.status, FeedStatus::Loaded);

        let encoded = serde_json::to_value(&body).unwrap();
        assert_eq!(encoded["outcome"], json!("applied"));
        assert_eq!(encoded["feed"]["launches"][0]["id"], json!("a"));
        assert_eq!(encoded["feed"]["launches"][0]["status_tone"], json!("go"));
    }

    #[tokio::test]
    async fn put_filters_rejects_bad_month_without_fetching() {
        let source = Arc::new(ScriptedSource::new());
        let state = state_with(&source);
        let request = FilterRequest {
            month: Some("2025-13".into()),
            ..FilterRequest::default()
        };

        let result = put_filters(State(state), Json(request)).await;
        assert!(matches!(result, Err(ApiError::InvalidInput(_))));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn load_more_reports_exhaustion() {
        let source = Arc::new(ScriptedSource::new());
        source.push_page(vec![raw_launch("a", "2025-04-02T12:00:00Z")], false);
        let state = state_with(&source);
        put_filters(State(state.clone()), Json(april_request()))
            .await
            .unwrap();

        let Json(body) = load_more(State(state)).await;
        assert_eq!(body.data.outcome, LoadOutcome::Exhausted);
        assert_eq!(body.data.feed.launches.len(), 1);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn sun_lookup_for_known_and_unknown_ids() {
        let source = Arc::new(ScriptedSource::new());
        source.push_page(vec![raw_launch("noon", "2025-06-21T17:00:00Z")], false);
        let state = state_with(&source);
        put_filters(
            State(state.clone()),
            Json(FilterRequest {
                month: Some("2025-06".into()),
                ..FilterRequest::default()
            }),
        )
        .await
        .unwrap();

        let Json(body) = get_launch_sun(Path("noon".into()), State(state.clone()))
            .await
            .unwrap();
        assert_eq!(body.data.sun, SunProximity::NONE);

        let missing = get_launch_sun(Path("ghost".into()), State(state)).await;
        assert!(matches!(missing, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn options_include_observed_facets() {
        let source = Arc::new(ScriptedSource::new());
        source.push_page(vec![raw_launch("a", "2025-04-02T12:00:00Z")], false);
        let state = state_with(&source);
        put_filters(State(state.clone()), Json(april_request()))
            .await
            .unwrap();

        let Json(body) = get_filter_options(State(state)).await;
        assert_eq!(body.data.months.len(), 12);
        assert_eq!(body.data.probabilities.len(), 4);
        assert_eq!(body.data.facets.rockets[0].value, "164");
        assert_eq!(
            body.data.facets.locations[0].value,
            "Cape Canaveral, FL, USA|USA"
        );
    }

    #[tokio::test]
    async fn retry_after_failure_and_reset() {
        let source = Arc::new(ScriptedSource::new());
        source.push(Err(crate::errors::FeedError::transport(Some(500), "Internal Server Error")));
        source.push_page(vec![raw_launch("a", "2025-04-02T12:00:00Z")], false);
        source.push_page(vec![raw_launch("b", "2025-04-03T12:00:00Z")], false);
        let state = state_with(&source);

        let Json(body) = put_filters(State(state.clone()), Json(april_request()))
            .await
            .unwrap();
        assert!(matches!(body.data.outcome, LoadOutcome::Failed { .. }));
        assert_eq!(body.data.feed.status, FeedStatus::Error);

        let Json(body) = retry(State(state.clone())).await;
        assert_eq!(body.data.outcome, LoadOutcome::Applied { fetched: 1, kept: 1 });

        let Json(body) = reset_filters(State(state.clone())).await;
        assert_eq!(body.data.feed.criteria, FilterCriteria::default());
        let Json(snapshot) = get_launches(State(state)).await;
        assert_eq!(snapshot.data.launches[0].launch.id, "b");
    }
}
