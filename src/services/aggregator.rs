//! Incremental launch feed: paging, filtering, cross-page dedup and facets.
//!
//! One fetch is in flight at a time. The `Loading` status is the guard:
//! `load_more`, `reset_and_load` and `retry` issued while a fetch is pending
//! return `LoadOutcome::Busy` without touching state. The state lock is never
//! held across the network call; instead every fetch carries the generation
//! it was issued under and a response from an older generation is dropped.
use crate::clients::LaunchSource;
use crate::domain::{
    FacetOptions, FeedSnapshot, FeedStatus, FilterCriteria, Launch, LaunchCard,
    PaginationState, RawPage, SunProximity, PAGE_SIZE,
};
use crate::errors::{FeedError, FeedResult};
use crate::services::normalizer::normalize_page;
use crate::services::preferences::PreferenceStore;
use crate::services::sun;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// What a feed operation did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoadOutcome {
    /// A page was fetched and merged
    Applied { fetched: usize, kept: usize },
    /// A fetch is already in flight
    Busy,
    /// No further pages
    Exhausted,
    /// The response belonged to superseded criteria
    Stale,
    Failed { message: String },
}

/// Launches keyed by id, iterated in upstream order
#[derive(Debug, Default)]
struct WorkingSet {
    launches: Vec<Launch>,
    index: HashMap<String, usize>,
}

impl WorkingSet {
    /// Last write wins; an existing id keeps its position
    fn upsert(&mut self, launch: Launch) {
        match self.index.get(&launch.id) {
            Some(&pos) => self.launches[pos] = launch,
            None => {
                self.index.insert(launch.id.clone(), self.launches.len());
                self.launches.push(launch);
            }
        }
    }

    fn get(&self, id: &str) -> Option<&Launch> {
        self.index.get(id).map(|&pos| &self.launches[pos])
    }

    fn clear(&mut self) {
        self.launches.clear();
        self.index.clear();
    }

    fn len(&self) -> usize {
        self.launches.len()
    }
}

#[derive(Debug, Clone)]
struct FetchTicket {
    generation: u64,
    page: u32,
    criteria: FilterCriteria,
    reset: bool,
}

#[derive(Debug)]
struct FeedState {
    status: FeedStatus,
    criteria: FilterCriteria,
    pagination: PaginationState,
    working_set: WorkingSet,
    facets: FacetOptions,
    generation: u64,
}

impl FeedState {
    fn new(criteria: FilterCriteria) -> Self {
        Self {
            status: FeedStatus::Idle,
            criteria,
            pagination: PaginationState::default(),
            working_set: WorkingSet::default(),
            facets: FacetOptions::default(),
            generation: 0,
        }
    }

    /// Move to `Loading` and hand out a ticket, or explain why not.
    /// `reset_to` replaces the criteria and starts over from page 1.
    fn begin(&mut self, reset_to: Option<FilterCriteria>) -> Result<FetchTicket, LoadOutcome> {
        if self.status == FeedStatus::Loading {
            return Err(LoadOutcome::Busy);
        }
        let reset = reset_to.is_some();
        match reset_to {
            Some(criteria) => {
                self.criteria = criteria;
                self.working_set.clear();
                self.pagination = PaginationState::default();
                self.generation += 1;
            }
            None if !self.pagination.has_more => return Err(LoadOutcome::Exhausted),
            None => {}
        }

        self.status = FeedStatus::Loading;
        self.pagination.loading = true;
        self.pagination.last_error = None;
        Ok(FetchTicket {
            generation: self.generation,
            page: self.pagination.page_number,
            criteria: self.criteria.clone(),
            reset,
        })
    }

    fn complete(
        &mut self,
        ticket: FetchTicket,
        result: FeedResult<(RawPage, Vec<Launch>)>,
    ) -> LoadOutcome {
        if ticket.generation != self.generation {
            debug!(
                issued = ticket.generation,
                current = self.generation,
                "discarding stale launch page"
            );
            return LoadOutcome::Stale;
        }
        self.pagination.loading = false;

        let (page, launches) = match result {
            Ok(fetched) => fetched,
            Err(err) => return self.fail(&ticket, err),
        };

        if ticket.reset {
            self.facets = FacetOptions::from_launches(&launches);
        }

        let fetched = launches.len();
        let mut kept = 0;
        for launch in launches {
            if ticket.criteria.matches(&launch) {
                self.working_set.upsert(launch);
                kept += 1;
            }
        }
        self.pagination.page_number = ticket.page + 1;
        self.pagination.has_more = page.has_next;

        if ticket.page == 1 && page.records.is_empty() {
            return self.fail(&ticket, FeedError::EmptyResult);
        }

        self.status = if self.pagination.has_more {
            FeedStatus::Loaded
        } else {
            FeedStatus::Exhausted
        };
        info!(
            page = ticket.page,
            fetched,
            kept,
            total = self.working_set.len(),
            has_more = self.pagination.has_more,
            "merged launch page"
        );
        LoadOutcome::Applied { fetched, kept }
    }

    fn fail(&mut self, ticket: &FetchTicket, err: FeedError) -> LoadOutcome {
        match &err {
            FeedError::EmptyResult => info!(month = %ticket.criteria.month, "no launches for filters"),
            other => warn!(page = ticket.page, code = other.code(), "launch page failed: {}", other),
        }
        if ticket.reset {
            self.working_set.clear();
        }
        let message = err.to_string();
        self.pagination.has_more = false;
        self.pagination.last_error = Some(message.clone());
        self.status = FeedStatus::Error;
        LoadOutcome::Failed { message }
    }
}

/// Owns the feed state; all mutation goes through its operations.
///
/// Each fetch cycle runs as its own task, so a caller that stops waiting
/// (client disconnect, timeout) never leaves the feed stuck in `Loading`.
pub struct LaunchFeedAggregator {
    source: Arc<dyn LaunchSource>,
    preferences: PreferenceStore,
    state: Arc<Mutex<FeedState>>,
}

impl LaunchFeedAggregator {
    pub fn new(source: Arc<dyn LaunchSource>, preferences: PreferenceStore) -> Self {
        Self {
            source,
            preferences,
            state: Arc::new(Mutex::new(FeedState::new(FilterCriteria::default()))),
        }
    }

    /// Restore saved filters (or defaults) and load the first page
    pub async fn initialize(&self) -> LoadOutcome {
        let criteria = self.preferences.load().await.unwrap_or_default();
        self.reset_and_load(criteria).await
    }

    pub async fn reset_and_load(&self, criteria: FilterCriteria) -> LoadOutcome {
        let ticket = match self.state.lock().await.begin(Some(criteria)) {
            Ok(ticket) => ticket,
            Err(outcome) => return outcome,
        };
        self.run(ticket, true).await
    }

    /// Clear every facet back to "no constraint" for the current month
    pub async fn reset_filters(&self) -> LoadOutcome {
        self.reset_and_load(FilterCriteria::default()).await
    }

    pub async fn load_more(&self) -> LoadOutcome {
        let ticket = match self.state.lock().await.begin(None) {
            Ok(ticket) => ticket,
            Err(outcome) => return outcome,
        };
        self.run(ticket, false).await
    }

    /// Start over from page 1 with the current criteria
    pub async fn retry(&self) -> LoadOutcome {
        let ticket = {
            let mut state = self.state.lock().await;
            let criteria = state.criteria.clone();
            match state.begin(Some(criteria)) {
                Ok(ticket) => ticket,
                Err(outcome) => return outcome,
            }
        };
        self.run(ticket, false).await
    }

    /// Detach the cycle for `ticket` and wait for its outcome. `save` stores
    /// the ticket's criteria as preferences before fetching.
    async fn run(&self, ticket: FetchTicket, save: bool) -> LoadOutcome {
        let source = self.source.clone();
        let state = self.state.clone();
        let preferences = save.then(|| self.preferences.clone());
        let issued = ticket.clone();

        let cycle = tokio::spawn(async move {
            if let Some(preferences) = preferences {
                preferences.save(&ticket.criteria).await;
            }
            let result = source
                .fetch_page(ticket.page, PAGE_SIZE, Some(ticket.criteria.month))
                .await
                .and_then(|page| {
                    let launches = normalize_page(&page)?;
                    Ok((page, launches))
                });
            state.lock().await.complete(ticket, result)
        });

        match cycle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                let err = FeedError::transport(None, format!("fetch task aborted: {}", e));
                self.state.lock().await.complete(issued, Err(err))
            }
        }
    }

    pub async fn snapshot(&self) -> FeedSnapshot {
        let state = self.state.lock().await;
        FeedSnapshot {
            status: state.status,
            criteria: state.criteria.clone(),
            pagination: state.pagination.clone(),
            facets: state.facets.clone(),
            launches: state
                .working_set
                .launches
                .iter()
                .cloned()
                .map(launch_card)
                .collect(),
        }
    }

    pub async fn launch(&self, id: &str) -> Option<Launch> {
        self.state.lock().await.working_set.get(id).cloned()
    }

    pub async fn facets(&self) -> FacetOptions {
        self.state.lock().await.facets.clone()
    }
}

pub fn sun_proximity(launch: &Launch) -> SunProximity {
    launch
        .coordinates()
        .map(|(lat, lon)| sun::classify(launch.net, lat, lon))
        .unwrap_or(SunProximity::NONE)
}

fn launch_card(launch: Launch) -> LaunchCard {
    LaunchCard {
        sun: sun_proximity(&launch),
        status_tone: launch.status_tone(),
        youtube_url: launch.video_refs.youtube_url(),
        twitter_url: launch.video_refs.twitter_url(),
        launch,
    }
}
