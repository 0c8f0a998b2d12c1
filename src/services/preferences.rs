/// Best-effort persistence of filter choices
use crate::domain::{FilterCriteria, LocationKey, ProbabilityBand, YearMonth};
use crate::repo::PreferenceBackend;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Stored document shape
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPreferences {
    #[serde(default)]
    pub selected_month: String,
    #[serde(default)]
    pub selected_location: Option<String>,
    #[serde(default)]
    pub selected_rocket: Option<String>,
    #[serde(default)]
    pub selected_probability: Option<String>,
    #[serde(default)]
    pub selected_status: Option<String>,
}

impl From<&FilterCriteria> for StoredPreferences {
    fn from(criteria: &FilterCriteria) -> Self {
        Self {
            selected_month: criteria.month.to_string(),
            selected_location: criteria.location.as_ref().map(LocationKey::to_string),
            selected_rocket: criteria.rocket.clone(),
            selected_probability: criteria.probability.map(|b| b.name().to_string()),
            selected_status: criteria.status.clone(),
        }
    }
}

impl StoredPreferences {
    /// The stored month is never restored
    pub fn into_criteria(self, current: YearMonth) -> FilterCriteria {
        FilterCriteria {
            month: current,
            location: self.selected_location.as_deref().and_then(LocationKey::parse),
            rocket: self.selected_rocket,
            probability: self
                .selected_probability
                .as_deref()
                .and_then(ProbabilityBand::from_name),
            status: self.selected_status,
        }
    }
}

/// Never fails towards the caller; storage problems read as "nothing saved".
#[derive(Clone)]
pub struct PreferenceStore {
    backend: Arc<dyn PreferenceBackend>,
    key: String,
}

impl PreferenceStore {
    pub fn new(backend: Arc<dyn PreferenceBackend>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub async fn save(&self, criteria: &FilterCriteria) {
        let document = match serde_json::to_value(StoredPreferences::from(criteria)) {
            Ok(document) => document,
            Err(e) => {
                warn!("could not encode filter preferences: {}", e);
                return;
            }
        };
        if let Err(e) = self.backend.write(&self.key, document).await {
            warn!("could not save filter preferences: {}", e);
        }
    }

    pub async fn load(&self) -> Option<FilterCriteria> {
        self.load_for_month(YearMonth::current()).await
    }

    pub async fn load_for_month(&self, current: YearMonth) -> Option<FilterCriteria> {
        let document = match self.backend.read(&self.key).await {
            Ok(document) => document?,
            Err(e) => {
                warn!("could not read filter preferences: {}", e);
                return None;
            }
        };
        match serde_json::from_value::<StoredPreferences>(document) {
            Ok(stored) => Some(stored.into_criteria(current)),
            Err(e) => {
                warn!("discarding unreadable filter preferences: {}", e);
                self.clear().await;
                None
            }
        }
    }

    pub async fn clear(&self) {
        if let Err(e) = self.backend.remove(&self.key).await {
            warn!("could not clear filter preferences: {}", e);
        }
    }
}
