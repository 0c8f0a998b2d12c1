//! Scripted in-process launch source and record fixtures for tests.
use super::LaunchSource;
use crate::domain::{RawPage, YearMonth};
use crate::errors::FeedResult;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
    pub month: Option<YearMonth>,
}

/// Replays queued responses in order; an empty queue answers with an empty
/// final page.
#[derive(Default)]
pub struct ScriptedSource {
    responses: Mutex<VecDeque<FeedResult<RawPage>>>,
    requests: Mutex<Vec<PageRequest>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every fetch waits for a `notify_one` on the gate before answering
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn push_page(&self, records: Vec<Value>, has_next: bool) {
        self.push(Ok(RawPage { records, has_next }));
    }

    pub fn push(&self, response: FeedResult<RawPage>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LaunchSource for ScriptedSource {
    async fn fetch_page(
        &self,
        page: u32,
        page_size: u32,
        month: Option<YearMonth>,
    ) -> FeedResult<RawPage> {
        self.requests.lock().unwrap().push(PageRequest {
            page,
            page_size,
            month,
        });
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(RawPage::default()))
    }
}

/// A detailed-mode upstream record for a Falcon 9 from Cape Canaveral
pub fn raw_launch(id: &str, net: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Falcon 9 | {}", id),
        "net": net,
        "window_start": net,
        "window_end": net,
        "status": {"name": "Go for Launch", "description": "Current T-0 confirmed by official or reliable sources."},
        "pad": {
            "name": "Space Launch Complex 40",
            "latitude": "28.56194122",
            "longitude": "-80.57735736",
            "location": {
                "name": "Cape Canaveral, FL, USA",
                "country_code": "USA",
                "latitude": 28.5618571,
                "longitude": -80.577366
            }
        },
        "rocket": {
            "configuration": {
                "id": 164,
                "name": "Falcon 9",
                "family": "Falcon",
                "full_name": "Falcon 9 Block 5",
                "variant": "Block 5"
            }
        },
        "mission": {
            "name": format!("Starlink {}", id),
            "description": "A batch of satellites for the Starlink mega-constellation.",
            "type": "Communications"
        },
        "webcast_live": true,
        "image": "https://thespacedevs-prod.nyc3.digitaloceanspaces.com/media/images/falcon_9_image.png",
        "probability": 90,
        "weather_concerns": null,
        "video_url": format!("https://youtu.be/vid-{}", id),
        "vidURLs": []
    })
}

/// A record from Vandenberg on an Electron-like vehicle
pub fn raw_west_coast_launch(id: &str, net: &str, probability: Option<u8>, status: &str) -> Value {
    let mut raw = raw_launch(id, net);
    raw["pad"]["location"] = json!({
        "name": "Vandenberg SFB, CA, USA",
        "country_code": "USA",
        "latitude": 34.632,
        "longitude": -120.611
    });
    raw["rocket"]["configuration"]["id"] = json!("26");
    raw["rocket"]["configuration"]["name"] = json!("Electron");
    raw["rocket"]["configuration"]["family"] = json!("");
    raw["probability"] = json!(probability);
    raw["status"]["name"] = json!(status);
    raw
}
