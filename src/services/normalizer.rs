/// Maps raw upstream launch records onto the `Launch` entity
use crate::domain::{
    Launch, LaunchStatus, Mission, Pad, PadLocation, RawPage, RocketConfiguration,
};
use crate::errors::{FeedError, FeedResult};
use crate::services::video;
use crate::utils::{at, id_at, num, parse_instant, s_at};
use serde_json::Value;
use tracing::debug;

/// Normalize one record. Only `id`, `name` and `net` are required.
pub fn normalize(raw: &Value) -> FeedResult<Launch> {
    let id = s_at(raw, &["id"]).ok_or_else(|| missing(raw, "id"))?;
    let name = s_at(raw, &["name"]).ok_or_else(|| missing(raw, "name"))?;
    let net = raw
        .get("net")
        .and_then(parse_instant)
        .ok_or_else(|| missing(raw, "net"))?;

    let window_start = raw.get("window_start").and_then(parse_instant).unwrap_or(net);
    let window_end = raw.get("window_end").and_then(parse_instant).unwrap_or(net);

    let vid_urls = raw.get("vidURLs").and_then(Value::as_array);
    let video_refs = video::extract(
        raw.get("video_url").and_then(Value::as_str),
        vid_urls.map(Vec::as_slice),
    );
    let webcast_live = raw
        .get("webcast_live")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if webcast_live && video_refs.is_empty() {
        debug!(id = %id, "live webcast without a recognised video link");
    }

    Ok(Launch {
        id,
        name,
        net,
        window_start,
        window_end,
        status: LaunchStatus {
            name: text(raw, &["status", "name"]),
            description: text(raw, &["status", "description"]),
        },
        pad: pad(raw),
        rocket: RocketConfiguration {
            id: id_at(raw, &["rocket", "configuration", "id"]).unwrap_or_default(),
            name: text(raw, &["rocket", "configuration", "name"]),
            family: text(raw, &["rocket", "configuration", "family"]),
            full_name: text(raw, &["rocket", "configuration", "full_name"]),
            variant: text(raw, &["rocket", "configuration", "variant"]),
        },
        mission: mission(raw),
        webcast_live,
        image: s_at(raw, &["image"]),
        probability: probability(raw.get("probability")),
        weather_concerns: s_at(raw, &["weather_concerns"]),
        video_refs,
    })
}

/// Normalize a whole page; one bad record fails the page
pub fn normalize_page(page: &RawPage) -> FeedResult<Vec<Launch>> {
    page.records.iter().map(normalize).collect()
}

fn missing(raw: &Value, field: &str) -> FeedError {
    let which = raw
        .get("id")
        .and_then(Value::as_str)
        .map(|id| format!(" (record {})", id))
        .unwrap_or_default();
    FeedError::MalformedRecord(format!("missing or invalid `{}`{}", field, which))
}

fn text(raw: &Value, path: &[&str]) -> String {
    s_at(raw, path).unwrap_or_default()
}

fn pad(raw: &Value) -> Pad {
    let coordinate = |key: &str| {
        at(raw, &["pad", "location", key])
            .and_then(num)
            .or_else(|| at(raw, &["pad", key]).and_then(num))
    };
    Pad {
        name: text(raw, &["pad", "name"]),
        location: PadLocation {
            name: text(raw, &["pad", "location", "name"]),
            country_code: text(raw, &["pad", "location", "country_code"]),
            latitude: coordinate("latitude"),
            longitude: coordinate("longitude"),
        },
    }
}

fn mission(raw: &Value) -> Option<Mission> {
    let mission = raw.get("mission").filter(|m| m.is_object())?;
    Some(Mission {
        name: text(mission, &["name"]),
        description: text(mission, &["description"]),
        kind: text(mission, &["type"]),
    })
}

fn probability(value: Option<&Value>) -> Option<u8> {
    let p = value.and_then(Value::as_f64)?.round();
    if (0.0..=100.0).contains(&p) {
        Some(p as u8)
    } else {
        None
    }
}
