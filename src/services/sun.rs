//! Sunrise/sunset proximity for a launch instant at a pad.
//!
//! Solar position follows the usual low-precision almanac formulas (mean
//! anomaly, equation of center, solar transit). The day used is the solar
//! day whose transit is nearest the instant at the given longitude.
use crate::domain::{SunEvent, SunProximity};
use chrono::{DateTime, Duration, Utc};
use std::f64::consts::PI;

const RAD: f64 = PI / 180.0;
const DAY_MS: f64 = 86_400_000.0;
const J1970: f64 = 2_440_588.0;
const J2000: f64 = 2_451_545.0;
const J0: f64 = 0.0009;
/// Obliquity of the ecliptic
const OBLIQUITY: f64 = RAD * 23.4397;
/// Apparent altitude of the sun's upper limb at rise/set
const SUNRISE_ALTITUDE: f64 = RAD * -0.833;

pub const PROXIMITY_WINDOW_MINUTES: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolarTimes {
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

fn to_days(instant: DateTime<Utc>) -> f64 {
    instant.timestamp_millis() as f64 / DAY_MS - 0.5 + J1970 - J2000
}

fn from_julian(j: f64) -> Option<DateTime<Utc>> {
    if !j.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(((j + 0.5 - J1970) * DAY_MS).round() as i64)
}

fn solar_mean_anomaly(d: f64) -> f64 {
    RAD * (357.5291 + 0.985_600_28 * d)
}

fn ecliptic_longitude(m: f64) -> f64 {
    let center = RAD * (1.9148 * m.sin() + 0.02 * (2.0 * m).sin() + 0.0003 * (3.0 * m).sin());
    let perihelion = RAD * 102.9372;
    m + center + perihelion + PI
}

fn declination(l: f64) -> f64 {
    (OBLIQUITY.sin() * l.sin()).asin()
}

fn approx_transit(hour_angle: f64, lw: f64, n: f64) -> f64 {
    J0 + (hour_angle + lw) / (2.0 * PI) + n
}

fn solar_transit_j(ds: f64, m: f64, l: f64) -> f64 {
    J2000 + ds + 0.0053 * m.sin() - 0.0069 * (2.0 * l).sin()
}

/// Sunrise, sunset and solar noon around `instant`. `None` during polar day
/// or night, when the sun never crosses the horizon.
pub fn solar_times(instant: DateTime<Utc>, latitude: f64, longitude: f64) -> Option<SolarTimes> {
    let lw = RAD * -longitude;
    let phi = RAD * latitude;

    let d = to_days(instant);
    let n = (d - J0 - lw / (2.0 * PI)).round();
    let ds = approx_transit(0.0, lw, n);

    let m = solar_mean_anomaly(ds);
    let l = ecliptic_longitude(m);
    let dec = declination(l);
    let j_noon = solar_transit_j(ds, m, l);

    let cos_w = (SUNRISE_ALTITUDE.sin() - phi.sin() * dec.sin()) / (phi.cos() * dec.cos());
    if !(-1.0..=1.0).contains(&cos_w) {
        return None;
    }
    let w = cos_w.acos();
    let j_set = solar_transit_j(approx_transit(w, lw, n), m, l);
    let j_rise = j_noon - (j_set - j_noon);

    Some(SolarTimes {
        sunrise: from_julian(j_rise)?,
        sunset: from_julian(j_set)?,
    })
}

/// Sunrise wins when both events fall inside the window.
pub fn classify(instant: DateTime<Utc>, latitude: f64, longitude: f64) -> SunProximity {
    let Some(times) = solar_times(instant, latitude, longitude) else {
        return SunProximity::NONE;
    };
    let window_ms = Duration::minutes(PROXIMITY_WINDOW_MINUTES).num_milliseconds();
    let within = |event: DateTime<Utc>| (instant - event).num_milliseconds().abs() <= window_ms;

    if within(times.sunrise) {
        SunProximity::near(SunEvent::Sunrise)
    } else if within(times.sunset) {
        SunProximity::near(SunEvent::Sunset)
    } else {
        SunProximity::NONE
    }
}
