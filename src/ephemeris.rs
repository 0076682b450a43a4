//! Sidereal position of the reference body.
//!
//! The birth moment is taken as local clock time at a fixed +05:30 offset
//! (every place the resolver knows sits in that zone), converted to a
//! Julian Day, and run through a low-precision analytic series for the
//! tropical longitude of the configured body. Subtracting the ayanamsa
//! gives the sidereal longitude, normalized into [0, 360).
//!
//! If the analytic series ever produces a non-finite value, the
//! computation drops to a coarse day-of-year solar approximation instead
//! of failing the request. That branch is tagged in the result so callers
//! and tests can tell the two paths apart.

use crate::{BirthDetails, Location};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Fixed local-time offset applied to all birth moments: +05:30.
pub const LOCAL_OFFSET_SECONDS: i64 = 5 * 3600 + 30 * 60;

/// JD of the J2000.0 epoch (2000-01-01 12:00 UT).
pub const J2000: f64 = 2_451_545.0;

/// Which body the chart is cast from. Tradition reads the mansions from
/// the Moon; some schools cast from the Sun instead, so both stay
/// selectable.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceBody {
    Sun,
    Moon,
}

impl fmt::Display for ReferenceBody {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReferenceBody::Sun => write!(f, "Sun"),
            ReferenceBody::Moon => write!(f, "Moon"),
        }
    }
}

/// Which computation produced the longitude.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSource {
    /// Low-precision analytic series for the configured body.
    Analytic,
    /// Coarse day-of-year solar approximation.
    DayOfYear,
}

/// A sidereal ecliptic longitude in [0, 360) plus the path that computed it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiderealPosition {
    pub degrees: f64,
    pub source: PositionSource,
}

/// Convert a local birth moment (+05:30 wall clock) to UTC.
pub fn to_utc(details: BirthDetails) -> DateTime<Utc> {
    let naive = details.date.and_time(details.time) - Duration::seconds(LOCAL_OFFSET_SECONDS);
    DateTime::from_naive_utc_and_offset(naive, Utc)
}

/// Julian Day for a civil UTC timestamp, Gregorian calendar.
pub fn julian_day(moment: DateTime<Utc>) -> f64 {
    let (year, month) = if moment.month() <= 2 {
        (moment.year() - 1, moment.month() + 12)
    } else {
        (moment.year(), moment.month())
    };
    let century = (year as f64 / 100.0).floor();
    let gregorian = 2.0 - century + (century / 4.0).floor();
    let day = moment.day() as f64
        + (moment.hour() as f64
            + moment.minute() as f64 / 60.0
            + moment.second() as f64 / 3600.0)
            / 24.0;
    (365.25 * (year as f64 + 4716.0)).floor()
        + (30.6001 * (month as f64 + 1.0)).floor()
        + day
        + gregorian
        - 1524.5
}

/// Tropical longitude of the Sun: mean longitude plus the equation of
/// center, good to a couple arcminutes near the present era.
pub fn sun_tropical_longitude(jd: f64) -> f64 {
    let n = jd - J2000;
    let mean_longitude = 280.460 + 0.985_647_4 * n;
    let mean_anomaly = (357.528 + 0.985_600_3 * n).to_radians();
    (mean_longitude + 1.915 * mean_anomaly.sin() + 0.020 * (2.0 * mean_anomaly).sin())
        .rem_euclid(360.0)
}

/// Tropical longitude of the Moon: mean longitude plus the principal
/// elliptic term. Roughly degree-level accuracy, which is well inside a
/// 13 deg 20' mansion for most of the circle.
pub fn moon_tropical_longitude(jd: f64) -> f64 {
    let n = jd - J2000;
    let mean_longitude = 218.316 + 13.176_396 * n;
    let mean_anomaly = (134.963 + 13.064_993 * n).to_radians();
    (mean_longitude + 6.289 * mean_anomaly.sin()).rem_euclid(360.0)
}

/// Coarse solar longitude from the day of the year alone: zero near the
/// March equinox (day 80), advancing 360 degrees per tropical year.
pub fn day_of_year_longitude(date: NaiveDate) -> f64 {
    ((date.ordinal() as f64 - 80.0) * 360.0 / 365.25).rem_euclid(360.0)
}

/// Lahiri ayanamsa, linearized around 2000.
///
/// The drift coefficient is preserved exactly so published charts keep
/// their values. It is far smaller than the real precession rate
/// (~50"/yr), so the result is effectively constant; treat it as a fixed
/// offset near the year 2000, not an ephemeris-grade correction.
pub fn lahiri_ayanamsa(year: i32) -> f64 {
    23.85 + (year - 2000) as f64 * 0.000_000_317
}

/// Sidereal longitude of `body` for the given birth moment and observer
/// site. Never fails: a non-finite analytic result drops to the
/// day-of-year approximation.
pub fn sidereal_position(
    details: BirthDetails,
    site: Location,
    body: ReferenceBody,
) -> SiderealPosition {
    let utc = to_utc(details);
    let jd = julian_day(utc);
    debug!(
        jd,
        lat = site.latitude,
        lon = site.longitude,
        %body,
        "computing sidereal position"
    );

    let tropical = match body {
        ReferenceBody::Sun => sun_tropical_longitude(jd),
        ReferenceBody::Moon => moon_tropical_longitude(jd),
    };
    let (tropical, source) = if tropical.is_finite() {
        (tropical, PositionSource::Analytic)
    } else {
        warn!(%body, jd, "analytic longitude non-finite; using day-of-year approximation");
        (day_of_year_longitude(details.date), PositionSource::DayOfYear)
    };

    let ayanamsa = lahiri_ayanamsa(utc.year());
    SiderealPosition {
        degrees: (tropical - ayanamsa).rem_euclid(360.0),
        source,
    }
}
