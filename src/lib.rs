use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

pub mod ephemeris;
pub mod geocode;
pub mod guna;
pub mod oracle;
pub mod report;
pub mod server;

pub use ephemeris::{PositionSource, ReferenceBody, SiderealPosition};
pub use geocode::{MatchKind, Resolution};

// ---------------------------
// ## Grahas
// ---------------------------

/// The nine ruling bodies of the sidereal scheme: the seven classical
/// grahas plus the two lunar nodes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Graha {
    Sun,
    Moon,
    Mars,
    Mercury,
    Jupiter,
    Venus,
    Saturn,
    Rahu,
    Ketu,
}

impl Graha {
    pub const fn name(self) -> &'static str {
        match self {
            Graha::Sun => "Sun",
            Graha::Moon => "Moon",
            Graha::Mars => "Mars",
            Graha::Mercury => "Mercury",
            Graha::Jupiter => "Jupiter",
            Graha::Venus => "Venus",
            Graha::Saturn => "Saturn",
            Graha::Rahu => "Rahu",
            Graha::Ketu => "Ketu",
        }
    }
}

impl fmt::Display for Graha {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ---------------------------
// ## Rashis
// ---------------------------

/// The 12 sidereal signs, each a 30 degree bin of ecliptic longitude.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rashi {
    Mesha,
    Vrishabha,
    Mithuna,
    Karka,
    Simha,
    Kanya,
    Tula,
    Vrishchika,
    Dhanu,
    Makara,
    Kumbha,
    Meena,
}

/// All 12 rashis in zodiacal order (Mesha = 0 .. Meena = 11).
pub const ALL_RASHIS: [Rashi; 12] = [
    Rashi::Mesha,
    Rashi::Vrishabha,
    Rashi::Mithuna,
    Rashi::Karka,
    Rashi::Simha,
    Rashi::Kanya,
    Rashi::Tula,
    Rashi::Vrishchika,
    Rashi::Dhanu,
    Rashi::Makara,
    Rashi::Kumbha,
    Rashi::Meena,
];

impl Rashi {
    /// Classify a longitude into its 30 degree bin. Input may be any
    /// finite value; it is first normalized into [0, 360).
    pub fn from_longitude(longitude: f64) -> Rashi {
        let normalized = longitude.rem_euclid(360.0);
        let index = (normalized / 30.0).floor() as usize;
        ALL_RASHIS[index.min(11)]
    }

    pub const fn name(self) -> &'static str {
        match self {
            Rashi::Mesha => "Mesha",
            Rashi::Vrishabha => "Vrishabha",
            Rashi::Mithuna => "Mithuna",
            Rashi::Karka => "Karka",
            Rashi::Simha => "Simha",
            Rashi::Kanya => "Kanya",
            Rashi::Tula => "Tula",
            Rashi::Vrishchika => "Vrishchika",
            Rashi::Dhanu => "Dhanu",
            Rashi::Makara => "Makara",
            Rashi::Kumbha => "Kumbha",
            Rashi::Meena => "Meena",
        }
    }

    /// Ruling graha of the sign.
    pub const fn lord(self) -> Graha {
        match self {
            Rashi::Mesha => Graha::Mars,
            Rashi::Vrishabha => Graha::Venus,
            Rashi::Mithuna => Graha::Mercury,
            Rashi::Karka => Graha::Moon,
            Rashi::Simha => Graha::Sun,
            Rashi::Kanya => Graha::Mercury,
            Rashi::Tula => Graha::Venus,
            Rashi::Vrishchika => Graha::Mars,
            Rashi::Dhanu => Graha::Jupiter,
            Rashi::Makara => Graha::Saturn,
            Rashi::Kumbha => Graha::Saturn,
            Rashi::Meena => Graha::Jupiter,
        }
    }

    /// 0-based zodiacal index (Mesha = 0 .. Meena = 11).
    pub const fn index(self) -> usize {
        match self {
            Rashi::Mesha => 0,
            Rashi::Vrishabha => 1,
            Rashi::Mithuna => 2,
            Rashi::Karka => 3,
            Rashi::Simha => 4,
            Rashi::Kanya => 5,
            Rashi::Tula => 6,
            Rashi::Vrishchika => 7,
            Rashi::Dhanu => 8,
            Rashi::Makara => 9,
            Rashi::Kumbha => 10,
            Rashi::Meena => 11,
        }
    }
}

impl fmt::Display for Rashi {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ---------------------------
// ## Nakshatras
// ---------------------------

/// Span of one nakshatra: 360/27 degrees.
pub const NAKSHATRA_SPAN: f64 = 360.0 / 27.0;

/// The 27 lunar mansions, each a 360/27 degree bin of ecliptic longitude.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Nakshatra {
    Ashwini,
    Bharani,
    Krittika,
    Rohini,
    Mrigashira,
    Ardra,
    Punarvasu,
    Pushya,
    Ashlesha,
    Magha,
    PurvaPhalguni,
    UttaraPhalguni,
    Hasta,
    Chitra,
    Swati,
    Vishakha,
    Anuradha,
    Jyeshtha,
    Mula,
    PurvaAshadha,
    UttaraAshadha,
    Shravana,
    Dhanishta,
    Shatabhisha,
    PurvaBhadrapada,
    UttaraBhadrapada,
    Revati,
}

/// All 27 nakshatras in order (Ashwini = 0 .. Revati = 26).
pub const ALL_NAKSHATRAS: [Nakshatra; 27] = [
    Nakshatra::Ashwini,
    Nakshatra::Bharani,
    Nakshatra::Krittika,
    Nakshatra::Rohini,
    Nakshatra::Mrigashira,
    Nakshatra::Ardra,
    Nakshatra::Punarvasu,
    Nakshatra::Pushya,
    Nakshatra::Ashlesha,
    Nakshatra::Magha,
    Nakshatra::PurvaPhalguni,
    Nakshatra::UttaraPhalguni,
    Nakshatra::Hasta,
    Nakshatra::Chitra,
    Nakshatra::Swati,
    Nakshatra::Vishakha,
    Nakshatra::Anuradha,
    Nakshatra::Jyeshtha,
    Nakshatra::Mula,
    Nakshatra::PurvaAshadha,
    Nakshatra::UttaraAshadha,
    Nakshatra::Shravana,
    Nakshatra::Dhanishta,
    Nakshatra::Shatabhisha,
    Nakshatra::PurvaBhadrapada,
    Nakshatra::UttaraBhadrapada,
    Nakshatra::Revati,
];

/// Nakshatra lords repeat this nine-graha cycle three times across the 27
/// mansions.
const NAKSHATRA_LORD_CYCLE: [Graha; 9] = [
    Graha::Ketu,
    Graha::Venus,
    Graha::Sun,
    Graha::Moon,
    Graha::Mars,
    Graha::Rahu,
    Graha::Jupiter,
    Graha::Saturn,
    Graha::Mercury,
];

impl Nakshatra {
    /// Classify a longitude into its 360/27 degree bin. Input may be any
    /// finite value; it is first normalized into [0, 360).
    pub fn from_longitude(longitude: f64) -> Nakshatra {
        let normalized = longitude.rem_euclid(360.0);
        let index = (normalized / NAKSHATRA_SPAN).floor() as usize;
        ALL_NAKSHATRAS[index.min(26)]
    }

    pub const fn name(self) -> &'static str {
        match self {
            Nakshatra::Ashwini => "Ashwini",
            Nakshatra::Bharani => "Bharani",
            Nakshatra::Krittika => "Krittika",
            Nakshatra::Rohini => "Rohini",
            Nakshatra::Mrigashira => "Mrigashira",
            Nakshatra::Ardra => "Ardra",
            Nakshatra::Punarvasu => "Punarvasu",
            Nakshatra::Pushya => "Pushya",
            Nakshatra::Ashlesha => "Ashlesha",
            Nakshatra::Magha => "Magha",
            Nakshatra::PurvaPhalguni => "Purva Phalguni",
            Nakshatra::UttaraPhalguni => "Uttara Phalguni",
            Nakshatra::Hasta => "Hasta",
            Nakshatra::Chitra => "Chitra",
            Nakshatra::Swati => "Swati",
            Nakshatra::Vishakha => "Vishakha",
            Nakshatra::Anuradha => "Anuradha",
            Nakshatra::Jyeshtha => "Jyeshtha",
            Nakshatra::Mula => "Mula",
            Nakshatra::PurvaAshadha => "Purva Ashadha",
            Nakshatra::UttaraAshadha => "Uttara Ashadha",
            Nakshatra::Shravana => "Shravana",
            Nakshatra::Dhanishta => "Dhanishta",
            Nakshatra::Shatabhisha => "Shatabhisha",
            Nakshatra::PurvaBhadrapada => "Purva Bhadrapada",
            Nakshatra::UttaraBhadrapada => "Uttara Bhadrapada",
            Nakshatra::Revati => "Revati",
        }
    }

    /// Ruling graha, from the repeating nine-lord cycle.
    pub fn lord(self) -> Graha {
        NAKSHATRA_LORD_CYCLE[self.index() % 9]
    }

    /// 0-based index (Ashwini = 0 .. Revati = 26).
    pub const fn index(self) -> usize {
        match self {
            Nakshatra::Ashwini => 0,
            Nakshatra::Bharani => 1,
            Nakshatra::Krittika => 2,
            Nakshatra::Rohini => 3,
            Nakshatra::Mrigashira => 4,
            Nakshatra::Ardra => 5,
            Nakshatra::Punarvasu => 6,
            Nakshatra::Pushya => 7,
            Nakshatra::Ashlesha => 8,
            Nakshatra::Magha => 9,
            Nakshatra::PurvaPhalguni => 10,
            Nakshatra::UttaraPhalguni => 11,
            Nakshatra::Hasta => 12,
            Nakshatra::Chitra => 13,
            Nakshatra::Swati => 14,
            Nakshatra::Vishakha => 15,
            Nakshatra::Anuradha => 16,
            Nakshatra::Jyeshtha => 17,
            Nakshatra::Mula => 18,
            Nakshatra::PurvaAshadha => 19,
            Nakshatra::UttaraAshadha => 20,
            Nakshatra::Shravana => 21,
            Nakshatra::Dhanishta => 22,
            Nakshatra::Shatabhisha => 23,
            Nakshatra::PurvaBhadrapada => 24,
            Nakshatra::UttaraBhadrapada => 25,
            Nakshatra::Revati => 26,
        }
    }
}

impl fmt::Display for Nakshatra {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ---------------------------
// ## Birth Data
// ---------------------------

/// Geographic observer site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Location {
            latitude,
            longitude,
        }
    }

    pub fn mumbai() -> Self {
        Location {
            latitude: 19.0760,
            longitude: 72.8777,
        }
    }
}

/// Parsed birth moment, minute precision, local clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BirthDetails {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl BirthDetails {
    /// Parse `YYYY-MM-DD` and `HH:MM` strings. Either failing makes the
    /// whole chart computation fail for that partner.
    pub fn parse(date: &str, time: &str) -> Result<Self, EngineError> {
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|e| EngineError::InvalidDate(format!("{date:?}: {e}")))?;
        let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
            .map_err(|e| EngineError::InvalidTime(format!("{time:?}: {e}")))?;
        Ok(BirthDetails { date, time })
    }
}

// ---------------------------
// ## Chart
// ---------------------------

/// A cast chart: the sidereal longitude of the reference body and its
/// rashi/nakshatra classification. Longitude is always in [0, 360), so it
/// falls in exactly one bin of each partition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chart {
    pub longitude: f64,
    pub rashi: Rashi,
    pub nakshatra: Nakshatra,
    pub source: PositionSource,
}

impl Chart {
    pub fn from_position(position: SiderealPosition) -> Chart {
        Chart {
            longitude: position.degrees,
            rashi: Rashi::from_longitude(position.degrees),
            nakshatra: Nakshatra::from_longitude(position.degrees),
            source: position.source,
        }
    }
}

/// Cast a chart from raw request fields: parse the birth moment, resolve
/// the place, compute the sidereal position and classify it.
///
/// Place resolution and the position computation never fail; only a
/// malformed date or time is an error.
pub fn cast_chart(
    date: &str,
    time: &str,
    place: &str,
    body: ReferenceBody,
) -> Result<Chart, EngineError> {
    let details = BirthDetails::parse(date, time)?;
    let resolution = geocode::resolve(place);
    let position = ephemeris::sidereal_position(details, resolution.location, body);
    Ok(Chart::from_position(position))
}

// ---------------------------
// ## Error Handling
// ---------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    InvalidDate(String),
    InvalidTime(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidDate(msg) => write!(f, "invalid birth date {msg}"),
            EngineError::InvalidTime(msg) => write!(f, "invalid birth time {msg}"),
        }
    }
}

impl Error for EngineError {}
