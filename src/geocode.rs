//! Place-name resolution against a static city table.
//!
//! The table covers the Indian cities the service historically served,
//! sorted by name. Lookup is exact match first, then substring containment
//! in either direction taking the first hit in ascending key order, then a
//! fixed Mumbai default. Resolution never fails; the kind of match is
//! reported so fallbacks stay visible in diagnostics.

use crate::Location;
use tracing::warn;

/// How a place name was resolved.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Partial,
    Default,
}

/// Resolved coordinates plus the kind of match that produced them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub location: Location,
    pub matched: MatchKind,
}

/// City table, sorted by name. Ascending order is what makes the partial
/// match deterministic, so `cities_sorted` below is asserted in tests.
const CITIES: &[(&str, f64, f64)] = &[
    ("agra", 27.1767, 78.0081),
    ("ahmedabad", 23.0225, 72.5714),
    ("akola", 20.7096, 77.0021),
    ("aligarh", 27.8974, 78.0880),
    ("allahabad", 25.4358, 81.8463),
    ("ambattur", 13.1143, 80.1547),
    ("amravati", 20.9374, 77.7796),
    ("amritsar", 31.6340, 74.8723),
    ("asansol", 23.6889, 86.9661),
    ("aurangabad", 19.8762, 75.3433),
    ("bangalore", 12.9716, 77.5946),
    ("bareilly", 28.3670, 79.4304),
    ("belgaum", 15.8497, 74.4977),
    ("bellary", 15.1394, 76.9214),
    ("bhagalpur", 25.2445, 87.0104),
    ("bhavnagar", 21.7645, 72.1519),
    ("bhayandar", 19.2969, 72.8500),
    ("bhilai", 21.2094, 81.4285),
    ("bhiwandi", 19.2969, 73.0625),
    ("bhopal", 23.2599, 77.4126),
    ("bhubaneswar", 20.2961, 85.8245),
    ("bikaner", 28.0229, 73.3119),
    ("chandigarh", 30.7333, 76.7794),
    ("chennai", 13.0827, 80.2707),
    ("coimbatore", 11.0168, 76.9558),
    ("cuttack", 20.4625, 85.8830),
    ("dehradun", 30.3165, 78.0322),
    ("delhi", 28.7041, 77.1025),
    ("dhanbad", 23.7957, 86.4304),
    ("durgapur", 23.5204, 87.3119),
    ("faridabad", 28.4089, 77.3178),
    ("firozabad", 27.1591, 78.3958),
    ("gaya", 24.7914, 85.0002),
    ("ghaziabad", 28.6692, 77.4538),
    ("gorakhpur", 26.7606, 83.3732),
    ("greater noida", 28.4744, 77.5040),
    ("gulbarga", 17.3297, 76.8343),
    ("guntur", 16.2991, 80.4575),
    ("gurgaon", 28.4595, 77.0266),
    ("guwahati", 26.1445, 91.7362),
    ("gwalior", 26.2183, 78.1828),
    ("howrah", 22.5958, 88.2636),
    ("hubli", 15.3647, 75.1240),
    ("hyderabad", 17.3850, 78.4867),
    ("indore", 22.7196, 75.8577),
    ("jabalpur", 23.1815, 79.9864),
    ("jaipur", 26.9124, 75.7873),
    ("jalandhar", 31.3260, 75.5762),
    ("jammu", 32.7266, 74.8570),
    ("jamnagar", 22.4707, 70.0577),
    ("jamshedpur", 22.8046, 86.2029),
    ("jodhpur", 26.2389, 73.0243),
    ("kalyan", 19.2433, 73.1355),
    ("kanpur", 26.4499, 80.3319),
    ("kochi", 9.9312, 76.2673),
    ("kolkata", 22.5726, 88.3639),
    ("kota", 25.2138, 75.8648),
    ("loni", 28.7515, 77.2889),
    ("lucknow", 26.8467, 80.9462),
    ("ludhiana", 30.9010, 75.8573),
    ("madurai", 9.9252, 78.1198),
    ("malegaon", 20.5609, 74.5250),
    ("mangalore", 12.9716, 74.8631),
    ("meerut", 28.9845, 77.7064),
    ("moradabad", 28.8389, 78.7738),
    ("morvi", 22.8173, 70.8372),
    ("mumbai", 19.0760, 72.8777),
    ("mysore", 12.2958, 76.6394),
    ("nagpur", 21.1458, 79.0882),
    ("nashik", 19.9975, 73.7898),
    ("nellore", 14.4426, 79.9865),
    ("noida", 28.5355, 77.3910),
    ("patna", 25.5941, 85.1376),
    ("pune", 18.5204, 73.8567),
    ("raipur", 21.2514, 81.6296),
    ("rajkot", 22.3039, 70.8022),
    ("ranchi", 23.3441, 85.3096),
    ("rourkela", 22.2492, 84.8828),
    ("saharanpur", 29.9675, 77.5451),
    ("salem", 11.6643, 78.1460),
    ("sangli", 16.8524, 74.5815),
    ("solapur", 17.6599, 75.9064),
    ("srinagar", 34.0837, 74.7973),
    ("surat", 21.1702, 72.8311),
    ("thane", 19.2183, 72.9781),
    ("tiruchirappalli", 10.7905, 78.7047),
    ("tirunelveli", 8.7139, 77.7567),
    ("tiruppur", 11.1085, 77.3411),
    ("ujjain", 23.1765, 75.7885),
    ("vadodara", 22.3072, 73.1812),
    ("vasai", 19.4259, 72.8225),
    ("vijayawada", 16.5062, 80.6480),
    ("visakhapatnam", 17.6868, 83.2185),
    ("warangal", 17.9689, 79.5941),
];

/// Lowercase, trim, and strip the qualifiers people append to city names.
fn normalize(place: &str) -> String {
    place
        .to_lowercase()
        .replace(", india", "")
        .replace(" city", "")
        .replace(" town", "")
        .trim()
        .to_string()
}

/// Resolve a free-text place name to coordinates. Never fails.
pub fn resolve(place: &str) -> Resolution {
    let needle = normalize(place);

    if let Ok(i) = CITIES.binary_search_by(|(name, _, _)| (*name).cmp(needle.as_str())) {
        let (_, lat, lon) = CITIES[i];
        return Resolution {
            location: Location::new(lat, lon),
            matched: MatchKind::Exact,
        };
    }

    if !needle.is_empty() {
        // First containment hit in ascending key order.
        for (name, lat, lon) in CITIES {
            if name.contains(needle.as_str()) || needle.contains(name) {
                return Resolution {
                    location: Location::new(*lat, *lon),
                    matched: MatchKind::Partial,
                };
            }
        }
    }

    warn!(place, "place not found in city table, defaulting to mumbai");
    Resolution {
        location: Location::mumbai(),
        matched: MatchKind::Default,
    }
}
