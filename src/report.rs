//! Response shapes and report assembly.
//!
//! Every payload the service emits is an explicit struct; the enhanced
//! narrative is the one place free-form collaborator output enters, and it
//! is held behind a validated outcome enum rather than merged blindly.

use crate::guna::{self, CompatibilityLevel, GunaScores, MAX_TOTAL};
use crate::Chart;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------
// ## Request Shapes
// ---------------------------

/// One partner's raw request fields. `name` only matters to the narrative
/// report; the engine ignores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub date: String,
    pub time: String,
    pub place: String,
}

impl PartnerInput {
    /// Display name for prompts, with the generic fallback.
    pub fn display_name(&self, fallback: &'static str) -> &str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or(fallback)
    }
}

/// Body of both compatibility endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityRequest {
    pub partner1: PartnerInput,
    pub partner2: PartnerInput,
}

// ---------------------------
// ## Deterministic Report
// ---------------------------

/// Chart fields as they appear on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSummary {
    pub longitude: f64,
    pub nakshatra: String,
    pub nakshatra_lord: String,
    pub rashi: String,
    pub rashi_lord: String,
}

impl ChartSummary {
    pub fn from_chart(chart: &Chart) -> Self {
        ChartSummary {
            longitude: chart.longitude,
            nakshatra: chart.nakshatra.name().to_string(),
            nakshatra_lord: chart.nakshatra.lord().name().to_string(),
            rashi: chart.rashi.name().to_string(),
            rashi_lord: chart.rashi.lord().name().to_string(),
        }
    }
}

/// One kuta line of the breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GunaScore {
    pub score: u8,
    pub max: u8,
    pub description: String,
}

impl GunaScore {
    fn new(score: u8, max: u8, description: &str) -> Self {
        GunaScore {
            score,
            max,
            description: description.to_string(),
        }
    }
}

/// The eight kutas in traditional order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GunaBreakdown {
    pub varna: GunaScore,
    pub vashya: GunaScore,
    pub tara: GunaScore,
    pub yoni: GunaScore,
    pub graha_maitri: GunaScore,
    pub gana: GunaScore,
    pub bhakoot: GunaScore,
    pub nadi: GunaScore,
}

impl GunaBreakdown {
    pub fn from_scores(scores: &GunaScores) -> Self {
        GunaBreakdown {
            varna: GunaScore::new(scores.varna, 1, "Social compatibility and class harmony"),
            vashya: GunaScore::new(scores.vashya, 2, "Control and dominance compatibility"),
            tara: GunaScore::new(scores.tara, 3, "Star compatibility and destiny alignment"),
            yoni: GunaScore::new(scores.yoni, 4, "Sexual compatibility and physical harmony"),
            graha_maitri: GunaScore::new(
                scores.graha_maitri,
                5,
                "Planetary friendship and mental compatibility",
            ),
            gana: GunaScore::new(scores.gana, 6, "Temperament and nature compatibility"),
            bhakoot: GunaScore::new(scores.bhakoot, 7, "Love and affection compatibility"),
            nadi: GunaScore::new(scores.nadi, 8, "Health and progeny compatibility"),
        }
    }
}

/// The full deterministic report for one chart pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    pub gun_milan_score: u8,
    pub max_possible_score: u8,
    pub compatibility_level: String,
    pub breakdown: GunaBreakdown,
    pub remarks: String,
    pub issues_detected: Vec<String>,
    pub spiritual_alignment_score: u8,
    pub partner1_chart: ChartSummary,
    pub partner2_chart: ChartSummary,
}

impl CompatibilityReport {
    /// Pure aggregation over two cast charts.
    pub fn assemble(chart1: &Chart, chart2: &Chart) -> Self {
        let scores = guna::score(chart1, chart2);
        let total = scores.total();
        let level = CompatibilityLevel::from_total(total);
        CompatibilityReport {
            gun_milan_score: total,
            max_possible_score: MAX_TOTAL,
            compatibility_level: level.label().to_string(),
            breakdown: GunaBreakdown::from_scores(&scores),
            remarks: level.remarks().to_string(),
            issues_detected: guna::detect_issues(&scores)
                .into_iter()
                .map(str::to_string)
                .collect(),
            spiritual_alignment_score: guna::spiritual_alignment(
                chart1.nakshatra,
                chart2.nakshatra,
            ),
            partner1_chart: ChartSummary::from_chart(chart1),
            partner2_chart: ChartSummary::from_chart(chart2),
        }
    }
}

// ---------------------------
// ## Enhanced Report
// ---------------------------

/// Everything handed to the narrative collaborator: the deterministic
/// report plus the raw partner details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedVedicData {
    #[serde(flatten)]
    pub report: CompatibilityReport,
    pub partner1_details: PartnerInput,
    pub partner2_details: PartnerInput,
}

/// Body of the enhanced endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EnhancedResponse {
    pub vedic_data: EnhancedVedicData,
    pub enhanced_report: EnhancedReport,
}

/// Outcome of the collaborator call: either a narrative that parsed as a
/// JSON object, or a structured error carrying whatever text came back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EnhancedReport {
    Narrative(NarrativeReport),
    Failed {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        raw_content: Option<String>,
    },
}

impl EnhancedReport {
    pub fn failed(error: impl Into<String>) -> Self {
        EnhancedReport::Failed {
            error: error.into(),
            raw_content: None,
        }
    }

    pub fn failed_with_content(error: impl Into<String>, raw: impl Into<String>) -> Self {
        EnhancedReport::Failed {
            error: error.into(),
            raw_content: Some(raw.into()),
        }
    }
}

/// The documented narrative schema. All fields are optional — the
/// collaborator is not trusted to fill every one — and unknown fields are
/// kept rather than dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NarrativeReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatibility_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cosmic_connection_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub love_story_theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spiritual_growth_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotional_bond_analysis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub love_languages_revealed: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sacred_rituals: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub daily_love_practices: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationship_strengths: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub growth_opportunities: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sacred_affirmations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personalized_mantra: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub love_enhancement_tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub immediate_action_steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cosmic_gifts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_mission: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Nakshatra, PositionSource, Rashi};

    fn chart(rashi: Rashi, nakshatra: Nakshatra) -> Chart {
        Chart {
            longitude: rashi.index() as f64 * 30.0 + 5.0,
            rashi,
            nakshatra,
            source: PositionSource::Analytic,
        }
    }

    #[test]
    fn breakdown_maxes_are_the_fixed_ladder() {
        let c1 = chart(Rashi::Mesha, Nakshatra::Ashwini);
        let c2 = chart(Rashi::Tula, Nakshatra::Swati);
        let report = CompatibilityReport::assemble(&c1, &c2);
        let b = &report.breakdown;
        assert_eq!(
            [
                b.varna.max,
                b.vashya.max,
                b.tara.max,
                b.yoni.max,
                b.graha_maitri.max,
                b.gana.max,
                b.bhakoot.max,
                b.nadi.max
            ],
            [1, 2, 3, 4, 5, 6, 7, 8]
        );
        assert_eq!(report.max_possible_score, 36);
    }

    #[test]
    fn breakdown_sums_to_total() {
        let c1 = chart(Rashi::Karka, Nakshatra::Pushya);
        let c2 = chart(Rashi::Makara, Nakshatra::Shravana);
        let report = CompatibilityReport::assemble(&c1, &c2);
        let b = &report.breakdown;
        let sum = b.varna.score
            + b.vashya.score
            + b.tara.score
            + b.yoni.score
            + b.graha_maitri.score
            + b.bhakoot.score
            + b.gana.score
            + b.nadi.score;
        assert_eq!(sum, report.gun_milan_score);
    }

    #[test]
    fn report_serializes_with_wire_field_names() {
        let c1 = chart(Rashi::Mesha, Nakshatra::Ashwini);
        let report = CompatibilityReport::assemble(&c1, &c1);
        let value = serde_json::to_value(&report).expect("serializable");
        for key in [
            "gun_milan_score",
            "max_possible_score",
            "compatibility_level",
            "breakdown",
            "remarks",
            "issues_detected",
            "spiritual_alignment_score",
            "partner1_chart",
            "partner2_chart",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        let breakdown = value.get("breakdown").expect("breakdown present");
        for key in [
            "varna",
            "vashya",
            "tara",
            "yoni",
            "graha_maitri",
            "gana",
            "bhakoot",
            "nadi",
        ] {
            assert!(breakdown.get(key).is_some(), "missing guna {key}");
        }
    }

    #[test]
    fn chart_summary_uses_names_not_indices() {
        let c = chart(Rashi::Dhanu, Nakshatra::Mula);
        let summary = ChartSummary::from_chart(&c);
        assert_eq!(summary.rashi, "Dhanu");
        assert_eq!(summary.rashi_lord, "Jupiter");
        assert_eq!(summary.nakshatra, "Mula");
        assert_eq!(summary.nakshatra_lord, "Ketu");
    }

    #[test]
    fn failed_outcome_serializes_error_shape() {
        let failed = EnhancedReport::failed_with_content("did not parse", "not json");
        let value = serde_json::to_value(&failed).expect("serializable");
        assert_eq!(value["error"], "did not parse");
        assert_eq!(value["raw_content"], "not json");
        let bare = EnhancedReport::failed("no key");
        let value = serde_json::to_value(&bare).expect("serializable");
        assert!(value.get("raw_content").is_none());
    }

    #[test]
    fn narrative_accepts_partial_and_unknown_fields() {
        let narrative: NarrativeReport = serde_json::from_str(
            r#"{"cosmic_connection_summary": "two stars", "surprise": 7}"#,
        )
        .expect("lenient parse");
        assert_eq!(
            narrative.cosmic_connection_summary.as_deref(),
            Some("two stars")
        );
        assert!(narrative.sacred_rituals.is_empty());
        assert_eq!(narrative.extra["surprise"], 7);
    }

    #[test]
    fn display_name_falls_back() {
        let p = PartnerInput {
            name: None,
            date: "1990-01-01".into(),
            time: "12:00".into(),
            place: "mumbai".into(),
        };
        assert_eq!(p.display_name("Partner 1"), "Partner 1");
        let named = PartnerInput {
            name: Some("Asha".into()),
            ..p
        };
        assert_eq!(named.display_name("Partner 1"), "Asha");
    }
}
