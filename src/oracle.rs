//! Client for the narrative text-generation collaborator.
//!
//! The collaborator is fallible and untrusted: a missing key, a non-2xx
//! status, a timeout, or a body that is not a JSON object all degrade to
//! `EnhancedReport::Failed` without touching the deterministic report the
//! caller already holds. One shot per request; the call has no side
//! effects, so there is nothing to deduplicate.

use crate::report::{EnhancedReport, EnhancedVedicData, NarrativeReport};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::warn;

/// Default chat-completions endpoint.
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default model name.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Outbound call budget.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const SYSTEM_PROMPT: &str = "You are a master Vedic astrologer with decades of experience in \
relationship compatibility analysis. You have deep knowledge of Guna Milan, nakshatra matching \
and spiritual relationship dynamics. Generate accurate, comprehensive and highly personalized \
compatibility reports from the provided birth details and calculations. Return ONLY valid JSON, \
no markdown or extra text.";

pub struct Oracle {
    http: reqwest::Client,
    api_key: Option<String>,
    api_url: String,
    model: String,
}

impl Oracle {
    pub fn new(api_key: Option<String>, api_url: String, model: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Oracle {
            http,
            api_key,
            api_url,
            model,
        }
    }

    /// Ask the collaborator for a narrative report. Never errors; every
    /// failure mode collapses into `EnhancedReport::Failed`.
    pub async fn narrative_report(&self, data: &EnhancedVedicData) -> EnhancedReport {
        let key = match self.api_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => key,
            None => return EnhancedReport::failed("text service API key not configured"),
        };

        let prompt = match build_prompt(data) {
            Ok(prompt) => prompt,
            Err(e) => return EnhancedReport::failed(format!("failed to serialize report: {e}")),
        };

        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ],
            "temperature": 0.8,
            "max_tokens": 4000,
            "top_p": 0.9,
        });

        let response = match self
            .http
            .post(&self.api_url)
            .bearer_auth(key)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "text service request failed");
                return EnhancedReport::failed(format!("text service request failed: {e}"));
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "text service returned an error status");
            return EnhancedReport::failed(format!("text service error: {status}"));
        }

        let body: ChatCompletion = match response.json().await {
            Ok(body) => body,
            Err(e) => return EnhancedReport::failed(format!("malformed text service body: {e}")),
        };
        let content = match body.choices.first() {
            Some(choice) => choice.message.content.as_str(),
            None => return EnhancedReport::failed("text service returned no choices"),
        };

        parse_narrative(content)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// User prompt: partner details, the serialized deterministic report, and
/// the output contract.
fn build_prompt(data: &EnhancedVedicData) -> Result<String, serde_json::Error> {
    let name1 = data.partner1_details.display_name("Partner 1");
    let name2 = data.partner2_details.display_name("Partner 2");
    let serialized = serde_json::to_string_pretty(data)?;
    Ok(format!(
        "You are a spiritual relationship coach and Vedic wisdom expert. Generate a \
transformative, deeply personalized relationship enhancement report for this couple.\n\
\n\
PARTNER DETAILS:\n\
{name1}: born {d1} at {t1} in {p1}\n\
{name2}: born {d2} at {t2} in {p2}\n\
\n\
VEDIC CALCULATIONS:\n\
{serialized}\n\
\n\
Use their actual names throughout, present ancient wisdom in contemporary language, and \
focus on love, connection and growth rather than raw astrology. Return ONLY a valid JSON \
object (no markdown fences) with these fields: compatibility_score (number 0-100), \
cosmic_connection_summary, love_story_theme, spiritual_growth_path, \
emotional_bond_analysis, love_languages_revealed, sacred_rituals (list), \
daily_love_practices (list), relationship_strengths (list), growth_opportunities (list), \
sacred_affirmations (list), personalized_mantra, love_enhancement_tools (list), \
immediate_action_steps (list), cosmic_gifts, relationship_mission.",
        d1 = data.partner1_details.date,
        t1 = data.partner1_details.time,
        p1 = data.partner1_details.place,
        d2 = data.partner2_details.date,
        t2 = data.partner2_details.time,
        p2 = data.partner2_details.place,
    ))
}

/// Strip a leading/trailing markdown code fence if present.
pub fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

/// Validate collaborator text into the narrative schema. Anything that is
/// not a JSON object is surfaced as a failure carrying the raw text.
pub fn parse_narrative(content: &str) -> EnhancedReport {
    let cleaned = strip_code_fences(content);
    match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Object(fields)) => {
            match serde_json::from_value::<NarrativeReport>(Value::Object(fields)) {
                Ok(narrative) => EnhancedReport::Narrative(narrative),
                Err(e) => EnhancedReport::failed_with_content(
                    format!("narrative did not match schema: {e}"),
                    content,
                ),
            }
        }
        Ok(_) => EnhancedReport::failed_with_content(
            "text service response is not a JSON object",
            content,
        ),
        Err(e) => EnhancedReport::failed_with_content(
            format!("failed to parse text service response: {e}"),
            content,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{CompatibilityReport, PartnerInput};
    use crate::{cast_chart, ReferenceBody};

    fn sample_data() -> EnhancedVedicData {
        let p1 = PartnerInput {
            name: Some("Asha".into()),
            date: "1990-01-01".into(),
            time: "12:00".into(),
            place: "mumbai".into(),
        };
        let p2 = PartnerInput {
            name: None,
            date: "1992-05-15".into(),
            time: "18:30".into(),
            place: "delhi".into(),
        };
        let c1 = cast_chart(&p1.date, &p1.time, &p1.place, ReferenceBody::Moon)
            .expect("valid input");
        let c2 = cast_chart(&p2.date, &p2.time, &p2.place, ReferenceBody::Moon)
            .expect("valid input");
        EnhancedVedicData {
            report: CompatibilityReport::assemble(&c1, &c2),
            partner1_details: p1,
            partner2_details: p2,
        }
    }

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn object_content_parses_into_narrative() {
        let outcome = parse_narrative("```json\n{\"love_story_theme\": \"Dance of Light\"}\n```");
        match outcome {
            EnhancedReport::Narrative(n) => {
                assert_eq!(n.love_story_theme.as_deref(), Some("Dance of Light"));
            }
            EnhancedReport::Failed { error, .. } => panic!("unexpected failure: {error}"),
        }
    }

    #[test]
    fn non_object_content_is_rejected_with_raw_text() {
        for content in ["just some prose", "[1, 2, 3]", "\"a string\""] {
            match parse_narrative(content) {
                EnhancedReport::Failed { raw_content, .. } => {
                    assert_eq!(raw_content.as_deref(), Some(content));
                }
                EnhancedReport::Narrative(_) => panic!("{content:?} should not parse"),
            }
        }
    }

    #[test]
    fn prompt_embeds_names_and_report() {
        let data = sample_data();
        let prompt = build_prompt(&data).expect("serializable");
        assert!(prompt.contains("Asha"));
        assert!(prompt.contains("Partner 2"));
        assert!(prompt.contains("gun_milan_score"));
        assert!(prompt.contains("1992-05-15"));
    }

    #[tokio::test]
    async fn missing_key_fails_without_a_request() {
        let oracle = Oracle::new(None, DEFAULT_API_URL.to_string(), DEFAULT_MODEL.to_string());
        match oracle.narrative_report(&sample_data()).await {
            EnhancedReport::Failed { error, .. } => {
                assert!(error.contains("not configured"), "got {error}");
            }
            EnhancedReport::Narrative(_) => panic!("must not succeed without a key"),
        }
    }

    #[tokio::test]
    async fn empty_key_counts_as_missing() {
        let oracle = Oracle::new(
            Some(String::new()),
            DEFAULT_API_URL.to_string(),
            DEFAULT_MODEL.to_string(),
        );
        assert!(matches!(
            oracle.narrative_report(&sample_data()).await,
            EnhancedReport::Failed { .. }
        ));
    }
}
