//! Narrative summary generation.
//!
//! The audit result stands on its own; the LLM only adds an executive
//! summary and suggested follow-up checks on top of the detector's
//! grounding data. The collaborator is allowed to be unavailable or to
//! return malformed output: a best-effort JSON object is recovered by
//! brace matching, and failing that the whole response is treated as an
//! opaque narrative. A deterministic count-based fallback covers the
//! unavailable case.

mod config;

pub use config::{NarrativeConfig, NarrativeProvider};

use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::{CrawlContext, DetectionResult, Problem};

/// A suggested follow-up check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextCheck {
    pub title: String,
    pub description: String,
}

/// Narrative text layered over the deterministic findings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditNarrative {
    pub executive_summary: String,
    #[serde(default)]
    pub next_checks: Vec<NextCheck>,
}

/// Condensed problem summary handed to the model as grounding.
#[derive(Debug, Clone, Serialize)]
pub struct ProblemDigest {
    pub title: String,
    pub severity: String,
    pub affected_urls: usize,
    pub description: String,
}

impl ProblemDigest {
    pub fn from_problem(problem: &Problem) -> Self {
        Self {
            title: problem.title.clone(),
            severity: problem.severity.as_str().to_string(),
            affected_urls: problem.urls.len(),
            description: problem.description.clone(),
        }
    }
}

/// Errors that can occur during narrative generation.
#[derive(Debug, thiserror::Error)]
pub enum NarrativeError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("narrative generation is disabled")]
    Disabled,
}

/// Client for the narrative-generation collaborator.
pub struct NarrativeClient {
    config: NarrativeConfig,
    client: Client,
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

/// OpenAI-compatible chat completion request.
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl NarrativeClient {
    /// Create a new narrative client with the given configuration.
    pub fn new(config: NarrativeConfig) -> Result<Self, NarrativeError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| NarrativeError::Connection(e.to_string()))?;
        Ok(Self { config, client })
    }

    /// Generate the narrative for one audit run.
    pub async fn generate(
        &self,
        context: &CrawlContext,
        problems: &[ProblemDigest],
    ) -> Result<AuditNarrative, NarrativeError> {
        if !self.config.enabled {
            return Err(NarrativeError::Disabled);
        }

        let prompt = self.build_prompt(context, problems)?;
        debug!("requesting narrative for {}", context.domain);

        let raw = match self.config.provider {
            NarrativeProvider::Ollama => self.call_ollama(&prompt).await?,
            NarrativeProvider::OpenAI => self.call_openai(&prompt).await?,
        };
        if raw.trim().is_empty() {
            return Err(NarrativeError::Parse("empty response".to_string()));
        }

        info!("narrative generated ({} chars)", raw.len());
        Ok(parse_narrative(&raw))
    }

    fn build_prompt(
        &self,
        context: &CrawlContext,
        problems: &[ProblemDigest],
    ) -> Result<String, NarrativeError> {
        let grounding = serde_json::json!({
            "domain": context.domain,
            "audit_date": context.audit_date,
            "discovery_method": context.discovery.describe(),
            "urls_discovered": context.urls_discovered,
            "urls_analyzed": context.urls_analyzed,
            "crawl_summary": context.summary,
            "examples": context.examples,
            "problems": problems,
        });
        let mut grounding = serde_json::to_string_pretty(&grounding)
            .map_err(|e| NarrativeError::Parse(e.to_string()))?;
        if grounding.len() > self.config.max_context_chars {
            let mut end = self.config.max_context_chars;
            while end > 0 && !grounding.is_char_boundary(end) {
                end -= 1;
            }
            grounding.truncate(end);
        }

        Ok(format!(
            r#"You are a senior SEO consultant writing the narrative layer of an audit report.
All findings below were produced by deterministic checks; do not invent data,
do not add numbers that are not present, and do not include any HTML.

Return ONLY a JSON object with exactly these keys:
  "executive_summary": a 3-5 sentence plain-text summary of the site's on-page health
  "next_checks": an array of up to 5 objects, each with "title" and "description",
  suggesting what to verify after the listed fixes are made

AUDIT_DATA:
{grounding}"#
        ))
    }

    async fn call_ollama(&self, prompt: &str) -> Result<String, NarrativeError> {
        let request = OllamaRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        };

        let url = format!("{}/api/generate", self.config.endpoint.trim_end_matches('/'));
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| NarrativeError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(NarrativeError::Api(format!("HTTP {status}: {body}")));
        }

        let parsed: OllamaResponse = resp
            .json()
            .await
            .map_err(|e| NarrativeError::Parse(e.to_string()))?;
        Ok(parsed.response)
    }

    async fn call_openai(&self, prompt: &str) -> Result<String, NarrativeError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let url = format!(
            "{}/v1/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        );
        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| NarrativeError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(NarrativeError::Api(format!("HTTP {status}: {body}")));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| NarrativeError::Parse(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| NarrativeError::Parse("no completion choices".to_string()))
    }
}

/// Interpret a raw model response as a narrative.
///
/// Tries the whole (fence-stripped) response as JSON, then a brace-matched
/// object embedded in surrounding prose, and finally treats the text as an
/// opaque executive summary.
pub fn parse_narrative(raw: &str) -> AuditNarrative {
    let stripped = strip_json_fences(raw);

    if let Some(narrative) = narrative_from_json(&stripped) {
        return narrative;
    }
    if let Some(object) = extract_json_object(&stripped) {
        if let Some(narrative) = narrative_from_json(object) {
            warn!("narrative JSON recovered by brace matching");
            return narrative;
        }
    }

    warn!("narrative response was not JSON; using it as opaque text");
    AuditNarrative {
        executive_summary: raw.trim().to_string(),
        next_checks: Vec::new(),
    }
}

fn narrative_from_json(text: &str) -> Option<AuditNarrative> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    let summary = value.get("executive_summary")?.as_str()?.to_string();
    let next_checks = value
        .get("next_checks")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    Some(NextCheck {
                        title: item.get("title")?.as_str()?.to_string(),
                        description: item
                            .get("description")
                            .and_then(|d| d.as_str())
                            .unwrap_or("")
                            .to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    Some(AuditNarrative {
        executive_summary: summary,
        next_checks,
    })
}

/// Drop a surrounding ```json fence, if present.
pub fn strip_json_fences(text: &str) -> String {
    let open = Regex::new(r"(?i)^```(?:json)?\s*").expect("static regex");
    let close = Regex::new(r"\s*```$").expect("static regex");
    let trimmed = text.trim();
    let without_open = open.replace(trimmed, "");
    close.replace(&without_open, "").trim().to_string()
}

/// Best-effort extraction of the first balanced JSON object in a string.
/// String literals and escapes are honored so braces inside values do not
/// unbalance the scan.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match byte {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Deterministic narrative built purely from counts already computed by
/// the core. Used whenever the collaborator is unavailable or errors.
pub fn fallback_narrative(context: &CrawlContext, detection: &DetectionResult) -> AuditNarrative {
    let critical = detection.critical_errors.len();
    let warnings = detection.warnings.len();

    let mut summary = format!(
        "Audit of {} covered {} of {} discovered URLs ({}). {} critical issue categories and {} warnings were detected across the sample.",
        context.domain,
        context.urls_analyzed,
        context.urls_discovered,
        context.discovery.describe(),
        critical,
        warnings,
    );
    if let Some(top) = detection.quick_wins.first() {
        summary.push_str(&format!(
            " The highest-leverage fix is {} ({} URLs affected).",
            top.title,
            top.urls.len()
        ));
    }

    let next_checks = detection
        .quick_wins
        .iter()
        .take(3)
        .map(|p| NextCheck {
            title: format!("Re-verify: {}", p.title),
            description: p.how_to_fix.clone(),
        })
        .collect();

    AuditNarrative {
        executive_summary: summary,
        next_checks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DiscoveryMethod, Severity};

    #[test]
    fn fences_are_stripped() {
        assert_eq!(
            strip_json_fences("```json\n{\"a\": 1}\n```"),
            "{\"a\": 1}"
        );
        assert_eq!(strip_json_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_json_fences("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn brace_extraction_recovers_embedded_object() {
        let text = "Sure! Here is the summary you asked for:\n{\"executive_summary\": \"Fine site.\", \"next_checks\": []}\nHope this helps.";
        let object = extract_json_object(text).expect("object");
        assert!(object.starts_with('{') && object.ends_with('}'));
        let narrative = parse_narrative(text);
        assert_eq!(narrative.executive_summary, "Fine site.");
    }

    #[test]
    fn braces_inside_strings_do_not_unbalance() {
        let text = r#"prefix {"executive_summary": "uses { and } freely", "next_checks": []} suffix"#;
        let narrative = parse_narrative(text);
        assert_eq!(narrative.executive_summary, "uses { and } freely");
    }

    #[test]
    fn non_json_response_becomes_opaque_summary() {
        let narrative = parse_narrative("The site looks mostly fine.\nFix the titles.");
        assert_eq!(
            narrative.executive_summary,
            "The site looks mostly fine.\nFix the titles."
        );
        assert!(narrative.next_checks.is_empty());
    }

    #[test]
    fn next_checks_parsed_when_present() {
        let raw = r#"{"executive_summary": "ok", "next_checks": [{"title": "Check titles", "description": "Confirm uniqueness."}]}"#;
        let narrative = parse_narrative(raw);
        assert_eq!(narrative.next_checks.len(), 1);
        assert_eq!(narrative.next_checks[0].title, "Check titles");
    }

    #[test]
    fn fallback_uses_only_counts() {
        let context = CrawlContext::build(
            "example.com".to_string(),
            DiscoveryMethod::HomepageOnly,
            12,
            Vec::new(),
            0,
            Vec::new(),
            300,
        );
        let detection = DetectionResult {
            quick_wins: vec![Problem {
                title: "Broken Internal Links".to_string(),
                severity: Severity::Critical,
                description: String::new(),
                why_it_matters: String::new(),
                how_to_fix: "Update the links.".to_string(),
                urls: vec!["https://example.com/dead".to_string()],
                impact_score: 9,
                effort_hours: 0.5,
            }],
            critical_errors: Vec::new(),
            warnings: Vec::new(),
        };

        let narrative = fallback_narrative(&context, &detection);
        assert!(narrative.executive_summary.contains("example.com"));
        assert!(narrative.executive_summary.contains("Broken Internal Links"));
        assert_eq!(narrative.next_checks.len(), 1);

        let again = fallback_narrative(&context, &detection);
        assert_eq!(narrative.executive_summary, again.executive_summary);
    }
}
