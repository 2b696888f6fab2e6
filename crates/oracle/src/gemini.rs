use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{tools::ResearchFindings, AgentError, SignalAgent, SYSTEM_PROMPT};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Agent that gathers tool findings locally and asks Gemini for the synthesis.
#[derive(Debug, Clone)]
pub struct GeminiAgent {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GeminiAgent {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_GEMINI_BASE_URL, api_key, model)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn request_for(findings: &ResearchFindings) -> GenerateRequest {
        let prompt = format!(
            "Analyze the trade signal for {}.\n\nget_realtime_price: {}\nsearch_research_database: {}\nsearch_capitol_trades: {}",
            findings.ticker,
            findings.price_report(),
            findings.research,
            findings.insider_trades,
        );

        GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: SYSTEM_PROMPT.to_owned(),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_owned()),
                parts: vec![Part { text: prompt }],
            }],
        }
    }
}

fn summary_from_response(body: &str) -> Result<String, AgentError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|err| AgentError::InvocationFailed(format!("malformed Gemini response: {err}")))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().map(|part| part.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AgentError::InvocationFailed(
            "Gemini returned no candidate text".to_owned(),
        ));
    }
    Ok(text)
}

#[async_trait]
impl SignalAgent for GeminiAgent {
    async fn analyze(&self, ticker: &str) -> Result<String, AgentError> {
        let findings = ResearchFindings::gather(ticker);
        debug!(ticker, model = %self.model, "requesting Gemini synthesis");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_for(&findings))
            .send()
            .await
            .map_err(|err| AgentError::InvocationFailed(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| AgentError::InvocationFailed(err.to_string()))?;
        if !status.is_success() {
            return Err(AgentError::InvocationFailed(format!(
                "Gemini returned {status}"
            )));
        }

        summary_from_response(&body)
    }
}
