//! Trade Signal Oracle: ticker research behind a pluggable agent.

pub mod gemini;
pub mod rules;
pub mod tools;

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

pub use gemini::GeminiAgent;
pub use rules::RuleBasedAgent;

pub const SYSTEM_PROMPT: &str = "You are the AethelBot Trade Signal Oracle (TSO). \
Your mission is to provide a high-conviction, justifiable trade signal (BUY, SELL, or HOLD) \
by synthesizing data from all available tools. Synthesize the price, the research findings \
and the insider trade signals into a single, authoritative paragraph. Conclude your analysis \
with a final, one-word signal: \"Signal: BUY\", \"Signal: SELL\", or \"Signal: HOLD\".";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentError {
    #[error("agent is not configured")]
    Unavailable,
    #[error("{0}")]
    InvocationFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    /// Finds the trailing `Signal: X` conclusion in an analysis.
    pub fn from_summary(summary: &str) -> Option<Self> {
        let (_, tail) = summary.rsplit_once("Signal:")?;
        match tail.trim().trim_end_matches('.').to_uppercase().as_str() {
            "BUY" => Some(Self::Buy),
            "SELL" => Some(Self::Sell),
            "HOLD" => Some(Self::Hold),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait SignalAgent: Send + Sync {
    async fn analyze(&self, ticker: &str) -> Result<String, AgentError>;
}

/// Front door for ticker analysis. Holds no agent when none is configured.
#[derive(Clone, Default)]
pub struct SignalService {
    agent: Option<Arc<dyn SignalAgent>>,
}

impl fmt::Debug for SignalService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalService")
            .field("configured", &self.agent.is_some())
            .finish()
    }
}

impl SignalService {
    pub fn new(agent: Arc<dyn SignalAgent>) -> Self {
        Self { agent: Some(agent) }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn is_configured(&self) -> bool {
        self.agent.is_some()
    }

    pub async fn analyze(&self, ticker: &str) -> Result<String, AgentError> {
        let agent = self.agent.as_ref().ok_or(AgentError::Unavailable)?;
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(AgentError::InvocationFailed("ticker must not be empty".to_owned()));
        }

        let summary = agent.analyze(ticker).await.inspect_err(|err| {
            warn!(ticker, %err, "signal agent failed");
        })?;

        match Signal::from_summary(&summary) {
            Some(signal) => info!(ticker, %signal, "signal produced"),
            None => warn!(ticker, "analysis has no trailing signal"),
        }
        Ok(summary)
    }
}
