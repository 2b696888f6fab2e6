use async_trait::async_trait;

use crate::{
    tools::ResearchFindings,
    AgentError, Signal, SignalAgent,
};

/// Offline agent: consults every tool and concludes BUY only on an insider signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedAgent;

impl RuleBasedAgent {
    pub fn synthesize(findings: &ResearchFindings) -> String {
        let signal = if findings.has_insider_signal() {
            Signal::Buy
        } else {
            Signal::Hold
        };
        let stance = match signal {
            Signal::Buy => "Insider buying corroborates the research picture, which supports adding exposure.",
            _ => "Without a correlated insider signal the evidence does not justify a new position.",
        };

        format!(
            "{} Research: {} Insider activity: {} {stance} Signal: {signal}",
            findings.price_report(),
            findings.research,
            findings.insider_trades,
        )
    }
}

#[async_trait]
impl SignalAgent for RuleBasedAgent {
    async fn analyze(&self, ticker: &str) -> Result<String, AgentError> {
        Ok(Self::synthesize(&ResearchFindings::gather(ticker)))
    }
}
