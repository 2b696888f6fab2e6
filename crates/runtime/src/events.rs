use core_sim::PortfolioSnapshot;
use serde::Serialize;
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

pub const DASHBOARD_CONNECTED: &str = "Dashboard connected to AethelBot backend.";
pub const BOT_HALTED: &str = "AethelBot Halted by Executive Order.";

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("failed to format log timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
    #[error("failed to serialize dashboard message: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    System,
    Buy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn now(level: LogLevel, message: impl Into<String>) -> Result<Self, MessageError> {
        Ok(Self {
            timestamp: OffsetDateTime::now_utc().format(&Rfc3339)?,
            level,
            message: message.into(),
        })
    }
}

/// Everything a dashboard subscriber can receive.
///
/// Serialized as `{"type": "LOG_ENTRY" | "PORTFOLIO_UPDATE", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DashboardMessage {
    LogEntry(LogEntry),
    PortfolioUpdate(PortfolioSnapshot),
}

impl DashboardMessage {
    pub fn system_log(message: impl Into<String>) -> Result<Self, MessageError> {
        LogEntry::now(LogLevel::System, message).map(Self::LogEntry)
    }

    pub fn simulated_buy(units: u32) -> Result<Self, MessageError> {
        LogEntry::now(
            LogLevel::Buy,
            format!("[SIMULATED BUY] Executed market buy of +{units} units of PLTR."),
        )
        .map(Self::LogEntry)
    }

    pub fn portfolio_update(snapshot: PortfolioSnapshot) -> Self {
        Self::PortfolioUpdate(snapshot)
    }

    pub fn to_json(&self) -> Result<String, MessageError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use core_sim::{BotState, PortfolioSnapshot};
    use time::{format_description::well_known::Rfc3339, OffsetDateTime};

    use super::DashboardMessage;

    #[test]
    fn system_log_uses_log_entry_envelope() {
        let message = DashboardMessage::system_log("hello").unwrap();

        let json: serde_json::Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();

        assert_eq!(json["type"], "LOG_ENTRY");
        assert_eq!(json["payload"]["level"], "SYSTEM");
        assert_eq!(json["payload"]["message"], "hello");
        let timestamp = json["payload"]["timestamp"].as_str().unwrap();
        assert!(OffsetDateTime::parse(timestamp, &Rfc3339).is_ok());
    }

    #[test]
    fn simulated_buy_names_units() {
        let message = DashboardMessage::simulated_buy(4).unwrap();

        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["payload"]["level"], "BUY");
        assert_eq!(
            json["payload"]["message"],
            "[SIMULATED BUY] Executed market buy of +4 units of PLTR."
        );
    }

    #[test]
    fn portfolio_update_carries_snapshot_payload() {
        let mut state = BotState::new();
        state.deploy(1000.0, 500.0).unwrap();
        let message = DashboardMessage::portfolio_update(PortfolioSnapshot::from_state(&state));

        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["type"], "PORTFOLIO_UPDATE");
        assert_eq!(json["payload"]["equity"], 1500.0);
        assert_eq!(json["payload"]["initialFunding"], 1000.0);
        assert_eq!(json["payload"]["allocations"].as_array().unwrap().len(), 2);
    }
}
