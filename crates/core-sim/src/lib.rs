pub mod config;
pub mod generators;
pub mod portfolio;
pub mod state;

pub use config::SimConfig;
pub use generators::TickNoise;
pub use portfolio::PortfolioSnapshot;
pub use state::{BotState, ControlError};
