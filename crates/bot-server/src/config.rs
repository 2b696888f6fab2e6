use std::{
    env, fmt,
    net::{AddrParseError, Ipv4Addr, SocketAddr},
    time::Duration,
};

use oracle::gemini::DEFAULT_GEMINI_MODEL;

const DEFAULT_LISTEN_ADDR: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(Ipv4Addr::UNSPECIFIED),
    8000,
);
const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;
const DEFAULT_SUBSCRIBER_QUEUE: u64 = 64;
const DEFAULT_SEND_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_SIGNAL_AGENT: SignalAgentMode = SignalAgentMode::Rules;

const ENV_ADDR: &str = "BOT_SERVER_ADDR";
const ENV_TICK_INTERVAL: &str = "BOT_TICK_INTERVAL_MS";
const ENV_SUBSCRIBER_QUEUE: &str = "BOT_SUBSCRIBER_QUEUE";
const ENV_SEND_TIMEOUT: &str = "BOT_SEND_TIMEOUT_MS";
const ENV_SIGNAL_AGENT: &str = "BOT_SIGNAL_AGENT";
const ENV_GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
const ENV_GEMINI_MODEL: &str = "BOT_GEMINI_MODEL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAgentMode {
    Rules,
    Gemini,
    Off,
}

impl SignalAgentMode {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "rules" => Some(Self::Rules),
            "gemini" => Some(Self::Gemini),
            "off" => Some(Self::Off),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rules => "rules",
            Self::Gemini => "gemini",
            Self::Off => "off",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub tick_interval_ms: u64,
    pub subscriber_queue: usize,
    pub send_timeout: Duration,
    pub signal_agent: SignalAgentMode,
    pub google_api_key: Option<String>,
    pub gemini_model: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidListenAddr(AddrParseError),
    InvalidTickInterval,
    InvalidSubscriberQueue,
    InvalidSendTimeout,
    InvalidSignalAgent,
    MissingGoogleApiKey,
    InvalidGeminiModel,
    NonUnicode(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidListenAddr(err) => {
                write!(f, "{ENV_ADDR} is not a valid socket address: {err}")
            }
            Self::InvalidTickInterval => {
                write!(f, "{ENV_TICK_INTERVAL} must be a positive integer")
            }
            Self::InvalidSubscriberQueue => {
                write!(f, "{ENV_SUBSCRIBER_QUEUE} must be a positive integer")
            }
            Self::InvalidSendTimeout => {
                write!(f, "{ENV_SEND_TIMEOUT} must be a positive integer")
            }
            Self::InvalidSignalAgent => {
                write!(f, "{ENV_SIGNAL_AGENT} must be one of: rules, gemini, off")
            }
            Self::MissingGoogleApiKey => {
                write!(
                    f,
                    "{ENV_GOOGLE_API_KEY} must be set when {ENV_SIGNAL_AGENT}=gemini"
                )
            }
            Self::InvalidGeminiModel => {
                write!(f, "{ENV_GEMINI_MODEL} must not be empty or whitespace")
            }
            Self::NonUnicode(key) => write!(f, "{key} contains non-unicode data"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidListenAddr(err) => Some(err),
            _ => None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let listen_addr = match read_env(ENV_ADDR)? {
            Some(value) => value.parse().map_err(ConfigError::InvalidListenAddr)?,
            None => DEFAULT_LISTEN_ADDR,
        };

        let tick_interval_ms = parse_positive_env(
            ENV_TICK_INTERVAL,
            DEFAULT_TICK_INTERVAL_MS,
            ConfigError::InvalidTickInterval,
        )?;

        let subscriber_queue = parse_positive_env(
            ENV_SUBSCRIBER_QUEUE,
            DEFAULT_SUBSCRIBER_QUEUE,
            ConfigError::InvalidSubscriberQueue,
        )?;
        let subscriber_queue =
            usize::try_from(subscriber_queue).map_err(|_| ConfigError::InvalidSubscriberQueue)?;

        let send_timeout_ms = parse_positive_env(
            ENV_SEND_TIMEOUT,
            DEFAULT_SEND_TIMEOUT_MS,
            ConfigError::InvalidSendTimeout,
        )?;

        let signal_agent = match read_env(ENV_SIGNAL_AGENT)? {
            Some(value) => {
                SignalAgentMode::parse(value.as_str()).ok_or(ConfigError::InvalidSignalAgent)?
            }
            None => DEFAULT_SIGNAL_AGENT,
        };

        let google_api_key = read_env(ENV_GOOGLE_API_KEY)?.filter(|key| !key.trim().is_empty());
        if signal_agent == SignalAgentMode::Gemini && google_api_key.is_none() {
            return Err(ConfigError::MissingGoogleApiKey);
        }

        let gemini_model = match read_env(ENV_GEMINI_MODEL)? {
            Some(value) => {
                if value.trim().is_empty() {
                    return Err(ConfigError::InvalidGeminiModel);
                }
                value
            }
            None => DEFAULT_GEMINI_MODEL.to_owned(),
        };

        Ok(Self {
            listen_addr,
            tick_interval_ms,
            subscriber_queue,
            send_timeout: Duration::from_millis(send_timeout_ms),
            signal_agent,
            google_api_key,
            gemini_model,
        })
    }
}

fn read_env(key: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ConfigError::NonUnicode(key)),
    }
}

fn parse_positive_env(
    key: &'static str,
    default_value: u64,
    invalid_error: ConfigError,
) -> Result<u64, ConfigError> {
    match read_env(key)? {
        Some(value) => match value.trim().parse::<u64>() {
            Ok(parsed) if parsed > 0 => Ok(parsed),
            _ => Err(invalid_error),
        },
        None => Ok(default_value),
    }
}
