// src/error.rs
use thiserror::Error;

/// Failure of a single exchange call.
///
/// `Transport` covers everything where no answer came back from the exchange
/// (timeout, DNS, TLS, connection reset). All other variants mean the exchange
/// answered and said no, or answered with something we could not read.
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("exchange error {code}: {msg}")]
    Api { code: i64, msg: String },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("signing error: {0}")]
    Signing(String),
}

impl ExchangeError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ExchangeError::Transport(_))
    }

    pub fn code(&self) -> Option<i64> {
        match self {
            ExchangeError::Api { code, .. } => Some(*code),
            ExchangeError::Http { status, .. } => Some(i64::from(*status)),
            _ => None,
        }
    }
}

/// Errors that abort an invocation before the pipeline runs.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing credential: {0} is not set or empty")]
    MissingCredential(&'static str),

    #[error("Failed to build exchange client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, BotError>;
