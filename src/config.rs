// src/config.rs

use crate::error::{BotError, Result};
use crate::types::Side;
use config::{Config, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use std::fmt;
use url::Url;

pub const API_KEY_VAR: &str = "BINANCE_API_KEY";
pub const SECRET_KEY_VAR: &str = "BINANCE_SECRET_KEY";

const TESTNET_URL: &str = "https://testnet.binancefuture.com";
const MAX_DECIMAL_SCALE: u32 = 28;

#[derive(Debug, Deserialize, Clone)]
pub struct ExchangeConfig {
    pub base_url: String,
    pub recv_window_ms: u64,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TradingConfig {
    pub symbol: String,
    pub quote_asset: String,
    pub side: Side,
    pub leverage: u32,
    pub allocation_fraction: Decimal,
    pub min_quantity: Decimal,
    pub quantity_precision: u32,
}

/// Пороги для оценки расхождения часов (мс).
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ClockConfig {
    pub green_ms: i64,
    pub yellow_ms: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleConfig {
    pub interval_secs: u64,
    pub run_once: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub exchange: ExchangeConfig,
    pub trading: TradingConfig,
    pub clock: ClockConfig,
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Defaults, then an optional `Settings.{toml,yaml,json}`, then `APP_*` env vars
    /// (`APP_TRADING__LEVERAGE=20`).
    pub fn new() -> Result<Self> {
        let builder = Self::with_defaults(Config::builder())?
            .add_source(File::with_name("Settings").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        // Decimal defaults go in as strings so they never pass through f64.
        Ok(builder
            .set_default("exchange.base_url", TESTNET_URL)?
            .set_default("exchange.recv_window_ms", 5000)?
            .set_default("exchange.timeout_secs", 10)?
            .set_default("trading.symbol", "BTCUSDT")?
            .set_default("trading.quote_asset", "USDT")?
            .set_default("trading.side", "BUY")?
            .set_default("trading.leverage", 10)?
            .set_default("trading.allocation_fraction", "0.10")?
            .set_default("trading.min_quantity", "0.001")?
            .set_default("trading.quantity_precision", 3)?
            .set_default("clock.green_ms", 50)?
            .set_default("clock.yellow_ms", 1000)?
            .set_default("schedule.interval_secs", 300)?
            .set_default("schedule.run_once", false)?)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(BotError::InvalidConfig(msg));

        if let Err(e) = Url::parse(&self.exchange.base_url) {
            return invalid(format!("exchange.base_url '{}': {}", self.exchange.base_url, e));
        }
        if self.exchange.timeout_secs == 0 {
            return invalid("exchange.timeout_secs must be > 0".into());
        }

        let t = &self.trading;
        if t.symbol.trim().is_empty() {
            return invalid("trading.symbol is empty".into());
        }
        if t.quote_asset.trim().is_empty() {
            return invalid("trading.quote_asset is empty".into());
        }
        if t.leverage < 1 {
            return invalid("trading.leverage must be >= 1".into());
        }
        if t.allocation_fraction <= Decimal::ZERO || t.allocation_fraction > Decimal::ONE {
            return invalid(format!(
                "trading.allocation_fraction {} must be in (0, 1]",
                t.allocation_fraction
            ));
        }
        if t.min_quantity <= Decimal::ZERO {
            return invalid(format!("trading.min_quantity {} must be > 0", t.min_quantity));
        }
        if t.quantity_precision > MAX_DECIMAL_SCALE {
            return invalid(format!(
                "trading.quantity_precision {} exceeds {}",
                t.quantity_precision, MAX_DECIMAL_SCALE
            ));
        }

        if self.clock.green_ms < 0 || self.clock.yellow_ms < self.clock.green_ms {
            return invalid(format!(
                "clock thresholds must satisfy 0 <= green_ms ({}) <= yellow_ms ({})",
                self.clock.green_ms, self.clock.yellow_ms
            ));
        }
        if self.schedule.interval_secs == 0 {
            return invalid("schedule.interval_secs must be > 0".into());
        }

        Ok(())
    }
}

/// API key pair. Never serialized, and `Debug` does not print it.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    secret_key: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        let secret_key = secret_key.into();

        if api_key.trim().is_empty() {
            return Err(BotError::MissingCredential(API_KEY_VAR));
        }
        if secret_key.trim().is_empty() {
            return Err(BotError::MissingCredential(SECRET_KEY_VAR));
        }

        Ok(Self {
            api_key,
            secret_key,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR).ok_or(BotError::MissingCredential(API_KEY_VAR))?;
        let secret_key =
            lookup(SECRET_KEY_VAR).ok_or(BotError::MissingCredential(SECRET_KEY_VAR))?;
        Self::new(api_key, secret_key)
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    use rust_decimal_macros::dec;

    AppConfig {
        exchange: ExchangeConfig {
            base_url: TESTNET_URL.to_string(),
            recv_window_ms: 5000,
            timeout_secs: 10,
        },
        trading: TradingConfig {
            symbol: "BTCUSDT".to_string(),
            quote_asset: "USDT".to_string(),
            side: Side::Buy,
            leverage: 10,
            allocation_fraction: dec!(0.10),
            min_quantity: dec!(0.001),
            quantity_precision: 3,
        },
        clock: ClockConfig {
            green_ms: 50,
            yellow_ms: 1000,
        },
        schedule: ScheduleConfig {
            interval_secs: 300,
            run_once: false,
        },
        logging: LoggingConfig::default(),
    }
}
