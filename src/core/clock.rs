// src/core/clock.rs
use crate::config::ClockConfig;
use crate::connectors::traits::ExchangeClient;
use crate::types::ServerTimeSample;
use chrono::Utc;
use std::fmt;
use tracing::{error, info, warn};

/// Server time minus local time, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockOffset(i64);

impl ClockOffset {
    pub fn from_sample(sample: ServerTimeSample) -> Self {
        Self(sample.server_ms.saturating_sub(sample.local_ms))
    }

    pub fn millis(&self) -> i64 {
        self.0
    }

    pub fn health(&self, thresholds: &ClockConfig) -> ClockHealth {
        let skew = self.0.saturating_abs();
        if skew < thresholds.green_ms {
            ClockHealth::Green
        } else if skew < thresholds.yellow_ms {
            ClockHealth::Yellow
        } else {
            ClockHealth::Red
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockHealth {
    Green,
    Yellow,
    Red,
}

impl fmt::Display for ClockHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClockHealth::Green => "green",
            ClockHealth::Yellow => "yellow",
            ClockHealth::Red => "red",
        };
        f.write_str(s)
    }
}

/// Advisory only: logs the skew and never stops the invocation.
pub async fn check_clock<C>(client: &C, thresholds: &ClockConfig) -> Option<ClockOffset>
where
    C: ExchangeClient + ?Sized,
{
    let server_ms = match client.server_time().await {
        Ok(ms) => ms,
        Err(e) => {
            warn!("⏱ Clock check skipped, server time unavailable: {}", e);
            return None;
        }
    };

    let sample = ServerTimeSample {
        server_ms,
        local_ms: Utc::now().timestamp_millis(),
    };
    let offset = ClockOffset::from_sample(sample);
    let health = offset.health(thresholds);

    match health {
        ClockHealth::Green => info!(offset_ms = offset.millis(), %health, "⏱ Clock offset"),
        ClockHealth::Yellow => warn!(offset_ms = offset.millis(), %health, "⏱ Clock offset drifting"),
        ClockHealth::Red => error!(
            offset_ms = offset.millis(),
            %health,
            "⏱ Clock offset too large, signed requests may be rejected"
        ),
    }

    Some(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{FakeExchange, Failure, Op};
    use rust_decimal_macros::dec;

    const THRESHOLDS: ClockConfig = ClockConfig {
        green_ms: 50,
        yellow_ms: 1000,
    };

    #[test]
    fn test_offset_is_server_minus_local() {
        let ahead = ClockOffset::from_sample(ServerTimeSample {
            server_ms: 1_000_120,
            local_ms: 1_000_000,
        });
        assert_eq!(ahead.millis(), 120);

        let behind = ClockOffset::from_sample(ServerTimeSample {
            server_ms: 1_000_000,
            local_ms: 1_000_030,
        });
        assert_eq!(behind.millis(), -30);
    }

    #[test]
    fn test_health_thresholds() {
        assert_eq!(ClockOffset(0).health(&THRESHOLDS), ClockHealth::Green);
        assert_eq!(ClockOffset(49).health(&THRESHOLDS), ClockHealth::Green);
        assert_eq!(ClockOffset(-49).health(&THRESHOLDS), ClockHealth::Green);
        assert_eq!(ClockOffset(50).health(&THRESHOLDS), ClockHealth::Yellow);
        assert_eq!(ClockOffset(-999).health(&THRESHOLDS), ClockHealth::Yellow);
        assert_eq!(ClockOffset(1000).health(&THRESHOLDS), ClockHealth::Red);
        assert_eq!(ClockOffset(-5000).health(&THRESHOLDS), ClockHealth::Red);
    }

    #[test]
    fn test_extreme_server_time_saturates() {
        let offset = ClockOffset::from_sample(ServerTimeSample {
            server_ms: i64::MIN,
            local_ms: 1_700_000_000_000,
        });
        assert_eq!(offset.millis(), i64::MIN);
        assert_eq!(offset.health(&THRESHOLDS), ClockHealth::Red);

        let offset = ClockOffset::from_sample(ServerTimeSample {
            server_ms: i64::MAX,
            local_ms: -1,
        });
        assert_eq!(offset.millis(), i64::MAX);
        assert_eq!(offset.health(&THRESHOLDS), ClockHealth::Red);
    }

    #[tokio::test]
    async fn test_garbage_server_time_does_not_block() {
        let mut exchange = FakeExchange::new(dec!(1000), dec!(50000));
        exchange.server_time = i64::MIN;

        let offset = check_clock(&exchange, &THRESHOLDS).await.unwrap();
        assert_eq!(offset.health(&THRESHOLDS), ClockHealth::Red);
    }

    #[tokio::test]
    async fn test_check_clock_returns_offset() {
        let mut exchange = FakeExchange::new(dec!(1000), dec!(50000));
        exchange.server_time = Utc::now().timestamp_millis() + 10_000;

        let offset = check_clock(&exchange, &THRESHOLDS).await.unwrap();
        // Local clock advances between the fake's timestamp and the sample.
        assert!(offset.millis() <= 10_000);
        assert!(offset.millis() > 9_000);
        assert_eq!(offset.health(&THRESHOLDS), ClockHealth::Red);
        assert_eq!(exchange.calls(), vec![Op::ServerTime]);
    }

    #[tokio::test]
    async fn test_check_clock_failure_is_not_fatal() {
        let exchange = FakeExchange::new(dec!(1000), dec!(50000))
            .failing(Op::ServerTime, Failure::Http(503));

        assert!(check_clock(&exchange, &THRESHOLDS).await.is_none());
    }
}
