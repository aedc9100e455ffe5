// src/core/job.rs
use crate::config::{AppConfig, Credentials, ExchangeConfig};
use crate::connectors::binance::BinanceFuturesClient;
use crate::connectors::traits::ExchangeClient;
use crate::core::pipeline::{OrderPipeline, PipelineOutcome};
use crate::error::Result;
use std::env;
use tracing::info;

/// One scheduled tick. Credentials are read here, before any network call, so
/// a missing key aborts the invocation instead of producing a failed step.
/// Every step-level failure is already inside the returned outcome.
pub async fn run_invocation(config: &AppConfig) -> Result<PipelineOutcome> {
    run_invocation_with(
        config,
        |name| env::var(name).ok(),
        |exchange, credentials| {
            let client = BinanceFuturesClient::new(exchange, credentials)?;
            Ok(Box::new(client) as Box<dyn ExchangeClient>)
        },
    )
    .await
}

async fn run_invocation_with<L, C>(
    config: &AppConfig,
    lookup: L,
    connect: C,
) -> Result<PipelineOutcome>
where
    L: Fn(&str) -> Option<String>,
    C: FnOnce(&ExchangeConfig, Credentials) -> Result<Box<dyn ExchangeClient>>,
{
    let credentials = Credentials::from_lookup(lookup)?;
    let client = connect(&config.exchange, credentials)?;

    info!(
        "Invocation: {} {} x{} ({} of {} balance)",
        config.trading.side,
        config.trading.symbol,
        config.trading.leverage,
        config.trading.allocation_fraction,
        config.trading.quote_asset
    );

    let pipeline = OrderPipeline::new(client, config.trading.clone(), config.clock);
    Ok(pipeline.execute().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{test_config, API_KEY_VAR, SECRET_KEY_VAR};
    use crate::core::testing::{FakeExchange, Op};
    use crate::error::BotError;
    use rust_decimal_macros::dec;
    use std::cell::Cell;
    use std::sync::Arc;

    fn lookup_with(
        api_key: Option<&'static str>,
        secret: Option<&'static str>,
    ) -> impl Fn(&str) -> Option<String> {
        move |name| match name {
            API_KEY_VAR => api_key.map(str::to_string),
            SECRET_KEY_VAR => secret.map(str::to_string),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_missing_secret_aborts_before_client_is_built() {
        let exchange = Arc::new(FakeExchange::new(dec!(1000), dec!(50000)));
        let connected = Cell::new(false);

        let result = run_invocation_with(
            &test_config(),
            lookup_with(Some("key"), None),
            |_, _| {
                connected.set(true);
                Ok(Box::new(Arc::clone(&exchange)) as Box<dyn ExchangeClient>)
            },
        )
        .await;

        assert!(matches!(
            result,
            Err(BotError::MissingCredential(SECRET_KEY_VAR))
        ));
        assert!(!connected.get());
        assert!(exchange.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_api_key_aborts_before_any_call() {
        let exchange = Arc::new(FakeExchange::new(dec!(1000), dec!(50000)));

        let result = run_invocation_with(
            &test_config(),
            lookup_with(Some(""), Some("secret")),
            |_, _| Ok(Box::new(Arc::clone(&exchange)) as Box<dyn ExchangeClient>),
        )
        .await;

        assert!(matches!(result, Err(BotError::MissingCredential(API_KEY_VAR))));
        assert!(exchange.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invocation_runs_clock_check_then_pipeline() {
        let exchange = Arc::new(FakeExchange::new(dec!(1000), dec!(50000)));

        let outcome = run_invocation_with(
            &test_config(),
            lookup_with(Some("key"), Some("secret")),
            |exchange_config, credentials| {
                assert_eq!(exchange_config.base_url, "https://testnet.binancefuture.com");
                assert_eq!(credentials.api_key(), "key");
                Ok(Box::new(Arc::clone(&exchange)) as Box<dyn ExchangeClient>)
            },
        )
        .await
        .unwrap();

        assert!(outcome.is_success());
        assert_eq!(
            exchange.calls(),
            vec![Op::ServerTime, Op::Leverage, Op::Balances, Op::Price, Op::Order]
        );
    }
}
