use crate::error::ExchangeError;
use crate::types::{Balances, LeverageAck, OrderOutcome, OrderRequest, PriceQuote};
use async_trait::async_trait;
use std::sync::Arc;

/// One request per call. Exchange-side refusals and transport faults both come
/// back as `ExchangeError`; callers tell them apart with `is_transport()`.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Server clock in milliseconds since the epoch.
    async fn server_time(&self) -> Result<i64, ExchangeError>;

    async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<LeverageAck, ExchangeError>;

    /// Available amount per asset.
    async fn balances(&self) -> Result<Balances, ExchangeError>;

    async fn price(&self, symbol: &str) -> Result<PriceQuote, ExchangeError>;

    async fn place_market_order(&self, order: &OrderRequest) -> Result<OrderOutcome, ExchangeError>;
}

#[async_trait]
impl<T: ExchangeClient + ?Sized> ExchangeClient for Arc<T> {
    async fn server_time(&self) -> Result<i64, ExchangeError> {
        (**self).server_time().await
    }

    async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<LeverageAck, ExchangeError> {
        (**self).set_leverage(symbol, leverage).await
    }

    async fn balances(&self) -> Result<Balances, ExchangeError> {
        (**self).balances().await
    }

    async fn price(&self, symbol: &str) -> Result<PriceQuote, ExchangeError> {
        (**self).price(symbol).await
    }

    async fn place_market_order(&self, order: &OrderRequest) -> Result<OrderOutcome, ExchangeError> {
        (**self).place_market_order(order).await
    }
}
