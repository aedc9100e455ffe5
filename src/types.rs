// src/types.rs
use crate::core::sizing::OrderQuantity;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Направление входа. На фьючерсах Buy открывает long, Sell открывает short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    #[serde(alias = "LONG", alias = "long", alias = "buy")]
    Buy,
    #[serde(alias = "SHORT", alias = "short", alias = "sell")]
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Market,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "MARKET",
        }
    }
}

/// Asset symbol -> available amount.
pub type Balances = HashMap<String, Decimal>;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub symbol: String,
    pub price: Decimal,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerTimeSample {
    pub server_ms: i64,
    pub local_ms: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeverageAck {
    pub symbol: String,
    pub leverage: u32,
    pub max_notional: Option<Decimal>,
}

/// Market order ready for submission. Built only from an accepted sizing result.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: OrderQuantity,
    pub client_order_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderAccepted {
    pub order_id: String,
    pub client_order_id: String,
    pub symbol: String,
    pub status: String,
    pub requested_qty: Decimal,
    pub executed_qty: Decimal,
    pub avg_price: Option<Decimal>,
}

impl fmt::Display for OrderAccepted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "order {} ({}) {} filled {}/{}",
            self.order_id, self.symbol, self.status, self.executed_qty, self.requested_qty
        )?;
        if let Some(avg) = self.avg_price {
            write!(f, " @ {}", avg)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderOutcome {
    Accepted(OrderAccepted),
    Rejected { reason: String },
}
