// src/core/testing.rs
//! Scripted `ExchangeClient` for unit tests. Every call is counted; a failure
//! can be scripted per operation.

use crate::connectors::traits::ExchangeClient;
use crate::error::ExchangeError;
use crate::types::{Balances, LeverageAck, OrderAccepted, OrderOutcome, OrderRequest, PriceQuote};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    ServerTime,
    Leverage,
    Balances,
    Price,
    Order,
}

#[derive(Debug, Clone)]
pub enum Failure {
    Api(i64, &'static str),
    Http(u16),
}

impl Failure {
    fn to_error(&self) -> ExchangeError {
        match self {
            Failure::Api(code, msg) => ExchangeError::Api {
                code: *code,
                msg: msg.to_string(),
            },
            Failure::Http(status) => ExchangeError::Http {
                status: *status,
                body: String::new(),
            },
        }
    }
}

pub struct FakeExchange {
    pub server_time: i64,
    pub balances: Balances,
    pub price: Decimal,
    pub order_status: &'static str,
    failures: Vec<(Op, Failure)>,
    calls: Mutex<Vec<Op>>,
    order_calls: AtomicUsize,
    pub submitted: Mutex<Vec<OrderRequest>>,
}

impl FakeExchange {
    pub fn new(usdt: Decimal, price: Decimal) -> Self {
        let mut balances = Balances::new();
        balances.insert("USDT".to_string(), usdt);
        Self {
            server_time: chrono::Utc::now().timestamp_millis(),
            balances,
            price,
            order_status: "FILLED",
            failures: Vec::new(),
            calls: Mutex::new(Vec::new()),
            order_calls: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(mut self, op: Op, failure: Failure) -> Self {
        self.failures.push((op, failure));
        self
    }

    pub fn calls(&self) -> Vec<Op> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, op: Op) -> usize {
        self.calls().iter().filter(|c| **c == op).count()
    }

    pub fn order_calls(&self) -> usize {
        self.order_calls.load(Ordering::SeqCst)
    }

    fn record(&self, op: Op) -> Result<(), ExchangeError> {
        self.calls.lock().unwrap().push(op);
        match self.failures.iter().find(|(o, _)| *o == op) {
            Some((_, failure)) => Err(failure.to_error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ExchangeClient for FakeExchange {
    async fn server_time(&self) -> Result<i64, ExchangeError> {
        self.record(Op::ServerTime)?;
        Ok(self.server_time)
    }

    async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<LeverageAck, ExchangeError> {
        self.record(Op::Leverage)?;
        Ok(LeverageAck {
            symbol: symbol.to_string(),
            leverage,
            max_notional: None,
        })
    }

    async fn balances(&self) -> Result<Balances, ExchangeError> {
        self.record(Op::Balances)?;
        Ok(self.balances.clone())
    }

    async fn price(&self, symbol: &str) -> Result<PriceQuote, ExchangeError> {
        self.record(Op::Price)?;
        Ok(PriceQuote {
            symbol: symbol.to_string(),
            price: self.price,
            timestamp: 0,
        })
    }

    async fn place_market_order(&self, order: &OrderRequest) -> Result<OrderOutcome, ExchangeError> {
        self.order_calls.fetch_add(1, Ordering::SeqCst);
        self.record(Op::Order)?;
        self.submitted.lock().unwrap().push(order.clone());

        if self.order_status == "REJECTED" {
            return Ok(OrderOutcome::Rejected {
                reason: "order 1 finished with status REJECTED".to_string(),
            });
        }

        Ok(OrderOutcome::Accepted(OrderAccepted {
            order_id: "1".to_string(),
            client_order_id: order.client_order_id.clone(),
            symbol: order.symbol.clone(),
            status: self.order_status.to_string(),
            requested_qty: order.quantity.value(),
            executed_qty: order.quantity.value(),
            avg_price: Some(self.price),
        }))
    }
}
