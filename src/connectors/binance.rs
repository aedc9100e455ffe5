// src/connectors/binance.rs
use crate::config::{Credentials, ExchangeConfig};
use crate::connectors::messages::{
    ApiErrorResponse, FuturesBalance, LeverageResponse, NewOrderParams, OrderResponse,
    ServerTimeResponse, TickerPrice,
};
use crate::connectors::traits::ExchangeClient;
use crate::error::{BotError, ExchangeError};
use crate::types::{Balances, LeverageAck, OrderAccepted, OrderOutcome, OrderRequest, PriceQuote};
use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, StatusCode};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, info};

type HmacSha256 = Hmac<Sha256>;

/// Статусы ордера, которые означают отказ без исполнения.
const DEAD_ORDER_STATUSES: [&str; 2] = ["REJECTED", "EXPIRED"];

/// REST client for Binance USDⓈ-M futures (`/fapi`). Built fresh for every
/// invocation; holds nothing mutable besides the HTTP client.
pub struct BinanceFuturesClient {
    credentials: Credentials,
    http_client: Client,
    base_rest_url: String,
    recv_window_ms: u64,
}

impl BinanceFuturesClient {
    pub fn new(config: &ExchangeConfig, credentials: Credentials) -> Result<Self, BotError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(BotError::ClientBuild)?;

        Ok(Self {
            credentials,
            http_client,
            base_rest_url: config.base_url.trim_end_matches('/').to_string(),
            recv_window_ms: config.recv_window_ms,
        })
    }

    fn sign_and_build_query(&self, query: &str) -> Result<String, ExchangeError> {
        let timestamp = Utc::now().timestamp_millis();

        let mut payload = String::from(query);
        if !payload.is_empty() {
            payload.push('&');
        }
        payload.push_str(&format!(
            "recvWindow={}&timestamp={}",
            self.recv_window_ms, timestamp
        ));

        let signature = sign_query(self.credentials.secret_key(), &payload)?;
        Ok(format!("{}&signature={}", payload, signature))
    }

    async fn send_signed_request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        query: &str,
    ) -> Result<T, ExchangeError> {
        let full_query = self.sign_and_build_query(query)?;
        let url = format!("{}{}?{}", self.base_rest_url, endpoint, full_query);

        debug!(%method, endpoint, "Binance signed request");

        let response = self
            .http_client
            .request(method, &url)
            .header("X-MBX-APIKEY", self.credentials.api_key())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        parse_response(endpoint, status, &body)
    }

    async fn send_public_request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &str,
    ) -> Result<T, ExchangeError> {
        let url = if query.is_empty() {
            format!("{}{}", self.base_rest_url, endpoint)
        } else {
            format!("{}{}?{}", self.base_rest_url, endpoint, query)
        };

        debug!(endpoint, "Binance public request");

        let response = self.http_client.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        parse_response(endpoint, status, &body)
    }
}

#[async_trait]
impl ExchangeClient for BinanceFuturesClient {
    async fn server_time(&self) -> Result<i64, ExchangeError> {
        let resp: ServerTimeResponse = self.send_public_request("/fapi/v1/time", "").await?;
        Ok(resp.server_time)
    }

    async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<LeverageAck, ExchangeError> {
        let query = encode_query(&[("symbol", symbol.to_string()), ("leverage", leverage.to_string())])?;
        let resp: LeverageResponse = self
            .send_signed_request(Method::POST, "/fapi/v1/leverage", &query)
            .await?;

        Ok(LeverageAck {
            symbol: resp.symbol,
            leverage: resp.leverage,
            max_notional: resp
                .max_notional_value
                .as_deref()
                .and_then(|v| Decimal::from_str(v).ok()),
        })
    }

    async fn balances(&self) -> Result<Balances, ExchangeError> {
        let resp: Vec<FuturesBalance> = self
            .send_signed_request(Method::GET, "/fapi/v2/balance", "")
            .await?;

        Ok(resp
            .into_iter()
            .map(|b| {
                debug!(
                    asset = %b.asset,
                    wallet = %b.balance,
                    available = %b.available_balance,
                    "Futures balance"
                );
                (b.asset, b.available_balance)
            })
            .collect())
    }

    async fn price(&self, symbol: &str) -> Result<PriceQuote, ExchangeError> {
        let query = encode_query(&[("symbol", symbol)])?;
        let ticker: TickerPrice = self
            .send_public_request("/fapi/v1/ticker/price", &query)
            .await?;

        Ok(PriceQuote {
            symbol: ticker.symbol,
            price: ticker.price,
            timestamp: ticker
                .time
                .unwrap_or_else(|| Utc::now().timestamp_millis()),
        })
    }

    async fn place_market_order(&self, order: &OrderRequest) -> Result<OrderOutcome, ExchangeError> {
        let params = NewOrderParams {
            symbol: &order.symbol,
            side: order.side.as_str(),
            order_type: order.order_type.as_str(),
            quantity: order.quantity.to_string(),
            client_order_id: &order.client_order_id,
            resp_type: "RESULT",
        };
        let query = encode_query(&params)?;

        info!(
            "🚀 Sending Order: {} {} {} ({})",
            order.side,
            order.quantity,
            order.symbol,
            order.order_type.as_str()
        );

        let resp: OrderResponse = self
            .send_signed_request(Method::POST, "/fapi/v1/order", &query)
            .await?;

        Ok(order_outcome(resp))
    }
}

/// HMAC-SHA256 of the query string, hex-encoded.
pub fn sign_query(secret_key: &str, payload: &str) -> Result<String, ExchangeError> {
    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
        .map_err(|e| ExchangeError::Signing(format!("invalid secret key: {}", e)))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn encode_query<T: Serialize + ?Sized>(params: &T) -> Result<String, ExchangeError> {
    serde_urlencoded::to_string(params)
        .map_err(|e| ExchangeError::Signing(format!("failed to encode query: {}", e)))
}

fn parse_response<T: DeserializeOwned>(
    endpoint: &str,
    status: StatusCode,
    body: &str,
) -> Result<T, ExchangeError> {
    if !status.is_success() {
        if let Ok(err) = serde_json::from_str::<ApiErrorResponse>(body) {
            return Err(ExchangeError::Api {
                code: err.code,
                msg: err.msg,
            });
        }
        return Err(ExchangeError::Http {
            status: status.as_u16(),
            body: body.to_string(),
        });
    }

    serde_json::from_str(body).map_err(|e| ExchangeError::Decode(format!("{}: {}", endpoint, e)))
}

fn order_outcome(resp: OrderResponse) -> OrderOutcome {
    if DEAD_ORDER_STATUSES.contains(&resp.status.as_str()) {
        return OrderOutcome::Rejected {
            reason: format!("order {} finished with status {}", resp.order_id, resp.status),
        };
    }

    // avgPrice приходит как "0.00000" пока ордер не исполнен
    let avg_price = resp
        .avg_price
        .as_deref()
        .and_then(|p| Decimal::from_str(p).ok())
        .filter(|p| !p.is_zero());

    OrderOutcome::Accepted(OrderAccepted {
        order_id: resp.order_id.to_string(),
        client_order_id: resp.client_order_id,
        symbol: resp.symbol,
        status: resp.status,
        requested_qty: resp.orig_qty,
        executed_qty: resp.executed_qty,
        avg_price,
    })
}
