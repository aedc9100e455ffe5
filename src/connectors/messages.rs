// src/connectors/messages.rs
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// GET /fapi/v1/time
#[derive(Debug, Deserialize)]
pub struct ServerTimeResponse {
    #[serde(rename = "serverTime")]
    pub server_time: i64,
}

/// POST /fapi/v1/leverage
#[derive(Debug, Deserialize)]
pub struct LeverageResponse {
    pub symbol: String,
    pub leverage: u32,
    #[serde(rename = "maxNotionalValue", default)]
    pub max_notional_value: Option<String>,
}

/// Один элемент ответа GET /fapi/v2/balance. Биржа отдаёт суммы строками.
#[derive(Debug, Deserialize)]
pub struct FuturesBalance {
    pub asset: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub balance: Decimal,
    #[serde(rename = "availableBalance", with = "rust_decimal::serde::str")]
    pub available_balance: Decimal,
}

/// GET /fapi/v1/ticker/price
#[derive(Debug, Deserialize)]
pub struct TickerPrice {
    pub symbol: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(default)]
    pub time: Option<i64>,
}

/// Query parameters for POST /fapi/v1/order (timestamp and signature are added by the client).
#[derive(Debug, Serialize)]
pub struct NewOrderParams<'a> {
    pub symbol: &'a str,
    pub side: &'a str,
    #[serde(rename = "type")]
    pub order_type: &'a str,
    pub quantity: String,
    #[serde(rename = "newClientOrderId")]
    pub client_order_id: &'a str,
    #[serde(rename = "newOrderRespType")]
    pub resp_type: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct OrderResponse {
    #[serde(rename = "orderId")]
    pub order_id: u64,
    pub symbol: String,
    pub status: String,
    #[serde(rename = "clientOrderId")]
    pub client_order_id: String,
    #[serde(rename = "origQty", with = "rust_decimal::serde::str")]
    pub orig_qty: Decimal,
    #[serde(rename = "executedQty", with = "rust_decimal::serde::str")]
    pub executed_qty: Decimal,
    #[serde(rename = "avgPrice", default)]
    pub avg_price: Option<String>,
}

/// Error body: `{"code":-2019,"msg":"Margin is insufficient."}`
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub code: i64,
    pub msg: String,
}
