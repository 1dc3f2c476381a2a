// ===============================
// src/gateway.rs
// ===============================
//
// Signed Bitunix futures REST calls. One reqwest client is reused for the
// process lifetime; every request carries the headers from `signing`.
// Response payloads arrive under one of a few alternate keys (`data`,
// `result`, `list`) depending on the endpoint.

use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::Settings;
use crate::signing;

const API_PREFIX: &str = "/api/v1";
const LOG_BODY_MAX: usize = 500;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("http {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("undecodable body (http {status}): {body}")]
    Decode { status: StatusCode, body: String },
    #[error("encode: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("symbol not found: {0}")]
    SymbolNotFound(String),
}

/// Outcome of a best-effort cancel. `Failed` is for the caller to log and
/// deliberately ignore: an already-flat position may have nothing to cancel.
#[derive(Debug)]
pub enum CancelOutcome {
    Cancelled,
    Nothing,
    Failed(GatewayError),
}

#[derive(Serialize)]
struct SymbolBody<'a> {
    symbol: &'a str,
}

// Field order below is the order Bitunix signs; serde keeps declaration
// order when serializing, so do not reorder.
#[derive(Serialize)]
struct PlaceStopBody<'a> {
    symbol: &'a str,
    #[serde(rename = "positionId")]
    position_id: &'a str,
    #[serde(rename = "slPrice")]
    sl_price: String,
    #[serde(rename = "slStopType")]
    sl_stop_type: &'a str,
    #[serde(rename = "slOrderType")]
    sl_order_type: &'a str,
    #[serde(rename = "slQty")]
    sl_qty: String,
}

pub struct Gateway {
    http: Client,
    api_key: String,
    api_secret: String,
    base_url: String,
}

impl Gateway {
    pub fn new(settings: &Settings) -> Self {
        let http = Client::builder()
            .timeout(settings.http_timeout)
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key: settings.api_key.clone(),
            api_secret: settings.api_secret.clone(),
            base_url: settings.base_url.clone(),
        }
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
        body_json: Option<String>,
    ) -> Result<Value, GatewayError> {
        let mut url = format!("{}{}{}", self.base_url, API_PREFIX, path);
        if !params.is_empty() {
            let query = params
                .iter()
                .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            url = format!("{url}?{query}");
        }

        let headers = signing::auth_headers(
            &self.api_key,
            &self.api_secret,
            method.as_str(),
            params,
            body_json.as_deref(),
        );

        let mut req = self.http.request(method.clone(), url.as_str());
        for (name, value) in headers {
            req = req.header(name, value);
        }
        if let Some(raw) = &body_json {
            req = req.body(raw.clone());
        }

        let rsp = req.send().await?;
        let status = rsp.status();
        let text = rsp.text().await?;
        if !status.is_success() {
            return Err(GatewayError::Api {
                status,
                body: truncated(&text),
            });
        }
        let data: Value = serde_json::from_str(&text).map_err(|_| GatewayError::Decode {
            status,
            body: truncated(&text),
        })?;
        debug!(%method, %path, response = %truncated(&text), "exchange call");
        Ok(data)
    }

    /// Instrument metadata for one exact symbol spelling.
    pub async fn trading_pair(&self, symbol: &str) -> Result<Value, GatewayError> {
        let params = vec![("symbols".to_string(), symbol.to_string())];
        let data = self
            .request(Method::GET, "/futures/market/trading_pairs", &params, None)
            .await?;
        payload_items(&data)
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::SymbolNotFound(symbol.to_string()))
    }

    /// Every open position on the account; symbol filtering is client-side.
    pub async fn pending_positions(&self) -> Result<Vec<Value>, GatewayError> {
        let data = self
            .request(Method::GET, "/futures/position/get_pending_positions", &[], None)
            .await?;
        Ok(payload_items(&data))
    }

    pub async fn cancel_all_orders(&self, symbol: &str) -> Result<Value, GatewayError> {
        let raw = serde_json::to_string(&SymbolBody { symbol })?;
        self.request(Method::POST, "/futures/trade/cancel_all_orders", &[], Some(raw))
            .await
    }

    /// Best-effort TP/SL sweep; never returns an error.
    pub async fn cancel_all_tpsl(&self, symbol: &str) -> CancelOutcome {
        let raw = match serde_json::to_string(&SymbolBody { symbol }) {
            Ok(b) => b,
            Err(e) => return CancelOutcome::Failed(GatewayError::Encode(e)),
        };
        match self
            .request(Method::POST, "/futures/tpsl/cancel_all", &[], Some(raw))
            .await
        {
            Ok(data) if payload_items(&data).is_empty() => CancelOutcome::Nothing,
            Ok(_) => CancelOutcome::Cancelled,
            Err(e) => CancelOutcome::Failed(e),
        }
    }

    /// Place the stop: last-price trigger, market execution, quantity equal
    /// to the position's absolute size. Prices and quantities go as strings.
    pub async fn place_stop(
        &self,
        symbol: &str,
        position_id: &str,
        sl_price: f64,
        sl_qty: f64,
    ) -> Result<Value, GatewayError> {
        let body = PlaceStopBody {
            symbol,
            position_id,
            sl_price: sl_price.to_string(),
            sl_stop_type: "LAST_PRICE",
            sl_order_type: "MARKET",
            sl_qty: sl_qty.to_string(),
        };
        let raw = serde_json::to_string(&body)?;
        self.request(Method::POST, "/futures/tpsl/place_order", &[], Some(raw))
            .await
    }
}

/// Payload list from whichever alternate key is present and non-null.
/// A bare object payload becomes a single-item list.
pub fn payload_items(data: &Value) -> Vec<Value> {
    for key in ["data", "result", "list"] {
        match data.get(key) {
            Some(Value::Array(items)) => return items.clone(),
            Some(Value::Null) | None => continue,
            Some(other) => return vec![other.clone()],
        }
    }
    Vec::new()
}

fn truncated(s: &str) -> String {
    if s.chars().count() <= LOG_BODY_MAX {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(LOG_BODY_MAX).collect();
        out.push('…');
        out
    }
}
