//! HTTP client for the chain indexer API: fetches inbound transfers for a
//! single receiving address with rate-limit and transport retries.

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::error::CoreError;

pub const DEPOSIT_OPCODE: u32 = 0x0000_0001;

/// One inbound transfer as reported by the chain API, already narrowed down
/// to the fields the indexer cares about.
#[derive(Debug, Clone)]
pub struct ChainTransaction {
    pub hash: String,
    pub logical_time: i64,
    pub sender: String,
    pub amount_chain_units: i64,
    pub success: bool,
    pub body: Option<Vec<u8>>,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    ok: bool,
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

pub struct ChainClient {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl ChainClient {
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        retry_attempts: u32,
        retry_delay_secs: u64,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client builder should never fail with defaults");

        Self {
            http,
            api_url,
            api_key,
            retry_attempts,
            retry_delay: Duration::from_secs(retry_delay_secs),
        }
    }

    /// Fetches up to `limit` most recent transactions for `address`.
    /// 429 gets exponential back-off; 5xx and transport errors retry with a
    /// fixed delay; any other 4xx aborts the call immediately.
    pub async fn get_transactions(
        &self,
        address: &str,
        limit: u32,
    ) -> Result<Vec<ChainTransaction>, CoreError> {
        let mut last_err: Option<CoreError> = None;

        for attempt in 0..self.retry_attempts {
            let mut req = self
                .http
                .get(format!("{}/getTransactions", self.api_url))
                .query(&[("address", address), ("limit", &limit.to_string())]);
            if let Some(key) = &self.api_key {
                req = req.header("X-API-Key", key.as_str());
            }

            let resp = match req.send().await {
                Ok(r) => r,
                Err(e) => {
                    warn!(error = %e, attempt, "chain API transport error, retrying");
                    last_err = Some(CoreError::TransientUpstream);
                    tokio::time::sleep(self.retry_delay).await;
                    continue;
                }
            };

            let status = resp.status();
            if status.as_u16() == 429 {
                let delay = self.retry_delay * (attempt + 1);
                warn!(?delay, attempt, "chain API rate limited, backing off");
                tokio::time::sleep(delay).await;
                last_err = Some(CoreError::TransientUpstream);
                continue;
            }
            if status.is_server_error() {
                warn!(%status, attempt, "chain API server error, retrying");
                last_err = Some(CoreError::TransientUpstream);
                tokio::time::sleep(self.retry_delay).await;
                continue;
            }
            if status.is_client_error() {
                return Err(CoreError::Validation(format!(
                    "chain API rejected request: {status}"
                )));
            }

            let envelope: ApiEnvelope = resp
                .json()
                .await
                .map_err(|_| CoreError::TransientUpstream)?;

            if !envelope.ok {
                return Err(CoreError::TransientUpstream.tap_log(envelope.error.as_deref()));
            }

            let raw = envelope.result.unwrap_or(serde_json::Value::Null);
            return Ok(parse_transactions(raw));
        }

        Err(last_err.unwrap_or(CoreError::TransientUpstream))
    }

    /// Parses `[4-byte opcode][8-byte user id]` out of a message body, both
    /// big-endian. Anything shorter than 12 bytes, or a non-matching opcode,
    /// is not a deposit.
    pub fn parse_deposit_memo(&self, body: &[u8]) -> Option<i64> {
        if body.len() < 12 {
            return None;
        }
        let opcode = u32::from_be_bytes(body[0..4].try_into().ok()?);
        if opcode != DEPOSIT_OPCODE {
            return None;
        }
        let user_id = i64::from_be_bytes(body[4..12].try_into().ok()?);
        if user_id <= 0 {
            return None;
        }
        Some(user_id)
    }
}

fn parse_transactions(raw: serde_json::Value) -> Vec<ChainTransaction> {
    let Some(items) = raw.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let tx_id = item.get("transaction_id")?;
            let hash = tx_id.get("hash")?.as_str()?.to_string();
            let logical_time = tx_id
                .get("lt")
                .and_then(|v| v.as_str().map(str::to_string).or_else(|| v.as_i64().map(|n| n.to_string())))
                .and_then(|s| s.parse::<i64>().ok())
                .unwrap_or(0);

            let in_msg = item.get("in_msg")?;
            let sender = in_msg.get("source").and_then(|v| v.as_str()).unwrap_or("").to_string();
            let amount_chain_units = in_msg
                .get("value")
                .and_then(|v| v.as_str().map(str::to_string).or_else(|| v.as_i64().map(|n| n.to_string())))
                .and_then(|s| s.parse::<i64>().ok())
                .unwrap_or(0);

            let body = in_msg
                .get("msg_data")
                .and_then(|d| d.get("body"))
                .and_then(|b| b.as_str())
                .and_then(|b64| base64_decode(b64));

            let out_msgs = item.get("out_msgs").and_then(|v| v.as_array());
            let success = !out_msgs.is_some_and(|msgs| {
                msgs.iter().any(|m| {
                    m.get("destination").and_then(|d| d.as_str()) == Some(sender.as_str())
                        && m.get("bounce").and_then(|b| b.as_bool()).unwrap_or(false)
                })
            });

            if sender.is_empty() {
                return None;
            }

            Some(ChainTransaction {
                hash,
                logical_time,
                sender,
                amount_chain_units,
                success,
                body,
            })
        })
        .collect()
}

fn base64_decode(s: &str) -> Option<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.decode(s).ok()
}

impl CoreError {
    fn tap_log(self, detail: Option<&str>) -> Self {
        if let Some(detail) = detail {
            warn!(detail, "chain API returned ok=false");
        }
        self
    }
}
