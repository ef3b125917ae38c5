//! XenAPI client over the pool master's JSON-RPC endpoint.
//!
//! Requests are JSON-RPC 2.0 `POST`s to `<url>/jsonrpc`. A XenAPI failure
//! comes back as a JSON-RPC error whose `data` holds `[code, params...]`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::error::{ApiResult, XenApiError};
use crate::traits::XenApi;
use crate::types::*;

/// Version string sent with `session.login_with_password`.
const API_VERSION: &str = "1.0";
/// Originator string reported to the pool.
const ORIGINATOR: &str = "xenvif";

/// XenAPI client speaking JSON-RPC over HTTP(S).
pub struct JsonRpcXenApi {
    http: reqwest::Client,
    endpoint: String,
    next_id: AtomicU64,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl RpcError {
    fn into_api_error(self) -> XenApiError {
        let mut parts: Vec<String> = match self.data {
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect(),
            _ => Vec::new(),
        };

        if parts.is_empty() {
            return XenApiError::Api {
                code: self.message,
                params: Vec::new(),
            };
        }
        let code = parts.remove(0);
        XenApiError::Api { code, params: parts }
    }
}

impl JsonRpcXenApi {
    /// Create a client for the pool master at `url` (e.g. `https://xen01`).
    ///
    /// `accept_invalid_certs` disables TLS verification, for pools still on
    /// their self-signed certificate.
    pub fn new(url: &str, timeout: Duration, accept_invalid_certs: bool) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(|e| XenApiError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: format!("{}/jsonrpc", url.trim_end_matches('/')),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> ApiResult<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });
        debug!(method, id, "XenAPI call");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| XenApiError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(XenApiError::Transport(format!("{} returned HTTP {}", method, status)));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| XenApiError::Protocol(format!("{}: {}", method, e)))?;
        decode_response(method, body)
    }
}

fn decode_response<T: DeserializeOwned>(method: &str, body: RpcResponse) -> ApiResult<T> {
    if let Some(error) = body.error {
        return Err(error.into_api_error());
    }
    let result = body.result.unwrap_or(Value::Null);
    trace!(method, %result, "XenAPI result");
    serde_json::from_value(result).map_err(|e| XenApiError::Protocol(format!("{}: {}", method, e)))
}

fn session_param(session: &SessionRef) -> Value {
    Value::String(session.to_string())
}

#[async_trait]
impl XenApi for JsonRpcXenApi {
    async fn login(&self, username: &str, password: &str) -> ApiResult<SessionRef> {
        self.call(
            "session.login_with_password",
            vec![json!(username), json!(password), json!(API_VERSION), json!(ORIGINATOR)],
        )
        .await
    }

    async fn logout(&self, session: &SessionRef) -> ApiResult<()> {
        let _: Value = self.call("session.logout", vec![session_param(session)]).await?;
        Ok(())
    }

    async fn network_get_by_uuid(&self, session: &SessionRef, uuid: &str) -> ApiResult<NetworkRef> {
        self.call("network.get_by_uuid", vec![session_param(session), json!(uuid)])
            .await
    }

    async fn network_get_by_name_label(
        &self,
        session: &SessionRef,
        name_label: &str,
    ) -> ApiResult<Vec<NetworkRef>> {
        self.call("network.get_by_name_label", vec![session_param(session), json!(name_label)])
            .await
    }

    async fn network_get_record(
        &self,
        session: &SessionRef,
        network: &NetworkRef,
    ) -> ApiResult<NetworkRecord> {
        self.call("network.get_record", vec![session_param(session), json!(network)])
            .await
    }

    async fn vm_get_by_uuid(&self, session: &SessionRef, uuid: &str) -> ApiResult<VmRef> {
        self.call("VM.get_by_uuid", vec![session_param(session), json!(uuid)])
            .await
    }

    async fn vm_get_by_name_label(&self, session: &SessionRef, name_label: &str) -> ApiResult<Vec<VmRef>> {
        self.call("VM.get_by_name_label", vec![session_param(session), json!(name_label)])
            .await
    }

    async fn vm_get_record(&self, session: &SessionRef, vm: &VmRef) -> ApiResult<VmRecord> {
        self.call("VM.get_record", vec![session_param(session), json!(vm)])
            .await
    }

    async fn vif_create(&self, session: &SessionRef, record: &VifRecord) -> ApiResult<VifRef> {
        let record = serde_json::to_value(record)
            .map_err(|e| XenApiError::Internal(format!("Failed to encode VIF record: {}", e)))?;
        self.call("VIF.create", vec![session_param(session), record])
            .await
    }

    async fn vif_get_record(&self, session: &SessionRef, vif: &VifRef) -> ApiResult<VifRecord> {
        self.call("VIF.get_record", vec![session_param(session), json!(vif)])
            .await
    }

    async fn vif_plug(&self, session: &SessionRef, vif: &VifRef) -> ApiResult<()> {
        let _: Value = self.call("VIF.plug", vec![session_param(session), json!(vif)]).await?;
        Ok(())
    }

    async fn vif_unplug(&self, session: &SessionRef, vif: &VifRef) -> ApiResult<()> {
        let _: Value = self.call("VIF.unplug", vec![session_param(session), json!(vif)]).await?;
        Ok(())
    }

    async fn vif_destroy(&self, session: &SessionRef, vif: &VifRef) -> ApiResult<()> {
        let _: Value = self.call("VIF.destroy", vec![session_param(session), json!(vif)]).await?;
        Ok(())
    }
}
