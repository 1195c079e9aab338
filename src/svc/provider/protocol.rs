//! # Protocol module
//!
//! This module provide the messages exchanged with terraform: line-delimited
//! json-rpc requests and responses, their parameters and diagnostics.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::svc::provider::ProviderConfig;

// -----------------------------------------------------------------------------
// Constants

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

// -----------------------------------------------------------------------------
// RpcRequest structure

#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    #[serde(rename = "jsonrpc", default)]
    pub jsonrpc: Option<String>,
    #[serde(rename = "id")]
    pub id: i64,
    #[serde(rename = "method")]
    pub method: String,
    #[serde(rename = "params", default)]
    pub params: Value,
}

// -----------------------------------------------------------------------------
// RpcResponse structure

#[derive(Debug, Clone, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    /// null when the id of the request could not be read
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn success(id: Option<i64>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<i64>, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

// -----------------------------------------------------------------------------
// RpcError structure

#[derive(Debug, Clone, Serialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl RpcError {
    pub fn new(code: i32, message: String) -> Self {
        Self { code, message }
    }

    pub fn parse(err: serde_json::Error) -> Self {
        Self::new(PARSE_ERROR, format!("Parse error: {}", err))
    }

    pub fn invalid_request(version: &str) -> Self {
        Self::new(
            INVALID_REQUEST,
            format!(
                "Invalid request: unsupported json-rpc version '{}', expected '{}'",
                version, JSONRPC_VERSION
            ),
        )
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Method not found: {}", method))
    }

    pub fn invalid_params(err: serde_json::Error) -> Self {
        Self::new(INVALID_PARAMS, format!("Invalid params: {}", err))
    }

    pub fn internal(err: serde_json::Error) -> Self {
        Self::new(INTERNAL_ERROR, format!("Serialization error: {}", err))
    }
}

// -----------------------------------------------------------------------------
// Diagnostic structures

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<Vec<String>>,
}

impl Diagnostic {
    pub fn error(summary: &str) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.to_string(),
            detail: None,
            attribute: None,
        }
    }

    pub fn with_detail(mut self, detail: &str) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    pub fn with_attribute(mut self, path: Vec<String>) -> Self {
        self.attribute = Some(path);
        self
    }
}

// -----------------------------------------------------------------------------
// Parameters structures

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigureProviderParams {
    #[serde(default)]
    pub config: ProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidateResourceConfigParams {
    pub type_name: String,
    #[serde(default)]
    pub config: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpgradeResourceStateParams {
    pub type_name: String,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub raw_state: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanResourceChangeParams {
    pub type_name: String,
    #[serde(default)]
    pub prior_state: Value,
    #[serde(default)]
    pub proposed_new_state: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplyResourceChangeParams {
    pub type_name: String,
    #[serde(default)]
    pub prior_state: Value,
    #[serde(default)]
    pub planned_state: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadResourceParams {
    pub type_name: String,
    #[serde(default)]
    pub current_state: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportResourceStateParams {
    pub type_name: String,
    pub id: String,
}
