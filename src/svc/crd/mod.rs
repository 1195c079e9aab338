//! # Custom resource definition module
//!
//! This module provide custom resources exposed by the provider, their
//! structures and the value indirection shared by most of them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub mod database;
pub mod migration;
pub mod table;

// -----------------------------------------------------------------------------
// SecretKeyRef structure

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct SecretKeyRef {
    #[serde(rename = "name")]
    pub name: String,
    #[serde(rename = "key")]
    pub key: String,
}

// -----------------------------------------------------------------------------
// CredentialValueFrom structure

/// Source of an aws credential used to reach the parameter store. Unlike
/// [`ValueFrom`], it could only be sourced from a kubernetes secret.
#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct CredentialValueFrom {
    #[serde(rename = "secretKeyRef", skip_serializing_if = "Option::is_none")]
    pub secret_key_ref: Option<SecretKeyRef>,
}

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct CredentialValue {
    #[serde(rename = "value", skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "valueFrom", skip_serializing_if = "Option::is_none")]
    pub value_from: Option<CredentialValueFrom>,
}

// -----------------------------------------------------------------------------
// Ssm structure

/// Value stored in the aws systems manager parameter store
#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct Ssm {
    #[serde(rename = "name")]
    pub name: String,
    #[serde(rename = "withDecryption", skip_serializing_if = "Option::is_none")]
    pub with_decryption: Option<bool>,
    #[serde(rename = "accessKeyId", skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<CredentialValue>,
    #[serde(rename = "secretAccessKey", skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<CredentialValue>,
    #[serde(rename = "region", skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

// -----------------------------------------------------------------------------
// Vault structure

/// Value injected by the hashicorp vault agent
#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct Vault {
    #[serde(rename = "secret")]
    pub secret: String,
    #[serde(rename = "role")]
    pub role: String,
    #[serde(rename = "agentInject", skip_serializing_if = "Option::is_none")]
    pub agent_inject: Option<bool>,
    #[serde(
        rename = "kubernetesAuthEndpoint",
        skip_serializing_if = "Option::is_none"
    )]
    pub kubernetes_auth_endpoint: Option<String>,
    #[serde(rename = "endpoint", skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(rename = "serviceAccount", skip_serializing_if = "Option::is_none")]
    pub service_account: Option<String>,
    #[serde(
        rename = "serviceAccountNamespace",
        skip_serializing_if = "Option::is_none"
    )]
    pub service_account_namespace: Option<String>,
    #[serde(rename = "connectionTemplate", skip_serializing_if = "Option::is_none")]
    pub connection_template: Option<String>,
}

// -----------------------------------------------------------------------------
// ValueFrom structure

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct ValueFrom {
    #[serde(rename = "secretKeyRef", skip_serializing_if = "Option::is_none")]
    pub secret_key_ref: Option<SecretKeyRef>,
    #[serde(rename = "ssm", skip_serializing_if = "Option::is_none")]
    pub ssm: Option<Ssm>,
    #[serde(rename = "vault", skip_serializing_if = "Option::is_none")]
    pub vault: Option<Vault>,
}

// -----------------------------------------------------------------------------
// ValueOrValueFrom structure

/// A literal value or a reference to the backend which holds it
#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct ValueOrValueFrom {
    #[serde(rename = "value", skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "valueFrom", skip_serializing_if = "Option::is_none")]
    pub value_from: Option<ValueFrom>,
}

impl From<&str> for ValueOrValueFrom {
    fn from(value: &str) -> Self {
        Self {
            value: Some(value.to_owned()),
            value_from: None,
        }
    }
}

impl From<SecretKeyRef> for ValueOrValueFrom {
    fn from(secret_key_ref: SecretKeyRef) -> Self {
        Self {
            value: None,
            value_from: Some(ValueFrom {
                secret_key_ref: Some(secret_key_ref),
                ..Default::default()
            }),
        }
    }
}
