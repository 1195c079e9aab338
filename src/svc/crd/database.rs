//! # Database custom resource
//!
//! This module provide the schemahero database custom resource and the
//! connection blocks of each supported engine.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::svc::crd::ValueOrValueFrom;

// -----------------------------------------------------------------------------
// PostgresConnection structure

/// Connection to a postgres compatible engine, timescaledb included
#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct PostgresConnection {
    #[serde(rename = "uri", skip_serializing_if = "Option::is_none")]
    pub uri: Option<ValueOrValueFrom>,
    #[serde(rename = "host", skip_serializing_if = "Option::is_none")]
    pub host: Option<ValueOrValueFrom>,
    #[serde(rename = "port", skip_serializing_if = "Option::is_none")]
    pub port: Option<ValueOrValueFrom>,
    #[serde(rename = "user", skip_serializing_if = "Option::is_none")]
    pub user: Option<ValueOrValueFrom>,
    #[serde(rename = "password", skip_serializing_if = "Option::is_none")]
    pub password: Option<ValueOrValueFrom>,
    #[serde(rename = "dbname", skip_serializing_if = "Option::is_none")]
    pub dbname: Option<ValueOrValueFrom>,
    #[serde(rename = "sslmode", skip_serializing_if = "Option::is_none")]
    pub sslmode: Option<ValueOrValueFrom>,
    #[serde(rename = "schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<ValueOrValueFrom>,
}

// -----------------------------------------------------------------------------
// MysqlConnection structure

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct MysqlConnection {
    #[serde(rename = "uri", skip_serializing_if = "Option::is_none")]
    pub uri: Option<ValueOrValueFrom>,
    #[serde(rename = "host", skip_serializing_if = "Option::is_none")]
    pub host: Option<ValueOrValueFrom>,
    #[serde(rename = "port", skip_serializing_if = "Option::is_none")]
    pub port: Option<ValueOrValueFrom>,
    #[serde(rename = "user", skip_serializing_if = "Option::is_none")]
    pub user: Option<ValueOrValueFrom>,
    #[serde(rename = "password", skip_serializing_if = "Option::is_none")]
    pub password: Option<ValueOrValueFrom>,
    #[serde(rename = "dbname", skip_serializing_if = "Option::is_none")]
    pub dbname: Option<ValueOrValueFrom>,
    #[serde(rename = "collation", skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
    #[serde(rename = "disableTLS", skip_serializing_if = "Option::is_none")]
    pub disable_tls: Option<bool>,
}

// -----------------------------------------------------------------------------
// CockroachDbConnection structure

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct CockroachDbConnection {
    #[serde(rename = "uri", skip_serializing_if = "Option::is_none")]
    pub uri: Option<ValueOrValueFrom>,
    #[serde(rename = "host", skip_serializing_if = "Option::is_none")]
    pub host: Option<ValueOrValueFrom>,
    #[serde(rename = "port", skip_serializing_if = "Option::is_none")]
    pub port: Option<ValueOrValueFrom>,
    #[serde(rename = "user", skip_serializing_if = "Option::is_none")]
    pub user: Option<ValueOrValueFrom>,
    #[serde(rename = "password", skip_serializing_if = "Option::is_none")]
    pub password: Option<ValueOrValueFrom>,
    #[serde(rename = "dbname", skip_serializing_if = "Option::is_none")]
    pub dbname: Option<ValueOrValueFrom>,
    #[serde(rename = "sslmode", skip_serializing_if = "Option::is_none")]
    pub sslmode: Option<ValueOrValueFrom>,
}

// -----------------------------------------------------------------------------
// CassandraConnection structure

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct CassandraConnection {
    #[serde(rename = "hosts")]
    pub hosts: Vec<String>,
    #[serde(rename = "username", skip_serializing_if = "Option::is_none")]
    pub username: Option<ValueOrValueFrom>,
    #[serde(rename = "password", skip_serializing_if = "Option::is_none")]
    pub password: Option<ValueOrValueFrom>,
    #[serde(rename = "keyspace", skip_serializing_if = "Option::is_none")]
    pub keyspace: Option<ValueOrValueFrom>,
}

// -----------------------------------------------------------------------------
// SqliteConnection structure

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct SqliteConnection {
    #[serde(rename = "dsn")]
    pub dsn: ValueOrValueFrom,
}

// -----------------------------------------------------------------------------
// RqliteConnection structure

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct RqliteConnection {
    #[serde(rename = "uri", skip_serializing_if = "Option::is_none")]
    pub uri: Option<ValueOrValueFrom>,
    #[serde(rename = "host", skip_serializing_if = "Option::is_none")]
    pub host: Option<ValueOrValueFrom>,
    #[serde(rename = "port", skip_serializing_if = "Option::is_none")]
    pub port: Option<ValueOrValueFrom>,
    #[serde(rename = "user", skip_serializing_if = "Option::is_none")]
    pub user: Option<ValueOrValueFrom>,
    #[serde(rename = "password", skip_serializing_if = "Option::is_none")]
    pub password: Option<ValueOrValueFrom>,
}

// -----------------------------------------------------------------------------
// DatabaseConnection structure

/// Exactly one engine is expected to be set, the api server enforces it
#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct DatabaseConnection {
    #[serde(rename = "postgres", skip_serializing_if = "Option::is_none")]
    pub postgres: Option<PostgresConnection>,
    #[serde(rename = "mysql", skip_serializing_if = "Option::is_none")]
    pub mysql: Option<MysqlConnection>,
    #[serde(rename = "cockroachdb", skip_serializing_if = "Option::is_none")]
    pub cockroachdb: Option<CockroachDbConnection>,
    #[serde(rename = "cassandra", skip_serializing_if = "Option::is_none")]
    pub cassandra: Option<CassandraConnection>,
    #[serde(rename = "sqlite", skip_serializing_if = "Option::is_none")]
    pub sqlite: Option<SqliteConnection>,
    #[serde(rename = "rqlite", skip_serializing_if = "Option::is_none")]
    pub rqlite: Option<RqliteConnection>,
    #[serde(rename = "timescaledb", skip_serializing_if = "Option::is_none")]
    pub timescaledb: Option<PostgresConnection>,
}

// -----------------------------------------------------------------------------
// SchemaHero structure

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct SchemaHero {
    #[serde(rename = "image", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(rename = "nodeSelector", skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<BTreeMap<String, String>>,
}

// -----------------------------------------------------------------------------
// DatabaseTemplate structure

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct TemplateMetadata {
    #[serde(rename = "labels", skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(rename = "annotations", skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct DatabaseTemplate {
    #[serde(rename = "metadata", skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TemplateMetadata>,
}

// -----------------------------------------------------------------------------
// Spec structure

#[derive(CustomResource, JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
#[kube(group = "databases.schemahero.io")]
#[kube(version = "v1alpha4")]
#[kube(kind = "Database")]
#[kube(singular = "database")]
#[kube(plural = "databases")]
#[kube(namespaced)]
#[kube(derive = "PartialEq")]
pub struct Spec {
    #[serde(rename = "connection", skip_serializing_if = "Option::is_none")]
    pub connection: Option<DatabaseConnection>,
    #[serde(rename = "immediateDeploy", skip_serializing_if = "Option::is_none")]
    pub immediate_deploy: Option<bool>,
    #[serde(rename = "enableShellCommand", skip_serializing_if = "Option::is_none")]
    pub enable_shell_command: Option<bool>,
    #[serde(rename = "deploySeedData", skip_serializing_if = "Option::is_none")]
    pub deploy_seed_data: Option<bool>,
    #[serde(rename = "schemahero", skip_serializing_if = "Option::is_none")]
    pub schemahero: Option<SchemaHero>,
    #[serde(rename = "template", skip_serializing_if = "Option::is_none")]
    pub template: Option<DatabaseTemplate>,
}
