//! # Table custom resource
//!
//! This module provide the schemahero table custom resource

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------
// Column structures

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct ColumnConstraints {
    #[serde(rename = "notNull", skip_serializing_if = "Option::is_none")]
    pub not_null: Option<bool>,
}

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct ColumnAttributes {
    #[serde(rename = "autoIncrement", skip_serializing_if = "Option::is_none")]
    pub auto_increment: Option<bool>,
}

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct Column {
    #[serde(rename = "name")]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "constraints", skip_serializing_if = "Option::is_none")]
    pub constraints: Option<ColumnConstraints>,
    #[serde(rename = "attributes", skip_serializing_if = "Option::is_none")]
    pub attributes: Option<ColumnAttributes>,
    #[serde(rename = "default", skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

// -----------------------------------------------------------------------------
// Index structure

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct Index {
    #[serde(rename = "columns")]
    pub columns: Vec<String>,
    #[serde(rename = "name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "isUnique", skip_serializing_if = "Option::is_none")]
    pub is_unique: Option<bool>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

// -----------------------------------------------------------------------------
// ForeignKey structures

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct ForeignKeyReferences {
    #[serde(rename = "table")]
    pub table: String,
    #[serde(rename = "columns")]
    pub columns: Vec<String>,
}

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct ForeignKey {
    #[serde(rename = "columns")]
    pub columns: Vec<String>,
    #[serde(rename = "references")]
    pub references: ForeignKeyReferences,
    #[serde(rename = "name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "onDelete", skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
}

// -----------------------------------------------------------------------------
// SqlTableSchema structure

/// Table layout shared by the sql engines
#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct SqlTableSchema {
    #[serde(rename = "primaryKey", skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<Vec<String>>,
    #[serde(rename = "foreignKeys", skip_serializing_if = "Option::is_none")]
    pub foreign_keys: Option<Vec<ForeignKey>>,
    #[serde(rename = "indexes", skip_serializing_if = "Option::is_none")]
    pub indexes: Option<Vec<Index>>,
    #[serde(rename = "columns", skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<Column>>,
    #[serde(rename = "isDeleted", skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
}

// -----------------------------------------------------------------------------
// CassandraTableSchema structure

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct CassandraColumn {
    #[serde(rename = "name")]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "isStatic", skip_serializing_if = "Option::is_none")]
    pub is_static: Option<bool>,
}

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct CassandraTableSchema {
    #[serde(rename = "primaryKey", skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<Vec<Vec<String>>>,
    #[serde(rename = "columns", skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<CassandraColumn>>,
    #[serde(rename = "isDeleted", skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,
}

// -----------------------------------------------------------------------------
// TableSchema structure

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct TableSchema {
    #[serde(rename = "postgres", skip_serializing_if = "Option::is_none")]
    pub postgres: Option<SqlTableSchema>,
    #[serde(rename = "mysql", skip_serializing_if = "Option::is_none")]
    pub mysql: Option<SqlTableSchema>,
    #[serde(rename = "cockroachdb", skip_serializing_if = "Option::is_none")]
    pub cockroachdb: Option<SqlTableSchema>,
    #[serde(rename = "timescaledb", skip_serializing_if = "Option::is_none")]
    pub timescaledb: Option<SqlTableSchema>,
    #[serde(rename = "sqlite", skip_serializing_if = "Option::is_none")]
    pub sqlite: Option<SqlTableSchema>,
    #[serde(rename = "rqlite", skip_serializing_if = "Option::is_none")]
    pub rqlite: Option<SqlTableSchema>,
    #[serde(rename = "cassandra", skip_serializing_if = "Option::is_none")]
    pub cassandra: Option<CassandraTableSchema>,
}

// -----------------------------------------------------------------------------
// SeedData structures

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct SeedDataValue {
    #[serde(rename = "int", skip_serializing_if = "Option::is_none")]
    pub int: Option<i64>,
    #[serde(rename = "str", skip_serializing_if = "Option::is_none")]
    pub str: Option<String>,
}

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct SeedDataColumn {
    #[serde(rename = "column")]
    pub column: String,
    #[serde(rename = "value")]
    pub value: SeedDataValue,
}

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct SeedDataRow {
    #[serde(rename = "columns")]
    pub columns: Vec<SeedDataColumn>,
}

#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct SeedData {
    #[serde(rename = "rows")]
    pub rows: Vec<SeedDataRow>,
}

// -----------------------------------------------------------------------------
// Spec structure

#[derive(CustomResource, JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
#[kube(group = "schemas.schemahero.io")]
#[kube(version = "v1alpha4")]
#[kube(kind = "Table")]
#[kube(singular = "table")]
#[kube(plural = "tables")]
#[kube(namespaced)]
#[kube(derive = "PartialEq")]
#[kube(
    printcolumn = r#"{"name":"table", "type":"string", "description":"Table", "jsonPath":".spec.name"}"#
)]
#[kube(
    printcolumn = r#"{"name":"database", "type":"string", "description":"Database", "jsonPath":".spec.database"}"#
)]
pub struct Spec {
    #[serde(rename = "database")]
    pub database: String,
    #[serde(rename = "name")]
    pub name: String,
    #[serde(rename = "requires", skip_serializing_if = "Option::is_none")]
    pub requires: Option<Vec<String>>,
    #[serde(rename = "schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<TableSchema>,
    #[serde(rename = "seedData", skip_serializing_if = "Option::is_none")]
    pub seed_data: Option<SeedData>,
}
