//! # Migration custom resource
//!
//! This module provide the schemahero migration custom resource

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------
// Spec structure

#[derive(CustomResource, JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
#[kube(group = "schemas.schemahero.io")]
#[kube(version = "v1alpha4")]
#[kube(kind = "Migration")]
#[kube(singular = "migration")]
#[kube(plural = "migrations")]
#[kube(status = "Status")]
#[kube(namespaced)]
#[kube(derive = "PartialEq")]
#[kube(
    printcolumn = r#"{"name":"phase", "type":"string", "description":"Phase", "jsonPath":".status.phase"}"#
)]
pub struct Spec {
    #[serde(rename = "databaseName")]
    pub database_name: String,
    #[serde(rename = "tableName")]
    pub table_name: String,
    #[serde(rename = "tableNamespace")]
    pub table_namespace: String,
    #[serde(rename = "generatedDDL", skip_serializing_if = "Option::is_none")]
    pub generated_ddl: Option<String>,
    #[serde(rename = "editedDDL", skip_serializing_if = "Option::is_none")]
    pub edited_ddl: Option<String>,
}

// -----------------------------------------------------------------------------
// Status structure

/// Written by the schemahero controller, never by the provider
#[derive(JsonSchema, Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct Status {
    #[serde(rename = "phase", skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(rename = "plannedAt", skip_serializing_if = "Option::is_none")]
    pub planned_at: Option<i64>,
    #[serde(rename = "approvedAt", skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<i64>,
    #[serde(rename = "rejectedAt", skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<i64>,
    #[serde(rename = "executedAt", skip_serializing_if = "Option::is_none")]
    pub executed_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn migration_keeps_ddl_acronyms_on_the_wire() {
        let spec = Spec {
            database_name: "app".into(),
            table_name: "users".into(),
            table_namespace: "schemahero".into(),
            generated_ddl: Some("create table users (id integer)".into()),
            edited_ddl: None,
        };

        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            json!({
                "databaseName": "app",
                "tableName": "users",
                "tableNamespace": "schemahero",
                "generatedDDL": "create table users (id integer)"
            })
        );
    }

    #[test]
    fn migration_status_is_optional() {
        let migration: Migration = serde_json::from_value(json!({
            "apiVersion": "schemas.schemahero.io/v1alpha4",
            "kind": "Migration",
            "metadata": { "name": "users-1", "namespace": "schemahero" },
            "spec": { "databaseName": "app", "tableName": "users", "tableNamespace": "schemahero" },
            "status": { "phase": "PLANNED", "plannedAt": 1700000000 }
        }))
        .unwrap();

        let status = migration.status.unwrap();
        assert_eq!(status.phase.as_deref(), Some("PLANNED"));
        assert_eq!(status.planned_at, Some(1700000000));
    }
}
