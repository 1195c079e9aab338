//! # State module
//!
//! This module provide conversions between terraform values and kubernetes
//! manifests, and the typed view of the root attributes of a resource state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::svc::provider::schema::{AttributeType, NestingMode, SchemaAttribute};

// -----------------------------------------------------------------------------
// Error enum

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("Expected import identifier with format: 'namespace/name' Got: '{0}'")]
    NamespacedIdentifier(String),
    #[error("Expected import identifier with format: 'name' Got: '{0}'")]
    ClusterIdentifier(String),
}

// -----------------------------------------------------------------------------
// Metadata structure

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct Metadata {
    #[serde(rename = "name")]
    pub name: String,
    #[serde(rename = "namespace", default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(rename = "labels", default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(rename = "annotations", default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

// -----------------------------------------------------------------------------
// Model structure

/// Root attributes of the state of a resource, the spec is kept as a raw
/// terraform value as its shape depends on the custom resource
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug, Default)]
pub struct Model {
    #[serde(rename = "id", default)]
    pub id: Option<String>,
    #[serde(rename = "api_version", default)]
    pub api_version: Option<String>,
    #[serde(rename = "kind", default)]
    pub kind: Option<String>,
    #[serde(rename = "field_manager", default)]
    pub field_manager: Option<String>,
    #[serde(rename = "force_conflicts", default)]
    pub force_conflicts: Option<bool>,
    #[serde(rename = "deletion_propagation", default)]
    pub deletion_propagation: Option<String>,
    #[serde(rename = "metadata")]
    pub metadata: Metadata,
    #[serde(rename = "spec", default)]
    pub spec: Value,
}

// -----------------------------------------------------------------------------
// Identifier helpers

/// returns the identifier of a resource, `namespace/name` or `name` when the
/// resource is cluster scoped
pub fn identifier(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(namespace) => format!("{}/{}", namespace, name),
        None => name.to_string(),
    }
}

/// returns the namespace and name of the given import identifier
pub fn parse_import_id(id: &str, namespaced: bool) -> Result<(Option<String>, String), Error> {
    if !namespaced {
        if id.is_empty() || id.contains('/') {
            return Err(Error::ClusterIdentifier(id.to_string()));
        }

        return Ok((None, id.to_string()));
    }

    match id.split('/').collect::<Vec<_>>().as_slice() {
        [namespace, name] if !namespace.is_empty() && !name.is_empty() => {
            Ok((Some(namespace.to_string()), name.to_string()))
        }
        _ => Err(Error::NamespacedIdentifier(id.to_string())),
    }
}

// -----------------------------------------------------------------------------
// Conversion helpers

/// returns the number as an integer when it has no fractional part, terraform
/// numbers are arbitrary precision and may come back as floats
pub fn normalize(number: &Number) -> Number {
    match number.as_f64() {
        Some(f) if number.is_f64() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Number::from(f as i64)
        }
        _ => number.to_owned(),
    }
}

fn json_name<'a>(name: &'a str, attribute: &'a SchemaAttribute) -> &'a str {
    attribute.json_name.as_deref().unwrap_or(name)
}

fn typed_to_manifest(attr_type: &AttributeType, value: &Value) -> Option<Value> {
    match (attr_type, value) {
        (_, Value::Null) => None,
        (AttributeType::Number, Value::Number(n)) => Some(Value::Number(normalize(n))),
        (AttributeType::List(inner), Value::Array(elements)) => Some(Value::Array(
            elements
                .iter()
                .filter_map(|element| typed_to_manifest(inner, element))
                .collect(),
        )),
        (AttributeType::Map(inner), Value::Object(elements)) => Some(Value::Object(
            elements
                .iter()
                .filter_map(|(k, v)| typed_to_manifest(inner, v).map(|v| (k.to_owned(), v)))
                .collect(),
        )),
        (_, value) => Some(value.to_owned()),
    }
}

/// returns the kubernetes object of the given terraform object, keys are
/// renamed to their kubernetes name and null attributes are omitted
pub fn object_to_manifest(attributes: &BTreeMap<String, SchemaAttribute>, value: &Value) -> Option<Value> {
    let fields = value.as_object()?;

    Some(Value::Object(
        attributes
            .iter()
            .filter_map(|(name, attribute)| {
                let inner = fields.get(name)?;

                to_manifest(attribute, inner)
                    .map(|inner| (json_name(name, attribute).to_string(), inner))
            })
            .collect(),
    ))
}

/// returns the kubernetes json of the terraform value of the attribute, none
/// if the value is null
pub fn to_manifest(attribute: &SchemaAttribute, value: &Value) -> Option<Value> {
    if value.is_null() {
        return None;
    }

    match (&attribute.nested_type, &attribute.attr_type) {
        (Some(nested), _) => match (&nested.nesting_mode, value) {
            (NestingMode::Single, _) => object_to_manifest(&nested.attributes, value),
            (NestingMode::List, Value::Array(elements)) => Some(Value::Array(
                elements
                    .iter()
                    .filter_map(|element| object_to_manifest(&nested.attributes, element))
                    .collect(),
            )),
            (NestingMode::Map, Value::Object(elements)) => Some(Value::Object(
                elements
                    .iter()
                    .filter_map(|(k, v)| {
                        object_to_manifest(&nested.attributes, v).map(|v| (k.to_owned(), v))
                    })
                    .collect(),
            )),
            _ => None,
        },
        (None, Some(attr_type)) => typed_to_manifest(attr_type, value),
        (None, None) => Some(value.to_owned()),
    }
}

/// returns the terraform object of the given kubernetes object, every declared
/// attribute is present and null when the kubernetes field is absent
pub fn object_from_manifest(attributes: &BTreeMap<String, SchemaAttribute>, value: &Value) -> Value {
    let fields = match value.as_object() {
        Some(fields) => fields,
        None => return Value::Null,
    };

    Value::Object(
        attributes
            .iter()
            .map(|(name, attribute)| {
                let inner = fields
                    .get(json_name(name, attribute))
                    .map(|inner| from_manifest(attribute, inner))
                    .unwrap_or(Value::Null);

                (name.to_owned(), inner)
            })
            .collect::<Map<_, _>>(),
    )
}

/// returns the terraform value of the attribute from its kubernetes json
pub fn from_manifest(attribute: &SchemaAttribute, value: &Value) -> Value {
    let nested = match &attribute.nested_type {
        Some(nested) => nested,
        None => {
            return match value {
                Value::Number(n) => Value::Number(normalize(n)),
                value => value.to_owned(),
            }
        }
    };

    match (&nested.nesting_mode, value) {
        (NestingMode::Single, _) => object_from_manifest(&nested.attributes, value),
        (NestingMode::List, Value::Array(elements)) => Value::Array(
            elements
                .iter()
                .map(|element| object_from_manifest(&nested.attributes, element))
                .collect(),
        ),
        (NestingMode::Map, Value::Object(elements)) => Value::Object(
            elements
                .iter()
                .map(|(k, v)| (k.to_owned(), object_from_manifest(&nested.attributes, v)))
                .collect(),
        ),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use kube::CustomResourceExt;
    use serde_json::json;

    use super::*;
    use crate::svc::{
        crd::{database::Database, table::Table},
        provider::schema,
    };

    fn spec<T: CustomResourceExt>() -> SchemaAttribute {
        schema::spec(&T::crd(), "v1alpha4").unwrap()
    }

    #[test]
    fn import_identifier_requires_namespace_and_name() {
        assert_eq!(
            parse_import_id("schemahero/app", true),
            Ok((Some("schemahero".into()), "app".into()))
        );

        for id in ["app", "/app", "schemahero/", "a/b/c", ""] {
            let err = parse_import_id(id, true).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!(
                    "Expected import identifier with format: 'namespace/name' Got: '{}'",
                    id
                )
            );
        }

        assert_eq!(parse_import_id("app", false), Ok((None, "app".into())));
        assert!(parse_import_id("schemahero/app", false).is_err());
    }

    #[test]
    fn identifier_joins_namespace_and_name() {
        assert_eq!(identifier(Some("schemahero"), "app"), "schemahero/app");
        assert_eq!(identifier(None, "app"), "app");
    }

    #[test]
    fn normalize_integral_floats() {
        assert_eq!(normalize(&Number::from_f64(3.0).unwrap()), Number::from(3));
        assert_eq!(
            normalize(&Number::from_f64(3.5).unwrap()),
            Number::from_f64(3.5).unwrap()
        );
        assert_eq!(normalize(&Number::from(-2)), Number::from(-2));
    }

    #[test]
    fn to_manifest_renames_keys_and_drops_nulls() {
        let attribute = spec::<Database>();
        let value = json!({
            "immediate_deploy": true,
            "enable_shell_command": null,
            "deploy_seed_data": null,
            "schemahero": null,
            "template": null,
            "connection": {
                "mysql": null,
                "postgres": {
                    "uri": {
                        "value": null,
                        "value_from": {
                            "secret_key_ref": { "name": "postgres", "key": "uri" },
                            "ssm": null,
                            "vault": null
                        }
                    },
                    "host": null
                }
            }
        });

        assert_eq!(
            to_manifest(&attribute, &value),
            Some(json!({
                "immediateDeploy": true,
                "connection": {
                    "postgres": {
                        "uri": { "valueFrom": { "secretKeyRef": { "name": "postgres", "key": "uri" } } }
                    }
                }
            }))
        );
    }

    #[test]
    fn to_manifest_keeps_empty_objects_set_by_the_user() {
        let attribute = spec::<Database>();
        let value = json!({ "connection": { "sqlite": {} } });

        assert_eq!(
            to_manifest(&attribute, &value),
            Some(json!({ "connection": { "sqlite": {} } }))
        );
    }

    #[test]
    fn from_manifest_fills_absent_attributes_with_null() {
        let attribute = spec::<Table>();
        let manifest = json!({
            "database": "app",
            "name": "users",
            "schema": {
                "postgres": {
                    "primaryKey": ["id"],
                    "columns": [{ "name": "id", "type": "integer" }]
                }
            },
            "seedData": { "rows": [{ "columns": [{ "column": "id", "value": { "int": 1.0 } }] }] }
        });

        let state = from_manifest(&attribute, &manifest);

        assert_eq!(state["database"], "app");
        assert!(state["requires"].is_null());
        assert!(state["schema"]["mysql"].is_null());
        assert_eq!(state["schema"]["postgres"]["primary_key"], json!(["id"]));
        assert_eq!(state["schema"]["postgres"]["columns"][0]["type"], "integer");
        assert!(state["schema"]["postgres"]["columns"][0]["constraints"].is_null());
        assert_eq!(
            state["seed_data"]["rows"][0]["columns"][0]["value"],
            json!({ "int": 1, "str": null })
        );

        let manifest = to_manifest(&attribute, &state).unwrap();
        assert_eq!(
            manifest["seedData"]["rows"][0]["columns"][0]["value"],
            json!({ "int": 1 })
        );
    }

    #[test]
    fn model_reads_root_attributes() {
        let model: Model = serde_json::from_value(json!({
            "id": null,
            "field_manager": "platform-team",
            "metadata": { "name": "app", "namespace": "schemahero", "labels": null },
            "spec": { "database": "app" }
        }))
        .unwrap();

        assert_eq!(model.field_manager.as_deref(), Some("platform-team"));
        assert_eq!(model.force_conflicts, None);
        assert_eq!(model.metadata.namespace.as_deref(), Some("schemahero"));
        assert_eq!(model.metadata.labels, None);
        assert_eq!(model.spec["database"], "app");
    }
}
