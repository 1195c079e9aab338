//! # Schema module
//!
//! This module provide terraform schema structures and derives the schema of
//! a resource from the openapi schema of its custom resource definition.

use std::collections::BTreeMap;

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceDefinition, JSONSchemaProps, JSONSchemaPropsOrArray, JSONSchemaPropsOrBool,
};
use serde::Serialize;
use serde_json::Value;

use crate::svc::provider::protocol::Diagnostic;

// -----------------------------------------------------------------------------
// Constants

pub const RESOURCE_SCHEMA_VERSION: i64 = 1;

// -----------------------------------------------------------------------------
// AttributeType enum

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Number,
    Bool,
    /// Any json value, used for fields preserving unknown fields
    Dynamic,
    List(Box<AttributeType>),
    Map(Box<AttributeType>),
}

// -----------------------------------------------------------------------------
// NestedAttributes structure

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NestingMode {
    Single,
    List,
    Map,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NestedAttributes {
    pub nesting_mode: NestingMode,
    pub attributes: BTreeMap<String, SchemaAttribute>,
}

// -----------------------------------------------------------------------------
// SchemaAttribute structure

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaAttribute {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub attr_type: Option<AttributeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested_type: Option<NestedAttributes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    /// Name of the field on the kubernetes side
    #[serde(skip)]
    pub json_name: Option<String>,
}

impl SchemaAttribute {
    pub fn of(attr_type: AttributeType) -> Self {
        Self {
            attr_type: Some(attr_type),
            nested_type: None,
            description: None,
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            json_name: None,
        }
    }

    pub fn string() -> Self {
        Self::of(AttributeType::String)
    }

    pub fn number() -> Self {
        Self::of(AttributeType::Number)
    }

    pub fn bool() -> Self {
        Self::of(AttributeType::Bool)
    }

    pub fn dynamic() -> Self {
        Self::of(AttributeType::Dynamic)
    }

    pub fn map(element_type: AttributeType) -> Self {
        Self::of(AttributeType::Map(Box::new(element_type)))
    }

    pub fn nested(nesting_mode: NestingMode, attributes: BTreeMap<String, SchemaAttribute>) -> Self {
        Self {
            attr_type: None,
            nested_type: Some(NestedAttributes {
                nesting_mode,
                attributes,
            }),
            ..Self::dynamic()
        }
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    pub fn with_json_name(mut self, name: &str) -> Self {
        self.json_name = Some(name.to_string());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }
}

// -----------------------------------------------------------------------------
// Block and schema structures

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SchemaBlock {
    pub attributes: BTreeMap<String, SchemaAttribute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SchemaBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: &str, attr: SchemaAttribute) -> Self {
        self.attributes.insert(name.to_string(), attr);
        self
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceSchema {
    pub version: i64,
    pub block: SchemaBlock,
}

impl ResourceSchema {
    pub fn new(version: i64, block: SchemaBlock) -> Self {
        Self { version, block }
    }

    pub fn attribute(&self, name: &str) -> Option<&SchemaAttribute> {
        self.block.attributes.get(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderSchema {
    pub provider: SchemaBlock,
    pub resource_schemas: BTreeMap<String, ResourceSchema>,
}

impl ProviderSchema {
    pub fn new(provider: SchemaBlock) -> Self {
        Self {
            provider,
            resource_schemas: BTreeMap::new(),
        }
    }

    pub fn with_resource(mut self, name: &str, schema: ResourceSchema) -> Self {
        self.resource_schemas.insert(name.to_string(), schema);
        self
    }
}

// -----------------------------------------------------------------------------
// Naming helpers

/// returns the terraform name of a kubernetes field, `secretKeyRef` becomes
/// `secret_key_ref` and `generatedDDL` becomes `generated_ddl`
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut result = String::with_capacity(name.len() + 4);

    for (idx, c) in chars.iter().enumerate() {
        if c.is_uppercase() && idx > 0 {
            let previous = chars[idx - 1];
            let next_is_lower = chars.get(idx + 1).map_or(false, |n| n.is_lowercase());

            if previous.is_lowercase()
                || previous.is_ascii_digit()
                || (previous.is_uppercase() && next_is_lower)
            {
                result.push('_');
            }
        }

        if *c == '-' || *c == '.' {
            result.push('_');
        } else {
            result.extend(c.to_lowercase());
        }
    }

    result
}

// -----------------------------------------------------------------------------
// OpenAPI conversion

fn is_int_or_string(props: &JSONSchemaProps) -> bool {
    props.x_kubernetes_int_or_string == Some(true)
}

fn has_properties(props: &JSONSchemaProps) -> bool {
    props.properties.as_ref().map_or(false, |p| !p.is_empty())
}

fn items(props: &JSONSchemaProps) -> Option<&JSONSchemaProps> {
    match &props.items {
        Some(JSONSchemaPropsOrArray::Schema(inner)) => Some(inner.as_ref()),
        Some(JSONSchemaPropsOrArray::Schemas(inner)) => inner.first(),
        None => None,
    }
}

fn additional_properties(props: &JSONSchemaProps) -> Option<&JSONSchemaProps> {
    match &props.additional_properties {
        Some(JSONSchemaPropsOrBool::Schema(inner)) => Some(inner.as_ref()),
        _ => None,
    }
}

/// returns the type of a schema which does not hold any object with declared
/// properties, none otherwise
fn attribute_type(props: &JSONSchemaProps) -> Option<AttributeType> {
    if is_int_or_string(props) {
        return Some(AttributeType::String);
    }

    match props.type_.as_deref() {
        Some("string") => Some(AttributeType::String),
        Some("integer") | Some("number") => Some(AttributeType::Number),
        Some("boolean") => Some(AttributeType::Bool),
        Some("array") => match items(props) {
            Some(inner) => attribute_type(inner).map(|t| AttributeType::List(Box::new(t))),
            None => Some(AttributeType::List(Box::new(AttributeType::Dynamic))),
        },
        Some("object") if has_properties(props) => None,
        Some("object") => match additional_properties(props) {
            Some(inner) => attribute_type(inner).map(|t| AttributeType::Map(Box::new(t))),
            None => Some(AttributeType::Dynamic),
        },
        _ => Some(AttributeType::Dynamic),
    }
}

/// returns the attributes of an object schema, keyed by their terraform name
pub fn attributes(props: &JSONSchemaProps) -> BTreeMap<String, SchemaAttribute> {
    let required = props.required.as_deref().unwrap_or_default();

    props
        .properties
        .iter()
        .flatten()
        .map(|(name, inner)| {
            let attribute = attribute(inner).with_json_name(name);
            let attribute = if required.contains(name) {
                attribute.required()
            } else {
                attribute.optional()
            };

            (snake_case(name), attribute)
        })
        .collect()
}

/// returns the terraform attribute mirroring the given openapi schema
pub fn attribute(props: &JSONSchemaProps) -> SchemaAttribute {
    let attribute = match attribute_type(props) {
        Some(attr_type) => SchemaAttribute::of(attr_type),
        None if has_properties(props) => SchemaAttribute::nested(NestingMode::Single, attributes(props)),
        None => match (items(props), additional_properties(props)) {
            (Some(inner), _) if has_properties(inner) => {
                SchemaAttribute::nested(NestingMode::List, attributes(inner))
            }
            (_, Some(inner)) if has_properties(inner) => {
                SchemaAttribute::nested(NestingMode::Map, attributes(inner))
            }
            _ => SchemaAttribute::dynamic(),
        },
    };

    match &props.description {
        Some(description) => attribute.with_description(description),
        None => attribute,
    }
}

/// returns the attribute of the `spec` field of the given version of the
/// custom resource definition, if any
pub fn spec(crd: &CustomResourceDefinition, version: &str) -> Option<SchemaAttribute> {
    let root = crd
        .spec
        .versions
        .iter()
        .find(|v| v.name == version)?
        .schema
        .as_ref()?
        .open_api_v3_schema
        .as_ref()?;

    let spec = root.properties.as_ref()?.get("spec")?;
    let attribute = attribute(spec).with_json_name("spec");

    if root
        .required
        .as_ref()
        .map_or(false, |r| r.iter().any(|name| name == "spec"))
    {
        Some(attribute.required())
    } else {
        Some(attribute.optional())
    }
}

/// returns the schema of a terraform resource managing the given version of
/// the custom resource definition
pub fn resource(crd: &CustomResourceDefinition, version: &str) -> ResourceSchema {
    let namespaced = crd.spec.scope == "Namespaced";
    let kind = &crd.spec.names.kind;
    let api_version = format!("{}/{}", crd.spec.group, version);

    let mut metadata = SchemaBlock::new()
        .with_attribute(
            "name",
            SchemaAttribute::string()
                .with_description("Unique name of the resource")
                .required(),
        )
        .with_attribute(
            "labels",
            SchemaAttribute::map(AttributeType::String)
                .with_description("Map of string keys and values used to organize and categorize objects")
                .optional(),
        )
        .with_attribute(
            "annotations",
            SchemaAttribute::map(AttributeType::String)
                .with_description("Unstructured key value map stored with the resource")
                .optional(),
        );

    if namespaced {
        metadata = metadata.with_attribute(
            "namespace",
            SchemaAttribute::string()
                .with_description("Namespace of the resource")
                .required(),
        );
    }

    let mut block = SchemaBlock::new()
        .with_attribute(
            "id",
            SchemaAttribute::string()
                .with_description(if namespaced {
                    "Contains the value `metadata.namespace/metadata.name`"
                } else {
                    "Contains the value `metadata.name`"
                })
                .computed(),
        )
        .with_attribute(
            "api_version",
            SchemaAttribute::string()
                .with_description("Versioned schema of this representation of an object")
                .computed(),
        )
        .with_attribute(
            "kind",
            SchemaAttribute::string()
                .with_description("Kind of the kubernetes object")
                .computed(),
        )
        .with_attribute(
            "field_manager",
            SchemaAttribute::string()
                .with_description("Name of the manager used to track field ownership")
                .optional()
                .computed(),
        )
        .with_attribute(
            "force_conflicts",
            SchemaAttribute::bool()
                .with_description("Take ownership of fields owned by other field managers")
                .optional()
                .computed(),
        )
        .with_attribute(
            "deletion_propagation",
            SchemaAttribute::string()
                .with_description("Garbage collection policy, one of 'Orphan', 'Background' or 'Foreground'")
                .optional(),
        )
        .with_attribute(
            "metadata",
            SchemaAttribute::nested(NestingMode::Single, metadata.attributes)
                .with_description("Data that helps uniquely identify the object")
                .required(),
        )
        .with_description(&format!("Manages {} ({}) custom resources", kind, api_version));

    if let Some(spec) = spec(crd, version) {
        block = block.with_attribute("spec", spec);
    }

    ResourceSchema::new(RESOURCE_SCHEMA_VERSION, block)
}

// -----------------------------------------------------------------------------
// Validation

fn validate_attribute(attribute: &SchemaAttribute, value: &Value, path: &mut Vec<String>) -> Vec<Diagnostic> {
    let nested = match (&attribute.nested_type, value) {
        (_, Value::Null) | (None, _) => return vec![],
        (Some(nested), _) => nested,
    };

    match (&nested.nesting_mode, value) {
        (NestingMode::Single, Value::Object(_)) => validate(&nested.attributes, value, path),
        (NestingMode::List, Value::Array(elements)) => elements
            .iter()
            .enumerate()
            .flat_map(|(idx, element)| {
                path.push(idx.to_string());
                let diagnostics = validate(&nested.attributes, element, path);
                path.pop();
                diagnostics
            })
            .collect(),
        (NestingMode::Map, Value::Object(elements)) => elements
            .iter()
            .flat_map(|(key, element)| {
                path.push(key.to_owned());
                let diagnostics = validate(&nested.attributes, element, path);
                path.pop();
                diagnostics
            })
            .collect(),
        _ => vec![Diagnostic::error("Incorrect attribute value type")
            .with_detail(&format!("Attribute '{}' does not match its schema", path.join(".")))
            .with_attribute(path.to_owned())],
    }
}

/// returns diagnostics about missing required attributes and unsupported
/// attributes of the given object value
pub fn validate(
    attributes: &BTreeMap<String, SchemaAttribute>,
    value: &Value,
    path: &mut Vec<String>,
) -> Vec<Diagnostic> {
    let fields = match value {
        Value::Object(fields) => fields,
        Value::Null => return vec![],
        _ => {
            return vec![Diagnostic::error("Incorrect attribute value type")
                .with_detail("An object is required")
                .with_attribute(path.to_owned())]
        }
    };

    let mut diagnostics = vec![];

    for name in fields.keys().filter(|name| !attributes.contains_key(*name)) {
        path.push(name.to_owned());
        diagnostics.push(
            Diagnostic::error("Unsupported attribute")
                .with_detail(&format!("An attribute named '{}' is not expected here", name))
                .with_attribute(path.to_owned()),
        );
        path.pop();
    }

    for (name, attribute) in attributes {
        path.push(name.to_owned());
        match fields.get(name) {
            None | Some(Value::Null) if attribute.required => diagnostics.push(
                Diagnostic::error("Missing required argument")
                    .with_detail(&format!("The argument '{}' is required", path.join(".")))
                    .with_attribute(path.to_owned()),
            ),
            Some(inner) => diagnostics.extend(validate_attribute(attribute, inner, path)),
            None => {}
        }
        path.pop();
    }

    diagnostics
}

#[cfg(test)]
mod tests {
    use kube::CustomResourceExt;
    use serde_json::json;

    use super::*;
    use crate::svc::crd::{database::Database, migration::Migration, table::Table};

    fn nested<'a>(attribute: &'a SchemaAttribute, path: &[&str]) -> &'a SchemaAttribute {
        path.iter().fold(attribute, |attribute, name| {
            attribute
                .nested_type
                .as_ref()
                .and_then(|nested| nested.attributes.get(*name))
                .unwrap_or_else(|| panic!("attribute '{}' to exist", name))
        })
    }

    #[test]
    fn snake_case_handles_acronyms() {
        assert_eq!(snake_case("secretKeyRef"), "secret_key_ref");
        assert_eq!(snake_case("generatedDDL"), "generated_ddl");
        assert_eq!(snake_case("disableTLS"), "disable_tls");
        assert_eq!(snake_case("accessKeyId"), "access_key_id");
        assert_eq!(snake_case("dbname"), "dbname");
        assert_eq!(snake_case("URLPath"), "url_path");
        assert_eq!(snake_case("x-kubernetes"), "x_kubernetes");
    }

    #[test]
    fn database_schema_mirrors_value_from_indirection() {
        let schema = resource(&Database::crd(), "v1alpha4");
        let spec = schema.attribute("spec").unwrap();

        let secret_key_ref = nested(
            spec,
            &["connection", "postgres", "password", "value_from", "secret_key_ref"],
        );
        assert_eq!(
            secret_key_ref.nested_type.as_ref().unwrap().nesting_mode,
            NestingMode::Single
        );
        assert!(nested(secret_key_ref, &["key"]).required);
        assert_eq!(
            nested(secret_key_ref, &["key"]).attr_type,
            Some(AttributeType::String)
        );

        let ssm = nested(spec, &["connection", "mysql", "uri", "value_from", "ssm"]);
        assert!(nested(ssm, &["name"]).required);
        assert_eq!(
            nested(ssm, &["with_decryption"]).attr_type,
            Some(AttributeType::Bool)
        );
        assert_eq!(
            nested(ssm, &["access_key_id", "value_from", "secret_key_ref", "name"]).json_name,
            Some("name".to_string())
        );

        let vault = nested(spec, &["connection", "postgres", "uri", "value_from", "vault"]);
        assert_eq!(
            nested(vault, &["kubernetes_auth_endpoint"]).json_name,
            Some("kubernetesAuthEndpoint".to_string())
        );

        assert_eq!(
            nested(spec, &["schemahero", "node_selector"]).attr_type,
            Some(AttributeType::Map(Box::new(AttributeType::String)))
        );
        assert_eq!(
            nested(spec, &["connection", "cassandra", "hosts"]).attr_type,
            Some(AttributeType::List(Box::new(AttributeType::String)))
        );
    }

    #[test]
    fn table_schema_uses_list_nested_attributes() {
        let schema = resource(&Table::crd(), "v1alpha4");
        let spec = schema.attribute("spec").unwrap();

        assert!(spec.required);
        assert!(nested(spec, &["database"]).required);

        let columns = nested(spec, &["schema", "postgres", "columns"]);
        assert_eq!(
            columns.nested_type.as_ref().unwrap().nesting_mode,
            NestingMode::List
        );
        assert_eq!(
            nested(columns, &["type"]).json_name,
            Some("type".to_string())
        );
        assert_eq!(
            nested(spec, &["schema", "cassandra", "primary_key"]).attr_type,
            Some(AttributeType::List(Box::new(AttributeType::List(Box::new(
                AttributeType::String
            )))))
        );
        assert_eq!(
            nested(spec, &["seed_data", "rows"])
                .nested_type
                .as_ref()
                .unwrap()
                .nesting_mode,
            NestingMode::List
        );
    }

    #[test]
    fn resource_schema_declares_identity_and_apply_attributes() {
        let schema = resource(&Migration::crd(), "v1alpha4");

        assert_eq!(schema.version, RESOURCE_SCHEMA_VERSION);
        assert!(schema.attribute("id").unwrap().computed);
        assert!(schema.attribute("field_manager").unwrap().optional);
        assert!(schema.attribute("field_manager").unwrap().computed);
        assert!(schema.attribute("metadata").unwrap().required);
        assert!(nested(schema.attribute("metadata").unwrap(), &["namespace"]).required);
        assert!(schema.attribute("status").is_none());
        assert_eq!(
            nested(schema.attribute("spec").unwrap(), &["generated_ddl"]).json_name,
            Some("generatedDDL".to_string())
        );
    }

    #[test]
    fn validate_reports_missing_and_unknown_attributes() {
        let schema = resource(&Migration::crd(), "v1alpha4");
        let config = json!({
            "metadata": { "name": "users-1" },
            "spec": { "database_name": "app", "table_name": "users", "unexpected": true }
        });

        let diagnostics = validate(&schema.block.attributes, &config, &mut vec![]);
        let paths: Vec<_> = diagnostics
            .iter()
            .map(|d| (d.summary.as_str(), d.attribute.clone().unwrap().join(".")))
            .collect();

        assert!(paths.contains(&("Missing required argument", "metadata.namespace".to_string())));
        assert!(paths.contains(&("Missing required argument", "spec.table_namespace".to_string())));
        assert!(paths.contains(&("Unsupported attribute", "spec.unexpected".to_string())));
        assert_eq!(diagnostics.len(), 3);
    }

    #[test]
    fn validate_walks_list_elements() {
        let schema = resource(&Table::crd(), "v1alpha4");
        let config = json!({
            "metadata": { "name": "users", "namespace": "schemahero" },
            "spec": {
                "database": "app",
                "name": "users",
                "schema": { "postgres": { "columns": [{ "name": "id", "type": "integer" }, { "name": "email" }] } }
            }
        });

        let diagnostics = validate(&schema.block.attributes, &config, &mut vec![]);

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute.clone().unwrap().join("."),
            "spec.schema.postgres.columns.1.type"
        );
    }

    #[test]
    fn int_or_string_becomes_string() {
        let props: JSONSchemaProps = serde_json::from_value(json!({
            "type": "object",
            "required": ["port"],
            "properties": {
                "port": { "x-kubernetes-int-or-string": true },
                "extra": { "type": "object", "x-kubernetes-preserve-unknown-fields": true }
            }
        }))
        .unwrap();

        let attributes = attributes(&props);
        assert_eq!(attributes["port"].attr_type, Some(AttributeType::String));
        assert!(attributes["port"].required);
        assert_eq!(attributes["extra"].attr_type, Some(AttributeType::Dynamic));
    }
}
