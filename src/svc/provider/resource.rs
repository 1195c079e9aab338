//! # Resource module
//!
//! This module provide the terraform resource trait and its generic
//! implementation over a kubernetes custom resource. Every operation is a
//! single request to the api server using server-side apply.

use std::{collections::BTreeMap, fmt::Debug, marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use kube::{api::PropagationPolicy, CustomResourceExt, Resource as KubeResource, ResourceExt};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info, trace, warn};

use crate::svc::{
    cfg::Apply,
    crd::{database::Database, migration::Migration, table::Table},
    k8s::{resource, Context},
    provider::{
        protocol::Diagnostic,
        schema::{self, ResourceSchema},
        state::{self, Model},
    },
};

// -----------------------------------------------------------------------------
// Error enum

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to decode terraform state, {0}")]
    Decode(serde_json::Error),
    #[error("failed to encode terraform state, {0}")]
    Encode(serde_json::Error),
    #[error("failed to build kubernetes manifest, {0}")]
    Manifest(serde_json::Error),
    #[error("failed to apply resource, {0}")]
    Apply(kube::Error),
    #[error("failed to get resource, {0}")]
    Get(kube::Error),
    #[error("failed to delete resource, {0}")]
    Delete(kube::Error),
    #[error("failed to parse resource returned by the api server, {0}")]
    Parse(serde_json::Error),
    #[error("{0}")]
    Import(state::Error),
    #[error("Expected one of 'Orphan', 'Background' or 'Foreground' Got: '{0}'")]
    Propagation(String),
}

impl Error {
    fn summary(&self) -> &'static str {
        match self {
            Self::Decode(_) => "Unable to decode state",
            Self::Encode(_) => "Unable to encode state",
            Self::Manifest(_) => "Unable to build resource",
            Self::Apply(_) => "Unable to apply resource",
            Self::Get(_) => "Unable to get resource",
            Self::Delete(_) => "Unable to delete resource",
            Self::Parse(_) => "Unable to parse resource",
            Self::Import(_) => "Unexpected import identifier",
            Self::Propagation(_) => "Invalid deletion propagation",
        }
    }

    fn detail(&self) -> String {
        match self {
            Self::Decode(err) | Self::Encode(err) | Self::Manifest(err) | Self::Parse(err) => {
                err.to_string()
            }
            Self::Apply(err) | Self::Get(err) | Self::Delete(err) => err.to_string(),
            Self::Import(err) => err.to_string(),
            Self::Propagation(_) => self.to_string(),
        }
    }
}

impl From<&Error> for Diagnostic {
    fn from(err: &Error) -> Self {
        let diagnostic = Diagnostic::error(err.summary()).with_detail(&err.detail());

        match err {
            Error::Propagation(_) => diagnostic.with_attribute(vec!["deletion_propagation".into()]),
            _ => diagnostic,
        }
    }
}

// -----------------------------------------------------------------------------
// Plan structure

#[derive(PartialEq, Clone, Debug, Default)]
pub struct Plan {
    pub state: Value,
    pub requires_replace: Vec<Vec<String>>,
}

// -----------------------------------------------------------------------------
// Resource trait

#[async_trait]
pub trait Resource: Send + Sync {
    /// returns the terraform type name of the resource
    fn type_name(&self) -> String;

    fn schema(&self) -> ResourceSchema;

    fn validate(&self, config: &Value) -> Vec<Diagnostic>;

    /// returns the planned state, filling computed attributes
    fn plan(&self, apply: &Apply, prior: &Value, proposed: &Value) -> Result<Plan, Error>;

    async fn create(&self, ctx: &Context, planned: &Value) -> Result<Value, Error>;

    /// returns none if the resource no longer exists
    async fn read(&self, ctx: &Context, current: &Value) -> Result<Option<Value>, Error>;

    async fn update(&self, ctx: &Context, prior: &Value, planned: &Value) -> Result<Value, Error>;

    async fn delete(&self, ctx: &Context, current: &Value) -> Result<(), Error>;

    /// returns the state seeded from the import identifier
    fn import(&self, id: &str) -> Result<Value, Error>;
}

// -----------------------------------------------------------------------------
// Helpers functions

/// returns the garbage collection policy named by the given value
pub fn propagation_policy(value: Option<&str>) -> Result<Option<PropagationPolicy>, Error> {
    match value {
        None => Ok(None),
        Some("Orphan") => Ok(Some(PropagationPolicy::Orphan)),
        Some("Background") => Ok(Some(PropagationPolicy::Background)),
        Some("Foreground") => Ok(Some(PropagationPolicy::Foreground)),
        Some(other) => Err(Error::Propagation(other.to_string())),
    }
}

/// returns the map as a terraform value, an empty map is null unless the
/// state already holds it as an empty map
fn string_map(map: &BTreeMap<String, String>, known: Option<&BTreeMap<String, String>>) -> Value {
    match known {
        _ if !map.is_empty() => json!(map),
        Some(known) if known.is_empty() => json!({}),
        _ => Value::Null,
    }
}

// -----------------------------------------------------------------------------
// CustomResourceAdapter structure

/// Terraform resource managing the custom resource `T` through the dynamic
/// api of kubernetes
pub struct CustomResourceAdapter<T> {
    schema: ResourceSchema,
    namespaced: bool,
    phantom: PhantomData<fn() -> T>,
}

impl<T> Default for CustomResourceAdapter<T>
where
    T: KubeResource<DynamicType = ()> + CustomResourceExt,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CustomResourceAdapter<T>
where
    T: KubeResource<DynamicType = ()> + CustomResourceExt,
{
    pub fn new() -> Self {
        let crd = T::crd();

        Self {
            schema: schema::resource(&crd, &T::version(&())),
            namespaced: crd.spec.scope == "Namespaced",
            phantom: PhantomData,
        }
    }
}

impl<T> CustomResourceAdapter<T>
where
    T: KubeResource<DynamicType = ()> + ResourceExt + Serialize + DeserializeOwned,
{
    fn model(value: &Value) -> Result<Model, Error> {
        serde_json::from_value(value.to_owned()).map_err(Error::Decode)
    }

    /// returns the typed custom resource described by the state
    fn manifest(&self, model: &Model) -> Result<T, Error> {
        let mut metadata = Map::new();

        metadata.insert("name".into(), json!(model.metadata.name));
        if let Some(namespace) = &model.metadata.namespace {
            metadata.insert("namespace".into(), json!(namespace));
        }
        if let Some(labels) = &model.metadata.labels {
            metadata.insert("labels".into(), json!(labels));
        }
        if let Some(annotations) = &model.metadata.annotations {
            metadata.insert("annotations".into(), json!(annotations));
        }

        let mut manifest = json!({
            "apiVersion": T::api_version(&()),
            "kind": T::kind(&()),
            "metadata": metadata,
        });

        if let Some(spec) = self
            .schema
            .attribute("spec")
            .and_then(|attribute| state::to_manifest(attribute, &model.spec))
        {
            manifest["spec"] = spec;
        }

        trace!(manifest = %manifest, "built kubernetes manifest from terraform state");
        serde_json::from_value(manifest).map_err(Error::Manifest)
    }

    /// returns the terraform state of the custom resource
    fn state(&self, model: &Model, apply: &Apply, obj: &T) -> Result<Value, Error> {
        let (namespace, name) = resource::namespaced_name(obj);
        let manifest = serde_json::to_value(obj).map_err(Error::Encode)?;
        let spec = match (self.schema.attribute("spec"), manifest.get("spec")) {
            (Some(attribute), Some(spec)) => state::from_manifest(attribute, spec),
            _ => Value::Null,
        };

        let mut metadata = json!({
            "name": name,
            "labels": string_map(obj.labels(), model.metadata.labels.as_ref()),
            "annotations": string_map(obj.annotations(), model.metadata.annotations.as_ref()),
        });

        if self.namespaced {
            metadata["namespace"] = json!(namespace);
        }

        Ok(json!({
            "id": state::identifier(namespace.as_deref(), &name),
            "api_version": T::api_version(&()),
            "kind": T::kind(&()),
            "field_manager": model.field_manager.as_deref().unwrap_or(&apply.field_manager),
            "force_conflicts": model.force_conflicts.unwrap_or(apply.force_conflicts),
            "deletion_propagation": model.deletion_propagation,
            "metadata": metadata,
            "spec": spec,
        }))
    }

    async fn apply(&self, ctx: &Context, model: &Model, obj: &T) -> Result<Value, Error>
    where
        T: Debug,
    {
        let apply = &ctx.config.apply;
        let params = resource::apply_params(
            model.field_manager.as_deref().unwrap_or(&apply.field_manager),
            model.force_conflicts.unwrap_or(apply.force_conflicts),
        );

        let obj = resource::apply(ctx.kube.to_owned(), obj, &params)
            .await
            .map_err(Error::Apply)?;

        let obj: T = resource::parse(obj).map_err(Error::Parse)?;

        self.state(model, apply, &obj)
    }
}

#[async_trait]
impl<T> Resource for CustomResourceAdapter<T>
where
    T: KubeResource<DynamicType = ()>
        + CustomResourceExt
        + ResourceExt
        + Serialize
        + DeserializeOwned
        + Clone
        + Debug
        + Send
        + Sync
        + 'static,
{
    fn type_name(&self) -> String {
        format!(
            "k8s_{}_{}_{}",
            T::group(&()).replace(['.', '-'], "_"),
            T::kind(&()).to_lowercase(),
            T::version(&())
        )
    }

    fn schema(&self) -> ResourceSchema {
        self.schema.to_owned()
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = schema::validate(&self.schema.block.attributes, config, &mut vec![]);

        if let Err(err) = propagation_policy(config["deletion_propagation"].as_str()) {
            diagnostics.push(Diagnostic::from(&err));
        }

        diagnostics
    }

    fn plan(&self, apply: &Apply, prior: &Value, proposed: &Value) -> Result<Plan, Error> {
        if proposed.is_null() {
            return Ok(Plan::default());
        }

        let mut state = proposed.to_owned();
        let model = Self::model(proposed)?;

        state["id"] = json!(state::identifier(
            model.metadata.namespace.as_deref(),
            &model.metadata.name
        ));
        state["api_version"] = json!(T::api_version(&()));
        state["kind"] = json!(T::kind(&()));
        if model.field_manager.is_none() {
            state["field_manager"] = json!(apply.field_manager);
        }
        if model.force_conflicts.is_none() {
            state["force_conflicts"] = json!(apply.force_conflicts);
        }

        let mut requires_replace = vec![];
        if !prior.is_null() {
            let prior = Self::model(prior)?;

            if prior.metadata.name != model.metadata.name {
                requires_replace.push(vec!["metadata".into(), "name".into()]);
            }
            if prior.metadata.namespace != model.metadata.namespace {
                requires_replace.push(vec!["metadata".into(), "namespace".into()]);
            }
        }

        Ok(Plan {
            state,
            requires_replace,
        })
    }

    #[tracing::instrument(skip_all, fields(type_name = %self.type_name()))]
    async fn create(&self, ctx: &Context, planned: &Value) -> Result<Value, Error> {
        let model = Self::model(planned)?;
        let obj = self.manifest(&model)?;

        info!(
            namespace = ?model.metadata.namespace,
            name = %model.metadata.name,
            "create resource"
        );

        self.apply(ctx, &model, &obj).await
    }

    #[tracing::instrument(skip_all, fields(type_name = %self.type_name()))]
    async fn read(&self, ctx: &Context, current: &Value) -> Result<Option<Value>, Error> {
        let model = Self::model(current)?;
        let namespace = model.metadata.namespace.as_deref();
        let name = &model.metadata.name;

        match resource::get::<T>(ctx.kube.to_owned(), namespace, name)
            .await
            .map_err(Error::Get)?
        {
            None => {
                warn!(
                    namespace = ?namespace,
                    name = %name,
                    "resource no longer exists, remove it from state"
                );
                Ok(None)
            }
            Some(obj) => {
                let obj: T = resource::parse(obj).map_err(Error::Parse)?;

                self.state(&model, &ctx.config.apply, &obj).map(Some)
            }
        }
    }

    #[tracing::instrument(skip_all, fields(type_name = %self.type_name()))]
    async fn update(&self, ctx: &Context, prior: &Value, planned: &Value) -> Result<Value, Error> {
        let model = Self::model(planned)?;
        let obj = self.manifest(&model)?;

        match Self::model(prior).and_then(|prior| self.manifest(&prior)) {
            Ok(origin) => match resource::diff(&origin, &obj) {
                Ok(patch) => debug!(
                    namespace = ?model.metadata.namespace,
                    name = %model.metadata.name,
                    patch = %serde_json::to_string(&patch).unwrap_or_default(),
                    "update resource"
                ),
                Err(err) => warn!(error = %err, "could not compute difference with prior state"),
            },
            Err(err) => warn!(error = %err, "could not build manifest from prior state"),
        }

        self.apply(ctx, &model, &obj).await
    }

    #[tracing::instrument(skip_all, fields(type_name = %self.type_name()))]
    async fn delete(&self, ctx: &Context, current: &Value) -> Result<(), Error> {
        let model = Self::model(current)?;
        let namespace = model.metadata.namespace.as_deref();
        let name = &model.metadata.name;
        let policy = propagation_policy(model.deletion_propagation.as_deref())?;

        let deleted = resource::delete::<T>(ctx.kube.to_owned(), namespace, name, policy)
            .await
            .map_err(Error::Delete)?;

        if deleted {
            info!(namespace = ?namespace, name = %name, "delete resource");
        } else {
            debug!(namespace = ?namespace, name = %name, "resource was already deleted");
        }

        Ok(())
    }

    fn import(&self, id: &str) -> Result<Value, Error> {
        let (namespace, name) = state::parse_import_id(id, self.namespaced).map_err(Error::Import)?;

        let mut state: Map<String, Value> = self
            .schema
            .block
            .attributes
            .keys()
            .map(|key| (key.to_owned(), Value::Null))
            .collect();

        let mut metadata = json!({ "name": name, "labels": null, "annotations": null });
        if self.namespaced {
            metadata["namespace"] = json!(namespace);
        }

        state.insert("id".into(), json!(id));
        state.insert("metadata".into(), metadata);

        Ok(Value::Object(state))
    }
}

// -----------------------------------------------------------------------------
// Registry

/// returns every resource served by the provider
pub fn resources() -> Vec<Arc<dyn Resource>> {
    vec![
        Arc::new(CustomResourceAdapter::<Database>::new()),
        Arc::new(CustomResourceAdapter::<Table>::new()),
        Arc::new(CustomResourceAdapter::<Migration>::new()),
    ]
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        convert::Infallible,
        sync::{Arc, Mutex},
    };

    use hyper::{Body, Request, Response};
    use serde_json::json;

    use super::*;
    use crate::svc::cfg::Configuration;

    #[derive(Clone, Debug)]
    pub struct Recorded {
        pub method: String,
        pub uri: String,
        pub content_type: Option<String>,
        pub body: Value,
    }

    /// returns a context whose client sends requests to an in-memory api
    /// server, answering with the given status and body or echoing the request
    pub fn context(status: u16, answer: Option<Value>) -> (Context, Arc<Mutex<Vec<Recorded>>>) {
        let recorded = Arc::new(Mutex::new(vec![]));
        let requests = recorded.to_owned();

        let service = tower::service_fn(move |req: Request<Body>| {
            let requests = requests.to_owned();
            let answer = answer.to_owned();

            async move {
                let method = req.method().to_string();
                let uri = req.uri().to_string();
                let content_type = req
                    .headers()
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .map(String::from);
                let bytes = hyper::body::to_bytes(req.into_body()).await.unwrap();
                let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

                requests.lock().unwrap().push(Recorded {
                    method,
                    uri,
                    content_type,
                    body: body.to_owned(),
                });

                let answer = match (status, answer) {
                    (404, _) => json!({
                        "kind": "Status",
                        "apiVersion": "v1",
                        "metadata": {},
                        "status": "Failure",
                        "message": "not found",
                        "reason": "NotFound",
                        "code": 404
                    }),
                    (_, Some(answer)) => answer,
                    (_, None) => {
                        let mut echo = body;
                        echo["metadata"]["uid"] = json!("8f2c1f7e");
                        echo["metadata"]["resourceVersion"] = json!("42");
                        echo
                    }
                };

                Ok::<_, Infallible>(
                    Response::builder()
                        .status(status)
                        .header("content-type", "application/json")
                        .body(Body::from(answer.to_string()))
                        .unwrap(),
                )
            }
        });

        let client = kube::Client::new(service, "default");

        (
            Context::new(client, Arc::new(Configuration::default())),
            recorded,
        )
    }

    fn migration_state() -> Value {
        json!({
            "id": null,
            "api_version": null,
            "kind": null,
            "field_manager": null,
            "force_conflicts": true,
            "deletion_propagation": null,
            "metadata": {
                "name": "users-1",
                "namespace": "schemahero",
                "labels": { "team": "platform" },
                "annotations": null
            },
            "spec": {
                "database_name": "app",
                "table_name": "users",
                "table_namespace": "schemahero",
                "generated_ddl": null,
                "edited_ddl": "alter table users add column age integer"
            }
        })
    }

    #[test]
    fn type_name_joins_group_kind_and_version() {
        let names: Vec<_> = resources().iter().map(|r| r.type_name()).collect();

        assert_eq!(
            names,
            vec![
                "k8s_databases_schemahero_io_database_v1alpha4",
                "k8s_schemas_schemahero_io_table_v1alpha4",
                "k8s_schemas_schemahero_io_migration_v1alpha4",
            ]
        );
    }

    #[test]
    fn plan_fills_computed_attributes_and_replacements() {
        let adapter = CustomResourceAdapter::<Migration>::new();
        let proposed = migration_state();

        let plan = adapter.plan(&Apply::default(), &Value::Null, &proposed).unwrap();
        assert_eq!(plan.state["id"], "schemahero/users-1");
        assert_eq!(plan.state["api_version"], "schemas.schemahero.io/v1alpha4");
        assert_eq!(plan.state["kind"], "Migration");
        assert_eq!(plan.state["field_manager"], "terraform-provider-k8s");
        assert_eq!(plan.state["force_conflicts"], true);
        assert!(plan.requires_replace.is_empty());

        let mut renamed = proposed.to_owned();
        renamed["metadata"]["name"] = json!("users-2");
        let plan = adapter.plan(&Apply::default(), &proposed, &renamed).unwrap();
        assert_eq!(plan.requires_replace, vec![vec!["metadata".to_string(), "name".to_string()]]);

        let plan = adapter.plan(&Apply::default(), &proposed, &Value::Null).unwrap();
        assert!(plan.state.is_null());
    }

    #[test]
    fn import_seeds_identity_only() {
        let adapter = CustomResourceAdapter::<Table>::new();

        let state = adapter.import("schemahero/users").unwrap();
        assert_eq!(state["id"], "schemahero/users");
        assert_eq!(state["metadata"]["namespace"], "schemahero");
        assert_eq!(state["metadata"]["name"], "users");
        assert!(state["spec"].is_null());
        assert!(state["field_manager"].is_null());
        assert!(state.as_object().unwrap().contains_key("kind"));

        let err = adapter.import("users").unwrap_err();
        let diagnostic = Diagnostic::from(&err);
        assert_eq!(
            diagnostic.detail.as_deref(),
            Some("Expected import identifier with format: 'namespace/name' Got: 'users'")
        );
    }

    #[test]
    fn validate_rejects_unknown_propagation_policy() {
        let adapter = CustomResourceAdapter::<Migration>::new();
        let mut config = migration_state();
        config["deletion_propagation"] = json!("Eventually");

        let diagnostics = adapter.validate(&config);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].summary, "Invalid deletion propagation");
        assert!(adapter.validate(&migration_state()).is_empty());
    }

    #[tokio::test]
    async fn create_sends_strict_server_side_apply() {
        let (ctx, recorded) = context(200, None);
        let adapter = CustomResourceAdapter::<Migration>::new();

        let state = adapter.create(&ctx, &migration_state()).await.unwrap();

        let requests = recorded.lock().unwrap().to_owned();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "PATCH");
        assert!(requests[0]
            .uri
            .starts_with("/apis/schemas.schemahero.io/v1alpha4/namespaces/schemahero/migrations/users-1?"));
        assert!(requests[0].uri.contains("fieldManager=terraform-provider-k8s"));
        assert!(requests[0].uri.contains("force=true"));
        assert!(requests[0].uri.contains("fieldValidation=Strict"));
        assert_eq!(
            requests[0].content_type.as_deref(),
            Some("application/apply-patch+yaml")
        );
        assert_eq!(
            requests[0].body,
            json!({
                "apiVersion": "schemas.schemahero.io/v1alpha4",
                "kind": "Migration",
                "metadata": { "name": "users-1", "namespace": "schemahero", "labels": { "team": "platform" } },
                "spec": {
                    "databaseName": "app",
                    "tableName": "users",
                    "tableNamespace": "schemahero",
                    "editedDDL": "alter table users add column age integer"
                }
            })
        );

        assert_eq!(state["id"], "schemahero/users-1");
        assert_eq!(state["field_manager"], "terraform-provider-k8s");
        assert_eq!(state["force_conflicts"], true);
        assert_eq!(state["metadata"]["labels"], json!({ "team": "platform" }));
        assert!(state["metadata"]["annotations"].is_null());
        assert!(state["spec"]["generated_ddl"].is_null());
        assert_eq!(state["spec"]["table_name"], "users");
    }

    #[tokio::test]
    async fn create_keeps_empty_metadata_maps() {
        let (ctx, recorded) = context(200, None);
        let adapter = CustomResourceAdapter::<Migration>::new();
        let mut planned = migration_state();
        planned["metadata"]["labels"] = json!({});
        planned["metadata"]["annotations"] = json!({});

        let state = adapter.create(&ctx, &planned).await.unwrap();

        let requests = recorded.lock().unwrap().to_owned();
        assert_eq!(requests[0].body["metadata"]["labels"], json!({}));
        assert_eq!(state["metadata"]["labels"], json!({}));
        assert_eq!(state["metadata"]["annotations"], json!({}));

        let state = adapter.create(&ctx, &migration_state()).await.unwrap();
        assert!(state["metadata"]["annotations"].is_null());
    }

    #[tokio::test]
    async fn update_applies_changed_spec() {
        let (ctx, recorded) = context(200, None);
        let adapter = CustomResourceAdapter::<Migration>::new();
        let prior = adapter.create(&ctx, &migration_state()).await.unwrap();

        let mut planned = prior.to_owned();
        planned["spec"]["edited_ddl"] = json!("alter table users add column email text");
        planned["metadata"]["annotations"] = json!({ "owner": "platform" });

        let state = adapter.update(&ctx, &prior, &planned).await.unwrap();

        let requests = recorded.lock().unwrap().to_owned();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].method, "PATCH");
        assert!(requests[1]
            .uri
            .starts_with("/apis/schemas.schemahero.io/v1alpha4/namespaces/schemahero/migrations/users-1?"));
        assert!(requests[1].uri.contains("force=true"));
        assert_eq!(
            requests[1].body,
            json!({
                "apiVersion": "schemas.schemahero.io/v1alpha4",
                "kind": "Migration",
                "metadata": {
                    "name": "users-1",
                    "namespace": "schemahero",
                    "labels": { "team": "platform" },
                    "annotations": { "owner": "platform" }
                },
                "spec": {
                    "databaseName": "app",
                    "tableName": "users",
                    "tableNamespace": "schemahero",
                    "editedDDL": "alter table users add column email text"
                }
            })
        );

        assert_eq!(state, planned);
    }

    #[tokio::test]
    async fn apply_failure_surfaces_as_diagnostic() {
        let (ctx, _) = context(
            422,
            Some(json!({
                "kind": "Status",
                "apiVersion": "v1",
                "metadata": {},
                "status": "Failure",
                "message": "Migration.schemas.schemahero.io \"users-1\" is invalid",
                "reason": "Invalid",
                "code": 422
            })),
        );
        let adapter = CustomResourceAdapter::<Migration>::new();

        let err = adapter.create(&ctx, &migration_state()).await.unwrap_err();
        let diagnostic = Diagnostic::from(&err);

        assert_eq!(diagnostic.summary, "Unable to apply resource");
        assert!(diagnostic.detail.unwrap().contains("is invalid"));
    }

    #[tokio::test]
    async fn read_of_missing_resource_removes_it_from_state() {
        let (ctx, recorded) = context(404, None);
        let adapter = CustomResourceAdapter::<Migration>::new();

        let state = adapter.read(&ctx, &migration_state()).await.unwrap();

        assert!(state.is_none());
        assert_eq!(recorded.lock().unwrap()[0].method, "GET");
    }

    #[tokio::test]
    async fn read_reflects_server_state() {
        let (ctx, _) = context(
            200,
            Some(json!({
                "apiVersion": "schemas.schemahero.io/v1alpha4",
                "kind": "Migration",
                "metadata": { "name": "users-1", "namespace": "schemahero", "uid": "8f2c1f7e" },
                "spec": { "databaseName": "app", "tableName": "users", "tableNamespace": "schemahero", "generatedDDL": "create table users" },
                "status": { "phase": "PLANNED" }
            })),
        );
        let adapter = CustomResourceAdapter::<Migration>::new();

        let state = adapter.read(&ctx, &migration_state()).await.unwrap().unwrap();

        assert_eq!(state["spec"]["generated_ddl"], "create table users");
        assert!(state["spec"]["edited_ddl"].is_null());
        assert!(state["metadata"]["labels"].is_null());
        assert!(state.get("status").is_none());
    }

    #[tokio::test]
    async fn delete_of_missing_resource_succeeds() {
        let (ctx, recorded) = context(404, None);
        let adapter = CustomResourceAdapter::<Migration>::new();
        let mut current = migration_state();
        current["deletion_propagation"] = json!("Foreground");

        adapter.delete(&ctx, &current).await.unwrap();

        let requests = recorded.lock().unwrap().to_owned();
        assert_eq!(requests[0].method, "DELETE");
        assert_eq!(requests[0].body["propagationPolicy"], "Foreground");
    }
}
