//! # Provider module
//!
//! This module provide the terraform provider, it dispatches json-rpc requests
//! to the resources and holds the kubernetes client once configured.

use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::svc::{
    cfg::{Apply, Configuration},
    k8s::{client, Context},
    provider::{
        protocol::{
            ApplyResourceChangeParams, ConfigureProviderParams, Diagnostic,
            ImportResourceStateParams, PlanResourceChangeParams, ReadResourceParams, RpcError,
            RpcRequest, RpcResponse, UpgradeResourceStateParams, ValidateResourceConfigParams,
            JSONRPC_VERSION,
        },
        resource::{resources, Resource},
        schema::{ProviderSchema, SchemaAttribute, SchemaBlock},
    },
};

pub mod protocol;
pub mod resource;
pub mod schema;
pub mod state;

// -----------------------------------------------------------------------------
// ProviderConfig structure

/// Attributes of the provider block, they override the configuration file
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct ProviderConfig {
    #[serde(rename = "kubeconfig", default)]
    pub kubeconfig: Option<PathBuf>,
    #[serde(rename = "context", default)]
    pub context: Option<String>,
    #[serde(rename = "field_manager", default)]
    pub field_manager: Option<String>,
    #[serde(rename = "force_conflicts", default)]
    pub force_conflicts: Option<bool>,
}

impl ProviderConfig {
    /// returns the configuration with the attributes of the provider block
    /// applied on top of it
    pub fn merge(&self, config: &Configuration) -> Configuration {
        let mut config = config.to_owned();

        if let Some(kubeconfig) = &self.kubeconfig {
            config.kubernetes.kubeconfig = Some(kubeconfig.to_owned());
        }
        if let Some(context) = &self.context {
            config.kubernetes.context = Some(context.to_owned());
        }
        if let Some(field_manager) = &self.field_manager {
            config.apply.field_manager = field_manager.to_owned();
        }
        if let Some(force_conflicts) = self.force_conflicts {
            config.apply.force_conflicts = force_conflicts;
        }

        config
    }
}

// -----------------------------------------------------------------------------
// Provider structure

pub struct Provider {
    config: Arc<Configuration>,
    context: RwLock<Option<Context>>,
    resources: BTreeMap<String, Arc<dyn Resource>>,
}

impl From<Arc<Configuration>> for Provider {
    fn from(config: Arc<Configuration>) -> Self {
        let resources = resources()
            .into_iter()
            .map(|resource| (resource.type_name(), resource))
            .collect();

        Self {
            config,
            context: RwLock::new(None),
            resources,
        }
    }
}

impl Provider {
    pub fn new(config: Arc<Configuration>) -> Self {
        Self::from(config)
    }

    #[cfg(test)]
    pub fn configured(ctx: Context) -> Self {
        let provider = Self::from(ctx.config.to_owned());

        *provider.context.try_write().unwrap() = Some(ctx);
        provider
    }

    pub fn schema(&self) -> ProviderSchema {
        let block = SchemaBlock::new()
            .with_attribute(
                "kubeconfig",
                SchemaAttribute::string()
                    .with_description("Path to the kubeconfig file, defaults to the environment or ~/.kube/config")
                    .optional(),
            )
            .with_attribute(
                "context",
                SchemaAttribute::string()
                    .with_description("Context of the kubeconfig to use, defaults to the current one")
                    .optional(),
            )
            .with_attribute(
                "field_manager",
                SchemaAttribute::string()
                    .with_description("Default field manager of server-side apply requests")
                    .optional(),
            )
            .with_attribute(
                "force_conflicts",
                SchemaAttribute::bool()
                    .with_description("Force server-side apply requests by default")
                    .optional(),
            )
            .with_description("Manages kubernetes custom resources using server-side apply");

        self.resources
            .iter()
            .fold(ProviderSchema::new(block), |schema, (name, resource)| {
                schema.with_resource(name, resource.schema())
            })
    }

    /// create the kubernetes client shared by every resource
    pub async fn configure(&self, provider: &ProviderConfig) -> Vec<Diagnostic> {
        let config = provider.merge(&self.config);

        let kube = match client::try_new(
            config.kubernetes.kubeconfig.to_owned(),
            config.kubernetes.context.to_owned(),
        )
        .await
        {
            Ok(kube) => kube,
            Err(err) => {
                error!(error = %err, "could not create kubernetes client");
                return vec![Diagnostic::error("Unable to create kubernetes client")
                    .with_detail(&err.to_string())];
            }
        };

        info!(
            field_manager = %config.apply.field_manager,
            force_conflicts = config.apply.force_conflicts,
            "provider configured"
        );

        *self.context.write().await = Some(Context::new(kube, Arc::new(config)));
        vec![]
    }

    async fn context(&self) -> Result<Context, Diagnostic> {
        self.context
            .read()
            .await
            .to_owned()
            .ok_or_else(|| Diagnostic::error("Provider not configured"))
    }

    async fn apply_defaults(&self) -> Apply {
        match self.context.read().await.as_ref() {
            Some(ctx) => ctx.config.apply.to_owned(),
            None => self.config.apply.to_owned(),
        }
    }

    fn resource(&self, type_name: &str) -> Result<Arc<dyn Resource>, Diagnostic> {
        self.resources.get(type_name).cloned().ok_or_else(|| {
            Diagnostic::error("Unknown resource type")
                .with_detail(&format!("Resource type '{}' is not served by this provider", type_name))
        })
    }

    /// handle a json-rpc request and returns the serialized response
    pub async fn handle_request(&self, input: &str) -> String {
        let request: RpcRequest = match serde_json::from_str(input) {
            Ok(request) => request,
            Err(err) => {
                warn!(error = %err, "could not parse request");
                return serde_json::to_string(&RpcResponse::error(None, RpcError::parse(err)))
                    .unwrap_or_default();
            }
        };

        debug!(id = request.id, method = %request.method, "handle request");

        let id = Some(request.id);
        let response = match self.dispatch(request).await {
            Ok(result) => RpcResponse::success(id, result),
            Err(err) => RpcResponse::error(id, err),
        };

        serde_json::to_string(&response).unwrap_or_else(|err| {
            serde_json::to_string(&RpcResponse::error(id, RpcError::internal(err)))
                .unwrap_or_default()
        })
    }

    async fn dispatch(&self, request: RpcRequest) -> Result<Value, RpcError> {
        match request.jsonrpc.as_deref() {
            Some(JSONRPC_VERSION) | None => {}
            Some(version) => return Err(RpcError::invalid_request(version)),
        }

        match request.method.as_str() {
            "GetProviderSchema" => {
                let mut result = serde_json::to_value(self.schema()).map_err(RpcError::internal)?;

                result["diagnostics"] = json!([]);
                Ok(result)
            }
            "ConfigureProvider" => {
                let params: ConfigureProviderParams = params(request.params)?;

                Ok(json!({ "diagnostics": self.configure(&params.config).await }))
            }
            "ValidateResourceConfig" => self.validate_resource_config(params(request.params)?),
            "UpgradeResourceState" => self.upgrade_resource_state(params(request.params)?),
            "PlanResourceChange" => Ok(self.plan_resource_change(params(request.params)?).await),
            "ApplyResourceChange" => Ok(self.apply_resource_change(params(request.params)?).await),
            "ReadResource" => Ok(self.read_resource(params(request.params)?).await),
            "ImportResourceState" => Ok(self.import_resource_state(params(request.params)?)),
            "StopProvider" => {
                info!("provider asked to stop");
                Ok(json!({}))
            }
            method => Err(RpcError::method_not_found(method)),
        }
    }

    fn validate_resource_config(&self, params: ValidateResourceConfigParams) -> Result<Value, RpcError> {
        let diagnostics = match self.resource(&params.type_name) {
            Ok(resource) => resource.validate(&params.config),
            Err(diagnostic) => vec![diagnostic],
        };

        Ok(json!({ "diagnostics": diagnostics }))
    }

    fn upgrade_resource_state(&self, params: UpgradeResourceStateParams) -> Result<Value, RpcError> {
        let diagnostics = match self.resource(&params.type_name) {
            Ok(_) => vec![],
            Err(diagnostic) => vec![diagnostic],
        };

        debug!(
            type_name = %params.type_name,
            version = params.version,
            "upgrade resource state"
        );

        Ok(json!({ "upgraded_state": params.raw_state, "diagnostics": diagnostics }))
    }

    async fn plan_resource_change(&self, params: PlanResourceChangeParams) -> Value {
        let resource = match self.resource(&params.type_name) {
            Ok(resource) => resource,
            Err(diagnostic) => {
                return json!({ "planned_state": params.proposed_new_state, "diagnostics": [diagnostic] })
            }
        };

        let apply = self.apply_defaults().await;
        match resource.plan(&apply, &params.prior_state, &params.proposed_new_state) {
            Ok(plan) => json!({
                "planned_state": plan.state,
                "requires_replace": plan.requires_replace,
                "diagnostics": [],
            }),
            Err(err) => json!({
                "planned_state": params.proposed_new_state,
                "diagnostics": [Diagnostic::from(&err)],
            }),
        }
    }

    async fn apply_resource_change(&self, params: ApplyResourceChangeParams) -> Value {
        let failure = |diagnostic: Diagnostic| {
            json!({ "new_state": params.prior_state, "diagnostics": [diagnostic] })
        };

        let resource = match self.resource(&params.type_name) {
            Ok(resource) => resource,
            Err(diagnostic) => return failure(diagnostic),
        };

        let ctx = match self.context().await {
            Ok(ctx) => ctx,
            Err(diagnostic) => return failure(diagnostic),
        };

        let result = match (params.prior_state.is_null(), params.planned_state.is_null()) {
            (_, true) => resource
                .delete(&ctx, &params.prior_state)
                .await
                .map(|_| Value::Null),
            (true, false) => resource.create(&ctx, &params.planned_state).await,
            (false, false) => {
                resource
                    .update(&ctx, &params.prior_state, &params.planned_state)
                    .await
            }
        };

        match result {
            Ok(state) => json!({ "new_state": state, "diagnostics": [] }),
            Err(err) => {
                error!(type_name = %params.type_name, error = %err, "could not apply resource change");
                failure(Diagnostic::from(&err))
            }
        }
    }

    async fn read_resource(&self, params: ReadResourceParams) -> Value {
        let failure = |diagnostic: Diagnostic| {
            json!({ "new_state": params.current_state, "diagnostics": [diagnostic] })
        };

        let resource = match self.resource(&params.type_name) {
            Ok(resource) => resource,
            Err(diagnostic) => return failure(diagnostic),
        };

        let ctx = match self.context().await {
            Ok(ctx) => ctx,
            Err(diagnostic) => return failure(diagnostic),
        };

        match resource.read(&ctx, &params.current_state).await {
            Ok(state) => json!({ "new_state": state, "diagnostics": [] }),
            Err(err) => {
                error!(type_name = %params.type_name, error = %err, "could not read resource");
                failure(Diagnostic::from(&err))
            }
        }
    }

    fn import_resource_state(&self, params: ImportResourceStateParams) -> Value {
        let result = self
            .resource(&params.type_name)
            .and_then(|resource| resource.import(&params.id).map_err(|err| Diagnostic::from(&err)));

        match result {
            Ok(state) => json!({
                "imported_resources": [{ "type_name": params.type_name, "state": state }],
                "diagnostics": [],
            }),
            Err(diagnostic) => json!({ "imported_resources": [], "diagnostics": [diagnostic] }),
        }
    }
}

// -----------------------------------------------------------------------------
// Helpers functions

fn params<T>(params: Value) -> Result<T, RpcError>
where
    T: DeserializeOwned,
{
    serde_json::from_value(params).map_err(RpcError::invalid_params)
}
