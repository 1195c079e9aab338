//! # Resource module
//!
//! This module provide helpers to manipulate kubernetes [`Resource`] through
//! the dynamic api, using server-side apply to create and update them.

use std::fmt::Debug;

use kube::{
    api::{
        ApiResource, DeleteParams, DynamicObject, Patch, PatchParams, PropagationPolicy,
        ValidationDirective,
    },
    Api, Client, Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

// -----------------------------------------------------------------------------
// Helpers functions

/// returns the namespace, if any, and name of the kubernetes resource
pub fn namespaced_name<T>(obj: &T) -> (Option<String>, String)
where
    T: ResourceExt,
{
    (obj.namespace(), obj.name_any())
}

/// returns a dynamic api scoped to the namespace, or to the whole cluster
/// when there is none
pub fn api<T>(client: Client, namespace: Option<&str>) -> Api<DynamicObject>
where
    T: Resource<DynamicType = ()>,
{
    let api_resource = ApiResource::erase::<T>(&());

    match namespace {
        Some(namespace) => Api::namespaced_with(client, namespace, &api_resource),
        None => Api::all_with(client, &api_resource),
    }
}

/// returns the patch parameters of a server-side apply request, unknown or
/// duplicated fields are rejected by the api server
pub fn apply_params(field_manager: &str, force: bool) -> PatchParams {
    let mut params = PatchParams::apply(field_manager);

    params.force = force;
    params.field_validation = Some(ValidationDirective::Strict);
    params
}

/// returns difference between the two given object serialize as json patch
pub fn diff<T>(origin: &T, modified: &T) -> Result<json_patch::Patch, serde_json::Error>
where
    T: Serialize,
{
    Ok(json_patch::diff(
        &serde_json::to_value(origin)?,
        &serde_json::to_value(modified)?,
    ))
}

/// converts an object returned by the dynamic api into its typed form
pub fn parse<T>(obj: DynamicObject) -> Result<T, serde_json::Error>
where
    T: DeserializeOwned,
{
    serde_json::from_value(serde_json::to_value(obj)?)
}

/// make a server-side apply patch request with the given object as body
pub async fn apply<T>(
    client: Client,
    obj: &T,
    params: &PatchParams,
) -> Result<DynamicObject, kube::Error>
where
    T: Resource<DynamicType = ()> + Serialize + Debug,
{
    let (namespace, name) = namespaced_name(obj);

    debug!(
        kind = %T::kind(&()),
        namespace = ?namespace,
        name = %name,
        field_manager = ?params.field_manager,
        force = params.force,
        "execute server-side apply request on resource"
    );

    api::<T>(client, namespace.as_deref())
        .patch(&name, params, &Patch::Apply(obj))
        .await
}

/// retrieve the resource, returns none if it does not exist
pub async fn get<T>(
    client: Client,
    namespace: Option<&str>,
    name: &str,
) -> Result<Option<DynamicObject>, kube::Error>
where
    T: Resource<DynamicType = ()>,
{
    debug!(
        kind = %T::kind(&()),
        namespace = ?namespace,
        name = %name,
        "execute a request to retrieve resource"
    );

    match api::<T>(client, namespace).get(name).await {
        Ok(obj) => Ok(Some(obj)),
        Err(kube::Error::Api(err)) if err.code == 404 => Ok(None),
        Err(err) => Err(err),
    }
}

/// delete the resource, returns false if it was already gone
pub async fn delete<T>(
    client: Client,
    namespace: Option<&str>,
    name: &str,
    propagation_policy: Option<PropagationPolicy>,
) -> Result<bool, kube::Error>
where
    T: Resource<DynamicType = ()>,
{
    let params = DeleteParams {
        propagation_policy,
        ..DeleteParams::default()
    };

    debug!(
        kind = %T::kind(&()),
        namespace = ?namespace,
        name = %name,
        "execute a request to delete resource"
    );

    match api::<T>(client, namespace).delete(name, &params).await {
        Ok(_) => Ok(true),
        Err(kube::Error::Api(err)) if err.code == 404 => Ok(false),
        Err(err) => Err(err),
    }
}
