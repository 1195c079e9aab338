//! # Kubernetes module
//!
//! This module provide the kubernetes client, helpers on resources and the
//! context shared by every resource of the provider

use std::sync::Arc;

use crate::svc::cfg::Configuration;

pub mod client;
pub mod resource;

// -----------------------------------------------------------------------------
// Context structure

/// contains the client to interact with kubernetes and the configuration
/// resolved when the provider has been configured.
#[derive(Clone)]
pub struct Context {
    pub kube: kube::Client,
    pub config: Arc<Configuration>,
}

impl From<(kube::Client, Arc<Configuration>)> for Context {
    fn from((kube, config): (kube::Client, Arc<Configuration>)) -> Self {
        Self { kube, config }
    }
}

impl Context {
    pub fn new(kube: kube::Client, config: Arc<Configuration>) -> Self {
        Self::from((kube, config))
    }
}
