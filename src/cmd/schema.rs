//! # Schema module
//!
//! This module provides the command printing the terraform schema of the
//! provider

use std::sync::Arc;

use crate::svc::{cfg::Configuration, provider::Provider};

// -----------------------------------------------------------------------------
// Error enum

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to serialize provider schema, {0}")]
    Serialize(serde_json::Error),
}

// -----------------------------------------------------------------------------
// print function

#[tracing::instrument(skip(config))]
pub async fn print(config: Arc<Configuration>) -> Result<(), Error> {
    let schema = Provider::new(config).schema();

    println!(
        "{}",
        serde_json::to_string_pretty(&schema).map_err(Error::Serialize)?
    );

    Ok(())
}
