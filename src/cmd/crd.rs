//! # Custom resource definition module
//!
//! This module provides custom resource module command line interface function
//! implementation

use std::{error::Error as StdError, str::FromStr, sync::Arc};

use async_trait::async_trait;
use clap::Subcommand;
use kube::CustomResourceExt;

use crate::{
    cmd::Executor,
    svc::{
        cfg::Configuration,
        crd::{database::Database, migration::Migration, table::Table},
    },
};

// -----------------------------------------------------------------------------
// CustomResource enum

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Debug)]
pub enum CustomResource {
    Database,
    Table,
    Migration,
}

impl FromStr for CustomResource {
    type Err = Box<dyn StdError + Send + Sync>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "database" => Ok(Self::Database),
            "table" => Ok(Self::Table),
            "migration" => Ok(Self::Migration),
            _ => Err(format!(
                "failed to parse '{}', available options are 'database', 'table' or 'migration'",
                s
            )
            .into()),
        }
    }
}

// -----------------------------------------------------------------------------
// Error enum

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to serialize custom resource definition, {0}")]
    Serialize(serde_yaml::Error),
}

// -----------------------------------------------------------------------------
// CustomResourceDefinition enum

#[derive(Subcommand, Clone, Debug)]
pub enum CustomResourceDefinition {
    /// View custom resource definition
    #[clap(name = "view", alias = "v")]
    View {
        #[clap(name = "custom-resource")]
        custom_resource: Option<CustomResource>,
    },
}

#[async_trait]
impl Executor for CustomResourceDefinition {
    type Error = Error;

    #[tracing::instrument(skip(config))]
    async fn execute(&self, config: Arc<Configuration>) -> Result<(), Self::Error> {
        match self {
            Self::View { custom_resource } => view(config, custom_resource).await,
        }
    }
}

// -----------------------------------------------------------------------------
// view function

/// returns the yaml documents of the given custom resource definition or of
/// every one of them
pub fn render(custom_resource: &Option<CustomResource>) -> Result<String, Error> {
    let crds = match custom_resource {
        Some(CustomResource::Database) => vec![Database::crd()],
        Some(CustomResource::Table) => vec![Table::crd()],
        Some(CustomResource::Migration) => vec![Migration::crd()],
        None => vec![Database::crd(), Table::crd(), Migration::crd()],
    };

    let documents = crds
        .iter()
        .map(|crd| serde_yaml::to_string(crd).map_err(Error::Serialize))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(documents.join("---\n"))
}

#[tracing::instrument(skip(_config))]
pub async fn view(
    _config: Arc<Configuration>,
    custom_resource: &Option<CustomResource>,
) -> Result<(), Error> {
    print!("{}", render(custom_resource)?);
    Ok(())
}
