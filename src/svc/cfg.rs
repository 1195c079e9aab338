//! # Configuration module
//!
//! This module provide utilities and helpers to interact with the configuration

use std::{convert::TryFrom, path::PathBuf};

use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

// -----------------------------------------------------------------------------
// Constants

pub const DEFAULT_FIELD_MANAGER: &str = env!("CARGO_PKG_NAME");

// -----------------------------------------------------------------------------
// Kubernetes structure

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct Kubernetes {
    #[serde(rename = "kubeconfig", default)]
    pub kubeconfig: Option<PathBuf>,
    #[serde(rename = "context", default)]
    pub context: Option<String>,
}

// -----------------------------------------------------------------------------
// Apply structure

/// Server-side apply defaults, resources could override them one by one
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug)]
pub struct Apply {
    #[serde(rename = "field_manager")]
    pub field_manager: String,
    #[serde(rename = "force_conflicts")]
    pub force_conflicts: bool,
}

impl Default for Apply {
    fn default() -> Self {
        Self {
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
            force_conflicts: false,
        }
    }
}

// -----------------------------------------------------------------------------
// Error enum

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to load file '{0:?}', {1}")]
    File(PathBuf, ConfigError),
    #[error("failed to load configuration, {0}")]
    Cast(ConfigError),
    #[error("failed to set default for key '{0}', {1}")]
    Default(String, ConfigError),
}

// -----------------------------------------------------------------------------
// Configuration structures

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Debug, Default)]
pub struct Configuration {
    #[serde(rename = "kubernetes", default)]
    pub kubernetes: Kubernetes,
    #[serde(rename = "apply")]
    pub apply: Apply,
}

impl TryFrom<PathBuf> for Configuration {
    type Error = Error;

    fn try_from(path: PathBuf) -> Result<Self, Self::Error> {
        Self::builder()?
            .add_source(File::from(path.to_owned()).required(true))
            .build()
            .map_err(|err| Error::File(path, err))?
            .try_deserialize()
            .map_err(Error::Cast)
    }
}

impl Configuration {
    fn builder() -> Result<ConfigBuilder<DefaultState>, Error> {
        let apply = Apply::default();

        Ok(Config::builder()
            .set_default("apply.field_manager", apply.field_manager)
            .map_err(|err| Error::Default("apply.field_manager".into(), err))?
            .set_default("apply.force_conflicts", apply.force_conflicts)
            .map_err(|err| Error::Default("apply.force_conflicts".into(), err))?
            .add_source(
                Environment::with_prefix(&env!("CARGO_PKG_NAME").replace('-', "_"))
                    .separator("__"),
            ))
    }

    pub fn try_default() -> Result<Self, Error> {
        let mut paths = vec![
            PathBuf::from(format!("/usr/share/{}/config", env!("CARGO_PKG_NAME"))),
            PathBuf::from(format!("/etc/{}/config", env!("CARGO_PKG_NAME"))),
        ];

        if let Some(home) = std::env::var_os("HOME") {
            let home = PathBuf::from(home);

            paths.push(home.join(".config").join(env!("CARGO_PKG_NAME")).join("config"));
            paths.push(
                home.join(".local")
                    .join("share")
                    .join(env!("CARGO_PKG_NAME"))
                    .join("config"),
            );
        }

        paths.push(PathBuf::from("config"));

        paths
            .into_iter()
            .fold(Self::builder()?, |builder, path| {
                builder.add_source(File::from(path).required(false))
            })
            .build()
            .map_err(Error::Cast)?
            .try_deserialize()
            .map_err(Error::Cast)
    }

    pub fn help(&self) {
        info!(
            field_manager = &self.apply.field_manager,
            force_conflicts = self.apply.force_conflicts,
            "Server-side apply defaults to field manager '{}'",
            self.apply.field_manager,
        );

        if let Some(kubeconfig) = &self.kubernetes.kubeconfig {
            info!(
                kubeconfig = kubeconfig.display().to_string(),
                "Use kubernetes configuration from file"
            );
        }
    }
}
