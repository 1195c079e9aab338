//! # Command module
//!
//! This module provide command line interface structures and helpers
use std::{io, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use clap::{ArgAction, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::svc::{cfg::Configuration, provider::Provider};

pub mod crd;
pub mod schema;

// -----------------------------------------------------------------------------
// Executor trait

#[async_trait]
pub trait Executor {
    type Error;

    async fn execute(&self, config: Arc<Configuration>) -> Result<(), Self::Error>;
}

// -----------------------------------------------------------------------------
// Error enum

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to execute command '{0}', {1}")]
    Execution(String, Arc<Error>),
    #[error("failed to execute command, {0}")]
    CustomResourceDefinition(crd::Error),
    #[error("failed to execute command, {0}")]
    Schema(schema::Error),
    #[error("failed to read request from standard input, {0}")]
    Read(io::Error),
    #[error("failed to write response on standard output, {0}")]
    Write(io::Error),
    #[error("failed to handle termination signal, {0}")]
    SigTerm(io::Error),
}

// -----------------------------------------------------------------------------
// Command enum

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Interact with custom resource definition
    #[clap(name = "custom-resource-definition", alias = "crd", subcommand)]
    CustomResourceDefinition(crd::CustomResourceDefinition),
    /// Print the terraform schema of the provider
    #[clap(name = "schema")]
    Schema,
}

#[async_trait]
impl Executor for Command {
    type Error = Error;

    async fn execute(&self, config: Arc<Configuration>) -> Result<(), Self::Error> {
        match self {
            Self::CustomResourceDefinition(crd) => crd
                .execute(config)
                .await
                .map_err(Error::CustomResourceDefinition)
                .map_err(|err| Error::Execution("custom-resource-definition".into(), Arc::new(err))),
            Self::Schema => schema::print(config)
                .await
                .map_err(Error::Schema)
                .map_err(|err| Error::Execution("schema".into(), Arc::new(err))),
        }
    }
}

// -----------------------------------------------------------------------------
// Args struct

#[derive(Parser, Clone, Debug)]
#[clap(author, version, about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct Args {
    /// Increase log verbosity
    #[clap(short = 'v', global = true, action = ArgAction::Count)]
    pub verbosity: u8,
    /// Specify location of kubeconfig
    #[clap(short = 'k', long = "kubeconfig", global = true)]
    pub kubeconfig: Option<PathBuf>,
    /// Specify location of configuration
    #[clap(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,
    /// Check if configuration is healthy
    #[clap(short = 't', long = "check", global = true)]
    pub check: bool,
    #[clap(subcommand)]
    pub command: Option<Command>,
}

// -----------------------------------------------------------------------------
// serve function

/// serve the json-rpc protocol, one request per line on standard input and
/// one response per line on standard output, until standard input is closed
/// or a termination signal is received
pub async fn serve(config: Arc<Configuration>) -> Result<(), Error> {
    let provider = Provider::new(config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    let signal = tokio::signal::ctrl_c();
    tokio::pin!(signal);

    info!("Start to serve provider protocol on standard input");
    loop {
        let line = tokio::select! {
            result = &mut signal => {
                result.map_err(Error::SigTerm)?;
                info!("Received termination signal, stop to serve");
                break;
            }
            line = lines.next_line() => line.map_err(Error::Read)?,
        };

        let line = match line {
            Some(line) => line,
            None => {
                debug!("Standard input is closed, stop to serve");
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let mut response = provider.handle_request(&line).await;
        response.push('\n');

        stdout
            .write_all(response.as_bytes())
            .await
            .map_err(Error::Write)?;
        stdout.flush().await.map_err(Error::Write)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_line_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn verbosity_counts_occurrences() {
        let args = Args::parse_from(["terraform-provider-k8s", "-vvv", "crd", "view", "table"]);

        assert_eq!(args.verbosity, 3);
        assert!(matches!(
            args.command,
            Some(Command::CustomResourceDefinition(crd::CustomResourceDefinition::View {
                custom_resource: Some(crd::CustomResource::Table)
            }))
        ));
    }

    #[test]
    fn serve_is_the_default() {
        let args = Args::parse_from(["terraform-provider-k8s", "-c", "/etc/provider.toml"]);

        assert!(args.command.is_none());
        assert_eq!(args.config, Some(PathBuf::from("/etc/provider.toml")));
    }
}
