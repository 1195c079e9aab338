//! # Services module
//!
//! This module provide services to interact with kubernetes, the custom
//! resources served and the terraform provider built on top of them.
pub mod cfg;
pub mod crd;
pub mod k8s;
pub mod provider;
