//! Registry collaborator: login and per-service instance lookups.

pub mod client;
pub mod error;

pub use client::{RegistryClient, RegistryConfig};
pub use error::RegistryError;

use crate::models::InstanceListResult;
use std::future::Future;

/// Anything that can fetch the current instance list of a named service.
pub trait InstanceSource {
    fn fetch_instances(
        &self,
        service_name: &str,
    ) -> impl Future<Output = Result<InstanceListResult, RegistryError>>;
}
