//! Ctyun (天翼云) provider for the Cirrus control plane
//!
//! Implements the [`cirrus_cloud::Provider`] contract for Ctyun over a
//! closed set of resource kinds: VPC, SecurityGroup, Instance, Database,
//! LoadBalancer, and Storage. This backend synthesizes resource state
//! in-process rather than calling the Ctyun API, which keeps the
//! control-plane pipeline runnable end to end without credentials; the
//! wire protocol lives behind the same interface when it arrives.

pub mod error;
pub mod provider;

// Re-exports
pub use error::{CtyunError, Result};
pub use provider::CtyunProvider;
