//! Cirrus Cloud Control Plane
//!
//! This crate provides the resource control plane for Cirrus: a provider
//! abstraction for declarative management of cloud resources, a registry
//! mapping provider names to implementations, and lifecycle bookkeeping
//! for every resource a run creates.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │               cirrus-orchestrator                │
//! │             (task action handlers)               │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                cirrus-cloud                      │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │        trait ControlPlane { ... }         │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────────────┐    │
//! │  │   Registry   │  │    ResourceStore      │    │
//! │  └──────┬───────┘  └──────────────────────┘    │
//! └─────────┼───────────────────────────────────────┘
//!           │ trait Provider { apply, get }
//! ┌─────────▼───────┐
//! │  cirrus-cloud-  │
//! │     ctyun       │
//! └─────────────────┘
//! ```
//!
//! The control plane's store is the sole authority on resource existence.
//! `delete` removes the local record only — provider-side teardown is a
//! known limitation, not performed here.

pub mod control_plane;
pub mod error;
pub mod provider;
pub mod registry;
pub mod resource;

// Re-exports
pub use control_plane::{AppliedResource, ControlPlane, DefaultControlPlane, ResourceSummary, ResourceView};
pub use error::{CloudError, Result};
pub use provider::{Provider, StateMap};
pub use registry::ProviderRegistry;
pub use resource::{Resource, ResourceStatus, ResourceStore};
