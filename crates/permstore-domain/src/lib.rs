//! permstore-domain: Permission decision engine
//!
//! This crate contains the permission core:
//! - 32-bit permission vectors and their merge rules
//! - Group/role permission pairs and role permission bundles
//! - The permission cache with refresh/invalidate lifecycle
//! - The static type registry (bits, nesting, instance enumeration)
//! - The session-scoped resolver with per-object-kind policy
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              permstore-domain               │
//! ├─────────────────────────────────────────────┤
//! │  model/    - Bits, pairs, roles, objects    │
//! │  cache/    - Permission cache + listeners   │
//! │  types/    - Type registry                  │
//! │  resolver/ - Session resolver + policies    │
//! └─────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod error;
pub mod model;
pub mod resolver;
pub mod types;

// Re-export commonly used types at the crate root
pub use cache::{
    register_cache_metrics, CacheConfig, ConsistencyReport, PermissionCache, PermissionChange,
    PermissionStoreListener,
};
pub use error::{DomainError, DomainResult};
pub use model::{
    Bit, Feature, FeatureSet, ObjectClass, PermObject, PermissionPair, Permissions,
    RolePermissions, TagOwner,
};
pub use resolver::{ChannelScope, ObjectDirectory, PermissionResolver, ResolverConfig, Session};
pub use types::{TypeEntry, TypeHandle, TypeRegistry};
