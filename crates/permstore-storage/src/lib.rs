//! permstore-storage: Storage boundary for the permission cache
//!
//! This crate describes the relational permission tables as seen by the
//! permission cache:
//! - `PermissionSource` trait with the read operations the cache issues
//! - Row types for permission, role assignment and role permission rows
//! - In-memory implementation for tests and tooling
//! - JSON snapshot format used to seed the in-memory implementation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │             permstore-storage               │
//! ├─────────────────────────────────────────────┤
//! │  traits.rs   - PermissionSource + rows      │
//! │  memory.rs   - In-memory implementation     │
//! │  snapshot.rs - JSON seed format             │
//! └─────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod memory;
pub mod snapshot;
pub mod traits;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use memory::MemoryPermissionSource;
pub use snapshot::PermissionSnapshot;
pub use traits::{
    GroupId, LanguageId, NodeId, ObjectId, ObjectPermissionRow, ObjectRoleRow, PermissionRow,
    PermissionSource, RoleAssignmentRow, RoleId, RolePermissionRow, TypeId, UserId,
};
