//! Permission value types and object model.
//!
//! This module contains:
//! - 32-bit permission vectors and named bit offsets
//! - Group/role permission pairs and role permission bundles
//! - Numeric object types and feature flags
//! - The closed set of objects permission decisions are made about

mod feature;
mod object;
pub mod object_type;
mod pair;
pub mod perm;
mod permissions;
#[cfg(test)]
mod permissions_proptest;
mod role;

pub use feature::{Feature, FeatureSet};
pub use object::{ObjectClass, PermObject, TagOwner};
pub use pair::PermissionPair;
pub use permissions::{Bit, Permissions, BIT_COUNT};
pub use role::{RolePermissions, ALL_LANGUAGES};

pub use permstore_storage::{GroupId, LanguageId, NodeId, ObjectId, RoleId, TypeId, UserId};
