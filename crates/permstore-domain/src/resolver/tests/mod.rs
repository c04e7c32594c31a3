//! Tests for the permission resolver.
//!
//! Organized by functionality:
//! - Session handling, group resolution and channel scopes
//! - Folder, page, template and construct policies
//! - Object tags, users, groups, roles and scheduler items

mod mocks;
