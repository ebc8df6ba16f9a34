//! `haven-rbac` — role & permission domain for the admin panel.
//!
//! This crate is intentionally decoupled from HTTP and storage. It models the
//! permission catalog handed out by the permissions-listing endpoint, the
//! selection of permissions for a role being created or edited, and the
//! payload that selection is submitted as. The backend owns the durable
//! record; everything here is session-scoped.

pub mod action;
pub mod catalog;
pub mod form;
pub mod selection;

pub use action::ActionCategory;
pub use catalog::{Permission, PermissionCatalog, PermissionGroup, find_action_permission};
pub use form::{RoleForm, RolePayload};
pub use selection::{GroupToggleEffect, PermissionSelection, SelectionResolver, ToggleEffect};
