//! Role form binder.
//!
//! The form owns the canonical selection for one role being created or
//! edited. Every mediated mutation re-binds the `permission_ids` field the
//! surrounding request layer serializes; the selection itself is never handed
//! out mutably.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use haven_core::{DomainError, DomainResult, PermissionId, RoleId, TenantId};

use crate::catalog::{Permission, PermissionCatalog};
use crate::selection::{GroupToggleEffect, PermissionSelection, SelectionResolver, ToggleEffect};

/// Role create/update body submitted to the roles endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RolePayload {
    pub tenant_id: TenantId,

    /// Present when updating an existing role, absent on create.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_id: Option<RoleId>,

    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub permission_ids: Vec<PermissionId>,

    pub occurred_at: DateTime<Utc>,
}

/// Form state for one role, from mount to submit.
///
/// # Invariants
/// - `permission_ids` always mirrors the selection (ascending by ID).
/// - The selection changes only through the two toggle entry points.
#[derive(Debug, Clone)]
pub struct RoleForm<'c> {
    tenant_id: TenantId,
    role_id: Option<RoleId>,
    name: String,
    description: Option<String>,
    resolver: SelectionResolver<'c>,
    selection: PermissionSelection,
    permission_ids: Vec<PermissionId>,
}

impl<'c> RoleForm<'c> {
    /// Fresh form for creating a role; the selection starts empty.
    pub fn new(tenant_id: TenantId, catalog: &'c PermissionCatalog, superadmin: bool) -> Self {
        Self {
            tenant_id,
            role_id: None,
            name: String::new(),
            description: None,
            resolver: SelectionResolver::new(catalog, superadmin),
            selection: PermissionSelection::empty(),
            permission_ids: Vec::new(),
        }
    }

    /// Form for editing an existing role, pre-seeded with its current
    /// permissions. IDs the catalog no longer knows are dropped.
    pub fn for_existing_role(
        tenant_id: TenantId,
        role_id: RoleId,
        catalog: &'c PermissionCatalog,
        superadmin: bool,
        current_permissions: impl IntoIterator<Item = PermissionId>,
    ) -> Self {
        let (known, stale): (Vec<PermissionId>, Vec<PermissionId>) = current_permissions
            .into_iter()
            .partition(|id| catalog.find(*id).is_some());
        if !stale.is_empty() {
            debug!(%role_id, ?stale, "dropping permissions the catalog no longer lists");
        }

        let mut form = Self {
            tenant_id,
            role_id: Some(role_id),
            name: String::new(),
            description: None,
            resolver: SelectionResolver::new(catalog, superadmin),
            selection: PermissionSelection::seeded(known),
            permission_ids: Vec::new(),
        };
        form.bind();
        form
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    /// Toggle a single permission and re-bind the field.
    pub fn toggle_permission(&mut self, id: PermissionId) -> ToggleEffect {
        let effect = self.resolver.toggle(&mut self.selection, id);
        if effect.changed_selection() {
            self.bind();
        }
        effect
    }

    /// Toggle a resource's whole permission list and re-bind the field.
    pub fn toggle_all_resource_permissions(
        &mut self,
        permissions: &[Permission],
    ) -> GroupToggleEffect {
        let effect = self.resolver.toggle_group(&mut self.selection, permissions);
        self.bind();
        effect
    }

    pub fn is_permission_selected(&self, id: Option<PermissionId>) -> bool {
        self.selection.is_permission_selected(id)
    }

    pub fn are_all_resource_permissions_selected(&self, permissions: &[Permission]) -> bool {
        self.selection.are_all_selected(permissions)
    }

    pub fn selection(&self) -> &PermissionSelection {
        &self.selection
    }

    /// The bound `permission_ids` field, ascending by ID.
    pub fn permission_ids(&self) -> &[PermissionId] {
        &self.permission_ids
    }

    /// Build the submit payload.
    pub fn payload(&self, occurred_at: DateTime<Utc>) -> DomainResult<RolePayload> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("role name must not be empty"));
        }

        Ok(RolePayload {
            tenant_id: self.tenant_id,
            role_id: self.role_id,
            name: self.name.trim().to_string(),
            description: self.description.clone(),
            permission_ids: self.permission_ids.clone(),
            occurred_at,
        })
    }

    fn bind(&mut self) {
        self.permission_ids = self.selection.ids();
    }
}
