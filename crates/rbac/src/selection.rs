//! Selection store and dependency resolver.
//!
//! The selection set holds the permission IDs currently chosen for a role.
//! It is owned by the form that created it and is only ever mutated through
//! [`SelectionResolver`], which applies the coupling rules between a
//! resource's permissions:
//!
//! # Invariants
//! - While a resource's manage permission is selected, granular toggles for
//!   that resource are absorbed unchanged.
//! - Selecting an operation-class permission pulls in the resource's first
//!   view-class permission, when the catalog has one.
//! - Deselecting a view-class permission removes every selected
//!   operation-class permission of that resource.
//! - Unknown IDs and superadmin-gated toggles absorb as no-ops; nothing in
//!   this module returns an error or panics. The authoritative validation
//!   happens server-side when the role payload is submitted.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use haven_core::PermissionId;

use crate::catalog::{Permission, PermissionCatalog};

// ─────────────────────────────────────────────────────────────────────────────
// Selection set
// ─────────────────────────────────────────────────────────────────────────────

/// The set of permission IDs currently chosen for a role.
///
/// Ordered (ascending by ID), so the bound `permission_ids` array is
/// deterministic. Serializes transparently as that array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PermissionSelection {
    selected: BTreeSet<PermissionId>,
}

impl PermissionSelection {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Pre-seed from an existing role's permissions.
    pub fn seeded(ids: impl IntoIterator<Item = PermissionId>) -> Self {
        Self {
            selected: ids.into_iter().collect(),
        }
    }

    pub fn contains(&self, id: PermissionId) -> bool {
        self.selected.contains(&id)
    }

    /// Checkbox-state lookup tolerating absent IDs from stale UI rows.
    pub fn is_permission_selected(&self, id: Option<PermissionId>) -> bool {
        id.is_some_and(|id| self.contains(id))
    }

    /// True iff every permission in the list is selected. Vacuously true for
    /// an empty list.
    pub fn are_all_selected(&self, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.contains(p.id))
    }

    /// The selected IDs in ascending order.
    pub fn ids(&self) -> Vec<PermissionId> {
        self.selected.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Flip membership; returns whether the ID is selected afterwards.
    fn flip(&mut self, id: PermissionId) -> bool {
        if self.selected.remove(&id) {
            false
        } else {
            self.selected.insert(id);
            true
        }
    }

    fn insert(&mut self, id: PermissionId) {
        self.selected.insert(id);
    }

    fn remove(&mut self, id: PermissionId) -> bool {
        self.selected.remove(&id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolver
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of a single toggle.
///
/// The no-op arms exist so callers and logs can tell an absorbed event from
/// an applied one; the selection is observably unchanged on all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleEffect {
    /// Membership flipped; `selected` is the permission's new state.
    Applied { selected: bool },
    /// The resource's manage permission is selected; granular toggles are
    /// blocked while it stays selected.
    ManageSelected,
    /// The permission requires a super-admin acting context.
    SuperadminRequired,
    /// The ID is not in the catalog (stale UI state).
    UnknownId,
}

impl ToggleEffect {
    pub fn changed_selection(self) -> bool {
        matches!(self, ToggleEffect::Applied { .. })
    }
}

/// Outcome of a bulk group toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupToggleEffect {
    /// Every missing permission of the list was added.
    SelectedAll,
    /// Every permission of the list was removed (all were selected).
    ClearedAll,
}

/// Applies toggle intents to a selection, honoring the catalog's coupling
/// rules. Borrows the catalog for the lifetime of the owning form.
#[derive(Debug, Clone, Copy)]
pub struct SelectionResolver<'c> {
    catalog: &'c PermissionCatalog,
    superadmin: bool,
}

impl<'c> SelectionResolver<'c> {
    pub fn new(catalog: &'c PermissionCatalog, superadmin: bool) -> Self {
        Self { catalog, superadmin }
    }

    pub fn catalog(&self) -> &'c PermissionCatalog {
        self.catalog
    }

    /// Toggle a single permission.
    ///
    /// Same selection + same toggle always yields the same result; toggling
    /// twice flips twice.
    pub fn toggle(&self, selection: &mut PermissionSelection, id: PermissionId) -> ToggleEffect {
        let Some(permission) = self.catalog.find(id) else {
            debug!(%id, "toggle absorbed: permission not in catalog");
            return ToggleEffect::UnknownId;
        };

        if permission.requires_superadmin && !self.superadmin {
            debug!(%id, resource = %permission.resource, "toggle absorbed: superadmin required");
            return ToggleEffect::SuperadminRequired;
        }

        // Manage permissions toggle freely and never touch their siblings.
        if permission.is_manage() {
            let selected = selection.flip(id);
            debug!(%id, resource = %permission.resource, selected, "manage permission toggled");
            return ToggleEffect::Applied { selected };
        }

        if let Some(manage) = self.catalog.manage_permission(&permission.resource) {
            if selection.contains(manage.id) {
                debug!(
                    %id,
                    resource = %permission.resource,
                    manage_id = %manage.id,
                    "toggle absorbed: manage permission selected"
                );
                return ToggleEffect::ManageSelected;
            }
        }

        let selected = selection.flip(id);
        self.normalize_after(selection, permission, selected);
        debug!(%id, resource = %permission.resource, selected, "permission toggled");
        ToggleEffect::Applied { selected }
    }

    /// Re-establish the operation/view coupling around a just-flipped
    /// granular permission.
    fn normalize_after(
        &self,
        selection: &mut PermissionSelection,
        permission: &Permission,
        selected: bool,
    ) {
        if selected && permission.is_operation_class() {
            if let Some(view) = self.catalog.view_permission(&permission.resource) {
                selection.insert(view.id);
            }
        } else if !selected && permission.is_view_class() {
            for operation in self.catalog.operation_permissions(&permission.resource) {
                selection.remove(operation.id);
            }
        }
    }

    /// Toggle a whole resource's permission list at once.
    ///
    /// All-or-nothing over exactly the list passed: if every ID is already
    /// selected, all are removed; otherwise every missing one is added. No
    /// implication logic runs here.
    pub fn toggle_group(
        &self,
        selection: &mut PermissionSelection,
        permissions: &[Permission],
    ) -> GroupToggleEffect {
        if selection.are_all_selected(permissions) {
            for permission in permissions {
                selection.remove(permission.id);
            }
            debug!(count = permissions.len(), "resource group cleared");
            GroupToggleEffect::ClearedAll
        } else {
            for permission in permissions {
                selection.insert(permission.id);
            }
            debug!(count = permissions.len(), "resource group selected");
            GroupToggleEffect::SelectedAll
        }
    }
}
