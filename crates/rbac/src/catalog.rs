//! Permission catalog: the session-scoped snapshot of what can be granted.
//!
//! The permissions-listing endpoint returns one group per resource, each with
//! the resource's grantable permissions. The catalog is read-only after
//! construction; the selection layer only ever looks things up in it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use haven_core::{DomainError, DomainResult, PermissionId};

use crate::action::ActionCategory;

// ─────────────────────────────────────────────────────────────────────────────
// Permission
// ─────────────────────────────────────────────────────────────────────────────

/// An atomic `{resource, action}` capability grant.
///
/// Mirrors the wire shape of the permissions-listing response; the flag fields
/// are optional there and default to `false`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub resource: String,
    pub action: String,

    /// Standalone permissions behave like "manage": they stand for the whole
    /// resource rather than one action on it.
    #[serde(default)]
    pub is_standalone: bool,

    /// Only a super-admin context may toggle this permission.
    #[serde(default)]
    pub requires_superadmin: bool,
}

impl Permission {
    /// Semantic category of this permission's raw action, if any.
    pub fn category(&self) -> Option<ActionCategory> {
        ActionCategory::classify(&self.action)
    }

    /// Manage permissions supersede the resource's granular permissions.
    pub fn is_manage(&self) -> bool {
        self.is_standalone || self.category() == Some(ActionCategory::Manage)
    }

    pub fn is_operation_class(&self) -> bool {
        self.category().is_some_and(ActionCategory::is_operation_class)
    }

    pub fn is_view_class(&self) -> bool {
        self.category().is_some_and(ActionCategory::is_view_class)
    }
}

/// One resource's permissions, in the order the backend lists them.
///
/// Action values within a group are not guaranteed unique across case, so
/// every lookup here is first-match over that order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PermissionGroup {
    pub resource: String,
    pub display_name: String,
    pub permissions: Vec<Permission>,
}

impl PermissionGroup {
    /// First permission in the group whose raw action the category accepts.
    pub fn action_permission(&self, category: ActionCategory) -> Option<&Permission> {
        find_action_permission(&self.permissions, category)
    }
}

/// First permission in the list whose raw action the category accepts.
pub fn find_action_permission(
    permissions: &[Permission],
    category: ActionCategory,
) -> Option<&Permission> {
    permissions.iter().find(|p| category.accepts(&p.action))
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

/// Indexed, immutable view over the permission groups of one session.
///
/// # Invariants
/// - One group per resource.
/// - Permission IDs are unique across the whole catalog.
/// - Every permission's `resource` matches its containing group's `resource`.
#[derive(Debug, Clone)]
pub struct PermissionCatalog {
    groups: Vec<PermissionGroup>,
    retrieved_at: DateTime<Utc>,
    by_id: HashMap<PermissionId, (usize, usize)>,
    by_resource: HashMap<String, usize>,
}

impl PermissionCatalog {
    /// Build the indexed catalog from deserialized groups.
    ///
    /// Structural defects in the response are rejected here, once, so lookups
    /// never have to re-check them. Action names no category accepts are kept
    /// (they toggle as plain granular permissions) but logged, since they
    /// usually mean the backend vocabulary grew past this build.
    pub fn from_groups(
        groups: Vec<PermissionGroup>,
        retrieved_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let mut by_id = HashMap::new();
        let mut by_resource = HashMap::new();

        for (group_idx, group) in groups.iter().enumerate() {
            if by_resource.insert(group.resource.clone(), group_idx).is_some() {
                return Err(DomainError::conflict(format!(
                    "duplicate permission group for resource '{}'",
                    group.resource
                )));
            }

            for (perm_idx, permission) in group.permissions.iter().enumerate() {
                if permission.resource != group.resource {
                    return Err(DomainError::invariant(format!(
                        "permission {} names resource '{}' inside group '{}'",
                        permission.id, permission.resource, group.resource
                    )));
                }
                if by_id.insert(permission.id, (group_idx, perm_idx)).is_some() {
                    return Err(DomainError::conflict(format!(
                        "duplicate permission id {}",
                        permission.id
                    )));
                }
                if permission.category().is_none() && !permission.is_standalone {
                    warn!(
                        id = %permission.id,
                        resource = %permission.resource,
                        action = %permission.action,
                        "permission action has no known category"
                    );
                }
            }
        }

        Ok(Self {
            groups,
            retrieved_at,
            by_id,
            by_resource,
        })
    }

    pub fn groups(&self) -> &[PermissionGroup] {
        &self.groups
    }

    /// When this snapshot was taken from the listing endpoint.
    pub fn retrieved_at(&self) -> DateTime<Utc> {
        self.retrieved_at
    }

    pub fn find(&self, id: PermissionId) -> Option<&Permission> {
        let (group_idx, perm_idx) = *self.by_id.get(&id)?;
        Some(&self.groups[group_idx].permissions[perm_idx])
    }

    pub fn group(&self, resource: &str) -> Option<&PermissionGroup> {
        let group_idx = *self.by_resource.get(resource)?;
        Some(&self.groups[group_idx])
    }

    /// The resource's manage permission (manage-class or standalone), if any.
    pub fn manage_permission(&self, resource: &str) -> Option<&Permission> {
        self.group(resource)?.permissions.iter().find(|p| p.is_manage())
    }

    /// The resource's first view-class permission, if any.
    pub fn view_permission(&self, resource: &str) -> Option<&Permission> {
        self.group(resource)?.permissions.iter().find(|p| p.is_view_class())
    }

    /// The resource's operation-class permissions, in group order.
    pub fn operation_permissions<'a>(
        &'a self,
        resource: &str,
    ) -> impl Iterator<Item = &'a Permission> {
        self.group(resource)
            .map(|g| g.permissions.as_slice())
            .unwrap_or_default()
            .iter()
            .filter(|p| p.is_operation_class())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perm(id: i64, resource: &str, action: &str) -> Permission {
        Permission {
            id: PermissionId::new(id),
            resource: resource.to_string(),
            action: action.to_string(),
            is_standalone: false,
            requires_superadmin: false,
        }
    }

    fn group_of(resource: &str, permissions: Vec<Permission>) -> PermissionGroup {
        PermissionGroup {
            resource: resource.to_string(),
            display_name: resource.to_string(),
            permissions,
        }
    }

    fn catalog(groups: Vec<PermissionGroup>) -> DomainResult<PermissionCatalog> {
        PermissionCatalog::from_groups(groups, Utc::now())
    }

    #[test]
    fn wire_shape_defaults_the_flags() {
        let parsed: Permission = serde_json::from_str(
            r#"{"id": 7, "resource": "blog", "action": "view"}"#,
        )
        .unwrap();
        assert!(!parsed.is_standalone);
        assert!(!parsed.requires_superadmin);
        assert_eq!(parsed.category(), Some(ActionCategory::View));
    }

    #[test]
    fn duplicate_resource_groups_are_rejected() {
        let err = catalog(vec![
            group_of("blog", vec![perm(1, "blog", "view")]),
            group_of("blog", vec![perm(2, "blog", "create")]),
        ])
        .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn duplicate_permission_ids_are_rejected() {
        let err = catalog(vec![
            group_of("blog", vec![perm(1, "blog", "view")]),
            group_of("media", vec![perm(1, "media", "view")]),
        ])
        .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn group_resource_mismatch_violates_invariant() {
        let err = catalog(vec![group_of("blog", vec![perm(1, "media", "view")])]).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn lookups_are_first_match_over_group_order() {
        let cat = catalog(vec![group_of(
            "blog",
            vec![
                perm(1, "blog", "Read"),
                perm(2, "blog", "view"),
                perm(3, "blog", "create"),
            ],
        )])
        .unwrap();

        // "Read" precedes "view" in group order, so it wins.
        assert_eq!(cat.view_permission("blog").unwrap().id, PermissionId::new(1));
    }

    #[test]
    fn find_action_permission_matches_synonyms() {
        let permissions = vec![perm(1, "blog", "list"), perm(2, "blog", "update")];
        let hit = find_action_permission(&permissions, ActionCategory::Edit).unwrap();
        assert_eq!(hit.id, PermissionId::new(2));
        assert!(find_action_permission(&permissions, ActionCategory::Delete).is_none());
    }

    #[test]
    fn standalone_counts_as_manage_even_with_odd_action_name() {
        let mut standalone = perm(9, "settings", "full_access");
        standalone.is_standalone = true;
        let cat = catalog(vec![group_of(
            "settings",
            vec![standalone, perm(10, "settings", "view")],
        )])
        .unwrap();

        assert_eq!(
            cat.manage_permission("settings").unwrap().id,
            PermissionId::new(9)
        );
    }

    #[test]
    fn operation_permissions_keep_group_order() {
        let cat = catalog(vec![group_of(
            "blog",
            vec![
                perm(1, "blog", "view"),
                perm(2, "blog", "delete"),
                perm(3, "blog", "create"),
            ],
        )])
        .unwrap();

        let ops: Vec<PermissionId> = cat.operation_permissions("blog").map(|p| p.id).collect();
        assert_eq!(ops, vec![PermissionId::new(2), PermissionId::new(3)]);
        assert!(cat.operation_permissions("unknown").next().is_none());
    }
}
