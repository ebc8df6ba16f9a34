//! Action classification.
//!
//! The permissions backend describes what a permission allows with a free-form
//! `action` string (`"view"`, `"update"`, `"destroy"`, ...). All selection
//! rules operate on a closed set of categories instead; the mapping from raw
//! strings to categories lives in one table here so no other module carries
//! action-name literals.

use serde::{Deserialize, Serialize};

/// Semantic category of a permission action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    View,
    Create,
    Edit,
    Delete,
    Finalize,
    Manage,
}

/// Raw action strings accepted per category, lowercase.
///
/// The sets are disjoint; a raw action resolves to at most one category.
const SYNONYMS: &[(ActionCategory, &[&str])] = &[
    (ActionCategory::View, &["view", "read", "get", "list"]),
    (ActionCategory::Create, &["create", "post"]),
    (ActionCategory::Edit, &["edit", "update", "put", "patch", "modify"]),
    (ActionCategory::Delete, &["delete", "destroy", "remove"]),
    (ActionCategory::Finalize, &["finalize"]),
    (ActionCategory::Manage, &["manage"]),
];

impl ActionCategory {
    /// Resolve a raw action string to its category, case-insensitively.
    ///
    /// Returns `None` for action names no category accepts; such permissions
    /// stay toggleable but carry no implication behavior.
    pub fn classify(raw: &str) -> Option<Self> {
        let needle = raw.trim().to_ascii_lowercase();
        SYNONYMS
            .iter()
            .find(|(_, names)| names.contains(&needle.as_str()))
            .map(|(category, _)| *category)
    }

    /// True when this category accepts the given raw action string.
    pub fn accepts(self, raw: &str) -> bool {
        Self::classify(raw) == Some(self)
    }

    /// Mutating actions. Selecting one implies the resource's view permission.
    pub fn is_operation_class(self) -> bool {
        matches!(
            self,
            ActionCategory::Create
                | ActionCategory::Edit
                | ActionCategory::Delete
                | ActionCategory::Finalize
        )
    }

    /// Read-only actions. Deselecting one cascades over the resource's
    /// operation permissions.
    pub fn is_view_class(self) -> bool {
        matches!(self, ActionCategory::View)
    }
}

impl core::fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            ActionCategory::View => "view",
            ActionCategory::Create => "create",
            ActionCategory::Edit => "edit",
            ActionCategory::Delete => "delete",
            ActionCategory::Finalize => "finalize",
            ActionCategory::Manage => "manage",
        };
        f.write_str(name)
    }
}
