//! Warning category records.
//!
//! Categories form a tree through an explicit parent index rather than a
//! type hierarchy: dispatch looks up the record, never the Rust type.

use serde::{Deserialize, Serialize};

use super::action::FilterAction;

/// Dense index of a category inside its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CategoryId(u32);

impl CategoryId {
    /// Id for a registry position, or `None` past `u32::MAX`.
    pub(crate) fn try_new(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(Self)
    }

    /// Position of the category in registration order.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One kind of diagnostic condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningCategory {
    id: CategoryId,
    name: String,
    parent: Option<CategoryId>,
    description: String,
    default_action: Option<FilterAction>,
}

impl WarningCategory {
    pub(crate) fn new(
        id: CategoryId,
        name: String,
        parent: Option<CategoryId>,
        description: String,
        default_action: Option<FilterAction>,
    ) -> Self {
        Self {
            id,
            name,
            parent,
            description,
            default_action,
        }
    }

    /// Registry index.
    pub fn id(&self) -> CategoryId {
        self.id
    }

    /// Unique name, used in configuration and output.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent category, `None` for the root.
    pub fn parent(&self) -> Option<CategoryId> {
        self.parent
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Compiled-in default set on this category itself.
    ///
    /// `None` means the default is inherited from the nearest ancestor that
    /// has one; use [`CategoryRegistry::default_action`](crate::CategoryRegistry::default_action)
    /// to resolve it.
    pub fn own_default(&self) -> Option<FilterAction> {
        self.default_action
    }

    /// Whether this is the root of the tree.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

impl std::fmt::Display for WarningCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
