//! Filter policy store: per-category overrides on top of registry defaults.
//!
//! ## Resolution Order
//!
//! For a category `c`, the effective action is the first of:
//!
//! 1. an override set on `c` itself (any scope)
//! 2. the nearest ancestor's override with [`FilterScope::Subtree`]
//! 3. the registry default for `c` (own, else inherited)
//!
//! Overrides are keyed by exact category; setting one again replaces it, so
//! the last write wins per category name. [`FilterPolicyStore::set_filter`]
//! sets a subtree override, so filtering a parent reaches every descendant
//! that has no override of its own.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::registry::{CategoryRegistry, UnknownCategoryError};
use crate::types::{CategoryId, FilterAction, FilterScope};

/// A user-set action for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyOverride {
    /// Action to apply.
    pub action: FilterAction,
    /// Whether descendants inherit it.
    pub scope: FilterScope,
}

/// Where an effective action came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionSource {
    /// Override set on the category itself.
    Override(FilterScope),
    /// Subtree override inherited from an ancestor.
    Inherited(CategoryId),
    /// Compiled-in registry default.
    Default,
}

/// An effective action together with its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedAction {
    /// Action that applies.
    pub action: FilterAction,
    /// Where it came from.
    pub source: ActionSource,
}

/// Serializable view of every category's effective action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySnapshot {
    /// Category name to effective action, ordered by name.
    pub actions: BTreeMap<String, FilterAction>,
}

/// Current override per category.
#[derive(Debug, Clone)]
pub struct FilterPolicyStore {
    registry: Arc<CategoryRegistry>,
    overrides: BTreeMap<CategoryId, PolicyOverride>,
}

impl FilterPolicyStore {
    /// Create a store with no overrides.
    pub fn new(registry: Arc<CategoryRegistry>) -> Self {
        Self {
            registry,
            overrides: BTreeMap::new(),
        }
    }

    /// Registry this store resolves against.
    pub fn registry(&self) -> &Arc<CategoryRegistry> {
        &self.registry
    }

    /// Override the action for a category and every descendant without an
    /// override of its own.
    ///
    /// # Errors
    /// [`UnknownCategoryError`] if `category` was not issued by this store's registry.
    pub fn set_filter(
        &mut self,
        category: CategoryId,
        action: FilterAction,
    ) -> Result<(), UnknownCategoryError> {
        self.set_filter_scoped(category, action, FilterScope::Subtree)
    }

    /// Override the action for this category only.
    pub fn set_filter_exact(
        &mut self,
        category: CategoryId,
        action: FilterAction,
    ) -> Result<(), UnknownCategoryError> {
        self.set_filter_scoped(category, action, FilterScope::Exact)
    }

    /// Override the action for a category with an explicit scope.
    pub fn set_filter_scoped(
        &mut self,
        category: CategoryId,
        action: FilterAction,
        scope: FilterScope,
    ) -> Result<(), UnknownCategoryError> {
        if !self.registry.contains(category) {
            return Err(UnknownCategoryError(category.to_string()));
        }
        self.overrides.insert(category, PolicyOverride { action, scope });
        Ok(())
    }

    /// Remove the override on one category. Returns the removed override.
    pub fn clear(&mut self, category: CategoryId) -> Option<PolicyOverride> {
        self.overrides.remove(&category)
    }

    /// Override set directly on a category, if any.
    pub fn override_for(&self, category: CategoryId) -> Option<PolicyOverride> {
        self.overrides.get(&category).copied()
    }

    /// Effective action for a category. Never fails; an id from another
    /// registry resolves to the root's default.
    pub fn effective_action(&self, category: CategoryId) -> FilterAction {
        self.resolve_action(category).action
    }

    /// Effective action and its source.
    pub fn resolve_action(&self, category: CategoryId) -> ResolvedAction {
        if let Some(o) = self.overrides.get(&category) {
            return ResolvedAction {
                action: o.action,
                source: ActionSource::Override(o.scope),
            };
        }

        for ancestor in self.registry.ancestors(category) {
            if let Some(o) = self.overrides.get(&ancestor.id()) {
                if o.scope == FilterScope::Subtree {
                    return ResolvedAction {
                        action: o.action,
                        source: ActionSource::Inherited(ancestor.id()),
                    };
                }
            }
        }

        ResolvedAction {
            action: self.registry.default_action(category),
            source: ActionSource::Default,
        }
    }

    /// Clear every override. Idempotent.
    pub fn reset(&mut self) {
        self.overrides.clear();
    }

    /// Whether no overrides are set.
    pub fn is_default(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Number of overrides.
    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    /// Whether there are no overrides.
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Overrides in category order.
    pub fn overrides(&self) -> impl Iterator<Item = (CategoryId, PolicyOverride)> + '_ {
        self.overrides.iter().map(|(id, o)| (*id, *o))
    }

    /// Effective action of every registered category.
    pub fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot {
            actions: self
                .registry
                .iter()
                .map(|c| (c.name().to_string(), self.effective_action(c.id())))
                .collect(),
        }
    }
}
