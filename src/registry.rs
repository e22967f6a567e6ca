//! Category registry: the fixed hierarchy of warning kinds.
//!
//! ## Structure
//!
//! Categories are stored flat, in registration order, and linked to their
//! parent by [`CategoryId`]. Registration must be root-first: a parent has to
//! exist before any of its children.
//!
//! ## Invariants
//!
//! - Exactly one root, and the root always has a default action, so
//!   [`CategoryRegistry::default_action`] terminates for every category.
//! - Names are unique and match `^[a-z][a-z0-9_]*$`.
//! - Once the registry is shared (behind `Arc`) it is never mutated.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex_lite::Regex;

use crate::types::{CategoryId, FilterAction, WarningCategory};

/// Name of the root category of the built-in taxonomy.
pub const ROOT_CATEGORY: &str = "mdao";

/// Name of the built-in deprecation category.
pub const DEPRECATION_CATEGORY: &str = "deprecation";

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid category name regex"))
}

/// Error raised while populating a registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A category with this name is already registered.
    #[error("Duplicate warning category: {0}")]
    DuplicateCategory(String),

    /// The parent named at registration does not exist yet.
    #[error("Unknown parent category {parent:?} for {name:?}")]
    UnknownParent {
        /// Category being registered.
        name: String,
        /// Missing parent.
        parent: String,
    },

    /// Name does not match the allowed pattern.
    #[error("Invalid warning category name: {0:?}")]
    InvalidName(String),

    /// A root category was registered without a default action.
    #[error("Root category {0:?} must have a default action")]
    RootWithoutDefault(String),

    /// A second root was registered.
    #[error("Registry already has root {existing:?}; cannot add root {name:?}")]
    MultipleRoots {
        /// Root already present.
        existing: String,
        /// Rejected category.
        name: String,
    },

    /// The registry already holds as many categories as an id can address.
    #[error("Registry is full; cannot add category {0:?}")]
    CapacityExceeded(String),
}

/// A category name that was never registered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown warning category: {0:?}")]
pub struct UnknownCategoryError(pub String);

/// Registry of warning categories.
#[derive(Debug, Clone, Default)]
pub struct CategoryRegistry {
    categories: Vec<WarningCategory>,
    by_name: BTreeMap<String, CategoryId>,
    children: Vec<Vec<CategoryId>>,
}

impl CategoryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the framework's standard taxonomy.
    ///
    /// # Panics
    ///
    /// Never in practice: the taxonomy is static and covered by tests.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (name, parent, description, default) in BUILTIN_CATEGORIES {
            registry
                .register(name, *parent, description, *default)
                .expect("builtin warning taxonomy is well-formed");
        }
        registry
    }

    /// Register a category.
    ///
    /// # Errors
    /// - [`RegistryError::InvalidName`] if `name` is malformed
    /// - [`RegistryError::DuplicateCategory`] if `name` already exists
    /// - [`RegistryError::UnknownParent`] if `parent` is not registered
    /// - [`RegistryError::RootWithoutDefault`] for a root with no default
    /// - [`RegistryError::MultipleRoots`] if a root already exists
    /// - [`RegistryError::CapacityExceeded`] if no id is left for `name`
    pub fn register(
        &mut self,
        name: &str,
        parent: Option<&str>,
        description: &str,
        default_action: Option<FilterAction>,
    ) -> Result<CategoryId, RegistryError> {
        if !name_pattern().is_match(name) {
            return Err(RegistryError::InvalidName(name.to_string()));
        }
        if self.by_name.contains_key(name) {
            return Err(RegistryError::DuplicateCategory(name.to_string()));
        }

        let parent_id = match parent {
            Some(parent) => Some(*self.by_name.get(parent).ok_or_else(|| {
                RegistryError::UnknownParent {
                    name: name.to_string(),
                    parent: parent.to_string(),
                }
            })?),
            None => {
                if let Some(root) = self.root() {
                    return Err(RegistryError::MultipleRoots {
                        existing: root.name().to_string(),
                        name: name.to_string(),
                    });
                }
                if default_action.is_none() {
                    return Err(RegistryError::RootWithoutDefault(name.to_string()));
                }
                None
            }
        };

        let id = CategoryId::try_new(self.categories.len())
            .ok_or_else(|| RegistryError::CapacityExceeded(name.to_string()))?;
        self.categories.push(WarningCategory::new(
            id,
            name.to_string(),
            parent_id,
            description.to_string(),
            default_action,
        ));
        self.by_name.insert(name.to_string(), id);
        self.children.push(Vec::new());
        if let Some(parent_id) = parent_id {
            self.children[parent_id.index()].push(id);
        }

        Ok(id)
    }

    /// Look up a category by name.
    pub fn resolve(&self, name: &str) -> Result<&WarningCategory, UnknownCategoryError> {
        self.by_name
            .get(name)
            .and_then(|id| self.get(*id))
            .ok_or_else(|| UnknownCategoryError(name.to_string()))
    }

    /// Look up a category by id. `None` for an id this registry never issued.
    pub fn get(&self, id: CategoryId) -> Option<&WarningCategory> {
        self.categories.get(id.index())
    }

    /// Whether `id` was issued by this registry.
    pub fn contains(&self, id: CategoryId) -> bool {
        id.index() < self.categories.len()
    }

    /// Compiled-in default for a category, inherited from the nearest
    /// ancestor when the category has none of its own. An unknown id gets
    /// the root's default.
    pub fn default_action(&self, id: CategoryId) -> FilterAction {
        self.lineage(id)
            .find_map(|c| c.own_default())
            .or_else(|| self.root().and_then(|r| r.own_default()))
            // Registration rejects a root without a default.
            .unwrap_or(FilterAction::DisplayAlways)
    }

    /// The category followed by its ancestors, nearest first, ending at the
    /// root. Empty for an unknown id.
    pub fn lineage(&self, id: CategoryId) -> impl Iterator<Item = &WarningCategory> + '_ {
        std::iter::successors(self.get(id), move |c| c.parent().and_then(|p| self.get(p)))
    }

    /// Ancestors of a category, nearest first. Excludes the category itself.
    pub fn ancestors(&self, id: CategoryId) -> impl Iterator<Item = &WarningCategory> + '_ {
        self.lineage(id).skip(1)
    }

    /// Direct children of a category, in registration order.
    pub fn children(&self, id: CategoryId) -> impl Iterator<Item = &WarningCategory> + '_ {
        self.children
            .get(id.index())
            .into_iter()
            .flatten()
            .filter_map(move |c| self.get(*c))
    }

    /// Whether `id` equals `ancestor` or lies beneath it.
    pub fn is_descendant_of(&self, id: CategoryId, ancestor: CategoryId) -> bool {
        self.lineage(id).any(|c| c.id() == ancestor)
    }

    /// The root category, if any category is registered.
    pub fn root(&self) -> Option<&WarningCategory> {
        self.categories.first()
    }

    /// All categories in registration order (parents before children).
    pub fn iter(&self) -> impl Iterator<Item = &WarningCategory> + '_ {
        self.categories.iter()
    }

    /// Number of registered categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

type BuiltinEntry = (&'static str, Option<&'static str>, &'static str, Option<FilterAction>);

const BUILTIN_CATEGORIES: &[BuiltinEntry] = &[
    (ROOT_CATEGORY, None, "Base category for all framework warnings", Some(FilterAction::DisplayAlways)),
    ("setup", Some(ROOT_CATEGORY), "Issues found while setting up a model", None),
    ("promotion", Some("setup"), "Ambiguous or conflicting variable promotion", None),
    ("units", Some("setup"), "Missing or mismatched units on connected variables", None),
    ("unused_option", Some("setup"), "Options that were set but have no effect", None),
    ("distributed_component", Some("setup"), "Distributed component configuration problems", None),
    ("mpi", Some("setup"), "MPI availability and communicator issues", None),
    ("derivatives", Some(ROOT_CATEGORY), "Derivative computation and checking issues", None),
    ("coloring", Some("derivatives"), "Problems computing or applying sparsity coloring", None),
    (
        "invalid_check_derivatives_options",
        Some(ROOT_CATEGORY),
        "Invalid options passed to derivative checks",
        None,
    ),
    ("solver", Some(ROOT_CATEGORY), "Solver convergence and configuration issues", None),
    ("driver", Some(ROOT_CATEGORY), "Driver configuration and runtime issues", None),
    ("case_recorder", Some(ROOT_CATEGORY), "Case recording issues", None),
    ("cache", Some(ROOT_CATEGORY), "Stale or unusable cached data", Some(FilterAction::DisplayOnce)),
    (
        DEPRECATION_CATEGORY,
        Some(ROOT_CATEGORY),
        "Use of deprecated options, methods or arguments",
        Some(FilterAction::DisplayOnce),
    ),
];
