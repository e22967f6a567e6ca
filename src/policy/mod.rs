//! Filter policy definitions.

pub mod store;

pub use store::{ActionSource, FilterPolicyStore, PolicyOverride, PolicySnapshot, ResolvedAction};
