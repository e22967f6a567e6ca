//! Core types for the warnings subsystem.

pub mod action;
pub mod category;
pub mod emission;

pub use action::{FilterAction, FilterScope, ParseActionError};
pub use category::{CategoryId, WarningCategory};
pub use emission::{Emission, Location};
