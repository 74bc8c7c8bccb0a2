//! Projects v2 orchestration.
//!
//! This crate sequences calls between the domain types in [`projects`] and the
//! two backend ports (`ProjectsRestApi`, `GraphQlApi`). It contains the
//! resolvers that turn ambiguous caller input into concrete identifiers and
//! the coordinators that run multi-step workflows on top of them.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Components borrow the ports for the duration of
//! one call and hold no state between calls. Every multi-step operation issues
//! its backend calls strictly in sequence.
//!
//! ## Components
//!
//! | Module | Component | Role |
//! |--------|-----------|------|
//! | [`scope`] | [`OwnerScopeResolver`] | user-then-org probing |
//! | [`catalog`] | [`ProjectCatalogReader`] | get/list projects, fields, items |
//! | [`identity`] | [`NodeIdentityResolver`] | repo+number → content node ID |
//! | [`options`] | [`FieldOptionResolver`] | field/option names → IDs |
//! | [`coordinator`] | [`ItemMutationCoordinator`] | add/update/delete and assign-and-tag |
//! | [`operations`] | [`ProjectsService`] | the exposed operations |

pub mod catalog;
pub mod coordinator;
pub mod identity;
pub mod operations;
pub mod options;
pub mod scope;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::{ProjectCatalogReader, ProjectListing};
pub use coordinator::{AddedItem, AssignOutcome, Confirmation, ItemMutationCoordinator};
pub use identity::NodeIdentityResolver;
pub use operations::{OperationOutcome, ProjectsService};
pub use options::{FieldOptionResolver, ResolvedOption};
pub use scope::OwnerScopeResolver;

/// Context strings prefixed to upstream failures, one per backend operation.
pub mod context {
    pub const LIST_PROJECTS: &str = "failed to list projects";
    pub const GET_PROJECT: &str = "failed to get project";
    pub const LIST_FIELDS: &str = "failed to list project fields";
    pub const GET_FIELD: &str = "failed to get project field";
    pub const LIST_ITEMS: &str = "failed to list project items";
    pub const GET_ITEM: &str = "failed to get project item";
    pub const ADD_ITEM: &str = "failed to add a project item";
    pub const UPDATE_ITEM: &str = "failed to update a project item";
    pub const DELETE_ITEM: &str = "failed to delete a project item";
    pub const RESOLVE_NODE: &str = "failed to resolve node ID";
}
