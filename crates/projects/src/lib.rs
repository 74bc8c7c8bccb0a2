//! Domain model for GitHub Projects v2 resolution and coordination.
//!
//! This crate contains every domain concept, newtype identifier, shared value
//! type, and error type used by the workspace, plus the port traits through
//! which the two backend planes (REST objects and GraphQL) are reached.
//! Infrastructure crates implement the ports; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Domain + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`OwnerLogin`, `FieldId`, `ContentNodeId`, etc.) |
//! | [`types`] | Value types (`OwnerKind`, `ProjectScope`, `ProjectItem`, `FieldUpdate`, etc.) |
//! | [`pagination`] | Opaque cursors, page requests, and page info |
//! | [`errors`] | The error taxonomy and the structured error payload |
//! | [`settings`] | Tunable bounds (page sizes, item scan window) |
//! | [`ports`] | `ProjectsRestApi` and `GraphQlApi` backend traits |

pub mod errors;
pub mod identifiers;
pub mod pagination;
pub mod ports;
pub mod settings;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{
    AppliedEffect, ErrorPayload, ProjectsError, ResolutionError, TransportError, UpstreamError,
};
pub use identifiers::{
    ContentNodeId, ContentNumber, FieldId, InvocationId, ItemId, ItemNodeId, OptionId, OwnerLogin,
    ProjectNodeId, ProjectNumber, RepositoryName,
};
pub use pagination::{Cursor, Page, PageInfo, PageRequest, RawCursors};
pub use ports::{
    ApiResponse, GraphQlApi, GraphQlError, GraphQlRequest, GraphQlResponse, ItemQuery,
    ProjectsRestApi, ResponseBody,
};
pub use settings::{ItemScanBound, Settings};
pub use types::{
    AccountRef, ContentKind, FieldOption, FieldUpdate, ItemContent, ItemKind, OwnerKind, Project, ProjectField,
    ProjectItem, ProjectScope, RepositoryRef, ResolvedScope, TaggedProject, Timestamp,
};
