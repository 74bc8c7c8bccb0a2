//! Newtype domain identifiers.
//!
//! Projects v2 addresses the same things through three unrelated schemes:
//! repository-scoped numbers (issues, pull requests), numeric REST identifiers
//! (fields, items), and opaque GraphQL node IDs. Each scheme gets its own
//! newtype so that, for example, an [`ItemNodeId`] returned by item creation
//! can never be passed where an [`ItemId`] is expected, even though both are
//! "the item's ID" in everyday speech.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Macro for integer-wrapped newtypes (GitHub-assigned numbers).
// Generates: struct (Copy, Ord), new(), get(), Display.
// ---------------------------------------------------------------------------
macro_rules! int_id {
    (
        $(#[$attr:meta])*
        $name:ident($inner:ty)
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name($inner);

        impl $name {
            /// Creates a new identifier from a raw integer.
            pub fn new(value: $inner) -> Self {
                Self(value)
            }

            /// Returns the underlying integer value.
            pub fn get(self) -> $inner {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Numbered addressing (sequential per owner or per repository)
// ---------------------------------------------------------------------------

int_id! {
    /// The sequential number of a project within its owner (`/projectsV2/{number}`).
    ProjectNumber(u64)
}

int_id! {
    /// The number of an issue or pull request within its repository (`#42`).
    ContentNumber(u64)
}

// ---------------------------------------------------------------------------
// REST plane (numeric, assigned by the platform)
// ---------------------------------------------------------------------------

int_id! {
    /// Numeric ID of a project field, as used by the REST field and item endpoints.
    FieldId(i64)
}

int_id! {
    /// Numeric ID of a project item, as used by get/update/delete.
    ///
    /// Not obtainable from the item-creation response; see [`ItemNodeId`].
    ItemId(i64)
}

// ---------------------------------------------------------------------------
// Names and opaque strings
// ---------------------------------------------------------------------------

string_id! {
    /// A user or organization login. The platform treats logins case-insensitively.
    OwnerLogin
}

string_id! {
    /// A repository name, without the owner prefix.
    RepositoryName
}

string_id! {
    /// The option ID of a single-select field value (e.g. `"f75ad846"`).
    OptionId
}

// ---------------------------------------------------------------------------
// GraphQL plane (opaque node IDs)
// ---------------------------------------------------------------------------

string_id! {
    /// Platform-wide node ID of an issue or pull request.
    ///
    /// Only the "add item by content ID" mutation consumes this identifier.
    ContentNodeId
}

string_id! {
    /// Node ID of a project, required as the target of the add-item mutation.
    ProjectNodeId
}

string_id! {
    /// Node ID of a project item, as returned by the add-item mutation.
    ///
    /// This is **not** the numeric [`ItemId`]; converting one into the other
    /// requires listing the project's items.
    ItemNodeId
}

// ---------------------------------------------------------------------------
// Invocation correlation
// ---------------------------------------------------------------------------

/// Identifies a single invocation of an exposed operation.
///
/// Generated fresh per call and recorded on the operation's tracing span so that
/// every backend request issued on behalf of one call can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Generates a new random invocation identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for InvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
