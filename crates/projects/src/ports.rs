//! Backend port traits.
//!
//! Two planes are reached through these traits:
//!
//! - [`ProjectsRestApi`]: the REST object API, one method per endpoint, each
//!   dispatched to the `/users/...` or `/orgs/...` variant by the caller's
//!   [`OwnerKind`]. Every response carries its status and pagination cursors.
//! - [`GraphQlApi`]: a single generic `execute`; the documents and the typed
//!   decoding of their results live in the orchestration layer.
//!
//! Implementations must consume each response body before returning so that
//! no transport resource outlives the call, on success and failure alike.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    FieldId, FieldUpdate, ItemId, OwnerKind, OwnerLogin, PageRequest, Project, ProjectField,
    ProjectItem, RawCursors, ResolvedScope, TransportError, UpstreamError,
};

// ---------------------------------------------------------------------------
// REST plane
// ---------------------------------------------------------------------------

/// The body of a REST response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody<T> {
    /// A success response decoded into the expected shape.
    Decoded(T),
    /// Any other response, kept as the raw text the backend sent.
    Raw(String),
    /// No body at all (e.g. `204 No Content`).
    Empty,
}

/// A REST response: status, cursors, and body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub cursors: RawCursors,
    pub body: ResponseBody<T>,
}

impl<T> ApiResponse<T> {
    pub fn decoded(status: u16, value: T) -> Self {
        Self {
            status,
            cursors: RawCursors::none(),
            body: ResponseBody::Decoded(value),
        }
    }

    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            cursors: RawCursors::none(),
            body: ResponseBody::Raw(body.into()),
        }
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            cursors: RawCursors::none(),
            body: ResponseBody::Empty,
        }
    }

    #[must_use]
    pub fn with_cursors(mut self, cursors: RawCursors) -> Self {
        self.cursors = cursors;
        self
    }

    /// True for `200 OK` with a decoded body.
    pub fn is_ok(&self) -> bool {
        self.status == 200 && matches!(self.body, ResponseBody::Decoded(_))
    }

    /// The body as text, if the backend sent one that was not decoded.
    pub fn raw_body(&self) -> Option<&str> {
        match &self.body {
            ResponseBody::Raw(text) => Some(text),
            _ => None,
        }
    }

    /// Accepts only `200 OK` with a decoded body; anything else becomes an
    /// [`UpstreamError`] carrying the status and raw body under `context`.
    pub fn into_ok(self, context: &str) -> Result<(T, RawCursors), UpstreamError> {
        match (self.status, self.body) {
            (200, ResponseBody::Decoded(value)) => Ok((value, self.cursors)),
            (status, ResponseBody::Raw(body)) => {
                Err(UpstreamError::status(context, status, Some(body)))
            }
            (status, _) => Err(UpstreamError::status(context, status, None)),
        }
    }
}

/// Filters for listing or getting project items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    /// Project filter syntax (e.g. `"is:open assignee:@me"`).
    pub query: Option<String>,
    /// Field IDs whose values should be included on each item.
    pub fields: Vec<FieldId>,
}

/// The REST object API for Projects v2.
///
/// Every project-specific method takes a [`ResolvedScope`]; the owner kind in it
/// selects the user- or org-shaped endpoint.
#[async_trait]
pub trait ProjectsRestApi: Send + Sync {
    /// `GET /{users|orgs}/{owner}/projectsV2`
    async fn list_projects(
        &self,
        owner: &OwnerLogin,
        kind: OwnerKind,
        query: Option<&str>,
        page: &PageRequest,
    ) -> Result<ApiResponse<Vec<Project>>, TransportError>;

    /// `GET /{users|orgs}/{owner}/projectsV2/{number}`
    async fn get_project(
        &self,
        scope: &ResolvedScope,
    ) -> Result<ApiResponse<Project>, TransportError>;

    /// `GET .../projectsV2/{number}/fields`
    async fn list_project_fields(
        &self,
        scope: &ResolvedScope,
        page: &PageRequest,
    ) -> Result<ApiResponse<Vec<ProjectField>>, TransportError>;

    /// `GET .../projectsV2/{number}/fields/{field_id}`
    async fn get_project_field(
        &self,
        scope: &ResolvedScope,
        field: FieldId,
    ) -> Result<ApiResponse<ProjectField>, TransportError>;

    /// `GET .../projectsV2/{number}/items`
    async fn list_project_items(
        &self,
        scope: &ResolvedScope,
        query: &ItemQuery,
        page: &PageRequest,
    ) -> Result<ApiResponse<Vec<ProjectItem>>, TransportError>;

    /// `GET .../projectsV2/{number}/items/{item_id}`
    async fn get_project_item(
        &self,
        scope: &ResolvedScope,
        item: ItemId,
        fields: &[FieldId],
    ) -> Result<ApiResponse<ProjectItem>, TransportError>;

    /// `PATCH .../projectsV2/{number}/items/{item_id}`
    async fn update_project_item(
        &self,
        scope: &ResolvedScope,
        item: ItemId,
        update: &FieldUpdate,
    ) -> Result<ApiResponse<ProjectItem>, TransportError>;

    /// `DELETE .../projectsV2/{number}/items/{item_id}`
    ///
    /// A `204` is returned as [`ResponseBody::Empty`]; any other status carries
    /// the raw body.
    async fn delete_project_item(
        &self,
        scope: &ResolvedScope,
        item: ItemId,
    ) -> Result<ApiResponse<()>, TransportError>;
}

// ---------------------------------------------------------------------------
// GraphQL plane
// ---------------------------------------------------------------------------

/// A GraphQL document plus its variables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphQlRequest {
    pub query: String,
    pub variables: Value,
}

impl GraphQlRequest {
    pub fn new(query: impl Into<String>, variables: Value) -> Self {
        Self {
            query: query.into(),
            variables,
        }
    }
}

/// The `data`/`errors` envelope of a GraphQL response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl GraphQlResponse {
    /// Decodes `data` into `T`. Returns `Ok(None)` when `data` is absent or null.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<Option<T>, TransportError> {
        match &self.data {
            None | Some(Value::Null) => Ok(None),
            Some(data) => T::deserialize(data)
                .map(Some)
                .map_err(|e| TransportError::Decode(e.to_string())),
        }
    }

    /// All error messages joined with `"; "`, or `None` if there were none.
    pub fn error_summary(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(
            self.errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// A generic GraphQL endpoint.
#[async_trait]
pub trait GraphQlApi: Send + Sync {
    /// Sends a query or mutation and returns the response envelope.
    ///
    /// GraphQL-level errors are returned in the envelope, not as `Err`. A
    /// non-success HTTP status is [`TransportError::Status`].
    async fn execute(&self, request: &GraphQlRequest) -> Result<GraphQlResponse, TransportError>;
}
