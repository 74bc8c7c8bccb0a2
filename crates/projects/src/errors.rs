//! Error taxonomy for project resolution and coordination.
//!
//! [`ProjectsError`] is what every exposed operation returns. It separates:
//!
//! - problems with the caller's arguments, caught before any network call;
//! - identifiers that could not be resolved ([`ResolutionError`]);
//! - transport failures and non-success statuses from either backend
//!   ([`UpstreamError`]);
//! - multi-step workflows that failed after an earlier step already changed
//!   the project, which carry the [`AppliedEffect`]s that persist;
//! - internal serialisation failures.
//!
//! Nothing in this workspace retries. An error ends the invocation that raised it.

use serde::Serialize;
use thiserror::Error;

use crate::{
    ContentNumber, ItemId, ItemKind, ItemNodeId, OwnerKind, OwnerLogin, ProjectNumber,
    RepositoryName,
};

// ---------------------------------------------------------------------------
// Port-level errors
// ---------------------------------------------------------------------------

/// A failure reaching a backend or reading its answer.
///
/// Produced by implementations of the port traits. A REST response with a
/// non-success status is *not* a transport error; it is returned as an
/// [`crate::ApiResponse`] so the caller can inspect the status and body.
/// Endpoints without that envelope (GraphQL) report it as [`Self::Status`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The request could not be sent or the response could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// A value did not have the expected shape.
    #[error("response could not be decoded: {0}")]
    Decode(String),

    /// The endpoint answered with a non-success status.
    #[error("endpoint answered {status}")]
    Status { status: u16, body: String },

    /// The endpoint answered successfully but its body did not have the
    /// expected shape.
    #[error("response with status {status} could not be decoded: {reason}")]
    UndecodableBody {
        status: u16,
        body: String,
        reason: String,
    },
}

impl TransportError {
    /// The status and body of the answer, when the endpoint answered at all.
    pub fn answer(&self) -> Option<(u16, &str)> {
        match self {
            Self::Status { status, body } | Self::UndecodableBody { status, body, .. } => {
                Some((*status, body.as_str()))
            }
            Self::Request(_) | Self::Decode(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Upstream errors
// ---------------------------------------------------------------------------

/// A backend call that did not succeed.
///
/// `context` names the operation (e.g. `"failed to update a project item"`);
/// `status` and `body` are present when the backend answered at all.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{context}: {message}")]
pub struct UpstreamError {
    pub context: String,
    pub message: String,
    pub status: Option<u16>,
    pub body: Option<String>,
}

impl UpstreamError {
    /// The backend could not be reached or its answer could not be read.
    ///
    /// Keeps the status and body when the backend did answer.
    pub fn transport(context: impl Into<String>, error: TransportError) -> Self {
        let (status, body) = match error.answer() {
            Some((status, body)) => (Some(status), Some(body.to_string())),
            None => (None, None),
        };
        Self {
            context: context.into(),
            message: error.to_string(),
            status,
            body,
        }
    }

    /// The backend answered with a status the operation does not accept.
    pub fn status(context: impl Into<String>, status: u16, body: Option<String>) -> Self {
        Self {
            context: context.into(),
            message: format!("unexpected status {status}"),
            status: Some(status),
            body,
        }
    }

    /// The backend answered successfully but the answer was unusable.
    pub fn malformed(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            message: message.into(),
            status: None,
            body: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution errors
// ---------------------------------------------------------------------------

/// An identifier that could not be translated into the scheme a later call needs.
///
/// Every variant names the identifier that failed to resolve.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolutionError {
    /// Neither the user nor the org variant of the project exists.
    #[error(
        "could not determine owner type for {owner} with project {number}: \
         owner is neither a user nor an org with this project"
    )]
    OwnerKind {
        owner: OwnerLogin,
        number: ProjectNumber,
    },

    /// The repository or the numbered issue/pull request does not exist.
    #[error("failed to resolve {kind} {owner}/{repo}#{number}: {reason}")]
    Content {
        kind: ItemKind,
        owner: OwnerLogin,
        repo: RepositoryName,
        number: ContentNumber,
        reason: String,
    },

    /// The project's own node ID could not be looked up.
    #[error("failed to get project ID for {kind} project {owner}/{number}: {reason}")]
    ProjectNode {
        kind: OwnerKind,
        owner: OwnerLogin,
        number: ProjectNumber,
        reason: String,
    },

    /// Neither the user nor the org project listing succeeded for this login.
    #[error("failed to list projects for owner '{owner}': not found as user or organization")]
    OwnerNotFound { owner: OwnerLogin },

    /// No project field has this exact name.
    #[error("field {field:?} not found in project")]
    FieldNotFound { field: String },

    /// The field exists but has no option with this exact name.
    #[error("option {option:?} not found in field {field:?}")]
    OptionNotFound { field: String, option: String },

    /// The bounded item scan ended without finding the issue.
    #[error(
        "project item for issue {owner}/{repo}#{number} not found \
         after scanning {scanned} items (list may be paginated)"
    )]
    ItemNotFound {
        owner: OwnerLogin,
        repo: RepositoryName,
        number: ContentNumber,
        scanned: usize,
    },
}

// ---------------------------------------------------------------------------
// Workflow effects
// ---------------------------------------------------------------------------

/// A change a multi-step workflow made before a later step failed.
///
/// Effects are never rolled back; callers use this list to recover precisely
/// instead of re-running the whole workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum AppliedEffect {
    /// The issue or pull request was added to the project.
    ItemAdded {
        item_node_id: ItemNodeId,
        content: String,
    },
    /// A single-select field was set on the item.
    FieldSet {
        item_id: ItemId,
        field: String,
        option: String,
    },
}

impl std::fmt::Display for AppliedEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ItemAdded {
                item_node_id,
                content,
            } => write!(f, "added {content} as item {item_node_id}"),
            Self::FieldSet { field, option, .. } => write!(f, "{field}={option}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// The error returned by every exposed operation.
#[derive(Debug, Error)]
pub enum ProjectsError {
    /// A missing or malformed argument, caught before any network call.
    #[error("{message}")]
    Validation { message: String },

    /// An identifier could not be resolved.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// A backend call failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// A later step failed after earlier steps had already changed the project.
    #[error("{step} failed; earlier changes persist ({}): {source}", display_effects(.applied))]
    PartialWorkflow {
        step: String,
        applied: Vec<AppliedEffect>,
        source: Box<ProjectsError>,
    },

    /// A result could not be serialised. Always a logic defect.
    #[error("failed to marshal response: {0}")]
    Marshal(#[from] serde_json::Error),
}

fn display_effects(applied: &[AppliedEffect]) -> String {
    applied
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ProjectsError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Wraps `self` as the failure of `step` in a workflow that already applied `applied`.
    pub fn after_effects(self, step: impl Into<String>, applied: Vec<AppliedEffect>) -> Self {
        Self::PartialWorkflow {
            step: step.into(),
            applied,
            source: Box::new(self),
        }
    }

    /// A short machine-readable name for the error category.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Resolution(_) => "resolution",
            Self::Upstream(_) => "upstream",
            Self::PartialWorkflow { .. } => "partial_workflow",
            Self::Marshal(_) => "marshal",
        }
    }

    /// Renders the structured error payload returned to callers.
    pub fn to_payload(&self) -> ErrorPayload {
        let mut payload = ErrorPayload {
            kind: self.kind(),
            message: self.to_string(),
            status: None,
            body: None,
            failed_step: None,
            applied: Vec::new(),
        };
        match self {
            Self::Upstream(upstream) => {
                payload.status = upstream.status;
                payload.body = upstream.body.clone();
            }
            Self::PartialWorkflow {
                step,
                applied,
                source,
            } => {
                let inner = source.to_payload();
                payload.status = inner.status;
                payload.body = inner.body;
                payload.failed_step = Some(step.clone());
                payload.applied = applied.clone();
            }
            _ => {}
        }
        payload
    }
}

/// The structured failure payload of an exposed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub applied: Vec<AppliedEffect>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_status_errors_carry_status_and_body() {
        let err = ProjectsError::from(UpstreamError::status(
            "failed to delete a project item",
            200,
            Some("{\"ok\":true}".into()),
        ));

        let payload = err.to_payload();
        assert_eq!(payload.kind, "upstream");
        assert_eq!(payload.status, Some(200));
        assert_eq!(payload.body.as_deref(), Some("{\"ok\":true}"));
        assert_eq!(
            payload.message,
            "failed to delete a project item: unexpected status 200"
        );
    }

    #[test]
    fn transport_errors_keep_the_answer_when_there_was_one() {
        let answered = UpstreamError::transport(
            "failed to resolve node id",
            TransportError::Status {
                status: 502,
                body: "{\"message\":\"Bad gateway\"}".into(),
            },
        );
        assert_eq!(answered.status, Some(502));
        assert_eq!(answered.body.as_deref(), Some("{\"message\":\"Bad gateway\"}"));
        assert_eq!(answered.message, "endpoint answered 502");

        let undecodable = UpstreamError::transport(
            "failed to get project",
            TransportError::UndecodableBody {
                status: 200,
                body: "<html>".into(),
                reason: "expected value".into(),
            },
        );
        assert_eq!(undecodable.status, Some(200));
        assert_eq!(undecodable.body.as_deref(), Some("<html>"));

        let unreachable =
            UpstreamError::transport("failed to get project", TransportError::Request("dns".into()));
        assert_eq!(unreachable.status, None);
        assert_eq!(unreachable.body, None);
    }

    #[test]
    fn partial_workflow_payload_lists_applied_effects_and_inner_status() {
        let inner = ProjectsError::from(UpstreamError::status(
            "failed to update a project item",
            422,
            Some("invalid option".into()),
        ));
        let err = inner.after_effects(
            "set Size",
            vec![AppliedEffect::FieldSet {
                item_id: ItemId::new(7),
                field: "Priority".into(),
                option: "High".into(),
            }],
        );

        let payload = err.to_payload();
        assert_eq!(payload.kind, "partial_workflow");
        assert_eq!(payload.failed_step.as_deref(), Some("set Size"));
        assert_eq!(payload.status, Some(422));
        assert_eq!(payload.applied.len(), 1);
        assert!(payload.message.starts_with("set Size failed; earlier changes persist (Priority=High)"));
    }

    #[test]
    fn option_not_found_names_field_and_option() {
        let err = ResolutionError::OptionNotFound {
            field: "Priority".into(),
            option: "Medium".into(),
        };
        assert_eq!(
            err.to_string(),
            "option \"Medium\" not found in field \"Priority\""
        );
    }
}
