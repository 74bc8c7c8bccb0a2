//! Shared value types for Projects v2.
//!
//! The entity types ([`Project`], [`ProjectField`], [`ProjectItem`]) double as
//! the decoding targets for the REST plane: their `serde` attributes accept the
//! platform's JSON shapes and their serialised form is what callers receive.
//! They are per-call projections; nothing here is cached or persisted.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{
    ContentNodeId, ContentNumber, FieldId, ItemId, OptionId, OwnerLogin, ProjectNumber,
    ProjectsError,
};

// ---------------------------------------------------------------------------
// Owner scope
// ---------------------------------------------------------------------------

/// Whether a login denotes a personal or an organizational account.
///
/// Selects between the `/users/...` and `/orgs/...` endpoint variants, and
/// between the `user(login:)` and `organization(login:)` GraphQL roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    User,
    Org,
}

impl OwnerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Org => "org",
        }
    }
}

impl std::fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OwnerKind {
    type Err = ProjectsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "org" => Ok(Self::Org),
            other => Err(ProjectsError::validation(format!(
                "owner_type must be either 'user' or 'org' (got {other:?})"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------

/// A project as the caller names it: the owner kind may still be unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectScope {
    pub owner: OwnerLogin,
    pub kind: Option<OwnerKind>,
    pub number: ProjectNumber,
}

impl ProjectScope {
    pub fn new(owner: OwnerLogin, kind: Option<OwnerKind>, number: ProjectNumber) -> Self {
        Self {
            owner,
            kind,
            number,
        }
    }

    /// Returns the resolved scope if the kind was supplied by the caller.
    pub fn as_resolved(&self) -> Option<ResolvedScope> {
        self.kind.map(|kind| self.resolve_as(kind))
    }

    /// Fixes the owner kind, producing the scope every later call uses.
    pub fn resolve_as(&self, kind: OwnerKind) -> ResolvedScope {
        ResolvedScope {
            owner: self.owner.clone(),
            kind,
            number: self.number,
        }
    }
}

/// A project whose owner kind is settled.
///
/// Once a workflow holds a `ResolvedScope`, its kind is authoritative for every
/// subsequent call in that workflow; nothing re-probes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedScope {
    pub owner: OwnerLogin,
    pub kind: OwnerKind,
    pub number: ProjectNumber,
}

impl std::fmt::Display for ResolvedScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.number)
    }
}

// ---------------------------------------------------------------------------
// Content kinds
// ---------------------------------------------------------------------------

/// The addressable content types that can be added to a project by number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Issue,
    PullRequest,
}

impl ItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::PullRequest => "pull_request",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = ProjectsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "issue" => Ok(Self::Issue),
            "pull_request" => Ok(Self::PullRequest),
            _ => Err(ProjectsError::validation(
                "item_type must be either 'issue' or 'pull_request'",
            )),
        }
    }
}

/// What a project item holds. Draft issues exist only inside the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentKind {
    #[serde(rename = "issue", alias = "Issue")]
    Issue,
    #[serde(rename = "pull_request", alias = "PullRequest")]
    PullRequest,
    #[serde(rename = "draft", alias = "DraftIssue")]
    Draft,
    /// A content type this crate does not know yet.
    #[serde(rename = "other", other)]
    Other,
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

/// The minimal projection of a project returned by list and get.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    pub number: ProjectNumber,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<AccountRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<Timestamp>,
}

impl Project {
    pub fn is_closed(&self) -> bool {
        self.closed_at.is_some()
    }
}

/// A project labelled with the scope it was listed under.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaggedProject {
    #[serde(flatten)]
    pub project: Project,
    pub owner_type: OwnerKind,
}

/// An account reference embedded in other objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRef {
    #[serde(default)]
    pub login: Option<String>,
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// A project field and, for single-select fields, its ordered option set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectField {
    pub id: FieldId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
}

impl ProjectField {
    /// The option with exactly this name, if any.
    pub fn option_named(&self, name: &str) -> Option<&FieldOption> {
        self.options.iter().find(|opt| opt.name == name)
    }
}

/// One option of a single-select field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub id: OptionId,
    #[serde(deserialize_with = "plain_or_rich_text")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Option names arrive either as a plain string or as `{"raw": .., "html": ..}`.
fn plain_or_rich_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Text {
        Plain(String),
        Rich { raw: String },
    }

    Ok(match Text::deserialize(deserializer)? {
        Text::Plain(s) => s,
        Text::Rich { raw } => raw,
    })
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// A project item: an issue, pull request, or draft placed on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectItem {
    pub id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ItemContent>,
    /// Field values keyed by field ID. Only requested fields are present.
    #[serde(default, deserialize_with = "field_values")]
    pub fields: BTreeMap<FieldId, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<Timestamp>,
}

impl ProjectItem {
    /// The GraphQL node ID of the underlying issue or pull request.
    pub fn content_node_id(&self) -> Option<&ContentNodeId> {
        self.content.as_ref().and_then(|c| c.node_id.as_ref())
    }

    /// Whether this item holds the issue `owner/repo#number`.
    ///
    /// The number must match. Repository owner and name are compared only when
    /// the platform reported them; logins compare case-insensitively.
    pub fn holds_issue(&self, owner: &str, repo: &str, number: ContentNumber) -> bool {
        if matches!(self.content_type, Some(kind) if kind != ContentKind::Issue) {
            return false;
        }
        let Some(content) = &self.content else {
            return false;
        };
        if content.number != Some(number) {
            return false;
        }
        let (found_owner, found_repo) = content.repository_coordinates();
        let owner_ok = found_owner.map_or(true, |o| o.eq_ignore_ascii_case(owner));
        let repo_ok = found_repo.map_or(true, |r| r.eq_ignore_ascii_case(repo));
        owner_ok && repo_ok
    }
}

/// Field values arrive as `[{"id": 1, "value": ..}, ..]`; keep them keyed by ID.
fn field_values<'de, D>(deserializer: D) -> Result<BTreeMap<FieldId, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Entry {
        id: FieldId,
        #[serde(default)]
        value: Value,
    }

    let entries = Option::<Vec<Entry>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries.into_iter().map(|e| (e.id, e.value)).collect())
}

/// Summary of an item's underlying issue or pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<ContentNodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<ContentNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<RepositoryRef>,
}

impl ItemContent {
    /// Owner login and repository name, from the embedded repository object or,
    /// failing that, from the trailing `/repos/{owner}/{name}` of `repository_url`.
    pub fn repository_coordinates(&self) -> (Option<&str>, Option<&str>) {
        if let Some(repo) = &self.repository {
            let owner = repo.owner.as_ref().and_then(|o| o.login.as_deref());
            return (owner, repo.name.as_deref());
        }
        match self.repository_url.as_deref().and_then(|url| url.split_once("/repos/")) {
            Some((_, rest)) => match rest.split_once('/') {
                Some((owner, name)) => (Some(owner), Some(name.trim_end_matches('/'))),
                None => (None, None),
            },
            None => (None, None),
        }
    }
}

/// Repository reference embedded in issue and pull request payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub owner: Option<AccountRef>,
}

// ---------------------------------------------------------------------------
// Field updates
// ---------------------------------------------------------------------------

/// A single field value to write to an item. `None` clears the field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub field_id: FieldId,
    pub value: Option<Value>,
}

impl FieldUpdate {
    /// Sets `field_id` to `value`. JSON `null` is treated as a clear.
    ///
    /// Returns a validation error for arrays and objects; field values are scalars.
    pub fn set(field_id: FieldId, value: Value) -> Result<Self, ProjectsError> {
        match value {
            Value::Null => Ok(Self::clear(field_id)),
            Value::Array(_) | Value::Object(_) => Err(ProjectsError::validation(format!(
                "updated_field.value for field {field_id} must be a string, number, boolean, or null"
            ))),
            scalar => Ok(Self {
                field_id,
                value: Some(scalar),
            }),
        }
    }

    /// Clears `field_id`.
    pub fn clear(field_id: FieldId) -> Self {
        Self {
            field_id,
            value: None,
        }
    }

    pub fn is_clear(&self) -> bool {
        self.value.is_none()
    }

    /// The request body for the item update endpoint.
    pub fn to_request_body(&self) -> Value {
        serde_json::json!({
            "fields": [{
                "id": self.field_id,
                "value": self.value.clone().unwrap_or(Value::Null),
            }]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_options_accept_plain_and_rich_names() {
        let field: ProjectField = serde_json::from_value(json!({
            "id": 42,
            "name": "Priority",
            "data_type": "single_select",
            "options": [
                {"id": "opt1", "name": {"raw": "High", "html": "High"}},
                {"id": "opt2", "name": "Low"}
            ]
        }))
        .unwrap();

        assert_eq!(field.option_named("High").unwrap().id.as_str(), "opt1");
        assert_eq!(field.option_named("Low").unwrap().id.as_str(), "opt2");
        assert!(field.option_named("high").is_none());
    }

    #[test]
    fn item_field_values_are_keyed_by_field_id() {
        let item: ProjectItem = serde_json::from_value(json!({
            "id": 1001,
            "content_type": "Issue",
            "content": {"node_id": "I_kw1", "number": 5},
            "fields": [{"id": 42, "name": "Priority", "value": "High"}]
        }))
        .unwrap();

        assert_eq!(item.content_type, Some(ContentKind::Issue));
        assert_eq!(item.content_node_id().unwrap().as_str(), "I_kw1");
        assert_eq!(item.fields.get(&FieldId::new(42)), Some(&json!("High")));
        assert_eq!(serde_json::to_value(&item).unwrap()["fields"], json!({"42": "High"}));
    }

    #[test]
    fn holds_issue_matches_repository_from_url() {
        let item: ProjectItem = serde_json::from_value(json!({
            "id": 1,
            "content_type": "Issue",
            "content": {
                "number": 12,
                "repository_url": "https://api.github.com/repos/Octo-Org/widgets"
            }
        }))
        .unwrap();

        assert!(item.holds_issue("octo-org", "widgets", ContentNumber::new(12)));
        assert!(!item.holds_issue("octo-org", "gadgets", ContentNumber::new(12)));
        assert!(!item.holds_issue("octo-org", "widgets", ContentNumber::new(13)));
    }

    #[test]
    fn unknown_content_types_do_not_fail_the_page() {
        let page: Vec<ProjectItem> = serde_json::from_value(json!([
            {"id": 1, "content_type": "Discussion", "content": {"number": 12}},
            {"id": 2, "content_type": "Issue", "content": {"number": 12}}
        ]))
        .unwrap();

        assert_eq!(page[0].content_type, Some(ContentKind::Other));
        assert!(!page[0].holds_issue("octo-org", "widgets", ContentNumber::new(12)));
        assert!(page[1].holds_issue("octo-org", "widgets", ContentNumber::new(12)));
    }

    #[test]
    fn holds_issue_rejects_pull_requests_with_the_same_number() {
        let item: ProjectItem = serde_json::from_value(json!({
            "id": 1,
            "content_type": "PullRequest",
            "content": {"number": 12}
        }))
        .unwrap();

        assert!(!item.holds_issue("octo-org", "widgets", ContentNumber::new(12)));
    }

    #[test]
    fn null_update_produces_a_clear_payload() {
        let update = FieldUpdate::set(FieldId::new(42), Value::Null).unwrap();

        assert!(update.is_clear());
        assert_eq!(
            update.to_request_body(),
            json!({"fields": [{"id": 42, "value": null}]})
        );
    }

    #[test]
    fn non_scalar_updates_are_rejected() {
        let err = FieldUpdate::set(FieldId::new(42), json!({"a": 1})).unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn owner_kind_parses_only_user_and_org() {
        assert_eq!("org".parse::<OwnerKind>().unwrap(), OwnerKind::Org);
        assert!("organization".parse::<OwnerKind>().is_err());
    }
}
