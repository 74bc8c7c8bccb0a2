//! The exposed operations.
//!
//! [`ProjectsService`] is the entry point an outer surface (CLI, tool server)
//! calls. Each operation takes a plain request struct as decoded from the
//! caller, validates it before any network call, resolves the owner kind when
//! the caller left it out, and then delegates to the components. Results are
//! rendered through [`OperationOutcome`], which keeps success and failure
//! payloads structurally distinct.

use std::sync::Arc;

use projects::{
    ContentNumber, ErrorPayload, FieldId, FieldUpdate, GraphQlApi, InvocationId, ItemId, ItemKind,
    ItemQuery, OwnerKind, OwnerLogin, Page, PageInfo, PageRequest, Project, ProjectField,
    ProjectItem, ProjectNumber, ProjectScope, ProjectsError, ProjectsRestApi, RepositoryName,
    ResolvedScope, Settings,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::catalog::{ProjectCatalogReader, ProjectListing};
use crate::coordinator::{AddedItem, AssignOutcome, Confirmation, ItemMutationCoordinator};
use crate::scope::OwnerScopeResolver;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Identifies a project. `owner_type` is optional wherever it can be probed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProjectLocator {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub owner_type: Option<String>,
    #[serde(default)]
    pub project_number: i64,
}

impl ProjectLocator {
    fn validate(&self) -> Result<ProjectScope, ProjectsError> {
        Ok(ProjectScope::new(
            required_login("owner", &self.owner)?,
            owner_kind(self.owner_type.as_deref())?,
            ProjectNumber::new(positive("project_number", self.project_number)?),
        ))
    }
}

/// Page size and cursors supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PageArgs {
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub before: Option<String>,
}

impl PageArgs {
    fn to_request(&self, settings: &Settings) -> PageRequest {
        PageRequest::from_parts(
            self.per_page.unwrap_or(settings.max_page_size),
            self.after.clone(),
            self.before.clone(),
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListProjectsRequest {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub owner_type: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListFieldsRequest {
    #[serde(flatten)]
    pub project: ProjectLocator,
    #[serde(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListItemsRequest {
    #[serde(flatten)]
    pub project: ProjectLocator,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub fields: Vec<i64>,
    #[serde(flatten)]
    pub page: PageArgs,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetProjectRequest {
    #[serde(flatten)]
    pub project: ProjectLocator,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetFieldRequest {
    #[serde(flatten)]
    pub project: ProjectLocator,
    #[serde(default)]
    pub field_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetItemRequest {
    #[serde(flatten)]
    pub project: ProjectLocator,
    #[serde(default)]
    pub item_id: i64,
    #[serde(default)]
    pub fields: Vec<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddItemRequest {
    #[serde(flatten)]
    pub project: ProjectLocator,
    #[serde(default)]
    pub item_owner: String,
    #[serde(default)]
    pub item_repo: String,
    #[serde(default)]
    pub item_number: i64,
    #[serde(default)]
    pub item_type: String,
}

/// `{ "id": <field id>, "value": <scalar or null> }`.
///
/// An explicit `null` value clears the field; a missing value is an error.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UpdatedField {
    #[serde(default)]
    pub id: i64,
    #[serde(default, deserialize_with = "present")]
    pub value: Option<Value>,
}

/// Distinguishes `"value": null` (`Some(Null)`) from an absent key (`None`).
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateItemRequest {
    #[serde(flatten)]
    pub project: ProjectLocator,
    #[serde(default)]
    pub item_id: i64,
    #[serde(default)]
    pub updated_field: Option<UpdatedField>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteItemRequest {
    #[serde(flatten)]
    pub project: ProjectLocator,
    #[serde(default)]
    pub item_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignIssueRequest {
    #[serde(default)]
    pub org: String,
    #[serde(default)]
    pub project_number: i64,
    #[serde(default)]
    pub item_owner: String,
    #[serde(default)]
    pub item_repo: String,
    #[serde(default)]
    pub issue_number: i64,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetFieldByNameRequest {
    #[serde(flatten)]
    pub project: ProjectLocator,
    #[serde(default)]
    pub item_id: i64,
    #[serde(default)]
    pub field_name: String,
    #[serde(default)]
    pub option_name: String,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldList {
    pub fields: Vec<ProjectField>,
    #[serde(rename = "pageInfo")]
    pub page_info: PageInfo,
}

impl From<Page<ProjectField>> for FieldList {
    fn from(page: Page<ProjectField>) -> Self {
        Self {
            fields: page.items,
            page_info: page.page_info,
        }
    }
}

/// The rendered result of one exposed operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "payload", rename_all = "snake_case")]
pub enum OperationOutcome {
    Success(Value),
    Failure(ErrorPayload),
}

impl OperationOutcome {
    /// Renders an operation result. A success value that cannot be
    /// serialised becomes a marshal failure.
    pub fn from_result<T: Serialize>(result: Result<T, ProjectsError>) -> Self {
        match result.and_then(|value| serde_json::to_value(value).map_err(ProjectsError::from)) {
            Ok(value) => Self::Success(value),
            Err(error) => Self::Failure(error.to_payload()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// The exposed operations over shared backends.
///
/// Holds no mutable state; each call is independent and may run concurrently
/// with others.
#[derive(Clone)]
pub struct ProjectsService {
    rest: Arc<dyn ProjectsRestApi>,
    graph: Arc<dyn GraphQlApi>,
    settings: Settings,
}

impl ProjectsService {
    pub fn new(
        rest: Arc<dyn ProjectsRestApi>,
        graph: Arc<dyn GraphQlApi>,
        settings: Settings,
    ) -> Self {
        Self {
            rest,
            graph,
            settings,
        }
    }

    fn catalog(&self) -> ProjectCatalogReader<'_> {
        ProjectCatalogReader::new(self.rest.as_ref(), &self.settings)
    }

    fn coordinator(&self) -> ItemMutationCoordinator<'_> {
        ItemMutationCoordinator::new(self.rest.as_ref(), self.graph.as_ref(), &self.settings)
    }

    async fn resolve(&self, scope: &ProjectScope) -> Result<ResolvedScope, ProjectsError> {
        OwnerScopeResolver::new(self.rest.as_ref())
            .ensure_resolved(scope)
            .await
    }

    #[instrument(skip_all, fields(invocation_id = %InvocationId::new_random(), owner = %req.owner))]
    pub async fn list_projects(
        &self,
        req: &ListProjectsRequest,
    ) -> Result<ProjectListing, ProjectsError> {
        let owner = required_login("owner", &req.owner)?;
        let kind = owner_kind(req.owner_type.as_deref())?;
        let page = req.page.to_request(&self.settings);
        self.catalog()
            .list_projects(&owner, kind, req.query.as_deref(), &page)
            .await
    }

    #[instrument(skip_all, fields(invocation_id = %InvocationId::new_random(), owner = %req.project.owner, project = req.project.project_number))]
    pub async fn list_project_fields(
        &self,
        req: &ListFieldsRequest,
    ) -> Result<FieldList, ProjectsError> {
        let scope = req.project.validate()?;
        let page = req.page.to_request(&self.settings);
        let scope = self.resolve(&scope).await?;
        let fields = self.catalog().list_project_fields(&scope, &page).await?;
        Ok(fields.into())
    }

    #[instrument(skip_all, fields(invocation_id = %InvocationId::new_random(), owner = %req.project.owner, project = req.project.project_number))]
    pub async fn list_project_items(
        &self,
        req: &ListItemsRequest,
    ) -> Result<Page<ProjectItem>, ProjectsError> {
        let scope = req.project.validate()?;
        let query = ItemQuery {
            query: req.query.clone().filter(|q| !q.is_empty()),
            fields: field_ids(&req.fields)?,
        };
        let page = req.page.to_request(&self.settings);
        let scope = self.resolve(&scope).await?;
        self.catalog().list_project_items(&scope, &query, &page).await
    }

    #[instrument(skip_all, fields(invocation_id = %InvocationId::new_random(), owner = %req.project.owner, project = req.project.project_number))]
    pub async fn get_project(&self, req: &GetProjectRequest) -> Result<Project, ProjectsError> {
        let scope = req.project.validate()?;
        let scope = self.resolve(&scope).await?;
        self.catalog().get_project(&scope).await
    }

    #[instrument(skip_all, fields(invocation_id = %InvocationId::new_random(), owner = %req.project.owner, project = req.project.project_number))]
    pub async fn get_project_field(
        &self,
        req: &GetFieldRequest,
    ) -> Result<ProjectField, ProjectsError> {
        let scope = req.project.validate()?;
        let field = FieldId::new(positive("field_id", req.field_id)? as i64);
        let scope = self.resolve(&scope).await?;
        self.catalog().get_project_field(&scope, field).await
    }

    #[instrument(skip_all, fields(invocation_id = %InvocationId::new_random(), owner = %req.project.owner, project = req.project.project_number))]
    pub async fn get_project_item(
        &self,
        req: &GetItemRequest,
    ) -> Result<ProjectItem, ProjectsError> {
        let scope = req.project.validate()?;
        let item = ItemId::new(positive("item_id", req.item_id)? as i64);
        let fields = field_ids(&req.fields)?;
        let scope = self.resolve(&scope).await?;
        self.catalog().get_project_item(&scope, item, &fields).await
    }

    #[instrument(skip_all, fields(invocation_id = %InvocationId::new_random(), owner = %req.project.owner, project = req.project.project_number))]
    pub async fn add_project_item(&self, req: &AddItemRequest) -> Result<AddedItem, ProjectsError> {
        let scope = req.project.validate()?;
        let item_owner = required_login("item_owner", &req.item_owner)?;
        let item_repo = required_repo("item_repo", &req.item_repo)?;
        let number = ContentNumber::new(positive("item_number", req.item_number)?);
        let kind: ItemKind = req.item_type.parse()?;
        let scope = self.resolve(&scope).await?;
        self.coordinator()
            .add_item(&scope, &item_owner, &item_repo, number, kind)
            .await
    }

    #[instrument(skip_all, fields(invocation_id = %InvocationId::new_random(), owner = %req.project.owner, project = req.project.project_number))]
    pub async fn update_project_item(
        &self,
        req: &UpdateItemRequest,
    ) -> Result<ProjectItem, ProjectsError> {
        let scope = req.project.validate()?;
        let item = ItemId::new(positive("item_id", req.item_id)? as i64);
        let update = field_update(req.updated_field.as_ref())?;
        let scope = self.resolve(&scope).await?;
        self.coordinator().update_item(&scope, item, &update).await
    }

    #[instrument(skip_all, fields(invocation_id = %InvocationId::new_random(), owner = %req.project.owner, project = req.project.project_number))]
    pub async fn delete_project_item(
        &self,
        req: &DeleteItemRequest,
    ) -> Result<Confirmation, ProjectsError> {
        let scope = req.project.validate()?;
        let item = ItemId::new(positive("item_id", req.item_id)? as i64);
        let scope = self.resolve(&scope).await?;
        self.coordinator().delete_item(&scope, item).await
    }

    #[instrument(skip_all, fields(invocation_id = %InvocationId::new_random(), owner = %req.org, project = req.project_number))]
    pub async fn assign_issue_to_org_project(
        &self,
        req: &AssignIssueRequest,
    ) -> Result<AssignOutcome, ProjectsError> {
        let org = required_login("org", &req.org)?;
        let project = ProjectNumber::new(positive("project_number", req.project_number)?);
        let item_owner = required_login("item_owner", &req.item_owner)?;
        let item_repo = required_repo("item_repo", &req.item_repo)?;
        let issue = ContentNumber::new(positive("issue_number", req.issue_number)?);
        self.coordinator()
            .assign_and_tag(
                &org,
                project,
                &item_owner,
                &item_repo,
                issue,
                req.priority.as_deref(),
                req.size.as_deref(),
            )
            .await
    }

    #[instrument(skip_all, fields(invocation_id = %InvocationId::new_random(), owner = %req.project.owner, project = req.project.project_number))]
    pub async fn update_project_item_field_by_name(
        &self,
        req: &SetFieldByNameRequest,
    ) -> Result<Confirmation, ProjectsError> {
        let scope = req.project.validate()?;
        let item = ItemId::new(positive("item_id", req.item_id)? as i64);
        let field_name = required_text("field_name", &req.field_name)?;
        let option_name = required_text("option_name", &req.option_name)?;
        let scope = self.resolve(&scope).await?;
        self.coordinator()
            .set_field_by_name(&scope, item, field_name, option_name)
            .await
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn missing(name: &str) -> ProjectsError {
    ProjectsError::validation(format!("missing required parameter: {name}"))
}

fn required_text<'r>(name: &str, value: &'r str) -> Result<&'r str, ProjectsError> {
    let value = value.trim();
    if value.is_empty() {
        Err(missing(name))
    } else {
        Ok(value)
    }
}

fn required_login(name: &str, value: &str) -> Result<OwnerLogin, ProjectsError> {
    OwnerLogin::new(required_text(name, value)?).ok_or_else(|| missing(name))
}

fn required_repo(name: &str, value: &str) -> Result<RepositoryName, ProjectsError> {
    RepositoryName::new(required_text(name, value)?).ok_or_else(|| missing(name))
}

fn positive(name: &str, value: i64) -> Result<u64, ProjectsError> {
    match u64::try_from(value) {
        Ok(0) => Err(missing(name)),
        Ok(n) => Ok(n),
        Err(_) => Err(ProjectsError::validation(format!(
            "{name} must be a positive number (got {value})"
        ))),
    }
}

/// An empty `owner_type` is the same as none.
fn owner_kind(value: Option<&str>) -> Result<Option<OwnerKind>, ProjectsError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(kind) => kind.parse().map(Some),
    }
}

fn field_ids(raw: &[i64]) -> Result<Vec<FieldId>, ProjectsError> {
    raw.iter()
        .map(|id| positive("fields", *id).map(|id| FieldId::new(id as i64)))
        .collect()
}

fn field_update(field: Option<&UpdatedField>) -> Result<FieldUpdate, ProjectsError> {
    let field = field.ok_or_else(|| missing("updated_field"))?;
    let id = FieldId::new(positive("updated_field.id", field.id)? as i64);
    let value = field
        .value
        .clone()
        .ok_or_else(|| ProjectsError::validation("updated_field.value is required"))?;
    FieldUpdate::set(id, value)
}
