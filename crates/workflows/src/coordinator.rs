//! Item mutations and the composite workflows built from them.
//!
//! The primitives (`add_item`, `update_item`, `delete_item`) each make one
//! change. The composites run several steps in order and never roll back: if a
//! step fails after the project was already changed, the error is a
//! [`ProjectsError::PartialWorkflow`] that lists every [`AppliedEffect`] so far.

use projects::{
    AppliedEffect, ContentNumber, FieldUpdate, GraphQlApi, GraphQlRequest, ItemId, ItemKind,
    ItemNodeId, ItemQuery, OwnerKind, OwnerLogin, PageRequest, ProjectItem, ProjectNumber,
    ProjectsError, ProjectsRestApi, RepositoryName, ResolutionError, ResolvedScope, Settings,
    UpstreamError,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::catalog::ProjectCatalogReader;
use crate::context;
use crate::identity::{NodeIdentityResolver, NodeRef};
use crate::options::FieldOptionResolver;

const ADD_ITEM_MUTATION: &str = "mutation($projectId: ID!, $contentId: ID!) { \
addProjectV2ItemById(input: {projectId: $projectId, contentId: $contentId}) { item { id } } }";

/// Field names the assign-and-tag workflow writes, in application order.
const PRIORITY_FIELD: &str = "Priority";
const SIZE_FIELD: &str = "Size";

const LOCATE_STEP: &str = "locate project item";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddItemData {
    add_project_v2_item_by_id: Option<AddItemPayload>,
}

#[derive(Debug, Deserialize)]
struct AddItemPayload {
    item: Option<NodeRef<ItemNodeId>>,
}

/// A freshly created project item.
///
/// `id` is the item's node ID; the numeric ID used by get, update and delete
/// is not part of the creation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddedItem {
    pub id: ItemNodeId,
    pub message: String,
}

/// Result of [`ItemMutationCoordinator::assign_and_tag`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignOutcome {
    pub item_id: ItemId,
    pub message: String,
    pub updates: Vec<String>,
}

/// A human-readable confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Confirmation {
    pub message: String,
}

impl Confirmation {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub struct ItemMutationCoordinator<'a> {
    rest: &'a dyn ProjectsRestApi,
    graph: &'a dyn GraphQlApi,
    settings: &'a Settings,
}

impl<'a> ItemMutationCoordinator<'a> {
    pub fn new(
        rest: &'a dyn ProjectsRestApi,
        graph: &'a dyn GraphQlApi,
        settings: &'a Settings,
    ) -> Self {
        Self {
            rest,
            graph,
            settings,
        }
    }

    /// Adds the issue or pull request `item_owner/item_repo#number` to the project.
    pub async fn add_item(
        &self,
        scope: &ResolvedScope,
        item_owner: &OwnerLogin,
        item_repo: &RepositoryName,
        number: ContentNumber,
        kind: ItemKind,
    ) -> Result<AddedItem, ProjectsError> {
        let identity = NodeIdentityResolver::new(self.graph);
        let content_id = identity
            .resolve_content_id(item_owner, item_repo, number, kind)
            .await?;
        let project_id = identity.resolve_project_id(scope).await?;

        let request = GraphQlRequest::new(
            ADD_ITEM_MUTATION,
            json!({"projectId": project_id, "contentId": content_id}),
        );
        let response = self
            .graph
            .execute(&request)
            .await
            .map_err(|e| UpstreamError::transport(context::ADD_ITEM, e))?;
        let item = response
            .data_as::<AddItemData>()
            .map_err(|e| UpstreamError::transport(context::ADD_ITEM, e))?
            .and_then(|data| data.add_project_v2_item_by_id)
            .and_then(|payload| payload.item);

        let Some(NodeRef { id }) = item else {
            let message = response
                .error_summary()
                .unwrap_or_else(|| "response did not include the created item".to_string());
            return Err(UpstreamError::malformed(context::ADD_ITEM, message).into());
        };

        info!(%scope, %item_owner, %item_repo, %number, %kind, item_node_id = %id, "project item added");
        Ok(AddedItem {
            id,
            message: format!(
                "Successfully added {kind} {item_owner}/{item_repo}#{number} to project {scope}"
            ),
        })
    }

    /// Writes one field value, or clears the field when the update carries none.
    pub async fn update_item(
        &self,
        scope: &ResolvedScope,
        item: ItemId,
        update: &FieldUpdate,
    ) -> Result<ProjectItem, ProjectsError> {
        let resp = self
            .rest
            .update_project_item(scope, item, update)
            .await
            .map_err(|e| UpstreamError::transport(context::UPDATE_ITEM, e))?;
        if !resp.is_ok() {
            warn!(%scope, %item, status = resp.status, "project item update rejected");
        }
        let (updated, _) = resp.into_ok(context::UPDATE_ITEM)?;
        info!(%scope, %item, field = %update.field_id, cleared = update.is_clear(), "project item updated");
        Ok(updated)
    }

    /// Deletes an item. Only `204 No Content` counts as success.
    pub async fn delete_item(
        &self,
        scope: &ResolvedScope,
        item: ItemId,
    ) -> Result<Confirmation, ProjectsError> {
        let resp = self
            .rest
            .delete_project_item(scope, item)
            .await
            .map_err(|e| UpstreamError::transport(context::DELETE_ITEM, e))?;
        if resp.status != 204 {
            warn!(%scope, %item, status = resp.status, "project item delete rejected");
            return Err(UpstreamError::status(
                context::DELETE_ITEM,
                resp.status,
                resp.raw_body().map(str::to_string),
            )
            .into());
        }
        info!(%scope, %item, "project item deleted");
        Ok(Confirmation::new("project item successfully deleted"))
    }

    /// Sets a single-select field by field and option name.
    ///
    /// The field type is not checked; the platform rejects mismatches.
    pub async fn set_field_by_name(
        &self,
        scope: &ResolvedScope,
        item: ItemId,
        field_name: &str,
        option_name: &str,
    ) -> Result<Confirmation, ProjectsError> {
        self.apply_option(scope, item, field_name, option_name)
            .await
            .map_err(|(_, e)| e)?;
        Ok(Confirmation::new(format!("Set {field_name} to {option_name}")))
    }

    /// Adds an issue to an organization project, then sets Priority and Size.
    ///
    /// A failed add fails the whole workflow. Anything that fails afterwards is
    /// reported as partial, listing the add and every field already set.
    #[allow(clippy::too_many_arguments)]
    pub async fn assign_and_tag(
        &self,
        org: &OwnerLogin,
        project: ProjectNumber,
        item_owner: &OwnerLogin,
        item_repo: &RepositoryName,
        issue: ContentNumber,
        priority: Option<&str>,
        size: Option<&str>,
    ) -> Result<AssignOutcome, ProjectsError> {
        let scope = ResolvedScope {
            owner: org.clone(),
            kind: OwnerKind::Org,
            number: project,
        };

        let added = self
            .add_item(&scope, item_owner, item_repo, issue, ItemKind::Issue)
            .await?;
        let mut applied = vec![AppliedEffect::ItemAdded {
            item_node_id: added.id,
            content: format!("issue {item_owner}/{item_repo}#{issue}"),
        }];

        let item_id = self
            .find_item_id(&scope, item_owner, item_repo, issue)
            .await
            .map_err(|e| e.after_effects(LOCATE_STEP, applied.clone()))?;

        let mut updates = Vec::new();
        let requested = [(PRIORITY_FIELD, priority), (SIZE_FIELD, size)];
        for (field, option) in requested {
            let Some(option) = option.filter(|o| !o.is_empty()) else {
                continue;
            };
            self.apply_option(&scope, item_id, field, option)
                .await
                .map_err(|(step, e)| e.after_effects(step, applied.clone()))?;
            applied.push(AppliedEffect::FieldSet {
                item_id,
                field: field.to_string(),
                option: option.to_string(),
            });
            updates.push(format!("{field}={option}"));
        }

        Ok(AssignOutcome {
            item_id,
            message: format!(
                "Added issue {item_owner}/{item_repo}#{issue} to project {org}/{project}"
            ),
            updates,
        })
    }

    /// Resolves the option, then writes it. A failure is paired with the
    /// name of the step that failed.
    async fn apply_option(
        &self,
        scope: &ResolvedScope,
        item: ItemId,
        field_name: &str,
        option_name: &str,
    ) -> Result<(), (String, ProjectsError)> {
        let resolved = FieldOptionResolver::new(self.rest, self.settings)
            .resolve(scope, field_name, option_name)
            .await
            .map_err(|e| (format!("resolve {field_name} option"), e))?;
        let update = FieldUpdate {
            field_id: resolved.field_id,
            value: Some(Value::String(resolved.option_id.as_str().to_string())),
        };
        self.update_item(scope, item, &update)
            .await
            .map_err(|e| (format!("set {field_name}"), e))?;
        Ok(())
    }

    /// Finds the numeric ID of the item holding `owner/repo#number` by
    /// re-listing the project's items within the configured scan bound.
    async fn find_item_id(
        &self,
        scope: &ResolvedScope,
        owner: &OwnerLogin,
        repo: &RepositoryName,
        number: ContentNumber,
    ) -> Result<ItemId, ProjectsError> {
        let bound = self.settings.item_scan;
        let catalog = ProjectCatalogReader::new(self.rest, self.settings);
        let query = ItemQuery::default();
        let mut page = PageRequest::first(bound.page_size);
        let mut scanned = 0;

        for page_index in 0..bound.max_pages {
            let listed = catalog.list_project_items(scope, &query, &page).await?;
            scanned += listed.items.len();
            if let Some(item) = listed
                .items
                .iter()
                .find(|item| item.holds_issue(owner.as_str(), repo.as_str(), number))
            {
                debug!(%scope, item_id = %item.id, page = page_index + 1, "project item located");
                return Ok(item.id);
            }
            match listed.page_info.next_cursor {
                Some(cursor) => page = page.after(cursor),
                None => break,
            }
        }

        Err(ResolutionError::ItemNotFound {
            owner: owner.clone(),
            repo: repo.clone(),
            number,
            scanned,
        }
        .into())
    }
}
