//! Read access to projects, fields, and items.
//!
//! Every read dispatches to the user- or org-shaped endpoint named by the
//! resolved scope. The one exception is [`ProjectCatalogReader::list_projects`]
//! without a kind, which lists both scopes independently and merges the
//! results post-hoc, tagging each project with the scope it came from.

use projects::{
    FieldId, ItemId, ItemQuery, OwnerKind, OwnerLogin, Page, PageInfo, PageRequest, Project,
    ProjectField, ProjectItem, ProjectsError, ProjectsRestApi, ResolutionError, ResolvedScope,
    Settings, TaggedProject, UpstreamError,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::context;

/// Attached to merged listings: the two scopes paginate independently.
pub const MERGED_LISTING_NOTE: &str = "Results include both user and org projects. \
Each project includes 'owner_type' field. Pagination is limited when owner_type is not \
specified - specify 'owner_type' for full pagination support.";

/// The result of listing projects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProjectListing {
    /// Projects of one known scope.
    Scoped {
        projects: Vec<TaggedProject>,
        #[serde(rename = "pageInfo")]
        page_info: PageInfo,
    },
    /// Projects of whichever scopes answered, each with its own page info.
    ///
    /// The two cursor spaces cannot be combined, so no single cursor is offered.
    Merged {
        projects: Vec<TaggedProject>,
        #[serde(rename = "userPageInfo", skip_serializing_if = "Option::is_none")]
        user_page_info: Option<PageInfo>,
        #[serde(rename = "orgPageInfo", skip_serializing_if = "Option::is_none")]
        org_page_info: Option<PageInfo>,
        note: &'static str,
    },
}

impl ProjectListing {
    pub fn projects(&self) -> &[TaggedProject] {
        match self {
            Self::Scoped { projects, .. } | Self::Merged { projects, .. } => projects,
        }
    }
}

/// Reads projects, fields, and items for a resolved (or, for project
/// listings, unspecified) scope.
pub struct ProjectCatalogReader<'a> {
    rest: &'a dyn ProjectsRestApi,
    settings: &'a Settings,
}

impl<'a> ProjectCatalogReader<'a> {
    pub fn new(rest: &'a dyn ProjectsRestApi, settings: &'a Settings) -> Self {
        Self { rest, settings }
    }

    fn clamp(&self, page: &PageRequest) -> PageRequest {
        page.clamped(self.settings.max_page_size)
    }

    pub async fn get_project(&self, scope: &ResolvedScope) -> Result<Project, ProjectsError> {
        let resp = self
            .rest
            .get_project(scope)
            .await
            .map_err(|e| UpstreamError::transport(context::GET_PROJECT, e))?;
        let (project, _) = resp.into_ok(context::GET_PROJECT)?;
        Ok(project)
    }

    pub async fn get_project_field(
        &self,
        scope: &ResolvedScope,
        field: FieldId,
    ) -> Result<ProjectField, ProjectsError> {
        let resp = self
            .rest
            .get_project_field(scope, field)
            .await
            .map_err(|e| UpstreamError::transport(context::GET_FIELD, e))?;
        let (field, _) = resp.into_ok(context::GET_FIELD)?;
        Ok(field)
    }

    /// Gets one item, including the values of `fields` (title only when empty).
    pub async fn get_project_item(
        &self,
        scope: &ResolvedScope,
        item: ItemId,
        fields: &[FieldId],
    ) -> Result<ProjectItem, ProjectsError> {
        let resp = self
            .rest
            .get_project_item(scope, item, fields)
            .await
            .map_err(|e| UpstreamError::transport(context::GET_ITEM, e))?;
        let (item, _) = resp.into_ok(context::GET_ITEM)?;
        Ok(item)
    }

    pub async fn list_project_fields(
        &self,
        scope: &ResolvedScope,
        page: &PageRequest,
    ) -> Result<Page<ProjectField>, ProjectsError> {
        let resp = self
            .rest
            .list_project_fields(scope, &self.clamp(page))
            .await
            .map_err(|e| UpstreamError::transport(context::LIST_FIELDS, e))?;
        let (fields, cursors) = resp.into_ok(context::LIST_FIELDS)?;
        Ok(Page::new(fields, &cursors))
    }

    pub async fn list_project_items(
        &self,
        scope: &ResolvedScope,
        query: &ItemQuery,
        page: &PageRequest,
    ) -> Result<Page<ProjectItem>, ProjectsError> {
        let resp = self
            .rest
            .list_project_items(scope, query, &self.clamp(page))
            .await
            .map_err(|e| UpstreamError::transport(context::LIST_ITEMS, e))?;
        let (items, cursors) = resp.into_ok(context::LIST_ITEMS)?;
        Ok(Page::new(items, &cursors))
    }

    /// Lists an owner's projects.
    ///
    /// With a kind, one scope is listed and any failure is returned. Without
    /// one, both scopes are listed in user-then-org order; a failing side is
    /// dropped, and only when both fail is an error returned.
    pub async fn list_projects(
        &self,
        owner: &OwnerLogin,
        kind: Option<OwnerKind>,
        query: Option<&str>,
        page: &PageRequest,
    ) -> Result<ProjectListing, ProjectsError> {
        let page = self.clamp(page);
        let query = query.filter(|q| !q.is_empty());

        if let Some(kind) = kind {
            let resp = self
                .rest
                .list_projects(owner, kind, query, &page)
                .await
                .map_err(|e| UpstreamError::transport(context::LIST_PROJECTS, e))?;
            let (projects, cursors) = resp.into_ok(context::LIST_PROJECTS)?;
            return Ok(ProjectListing::Scoped {
                projects: tag(projects, kind),
                page_info: PageInfo::from_cursors(&cursors),
            });
        }

        let mut projects = Vec::new();
        let mut user_page_info = None;
        let mut org_page_info = None;
        for kind in [OwnerKind::User, OwnerKind::Org] {
            let outcome = match self.rest.list_projects(owner, kind, query, &page).await {
                Ok(resp) => resp.into_ok(context::LIST_PROJECTS),
                Err(e) => Err(UpstreamError::transport(context::LIST_PROJECTS, e)),
            };
            match outcome {
                Ok((found, cursors)) => {
                    debug!(%owner, %kind, count = found.len(), "listed projects");
                    projects.extend(tag(found, kind));
                    let info = Some(PageInfo::from_cursors(&cursors));
                    match kind {
                        OwnerKind::User => user_page_info = info,
                        OwnerKind::Org => org_page_info = info,
                    }
                }
                Err(error) => warn!(%owner, %kind, %error, "project listing failed for scope"),
            }
        }

        if user_page_info.is_none() && org_page_info.is_none() {
            return Err(ResolutionError::OwnerNotFound {
                owner: owner.clone(),
            }
            .into());
        }

        Ok(ProjectListing::Merged {
            projects,
            user_page_info,
            org_page_info,
            note: MERGED_LISTING_NOTE,
        })
    }
}

fn tag(projects: Vec<Project>, kind: OwnerKind) -> Vec<TaggedProject> {
    projects
        .into_iter()
        .map(|project| TaggedProject {
            project,
            owner_type: kind,
        })
        .collect()
}
