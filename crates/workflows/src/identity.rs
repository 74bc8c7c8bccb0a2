//! Bridges numbered addressing to GraphQL node IDs.
//!
//! Item creation is the only operation that takes a content node ID; everything
//! else addresses issues and pull requests by repository and number. This module
//! holds the two lookups that cross that boundary: content node IDs and the
//! project's own node ID.

use projects::{
    ContentNodeId, ContentNumber, GraphQlApi, GraphQlRequest, GraphQlResponse, ItemKind,
    OwnerKind, OwnerLogin, ProjectNodeId, ProjectsError, RepositoryName, ResolutionError,
    ResolvedScope, UpstreamError,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::context;

const ISSUE_NODE_QUERY: &str = "query($owner: String!, $repo: String!, $number: Int!) { \
repository(owner: $owner, name: $repo) { issue(number: $number) { id } } }";

const PULL_REQUEST_NODE_QUERY: &str = "query($owner: String!, $repo: String!, $number: Int!) { \
repository(owner: $owner, name: $repo) { pullRequest(number: $number) { id } } }";

const USER_PROJECT_NODE_QUERY: &str = "query($owner: String!, $number: Int!) { \
user(login: $owner) { projectV2(number: $number) { id } } }";

const ORG_PROJECT_NODE_QUERY: &str = "query($owner: String!, $number: Int!) { \
organization(login: $owner) { projectV2(number: $number) { id } } }";

/// `{ "id": ... }` as returned for any node selection.
#[derive(Debug, Deserialize)]
pub(crate) struct NodeRef<T> {
    pub id: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryData {
    repository: Option<RepositoryNodes>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryNodes {
    #[serde(default)]
    issue: Option<NodeRef<ContentNodeId>>,
    #[serde(default)]
    pull_request: Option<NodeRef<ContentNodeId>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnerData {
    #[serde(default, alias = "organization")]
    user: Option<OwnerNodes>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnerNodes {
    project_v2: Option<NodeRef<ProjectNodeId>>,
}

/// Looks up GraphQL node IDs for numbered content and for projects.
pub struct NodeIdentityResolver<'a> {
    graph: &'a dyn GraphQlApi,
}

impl<'a> NodeIdentityResolver<'a> {
    pub fn new(graph: &'a dyn GraphQlApi) -> Self {
        Self { graph }
    }

    /// Resolves `owner/repo#number` to the node ID of the issue or pull request.
    pub async fn resolve_content_id(
        &self,
        owner: &OwnerLogin,
        repo: &RepositoryName,
        number: ContentNumber,
        kind: ItemKind,
    ) -> Result<ContentNodeId, ProjectsError> {
        let query = match kind {
            ItemKind::Issue => ISSUE_NODE_QUERY,
            ItemKind::PullRequest => PULL_REQUEST_NODE_QUERY,
        };
        let variables = json!({
            "owner": owner.as_str(),
            "repo": repo.as_str(),
            "number": graphql_int(number.get(), "item number")?,
        });

        let response = self.query(query, variables).await?;
        let node = decode::<RepositoryData>(&response)?
            .and_then(|data| data.repository)
            .and_then(|repository| match kind {
                ItemKind::Issue => repository.issue,
                ItemKind::PullRequest => repository.pull_request,
            });

        match node {
            Some(NodeRef { id }) => {
                debug!(%owner, %repo, %number, %kind, node_id = %id, "content node resolved");
                Ok(id)
            }
            None => Err(ResolutionError::Content {
                kind,
                owner: owner.clone(),
                repo: repo.clone(),
                number,
                reason: not_found_reason(&response),
            }
            .into()),
        }
    }

    /// Resolves the project's own node ID under its (already settled) owner kind.
    pub async fn resolve_project_id(
        &self,
        scope: &ResolvedScope,
    ) -> Result<ProjectNodeId, ProjectsError> {
        let query = match scope.kind {
            OwnerKind::User => USER_PROJECT_NODE_QUERY,
            OwnerKind::Org => ORG_PROJECT_NODE_QUERY,
        };
        let variables = json!({
            "owner": scope.owner.as_str(),
            "number": graphql_int(scope.number.get(), "project number")?,
        });

        let response = self.query(query, variables).await?;
        let node = decode::<OwnerData>(&response)?
            .and_then(|data| data.user)
            .and_then(|owner| owner.project_v2);

        match node {
            Some(NodeRef { id }) => {
                debug!(%scope, kind = %scope.kind, node_id = %id, "project node resolved");
                Ok(id)
            }
            None => Err(ResolutionError::ProjectNode {
                kind: scope.kind,
                owner: scope.owner.clone(),
                number: scope.number,
                reason: not_found_reason(&response),
            }
            .into()),
        }
    }

    async fn query(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<GraphQlResponse, ProjectsError> {
        let request = GraphQlRequest::new(query, variables);
        let response = self
            .graph
            .execute(&request)
            .await
            .map_err(|e| UpstreamError::transport(context::RESOLVE_NODE, e))?;
        Ok(response)
    }
}

/// GraphQL `Int` is 32-bit signed.
fn graphql_int(value: u64, what: &str) -> Result<i32, ProjectsError> {
    i32::try_from(value)
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ProjectsError::validation(format!("{what} {value} is out of range")))
}

fn decode<T: DeserializeOwned>(response: &GraphQlResponse) -> Result<Option<T>, ProjectsError> {
    response
        .data_as::<T>()
        .map_err(|e| UpstreamError::transport(context::RESOLVE_NODE, e).into())
}

fn not_found_reason(response: &GraphQlResponse) -> String {
    response
        .error_summary()
        .unwrap_or_else(|| "not found".to_string())
}
