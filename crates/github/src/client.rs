//! The HTTPS client implementing both backend ports.

use async_trait::async_trait;
use projects::{
    ApiResponse, FieldId, FieldUpdate, GraphQlApi, GraphQlRequest, GraphQlResponse, ItemId,
    ItemQuery, OwnerKind, OwnerLogin, PageRequest, Project, ProjectField, ProjectItem,
    ProjectsRestApi, RawCursors, ResolvedScope, TransportError,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, LINK, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::link::parse_link_header;

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "x-github-api-version";
const API_VERSION: &str = "2022-11-28";

/// Endpoints and identification for the two API planes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub rest_base_url: String,
    pub graphql_url: String,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            rest_base_url: "https://api.github.com".to_string(),
            graphql_url: "https://api.github.com/graphql".to_string(),
            user_agent: concat!("ghprojects/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Failures constructing a [`GithubClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("API token must not be empty")]
    MissingToken,

    #[error("invalid {which} URL {url:?}: {reason}")]
    InvalidUrl {
        which: &'static str,
        url: String,
        reason: String,
    },

    #[error("invalid user agent {0:?}")]
    InvalidUserAgent(String),

    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// A response whose body has been read in full.
struct RawResponse {
    status: u16,
    cursors: RawCursors,
    body: String,
}

/// Both Projects v2 API planes over one connection pool.
pub struct GithubClient {
    http: Client,
    rest_base: Url,
    graphql_url: Url,
    token: String,
}

impl GithubClient {
    pub fn new(config: &ApiConfig, token: impl Into<String>) -> Result<Self, ClientError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ClientError::MissingToken);
        }
        let rest_base = parse_base("REST base", &config.rest_base_url)?;
        let graphql_url = parse_base("GraphQL", &config.graphql_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|_| ClientError::InvalidUserAgent(config.user_agent.clone()))?,
        );
        let http = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            rest_base,
            graphql_url,
            token,
        })
    }

    fn rest_url(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.rest_base.clone();
        url.path_segments_mut()
            .map_err(|()| {
                TransportError::Request(format!("{} cannot be a base URL", self.rest_base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn project_url(&self, scope: &ResolvedScope, tail: &[&str]) -> Result<Url, TransportError> {
        let number = scope.number.to_string();
        let mut segments = owner_segments(scope.kind, &scope.owner).to_vec();
        segments.push(&number);
        segments.extend_from_slice(tail);
        self.rest_url(&segments)
    }

    /// Sends the request and reads the whole body, so the connection is
    /// released whatever the status.
    async fn send(&self, request: RequestBuilder) -> Result<RawResponse, TransportError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let cursors = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .map(parse_link_header)
            .unwrap_or_default();
        let url = response.url().path().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        debug!(%url, status, "github response");
        Ok(RawResponse {
            status,
            cursors,
            body,
        })
    }

    async fn rest<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
    ) -> Result<ApiResponse<T>, TransportError> {
        let raw = self.send(self.http.request(method, url)).await?;
        classify(raw)
    }
}

fn parse_base(which: &'static str, raw: &str) -> Result<Url, ClientError> {
    let url = Url::parse(raw).map_err(|e| ClientError::InvalidUrl {
        which,
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ClientError::InvalidUrl {
            which,
            url: raw.to_string(),
            reason: "not a hierarchical URL".to_string(),
        });
    }
    Ok(url)
}

fn owner_segments(kind: OwnerKind, owner: &OwnerLogin) -> [&str; 3] {
    let root = match kind {
        OwnerKind::User => "users",
        OwnerKind::Org => "orgs",
    };
    [root, owner.as_str(), "projectsV2"]
}

fn apply_page(url: &mut Url, page: &PageRequest) {
    let mut pairs = url.query_pairs_mut();
    pairs.append_pair("per_page", &page.per_page.to_string());
    if let Some(after) = &page.after {
        pairs.append_pair("after", after.as_str());
    }
    if let Some(before) = &page.before {
        pairs.append_pair("before", before.as_str());
    }
}

fn apply_query(url: &mut Url, query: Option<&str>) {
    if let Some(q) = query.filter(|q| !q.is_empty()) {
        url.query_pairs_mut().append_pair("q", q);
    }
}

fn apply_fields(url: &mut Url, fields: &[FieldId]) {
    if fields.is_empty() {
        return;
    }
    let joined = fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    url.query_pairs_mut().append_pair("fields", &joined);
}

/// `204` has no body, other `2xx` bodies are decoded, anything else is kept raw.
fn classify<T: DeserializeOwned>(raw: RawResponse) -> Result<ApiResponse<T>, TransportError> {
    let RawResponse {
        status,
        cursors,
        body,
    } = raw;
    let response = match status {
        204 => ApiResponse::empty(status),
        200..=299 => {
            let value = decode_body(status, &body)?;
            ApiResponse::decoded(status, value)
        }
        _ => ApiResponse::raw(status, body),
    };
    Ok(response.with_cursors(cursors))
}

fn decode_body<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, TransportError> {
    serde_json::from_str(body).map_err(|e| TransportError::UndecodableBody {
        status,
        body: body.to_string(),
        reason: e.to_string(),
    })
}

/// GraphQL has no status-carrying envelope, so a non-`2xx` answer is an error.
fn graphql_envelope(raw: RawResponse) -> Result<GraphQlResponse, TransportError> {
    if !(200..=299).contains(&raw.status) {
        return Err(TransportError::Status {
            status: raw.status,
            body: raw.body,
        });
    }
    decode_body(raw.status, &raw.body)
}

#[async_trait]
impl ProjectsRestApi for GithubClient {
    async fn list_projects(
        &self,
        owner: &OwnerLogin,
        kind: OwnerKind,
        query: Option<&str>,
        page: &PageRequest,
    ) -> Result<ApiResponse<Vec<Project>>, TransportError> {
        let mut url = self.rest_url(&owner_segments(kind, owner))?;
        apply_query(&mut url, query);
        apply_page(&mut url, page);
        self.rest(Method::GET, url).await
    }

    async fn get_project(
        &self,
        scope: &ResolvedScope,
    ) -> Result<ApiResponse<Project>, TransportError> {
        let url = self.project_url(scope, &[])?;
        self.rest(Method::GET, url).await
    }

    async fn list_project_fields(
        &self,
        scope: &ResolvedScope,
        page: &PageRequest,
    ) -> Result<ApiResponse<Vec<ProjectField>>, TransportError> {
        let mut url = self.project_url(scope, &["fields"])?;
        apply_page(&mut url, page);
        self.rest(Method::GET, url).await
    }

    async fn get_project_field(
        &self,
        scope: &ResolvedScope,
        field: FieldId,
    ) -> Result<ApiResponse<ProjectField>, TransportError> {
        let url = self.project_url(scope, &["fields", &field.to_string()])?;
        self.rest(Method::GET, url).await
    }

    async fn list_project_items(
        &self,
        scope: &ResolvedScope,
        query: &ItemQuery,
        page: &PageRequest,
    ) -> Result<ApiResponse<Vec<ProjectItem>>, TransportError> {
        let mut url = self.project_url(scope, &["items"])?;
        apply_query(&mut url, query.query.as_deref());
        apply_fields(&mut url, &query.fields);
        apply_page(&mut url, page);
        self.rest(Method::GET, url).await
    }

    async fn get_project_item(
        &self,
        scope: &ResolvedScope,
        item: ItemId,
        fields: &[FieldId],
    ) -> Result<ApiResponse<ProjectItem>, TransportError> {
        let mut url = self.project_url(scope, &["items", &item.to_string()])?;
        apply_fields(&mut url, fields);
        self.rest(Method::GET, url).await
    }

    async fn update_project_item(
        &self,
        scope: &ResolvedScope,
        item: ItemId,
        update: &FieldUpdate,
    ) -> Result<ApiResponse<ProjectItem>, TransportError> {
        let url = self.project_url(scope, &["items", &item.to_string()])?;
        let request = self.http.patch(url).json(&update.to_request_body());
        classify(self.send(request).await?)
    }

    async fn delete_project_item(
        &self,
        scope: &ResolvedScope,
        item: ItemId,
    ) -> Result<ApiResponse<()>, TransportError> {
        let url = self.project_url(scope, &["items", &item.to_string()])?;
        let raw = self.send(self.http.delete(url)).await?;
        let response = match raw.status {
            204 => ApiResponse::empty(204),
            status => ApiResponse::raw(status, raw.body),
        };
        Ok(response.with_cursors(raw.cursors))
    }
}

#[async_trait]
impl GraphQlApi for GithubClient {
    async fn execute(&self, request: &GraphQlRequest) -> Result<GraphQlResponse, TransportError> {
        let raw = self
            .send(self.http.post(self.graphql_url.clone()).json(request))
            .await?;
        graphql_envelope(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projects::{ProjectNumber, ResponseBody};

    fn client(base: &str) -> GithubClient {
        let config = ApiConfig {
            rest_base_url: base.to_string(),
            ..ApiConfig::default()
        };
        GithubClient::new(&config, "ghp_test").unwrap()
    }

    fn scope(kind: OwnerKind) -> ResolvedScope {
        ResolvedScope {
            owner: OwnerLogin::new("octo-org").unwrap(),
            kind,
            number: ProjectNumber::new(3),
        }
    }

    fn raw(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            cursors: RawCursors::none(),
            body: body.to_string(),
        }
    }

    #[test]
    fn project_paths_follow_owner_kind() {
        let client = client("https://api.github.com");

        let org = client.project_url(&scope(OwnerKind::Org), &["items", "77"]).unwrap();
        let user = client.project_url(&scope(OwnerKind::User), &[]).unwrap();

        assert_eq!(org.as_str(), "https://api.github.com/orgs/octo-org/projectsV2/3/items/77");
        assert_eq!(user.as_str(), "https://api.github.com/users/octo-org/projectsV2/3");
    }

    #[test]
    fn enterprise_base_paths_are_kept() {
        let client = client("https://ghe.example.com/api/v3/");

        let url = client.project_url(&scope(OwnerKind::Org), &["fields"]).unwrap();

        assert_eq!(url.as_str(), "https://ghe.example.com/api/v3/orgs/octo-org/projectsV2/3/fields");
    }

    #[test]
    fn list_query_carries_page_filter_and_fields() {
        let client = client("https://api.github.com");
        let mut url = client.project_url(&scope(OwnerKind::Org), &["items"]).unwrap();
        let page = PageRequest::from_parts(50, Some("Y3I6NTA=".into()), None);

        apply_query(&mut url, Some("is:open"));
        apply_fields(&mut url, &[FieldId::new(42), FieldId::new(43)]);
        apply_page(&mut url, &page);

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("q".to_string(), "is:open".to_string()),
                ("fields".to_string(), "42,43".to_string()),
                ("per_page".to_string(), "50".to_string()),
                ("after".to_string(), "Y3I6NTA=".to_string()),
            ]
        );
    }

    #[test]
    fn empty_query_is_not_sent() {
        let mut url = Url::parse("https://api.github.com/users/octocat/projectsV2").unwrap();

        apply_query(&mut url, Some(""));

        assert_eq!(url.query(), None);
    }

    #[test]
    fn no_content_is_an_empty_body() {
        let response: ApiResponse<()> = classify(raw(204, "")).unwrap();
        assert_eq!(response.body, ResponseBody::Empty);
    }

    #[test]
    fn success_bodies_are_decoded() {
        let response: ApiResponse<Project> =
            classify(raw(200, r#"{"id": 1, "number": 3, "title": "Roadmap"}"#)).unwrap();

        assert!(response.is_ok());
    }

    #[test]
    fn failure_bodies_are_kept_raw() {
        let response: ApiResponse<Project> =
            classify(raw(404, r#"{"message":"Not Found"}"#)).unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(response.raw_body(), Some(r#"{"message":"Not Found"}"#));
    }

    #[test]
    fn undecodable_success_keeps_status_and_body() {
        let err = classify::<Project>(raw(200, "<html>")).unwrap_err();

        assert!(matches!(err, TransportError::UndecodableBody { .. }));
        assert_eq!(err.answer(), Some((200, "<html>")));
    }

    #[test]
    fn graphql_failure_statuses_keep_the_body() {
        let err = graphql_envelope(raw(502, r#"{"message":"Bad gateway"}"#)).unwrap_err();

        assert_eq!(
            err,
            TransportError::Status {
                status: 502,
                body: r#"{"message":"Bad gateway"}"#.to_string(),
            }
        );
    }

    #[test]
    fn graphql_envelopes_decode_data_and_errors() {
        let response = graphql_envelope(raw(
            200,
            r#"{"data": null, "errors": [{"type": "NOT_FOUND", "message": "gone"}]}"#,
        ))
        .unwrap();

        assert_eq!(response.error_summary().as_deref(), Some("gone"));
    }

    #[test]
    fn blank_tokens_are_rejected() {
        assert!(matches!(
            GithubClient::new(&ApiConfig::default(), "  "),
            Err(ClientError::MissingToken)
        ));
    }
}
