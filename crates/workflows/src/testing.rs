//! In-memory backend for orchestration tests.
//!
//! [`ScriptedBackend`] implements both ports. Each endpoint replays a queue of
//! scripted replies; the last reply in a queue repeats forever. Every call is
//! recorded so tests can assert on call counts and call order.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use projects::{
    ApiResponse, FieldId, FieldOption, FieldUpdate, GraphQlApi, GraphQlRequest, GraphQlResponse,
    ItemId, ItemQuery, OptionId, OwnerKind, OwnerLogin, PageRequest, Project, ProjectField,
    ProjectItem, ProjectNumber, ProjectsRestApi, RawCursors, ResolvedScope, TransportError,
};
use serde_json::{json, Value};

type Reply<T> = Result<ApiResponse<T>, TransportError>;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListProjects {
        kind: OwnerKind,
        query: Option<String>,
        per_page: u32,
    },
    GetProject {
        kind: OwnerKind,
    },
    ListFields {
        kind: OwnerKind,
        per_page: u32,
    },
    GetField {
        field: FieldId,
    },
    ListItems {
        query: Option<String>,
        fields: Vec<FieldId>,
        per_page: u32,
        after: Option<String>,
    },
    GetItem {
        item: ItemId,
        fields: Vec<FieldId>,
    },
    UpdateItem {
        item: ItemId,
        body: Value,
    },
    DeleteItem {
        item: ItemId,
    },
    Graph {
        query: String,
        variables: Value,
    },
}

/// A reply queue whose last entry is sticky.
struct Script<T> {
    queue: Mutex<VecDeque<T>>,
}

impl<T: Clone> Script<T> {
    fn push(&self, reply: T) {
        self.queue.lock().unwrap().push_back(reply);
    }

    fn next(&self) -> Option<T> {
        let mut queue = self.queue.lock().unwrap();
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
        }
    }
}

fn not_found<T>() -> Reply<T> {
    Ok(ApiResponse::raw(404, "{\"message\":\"Not Found\"}"))
}

#[derive(Default)]
pub struct ScriptedBackend {
    calls: Mutex<Vec<Call>>,
    projects: Mutex<HashMap<OwnerKind, Reply<Project>>>,
    project_lists: Mutex<HashMap<OwnerKind, Reply<Vec<Project>>>>,
    fields: Script<Reply<Vec<ProjectField>>>,
    field: Script<Reply<ProjectField>>,
    items: Script<Reply<Vec<ProjectItem>>>,
    item: Script<Reply<ProjectItem>>,
    updates: Script<Reply<ProjectItem>>,
    deletes: Script<Reply<()>>,
    graph: Script<Result<GraphQlResponse, TransportError>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// `get_project` under `kind` answers `reply`; unscripted kinds answer 404.
    pub fn with_project(self, kind: OwnerKind, reply: Reply<Project>) -> Self {
        self.projects.lock().unwrap().insert(kind, reply);
        self
    }

    pub fn with_project_list(self, kind: OwnerKind, reply: Reply<Vec<Project>>) -> Self {
        self.project_lists.lock().unwrap().insert(kind, reply);
        self
    }

    pub fn with_fields(self, reply: Reply<Vec<ProjectField>>) -> Self {
        self.fields.push(reply);
        self
    }

    pub fn with_field(self, reply: Reply<ProjectField>) -> Self {
        self.field.push(reply);
        self
    }

    pub fn with_item_page(self, reply: Reply<Vec<ProjectItem>>) -> Self {
        self.items.push(reply);
        self
    }

    pub fn with_item(self, reply: Reply<ProjectItem>) -> Self {
        self.item.push(reply);
        self
    }

    pub fn with_update(self, reply: Reply<ProjectItem>) -> Self {
        self.updates.push(reply);
        self
    }

    pub fn with_delete(self, reply: Reply<()>) -> Self {
        self.deletes.push(reply);
        self
    }

    pub fn with_graph(self, data: Value) -> Self {
        let response = serde_json::from_value(data).unwrap();
        self.graph.push(Ok(response));
        self
    }

    pub fn with_graph_error(self, error: TransportError) -> Self {
        self.graph.push(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| matches(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ProjectsRestApi for ScriptedBackend {
    async fn list_projects(
        &self,
        _owner: &OwnerLogin,
        kind: OwnerKind,
        query: Option<&str>,
        page: &PageRequest,
    ) -> Result<ApiResponse<Vec<Project>>, TransportError> {
        self.record(Call::ListProjects {
            kind,
            query: query.map(str::to_string),
            per_page: page.per_page,
        });
        self.project_lists
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .unwrap_or_else(not_found)
    }

    async fn get_project(
        &self,
        scope: &ResolvedScope,
    ) -> Result<ApiResponse<Project>, TransportError> {
        self.record(Call::GetProject { kind: scope.kind });
        self.projects
            .lock()
            .unwrap()
            .get(&scope.kind)
            .cloned()
            .unwrap_or_else(not_found)
    }

    async fn list_project_fields(
        &self,
        scope: &ResolvedScope,
        page: &PageRequest,
    ) -> Result<ApiResponse<Vec<ProjectField>>, TransportError> {
        self.record(Call::ListFields {
            kind: scope.kind,
            per_page: page.per_page,
        });
        self.fields.next().unwrap_or_else(not_found)
    }

    async fn get_project_field(
        &self,
        _scope: &ResolvedScope,
        field: FieldId,
    ) -> Result<ApiResponse<ProjectField>, TransportError> {
        self.record(Call::GetField { field });
        self.field.next().unwrap_or_else(not_found)
    }

    async fn list_project_items(
        &self,
        _scope: &ResolvedScope,
        query: &ItemQuery,
        page: &PageRequest,
    ) -> Result<ApiResponse<Vec<ProjectItem>>, TransportError> {
        self.record(Call::ListItems {
            query: query.query.clone(),
            fields: query.fields.clone(),
            per_page: page.per_page,
            after: page.after.as_ref().map(|c| c.as_str().to_string()),
        });
        self.items.next().unwrap_or_else(not_found)
    }

    async fn get_project_item(
        &self,
        _scope: &ResolvedScope,
        item: ItemId,
        fields: &[FieldId],
    ) -> Result<ApiResponse<ProjectItem>, TransportError> {
        self.record(Call::GetItem {
            item,
            fields: fields.to_vec(),
        });
        self.item.next().unwrap_or_else(not_found)
    }

    async fn update_project_item(
        &self,
        _scope: &ResolvedScope,
        item: ItemId,
        update: &FieldUpdate,
    ) -> Result<ApiResponse<ProjectItem>, TransportError> {
        self.record(Call::UpdateItem {
            item,
            body: update.to_request_body(),
        });
        self.updates.next().unwrap_or_else(not_found)
    }

    async fn delete_project_item(
        &self,
        _scope: &ResolvedScope,
        item: ItemId,
    ) -> Result<ApiResponse<()>, TransportError> {
        self.record(Call::DeleteItem { item });
        self.deletes.next().unwrap_or_else(not_found)
    }
}

#[async_trait]
impl GraphQlApi for ScriptedBackend {
    async fn execute(&self, request: &GraphQlRequest) -> Result<GraphQlResponse, TransportError> {
        self.record(Call::Graph {
            query: request.query.clone(),
            variables: request.variables.clone(),
        });
        self.graph
            .next()
            .unwrap_or_else(|| Ok(GraphQlResponse::default()))
    }
}

impl Call {
    /// An item listing with no filter and no extra fields.
    pub fn plain_item_list(per_page: u32, after: Option<&str>) -> Self {
        Call::ListItems {
            query: None,
            fields: Vec::new(),
            per_page,
            after: after.map(str::to_string),
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn login(value: &str) -> OwnerLogin {
    OwnerLogin::new(value).unwrap()
}

pub fn org_scope(owner: &str, number: u64) -> ResolvedScope {
    ResolvedScope {
        owner: login(owner),
        kind: OwnerKind::Org,
        number: ProjectNumber::new(number),
    }
}

pub fn user_scope(owner: &str, number: u64) -> ResolvedScope {
    ResolvedScope {
        owner: login(owner),
        kind: OwnerKind::User,
        number: ProjectNumber::new(number),
    }
}

pub fn project(id: i64, number: u64, title: &str) -> Project {
    serde_json::from_value(json!({"id": id, "number": number, "title": title})).unwrap()
}

/// A single-select field with `(name, option_id)` options.
pub fn select_field(id: i64, name: &str, options: &[(&str, &str)]) -> ProjectField {
    ProjectField {
        id: FieldId::new(id),
        node_id: None,
        name: name.to_string(),
        data_type: Some("single_select".to_string()),
        options: options
            .iter()
            .map(|(name, id)| FieldOption {
                id: OptionId::new(*id).unwrap(),
                name: name.to_string(),
                color: None,
            })
            .collect(),
    }
}

pub fn issue_item(id: i64, owner: &str, repo: &str, number: u64) -> ProjectItem {
    serde_json::from_value(json!({
        "id": id,
        "content_type": "Issue",
        "content": {
            "number": number,
            "repository": {"name": repo, "owner": {"login": owner}}
        }
    }))
    .unwrap()
}

/// `count` issue items from another repository, ids starting at `first_id`.
pub fn filler_items(first_id: i64, count: usize) -> Vec<ProjectItem> {
    (0..count)
        .map(|i| issue_item(first_id + i as i64, "someone", "elsewhere", 9000 + i as u64))
        .collect()
}

pub fn page_with_next<T>(items: T, next: &str) -> Reply<T> {
    Ok(ApiResponse::decoded(200, items).with_cursors(RawCursors::from_raw(Some(next), None)))
}

pub fn last_page<T>(items: T) -> Reply<T> {
    Ok(ApiResponse::decoded(200, items))
}
