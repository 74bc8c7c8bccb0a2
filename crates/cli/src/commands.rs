//! One subcommand per exposed operation.
//!
//! Arguments are converted into the operation request structs unvalidated;
//! validation belongs to the operations themselves.

use clap::{Args, Subcommand};
use serde_json::Value;
use workflows::operations::{
    AddItemRequest, AssignIssueRequest, DeleteItemRequest, GetFieldRequest, GetItemRequest,
    GetProjectRequest, ListFieldsRequest, ListItemsRequest, ListProjectsRequest, PageArgs,
    ProjectLocator, SetFieldByNameRequest, UpdateItemRequest, UpdatedField,
};
use workflows::{OperationOutcome, ProjectsService};

#[derive(Debug, Args)]
pub struct ProjectArgs {
    /// User or organization login that owns the project
    #[arg(long)]
    owner: String,

    /// `user` or `org`; detected when omitted
    #[arg(long)]
    owner_type: Option<String>,

    /// The project's number
    #[arg(long)]
    project_number: i64,
}

impl From<ProjectArgs> for ProjectLocator {
    fn from(args: ProjectArgs) -> Self {
        Self {
            owner: args.owner,
            owner_type: args.owner_type,
            project_number: args.project_number,
        }
    }
}

#[derive(Debug, Args)]
pub struct PagingArgs {
    /// Results per page (at most 50)
    #[arg(long)]
    per_page: Option<u32>,

    /// Forward cursor from a previous `nextCursor`
    #[arg(long)]
    after: Option<String>,

    /// Backward cursor from a previous `prevCursor`
    #[arg(long)]
    before: Option<String>,
}

impl From<PagingArgs> for PageArgs {
    fn from(args: PagingArgs) -> Self {
        Self {
            per_page: args.per_page,
            after: args.after,
            before: args.before,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List an owner's projects; both scopes are merged when --owner-type is omitted
    ListProjects {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        owner_type: Option<String>,
        /// Filter projects by this query
        #[arg(long)]
        query: Option<String>,
        #[command(flatten)]
        page: PagingArgs,
    },

    /// List a project's fields
    ListFields {
        #[command(flatten)]
        project: ProjectArgs,
        #[command(flatten)]
        page: PagingArgs,
    },

    /// List a project's items
    ListItems {
        #[command(flatten)]
        project: ProjectArgs,
        /// Project filter syntax, e.g. "is:open"
        #[arg(long)]
        query: Option<String>,
        /// Include the value of this field ID (repeatable)
        #[arg(long = "field")]
        fields: Vec<i64>,
        #[command(flatten)]
        page: PagingArgs,
    },

    /// Get one project
    GetProject {
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Get one project field
    GetField {
        #[command(flatten)]
        project: ProjectArgs,
        #[arg(long)]
        field_id: i64,
    },

    /// Get one project item
    GetItem {
        #[command(flatten)]
        project: ProjectArgs,
        #[arg(long)]
        item_id: i64,
        /// Include the value of this field ID (repeatable)
        #[arg(long = "field")]
        fields: Vec<i64>,
    },

    /// Add an issue or pull request to a project
    AddItem {
        #[command(flatten)]
        project: ProjectArgs,
        #[arg(long)]
        item_owner: String,
        #[arg(long)]
        item_repo: String,
        #[arg(long)]
        item_number: i64,
        /// `issue` or `pull_request`
        #[arg(long)]
        item_type: String,
    },

    /// Set or clear one field of a project item
    UpdateItem {
        #[command(flatten)]
        project: ProjectArgs,
        #[arg(long)]
        item_id: i64,
        #[arg(long)]
        field_id: i64,
        /// New value as JSON (`null` clears); anything else is taken as a string
        #[arg(long)]
        value: String,
    },

    /// Delete a project item
    DeleteItem {
        #[command(flatten)]
        project: ProjectArgs,
        #[arg(long)]
        item_id: i64,
    },

    /// Add an issue to an organization project and set Priority and Size
    AssignIssue {
        #[arg(long)]
        org: String,
        #[arg(long)]
        project_number: i64,
        #[arg(long)]
        item_owner: String,
        #[arg(long)]
        item_repo: String,
        #[arg(long)]
        issue_number: i64,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        size: Option<String>,
    },

    /// Set a single-select field by field and option name
    SetField {
        #[command(flatten)]
        project: ProjectArgs,
        #[arg(long)]
        item_id: i64,
        #[arg(long)]
        field_name: String,
        #[arg(long)]
        option_name: String,
    },
}

/// `--value` is JSON when it parses as JSON, a plain string otherwise.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

impl Command {
    pub async fn run(self, service: &ProjectsService) -> OperationOutcome {
        match self {
            Self::ListProjects {
                owner,
                owner_type,
                query,
                page,
            } => {
                let req = ListProjectsRequest {
                    owner,
                    owner_type,
                    query,
                    page: page.into(),
                };
                OperationOutcome::from_result(service.list_projects(&req).await)
            }
            Self::ListFields { project, page } => {
                let req = ListFieldsRequest {
                    project: project.into(),
                    page: page.into(),
                };
                OperationOutcome::from_result(service.list_project_fields(&req).await)
            }
            Self::ListItems {
                project,
                query,
                fields,
                page,
            } => {
                let req = ListItemsRequest {
                    project: project.into(),
                    query,
                    fields,
                    page: page.into(),
                };
                OperationOutcome::from_result(service.list_project_items(&req).await)
            }
            Self::GetProject { project } => {
                let req = GetProjectRequest {
                    project: project.into(),
                };
                OperationOutcome::from_result(service.get_project(&req).await)
            }
            Self::GetField { project, field_id } => {
                let req = GetFieldRequest {
                    project: project.into(),
                    field_id,
                };
                OperationOutcome::from_result(service.get_project_field(&req).await)
            }
            Self::GetItem {
                project,
                item_id,
                fields,
            } => {
                let req = GetItemRequest {
                    project: project.into(),
                    item_id,
                    fields,
                };
                OperationOutcome::from_result(service.get_project_item(&req).await)
            }
            Self::AddItem {
                project,
                item_owner,
                item_repo,
                item_number,
                item_type,
            } => {
                let req = AddItemRequest {
                    project: project.into(),
                    item_owner,
                    item_repo,
                    item_number,
                    item_type,
                };
                OperationOutcome::from_result(service.add_project_item(&req).await)
            }
            Self::UpdateItem {
                project,
                item_id,
                field_id,
                value,
            } => {
                let req = UpdateItemRequest {
                    project: project.into(),
                    item_id,
                    updated_field: Some(UpdatedField {
                        id: field_id,
                        value: Some(parse_value(&value)),
                    }),
                };
                OperationOutcome::from_result(service.update_project_item(&req).await)
            }
            Self::DeleteItem { project, item_id } => {
                let req = DeleteItemRequest {
                    project: project.into(),
                    item_id,
                };
                OperationOutcome::from_result(service.delete_project_item(&req).await)
            }
            Self::AssignIssue {
                org,
                project_number,
                item_owner,
                item_repo,
                issue_number,
                priority,
                size,
            } => {
                let req = AssignIssueRequest {
                    org,
                    project_number,
                    item_owner,
                    item_repo,
                    issue_number,
                    priority,
                    size,
                };
                OperationOutcome::from_result(service.assign_issue_to_org_project(&req).await)
            }
            Self::SetField {
                project,
                item_id,
                field_name,
                option_name,
            } => {
                let req = SetFieldByNameRequest {
                    project: project.into(),
                    item_id,
                    field_name,
                    option_name,
                };
                OperationOutcome::from_result(
                    service.update_project_item_field_by_name(&req).await,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn values_parse_as_json_or_fall_back_to_strings() {
        assert_eq!(parse_value("null"), Value::Null);
        assert_eq!(parse_value("3"), json!(3));
        assert_eq!(parse_value("\"High\""), json!("High"));
        assert_eq!(parse_value("In progress"), json!("In progress"));
    }
}
