//! Field and option name lookup for single-select fields.

use projects::{
    FieldId, OptionId, PageRequest, ProjectsError, ProjectsRestApi, ResolutionError,
    ResolvedScope, Settings, UpstreamError,
};
use tracing::debug;

use crate::context;

/// The list-fields endpoint serves at most this many fields per page.
const FIELD_PAGE_LIMIT: u32 = 100;

/// A field/option name pair translated into the IDs an update needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOption {
    pub field_id: FieldId,
    pub option_id: OptionId,
}

/// Translates human field and option names into IDs.
///
/// Nothing is cached: every call lists the project's fields again so that
/// options created a moment ago are visible.
pub struct FieldOptionResolver<'a> {
    rest: &'a dyn ProjectsRestApi,
    settings: &'a Settings,
}

impl<'a> FieldOptionResolver<'a> {
    pub fn new(rest: &'a dyn ProjectsRestApi, settings: &'a Settings) -> Self {
        Self { rest, settings }
    }

    /// Finds the field named exactly `field_name`, then its option named
    /// exactly `option_name`.
    pub async fn resolve(
        &self,
        scope: &ResolvedScope,
        field_name: &str,
        option_name: &str,
    ) -> Result<ResolvedOption, ProjectsError> {
        let page = PageRequest::first(self.settings.field_lookup_page_size.min(FIELD_PAGE_LIMIT));
        let resp = self
            .rest
            .list_project_fields(scope, &page)
            .await
            .map_err(|e| UpstreamError::transport(context::LIST_FIELDS, e))?;
        let (fields, _) = resp.into_ok(context::LIST_FIELDS)?;

        let field = fields
            .iter()
            .find(|f| f.name == field_name)
            .ok_or_else(|| ResolutionError::FieldNotFound {
                field: field_name.to_string(),
            })?;
        let option = field
            .option_named(option_name)
            .ok_or_else(|| ResolutionError::OptionNotFound {
                field: field_name.to_string(),
                option: option_name.to_string(),
            })?;

        debug!(%scope, field = field_name, option = option_name, field_id = %field.id, "option resolved");
        Ok(ResolvedOption {
            field_id: field.id,
            option_id: option.id.clone(),
        })
    }
}
