//! Owner-kind detection.
//!
//! A login alone does not say whether it belongs to a user or an organization,
//! and the two are served by different endpoints. [`OwnerScopeResolver`] finds
//! out by asking for the project under each scope in a fixed order.

use projects::{
    OwnerKind, OwnerLogin, ProjectNumber, ProjectScope, ProjectsError, ProjectsRestApi,
    ResolutionError, ResolvedScope,
};
use tracing::debug;

/// Probe order. Personal projects dominate usage, so users go first.
const PROBE_ORDER: [OwnerKind; 2] = [OwnerKind::User, OwnerKind::Org];

/// Detects the owner kind of a project by probing "get project" per scope.
pub struct OwnerScopeResolver<'a> {
    rest: &'a dyn ProjectsRestApi,
}

impl<'a> OwnerScopeResolver<'a> {
    pub fn new(rest: &'a dyn ProjectsRestApi) -> Self {
        Self { rest }
    }

    /// Returns the first scope, user then org, under which the project exists.
    ///
    /// A transport error or non-success status on one probe falls through to
    /// the next; only when both probes fail does resolution fail.
    pub async fn resolve(
        &self,
        owner: &OwnerLogin,
        number: ProjectNumber,
    ) -> Result<OwnerKind, ProjectsError> {
        for kind in PROBE_ORDER {
            let candidate = ResolvedScope {
                owner: owner.clone(),
                kind,
                number,
            };
            match self.rest.get_project(&candidate).await {
                Ok(resp) if resp.is_ok() => {
                    debug!(%owner, %number, %kind, "owner kind resolved");
                    return Ok(kind);
                }
                Ok(resp) => {
                    debug!(%owner, %number, %kind, status = resp.status, "project not found under scope");
                }
                Err(error) => {
                    debug!(%owner, %number, %kind, %error, "scope probe failed");
                }
            }
        }

        Err(ResolutionError::OwnerKind {
            owner: owner.clone(),
            number,
        }
        .into())
    }

    /// Returns `scope` as given when the caller named a kind, probing otherwise.
    pub async fn ensure_resolved(
        &self,
        scope: &ProjectScope,
    ) -> Result<ResolvedScope, ProjectsError> {
        if let Some(resolved) = scope.as_resolved() {
            return Ok(resolved);
        }
        let kind = self.resolve(&scope.owner, scope.number).await?;
        Ok(scope.resolve_as(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{login, project, Call, ScriptedBackend};
    use projects::{ApiResponse, TransportError};

    #[tokio::test]
    async fn org_only_project_resolves_after_user_then_org_probe() {
        let backend = ScriptedBackend::new()
            .with_project(OwnerKind::Org, Ok(ApiResponse::decoded(200, project(1, 3, "Roadmap"))));

        let kind = OwnerScopeResolver::new(&backend)
            .resolve(&login("octo-org"), ProjectNumber::new(3))
            .await
            .unwrap();

        assert_eq!(kind, OwnerKind::Org);
        assert_eq!(
            backend.calls(),
            vec![
                Call::GetProject { kind: OwnerKind::User },
                Call::GetProject { kind: OwnerKind::Org },
            ]
        );
    }

    #[tokio::test]
    async fn user_project_wins_without_probing_org() {
        let backend = ScriptedBackend::new()
            .with_project(OwnerKind::User, Ok(ApiResponse::decoded(200, project(1, 3, "Mine"))))
            .with_project(OwnerKind::Org, Ok(ApiResponse::decoded(200, project(2, 3, "Theirs"))));

        let kind = OwnerScopeResolver::new(&backend)
            .resolve(&login("octocat"), ProjectNumber::new(3))
            .await
            .unwrap();

        assert_eq!(kind, OwnerKind::User);
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn transport_error_on_user_probe_falls_through_to_org() {
        let backend = ScriptedBackend::new()
            .with_project(
                OwnerKind::User,
                Err(TransportError::Request("connection reset".into())),
            )
            .with_project(OwnerKind::Org, Ok(ApiResponse::decoded(200, project(1, 3, "Roadmap"))));

        let kind = OwnerScopeResolver::new(&backend)
            .resolve(&login("octo-org"), ProjectNumber::new(3))
            .await
            .unwrap();

        assert_eq!(kind, OwnerKind::Org);
    }

    #[tokio::test]
    async fn missing_everywhere_fails_naming_owner_and_number() {
        let backend = ScriptedBackend::new();

        let err = OwnerScopeResolver::new(&backend)
            .resolve(&login("ghost"), ProjectNumber::new(9))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProjectsError::Resolution(ResolutionError::OwnerKind { .. })
        ));
        let message = err.to_string();
        assert!(message.contains("ghost"));
        assert!(message.contains("project 9"));
        assert_eq!(backend.calls().len(), 2);
    }

    #[tokio::test]
    async fn supplied_kind_is_never_probed() {
        let backend = ScriptedBackend::new();
        let scope = ProjectScope::new(login("octo-org"), Some(OwnerKind::Org), ProjectNumber::new(3));

        let resolved = OwnerScopeResolver::new(&backend)
            .ensure_resolved(&scope)
            .await
            .unwrap();

        assert_eq!(resolved.kind, OwnerKind::Org);
        assert!(backend.calls().is_empty());
    }
}
