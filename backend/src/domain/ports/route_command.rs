//! Driving port for route creation and deletion.

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Error, Route, RouteName, RouteRequest, UserId, Username};

use super::ArtifactKind;

/// A persisted route and the artifacts exported for it.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRoute {
    pub route: Route,
    pub artifacts: Vec<ArtifactKind>,
}

/// Address pool and batch size for auto-generated routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoRouteRequest {
    pub addresses: Vec<String>,
    pub count: usize,
}

/// Domain use-case port for route mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RouteCommand: Send + Sync {
    /// Build, persist, link and export one route for `owner`.
    async fn create_manual(&self, owner: &UserId, request: RouteRequest)
    -> Result<CreatedRoute, Error>;

    /// Build a batch of random routes; nothing is persisted if any build fails.
    async fn create_auto(
        &self,
        owner: &UserId,
        request: AutoRouteRequest,
    ) -> Result<Vec<CreatedRoute>, Error>;

    /// Unlink `route` from `target` (who must be the actor); the route and
    /// its artifacts are removed once no user remains linked.
    async fn delete_for_user(
        &self,
        actor: &UserId,
        target: &Username,
        route: &RouteName,
    ) -> Result<(), Error>;
}
