//! Driving port for route reads, friend discovery and artifact downloads.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::domain::{Error, FriendSummary, Route, RouteFilter, RouteName, Username};

use super::ArtifactKind;

/// Domain use-case port for route queries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RouteQuery: Send + Sync {
    async fn list(&self) -> Result<Vec<Route>, Error>;

    async fn filter(&self, filter: RouteFilter) -> Result<Vec<Route>, Error>;

    async fn get(&self, name: &RouteName) -> Result<Route, Error>;

    async fn routes_of(&self, username: &Username) -> Result<Vec<Route>, Error>;

    async fn friends(&self, username: &Username) -> Result<BTreeMap<Username, FriendSummary>, Error>;

    async fn common_routes(&self, a: &Username, b: &Username) -> Result<Vec<RouteName>, Error>;

    async fn artifact(&self, name: &RouteName, kind: ArtifactKind) -> Result<Vec<u8>, Error>;

    /// Artifact addressed by bare file name, as served under `/static`.
    async fn static_file(&self, file_name: &str) -> Result<(ArtifactKind, Vec<u8>), Error>;
}
