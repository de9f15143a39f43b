//! Port for exported route documents (JSON, GPX, HTML map, PDF).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{PlannedRoute, RouteName};

use super::define_port_error;

/// Kind of exported document; doubles as the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Json,
    Gpx,
    Html,
    Pdf,
}

impl ArtifactKind {
    /// Every kind, in export order.
    pub const ALL: [Self; 4] = [Self::Json, Self::Gpx, Self::Html, Self::Pdf];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Gpx => "gpx",
            Self::Html => "html",
            Self::Pdf => "pdf",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Gpx => "application/gpx+xml",
            Self::Html => "text/html; charset=utf-8",
            Self::Pdf => "application/pdf",
        }
    }

    /// File name of this artifact for `route`.
    pub fn file_name(self, route: &RouteName) -> String {
        format!("{route}.{}", self.extension())
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ArtifactKind {
    type Err = ArtifactStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.extension().eq_ignore_ascii_case(s))
            .ok_or_else(|| ArtifactStoreError::invalid_name(s))
    }
}

define_port_error! {
    /// Errors raised by artifact stores.
    pub enum ArtifactStoreError {
        /// The requested artifact does not exist.
        NotFound { name: String } => "artifact `{name}` not found",
        /// The name cannot be mapped to a file inside the artifact directory.
        InvalidName { name: String } => "`{name}` is not a valid artifact name",
        /// Rendering the document failed.
        Render { message: String } => "artifact rendering failed: {message}",
        /// Reading or writing the file failed.
        Io { message: String } => "artifact storage failed: {message}",
    }
}

/// Result of exporting one route: produced kinds plus per-kind failures.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub produced: Vec<ArtifactKind>,
    pub failed: Vec<(ArtifactKind, ArtifactStoreError)>,
}

/// Port rendering, serving and deleting route artifacts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RouteArtifactStore: Send + Sync {
    /// Render and write every artifact kind; individual failures are reported,
    /// not raised.
    async fn export(&self, planned: &PlannedRoute) -> ExportReport;

    async fn read(&self, route: &RouteName, kind: ArtifactKind)
    -> Result<Vec<u8>, ArtifactStoreError>;

    /// Read by bare file name (`{route}.{ext}`), as served under `/static`.
    async fn read_file(&self, file_name: &str) -> Result<(ArtifactKind, Vec<u8>), ArtifactStoreError>;

    /// Remove every artifact of `route`; missing files are ignored.
    async fn remove(&self, route: &RouteName) -> Result<(), ArtifactStoreError>;
}

/// Split `{route}.{ext}` into its validated parts.
pub fn parse_artifact_file_name(
    file_name: &str,
) -> Result<(RouteName, ArtifactKind), ArtifactStoreError> {
    let (stem, ext) = file_name
        .rsplit_once('.')
        .ok_or_else(|| ArtifactStoreError::invalid_name(file_name))?;
    let kind: ArtifactKind = ext.parse()?;
    let route = RouteName::new(stem).map_err(|_| ArtifactStoreError::invalid_name(file_name))?;
    if route.as_ref() != stem {
        return Err(ArtifactStoreError::invalid_name(file_name));
    }
    Ok((route, kind))
}

/// In-memory store writing a one-line placeholder per artifact.
#[derive(Debug, Default)]
pub struct FixtureArtifactStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl FixtureArtifactStore {
    fn files(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>, ArtifactStoreError> {
        self.files
            .lock()
            .map_err(|_| ArtifactStoreError::io("fixture artifact store poisoned"))
    }
}

#[async_trait]
impl RouteArtifactStore for FixtureArtifactStore {
    async fn export(&self, planned: &PlannedRoute) -> ExportReport {
        let name = &planned.route.name;
        match self.files() {
            Ok(mut files) => {
                for kind in ArtifactKind::ALL {
                    let body = format!("{kind} export of {name}").into_bytes();
                    files.insert(kind.file_name(name), body);
                }
                ExportReport {
                    produced: ArtifactKind::ALL.to_vec(),
                    failed: Vec::new(),
                }
            }
            Err(err) => ExportReport {
                produced: Vec::new(),
                failed: ArtifactKind::ALL
                    .into_iter()
                    .map(|kind| (kind, err.clone()))
                    .collect(),
            },
        }
    }

    async fn read(
        &self,
        route: &RouteName,
        kind: ArtifactKind,
    ) -> Result<Vec<u8>, ArtifactStoreError> {
        let file_name = kind.file_name(route);
        self.files()?
            .get(&file_name)
            .cloned()
            .ok_or_else(|| ArtifactStoreError::not_found(file_name))
    }

    async fn read_file(&self, file_name: &str) -> Result<(ArtifactKind, Vec<u8>), ArtifactStoreError> {
        let (route, kind) = parse_artifact_file_name(file_name)?;
        Ok((kind, self.read(&route, kind).await?))
    }

    async fn remove(&self, route: &RouteName) -> Result<(), ArtifactStoreError> {
        let mut files = self.files()?;
        for kind in ArtifactKind::ALL {
            files.remove(&kind.file_name(route));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("beach.gpx", "beach", ArtifactKind::Gpx)]
    #[case("route_20240501093000.PDF", "route_20240501093000", ArtifactKind::Pdf)]
    #[case("ruta v1.2.html", "ruta v1.2", ArtifactKind::Html)]
    fn parses_artifact_file_names(
        #[case] file_name: &str,
        #[case] route: &str,
        #[case] kind: ArtifactKind,
    ) {
        let (parsed_route, parsed_kind) = parse_artifact_file_name(file_name).expect("valid");
        assert_eq!(parsed_route.as_ref(), route);
        assert_eq!(parsed_kind, kind);
    }

    #[rstest]
    #[case("../secret.json")]
    #[case("beach")]
    #[case("beach.exe")]
    #[case(" beach.json")]
    #[case(".json")]
    fn rejects_unsafe_file_names(#[case] file_name: &str) {
        assert!(matches!(
            parse_artifact_file_name(file_name),
            Err(ArtifactStoreError::InvalidName { .. })
        ));
    }
}
