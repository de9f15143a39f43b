//! Capability-scoped filesystem store for route artifacts.
//!
//! Every file lives directly inside one directory opened with `cap_std`, so
//! names can never resolve outside it. Blocking file IO runs on the tokio
//! blocking pool.

use std::io;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use mockable::Clock;
use tracing::debug;

use super::html_map::HtmlMapRenderer;
use super::{gpx, pdf};
use crate::domain::ports::{
    ArtifactKind, ArtifactStoreError, ExportReport, RouteArtifactStore, parse_artifact_file_name,
};
use crate::domain::{PlannedRoute, RouteName};

/// Writes `{route}.{json,gpx,html,pdf}` into the artifact directory.
pub struct FilesystemArtifactStore {
    dir: Arc<Dir>,
    html: HtmlMapRenderer,
    clock: Arc<dyn Clock>,
}

impl FilesystemArtifactStore {
    /// Open (creating when missing) the artifact directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created or opened, or the
    /// map template fails to parse.
    pub fn open(path: &Path, clock: Arc<dyn Clock>) -> io::Result<Self> {
        Dir::create_ambient_dir_all(path, ambient_authority())?;
        let dir = Dir::open_ambient_dir(path, ambient_authority())?;
        let html = HtmlMapRenderer::new().map_err(io::Error::other)?;
        Ok(Self {
            dir: Arc::new(dir),
            html,
            clock,
        })
    }

    fn render(&self, planned: &PlannedRoute, kind: ArtifactKind) -> Result<Vec<u8>, ArtifactStoreError> {
        let render_error = |error: &dyn std::fmt::Display| ArtifactStoreError::render(error.to_string());
        match kind {
            ArtifactKind::Json => {
                serde_json::to_vec_pretty(&planned.route).map_err(|e| render_error(&e))
            }
            ArtifactKind::Gpx => gpx::render(planned)
                .map(String::into_bytes)
                .map_err(|e| render_error(&e)),
            ArtifactKind::Html => self
                .html
                .render(planned)
                .map(String::into_bytes)
                .map_err(|e| render_error(&e)),
            ArtifactKind::Pdf => {
                pdf::render(planned, self.clock.utc()).map_err(|e| render_error(&e))
            }
        }
    }

    async fn blocking<T, F>(&self, op: F) -> io::Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Dir) -> io::Result<T> + Send + 'static,
    {
        let dir = Arc::clone(&self.dir);
        tokio::task::spawn_blocking(move || op(&dir))
            .await
            .map_err(io::Error::other)?
    }
}

fn map_io_error(name: String, error: &io::Error) -> ArtifactStoreError {
    if error.kind() == io::ErrorKind::NotFound {
        ArtifactStoreError::not_found(name)
    } else {
        ArtifactStoreError::io(format!("{name}: {error}"))
    }
}

#[async_trait]
impl RouteArtifactStore for FilesystemArtifactStore {
    async fn export(&self, planned: &PlannedRoute) -> ExportReport {
        let mut report = ExportReport::default();
        for kind in ArtifactKind::ALL {
            let file_name = kind.file_name(&planned.route.name);
            let outcome = match self.render(planned, kind) {
                Ok(bytes) => {
                    let target = file_name.clone();
                    self.blocking(move |dir| dir.write(&target, bytes))
                        .await
                        .map_err(|error| map_io_error(file_name.clone(), &error))
                }
                Err(error) => Err(error),
            };
            match outcome {
                Ok(()) => {
                    debug!(file = %file_name, "artifact written");
                    report.produced.push(kind);
                }
                Err(error) => report.failed.push((kind, error)),
            }
        }
        report
    }

    async fn read(
        &self,
        route: &RouteName,
        kind: ArtifactKind,
    ) -> Result<Vec<u8>, ArtifactStoreError> {
        let file_name = kind.file_name(route);
        let target = file_name.clone();
        self.blocking(move |dir| dir.read(&target))
            .await
            .map_err(|error| map_io_error(file_name, &error))
    }

    async fn read_file(
        &self,
        file_name: &str,
    ) -> Result<(ArtifactKind, Vec<u8>), ArtifactStoreError> {
        let (route, kind) = parse_artifact_file_name(file_name)?;
        Ok((kind, self.read(&route, kind).await?))
    }

    async fn remove(&self, route: &RouteName) -> Result<(), ArtifactStoreError> {
        let names: Vec<String> = ArtifactKind::ALL
            .into_iter()
            .map(|kind| kind.file_name(route))
            .collect();
        self.blocking(move |dir| {
            for name in &names {
                match dir.remove_file(name) {
                    Ok(()) => {}
                    Err(error) if error.kind() == io::ErrorKind::NotFound => {}
                    Err(error) => return Err(error),
                }
            }
            Ok(())
        })
        .await
        .map_err(|error| map_io_error(route.to_string(), &error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::export::fixtures::coastal_walk;
    use crate::test_support::MutableClock;
    use chrono::{TimeZone, Utc};
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct Harness {
        _tmp: TempDir,
        root: Dir,
        store: FilesystemArtifactStore,
    }

    #[fixture]
    fn harness() -> Harness {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("artifacts");
        let clock = Arc::new(MutableClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0)
                .single()
                .expect("timestamp"),
        ));
        let store = FilesystemArtifactStore::open(&root, clock).expect("store");
        let root = Dir::open_ambient_dir(&root, ambient_authority()).expect("artifact dir");
        Harness {
            _tmp: tmp,
            root,
            store,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn export_writes_every_kind(harness: Harness) {
        let planned = coastal_walk();
        let report = harness.store.export(&planned).await;

        assert_eq!(report.produced, ArtifactKind::ALL.to_vec());
        assert!(report.failed.is_empty());
        for ext in ["json", "gpx", "html", "pdf"] {
            assert!(harness.root.is_file(format!("coastal_walk.{ext}")), "{ext}");
        }
    }

    #[rstest]
    #[tokio::test]
    async fn json_artifact_is_the_route_record(harness: Harness) {
        let planned = coastal_walk();
        harness.store.export(&planned).await;

        let bytes = harness
            .store
            .read(&planned.route.name, ArtifactKind::Json)
            .await
            .expect("json");
        let text = String::from_utf8(bytes).expect("utf8");
        assert!(text.contains("\n  \"distanceKm\": 2.2705"), "{text}");
        let decoded: crate::domain::Route = serde_json::from_str(&text).expect("route");
        assert_eq!(decoded, planned.route);
    }

    #[rstest]
    #[tokio::test]
    async fn read_file_serves_by_file_name(harness: Harness) {
        harness.store.export(&coastal_walk()).await;

        let (kind, bytes) = harness
            .store
            .read_file("coastal_walk.gpx")
            .await
            .expect("gpx");
        assert_eq!(kind, ArtifactKind::Gpx);
        assert!(String::from_utf8_lossy(&bytes).contains("<name>Leg 2</name>"));
    }

    #[rstest]
    #[case("../secrets.json")]
    #[case("coastal_walk.exe")]
    #[case("noextension")]
    #[case(".hidden.json")]
    #[tokio::test]
    async fn read_file_rejects_unsafe_names(harness: Harness, #[case] name: &str) {
        let error = harness.store.read_file(name).await.expect_err("invalid");
        assert!(matches!(error, ArtifactStoreError::InvalidName { .. }), "{error:?}");
    }

    #[rstest]
    #[tokio::test]
    async fn missing_artifacts_are_not_found(harness: Harness) {
        let name = RouteName::new("ghost").expect("name");
        let error = harness
            .store
            .read(&name, ArtifactKind::Pdf)
            .await
            .expect_err("missing");
        assert_eq!(error, ArtifactStoreError::not_found("ghost.pdf"));
    }

    #[rstest]
    #[tokio::test]
    async fn remove_deletes_all_files_and_tolerates_missing_ones(harness: Harness) {
        let planned = coastal_walk();
        harness.store.export(&planned).await;
        harness
            .root
            .remove_file("coastal_walk.html")
            .expect("pre-remove");

        harness.store.remove(&planned.route.name).await.expect("remove");

        for ext in ["json", "gpx", "html", "pdf"] {
            assert!(!harness.root.exists(format!("coastal_walk.{ext}")), "{ext}");
        }
    }

    #[rstest]
    #[tokio::test]
    async fn render_failures_are_reported_per_kind(harness: Harness) {
        let mut planned = coastal_walk();
        planned.points.clear();

        let report = harness.store.export(&planned).await;

        assert_eq!(
            report.produced,
            vec![ArtifactKind::Json, ArtifactKind::Gpx, ArtifactKind::Pdf]
        );
        assert!(matches!(
            report.failed.as_slice(),
            [(ArtifactKind::Html, ArtifactStoreError::Render { .. })]
        ));
    }
}
