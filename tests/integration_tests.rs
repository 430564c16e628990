//! Integration tests for coregate
//!
//! These tests verify:
//! - Conflict workflows over an in-memory release history source
//! - Descriptor output for the collected conflicts
//! - Compatibility reports and their rendering
//! - The HTTP adapter against a mock release history service

use async_trait::async_trait;
use coregate::classify::{branch_bounds, BoundKind, CoreTarget};
use coregate::config::{Config, DescriptorConfig};
use coregate::error::RegistryError;
use coregate::orchestrator::{Orchestrator, ProjectSelection, Sources};
use coregate::output::{create_formatter, write_descriptor, ReportFormat};
use coregate::progress::Progress;
use coregate::registry::{DetailDocument, ReleaseHistory, ReleaseHistorySource};
use std::collections::HashMap;
use std::sync::Arc;

/// Release history documents keyed by project identifier
struct InMemorySource {
    documents: HashMap<String, String>,
}

impl InMemorySource {
    fn new(documents: &[(&str, &str)]) -> Self {
        Self {
            documents: documents
                .iter()
                .map(|(id, doc)| (id.to_string(), doc.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl ReleaseHistorySource for InMemorySource {
    fn source_name(&self) -> &'static str {
        "in-memory"
    }

    async fn fetch_document(&self, project_id: &str) -> Result<String, RegistryError> {
        self.documents
            .get(project_id)
            .cloned()
            .ok_or_else(|| RegistryError::not_found(project_id, "in-memory"))
    }
}

const WIDGET: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<project>
  <title>Widget</title>
  <short_name>widget</short_name>
  <type>project_module</type>
  <project_status>published</project_status>
  <supported_branches>1.0.</supported_branches>
  <link>https://www.drupal.org/project/widget</link>
  <releases>
    <release>
      <name>widget 1.0.1</name>
      <version>1.0.1</version>
      <status>published</status>
      <date>1700000300</date>
      <security covered="1">Covered by the security advisory policy</security>
      <core_compatibility>^1</core_compatibility>
      <terms><term><name>Release type</name><value>Security update</value></term></terms>
    </release>
    <release>
      <name>widget 1.0.0</name>
      <version>1.0.0</version>
      <status>published</status>
      <date>1700000200</date>
      <security covered="1">Covered by the security advisory policy</security>
      <core_compatibility>^1</core_compatibility>
      <terms><term><name>Release type</name><value>Insecure</value></term></terms>
    </release>
    <release>
      <name>widget 0.1.0</name>
      <version>0.1.0</version>
      <status>published</status>
      <date>1700000100</date>
      <security covered="1">Covered by the security advisory policy</security>
      <core_compatibility>^1</core_compatibility>
    </release>
  </releases>
</project>"#;

const ERROR_DOC: &str = "<error>No release history was found for the requested project (ghost).</error>";

fn orchestrator(documents: &[(&str, &str)]) -> Orchestrator {
    Orchestrator::new(Arc::new(InMemorySource::new(documents))).with_concurrency(4)
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn widget_history() -> ReleaseHistory {
    match ReleaseHistory::parse(WIDGET).unwrap() {
        DetailDocument::Found(history) => history,
        other => panic!("expected a project, got {:?}", other),
    }
}

mod conflict_workflows {
    use super::*;

    #[tokio::test]
    async fn test_unsupported_releases() {
        let conflicts = orchestrator(&[("widget", WIDGET)])
            .unsupported_conflicts(ids(&["widget"]))
            .await
            .unwrap();
        assert_eq!(conflicts.get("drupal/widget"), Some(&["0.1.0".to_string()][..]));
    }

    #[tokio::test]
    async fn test_insecure_window_ends_at_security_update() {
        let conflicts = orchestrator(&[("widget", WIDGET)])
            .insecure_conflicts(ids(&["widget"]))
            .await
            .unwrap();
        assert_eq!(
            conflicts.get("drupal/widget"),
            Some(&[">=1.0.0,<1.0.1".to_string()][..])
        );
    }

    #[test]
    fn test_insecure_release_covered_by_security_update() {
        let history = widget_history();
        let bounds = branch_bounds(&history, "drupal/widget");
        assert_eq!(bounds.len(), 1);
        assert_eq!(bounds[0].kind, BoundKind::SecurityUpdate);
        assert!(bounds
            .iter()
            .all(|b| b.kind != BoundKind::InsecureReplacement));
    }

    #[tokio::test]
    async fn test_core_incompatible_releases() {
        let target = CoreTarget::parse(">=2.0").unwrap();
        let conflicts = orchestrator(&[("widget", WIDGET)])
            .core_incompatible_conflicts(ids(&["widget"]), &target)
            .await
            .unwrap();
        assert_eq!(
            conflicts.get("drupal/widget"),
            Some(&["1.0.1".to_string(), "1.0.0".to_string(), "0.1.0".to_string()][..])
        );
    }

    #[tokio::test]
    async fn test_compatible_target_yields_no_conflicts() {
        let target = CoreTarget::parse("^1.5").unwrap();
        let conflicts = orchestrator(&[("widget", WIDGET)])
            .core_incompatible_conflicts(ids(&["widget"]), &target)
            .await
            .unwrap();
        assert!(conflicts.is_empty());
    }

    #[tokio::test]
    async fn test_error_document_is_skipped() {
        let conflicts = orchestrator(&[("widget", WIDGET), ("ghost", ERROR_DOC)])
            .unsupported_conflicts(ids(&["widget", "ghost"]))
            .await
            .unwrap();
        assert_eq!(conflicts.len(), 1);
        assert!(!conflicts.contains_package("drupal/ghost"));
    }

    #[tokio::test]
    async fn test_missing_project_aborts_the_batch() {
        let err = orchestrator(&[("widget", WIDGET)])
            .insecure_conflicts(ids(&["widget", "absent"]))
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("\"absent\""));
        assert!(message.contains("not found"));
    }
}

mod descriptor_output {
    use super::*;

    #[tokio::test]
    async fn test_descriptor_for_insecure_conflicts() {
        let conflicts = orchestrator(&[("widget", WIDGET)])
            .insecure_conflicts(ids(&["widget"]))
            .await
            .unwrap();

        let settings = DescriptorConfig {
            name: "acme/insecure".to_string(),
            description: Some("Insecure releases".to_string()),
            license: "GPL-2.0-or-later".to_string(),
        };
        let mut out = Vec::new();
        write_descriptor(&conflicts, &settings, &mut out).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["name"], "acme/insecure");
        assert_eq!(json["description"], "Insecure releases");
        assert_eq!(json["type"], "metapackage");
        assert_eq!(json["license"], "GPL-2.0-or-later");
        assert_eq!(json["conflict"]["drupal/widget"], ">=1.0.0,<1.0.1");
    }

    #[tokio::test]
    async fn test_descriptor_joins_constraints() {
        let target = CoreTarget::parse(">=2.0").unwrap();
        let conflicts = orchestrator(&[("widget", WIDGET)])
            .core_incompatible_conflicts(ids(&["widget"]), &target)
            .await
            .unwrap();

        let mut out = Vec::new();
        write_descriptor(&conflicts, &DescriptorConfig::default(), &mut out).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["conflict"]["drupal/widget"], "0.1.0|1.0.0|1.0.1");
    }
}

mod compatibility_report {
    use super::*;

    #[tokio::test]
    async fn test_incompatible_project() {
        let target = CoreTarget::parse(">=2.0").unwrap();
        let report = orchestrator(&[("widget", WIDGET)])
            .compatibility_report(ids(&["widget"]), &target)
            .await
            .unwrap();

        assert_eq!(report.totals.compatible, 0);
        assert_eq!(report.totals.incompatible, 1);
        assert!(report.earliest_compatible.is_none());
        let project = &report.projects[0];
        assert!(!project.is_compatible());
        assert_eq!(
            project.latest().map(|r| r.version.to_string()),
            Some("1.0.1".to_string())
        );
    }

    #[tokio::test]
    async fn test_compatible_project_and_rendering() {
        let target = CoreTarget::parse("^1").unwrap();
        let report = orchestrator(&[("widget", WIDGET)])
            .compatibility_report(ids(&["widget"]), &target)
            .await
            .unwrap();

        assert_eq!(report.totals.compatible, 1);
        assert_eq!(report.rate(), 100.0);
        let project = &report.projects[0];
        assert_eq!(
            project.first_compatible().map(|r| r.version.to_string()),
            Some("0.1.0".to_string())
        );

        let mut markdown = Vec::new();
        create_formatter(ReportFormat::Markdown, false)
            .format(&report, &mut markdown)
            .unwrap();
        let markdown = String::from_utf8(markdown).unwrap();
        assert!(markdown.contains("| Widget | drupal/widget | module | ✅ Compatible | 0.1.0 |"));

        let mut text = Vec::new();
        create_formatter(ReportFormat::Text, false)
            .format(&report, &mut text)
            .unwrap();
        let text = String::from_utf8(text).unwrap();
        assert!(text.contains("1 of 1 projects have a compatible stable release (100%)"));
    }
}

mod http_sources {
    use super::*;

    fn config_for(server: &mockito::Server) -> Config {
        let mut config = Config::default();
        config.sources.release_history_url = format!("{}/release-history/", server.url());
        config.sources.listing_url = format!("{}/api-d7/", server.url());
        config.http.max_retries = 0;
        config
    }

    #[tokio::test]
    async fn test_fetch_through_http() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/release-history/widget/current")
            .with_status(200)
            .with_header("content-type", "application/xml")
            .with_body(WIDGET)
            .create_async()
            .await;

        let sources = Sources::from_config(&config_for(&server)).unwrap();
        let ids = sources
            .project_ids(ProjectSelection::Explicit(ids(&["widget"])), &mut Progress::disabled())
            .await
            .unwrap();
        let source: Arc<dyn ReleaseHistorySource> = sources.release_history.clone();
        let conflicts = Orchestrator::new(source)
            .unsupported_conflicts(ids)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(conflicts.get("drupal/widget"), Some(&["0.1.0".to_string()][..]));
    }

    #[tokio::test]
    async fn test_project_list_is_filtered() {
        let mut server = mockito::Server::new_async().await;
        let body = r#"<?xml version="1.0" encoding="utf-8"?>
<projects>
  <project><title>Widget</title><short_name>widget</short_name><link>https://www.drupal.org/project/widget</link><type>project_module</type><project_status>published</project_status></project>
  <project><title>Draft</title><short_name>draft</short_name><link>https://www.drupal.org/sandbox/someone/1</link><type>project_module</type><project_status>published</project_status></project>
  <project><title>Gone</title><short_name>gone</short_name><link>https://www.drupal.org/project/gone</link><type>project_theme</type><project_status>unpublished</project_status></project>
  <project><title>Olivero</title><short_name>olivero</short_name><link>https://www.drupal.org/project/olivero</link><type>project_theme</type><project_status>published</project_status></project>
</projects>"#;
        let _mock = server
            .mock("GET", "/release-history/project-list/all")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let sources = Sources::from_config(&config_for(&server)).unwrap();
        let ids = sources
            .project_ids(ProjectSelection::ProjectList, &mut Progress::disabled())
            .await
            .unwrap();
        assert_eq!(ids, vec!["widget".to_string(), "olivero".to_string()]);
    }
}
