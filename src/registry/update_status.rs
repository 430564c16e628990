//! Release history service adapter
//!
//! Serves two feeds:
//! - `{project}/current`: the per-project release history document
//! - `project-list/all`: every known project, streamed node by node

use super::client::HttpClient;
use super::document::{DetailDocument, ReleaseHistory};
use super::node_stream::{response_chunks, split_nodes};
use super::ReleaseHistorySource;
use crate::error::{FetchError, RegistryError};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, warn};

const SOURCE_NAME: &str = "release history";

const ACCEPT_XML: &str = "application/xml";

/// Project types the package repository publishes
const PUBLISHED_TYPES: [&str; 3] = ["project_module", "project_theme", "project_core"];

/// Adapter for the release history XML service
pub struct UpdateStatusSource {
    client: HttpClient,
    base_url: String,
}

impl UpdateStatusSource {
    /// Create an adapter for the given base URL
    pub fn new(client: HttpClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Short names of every published, non-sandbox project
    ///
    /// The list is streamed; nodes that fail to parse are logged and skipped.
    pub async fn project_ids(&self) -> Result<Vec<String>, FetchError> {
        let url = format!("{}/project-list/all", self.base_url);
        let response = self
            .client
            .get(&url, ACCEPT_XML, "project-list/all", SOURCE_NAME)
            .await
            .map_err(|e| FetchError::Catalog(e.to_string()))?;

        let chunks = Box::pin(response_chunks(
            response,
            "project-list/all".to_string(),
            SOURCE_NAME,
        ));
        let nodes = split_nodes(chunks, "project");
        futures::pin_mut!(nodes);

        let mut ids = Vec::new();
        while let Some(node) = nodes.next().await {
            let node = node.map_err(|e| FetchError::Catalog(e.to_string()))?;
            match ReleaseHistory::parse(&node) {
                Ok(DetailDocument::Found(project)) => {
                    if is_catalog_project(&project) {
                        ids.push(project.short_name);
                    }
                }
                Ok(DetailDocument::Missing(_)) => {}
                Err(e) => warn!(error = %e, "skipping unreadable project list node"),
            }
        }

        debug!(count = ids.len(), "read project list");
        Ok(ids)
    }
}

fn is_catalog_project(project: &ReleaseHistory) -> bool {
    project.is_published()
        && PUBLISHED_TYPES.contains(&project.project_type.as_str())
        && !project.link.contains("sandbox")
}

#[async_trait]
impl ReleaseHistorySource for UpdateStatusSource {
    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn fetch_document(&self, project_id: &str) -> Result<String, RegistryError> {
        let url = format!("{}/{}/current", self.base_url, project_id);
        self.client
            .get_text(&url, ACCEPT_XML, project_id, SOURCE_NAME)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use mockito::Server;

    const PROJECT_LIST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<projects xmlns:dc="http://purl.org/dc/elements/1.1/">
<project><title>Token</title><short_name>token</short_name><type>project_module</type>
<link>https://www.drupal.org/project/token</link><project_status>published</project_status></project>
<project><title>Olivero</title><short_name>olivero</short_name><type>project_theme</type>
<link>https://www.drupal.org/project/olivero</link><project_status>published</project_status></project>
<project><title>Old</title><short_name>old</short_name><type>project_module</type>
<link>https://www.drupal.org/project/old</link><project_status>unpublished</project_status></project>
<project><title>Sandbox</title><short_name>3012345</short_name><type>project_module</type>
<link>https://www.drupal.org/sandbox/someone/3012345</link><project_status>published</project_status></project>
<project><title>Commerce Kickstart</title><short_name>commerce_kickstart</short_name><type>project_distribution</type>
<link>https://www.drupal.org/project/commerce_kickstart</link><project_status>published</project_status></project>
<project><title>Drupal core</title><short_name>drupal</short_name><type>project_core</type>
<link>https://www.drupal.org/project/drupal</link><project_status>published</project_status></project>
</projects>"#;

    fn source(server: &Server) -> UpdateStatusSource {
        let client = HttpClient::from_config(&HttpConfig::default())
            .unwrap()
            .with_max_retries(0);
        UpdateStatusSource::new(client, &format!("{}/", server.url()))
    }

    #[tokio::test]
    async fn test_project_ids_filters_catalog() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/project-list/all")
            .with_status(200)
            .with_header("content-type", "application/xml")
            .with_body(PROJECT_LIST)
            .create_async()
            .await;

        let ids = source(&server).project_ids().await.unwrap();

        mock.assert_async().await;
        assert_eq!(ids, vec!["token", "olivero", "drupal"]);
    }

    #[tokio::test]
    async fn test_project_ids_failure() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/project-list/all")
            .with_status(403)
            .create_async()
            .await;

        let result = source(&server).project_ids().await;
        assert!(matches!(result, Err(FetchError::Catalog(_))));
    }

    #[tokio::test]
    async fn test_fetch_document() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/token/current")
            .with_status(200)
            .with_body("<project><short_name>token</short_name></project>")
            .create_async()
            .await;

        let body = source(&server).fetch_document("token").await.unwrap();

        mock.assert_async().await;
        assert!(body.contains("<short_name>token</short_name>"));
    }
}
