//! Paginated project listing adapter
//!
//! The listing endpoint returns one JSON page per request together with a
//! `last` link. The page count is read from that link's `page` parameter
//! and the remaining pages are fetched through the worker pool.

use super::client::HttpClient;
use crate::error::{ConfigError, FetchError, RegistryError};
use crate::config::DEFAULT_CONCURRENCY;
use crate::fetch::for_each_pooled;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;
use url::Url;

const SOURCE_NAME: &str = "project listing";

/// Development status "obsolete"
pub const OBSOLETE: TaxonomyFilter = TaxonomyFilter {
    vocabulary_id: 46,
    term_id: 9994,
};

/// Maintenance status "unsupported"
pub const UNSUPPORTED: TaxonomyFilter = TaxonomyFilter {
    vocabulary_id: 44,
    term_id: 13032,
};

/// Project node types exposed by the package repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingType {
    Module,
    Theme,
    Core,
}

impl ListingType {
    pub fn all() -> &'static [ListingType] {
        &[ListingType::Module, ListingType::Theme, ListingType::Core]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ListingType::Module => "project_module",
            ListingType::Theme => "project_theme",
            ListingType::Core => "project_core",
        }
    }
}

/// A taxonomy term a listing can be narrowed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxonomyFilter {
    pub vocabulary_id: u32,
    pub term_id: u32,
}

/// Query options of the listing endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingFilter {
    type_filter: Vec<ListingType>,
    taxonomy_filter: Option<TaxonomyFilter>,
    page_index: u32,
}

impl ListingFilter {
    /// Build a filter; at least one project type is required
    pub fn new(
        type_filter: Vec<ListingType>,
        taxonomy_filter: Option<TaxonomyFilter>,
        page_index: u32,
    ) -> Result<Self, ConfigError> {
        if type_filter.is_empty() {
            return Err(ConfigError::InvalidListingFilter {
                message: "at least one project type is required".to_string(),
            });
        }
        let mut types = Vec::with_capacity(type_filter.len());
        for t in type_filter {
            if !types.contains(&t) {
                types.push(t);
            }
        }
        Ok(Self {
            type_filter: types,
            taxonomy_filter,
            page_index,
        })
    }

    /// Every project type, no taxonomy, first page
    pub fn all_projects() -> Self {
        Self {
            type_filter: ListingType::all().to_vec(),
            taxonomy_filter: None,
            page_index: 0,
        }
    }

    /// Every project type tagged with the given term
    pub fn tagged(taxonomy: TaxonomyFilter) -> Self {
        Self {
            taxonomy_filter: Some(taxonomy),
            ..Self::all_projects()
        }
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    fn with_page(&self, page_index: u32) -> Self {
        Self {
            page_index,
            ..self.clone()
        }
    }

    fn url(&self, base: &Url) -> Result<Url, url::ParseError> {
        let mut url = base.join("node.json")?;
        {
            let mut query = url.query_pairs_mut();
            for t in &self.type_filter {
                query.append_pair("type[]", t.as_str());
            }
            query
                .append_pair("field_project_has_releases", "1")
                .append_pair("field_project_type", "full")
                .append_pair("sort", "field_project_machine_name")
                .append_pair("page", &self.page_index.to_string());
            if let Some(taxonomy) = &self.taxonomy_filter {
                query.append_pair(
                    &format!("taxonomy_vocabulary_{}", taxonomy.vocabulary_id),
                    &taxonomy.term_id.to_string(),
                );
            }
        }
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
struct ListingPage {
    #[serde(default)]
    list: Vec<ListingItem>,
    last: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListingItem {
    field_project_machine_name: Option<String>,
}

impl ListingPage {
    fn names(self) -> Vec<String> {
        self.list
            .into_iter()
            .filter_map(|item| item.field_project_machine_name)
            .collect()
    }
}

/// Read the page index from a `last` link
fn last_page(link: &str) -> Option<u32> {
    let url = Url::parse(link).ok()?;
    let page = url
        .query_pairs()
        .find(|(key, _)| key == "page")
        .map(|(_, value)| value.into_owned())?;
    page.parse().ok()
}

/// Adapter for the paginated listing endpoint
pub struct ListingSource {
    client: HttpClient,
    base_url: Url,
    concurrency: usize,
}

impl ListingSource {
    /// Create an adapter for the given base URL
    pub fn new(client: HttpClient, base_url: &str) -> Result<Self, ConfigError> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized).map_err(|e| ConfigError::InvalidValue {
            key: "sources.listing_url",
            message: e.to_string(),
        })?;
        Ok(Self {
            client,
            base_url,
            concurrency: DEFAULT_CONCURRENCY,
        })
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    async fn fetch_page(&self, filter: &ListingFilter) -> Result<ListingPage, RegistryError> {
        let resource = format!("page {}", filter.page_index);
        let url = filter.url(&self.base_url).map_err(|e| {
            RegistryError::invalid_response(&resource, SOURCE_NAME, e.to_string())
        })?;
        self.client
            .get_json(url.as_str(), &resource, SOURCE_NAME)
            .await
    }

    /// Machine names of every project matching the filter, in page order
    pub async fn project_names(&self, filter: &ListingFilter) -> Result<Vec<String>, FetchError> {
        let first = self
            .fetch_page(filter)
            .await
            .map_err(|source| FetchError::Page {
                page: filter.page_index,
                source,
            })?;

        let last = first.last.as_deref().and_then(last_page);
        let mut pages: BTreeMap<u32, Vec<String>> = BTreeMap::new();
        pages.insert(filter.page_index, first.names());

        if let Some(last) = last {
            debug!(first = filter.page_index, last, "fetching remaining listing pages");
            for_each_pooled(
                (filter.page_index + 1)..=last,
                self.concurrency,
                |page| async move {
                    match self.fetch_page(&filter.with_page(page)).await {
                        Ok(body) => Ok((page, body)),
                        Err(source) => Err(FetchError::Page { page, source }),
                    }
                },
                |page, body| {
                    pages.insert(page, body.names());
                    Ok(())
                },
            )
            .await?;
        }

        Ok(pages.into_values().flatten().collect())
    }

    /// Projects marked obsolete or unsupported
    pub async fn abandoned_project_names(&self) -> Result<Vec<String>, FetchError> {
        let obsolete = self
            .project_names(&ListingFilter::tagged(OBSOLETE))
            .await?;
        let unsupported = self
            .project_names(&ListingFilter::tagged(UNSUPPORTED))
            .await?;

        // First occurrence wins so the listing order survives
        let mut seen = HashSet::new();
        Ok(obsolete
            .into_iter()
            .chain(unsupported)
            .filter(|name| seen.insert(name.clone()))
            .collect())
    }
}
