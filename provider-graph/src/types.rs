//! Microsoft Graph request and response types

use serde::{Deserialize, Serialize};

/// Entity types searched by default
pub const DEFAULT_ENTITY_TYPES: [&str; 4] = ["driveItem", "listItem", "site", "list"];

/// Number of hits requested per search
pub const DEFAULT_SEARCH_SIZE: u32 = 10;

/// Body of `POST /search/query`
///
/// See: https://learn.microsoft.com/graph/api/search-query
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub requests: Vec<SearchRequestEntry>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequestEntry {
    pub entity_types: Vec<String>,
    pub query: SearchQuery,
    pub from: u32,
    pub size: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub query_string: String,
}

impl SearchRequest {
    /// First page of results for `query` across the default entity types.
    pub fn for_query(query: impl Into<String>) -> Self {
        Self {
            requests: vec![SearchRequestEntry {
                entity_types: DEFAULT_ENTITY_TYPES.iter().map(|t| t.to_string()).collect(),
                query: SearchQuery {
                    query_string: query.into(),
                },
                from: 0,
                size: DEFAULT_SEARCH_SIZE,
            }],
        }
    }
}

/// Response of `POST /search/query`
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub value: Vec<SearchResponseEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponseEntry {
    #[serde(default)]
    pub hits_containers: Vec<HitsContainer>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HitsContainer {
    #[serde(default)]
    pub hits: Vec<SearchHit>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub more_results_available: bool,
}

/// A single hit. The resource shape depends on its `@odata.type`, so it is
/// kept as raw JSON.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    #[serde(default)]
    pub hit_id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub resource: serde_json::Value,
}

impl SearchResponse {
    /// Hit resources in response order, across all containers.
    pub fn into_resources(self) -> Vec<serde_json::Value> {
        self.value
            .into_iter()
            .flat_map(|entry| entry.hits_containers)
            .flat_map(|container| container.hits)
            .map(|hit| hit.resource)
            .collect()
    }
}

/// Site resource (`GET /sites/{id}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
}

/// Signed-in user (`GET /me`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub user_principal_name: Option<String>,
    #[serde(default)]
    pub mail: Option<String>,
}
