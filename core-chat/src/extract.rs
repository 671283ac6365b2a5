//! Content extraction from search hits.
//!
//! Turns the top search hits into a plain-text block for the prompt. Each
//! hit is handled on its own: a failed download or a malformed resource
//! becomes a placeholder line and never aborts the batch.

use serde_json::Value;
use tracing::{debug, warn};

use crate::repository::DocumentRepository;

/// Number of hits whose content goes into the prompt
pub const MAX_EXTRACTED_ITEMS: usize = 3;

pub const DRIVE_ITEM_TYPE: &str = "#microsoft.graph.driveItem";
pub const SITE_TYPE: &str = "#microsoft.graph.site";

pub const NO_CONTENT_EXTRACTED: &str = "No detailed content could be extracted.";

/// Concatenated content of the top hits.
pub async fn extract_relevant_content(
    repository: &dyn DocumentRepository,
    hits: &[Value],
) -> String {
    let mut extracted = String::new();

    for resource in hits.iter().take(MAX_EXTRACTED_ITEMS) {
        if resource.is_null() {
            debug!("Search hit without a resource");
            continue;
        }
        extracted.push_str(&extract_item(repository, resource).await);
    }

    if extracted.is_empty() {
        NO_CONTENT_EXTRACTED.to_string()
    } else {
        extracted
    }
}

async fn extract_item(repository: &dyn DocumentRepository, resource: &Value) -> String {
    let Some(fields) = resource.as_object() else {
        warn!("Search hit resource is not an object");
        return "Error extracting content for an item.\n\n".to_string();
    };

    let name = |fallback: &'static str| {
        text_field(resource, "name")
            .unwrap_or(fallback)
            .to_string()
    };

    match fields.get("@odata.type").and_then(Value::as_str) {
        Some(DRIVE_ITEM_TYPE) => {
            let name = name("Unnamed document");
            let drive_id = resource
                .pointer("/parentReference/driveId")
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty());
            let content = match (drive_id, text_field(resource, "id")) {
                (Some(drive_id), Some(item_id)) => {
                    match repository.document_content(drive_id, item_id).await {
                        Ok(content) => content,
                        Err(e) => {
                            warn!(error = %e, item_id, "Failed to fetch document content");
                            "Could not retrieve content.".to_string()
                        }
                    }
                }
                _ => "Missing reference information.".to_string(),
            };
            format!("Document: {}\n{}\n\n", name, content)
        }
        Some(SITE_TYPE) => match text_field(resource, "id") {
            Some(site_id) => match repository.site(site_id).await {
                Ok(site) => format!(
                    "Site: {}\nDescription: {}\n\n",
                    non_empty(site.display_name).unwrap_or_else(|| "Unnamed site".to_string()),
                    non_empty(site.description).unwrap_or_else(|| "No description".to_string()),
                ),
                Err(e) => {
                    warn!(error = %e, site_id, "Failed to fetch site");
                    format!(
                        "Site: {}\nCould not retrieve site information.\n\n",
                        name("Unnamed site")
                    )
                }
            },
            None => format!("Site: {}\nMissing ID information.\n\n", name("Unnamed site")),
        },
        _ => {
            let mut item = format!("Item: {}\n", name("Unnamed item"));
            match text_field(resource, "description") {
                Some(description) => item.push_str(&format!("Description: {}\n\n", description)),
                None => item.push_str("No description available.\n\n"),
            }
            item
        }
    }
}

fn text_field<'a>(resource: &'a Value, key: &str) -> Option<&'a str> {
    resource
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::error::{ChatError, Result};
    use async_trait::async_trait;
    use mockall::mock;
    use provider_graph::SiteInfo;
    use serde_json::json;

    mock! {
        Repository {}

        #[async_trait]
        impl DocumentRepository for Repository {
            async fn check_access(&self) -> Result<()>;
            async fn search(&self, query: &str) -> Result<Vec<Value>>;
            async fn document_content(&self, drive_id: &str, item_id: &str) -> Result<String>;
            async fn site(&self, site_id: &str) -> Result<SiteInfo>;
        }
    }

    fn site_info(display_name: Option<&str>, description: Option<&str>) -> SiteInfo {
        SiteInfo {
            id: "site-1".to_string(),
            name: None,
            display_name: display_name.map(str::to_string),
            description: description.map(str::to_string),
            web_url: None,
        }
    }

    #[tokio::test]
    async fn documents_include_downloaded_content() {
        let mut repository = MockRepository::new();
        repository
            .expect_document_content()
            .withf(|drive, item| drive == "drive-1" && item == "item-1")
            .times(1)
            .returning(|_, _| Ok("Revenue grew 12%.".to_string()));

        let hits = vec![json!({
            "@odata.type": "#microsoft.graph.driveItem",
            "id": "item-1",
            "name": "Report.docx",
            "parentReference": { "driveId": "drive-1" }
        })];

        assert_eq!(
            extract_relevant_content(&repository, &hits).await,
            "Document: Report.docx\nRevenue grew 12%.\n\n"
        );
    }

    #[tokio::test]
    async fn document_placeholders() {
        let mut repository = MockRepository::new();
        repository
            .expect_document_content()
            .times(1)
            .returning(|_, _| Err(ChatError::Repository("404".into())));

        let hits = vec![
            json!({
                "@odata.type": "#microsoft.graph.driveItem",
                "id": "item-1",
                "parentReference": { "driveId": "drive-1" }
            }),
            json!({ "@odata.type": "#microsoft.graph.driveItem", "name": "Orphan.txt" }),
        ];

        assert_eq!(
            extract_relevant_content(&repository, &hits).await,
            "Document: Unnamed document\nCould not retrieve content.\n\n\
             Document: Orphan.txt\nMissing reference information.\n\n"
        );
    }

    #[tokio::test]
    async fn sites_use_fetched_metadata() {
        let mut repository = MockRepository::new();
        repository
            .expect_site()
            .withf(|id| id == "site-1")
            .times(1)
            .returning(|_| Ok(site_info(Some("Finance"), None)));
        repository
            .expect_site()
            .withf(|id| id == "site-2")
            .times(1)
            .returning(|_| Err(ChatError::Repository("403".into())));

        let hits = vec![
            json!({ "@odata.type": "#microsoft.graph.site", "id": "site-1" }),
            json!({ "@odata.type": "#microsoft.graph.site", "id": "site-2", "name": "hr" }),
            json!({ "@odata.type": "#microsoft.graph.site" }),
        ];

        assert_eq!(
            extract_relevant_content(&repository, &hits).await,
            "Site: Finance\nDescription: No description\n\n\
             Site: hr\nCould not retrieve site information.\n\n\
             Site: Unnamed site\nMissing ID information.\n\n"
        );
    }

    #[tokio::test]
    async fn other_items_and_malformed_hits() {
        let repository = MockRepository::new();
        let hits = vec![
            json!({ "@odata.type": "#microsoft.graph.listItem", "name": "Q3", "description": "Plan" }),
            json!("not an object"),
            json!({ "@odata.type": "#microsoft.graph.list" }),
        ];

        assert_eq!(
            extract_relevant_content(&repository, &hits).await,
            "Item: Q3\nDescription: Plan\n\n\
             Error extracting content for an item.\n\n\
             Item: Unnamed item\nNo description available.\n\n"
        );
    }

    #[tokio::test]
    async fn only_top_hits_are_extracted() {
        let repository = MockRepository::new();
        let hits: Vec<Value> = (0..5).map(|i| json!({ "name": format!("item-{}", i) })).collect();

        let content = extract_relevant_content(&repository, &hits).await;
        assert!(content.contains("item-2"));
        assert!(!content.contains("item-3"));
    }

    #[tokio::test]
    async fn nothing_extracted() {
        let repository = MockRepository::new();
        assert_eq!(
            extract_relevant_content(&repository, &[Value::Null]).await,
            NO_CONTENT_EXTRACTED
        );
    }
}
