//! Document repository trait and its Microsoft Graph implementation

use bridge_traits::platform::PlatformSendSync;
use provider_graph::{GraphClient, SiteInfo};
use serde_json::Value;

use crate::error::Result;

/// Read access to SharePoint content
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait DocumentRepository: PlatformSendSync {
    /// Succeeds when the signed-in user can reach the resource API.
    async fn check_access(&self) -> Result<()>;

    /// Search hit resources, most relevant first.
    async fn search(&self, query: &str) -> Result<Vec<Value>>;

    /// Text content of a drive item
    async fn document_content(&self, drive_id: &str, item_id: &str) -> Result<String>;

    async fn site(&self, site_id: &str) -> Result<SiteInfo>;
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl DocumentRepository for GraphClient {
    async fn check_access(&self) -> Result<()> {
        self.fetch_me().await?;
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<Value>> {
        Ok(GraphClient::search(self, query).await?)
    }

    async fn document_content(&self, drive_id: &str, item_id: &str) -> Result<String> {
        Ok(GraphClient::document_content(self, drive_id, item_id).await?)
    }

    async fn site(&self, site_id: &str) -> Result<SiteInfo> {
        Ok(GraphClient::site(self, site_id).await?)
    }
}
