//! JavaScript bindings for the chat service.
//!
//! Values that cross the boundary as structured data (session snapshots,
//! replies, diagnostics) are handed over as JSON strings.

use bridge_wasm::build_wasm_bridges;
use core_runtime::config::AppConfig;
use core_runtime::wasm::JsEventReceiver;
use wasm_bindgen::prelude::*;

use crate::{CoreDependencies, CoreService};

fn to_js_error<E: std::fmt::Display>(err: E) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
pub struct JsChatService {
    core: CoreService,
}

#[wasm_bindgen]
impl JsChatService {
    /// Build the browser bridges and start the session.
    pub async fn create(
        client_id: String,
        tenant_id: String,
        model_api_key: String,
    ) -> Result<JsChatService, JsValue> {
        let config = AppConfig::builder()
            .client_id(client_id)
            .tenant_id(tenant_id)
            .model_api_key(model_api_key)
            .build()
            .map_err(to_js_error)?;
        let deps = CoreDependencies::from(build_wasm_bridges().map_err(to_js_error)?);
        let core = CoreService::bootstrap(config, deps)
            .await
            .map_err(to_js_error)?;
        Ok(JsChatService { core })
    }

    /// Current session snapshot as JSON.
    pub fn session(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.core.session().snapshot()).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = displayName)]
    pub fn display_name(&self) -> String {
        self.core.display_name()
    }

    #[wasm_bindgen(js_name = signIn)]
    pub async fn sign_in(&self) {
        self.core.session().sign_in().await
    }

    #[wasm_bindgen(js_name = signOut)]
    pub async fn sign_out(&self) {
        self.core.session().sign_out().await
    }

    pub async fn reset(&self) {
        self.core.session().reset().await
    }

    #[wasm_bindgen(js_name = forceLogin)]
    pub async fn force_login(&self) {
        self.core.session().force_login().await
    }

    #[wasm_bindgen(js_name = tryRedirect)]
    pub async fn try_redirect(&self) {
        self.core.session().try_redirect().await
    }

    /// Answer a question; resolves to the reply as JSON.
    pub async fn ask(&self, query: String) -> Result<String, JsValue> {
        let reply = self.core.ask(&query).await;
        serde_json::to_string(&reply).map_err(to_js_error)
    }

    /// Photo bytes, or `undefined` when the user has none.
    #[wasm_bindgen(js_name = userPhoto)]
    pub async fn user_photo(&self) -> Result<Option<Vec<u8>>, JsValue> {
        let photo = self.core.user_photo().await.map_err(to_js_error)?;
        Ok(photo.map(|bytes| bytes.to_vec()))
    }

    pub async fn diagnostics(&self) -> Result<String, JsValue> {
        self.core
            .diagnostics()
            .await
            .to_json()
            .map_err(to_js_error)
    }

    pub fn events(&self) -> JsEventReceiver {
        JsEventReceiver::from_bus(self.core.events())
    }

    pub fn teardown(&self) {
        self.core.session().teardown()
    }
}
