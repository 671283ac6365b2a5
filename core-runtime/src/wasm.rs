//! JavaScript bindings for logging and the event bus.

use crate::events::{CoreEvent, EventBus, Receiver};
use crate::logging::{init_logging, LoggingConfig};
use bridge_traits::time::LogLevel;
use wasm_bindgen::prelude::*;

fn to_js_error<E: std::fmt::Display>(err: E) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Initialize console logging.
///
/// `level` is one of "trace", "debug", "info", "warn", "error"; anything else
/// falls back to "info".
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging_js(level: &str) -> Result<(), JsValue> {
    let level = match level {
        "trace" => LogLevel::Trace,
        "debug" => LogLevel::Debug,
        "warn" => LogLevel::Warn,
        "error" => LogLevel::Error,
        _ => LogLevel::Info,
    };
    init_logging(LoggingConfig::default().with_level(level)).map_err(to_js_error)
}

/// Event subscription handed to JavaScript; events arrive as JSON strings.
#[wasm_bindgen]
pub struct JsEventReceiver {
    receiver: Receiver<CoreEvent>,
}

impl JsEventReceiver {
    pub fn from_bus(bus: &EventBus) -> Self {
        Self {
            receiver: bus.subscribe(),
        }
    }
}

#[wasm_bindgen]
impl JsEventReceiver {
    /// Wait for the next event
    pub async fn recv(&mut self) -> Result<String, JsValue> {
        let event = self.receiver.recv().await.map_err(to_js_error)?;
        serde_json::to_string(&event).map_err(to_js_error)
    }

    /// Returns `undefined` when no event is queued
    #[wasm_bindgen(js_name = tryRecv)]
    pub fn try_recv(&mut self) -> Option<String> {
        self.receiver
            .try_recv()
            .ok()
            .and_then(|event| serde_json::to_string(&event).ok())
    }
}
