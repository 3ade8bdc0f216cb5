// Browser glue: JsValue conversions, chrome.runtime bindings, DOM listeners

pub mod events;
pub mod runtime;

use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::error::{ExtensionError, Result};

/// Serialize into a plain JS object (not a `Map`), as the chrome APIs expect
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| ExtensionError::InvalidResponse(e.to_string()))
}

pub fn from_js(value: JsValue) -> Result<serde_json::Value> {
    serde_wasm_bindgen::from_value(value).map_err(|e| ExtensionError::InvalidResponse(e.to_string()))
}

/// Best-effort human readable text of a thrown JS value
pub fn js_error_message(err: &JsValue) -> String {
    if let Some(error) = err.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}
