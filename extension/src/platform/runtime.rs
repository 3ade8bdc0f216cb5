// chrome.runtime bindings: messaging and lifecycle events

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use super::{from_js, js_error_message, to_js};
use crate::error::{ExtensionError, Result};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["chrome", "runtime"], js_name = sendMessage, catch)]
    fn send_message_raw(message: &JsValue) -> std::result::Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "runtime", "onMessage"], js_name = addListener)]
    fn add_message_listener(callback: &js_sys::Function);

    #[wasm_bindgen(js_namespace = ["chrome", "runtime", "onInstalled"], js_name = addListener)]
    fn add_installed_listener(callback: &js_sys::Function);

    #[wasm_bindgen(js_namespace = ["chrome", "runtime", "onStartup"], js_name = addListener)]
    fn add_startup_listener(callback: &js_sys::Function);

    #[wasm_bindgen(js_namespace = ["chrome", "runtime", "onSuspend"], js_name = addListener)]
    fn add_suspend_listener(callback: &js_sys::Function);
}

fn messaging_error(err: JsValue) -> ExtensionError {
    ExtensionError::Messaging(js_error_message(&err))
}

/// Send `message` to the background worker and wait for its reply
pub async fn send_message<T: serde::Serialize + ?Sized>(message: &T) -> Result<serde_json::Value> {
    let promise = send_message_raw(&to_js(message)?).map_err(messaging_error)?;
    let reply = JsFuture::from(promise).await.map_err(messaging_error)?;

    if reply.is_undefined() {
        return Err(ExtensionError::Messaging("No reply from background".to_string()));
    }
    from_js(reply)
}

/// `(message, sender, sendResponse) -> keepChannelOpen`
pub type MessageHandler = dyn FnMut(JsValue, JsValue, js_sys::Function) -> bool;

/// Listeners registered here live as long as the worker, so the closures are leaked
pub fn on_message(handler: Box<MessageHandler>) {
    let callback = Closure::wrap(handler);
    add_message_listener(callback.as_ref().unchecked_ref());
    callback.forget();
}

/// Install/update notification; the handler receives `details.reason`
pub fn on_installed(mut handler: impl FnMut(String) + 'static) {
    let callback = Closure::wrap(Box::new(move |details: JsValue| {
        let reason = js_sys::Reflect::get(&details, &"reason".into())
            .ok()
            .and_then(|r| r.as_string())
            .unwrap_or_default();
        handler(reason);
    }) as Box<dyn FnMut(JsValue)>);
    add_installed_listener(callback.as_ref().unchecked_ref());
    callback.forget();
}

pub fn on_startup(handler: impl FnMut() + 'static) {
    let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut()>);
    add_startup_listener(callback.as_ref().unchecked_ref());
    callback.forget();
}

pub fn on_suspend(handler: impl FnMut() + 'static) {
    let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut()>);
    add_suspend_listener(callback.as_ref().unchecked_ref());
    callback.forget();
}
