// Background service worker for Explaina
// Minimal: no Dioxus, only chrome.runtime listeners feeding the router
// All routing logic lives in `router`, this file is glue to the Chrome APIs

use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::platform::{runtime, to_js};
use crate::router::{BackgroundRouter, Request};
use crate::services::storage::ChromeSyncStore;

/// Register every background listener. Called once from the worker's JS glue.
pub fn init_background() {
    let router = Rc::new(BackgroundRouter::new(ChromeSyncStore::new()));

    let installer = Rc::clone(&router);
    runtime::on_installed(move |reason| match reason.as_str() {
        "install" => {
            log::info!("Explaina extension installed");
            let router = Rc::clone(&installer);
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = router.install_defaults().await {
                    log::error!("Failed to store default settings: {}", e);
                }
            });
        }
        "update" => log::info!("Explaina extension updated"),
        other => log::info!("Explaina onInstalled: {}", other),
    });

    runtime::on_message(Box::new(move |message: JsValue, _sender: JsValue, send_response: js_sys::Function| {
        let request = match crate::platform::from_js(message) {
            Ok(value) => Request::parse(&value),
            Err(e) => Request::Unknown(format!("undecodable message ({})", e)),
        };

        if !request.expects_reply() {
            let router = Rc::clone(&router);
            wasm_bindgen_futures::spawn_local(async move {
                router.handle(request).await;
            });
            return false;
        }

        // Reply asynchronously; returning true keeps the channel open
        let router = Rc::clone(&router);
        wasm_bindgen_futures::spawn_local(async move {
            let Some(reply) = router.handle(request).await else {
                return;
            };
            match to_js(&reply) {
                Ok(value) => {
                    if let Err(e) = send_response.call1(&JsValue::UNDEFINED, &value) {
                        log::error!("Failed to send response: {:?}", e);
                    }
                }
                Err(e) => log::error!("Failed to serialize reply: {}", e),
            }
        });
        true
    }));

    runtime::on_startup(|| log::info!("Explaina extension started"));
    runtime::on_suspend(|| log::info!("Explaina extension suspended"));

    log::info!("Explaina background service initialized (Rust core)");
}
