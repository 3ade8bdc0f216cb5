//! Explaina browser extension.
//!
//! One wasm module serves all three extension contexts; the JS loader of each
//! context calls its `start_*` export:
//!
//! - `start_background()`: service worker, settings + message routing
//! - `start_content_script()`: selection button and explanation tooltip
//! - `start_popup()`: settings form (Dioxus)
//!
//! Everything above the browser APIs is platform independent and tested
//! natively; the browser glue only compiles for `wasm32`.

pub mod error;
pub mod popup;
pub mod router;
pub mod selection;
pub mod services;
pub mod session;
pub mod settings;

#[cfg(target_arch = "wasm32")]
mod background;
#[cfg(target_arch = "wasm32")]
mod components;
#[cfg(target_arch = "wasm32")]
mod content;
#[cfg(target_arch = "wasm32")]
mod platform;

pub use error::{ExtensionError, Result};
pub use settings::{ExplanationStyle, Settings};

#[cfg(target_arch = "wasm32")]
mod entry {
    use wasm_bindgen::prelude::*;

    fn init_logging() {
        console_error_panic_hook::set_once();
        wasm_logger::init(wasm_logger::Config::default());
    }

    #[wasm_bindgen]
    pub fn start_background() {
        init_logging();
        crate::background::init_background();
    }

    #[wasm_bindgen]
    pub fn start_content_script() {
        init_logging();
        if let Err(e) = crate::content::install() {
            log::error!("Explaina content script failed to start: {}", e);
        }
    }

    #[wasm_bindgen]
    pub fn start_popup() {
        init_logging();
        log::info!("Explaina popup starting...");
        dioxus::launch(crate::components::Popup);
    }
}
