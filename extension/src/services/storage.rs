// Settings persistence
// `chrome.storage.sync` in the browser, an in-memory map in tests

use async_trait::async_trait;

use crate::error::Result;
use crate::settings::Settings;

/// Key-value store holding the single settings record.
#[async_trait(?Send)]
pub trait SettingsStore {
    /// Raw record stored under `SETTINGS_KEY`, if any
    async fn read(&self) -> Result<Option<serde_json::Value>>;

    /// Replace the record stored under `SETTINGS_KEY`
    async fn write(&self, record: serde_json::Value) -> Result<()>;

    /// Load settings merged with the defaults
    async fn load(&self) -> Result<Settings> {
        Ok(Settings::from_stored(self.read().await?))
    }

    /// Overwrite the stored settings wholesale
    async fn save(&self, settings: &Settings) -> Result<()> {
        self.write(serde_json::to_value(settings)?).await
    }
}

#[cfg(target_arch = "wasm32")]
pub use chrome::ChromeSyncStore;

#[cfg(target_arch = "wasm32")]
mod chrome {
    use async_trait::async_trait;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;

    use super::SettingsStore;
    use crate::error::{ExtensionError, Result};
    use crate::platform::{from_js, js_error_message, to_js};
    use crate::settings::SETTINGS_KEY;

    #[wasm_bindgen]
    extern "C" {
        #[wasm_bindgen(js_namespace = ["chrome", "storage", "sync"], js_name = get, catch)]
        fn sync_get(keys: JsValue) -> std::result::Result<js_sys::Promise, JsValue>;

        #[wasm_bindgen(js_namespace = ["chrome", "storage", "sync"], js_name = set, catch)]
        fn sync_set(items: JsValue) -> std::result::Result<js_sys::Promise, JsValue>;
    }

    fn storage_error(err: JsValue) -> ExtensionError {
        ExtensionError::Storage(js_error_message(&err))
    }

    /// Settings record in `chrome.storage.sync`
    #[derive(Clone, Copy, Default)]
    pub struct ChromeSyncStore;

    impl ChromeSyncStore {
        pub fn new() -> Self {
            Self
        }
    }

    #[async_trait(?Send)]
    impl SettingsStore for ChromeSyncStore {
        async fn read(&self) -> Result<Option<serde_json::Value>> {
            let keys = js_sys::Array::new();
            keys.push(&SETTINGS_KEY.into());

            let result = JsFuture::from(sync_get(keys.into()).map_err(storage_error)?)
                .await
                .map_err(storage_error)?;

            let record = js_sys::Reflect::get(&result, &SETTINGS_KEY.into()).map_err(storage_error)?;
            if record.is_undefined() || record.is_null() {
                return Ok(None);
            }

            Ok(Some(from_js(record)?))
        }

        async fn write(&self, record: serde_json::Value) -> Result<()> {
            log::info!("Writing settings to sync storage...");

            let obj = js_sys::Object::new();
            js_sys::Reflect::set(&obj, &SETTINGS_KEY.into(), &to_js(&record)?).map_err(storage_error)?;

            JsFuture::from(sync_set(obj.into()).map_err(storage_error)?)
                .await
                .map_err(storage_error)?;
            log::info!("Settings stored successfully");

            Ok(())
        }
    }
}

#[cfg(test)]
pub(crate) use memory::MemoryStore;


#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ExplanationStyle;
    use serde_json::json;

    #[tokio::test]
    async fn test_load_without_record_returns_defaults() {
        let store = MemoryStore::new();
        assert_eq!(store.load().await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let store = MemoryStore::new();
        let settings = Settings {
            api_url: "X".to_string(),
            explanation_style: ExplanationStyle::Detailed,
            auto_hide: false,
            enable_caching: true,
        };

        store.save(&settings).await.unwrap();
        assert_eq!(store.load().await.unwrap(), settings);
        assert_eq!(
            store.record().unwrap(),
            json!({
                "apiUrl": "X",
                "explanationStyle": "detailed",
                "autoHide": false,
                "enableCaching": true
            })
        );
    }

    #[tokio::test]
    async fn test_failing_store_propagates_error() {
        let store = MemoryStore::failing();
        assert!(store.load().await.is_err());
        assert!(store.save(&Settings::default()).await.is_err());
    }
}
