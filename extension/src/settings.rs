// User settings shared by the background worker, the popup and the content
// script. Stored as one record under `SETTINGS_KEY`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Key of the settings record in the synchronized store.
pub const SETTINGS_KEY: &str = "explainaSettings";

pub const DEFAULT_API_URL: &str = "http://localhost:8000/explain";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplanationStyle {
    #[default]
    Simple,
    Technical,
    Detailed,
}

impl ExplanationStyle {
    pub const ALL: [ExplanationStyle; 3] = [
        ExplanationStyle::Simple,
        ExplanationStyle::Technical,
        ExplanationStyle::Detailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExplanationStyle::Simple => "simple",
            ExplanationStyle::Technical => "technical",
            ExplanationStyle::Detailed => "detailed",
        }
    }

    /// Label shown in the popup's style selector
    pub fn label(&self) -> &'static str {
        match self {
            ExplanationStyle::Simple => "Simple",
            ExplanationStyle::Technical => "Technical",
            ExplanationStyle::Detailed => "Detailed",
        }
    }
}

impl fmt::Display for ExplanationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExplanationStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple" => Ok(ExplanationStyle::Simple),
            "technical" => Ok(ExplanationStyle::Technical),
            "detailed" => Ok(ExplanationStyle::Detailed),
            other => Err(format!("Unknown explanation style: {}", other)),
        }
    }
}

/// The persisted settings record.
///
/// Fields missing from a stored record take their default value, so older or
/// hand-edited records still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub api_url: String,
    pub explanation_style: ExplanationStyle,
    pub auto_hide: bool,
    /// Stored and editable, not consulted anywhere yet.
    pub enable_caching: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            explanation_style: ExplanationStyle::Simple,
            auto_hide: true,
            enable_caching: false,
        }
    }
}

fn merge_field<T: DeserializeOwned>(slot: &mut T, key: &str, value: serde_json::Value) {
    match serde_json::from_value(value) {
        Ok(decoded) => *slot = decoded,
        Err(e) => log::warn!("Ignoring stored {}, keeping default: {}", key, e),
    }
}

/// A single edit coming from one popup form field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldChange {
    ApiUrl(String),
    Style(String),
    AutoHide(bool),
    EnableCaching(bool),
}

impl Settings {
    /// Merge a stored record over the defaults, field by field. Fields that
    /// are missing or fail to decode keep their default value.
    pub fn from_stored(stored: Option<serde_json::Value>) -> Self {
        let mut settings = Self::default();
        let record = match stored {
            None | Some(serde_json::Value::Null) => return settings,
            Some(serde_json::Value::Object(record)) => record,
            Some(other) => {
                log::warn!("Stored settings are not an object, using defaults: {}", other);
                return settings;
            }
        };

        for (key, value) in record {
            match key.as_str() {
                "apiUrl" => merge_field(&mut settings.api_url, &key, value),
                "explanationStyle" => merge_field(&mut settings.explanation_style, &key, value),
                "autoHide" => merge_field(&mut settings.auto_hide, &key, value),
                "enableCaching" => merge_field(&mut settings.enable_caching, &key, value),
                _ => {}
            }
        }
        settings
    }

    pub fn apply(&mut self, change: FieldChange) {
        match change {
            FieldChange::ApiUrl(url) => self.api_url = url,
            FieldChange::Style(style) => match style.parse() {
                Ok(style) => self.explanation_style = style,
                Err(e) => log::warn!("{}", e),
            },
            FieldChange::AutoHide(on) => self.auto_hide = on,
            FieldChange::EnableCaching(on) => self.enable_caching = on,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.api_url, "http://localhost:8000/explain");
        assert_eq!(settings.explanation_style, ExplanationStyle::Simple);
        assert!(settings.auto_hide);
        assert!(!settings.enable_caching);
    }

    #[test]
    fn test_serializes_camel_case() {
        let value = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "apiUrl": "http://localhost:8000/explain",
                "explanationStyle": "simple",
                "autoHide": true,
                "enableCaching": false
            })
        );
    }

    #[test]
    fn test_missing_record_yields_defaults() {
        assert_eq!(Settings::from_stored(None), Settings::default());
        assert_eq!(
            Settings::from_stored(Some(serde_json::Value::Null)),
            Settings::default()
        );
    }

    #[test]
    fn test_partial_record_merges_with_defaults() {
        let settings = Settings::from_stored(Some(json!({ "apiUrl": "https://example.com/x" })));
        assert_eq!(settings.api_url, "https://example.com/x");
        assert_eq!(settings.explanation_style, ExplanationStyle::Simple);
        assert!(settings.auto_hide);
    }

    #[test]
    fn test_bad_field_keeps_the_valid_ones() {
        let settings = Settings::from_stored(Some(json!({
            "apiUrl": "https://my-backend.example/explain",
            "explanationStyle": "eli5",
            "autoHide": false
        })));

        assert_eq!(settings.api_url, "https://my-backend.example/explain");
        assert_eq!(settings.explanation_style, ExplanationStyle::Simple);
        assert!(!settings.auto_hide);
        assert!(!settings.enable_caching);
    }

    #[test]
    fn test_mistyped_and_null_fields_fall_back_per_field() {
        let settings = Settings::from_stored(Some(json!({
            "apiUrl": null,
            "explanationStyle": "detailed",
            "autoHide": "sometimes",
            "enableCaching": true,
            "legacyField": 3
        })));

        assert_eq!(settings.api_url, DEFAULT_API_URL);
        assert_eq!(settings.explanation_style, ExplanationStyle::Detailed);
        assert!(settings.auto_hide);
        assert!(settings.enable_caching);
    }

    #[test]
    fn test_non_object_record_yields_defaults() {
        assert_eq!(Settings::from_stored(Some(json!("garbage"))), Settings::default());
        assert_eq!(Settings::from_stored(Some(json!([1, 2]))), Settings::default());
    }

    #[test]
    fn test_apply_field_changes() {
        let mut settings = Settings::default();
        settings.apply(FieldChange::ApiUrl("X".to_string()));
        settings.apply(FieldChange::Style("technical".to_string()));
        settings.apply(FieldChange::AutoHide(false));
        settings.apply(FieldChange::EnableCaching(true));

        assert_eq!(settings.api_url, "X");
        assert_eq!(settings.explanation_style, ExplanationStyle::Technical);
        assert!(!settings.auto_hide);
        assert!(settings.enable_caching);

        // Unknown style keeps the previous value
        settings.apply(FieldChange::Style("bogus".to_string()));
        assert_eq!(settings.explanation_style, ExplanationStyle::Technical);
    }

    #[test]
    fn test_checkbox_changes_set_the_value() {
        let mut settings = Settings::default();
        settings.apply(FieldChange::AutoHide(false));
        settings.apply(FieldChange::AutoHide(false));
        assert!(!settings.auto_hide);

        settings.apply(FieldChange::EnableCaching(true));
        settings.apply(FieldChange::EnableCaching(true));
        assert!(settings.enable_caching);
    }

    #[test]
    fn test_style_round_trips_through_str() {
        for style in ExplanationStyle::ALL {
            assert_eq!(style.as_str().parse::<ExplanationStyle>().unwrap(), style);
        }
    }
}
