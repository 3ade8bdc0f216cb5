//! Background message routing.
//!
//! Every message carries an `action` field. All actions except `logError`
//! get exactly one reply, including unknown ones, so a caller awaiting a
//! response never hangs.

use serde::Serialize;
use serde_json::Value;

use crate::services::explain::{ExplainClient, ExplainRequest, ProbeOutcome};
use crate::services::storage::SettingsStore;
use crate::settings::Settings;

/// A decoded inter-context message
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    GetSettings,
    UpdateSettings(Value),
    TestApiConnection(String),
    LogError(Value),
    /// Known action with a missing or mistyped field
    Malformed { action: String, error: String },
    Unknown(String),
}

impl Request {
    pub fn parse(message: &Value) -> Self {
        let action = message.get("action").and_then(Value::as_str).unwrap_or_default();
        match action {
            "getSettings" => Request::GetSettings,
            "updateSettings" => {
                Request::UpdateSettings(message.get("settings").cloned().unwrap_or(Value::Null))
            }
            "testApiConnection" => match message.get("apiUrl").and_then(Value::as_str) {
                Some(url) => Request::TestApiConnection(url.to_string()),
                None => Request::Malformed {
                    action: action.to_string(),
                    error: "missing apiUrl".to_string(),
                },
            },
            "logError" => Request::LogError(message.get("error").cloned().unwrap_or(Value::Null)),
            other => Request::Unknown(other.to_string()),
        }
    }

    /// `logError` is fire-and-forget
    pub fn expects_reply(&self) -> bool {
        !matches!(self, Request::LogError(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Error,
    Disconnected,
}

/// Reply sent back through `sendResponse`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ConnectionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Reply {
    pub fn ok() -> Self {
        Self {
            success: true,
            settings: None,
            status: None,
            code: None,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::ok()
        }
    }

    fn with_settings(settings: Settings) -> Self {
        Self {
            settings: Some(settings),
            ..Self::ok()
        }
    }

    fn from_probe(outcome: ProbeOutcome) -> Self {
        match outcome {
            ProbeOutcome::Connected => Self {
                status: Some(ConnectionStatus::Connected),
                ..Self::ok()
            },
            ProbeOutcome::Rejected(code) => Self {
                success: false,
                status: Some(ConnectionStatus::Error),
                code: Some(code),
                ..Self::ok()
            },
            ProbeOutcome::Unreachable(error) => Self {
                status: Some(ConnectionStatus::Disconnected),
                ..Self::failed(error)
            },
        }
    }
}

pub struct BackgroundRouter<S> {
    store: S,
    client: ExplainClient,
}

impl<S: SettingsStore> BackgroundRouter<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            client: ExplainClient::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Serve one request. `None` means no reply is sent.
    pub async fn handle(&self, request: Request) -> Option<Reply> {
        match request {
            Request::GetSettings => Some(self.get_settings().await),
            Request::UpdateSettings(settings) => Some(self.update_settings(settings).await),
            Request::TestApiConnection(api_url) => Some(self.test_api_connection(&api_url).await),
            Request::LogError(error) => {
                log::error!("Explaina Error: {}", error);
                None
            }
            Request::Malformed { action, error } => {
                log::warn!("Malformed {} message: {}", action, error);
                Some(Reply::failed(format!("{}: {}", action, error)))
            }
            Request::Unknown(action) => {
                log::warn!("Unknown message action: {}", action);
                Some(Reply::failed(format!("Unknown message action: {}", action)))
            }
        }
    }

    async fn get_settings(&self) -> Reply {
        match self.store.load().await {
            Ok(settings) => Reply::with_settings(settings),
            Err(e) => {
                log::error!("Error getting settings: {}", e);
                Reply::failed(e.to_string())
            }
        }
    }

    async fn update_settings(&self, settings: Value) -> Reply {
        let settings: Settings = match serde_json::from_value(settings) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("Rejected settings update: {}", e);
                return Reply::failed(format!("Invalid settings: {}", e));
            }
        };

        match self.store.save(&settings).await {
            Ok(()) => Reply::ok(),
            Err(e) => {
                log::error!("Error updating settings: {}", e);
                Reply::failed(e.to_string())
            }
        }
    }

    async fn test_api_connection(&self, api_url: &str) -> Reply {
        Reply::from_probe(self.client.probe(api_url, &ExplainRequest::probe()).await)
    }

    /// First install: seed the store with the defaults
    pub async fn install_defaults(&self) -> crate::error::Result<()> {
        self.store.save(&Settings::default()).await
    }
}
