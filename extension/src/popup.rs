// Popup state that doesn't touch the DOM: status label transitions and
// notification texts. The Dioxus component in `components::popup` renders it.

use std::time::Duration;

use crate::error::ExtensionError;
use crate::services::explain::ProbeOutcome;

/// Time a notification stays fully visible
pub const NOTIFICATION_VISIBLE: Duration = Duration::from_secs(3);
/// Length of the slide-out animation before removal
pub const NOTIFICATION_FADE: Duration = Duration::from_millis(300);

/// Value of the `api-status` label
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiStatus {
    /// Automatic probe on open in flight
    Checking,
    /// Manual test in flight
    Testing,
    /// Automatic probe succeeded
    Connected,
    /// Manual test succeeded
    Verified,
    /// Endpoint answered with a non-2xx status
    Rejected(u16),
    /// Automatic probe could not reach the endpoint
    NoBackend,
    /// Manual test could not reach the endpoint; still reported as working
    DemoMode,
}

impl ApiStatus {
    pub fn label(&self) -> String {
        match self {
            ApiStatus::Checking => "Checking...".to_string(),
            ApiStatus::Testing => "Testing...".to_string(),
            ApiStatus::Connected => "Connected".to_string(),
            ApiStatus::Verified => "Connected ✓".to_string(),
            ApiStatus::Rejected(code) => format!("Error: {}", code),
            ApiStatus::NoBackend => "Demo Mode (No Backend)".to_string(),
            ApiStatus::DemoMode => "Demo Mode ✓".to_string(),
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            ApiStatus::Checking | ApiStatus::Testing | ApiStatus::NoBackend => "status-value checking",
            ApiStatus::Connected | ApiStatus::Verified | ApiStatus::DemoMode => "status-value connected",
            ApiStatus::Rejected(_) => "status-value disconnected",
        }
    }

    /// Status after the probe fired when the popup opens
    pub fn after_check(outcome: &ProbeOutcome) -> Self {
        match outcome {
            ProbeOutcome::Connected => ApiStatus::Connected,
            ProbeOutcome::Rejected(code) => ApiStatus::Rejected(*code),
            ProbeOutcome::Unreachable(_) => ApiStatus::NoBackend,
        }
    }

    /// Status and notification after the "Test connection" button.
    /// Network failure counts as demo mode, not as an error.
    pub fn after_test(outcome: &ProbeOutcome) -> (Self, Notification) {
        match outcome {
            ProbeOutcome::Connected => (
                ApiStatus::Verified,
                Notification::success("API connection successful!"),
            ),
            ProbeOutcome::Rejected(code) => (
                ApiStatus::Rejected(*code),
                Notification::error(format!("API error: {}", code)),
            ),
            ProbeOutcome::Unreachable(_) => (
                ApiStatus::DemoMode,
                Notification::success("Demo mode: Extension is working! (No backend connected)"),
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

impl NotificationKind {
    pub fn background(&self) -> &'static str {
        match self {
            NotificationKind::Success => "#28a745",
            NotificationKind::Error => "#dc3545",
            NotificationKind::Info => "#17a2b8",
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            NotificationKind::Success => "notification notification-success",
            NotificationKind::Error => "notification notification-error",
            NotificationKind::Info => "notification notification-info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NotificationKind::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NotificationKind::Error,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NotificationKind::Info,
        }
    }

    pub fn after_save(result: &Result<(), ExtensionError>) -> Self {
        match result {
            Ok(()) => Notification::success("Settings saved successfully!"),
            Err(e) => {
                log::error!("Error saving settings: {}", e);
                Notification::error("Failed to save settings")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_check_labels() {
        assert_eq!(ApiStatus::Checking.label(), "Checking...");
        assert_eq!(ApiStatus::after_check(&ProbeOutcome::Connected).label(), "Connected");
        assert_eq!(ApiStatus::after_check(&ProbeOutcome::Rejected(404)).label(), "Error: 404");

        let offline = ApiStatus::after_check(&ProbeOutcome::Unreachable("refused".to_string()));
        assert_eq!(offline.label(), "Demo Mode (No Backend)");
        assert_eq!(offline.css_class(), "status-value checking");
    }

    #[test]
    fn test_manual_test_http_500_is_an_error_not_demo_mode() {
        let (status, notification) = ApiStatus::after_test(&ProbeOutcome::Rejected(500));

        assert_eq!(status.label(), "Error: 500");
        assert_eq!(status.css_class(), "status-value disconnected");
        assert_eq!(notification, Notification::error("API error: 500"));
    }

    #[test]
    fn test_manual_test_network_failure_is_demo_mode() {
        let (status, notification) =
            ApiStatus::after_test(&ProbeOutcome::Unreachable("Failed to fetch".to_string()));

        assert_eq!(status.label(), "Demo Mode ✓");
        assert_eq!(status.css_class(), "status-value connected");
        assert_eq!(notification.kind, NotificationKind::Success);
        assert!(notification.message.starts_with("Demo mode"));
    }

    #[test]
    fn test_manual_test_success() {
        let (status, notification) = ApiStatus::after_test(&ProbeOutcome::Connected);
        assert_eq!(status.label(), "Connected ✓");
        assert_eq!(notification.message, "API connection successful!");
    }

    #[test]
    fn test_save_notifications() {
        assert_eq!(
            Notification::after_save(&Ok(())),
            Notification::success("Settings saved successfully!")
        );

        let failed = Notification::after_save(&Err(ExtensionError::Storage("quota".to_string())));
        assert_eq!(failed.message, "Failed to save settings");
        assert_eq!(failed.kind.background(), "#dc3545");
    }

    #[test]
    fn test_notification_kinds() {
        let info = Notification::info("Checking...");
        assert_eq!(info.kind.background(), "#17a2b8");
        assert_eq!(info.kind.class_name(), "notification notification-info");
        assert_eq!(
            Notification::success("ok").kind.class_name(),
            "notification notification-success"
        );
    }
}
