use dioxus::prelude::*;

use super::notification::{show_notification, Banner, NotificationBanner, NOTIFICATION_KEYFRAMES};
use crate::popup::{ApiStatus, Notification};
use crate::services::explain::{ExplainClient, ExplainRequest};
use crate::services::storage::{ChromeSyncStore, SettingsStore};
use crate::settings::{ExplanationStyle, FieldChange, Settings};

#[component]
pub fn Popup() -> Element {
    let mut settings = use_signal(Settings::default);
    let mut status = use_signal(|| ApiStatus::Checking);
    let banner = use_signal(|| None::<Banner>);
    let counter = use_signal(|| 0u64);

    // Load stored settings, then probe the configured endpoint
    use_future(move || async move {
        let loaded = match ChromeSyncStore::new().load().await {
            Ok(loaded) => loaded,
            Err(e) => {
                log::error!("Error loading settings: {}", e);
                Settings::default()
            }
        };
        settings.set(loaded.clone());

        status.set(ApiStatus::Checking);
        let outcome = ExplainClient::new()
            .probe(&loaded.api_url, &ExplainRequest::probe())
            .await;
        status.set(ApiStatus::after_check(&outcome));
    });

    let handle_save = move |_| {
        let current = settings.read().clone();
        spawn(async move {
            let result = ChromeSyncStore::new().save(&current).await;
            show_notification(banner, counter, Notification::after_save(&result));
        });
    };

    let handle_test = move |_| {
        status.set(ApiStatus::Testing);
        let current = settings.read().clone();
        spawn(async move {
            let outcome = ExplainClient::new()
                .probe(&current.api_url, &ExplainRequest::sample(current.explanation_style))
                .await;
            let (next, notification) = ApiStatus::after_test(&outcome);
            status.set(next);
            show_notification(banner, counter, notification);
        });
    };

    let current = settings.read().clone();
    let status_label = status.read().label();
    let status_class = status.read().css_class();

    rsx! {
        style { {NOTIFICATION_KEYFRAMES} }

        div { class: "popup",
            header { class: "popup-header",
                h1 { "🤖 Explaina" }
                p { class: "subtitle", "AI explanations for selected text" }
            }

            div { class: "status-row",
                span { class: "status-label", "API Status:" }
                span { id: "api-status", class: "{status_class}", "{status_label}" }
            }

            div { class: "field",
                label { r#for: "api-url", "API URL" }
                input {
                    id: "api-url",
                    r#type: "text",
                    value: "{current.api_url}",
                    oninput: move |e| settings.write().apply(FieldChange::ApiUrl(e.value()))
                }
            }

            div { class: "field",
                label { r#for: "explanation-style", "Explanation style" }
                select {
                    id: "explanation-style",
                    value: current.explanation_style.as_str(),
                    onchange: move |e| settings.write().apply(FieldChange::Style(e.value())),
                    for style in ExplanationStyle::ALL {
                        option {
                            value: style.as_str(),
                            selected: style == current.explanation_style,
                            {style.label()}
                        }
                    }
                }
            }

            div { class: "field checkbox",
                input {
                    id: "auto-hide",
                    r#type: "checkbox",
                    checked: current.auto_hide,
                    onchange: move |e| settings.write().apply(FieldChange::AutoHide(e.checked()))
                }
                label { r#for: "auto-hide", "Auto-hide explanations after 10 seconds" }
            }

            div { class: "field checkbox",
                input {
                    id: "enable-caching",
                    r#type: "checkbox",
                    checked: current.enable_caching,
                    onchange: move |e| settings.write().apply(FieldChange::EnableCaching(e.checked()))
                }
                label { r#for: "enable-caching", "Enable caching" }
            }

            div { class: "actions",
                button { id: "save-settings", class: "btn btn-primary", onclick: handle_save, "Save Settings" }
                button { id: "test-connection", class: "btn btn-secondary", onclick: handle_test, "Test Connection" }
            }
        }

        {banner().map(|active| rsx! { NotificationBanner { banner: active } })}
    }
}
