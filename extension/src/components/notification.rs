use dioxus::prelude::*;

use crate::popup::{Notification, NOTIFICATION_FADE, NOTIFICATION_VISIBLE};

pub const NOTIFICATION_KEYFRAMES: &str = r#"
@keyframes slideIn {
  from { transform: translateX(100%); opacity: 0; }
  to { transform: translateX(0); opacity: 1; }
}
@keyframes slideOut {
  from { transform: translateX(0); opacity: 1; }
  to { transform: translateX(100%); opacity: 0; }
}
"#;

/// Notification currently on screen
#[derive(Clone, PartialEq)]
pub struct Banner {
    seq: u64,
    notification: Notification,
    leaving: bool,
}

/// Show `notification`, replacing any banner already up. It slides out after
/// `NOTIFICATION_VISIBLE` and is removed once the animation ends.
pub fn show_notification(mut slot: Signal<Option<Banner>>, mut counter: Signal<u64>, notification: Notification) {
    let seq = *counter.peek() + 1;
    counter.set(seq);
    slot.set(Some(Banner {
        seq,
        notification,
        leaving: false,
    }));

    spawn(async move {
        gloo_timers::future::TimeoutFuture::new(NOTIFICATION_VISIBLE.as_millis() as u32).await;
        if let Some(banner) = slot.write().as_mut().filter(|b| b.seq == seq) {
            banner.leaving = true;
        } else {
            return;
        }

        gloo_timers::future::TimeoutFuture::new(NOTIFICATION_FADE.as_millis() as u32).await;
        if slot.peek().as_ref().map(|b| b.seq) == Some(seq) {
            slot.set(None);
        }
    });
}

#[component]
pub fn NotificationBanner(banner: Banner) -> Element {
    let animation = if banner.leaving {
        "slideOut 0.3s ease-in"
    } else {
        "slideIn 0.3s ease-out"
    };
    let style = format!(
        "position: fixed; top: 20px; right: 20px; padding: 12px 16px; border-radius: 6px; color: white; font-weight: 500; z-index: 10000; max-width: 300px; background: {}; animation: {};",
        banner.notification.kind.background(),
        animation
    );

    rsx! {
        div {
            class: banner.notification.kind.class_name(),
            style: "{style}",
            {banner.notification.message.clone()}
        }
    }
}
