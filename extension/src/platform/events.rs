// DOM event subscriptions that unregister themselves on drop

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget};

/// A registered listener. Dropping it removes the listener from its target.
pub struct EventSubscription {
    target: EventTarget,
    event_type: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl EventSubscription {
    pub fn new(target: &EventTarget, event_type: &'static str, handler: impl FnMut(Event) + 'static) -> Self {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);

        if let Err(e) =
            target.add_event_listener_with_callback(event_type, callback.as_ref().unchecked_ref())
        {
            log::error!("Failed to add {} listener: {:?}", event_type, e);
        }

        Self {
            target: target.clone(),
            event_type,
            callback,
        }
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event_type, self.callback.as_ref().unchecked_ref());
    }
}
