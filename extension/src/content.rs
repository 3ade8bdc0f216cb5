// Content script: selection -> explain button -> API call -> tooltip
// DOM rendering only; decisions come from `session::ExplainSession`

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde_json::json;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlElement, MouseEvent, Selection};

use crate::error::{ExtensionError, Result};
use crate::platform::events::EventSubscription;
use crate::platform::runtime;
use crate::selection::{button_position, selection_context, tooltip_position, Point, Rect};
use crate::services::explain::{ExplainClient, ExplainRequest};
use crate::session::{
    ButtonId, ExplainSession, ExplainTicket, SelectionChange, Tooltip, TooltipId, BUTTON_LABEL,
    LOADING_LABEL,
};
use crate::settings::Settings;

const BUTTON_CLASS: &str = "explaina-button";
const TOOLTIP_CLASS: &str = "explaina-tooltip";

const BUTTON_STYLE: &str = "position: fixed !important; background: #ffffff !important; color: #374151 !important; border: 1px solid #e5e7eb !important; border-radius: 8px !important; padding: 6px 12px !important; font-size: 11px !important; font-weight: 500 !important; cursor: pointer !important; box-shadow: 0 1px 3px rgba(0, 0, 0, 0.1), 0 1px 2px rgba(0, 0, 0, 0.06) !important; z-index: 2147483647 !important; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif !important; user-select: none !important; pointer-events: auto !important; transition: all 0.15s ease !important; letter-spacing: 0.025em !important; backdrop-filter: blur(8px) !important;";

const TOOLTIP_STYLE: &str = "position: fixed !important; background: #ffffff !important; border: 1px solid #e5e7eb !important; border-radius: 8px !important; padding: 0 !important; box-shadow: 0 10px 25px rgba(0, 0, 0, 0.1), 0 4px 10px rgba(0, 0, 0, 0.05) !important; z-index: 2147483647 !important; max-width: 380px !important; min-width: 280px !important; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif !important; font-size: 13px !important; color: #374151 !important; line-height: 1.6 !important; overflow: hidden !important; backdrop-filter: blur(12px) !important;";

const HEADER_STYLE: &str = "display: flex; justify-content: space-between; align-items: center; padding: 12px 16px; background: #f9fafb; border-bottom: 1px solid #e5e7eb; font-weight: 600; color: #374151; font-size: 12px; text-transform: uppercase; letter-spacing: 0.05em;";

const CLOSE_STYLE: &str = "background: none; border: none; color: #9ca3af; font-size: 16px; font-weight: 400; cursor: pointer; padding: 0; width: 20px; height: 20px; display: flex; align-items: center; justify-content: center; border-radius: 4px;";

const BODY_STYLE: &str = "padding: 16px; max-height: 280px; overflow-y: auto; word-wrap: break-word; white-space: pre-wrap; color: #4b5563; line-height: 1.6;";

thread_local! {
    static CONTENT_SCRIPT: RefCell<Option<ContentScript>> = const { RefCell::new(None) };
}

/// Install the content script on the current page (once)
pub fn install() -> Result<()> {
    CONTENT_SCRIPT.with(|slot| {
        if slot.borrow().is_some() {
            return Ok(());
        }
        *slot.borrow_mut() = Some(ContentScript::new()?);
        Ok(())
    })
}

fn dom_error(err: JsValue) -> ExtensionError {
    ExtensionError::Dom(format!("{:?}", err))
}

/// True when the event target sits inside an element matching `selector`
fn target_within(event: &Event, selector: &str) -> bool {
    event
        .target()
        .and_then(|t| t.dyn_into::<Element>().ok())
        .and_then(|el| el.closest(selector).ok().flatten())
        .is_some()
}

fn rect_of(element: &Element) -> Rect {
    let r = element.get_bounding_client_rect();
    Rect {
        left: r.left(),
        top: r.top(),
        right: r.right(),
        bottom: r.bottom(),
    }
}

fn selection_rect(selection: &Selection) -> Option<Rect> {
    if selection.range_count() == 0 {
        return None;
    }
    let r = selection.get_range_at(0).ok()?.get_bounding_client_rect();
    Some(Rect {
        left: r.left(),
        top: r.top(),
        right: r.right(),
        bottom: r.bottom(),
    })
}

fn capture_context(selection: &Selection) -> String {
    if selection.range_count() == 0 {
        return String::new();
    }
    let Ok(range) = selection.get_range_at(0) else {
        return String::new();
    };

    let full_text = range
        .common_ancestor_container()
        .ok()
        .and_then(|node| node.text_content())
        .unwrap_or_default();
    let start = range.start_offset().unwrap_or(0) as usize;
    let end = range.end_offset().unwrap_or(0) as usize;

    selection_context(&full_text, start, end)
}

fn place(element: &HtmlElement, at: Point) {
    let style = element.style();
    let _ = style.set_property("left", &format!("{}px", at.x));
    let _ = style.set_property("top", &format!("{}px", at.y));
}

/// Current settings from the background worker. A worker that answers with a
/// store failure still lets the request go out with the defaults.
async fn fetch_settings() -> Result<Settings> {
    let reply = runtime::send_message(&json!({ "action": "getSettings" })).await?;

    if reply.get("success").and_then(|s| s.as_bool()) == Some(true) {
        Ok(Settings::from_stored(reply.get("settings").cloned()))
    } else {
        log::warn!("Settings unavailable, using defaults: {}", reply);
        Ok(Settings::default())
    }
}

/// The floating "Explain" button. Removed from the page on drop.
struct ButtonView {
    id: ButtonId,
    element: HtmlElement,
    _subscriptions: Vec<EventSubscription>,
}

impl ButtonView {
    fn set_loading(&self) {
        self.element.set_text_content(Some(LOADING_LABEL));
        let _ = self.element.style().set_property("opacity", "0.7");
    }
}

impl Drop for ButtonView {
    fn drop(&mut self) {
        self.element.remove();
    }
}

/// The explanation panel. Removed from the page on drop.
struct TooltipView {
    id: TooltipId,
    element: HtmlElement,
    _close: EventSubscription,
}

impl Drop for TooltipView {
    fn drop(&mut self) {
        self.element.remove();
    }
}

pub struct ContentScript {
    _inner: Rc<Inner>,
}

struct Inner {
    document: Document,
    client: ExplainClient,
    session: RefCell<ExplainSession>,
    button: RefCell<Option<ButtonView>>,
    tooltip: RefCell<Option<TooltipView>>,
    listeners: RefCell<Vec<EventSubscription>>,
}

impl ContentScript {
    pub fn new() -> Result<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| ExtensionError::Dom("No document available".to_string()))?;

        let inner = Rc::new(Inner {
            document: document.clone(),
            client: ExplainClient::new(),
            session: RefCell::new(ExplainSession::new()),
            button: RefCell::new(None),
            tooltip: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
        });

        let target: &web_sys::EventTarget = document.as_ref();
        let mut listeners = Vec::new();
        for event_type in ["mouseup", "keyup"] {
            let weak = Rc::downgrade(&inner);
            listeners.push(EventSubscription::new(target, event_type, move |event| {
                if let Some(inner) = weak.upgrade() {
                    inner.handle_selection(&event);
                }
            }));
        }

        let weak = Rc::downgrade(&inner);
        listeners.push(EventSubscription::new(target, "click", move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_document_click(&event);
            }
        }));

        let weak = Rc::downgrade(&inner);
        listeners.push(EventSubscription::new(target, "scroll", move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.hide_tooltip();
            }
        }));

        *inner.listeners.borrow_mut() = listeners;
        log::info!("Explaina content script initialized");

        Ok(Self { _inner: inner })
    }
}

impl Inner {
    fn handle_selection(self: &Rc<Self>, event: &Event) {
        let from_button = target_within(event, &format!(".{}", BUTTON_CLASS));

        let selection = web_sys::window().and_then(|w| w.get_selection().ok().flatten());
        let raw_text = selection
            .as_ref()
            .map(|s| String::from(s.to_string()))
            .unwrap_or_default();

        let change = self.session.borrow_mut().on_selection(&raw_text, from_button, || {
            selection.as_ref().map(capture_context).unwrap_or_default()
        });

        match change {
            SelectionChange::Ignored => {}
            SelectionChange::Cleared => {
                self.button.borrow_mut().take();
            }
            SelectionChange::ShowButton(id) => {
                self.button.borrow_mut().take();

                let cursor = event
                    .dyn_ref::<MouseEvent>()
                    .map(|m| Point {
                        x: m.client_x() as f64,
                        y: m.client_y() as f64,
                    })
                    .unwrap_or_default();
                let at = button_position(selection.as_ref().and_then(selection_rect), cursor);

                match self.render_button(id, at) {
                    Ok(view) => {
                        log::info!("Showing explain button at ({}, {})", at.x, at.y);
                        *self.button.borrow_mut() = Some(view);
                    }
                    Err(e) => log::error!("Failed to render explain button: {}", e),
                }
            }
        }
    }

    fn handle_document_click(&self, event: &Event) {
        if target_within(event, &format!(".{}", BUTTON_CLASS))
            || target_within(event, &format!(".{}", TOOLTIP_CLASS))
        {
            return;
        }
        self.hide_tooltip();
    }

    fn hide_tooltip(&self) {
        if self.session.borrow_mut().dismiss_tooltip() {
            self.tooltip.borrow_mut().take();
        }
    }

    fn expire_tooltip(&self, id: TooltipId) {
        if self.session.borrow_mut().expire_tooltip(id) {
            let mut slot = self.tooltip.borrow_mut();
            if slot.as_ref().map(|t| t.id) == Some(id) {
                slot.take();
            }
        }
    }

    fn create_element(&self, tag: &str) -> Result<HtmlElement> {
        self.document
            .create_element(tag)
            .map_err(dom_error)?
            .dyn_into::<HtmlElement>()
            .map_err(|_| ExtensionError::Dom(format!("<{}> is not an HTMLElement", tag)))
    }

    fn append_to_body(&self, element: &HtmlElement) -> Result<()> {
        let body = self
            .document
            .body()
            .ok_or_else(|| ExtensionError::Dom("Page has no body".to_string()))?;
        body.append_child(element).map_err(dom_error)?;
        Ok(())
    }

    fn render_button(self: &Rc<Self>, id: ButtonId, at: Point) -> Result<ButtonView> {
        let element = self.create_element("div")?;
        element.set_class_name(BUTTON_CLASS);
        element.set_text_content(Some(BUTTON_LABEL));
        element.set_title("Get AI explanation for selected text");
        element.style().set_css_text(BUTTON_STYLE);
        place(&element, at);

        let target: &web_sys::EventTarget = element.as_ref();
        let weak = Rc::downgrade(self);
        let click = EventSubscription::new(target, "click", move |event| {
            event.prevent_default();
            event.stop_propagation();
            if let Some(inner) = weak.upgrade() {
                inner.handle_explain_click(id);
            }
        });

        let hovered = element.clone();
        let over = EventSubscription::new(target, "mouseover", move |_| {
            let _ = hovered.style().set_property("transform", "scale(1.1)");
        });
        let left = element.clone();
        let out = EventSubscription::new(target, "mouseout", move |_| {
            let _ = left.style().set_property("transform", "scale(1)");
        });

        self.append_to_body(&element)?;

        Ok(ButtonView {
            id,
            element,
            _subscriptions: vec![click, over, out],
        })
    }

    fn handle_explain_click(self: &Rc<Self>, id: ButtonId) {
        let Some(ticket) = self.session.borrow_mut().begin_request(id) else {
            return;
        };
        log::info!("Explaining: {}", ticket.selection.text);

        if let Some(view) = self.button.borrow().as_ref().filter(|b| b.id == id) {
            view.set_loading();
        }

        let inner = Rc::clone(self);
        wasm_bindgen_futures::spawn_local(async move {
            inner.run_request(ticket).await;
        });
    }

    async fn run_request(self: Rc<Self>, ticket: ExplainTicket) {
        let tooltip = match fetch_settings().await {
            Ok(settings) => {
                let request = ExplainRequest::new(
                    ticket.selection.text.clone(),
                    ticket.selection.context.clone(),
                    settings.explanation_style,
                );
                let explanation = self
                    .client
                    .explain_or_fallback(&settings.api_url, &request)
                    .await;
                self.session
                    .borrow_mut()
                    .finish(ticket.button, explanation, settings.auto_hide)
            }
            Err(e) => {
                log::error!("Error getting explanation: {}", e);
                self.session.borrow_mut().fail(ticket.button)
            }
        };

        if let Some(tooltip) = tooltip {
            self.show_tooltip(ticket.button, tooltip);
        }
    }

    fn show_tooltip(self: &Rc<Self>, button: ButtonId, tooltip: Tooltip) {
        // Position off the button before it goes away
        let anchor = {
            let mut slot = self.button.borrow_mut();
            let anchor = slot
                .as_ref()
                .filter(|b| b.id == button)
                .map(|b| rect_of(b.element.as_ref()));
            slot.take();
            anchor
        };
        self.tooltip.borrow_mut().take();

        let view = match self.render_tooltip(&tooltip, anchor.map(tooltip_position).unwrap_or_default()) {
            Ok(view) => view,
            Err(e) => {
                log::error!("Failed to render tooltip: {}", e);
                self.session.borrow_mut().expire_tooltip(tooltip.id);
                return;
            }
        };
        *self.tooltip.borrow_mut() = Some(view);

        if let Some(delay) = tooltip.auto_hide {
            let weak: Weak<Self> = Rc::downgrade(self);
            let id = tooltip.id;
            wasm_bindgen_futures::spawn_local(async move {
                gloo_timers::future::TimeoutFuture::new(delay.as_millis() as u32).await;
                if let Some(inner) = weak.upgrade() {
                    inner.expire_tooltip(id);
                }
            });
        }
    }

    fn render_tooltip(self: &Rc<Self>, tooltip: &Tooltip, at: Point) -> Result<TooltipView> {
        let element = self.create_element("div")?;
        element.set_class_name(if tooltip.is_error {
            "explaina-tooltip explaina-error"
        } else {
            TOOLTIP_CLASS
        });
        element.style().set_css_text(TOOLTIP_STYLE);
        place(&element, at);

        let header = self.create_element("div")?;
        header.style().set_css_text(HEADER_STYLE);

        let title = self.create_element("span")?;
        title.set_text_content(Some(tooltip.title));

        let close = self.create_element("button")?;
        close.set_text_content(Some("×"));
        close.style().set_css_text(CLOSE_STYLE);

        // Plain text: the explanation never gets parsed as HTML
        let body = self.create_element("div")?;
        body.style().set_css_text(BODY_STYLE);
        body.set_text_content(Some(&tooltip.body));

        header.append_child(&title).map_err(dom_error)?;
        header.append_child(&close).map_err(dom_error)?;
        element.append_child(&header).map_err(dom_error)?;
        element.append_child(&body).map_err(dom_error)?;

        let weak = Rc::downgrade(self);
        let id = tooltip.id;
        let close_target: &web_sys::EventTarget = close.as_ref();
        let close_sub = EventSubscription::new(close_target, "click", move |_| {
            // Deferred: the view owning this listener gets dropped
            let weak = weak.clone();
            wasm_bindgen_futures::spawn_local(async move {
                if let Some(inner) = weak.upgrade() {
                    inner.expire_tooltip(id);
                }
            });
        });

        self.append_to_body(&element)?;

        Ok(TooltipView {
            id,
            element,
            _close: close_sub,
        })
    }
}
