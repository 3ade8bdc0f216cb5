//! Content-script interaction state.
//!
//! Tracks the explain button and the tooltip independently of the DOM:
//! the DOM layer asks this machine what to do and renders the answer.
//!
//! ```text
//! Idle -> Selected -> Loading -> Shown -> Idle
//! ```
//!
//! A new selection always replaces the current button. Its in-flight request,
//! if any, keeps running; the result is dropped when it comes back because the
//! button it belonged to is gone.

use std::time::Duration;

use crate::selection::{normalize_selection, SelectionSnapshot};
use crate::services::explain::Explanation;

/// How long a regular tooltip stays up when auto-hide is on.
pub const AUTO_HIDE_DELAY: Duration = Duration::from_secs(10);

pub const BUTTON_LABEL: &str = "🤖 Explain";
pub const LOADING_LABEL: &str = "⏳ Loading...";
pub const ERROR_MESSAGE: &str = "Sorry, I couldn't explain that. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Selected,
    Loading,
    Shown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ButtonId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TooltipId(u64);

#[derive(Debug)]
struct ButtonState {
    id: ButtonId,
    selection: SelectionSnapshot,
    loading: bool,
}

/// What the DOM layer should render for a finished request
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub id: TooltipId,
    pub title: &'static str,
    pub body: String,
    pub is_error: bool,
    /// `None` keeps the tooltip until the user dismisses it
    pub auto_hide: Option<Duration>,
}

/// Outcome of a mouse-up/key-up
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionChange {
    /// Event came from our own button; nothing changes
    Ignored,
    /// Any previous button is gone and nothing new is shown
    Cleared,
    /// Previous button is gone, show a new one
    ShowButton(ButtonId),
}

/// Request to issue for a button click
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainTicket {
    pub button: ButtonId,
    pub selection: SelectionSnapshot,
}

#[derive(Debug, Default)]
pub struct ExplainSession {
    button: Option<ButtonState>,
    tooltip: Option<TooltipId>,
    next_id: u64,
}

impl ExplainSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn phase(&self) -> Phase {
        match (&self.button, self.tooltip) {
            (Some(button), _) if button.loading => Phase::Loading,
            (Some(_), _) => Phase::Selected,
            (None, Some(_)) => Phase::Shown,
            (None, None) => Phase::Idle,
        }
    }

    pub fn current_button(&self) -> Option<ButtonId> {
        self.button.as_ref().map(|b| b.id)
    }

    pub fn current_tooltip(&self) -> Option<TooltipId> {
        self.tooltip
    }

    pub fn selection(&self) -> Option<&SelectionSnapshot> {
        self.button.as_ref().map(|b| &b.selection)
    }

    /// Handle a selection event. `context` is only evaluated when the
    /// selection is non-empty.
    pub fn on_selection(
        &mut self,
        raw_text: &str,
        from_button: bool,
        context: impl FnOnce() -> String,
    ) -> SelectionChange {
        if from_button {
            return SelectionChange::Ignored;
        }

        if let Some(old) = self.button.take() {
            if old.loading {
                log::info!("Replacing button while its request is still in flight");
            }
        }

        match normalize_selection(raw_text) {
            Some(text) => {
                let id = ButtonId(self.fresh_id());
                self.button = Some(ButtonState {
                    id,
                    selection: SelectionSnapshot {
                        text,
                        context: context(),
                    },
                    loading: false,
                });
                SelectionChange::ShowButton(id)
            }
            None => SelectionChange::Cleared,
        }
    }

    /// Button click. `None` when the button is stale or already loading.
    pub fn begin_request(&mut self, id: ButtonId) -> Option<ExplainTicket> {
        let button = self.button.as_mut().filter(|b| b.id == id)?;
        if button.loading {
            log::info!("Already loading, ignoring click");
            return None;
        }

        button.loading = true;
        Some(ExplainTicket {
            button: id,
            selection: button.selection.clone(),
        })
    }

    /// Request settled. Removes the button and returns the tooltip to show,
    /// or `None` when the button was replaced meanwhile.
    pub fn finish(&mut self, id: ButtonId, explanation: Explanation, auto_hide: bool) -> Option<Tooltip> {
        if self.current_button() != Some(id) {
            log::info!("Dropping explanation for a button that no longer exists");
            return None;
        }
        self.button = None;

        Some(self.open_tooltip(
            "🤖 AI Explanation",
            explanation.text,
            false,
            auto_hide,
        ))
    }

    /// Request could not even be issued
    pub fn fail(&mut self, id: ButtonId) -> Option<Tooltip> {
        if self.current_button() != Some(id) {
            return None;
        }
        self.button = None;

        Some(self.open_tooltip("❌ Error", ERROR_MESSAGE.to_string(), true, false))
    }

    fn open_tooltip(&mut self, title: &'static str, body: String, is_error: bool, auto_hide: bool) -> Tooltip {
        let id = TooltipId(self.fresh_id());
        self.tooltip = Some(id);

        Tooltip {
            id,
            title,
            body,
            is_error,
            auto_hide: if auto_hide && !is_error {
                Some(AUTO_HIDE_DELAY)
            } else {
                None
            },
        }
    }

    /// Close whatever tooltip is showing. Returns whether one was open.
    pub fn dismiss_tooltip(&mut self) -> bool {
        self.tooltip.take().is_some()
    }

    /// Close `id` only if it is still the current tooltip (timer expiry)
    pub fn expire_tooltip(&mut self, id: TooltipId) -> bool {
        if self.tooltip == Some(id) {
            self.tooltip = None;
            true
        } else {
            false
        }
    }
}
