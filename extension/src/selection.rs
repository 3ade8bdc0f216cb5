// Selection capture helpers for the content script
// Pure functions over DOM-provided values, so they run natively in tests

/// Characters of surrounding text kept on each side of the selection.
pub const CONTEXT_RADIUS: usize = 300;

/// Captured selection, alive for one explain interaction
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSnapshot {
    pub text: String,
    pub context: String,
}

/// Trimmed selection text, or `None` when nothing meaningful is selected
pub fn normalize_selection(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Slice of `full_text` from `start - CONTEXT_RADIUS` to `end + CONTEXT_RADIUS`.
///
/// Offsets are DOM range offsets, i.e. UTF-16 code units. The slice is raw:
/// no word-boundary snapping. A surrogate pair cut at either edge decodes
/// lossily.
pub fn selection_context(full_text: &str, start: usize, end: usize) -> String {
    let units: Vec<u16> = full_text.encode_utf16().collect();
    let from = start.saturating_sub(CONTEXT_RADIUS).min(units.len());
    let to = end.saturating_add(CONTEXT_RADIUS).min(units.len());

    if from >= to {
        return String::new();
    }

    String::from_utf16_lossy(&units[from..to])
}

/// Viewport coordinates in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Bounding rectangle as reported by `getBoundingClientRect`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    /// Non-text selections report an all-zero rectangle
    pub fn is_empty(&self) -> bool {
        self.right - self.left <= 0.0 && self.bottom - self.top <= 0.0
    }
}

/// Where the explain button goes: right of the selection, slightly above it,
/// or next to the cursor when there is no usable rectangle.
pub fn button_position(selection: Option<Rect>, cursor: Point) -> Point {
    match selection.filter(|rect| !rect.is_empty()) {
        Some(rect) => Point {
            x: rect.right + 10.0,
            y: rect.top - 10.0,
        },
        None => Point {
            x: cursor.x + 10.0,
            y: cursor.y - 30.0,
        },
    }
}

/// Tooltip sits to the right of the button it replaces
pub fn tooltip_position(button: Rect) -> Point {
    Point {
        x: button.right + 10.0,
        y: button.top,
    }
}
