mod notification;
mod popup;

pub use popup::Popup;
