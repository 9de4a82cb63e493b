//! Popup window abstraction.
//!
//! A [`PopupProvider`] opens the authorization page in a window it does not
//! control afterwards; all the flow can do is ask the returned
//! [`PopupHandle`] whether the user has closed it, or close it itself.

pub mod browser;

use tubelink_settings::PopupSettings;

/// Size and screen position of the popup window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PopupGeometry {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Horizontal screen offset.
    pub left: i32,
    /// Vertical screen offset.
    pub top: i32,
}

impl Default for PopupGeometry {
    fn default() -> Self {
        Self {
            width: 600,
            height: 700,
            left: 200,
            top: 100,
        }
    }
}

impl From<&PopupSettings> for PopupGeometry {
    fn from(settings: &PopupSettings) -> Self {
        Self {
            width: settings.width,
            height: settings.height,
            left: settings.left,
            top: settings.top,
        }
    }
}

/// Opens popup windows.
pub trait PopupProvider: Send + Sync {
    /// Open `url` in a window called `name`. `None` means the popup was blocked.
    fn open(&self, url: &str, name: &str, geometry: &PopupGeometry)
    -> Option<Box<dyn PopupHandle>>;
}

/// An opened popup window.
///
/// Both methods are synchronous; the poll step never suspends.
pub trait PopupHandle: Send {
    /// Whether the window is gone. Once true, stays true.
    fn is_closed(&mut self) -> bool;

    /// Close the window if it is still open.
    fn close(&mut self);
}
