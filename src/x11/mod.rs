//! Talking to the X server using the x11rb crate.
//!
//! [RustConn] is the production implementation of the
//! [XConn][crate::x::XConn] trait used by the window manager; everything in
//! the core is written against the trait so this module is the only place
//! that knows about wire level X11 details.
pub mod conn;

pub use conn::RustConn;

use x11rb::protocol::xproto::EventMask;

/// The event mask applied to the root window when we become the WM.
pub(crate) fn root_event_mask() -> EventMask {
    EventMask::SUBSTRUCTURE_REDIRECT
        | EventMask::SUBSTRUCTURE_NOTIFY
        | EventMask::BUTTON_PRESS
        | EventMask::POINTER_MOTION
}

/// The event mask applied to every managed client window.
pub(crate) fn client_event_mask() -> EventMask {
    EventMask::ENTER_WINDOW
        | EventMask::LEAVE_WINDOW
        | EventMask::PROPERTY_CHANGE
        | EventMask::STRUCTURE_NOTIFY
}
