//! Pure state of the window manager: no side effects, no X interaction.
//!
//! Everything in this module can be driven directly in tests without a
//! running X server. The [core][crate::core] event handlers mutate this
//! state and then mirror the result out to the server.
pub mod client;
pub mod desktop;
pub mod geometry;
pub mod monitor;
pub mod tree;

#[cfg(test)]
mod quickcheck_tests;

pub use client::{Client, ClientState};
pub use desktop::Desktop;
pub use monitor::Monitor;
pub use tree::{Layout, NodeId, Tree};

/// The axis along which an internal node splits its rectangle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Children are side by side (the x axis is divided)
    Vertical,
    /// Children are stacked (the y axis is divided)
    Horizontal,
}
