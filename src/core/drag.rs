//! Interactive relocation of a tiled leaf with a live preview.
//!
//! The preview works on a throwaway clone of the desktop's tree: the
//! speculative unlink + insert runs on the clone, the resulting geometry is
//! pushed to every window except the one being dragged, and the clone is
//! dropped. The live tree is only touched when the drop is committed.
use crate::{
    core::{bindings::KeyCode, handle, State},
    pure::geometry::{Point, Rect},
    x::{XConn, XConnExt},
    Result, Xid,
};
use tracing::{debug, info, warn};

/// The state of the interactive drag session.
///
/// IDLE (`active == false`) moves to ACTIVE on drag_start; drag_move keeps
/// it ACTIVE while refreshing the hovered target and preview; drag_end and
/// drag_cancel return to IDLE.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DragState {
    /// Whether a drag session is in progress
    pub active: bool,
    /// Whether the session was started from the keyboard
    pub keyboard: bool,
    /// The window being dragged
    pub window: Xid,
    /// The hovered target leaf's window from the last motion event
    pub last_target: Option<Xid>,
    /// Whether a preview layout is currently on screen
    pub preview_active: bool,
    /// The dragged node's rectangle at drag start
    pub original_rect: Rect,
    /// (monitor, desktop) the drag started on
    origin: (usize, usize),
}

/// Begin dragging `window`, grabbing the pointer and raising the window.
///
/// Refuses floating and fullscreen windows: only tiled leaves can be
/// relocated within the partition tree.
pub(crate) fn drag_start<X: XConn>(
    state: &mut State,
    x: &X,
    window: Xid,
    p: Point,
    keyboard: bool,
) -> Result<()> {
    if state.drag.active {
        return Ok(());
    }

    let (mi, di) = match state.find_window(window) {
        Some(loc) => loc,
        None => {
            warn!(%window, "cannot drag: window not managed");
            return Ok(());
        }
    };
    if !state.desktop_is_visible(mi, di) {
        return Ok(());
    }

    let original_rect = {
        let t = &state.monitors[mi].desktops[di].tree;
        let leaf = match t.leaf_for_window(window) {
            Some(leaf) => leaf,
            None => return Ok(()),
        };
        let c = t.client(leaf).expect("leaf has a client");
        if c.is_floating() || c.is_fullscreen() {
            warn!(%window, "cannot drag floating or fullscreen windows");
            return Ok(());
        }

        t.node(leaf).rect
    };

    state.drag = DragState {
        active: true,
        keyboard,
        window,
        last_target: None,
        preview_active: false,
        original_rect,
        origin: (mi, di),
    };

    // dragged windows are always on top
    x.raise_window(window)?;
    x.grab_pointer()?;

    // escape cancels the session for as long as it is active
    let escapes: Vec<KeyCode> = state
        .escape_codes
        .iter()
        .map(|&code| KeyCode { mask: 0, code })
        .collect();
    x.grab_keys(&escapes)?;

    info!(%window, "drag started");
    drag_move(state, x, p)
}

/// Track a pointer motion: refresh the hovered target, re-render the
/// preview when it changed and keep the window centered under the cursor.
pub(crate) fn drag_move<X: XConn>(state: &mut State, x: &X, p: Point) -> Result<()> {
    if !state.drag.active {
        return Ok(());
    }

    let (mi, di) = state.drag.origin;
    let target = {
        let t = &state.monitors[mi].desktops[di].tree;
        t.leaf_at(p)
            .and_then(|l| t.client(l))
            .map(|c| c.id)
            .filter(|&id| id != state.drag.window)
    };

    match target {
        None => {
            if state.drag.last_target.take().is_some() {
                preview_clear(state, x)?;
            }
        }

        Some(t) if state.drag.last_target != Some(t) => {
            preview_clear(state, x)?;
            preview_apply(state, x, t)?;
            state.drag.last_target = if state.drag.preview_active {
                Some(t)
            } else {
                None
            };
        }

        Some(_) => (), // same target as last motion: preview already correct
    }

    // center the window on the cursor
    let r = Rect {
        x: p.x - (state.drag.original_rect.w / 2) as i32,
        y: p.y - (state.drag.original_rect.h / 2) as i32,
        ..state.drag.original_rect
    };
    x.position_client(state.drag.window, r, state.config.border_width)
}

/// Commit the drag: a drop on a new target re-links the live tree, a drop
/// on nothing (or back on the source) restores the canonical layout.
pub(crate) fn drag_end<X: XConn>(state: &mut State, x: &X, p: Point) -> Result<()> {
    if !state.drag.active {
        return Ok(());
    }

    let (mi, di) = state.drag.origin;
    let window = state.drag.window;
    let target = {
        let t = &state.monitors[mi].desktops[di].tree;
        t.leaf_at(p)
            .and_then(|l| t.client(l))
            .map(|c| c.id)
            .filter(|&id| id != window)
    };

    if let Some(t) = target {
        let d = &mut state.monitors[mi].desktops[di];
        if let Some(client) = d.remove_window(window) {
            match d.tree.leaf_for_window(t) {
                Some(leaf) => {
                    d.insert(Some(leaf), client);
                }
                None => {
                    d.insert(None, client);
                }
            }
        }
        debug!(%window, target = %t, "drag committed");
    }

    finish_drag(state, x)?;
    handle::update_focus(state, x, window)
}

/// Abort the drag and restore the pre-drag layout.
pub(crate) fn drag_cancel<X: XConn>(state: &mut State, x: &X) -> Result<()> {
    if !state.drag.active {
        return Ok(());
    }

    info!("drag cancelled");
    let window = state.drag.window;
    finish_drag(state, x)?;
    handle::update_focus(state, x, window)
}

/// Start a drag of the focused window from the keyboard: the pointer is
/// warped to the window's center first so the motion model matches a
/// pointer-initiated session.
pub(crate) fn start_keyboard_drag<X: XConn>(state: &mut State, x: &X, window: Xid) -> Result<()> {
    let (mi, di) = match state.find_window(window) {
        Some(loc) => loc,
        None => return Ok(()),
    };

    let center = {
        let t = &state.monitors[mi].desktops[di].tree;
        match t.leaf_for_window(window) {
            Some(leaf) => t.node(leaf).rect.midpoint(),
            None => return Ok(()),
        }
    };

    x.warp_pointer(state.root, center.x as i16, center.y as i16)?;
    drag_start(state, x, window, center, true)
}

// Rearrange and render the origin desktop, release the grabs and return to
// IDLE. Ratios were never touched, so this restores the pre-drag layout
// exactly when no commit happened.
fn finish_drag<X: XConn>(state: &mut State, x: &X) -> Result<()> {
    let (mi, di) = state.drag.origin;

    handle::apply_layouts(state, x, mi)?;
    handle::render_desktop(state, x, mi, di)?;

    x.ungrab_pointer()?;
    x.ungrab_keys()?;
    x.grab_keys(&state.grabbed_codes)?;

    state.drag = DragState::default();
    x.flush();

    Ok(())
}

// Run the speculative unlink + insert on a clone of the live tree and push
// the resulting rectangles to every window except the dragged one.
fn preview_apply<X: XConn>(state: &mut State, x: &X, target: Xid) -> Result<()> {
    let (mi, di) = state.drag.origin;
    let window = state.drag.window;
    let usable = state.usable_rect(mi);
    let gap = state.config.window_gap;
    let border = state.config.border_width;

    let d = &state.monitors[mi].desktops[di];
    let layout = d.layout;
    let mut preview = d.tree.clone();

    let src = match preview.leaf_for_window(window) {
        Some(leaf) => leaf,
        None => return Ok(()),
    };
    let (client, remaining) = preview.unlink(src);
    if !remaining {
        return Ok(()); // the dragged window was the only leaf
    }
    let tgt = match preview.leaf_for_window(target) {
        Some(leaf) => leaf,
        None => return Ok(()),
    };
    preview.insert_at(tgt, client);
    preview.arrange(layout, usable, gap);

    for leaf in preview.leaves() {
        let node = preview.node(leaf);
        let c = match node.client() {
            Some(c) => *c,
            None => continue,
        };
        if c.id == window || c.is_fullscreen() {
            continue;
        }

        let r = if c.is_floating() {
            node.floating_rect
        } else {
            node.rect
        };
        x.position_client(c.id, r, border)?;
    }

    state.drag.preview_active = true;

    Ok(())
}

// Drop the preview geometry by re-rendering the canonical layout.
fn preview_clear<X: XConn>(state: &mut State, x: &X) -> Result<()> {
    if !state.drag.preview_active {
        return Ok(());
    }

    let (mi, di) = state.drag.origin;
    handle::apply_layouts(state, x, mi)?;
    handle::render_desktop(state, x, mi, di)?;
    state.drag.preview_active = false;

    Ok(())
}
