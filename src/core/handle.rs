//! XEvent handlers and the side-effecting operations they share
use crate::{
    config,
    core::{
        bindings::{keysym_for_name, KeyCode},
        commands, normalized, Bar, State,
    },
    pure::{
        client::{Client, ClientState},
        geometry::Rect,
        monitor::Monitor,
        tree::{Layout, NodeId},
    },
    x::{
        event::{ClientMessage, ConfigureEvent, PointerChange},
        ewmh, Atom, ClientAttr, XConn, XConnExt, FLOATING_WINDOW_TYPES,
    },
    Result, Xid,
};
use std::collections::HashMap;
use tracing::{debug, error, info, trace, warn};

// EWMH _NET_WM_STATE client message actions
const NET_WM_STATE_REMOVE: u32 = 0;
const NET_WM_STATE_ADD: u32 = 1;
const NET_WM_STATE_TOGGLE: u32 = 2;

/// Translate every binding's keysym against the live keyboard mapping and
/// regrab the result. Run at startup and after every MappingNotify.
pub(crate) fn resolve_bindings<X: XConn>(state: &mut State, x: &X) -> Result<()> {
    trace!("resolving key bindings against the current keyboard mapping");
    let mut resolved = HashMap::new();
    let mut codes = Vec::new();

    for (ix, b) in state.config.bindings.iter().enumerate() {
        for code in x.keycodes_for_keysym(b.keysym)? {
            let kc = KeyCode {
                mask: b.mods.bits(),
                code,
            };
            resolved.insert(kc, ix);
            codes.push(kc);
        }
    }

    state.escape_codes =
        x.keycodes_for_keysym(keysym_for_name("escape").expect("escape is in the key table"))?;

    x.ungrab_keys()?;
    x.grab_keys(&codes)?;
    state.grabbed_codes = codes;
    state.resolved_bindings = resolved;

    Ok(())
}

pub(crate) fn key_press<X: XConn>(state: &mut State, x: &X, code: KeyCode) -> Result<()> {
    let code = normalized(code);
    let ix = match state.resolved_bindings.get(&code) {
        Some(&ix) => ix,
        None => return Ok(()),
    };

    let b = state.config.bindings[ix].clone();
    commands::run_command(b.command, &b.arg, state, x)
}

/// Decide whether and how to manage a newly mapped window.
///
/// Policy order: override-redirect and known windows are ignored, per-class
/// rules are applied next, then docks become the bar, then fixed-size hints
/// and the EWMH window type pick between tiled and floating.
pub(crate) fn map_request<X: XConn>(state: &mut State, x: &X, window: Xid) -> Result<()> {
    trace!(%window, "handling map request");

    let attrs = match x.get_window_attributes(window) {
        Ok(attrs) => attrs,
        // window vanished between the event and our request
        Err(_) => return Ok(()),
    };
    if attrs.override_redirect {
        return Ok(());
    }
    if state.find_window(window).is_some() {
        return Ok(());
    }

    let class = x.window_class(window).unwrap_or(None);
    let rule = class.and_then(|c| {
        state
            .config
            .rules
            .iter()
            .find(|r| r.class.eq_ignore_ascii_case(&c))
            .cloned()
    });
    if let Some(rule) = rule {
        debug!(%window, ?rule, "applying window rule");
        let target = rule.desktop.map(|d| d - 1);
        return manage_window(state, x, window, rule.state, target);
    }

    let wtype = x.window_type(window).unwrap_or(None);
    if wtype == Some(Atom::NetWindowTypeDock) {
        return bar_request(state, x, window);
    }

    let fixed_size = x
        .normal_hints(window)
        .unwrap_or(None)
        .map(|h| h.forces_floating())
        .unwrap_or(false);
    let floats = fixed_size || matches!(wtype, Some(t) if FLOATING_WINDOW_TYPES.contains(&t));

    let client_state = if floats {
        ClientState::Floating
    } else {
        ClientState::Tiled
    };

    manage_window(state, x, window, client_state, None)
}

/// Create a client for `window` and insert it into the requested desktop of
/// the focused monitor (current desktop when `target` is None).
fn manage_window<X: XConn>(
    state: &mut State,
    x: &X,
    window: Xid,
    client_state: ClientState,
    target: Option<usize>,
) -> Result<()> {
    let mon_ix = state.focused_monitor;
    let current = state.monitors[mon_ix].focused_desktop_ix();
    let desk_ix = match target {
        Some(d) if d < state.monitors[mon_ix].desktops.len() => d,
        _ => current,
    };
    let visible = desk_ix == current;

    let wtype = x.window_type(window).unwrap_or(None);
    let client = Client::new(window, wtype, state.config.border_width, client_state);

    // tiled clients split the window under the cursor when it names a usable
    // target, otherwise the leftmost leaf
    let target_leaf = if visible && client_state == ClientState::Tiled {
        insertion_target(state, x, mon_ix, desk_ix)
    } else {
        None
    };

    let leaf = state.monitors[mon_ix].desktops[desk_ix].insert(target_leaf, client);

    if client_state == ClientState::Floating {
        let r = floating_rect_for(state, x, window, mon_ix);
        let node = state.monitors[mon_ix].desktops[desk_ix].tree.node_mut(leaf);
        node.floating_rect = r;
        node.rect = r;
    }

    x.set_client_attributes(
        window,
        &[
            ClientAttr::ClientEventMask,
            ClientAttr::BorderColor(state.config.normal_border.argb_u32()),
        ],
    )?;
    if !state.config.focus_follow_pointer {
        x.grab_buttons(window)?;
    }

    apply_layouts(state, x, mon_ix)?;
    ewmh::set_client_list(x, &state.all_windows())?;

    if !visible {
        debug!(%window, desk_ix, "window managed on a hidden desktop");
        return Ok(());
    }

    if state.monitors[mon_ix].desktops[desk_ix].layout == Layout::Stack {
        state.monitors[mon_ix].desktops[desk_ix].top_window = Some(window);
    }

    x.reveal(window)?;
    render_desktop(state, x, mon_ix, desk_ix)?;

    if state.config.focus_follow_spawn {
        update_focus(state, x, window)?;
    }

    Ok(())
}

/// The leaf a fresh tiled insert should split: the tiled leaf under the
/// cursor when there is one. Fullscreen targets drop back to tiling first.
fn insertion_target<X: XConn>(
    state: &mut State,
    x: &X,
    mon_ix: usize,
    desk_ix: usize,
) -> Option<NodeId> {
    let under = x.window_under_cursor().ok().flatten()?;
    let d = &mut state.monitors[mon_ix].desktops[desk_ix];
    let leaf = d.tree.leaf_for_window(under)?;

    match d.tree.client(leaf)?.state {
        ClientState::Tiled => Some(leaf),
        ClientState::Fullscreen => {
            d.tree.node_mut(leaf).client_mut()?.exit_fullscreen();
            Some(leaf)
        }
        ClientState::Floating => None,
    }
}

/// Center the window's requested geometry within its monitor.
fn floating_rect_for<X: XConn>(state: &State, x: &X, window: Xid, mon_ix: usize) -> Rect {
    let mr = state.monitors[mon_ix].rect;
    let g = x
        .client_geometry(window)
        .unwrap_or(Rect::new(0, 0, mr.w / 2, mr.h / 2));

    Rect {
        x: mr.x + (mr.w.saturating_sub(g.w) / 2) as i32,
        y: mr.y + (mr.h.saturating_sub(g.h) / 2) as i32,
        w: g.w,
        h: g.h,
    }
}

/// Record the dock window and reserve its strip on the primary monitor.
fn bar_request<X: XConn>(state: &mut State, x: &X, window: Xid) -> Result<()> {
    if state.bar.is_some() {
        debug!(%window, "already tracking a bar: ignoring dock window");
        return Ok(());
    }

    let rect = match x.client_geometry(window) {
        Ok(r) => r,
        Err(_) => return Ok(()),
    };

    info!(%window, ?rect, "adopting dock window as the bar");
    state.bar = Some(Bar { window, rect });
    x.position_client(window, rect, 0)?;
    x.map(window)?;

    let p = state.primary_monitor();
    apply_layouts(state, x, p)?;
    let desk_ix = state.monitors[p].focused_desktop_ix();
    render_desktop(state, x, p, desk_ix)
}

pub(crate) fn unmap_notify<X: XConn>(state: &mut State, x: &X, window: Xid) -> Result<()> {
    if state.bar.map(|b| b.window) == Some(window) {
        return drop_bar(state, x);
    }

    // manager-initiated unmaps (desktop switches) are not withdraws
    if let Some(count) = state.pending_unmap.get_mut(&window) {
        *count -= 1;
        if *count == 0 {
            state.pending_unmap.remove(&window);
        }
        return Ok(());
    }

    remove_window(state, x, window)
}

pub(crate) fn destroy_notify<X: XConn>(state: &mut State, x: &X, window: Xid) -> Result<()> {
    if state.bar.map(|b| b.window) == Some(window) {
        return drop_bar(state, x);
    }

    state.pending_unmap.remove(&window);
    remove_window(state, x, window)
}

fn drop_bar<X: XConn>(state: &mut State, x: &X) -> Result<()> {
    info!("bar window removed: restoring the full usable rectangle");
    state.bar = None;

    let p = state.primary_monitor();
    apply_layouts(state, x, p)?;
    let desk_ix = state.monitors[p].focused_desktop_ix();
    render_desktop(state, x, p, desk_ix)
}

/// Remove a managed window wherever it lives, re-tiling and re-focusing as
/// needed. Unknown windows are a silent no-op.
pub(crate) fn remove_window<X: XConn>(state: &mut State, x: &X, window: Xid) -> Result<()> {
    let (mi, di) = match state.find_window(window) {
        Some(loc) => loc,
        None => return Ok(()),
    };

    let d = &mut state.monitors[mi].desktops[di];
    let was_focused = d
        .tree
        .focused_leaf()
        .and_then(|l| d.tree.client(l))
        .map(|c| c.id)
        == Some(window);
    d.remove_window(window);
    debug!(%window, mi, di, "removed client");

    apply_layouts(state, x, mi)?;
    ewmh::set_client_list(x, &state.all_windows())?;

    if !state.desktop_is_visible(mi, di) {
        return Ok(());
    }

    render_desktop(state, x, mi, di)?;

    if was_focused {
        let next = {
            let t = &state.monitors[mi].desktops[di].tree;
            t.leftmost_leaf().and_then(|l| t.client(l)).map(|c| c.id)
        };
        match next {
            Some(w) => update_focus(state, x, w)?,
            None => focus_nothing(state, x)?,
        }
    }

    Ok(())
}

/// Unmanaged windows get the geometry they asked for; managed floating
/// windows may move themselves; managed tiled windows are ignored.
pub(crate) fn configure_request<X: XConn>(
    state: &mut State,
    x: &X,
    e: &ConfigureEvent,
) -> Result<()> {
    match state.find_window(e.id) {
        None => x.set_client_config(e.id, &[crate::x::ClientConfig::Position(e.r)]),

        Some((mi, di)) => {
            let d = &mut state.monitors[mi].desktops[di];
            let leaf = match d.tree.leaf_for_window(e.id) {
                Some(leaf) => leaf,
                None => return Ok(()),
            };
            if !d.tree.client(leaf).map(|c| c.is_floating()).unwrap_or(false) {
                return Ok(());
            }

            d.tree.node_mut(leaf).floating_rect = e.r;
            d.tree.node_mut(leaf).rect = e.r;
            x.position_client(e.id, e.r, state.config.border_width)
        }
    }
}

pub(crate) fn client_message<X: XConn>(state: &mut State, x: &X, m: ClientMessage) -> Result<()> {
    trace!(id = %m.id, dtype = ?m.dtype, data = ?m.data, "got client message");

    match m.dtype.as_ref() {
        "_NET_CURRENT_DESKTOP" => {
            if let Some((mi, di)) = state.desktop_for_global_index(m.data[0] as usize) {
                state.focus_monitor(mi);
                switch_desktop(state, x, mi, di)?;
            }
            Ok(())
        }

        "_NET_WM_STATE" => {
            let fullscreen = x.intern_atom(Atom::NetWmStateFullscreen.as_ref())?;
            if m.data[1] != fullscreen && m.data[2] != fullscreen {
                return Ok(());
            }

            let currently = state
                .find_window(m.id)
                .and_then(|(mi, di)| {
                    let t = &state.monitors[mi].desktops[di].tree;
                    t.leaf_for_window(m.id).and_then(|l| t.client(l)).copied()
                })
                .map(|c| c.is_fullscreen());
            let currently = match currently {
                Some(f) => f,
                None => return Ok(()),
            };

            match m.data[0] {
                NET_WM_STATE_ADD => set_fullscreen(state, x, m.id, true),
                NET_WM_STATE_REMOVE => set_fullscreen(state, x, m.id, false),
                NET_WM_STATE_TOGGLE => set_fullscreen(state, x, m.id, !currently),
                action => {
                    warn!(%action, "invalid _NET_WM_STATE action: expected 0, 1 or 2");
                    Ok(())
                }
            }
        }

        "_NET_CLOSE_WINDOW" => {
            if state.find_window(m.id).is_some() {
                x.close_or_kill(m.id)?;
            }
            Ok(())
        }

        "_NET_ACTIVE_WINDOW" => {
            if let Some((mi, di)) = state.find_window(m.id) {
                if state.desktop_is_visible(mi, di) {
                    update_focus(state, x, m.id)?;
                }
            }
            Ok(())
        }

        _ => Ok(()),
    }
}

pub(crate) fn enter_notify<X: XConn>(state: &mut State, x: &X, p: PointerChange) -> Result<()> {
    if !state.config.focus_follow_pointer || p.id == state.root {
        return Ok(());
    }

    if let Some(mi) = state.monitor_containing(p.abs) {
        state.focus_monitor(mi);
    }

    let already_focused = {
        let t = &state.focused_desktop().tree;
        t.focused_leaf().and_then(|l| t.client(l)).map(|c| c.id) == Some(p.id)
    };
    if !already_focused && state.find_window(p.id).is_some() {
        update_focus(state, x, p.id)?;
    }

    Ok(())
}

pub(crate) fn leave_notify<X: XConn>(state: &mut State, x: &X, p: PointerChange) -> Result<()> {
    if state.config.focus_follow_pointer && state.find_window(p.id).is_some() {
        x.set_client_border_color(p.id, state.config.normal_border)?;
    }

    Ok(())
}

pub(crate) fn button_press<X: XConn>(state: &mut State, x: &X, p: PointerChange) -> Result<()> {
    if state.config.focus_follow_pointer {
        return Ok(());
    }

    if state.find_window(p.id).is_some() {
        update_focus(state, x, p.id)?;
    }

    Ok(())
}

/// Re-enumerate the physical outputs, keeping the desktops of surviving
/// monitors and merging those of disconnected ones into the primary.
pub(crate) fn randr_notify<X: XConn>(state: &mut State, x: &X) -> Result<()> {
    info!("re-detecting monitors");
    let mut infos = x.current_outputs()?;
    if infos.is_empty() {
        infos.push(crate::x::OutputInfo {
            name: "screen".to_owned(),
            rect: x.screen_rect()?,
            randr_id: 0,
            primary: true,
        });
    }
    info!(?infos, "found outputs");

    let n_desktops = state.config.virtual_desktops;
    let mut kept: Vec<Monitor> = Vec::with_capacity(infos.len());

    for (i, info) in infos.into_iter().enumerate() {
        match state
            .monitors
            .iter()
            .position(|m| m.randr_id == info.randr_id)
        {
            Some(pos) => {
                let mut m = state.monitors.remove(pos);
                m.id = i + 1;
                m.name = info.name;
                m.rect = info.rect;
                m.primary = info.primary;
                kept.push(m);
            }
            None => kept.push(Monitor::new(
                i + 1,
                info.name,
                info.rect,
                info.randr_id,
                info.primary,
                n_desktops,
            )),
        }
    }

    if !kept.iter().any(|m| m.primary) {
        kept[0].primary = true;
    }

    // desktops of vanished outputs merge into the primary's matching ids
    let target = kept.iter().position(|m| m.primary).unwrap_or(0);
    for gone in state.monitors.drain(..) {
        info!(name = %gone.name, "output disconnected: merging its desktops");
        kept[target].absorb(gone);
    }

    state.monitors = kept;
    let under_cursor = x
        .cursor_position()
        .ok()
        .and_then(|p| state.monitor_containing(p));
    let focus_ix = under_cursor.unwrap_or_else(|| state.primary_monitor());
    state.focus_monitor(focus_ix);

    ewmh::set_desktop_details(x, &state.desktop_names(), &state.desktop_viewports())?;
    ewmh::set_current_desktop(x, state.current_global_desktop())?;
    ewmh::set_client_list(x, &state.all_windows())?;

    for mi in 0..state.monitors.len() {
        apply_layouts(state, x, mi)?;
        let di = state.monitors[mi].focused_desktop_ix();
        render_desktop(state, x, mi, di)?;
    }

    Ok(())
}

/// Recompute the tree geometry of every desktop on the given monitor.
pub(crate) fn apply_layouts<X: XConn>(state: &mut State, _x: &X, mon_ix: usize) -> Result<()> {
    let usable = state.usable_rect(mon_ix);
    let gap = state.config.window_gap;

    for d in state.monitors[mon_ix].desktops.iter_mut() {
        d.arrange(usable, gap);
    }

    Ok(())
}

/// Issue the configure / stacking requests that make the X server match the
/// given desktop's tree.
pub(crate) fn render_desktop<X: XConn>(
    state: &State,
    x: &X,
    mon_ix: usize,
    desk_ix: usize,
) -> Result<()> {
    let m = &state.monitors[mon_ix];
    let d = &m.desktops[desk_ix];
    let border = state.config.border_width;

    let mut floating = Vec::new();
    let mut fullscreen = Vec::new();

    for leaf in d.tree.leaves() {
        let node = d.tree.node(leaf);
        let c = match node.client() {
            Some(c) => *c,
            None => continue,
        };

        match c.state {
            ClientState::Tiled => x.position_client(c.id, node.rect, border)?,
            ClientState::Floating => {
                x.position_client(c.id, node.floating_rect, border)?;
                floating.push(c.id);
            }
            ClientState::Fullscreen => {
                x.position_client(c.id, m.rect, 0)?;
                fullscreen.push(c.id);
            }
        }
    }

    if d.layout == Layout::Stack {
        if let Some(top) = d.top_window {
            x.raise_window(top)?;
        }
    }

    // floating windows sit above the tiled plane, fullscreen above everything
    for id in floating {
        x.raise_window(id)?;
    }
    for id in fullscreen {
        x.raise_window(id)?;
    }

    Ok(())
}

/// Make `window` the focused client: exclusive focus flag, border colors,
/// input focus, EWMH active window and click-to-focus grab rotation.
pub(crate) fn update_focus<X: XConn>(state: &mut State, x: &X, window: Xid) -> Result<()> {
    let (mi, di) = match state.find_window(window) {
        Some(loc) => loc,
        None => return Ok(()),
    };

    state.focus_monitor(mi);
    let d = &mut state.monitors[mi].desktops[di];
    let leaf = match d.tree.leaf_for_window(window) {
        Some(leaf) => leaf,
        None => return Ok(()),
    };
    d.tree.focus_leaf(leaf);

    let windows = d.tree.windows();
    let is_stack = d.layout == Layout::Stack;
    let is_floating = d
        .tree
        .client(leaf)
        .map(|c| c.is_floating())
        .unwrap_or(false);
    if is_stack {
        d.top_window = Some(window);
    }

    for w in windows.iter() {
        x.set_client_border_color(*w, state.config.normal_border)?;
    }
    x.set_client_border_color(window, state.config.active_border)?;
    x.focus(window)?;
    ewmh::set_active_window(x, Some(window))?;

    if is_stack || is_floating {
        x.raise_window(window)?;
    }

    if !state.config.focus_follow_pointer {
        for w in windows {
            if w == window {
                x.ungrab_buttons(w)?;
            } else {
                x.grab_buttons(w)?;
            }
        }
    }

    Ok(())
}

/// Drop focus back to the root when nothing is left to focus.
pub(crate) fn focus_nothing<X: XConn>(state: &mut State, x: &X) -> Result<()> {
    state.focused_desktop_mut().tree.clear_focus();
    x.focus(state.root)?;
    ewmh::set_active_window(x, None)
}

/// Switch the given monitor to another of its desktops: show the incoming
/// tree, hide the outgoing one and restore focus on the new desktop.
pub(crate) fn switch_desktop<X: XConn>(
    state: &mut State,
    x: &X,
    mon_ix: usize,
    new_ix: usize,
) -> Result<()> {
    let m = &state.monitors[mon_ix];
    let current = m.focused_desktop_ix();
    if new_ix >= m.desktops.len() || new_ix == current {
        return Ok(());
    }
    debug!(mon_ix, from = current, to = new_ix, "switching desktop");

    let to_show = m.desktops[new_ix].tree.windows();
    let to_hide = m.desktops[current].tree.windows();

    state.monitors[mon_ix].focus_desktop(new_ix);
    apply_layouts(state, x, mon_ix)?;

    for w in to_show {
        x.reveal(w)?;
    }
    render_desktop(state, x, mon_ix, new_ix)?;
    for w in to_hide {
        x.hide(w, &mut state.pending_unmap)?;
    }

    let focus_target = {
        let t = &state.monitors[mon_ix].desktops[new_ix].tree;
        let remembered = if state.config.restore_last_focus {
            t.focused_leaf()
        } else {
            None
        };
        remembered
            .or_else(|| t.leftmost_leaf())
            .and_then(|l| t.client(l))
            .map(|c| c.id)
    };

    match focus_target {
        Some(w) => update_focus(state, x, w)?,
        None => focus_nothing(state, x)?,
    }

    ewmh::set_current_desktop(x, state.current_global_desktop())
}

/// Move `window` to another desktop of its monitor, inserting at the
/// leftmost leaf. The window is hidden unless the target is visible.
pub(crate) fn transfer_window<X: XConn>(
    state: &mut State,
    x: &X,
    window: Xid,
    target_ix: usize,
) -> Result<()> {
    let (mi, di) = match state.find_window(window) {
        Some(loc) => loc,
        None => return Ok(()),
    };
    if target_ix >= state.monitors[mi].desktops.len() || target_ix == di {
        return Ok(());
    }

    let client = match state.monitors[mi].desktops[di].remove_window(window) {
        Some(c) => c,
        None => return Ok(()),
    };
    state.monitors[mi].desktops[target_ix].insert(None, client);
    debug!(%window, from = di, to = target_ix, "transferred window");

    apply_layouts(state, x, mi)?;

    if state.desktop_is_visible(mi, di) {
        render_desktop(state, x, mi, di)?;
        let next = {
            let t = &state.monitors[mi].desktops[di].tree;
            t.leftmost_leaf().and_then(|l| t.client(l)).map(|c| c.id)
        };
        match next {
            Some(w) => update_focus(state, x, w)?,
            None => focus_nothing(state, x)?,
        }
    }

    if state.desktop_is_visible(mi, target_ix) {
        x.reveal(window)?;
        render_desktop(state, x, mi, target_ix)?;
    } else {
        x.hide(window, &mut state.pending_unmap)?;
    }

    Ok(())
}

/// Transition a client in or out of fullscreen, spanning the monitor
/// rectangle while active and restoring its previous state on exit.
pub(crate) fn set_fullscreen<X: XConn>(
    state: &mut State,
    x: &X,
    window: Xid,
    fullscreen: bool,
) -> Result<()> {
    let (mi, di) = match state.find_window(window) {
        Some(loc) => loc,
        None => return Ok(()),
    };

    {
        let t = &mut state.monitors[mi].desktops[di].tree;
        let leaf = match t.leaf_for_window(window) {
            Some(leaf) => leaf,
            None => return Ok(()),
        };
        let c = t.node_mut(leaf).client_mut().expect("leaf has a client");
        if fullscreen {
            c.enter_fullscreen();
        } else {
            c.exit_fullscreen();
        }
    }
    debug!(%window, fullscreen, "fullscreen transition");

    if !state.desktop_is_visible(mi, di) {
        return Ok(());
    }

    if fullscreen {
        x.position_client(window, state.monitors[mi].rect, 0)?;
        x.raise_window(window)?;
    } else {
        apply_layouts(state, x, mi)?;
        render_desktop(state, x, mi, di)?;
    }

    Ok(())
}

/// Toggle a client between tiled and floating, preserving its floating
/// rectangle across round trips.
pub(crate) fn toggle_floating<X: XConn>(state: &mut State, x: &X, window: Xid) -> Result<()> {
    let (mi, di) = match state.find_window(window) {
        Some(loc) => loc,
        None => return Ok(()),
    };

    let now_floating = {
        let t = &mut state.monitors[mi].desktops[di].tree;
        let leaf = match t.leaf_for_window(window) {
            Some(leaf) => leaf,
            None => return Ok(()),
        };

        let current = t.node(leaf).client().expect("leaf has a client").state;
        match current {
            ClientState::Floating => {
                t.node_mut(leaf)
                    .client_mut()
                    .expect("leaf has a client")
                    .set_state(ClientState::Tiled);
                false
            }
            _ => {
                if t.node(leaf).floating_rect.w == 0 {
                    let r = floating_rect_for(state, x, window, mi);
                    let t = &mut state.monitors[mi].desktops[di].tree;
                    let leaf = t.leaf_for_window(window).expect("still present");
                    t.node_mut(leaf).floating_rect = r;
                }
                let t = &mut state.monitors[mi].desktops[di].tree;
                let leaf = t.leaf_for_window(window).expect("still present");
                t.node_mut(leaf)
                    .client_mut()
                    .expect("leaf has a client")
                    .set_state(ClientState::Floating);
                true
            }
        }
    };

    apply_layouts(state, x, mi)?;
    if state.desktop_is_visible(mi, di) {
        render_desktop(state, x, mi, di)?;
        if now_floating {
            x.raise_window(window)?;
        }
    }

    Ok(())
}

/// Re-read the config file, keeping the old configuration when the new one
/// fails to parse. Desktop count changes migrate windows rather than drop
/// them.
pub(crate) fn reload_config<X: XConn>(state: &mut State, x: &X) -> Result<()> {
    let path = match state.config_path.clone() {
        Some(p) => p,
        None => {
            warn!("no config path recorded: nothing to reload");
            return Ok(());
        }
    };

    let new = match config::load(&path) {
        Ok(c) => c,
        Err(e) => {
            error!(%e, "config reload failed: keeping the current configuration");
            return Ok(());
        }
    };

    info!("config reloaded");
    state.config = new;

    let n = state.config.virtual_desktops;
    for m in state.monitors.iter_mut() {
        m.set_desktop_count(n);
    }

    resolve_bindings(state, x)?;

    ewmh::set_desktop_details(x, &state.desktop_names(), &state.desktop_viewports())?;
    ewmh::set_current_desktop(x, state.current_global_desktop())?;
    ewmh::set_client_list(x, &state.all_windows())?;

    for mi in 0..state.monitors.len() {
        apply_layouts(state, x, mi)?;
        let di = state.monitors[mi].focused_desktop_ix();
        render_desktop(state, x, mi, di)?;
    }

    Ok(())
}
