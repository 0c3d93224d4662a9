//! EWMH root window properties
//!
//! Everything a pager or external bar needs to track the manager: the
//! supported atom list, desktop bookkeeping and the active window. See
//! <https://specifications.freedesktop.org/wm-spec/wm-spec-latest.html>
use crate::{
    pure::geometry::Point,
    x::{Atom, Prop, XConn, EWMH_SUPPORTED_ATOMS},
    Result, Xid,
};

/// The WM_NAME / _NET_WM_NAME advertised for the manager itself.
pub const WM_NAME: &str = "arbor";

/// Publish the supporting-wm-check window and the supported atom list.
///
/// Run once on startup before any other property is published.
pub fn advertise_support<X: XConn>(x: &X, check_win: Xid) -> Result<()> {
    let root = x.root();

    for target in [root, check_win] {
        x.set_prop(
            target,
            Atom::NetSupportingWmCheck.as_ref(),
            Prop::Window(vec![check_win]),
        )?;
    }

    x.set_prop(
        check_win,
        Atom::NetWmName.as_ref(),
        Prop::UTF8String(vec![WM_NAME.to_owned()]),
    )?;
    x.set_prop(
        check_win,
        Atom::NetWmPid.as_ref(),
        Prop::Cardinal(vec![std::process::id()]),
    )?;

    x.set_prop(
        root,
        Atom::NetSupported.as_ref(),
        Prop::Atom(
            EWMH_SUPPORTED_ATOMS
                .iter()
                .map(|a| a.as_ref().to_owned())
                .collect(),
        ),
    )?;

    x.delete_prop(root, Atom::NetClientList.as_ref())
}

/// Publish the number of desktops, their names and their viewports.
///
/// Desktops are linearised across monitors in monitor order; the viewport of
/// each desktop is the origin of the monitor it belongs to.
pub fn set_desktop_details<X: XConn>(
    x: &X,
    names: &[String],
    viewports: &[Point],
) -> Result<()> {
    let root = x.root();

    x.set_prop(
        root,
        Atom::NetNumberOfDesktops.as_ref(),
        Prop::Cardinal(vec![names.len() as u32]),
    )?;
    x.set_prop(
        root,
        Atom::NetDesktopNames.as_ref(),
        Prop::UTF8String(names.to_vec()),
    )?;
    x.set_prop(
        root,
        Atom::NetDesktopViewport.as_ref(),
        Prop::Cardinal(
            viewports
                .iter()
                .flat_map(|p| [p.x.max(0) as u32, p.y.max(0) as u32])
                .collect(),
        ),
    )
}

/// Publish the index of the currently focused desktop.
pub fn set_current_desktop<X: XConn>(x: &X, ix: usize) -> Result<()> {
    x.set_prop(
        x.root(),
        Atom::NetCurrentDesktop.as_ref(),
        Prop::Cardinal(vec![ix as u32]),
    )
}

/// Publish the full list of managed client windows.
pub fn set_client_list<X: XConn>(x: &X, clients: &[Xid]) -> Result<()> {
    x.set_prop(
        x.root(),
        Atom::NetClientList.as_ref(),
        Prop::Window(clients.to_vec()),
    )
}

/// Publish (or clear) the currently active client window.
pub fn set_active_window<X: XConn>(x: &X, client: Option<Xid>) -> Result<()> {
    let root = x.root();

    match client {
        Some(id) => x.set_prop(root, Atom::NetActiveWindow.as_ref(), Prop::Window(vec![id])),
        None => x.delete_prop(root, Atom::NetActiveWindow.as_ref()),
    }
}
