//! User facing commands bound to keys in the config file
use crate::{
    core::{drag, handle, State},
    pure::{client::ClientState, tree::Layout},
    x::{XConn, XConnExt},
    Error, Result, Xid,
};
use std::process::{Command as Process, Stdio};
use tracing::{debug, trace, warn};

/// A direction argument for cycle / traverse commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards the predecessor leaf
    Left,
    /// Towards the successor leaf
    Right,
    /// Towards the predecessor leaf (stack traversal up)
    Up,
    /// Towards the successor leaf (stack traversal down)
    Down,
}

impl Direction {
    /// Whether this direction selects the in-order successor.
    pub fn is_forward(&self) -> bool {
        matches!(self, Direction::Right | Direction::Down)
    }
}

impl TryFrom<&str> for Direction {
    type Error = ();

    fn try_from(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            _ => Err(()),
        }
    }
}

/// Grow or shrink for the resize and gap commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeKind {
    /// Increase the focused share / gap
    Grow,
    /// Decrease the focused share / gap
    Shrink,
}

impl TryFrom<&str> for ResizeKind {
    type Error = ();

    fn try_from(s: &str) -> std::result::Result<Self, ()> {
        match s {
            "grow" => Ok(ResizeKind::Grow),
            "shrink" => Ok(ResizeKind::Shrink),
            _ => Err(()),
        }
    }
}

/// Every command that can be bound to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Toggle the focused client between tiled and floating
    ChangeState,
    /// Close the focused client (WM_DELETE_WINDOW or kill)
    Close,
    /// Focus the next / previous desktop on the focused monitor
    CycleDesktop,
    /// Move focus through the leaves of the focused desktop
    CycleWindow,
    /// Start a keyboard driven drag of the focused window
    Drag,
    /// Toggle fullscreen on the focused client
    Fullscreen,
    /// Grow or shrink the window gap
    GapHandler,
    /// Change the layout of the focused desktop
    Layout,
    /// Re-read the config file and apply the result
    ReloadConfig,
    /// Grow or shrink the focused window's share of its split
    Resize,
    /// Spawn an external process
    Run,
    /// Switch the focused monitor to the given desktop
    SwitchDesktop,
    /// Exchange the focused client with its in-order successor
    Swap,
    /// Move the focused client to the given desktop
    TransferNode,
    /// Cycle the visible window under the stack layout
    Traverse,
    /// Flip the split of the focused window's parent
    Flip,
}

/// Map a config file function name to its [Command].
pub fn command_for_name(name: &str) -> Option<Command> {
    match name {
        "change_state" => Some(Command::ChangeState),
        "kill" => Some(Command::Close),
        "cycle_desktop" => Some(Command::CycleDesktop),
        "cycle_window" => Some(Command::CycleWindow),
        "drag" => Some(Command::Drag),
        "fullscreen" => Some(Command::Fullscreen),
        "gap_handler" => Some(Command::GapHandler),
        "layout" => Some(Command::Layout),
        "reload_config" => Some(Command::ReloadConfig),
        "resize" => Some(Command::Resize),
        "run" => Some(Command::Run),
        "switch_desktop" => Some(Command::SwitchDesktop),
        "swap" => Some(Command::Swap),
        "transfer_node" => Some(Command::TransferNode),
        "traverse" => Some(Command::Traverse),
        "flip" => Some(Command::Flip),
        _ => None,
    }
}

/// The argument record handed to a command when it runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandArg {
    /// Direction for cycle / traverse commands
    pub direction: Option<Direction>,
    /// Layout for the layout command
    pub layout: Option<Layout>,
    /// Grow / shrink for resize and gap commands
    pub resize: Option<ResizeKind>,
    /// 1-based target desktop for switch / transfer
    pub desktop: Option<usize>,
    /// Argument vector for the run command
    pub cmd: Vec<String>,
    /// Forced client state (unused by the builtin commands, set by rules)
    pub state: Option<ClientState>,
}

/// Spawn an external command, detached from the manager.
pub(crate) fn spawn_command(cmd: &[String]) {
    let (prog, args) = match cmd.split_first() {
        Some(parts) => parts,
        None => return,
    };

    debug!(%prog, ?args, "spawning external command");
    let result = Process::new(prog)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    if let Err(e) = result {
        warn!(%prog, %e, "unable to spawn external command");
    }
}

/// Run a bound command against the current state.
///
/// A command invoked with nothing to act on (no focused window, empty tree,
/// missing argument) raises [Error::NoTarget] internally; it is absorbed
/// here so the caller sees a successful no-op.
pub fn run_command<X: XConn>(
    cmd: Command,
    arg: &CommandArg,
    state: &mut State,
    x: &X,
) -> Result<()> {
    debug!(?cmd, "running command");

    match dispatch(cmd, arg, state, x) {
        Err(Error::NoTarget(what)) => {
            trace!(?cmd, %what, "command has no target: ignoring");
            Ok(())
        }
        other => other,
    }
}

fn dispatch<X: XConn>(cmd: Command, arg: &CommandArg, state: &mut State, x: &X) -> Result<()> {
    match cmd {
        Command::Run => {
            spawn_command(&arg.cmd);
            Ok(())
        }

        Command::Close => x.close_or_kill(focused_window(state)?),

        Command::SwitchDesktop => {
            let n = desktop_arg(arg)?;
            let mon_ix = state.focused_monitor;

            handle::switch_desktop(state, x, mon_ix, n - 1)
        }

        Command::CycleDesktop => {
            let mon_ix = state.focused_monitor;
            let m = state.focused_monitor();
            let n = m.desktops.len();
            let current = m.focused_desktop_ix();
            let next = match arg.direction {
                Some(d) if !d.is_forward() => (current + n - 1) % n,
                _ => (current + 1) % n,
            };

            handle::switch_desktop(state, x, mon_ix, next)
        }

        Command::CycleWindow => {
            let forward = arg.direction.map(|d| d.is_forward()).unwrap_or(true);
            let window = {
                let t = &state.focused_desktop().tree;
                let from = t
                    .focused_leaf()
                    .or_else(|| t.leftmost_leaf())
                    .ok_or(Error::NoTarget("window to cycle from"))?;
                let next = if forward {
                    t.next_leaf(from)
                } else {
                    t.prev_leaf(from)
                };

                next.and_then(|n| t.client(n))
                    .map(|c| c.id)
                    .ok_or(Error::NoTarget("window to cycle to"))?
            };

            handle::update_focus(state, x, window)
        }

        Command::Resize => {
            let grow = matches!(arg.resize, Some(ResizeKind::Grow));
            let (mon_ix, desk_ix) = focused_desktop_ix(state);
            let d = state.focused_desktop_mut();
            let leaf = d
                .tree
                .focused_leaf()
                .ok_or(Error::NoTarget("focused window"))?;
            d.tree.resize_ratio(leaf, grow, 0.05);

            handle::apply_layouts(state, x, mon_ix)?;
            handle::render_desktop(state, x, mon_ix, desk_ix)
        }

        Command::GapHandler => {
            let gap = state.config.window_gap;
            state.config.window_gap = match arg.resize {
                Some(ResizeKind::Shrink) => gap.saturating_sub(5),
                _ => (gap + 5).min(60),
            };

            for mon_ix in 0..state.monitors.len() {
                handle::apply_layouts(state, x, mon_ix)?;
                let desk_ix = state.monitors[mon_ix].focused_desktop_ix();
                handle::render_desktop(state, x, mon_ix, desk_ix)?;
            }

            Ok(())
        }

        Command::Fullscreen => {
            let id = focused_window(state)?;
            let is_fs = state
                .find_window(id)
                .and_then(|(mi, di)| {
                    let t = &state.monitors[mi].desktops[di].tree;
                    t.leaf_for_window(id).and_then(|l| t.client(l)).copied()
                })
                .map(|c| c.is_fullscreen())
                .unwrap_or(false);

            handle::set_fullscreen(state, x, id, !is_fs)
        }

        Command::Swap => {
            let (mon_ix, desk_ix) = focused_desktop_ix(state);
            let d = state.focused_desktop_mut();
            let focused = d
                .tree
                .focused_leaf()
                .ok_or(Error::NoTarget("focused window"))?;
            let other = d
                .tree
                .next_leaf(focused)
                .filter(|&other| other != focused)
                .ok_or(Error::NoTarget("window to swap with"))?;
            d.tree.swap_clients(focused, other);

            handle::render_desktop(state, x, mon_ix, desk_ix)
        }

        Command::Flip => {
            let (mon_ix, desk_ix) = focused_desktop_ix(state);
            let d = state.focused_desktop_mut();
            let parent = d
                .tree
                .focused_leaf()
                .and_then(|l| d.tree.parent_of(l))
                .ok_or(Error::NoTarget("split to flip"))?;
            d.tree.flip(parent);

            handle::apply_layouts(state, x, mon_ix)?;
            handle::render_desktop(state, x, mon_ix, desk_ix)
        }

        Command::TransferNode => {
            let id = focused_window(state)?;
            let n = desktop_arg(arg)?;

            handle::transfer_window(state, x, id, n - 1)
        }

        Command::Layout => {
            let layout = arg.layout.ok_or(Error::NoTarget("layout argument"))?;
            let (mon_ix, desk_ix) = focused_desktop_ix(state);
            state.focused_desktop_mut().set_layout(layout);

            handle::apply_layouts(state, x, mon_ix)?;
            handle::render_desktop(state, x, mon_ix, desk_ix)
        }

        Command::Traverse => {
            let (mon_ix, desk_ix) = focused_desktop_ix(state);
            let forward = arg.direction.map(|d| d.is_forward()).unwrap_or(true);
            let window = state
                .focused_desktop_mut()
                .traverse_stack(forward)
                .ok_or(Error::NoTarget("stacked window"))?;

            handle::render_desktop(state, x, mon_ix, desk_ix)?;
            handle::update_focus(state, x, window)
        }

        Command::ChangeState => {
            let id = focused_window(state)?;

            handle::toggle_floating(state, x, id)
        }

        Command::ReloadConfig => handle::reload_config(state, x),

        Command::Drag => {
            let id = focused_window(state)?;

            drag::start_keyboard_drag(state, x, id)
        }
    }
}

fn focused_window(state: &State) -> Result<Xid> {
    let t = &state.focused_desktop().tree;
    t.focused_leaf()
        .and_then(|l| t.client(l))
        .map(|c| c.id)
        .ok_or(Error::NoTarget("focused window"))
}

fn desktop_arg(arg: &CommandArg) -> Result<usize> {
    match arg.desktop {
        Some(n) if n >= 1 => Ok(n),
        _ => Err(Error::NoTarget("desktop argument")),
    }
}

fn focused_desktop_ix(state: &State) -> (usize, usize) {
    let mon_ix = state.focused_monitor;
    (mon_ix, state.monitors[mon_ix].focused_desktop_ix())
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    #[test_case("kill", Some(Command::Close); "kill")]
    #[test_case("switch_desktop", Some(Command::SwitchDesktop); "switch desktop")]
    #[test_case("transfer_node", Some(Command::TransferNode); "transfer")]
    #[test_case("launch_rocket", None; "unknown command")]
    #[test]
    fn command_names_resolve(name: &str, expected: Option<Command>) {
        assert_eq!(command_for_name(name), expected);
    }

    #[test_case("left", Ok(Direction::Left); "left")]
    #[test_case("down", Ok(Direction::Down); "down")]
    #[test_case("sideways", Err(()); "unknown")]
    #[test]
    fn direction_parsing(s: &str, expected: std::result::Result<Direction, ()>) {
        assert_eq!(Direction::try_from(s), expected);
    }

    #[test]
    fn desktop_arg_rejects_zero_and_missing() {
        let mut arg = CommandArg::default();
        assert!(matches!(desktop_arg(&arg), Err(Error::NoTarget(_))));

        arg.desktop = Some(0);
        assert!(matches!(desktop_arg(&arg), Err(Error::NoTarget(_))));

        arg.desktop = Some(3);
        assert!(matches!(desktop_arg(&arg), Ok(3)));
    }
}
