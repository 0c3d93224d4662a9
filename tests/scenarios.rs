//! End to end scenarios driven through the event reducer with an in-memory
//! X connection standing in for the server.
use arbor::{
    core::{
        commands::{Command, CommandArg},
        Config, Xid,
    },
    pure::{
        geometry::{Point, Rect},
        tree::Layout,
    },
    x::{
        event::{ClientMessage, PointerChange},
        Atom, ClientAttr, ClientConfig, OutputInfo, Prop, WindowAttributes, WmNormalHints,
        WmState, XConn, XEvent,
    },
    Result, WindowManager,
};
use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
};

const SCREEN: Rect = Rect::new(0, 0, 1920, 1080);

/// An in-memory [XConn] that records the requests the manager issues.
#[derive(Debug, Default)]
struct StubConn {
    positions: RefCell<HashMap<u32, Rect>>,
    mapped: RefCell<Vec<u32>>,
    unmapped: RefCell<Vec<u32>>,
    focused: RefCell<Option<u32>>,
    killed: RefCell<Vec<u32>>,
    window_types: RefCell<HashMap<u32, Atom>>,
    geometry: RefCell<HashMap<u32, Rect>>,
    props: RefCell<HashMap<(u32, String), Prop>>,
    interned: RefCell<Vec<String>>,
}

impl StubConn {
    fn set_window_type(&self, window: u32, t: Atom) {
        self.window_types.borrow_mut().insert(window, t);
    }

    fn position_of(&self, window: u32) -> Option<Rect> {
        self.positions.borrow().get(&window).copied()
    }

    fn root_prop(&self, name: &str) -> Option<Prop> {
        self.props.borrow().get(&(1, name.to_owned())).cloned()
    }
}

impl XConn for StubConn {
    fn root(&self) -> Xid {
        Xid(1)
    }

    fn screen_rect(&self) -> Result<Rect> {
        Ok(SCREEN)
    }

    fn current_outputs(&self) -> Result<Vec<OutputInfo>> {
        Ok(vec![OutputInfo {
            name: "DP-1".to_owned(),
            rect: SCREEN,
            randr_id: 7,
            primary: true,
        }])
    }

    fn cursor_position(&self) -> Result<Point> {
        Ok(Point::new(0, 0))
    }

    fn window_under_cursor(&self) -> Result<Option<Xid>> {
        Ok(None)
    }

    fn become_wm(&self) -> Result<()> {
        Ok(())
    }

    fn next_event(&self) -> Result<XEvent> {
        panic!("the stub connection has no event stream: drive handle_xevent directly");
    }

    fn flush(&self) {}

    fn intern_atom(&self, atom: &str) -> Result<u32> {
        let mut interned = self.interned.borrow_mut();
        let ix = match interned.iter().position(|a| a == atom) {
            Some(ix) => ix,
            None => {
                interned.push(atom.to_owned());
                interned.len() - 1
            }
        };

        Ok(100 + ix as u32)
    }

    fn atom_name(&self, atom: u32) -> Result<String> {
        Ok(self
            .interned
            .borrow()
            .get((atom - 100) as usize)
            .cloned()
            .unwrap_or_default())
    }

    fn get_prop(&self, client: Xid, prop_name: &str) -> Result<Option<Prop>> {
        Ok(self.props.borrow().get(&(*client, prop_name.to_owned())).cloned())
    }

    fn set_prop(&self, target: Xid, prop_name: &str, value: Prop) -> Result<()> {
        self.props
            .borrow_mut()
            .insert((*target, prop_name.to_owned()), value);

        Ok(())
    }

    fn delete_prop(&self, target: Xid, prop_name: &str) -> Result<()> {
        self.props
            .borrow_mut()
            .remove(&(*target, prop_name.to_owned()));

        Ok(())
    }

    fn get_window_attributes(&self, _: Xid) -> Result<WindowAttributes> {
        Ok(WindowAttributes::default())
    }

    fn normal_hints(&self, _: Xid) -> Result<Option<WmNormalHints>> {
        Ok(None)
    }

    fn window_class(&self, _: Xid) -> Result<Option<String>> {
        Ok(None)
    }

    fn window_type(&self, client: Xid) -> Result<Option<Atom>> {
        Ok(self.window_types.borrow().get(&client).copied())
    }

    fn client_geometry(&self, client: Xid) -> Result<Rect> {
        Ok(self
            .geometry
            .borrow()
            .get(&client)
            .copied()
            .unwrap_or(Rect::new(0, 0, 800, 600)))
    }

    fn set_client_config(&self, client: Xid, data: &[ClientConfig]) -> Result<()> {
        for conf in data {
            if let ClientConfig::Position(r) = conf {
                self.positions.borrow_mut().insert(*client, *r);
            }
        }

        Ok(())
    }

    fn set_client_attributes(&self, _: Xid, _: &[ClientAttr]) -> Result<()> {
        Ok(())
    }

    fn map(&self, client: Xid) -> Result<()> {
        self.mapped.borrow_mut().push(*client);

        Ok(())
    }

    fn unmap(&self, client: Xid) -> Result<()> {
        self.unmapped.borrow_mut().push(*client);

        Ok(())
    }

    fn kill(&self, client: Xid) -> Result<()> {
        self.killed.borrow_mut().push(*client);

        Ok(())
    }

    fn focus(&self, client: Xid) -> Result<()> {
        *self.focused.borrow_mut() = Some(*client);

        Ok(())
    }

    fn set_wm_state(&self, _: Xid, _: WmState) -> Result<()> {
        Ok(())
    }

    fn supports_protocol(&self, _: Xid, _: Atom) -> Result<bool> {
        Ok(false)
    }

    fn send_protocol_message(&self, _: Xid, _: Atom) -> Result<()> {
        Ok(())
    }

    fn warp_pointer(&self, _: Xid, _: i16, _: i16) -> Result<()> {
        Ok(())
    }

    fn grab_keys(&self, _: &[arbor::core::bindings::KeyCode]) -> Result<()> {
        Ok(())
    }

    fn ungrab_keys(&self) -> Result<()> {
        Ok(())
    }

    fn grab_buttons(&self, _: Xid) -> Result<()> {
        Ok(())
    }

    fn ungrab_buttons(&self, _: Xid) -> Result<()> {
        Ok(())
    }

    fn grab_pointer(&self) -> Result<()> {
        Ok(())
    }

    fn ungrab_pointer(&self) -> Result<()> {
        Ok(())
    }

    fn keycodes_for_keysym(&self, keysym: u32) -> Result<Vec<u8>> {
        Ok(vec![(keysym & 0xff) as u8])
    }

    fn create_check_window(&self) -> Result<Xid> {
        Ok(Xid(999))
    }
}

fn new_wm() -> WindowManager<StubConn> {
    let config = Config {
        border_width: 2,
        window_gap: 10,
        virtual_desktops: 5,
        focus_follow_spawn: true,
        ..Config::default()
    };

    WindowManager::new(config, None, StubConn::default()).expect("stub wm to build")
}

fn map_normal(wm: &mut WindowManager<StubConn>, window: u32) {
    wm.conn().set_window_type(window, Atom::NetWindowTypeNormal);
    wm.handle_xevent(XEvent::MapRequest(Xid(window)))
        .expect("map request to be handled");
}

#[test]
fn first_window_fills_the_usable_rect() {
    let mut wm = new_wm();

    map_normal(&mut wm, 42);

    assert_eq!(wm.conn().position_of(42), Some(Rect::new(12, 12, 1892, 1052)));
    assert_eq!(*wm.conn().focused.borrow(), Some(42));

    let d = wm.state.focused_desktop();
    assert_eq!(d.client_count(), 1);
    let leaf = d.tree.focused_leaf().expect("the new leaf is focused");
    assert_eq!(d.tree.client(leaf).map(|c| c.id), Some(Xid(42)));
}

#[test]
fn second_window_splits_the_first() {
    let mut wm = new_wm();

    map_normal(&mut wm, 42);
    map_normal(&mut wm, 43);

    assert_eq!(wm.conn().position_of(42), Some(Rect::new(12, 12, 936, 1052)));
    assert_eq!(wm.conn().position_of(43), Some(Rect::new(958, 12, 946, 1052)));

    let d = wm.state.focused_desktop();
    assert_eq!(d.client_count(), 2);
    let root = d.tree.root().expect("tree is non-empty");
    assert!(!d.tree.node(root).is_leaf());
}

#[test]
fn transfer_and_switch_round_trip() {
    let mut wm = new_wm();
    map_normal(&mut wm, 42);
    map_normal(&mut wm, 43);

    // 43 holds focus after spawn: transfer it to desktop 2
    wm.run_command(
        Command::TransferNode,
        &CommandArg {
            desktop: Some(2),
            ..CommandArg::default()
        },
    )
    .expect("transfer to succeed");

    assert_eq!(wm.conn().position_of(42), Some(Rect::new(12, 12, 1892, 1052)));
    assert!(wm.conn().unmapped.borrow().contains(&43));

    wm.run_command(
        Command::SwitchDesktop,
        &CommandArg {
            desktop: Some(2),
            ..CommandArg::default()
        },
    )
    .expect("switch to succeed");

    assert_eq!(wm.conn().position_of(43), Some(Rect::new(12, 12, 1892, 1052)));
    assert_eq!(
        wm.state.focused_desktop().tree.windows(),
        vec![Xid(43)],
        "desktop 2 holds exactly the transferred window"
    );
    assert_eq!(
        wm.conn().root_prop(Atom::NetCurrentDesktop.as_ref()),
        Some(Prop::Cardinal(vec![1]))
    );
}

#[test]
fn master_layout_with_three_windows() {
    let mut wm = new_wm();
    for w in [42, 43, 44] {
        map_normal(&mut wm, w);
    }

    wm.run_command(
        Command::Layout,
        &CommandArg {
            layout: Some(Layout::Master),
            ..CommandArg::default()
        },
    )
    .expect("layout change to succeed");

    // leftmost in-order leaf (window 42) becomes master at 70% width
    let master = wm.conn().position_of(42).expect("42 was positioned");
    assert_eq!(master, Rect::new(12, 12, 1314, 1052));

    // the other two tile the right column top-over-bottom
    let others: HashSet<Rect> = [43, 44]
        .iter()
        .map(|&w| wm.conn().position_of(w).expect("positioned"))
        .collect();
    let expected: HashSet<Rect> = [
        Rect::new(1336, 12, 568, 521),
        Rect::new(1336, 543, 568, 521),
    ]
    .into_iter()
    .collect();
    assert_eq!(others, expected);
}

#[test]
fn drag_cancel_restores_the_layout() {
    let mut wm = new_wm();
    map_normal(&mut wm, 42);
    map_normal(&mut wm, 43);

    // resolve bindings so escape is known to the reducer
    wm.handle_xevent(XEvent::MappingNotify).expect("mapping notify");

    let before_tree = wm.state.focused_desktop().tree.clone();
    let before_42 = wm.conn().position_of(42);
    let before_43 = wm.conn().position_of(43);

    wm.run_command(Command::Drag, &CommandArg::default())
        .expect("drag start");
    assert!(wm.state.drag.active);

    // hover over the other window to trigger a preview, then cancel
    let over_42 = Rect::new(12, 12, 936, 1052).midpoint();
    wm.handle_xevent(XEvent::MotionNotify(over_42)).expect("motion");
    wm.handle_xevent(XEvent::KeyPress(arbor::core::bindings::KeyCode {
        mask: 0,
        code: 0x1b,
    }))
    .expect("escape");

    assert!(!wm.state.drag.active);
    assert_eq!(wm.state.focused_desktop().tree, before_tree);
    assert_eq!(wm.conn().position_of(42), before_42);
    assert_eq!(wm.conn().position_of(43), before_43);
}

#[test]
fn drag_to_the_same_target_is_a_noop() {
    let mut wm = new_wm();
    map_normal(&mut wm, 42);
    map_normal(&mut wm, 43);

    let before_tree = wm.state.focused_desktop().tree.clone();

    wm.run_command(Command::Drag, &CommandArg::default())
        .expect("drag start");
    let own_center = Rect::new(958, 12, 946, 1052).midpoint();
    wm.handle_xevent(XEvent::ButtonRelease(own_center))
        .expect("drop");

    assert!(!wm.state.drag.active);
    assert_eq!(wm.state.focused_desktop().tree, before_tree);
}

#[test]
fn drag_commit_relocates_the_window() {
    let mut wm = new_wm();
    for w in [42, 43, 44] {
        map_normal(&mut wm, w);
    }
    assert_eq!(
        wm.state.focused_desktop().tree.windows(),
        vec![Xid(42), Xid(44), Xid(43)]
    );

    // drag the focused window (44) onto 43 and drop
    wm.run_command(Command::Drag, &CommandArg::default())
        .expect("drag start");
    let over_43 = Rect::new(958, 12, 946, 1052).midpoint();
    wm.handle_xevent(XEvent::MotionNotify(over_43)).expect("motion");
    wm.handle_xevent(XEvent::ButtonRelease(over_43)).expect("drop");

    assert!(!wm.state.drag.active);
    let d = wm.state.focused_desktop();
    assert_eq!(d.client_count(), 3);
    // 44 now splits 43's slot instead of 42's
    assert_eq!(d.tree.windows(), vec![Xid(42), Xid(43), Xid(44)]);
}

#[test]
fn commands_without_a_target_are_successful_noops() {
    let mut wm = new_wm();

    for cmd in [
        Command::Close,
        Command::CycleWindow,
        Command::Resize,
        Command::Fullscreen,
        Command::Swap,
        Command::Flip,
        Command::TransferNode,
        Command::Traverse,
        Command::ChangeState,
        Command::Drag,
    ] {
        wm.run_command(cmd, &CommandArg::default())
            .expect("missing targets are absorbed as no-ops");
    }

    assert!(wm.state.focused_desktop().tree.is_empty());
    assert!(wm.conn().positions.borrow().is_empty());
    assert!(wm.conn().killed.borrow().is_empty());
}

#[test]
fn unmap_for_an_unknown_window_has_no_side_effects() {
    let mut wm = new_wm();
    map_normal(&mut wm, 42);

    let positions_before = wm.conn().positions.borrow().clone();
    let tree_before = wm.state.focused_desktop().tree.clone();

    wm.handle_xevent(XEvent::UnmapNotify(Xid(777)))
        .expect("unmap of an unknown window is fine");

    assert_eq!(*wm.conn().positions.borrow(), positions_before);
    assert_eq!(wm.state.focused_desktop().tree, tree_before);
    assert!(wm.conn().killed.borrow().is_empty());
}

#[test]
fn fullscreen_message_round_trips() {
    let mut wm = new_wm();
    map_normal(&mut wm, 42);
    map_normal(&mut wm, 43);
    let tiled = wm.conn().position_of(43).expect("43 was positioned");

    let fs_atom = wm
        .conn()
        .intern_atom(Atom::NetWmStateFullscreen.as_ref())
        .expect("interning");

    // _NET_WM_STATE ADD
    wm.handle_xevent(XEvent::ClientMessage(ClientMessage {
        id: Xid(43),
        dtype: Atom::NetWmState.as_ref().to_owned(),
        data: [1, fs_atom, 0, 0, 0],
    }))
    .expect("fullscreen add");
    assert_eq!(wm.conn().position_of(43), Some(SCREEN));

    // _NET_WM_STATE TOGGLE back to tiled
    wm.handle_xevent(XEvent::ClientMessage(ClientMessage {
        id: Xid(43),
        dtype: Atom::NetWmState.as_ref().to_owned(),
        data: [2, fs_atom, 0, 0, 0],
    }))
    .expect("fullscreen toggle");
    assert_eq!(wm.conn().position_of(43), Some(tiled));
}

#[test]
fn floating_dialogs_are_centered() {
    let mut wm = new_wm();
    map_normal(&mut wm, 42);

    wm.conn()
        .geometry
        .borrow_mut()
        .insert(43, Rect::new(0, 0, 400, 300));
    wm.conn().set_window_type(43, Atom::NetWindowTypeDialog);
    wm.handle_xevent(XEvent::MapRequest(Xid(43))).expect("map dialog");

    // centered in the 1920x1080 monitor; the floating leaf still occupies
    // a partition slot so 42 is re-tiled into the left half
    assert_eq!(wm.conn().position_of(43), Some(Rect::new(760, 390, 400, 300)));
    assert_eq!(wm.conn().position_of(42), Some(Rect::new(12, 12, 936, 1052)));
}

#[test]
fn enter_notify_moves_focus_when_following_the_pointer() {
    let mut wm = new_wm();
    map_normal(&mut wm, 42);
    map_normal(&mut wm, 43);
    assert_eq!(*wm.conn().focused.borrow(), Some(43));

    wm.handle_xevent(XEvent::Enter(PointerChange {
        id: Xid(42),
        abs: Rect::new(12, 12, 936, 1052).midpoint(),
    }))
    .expect("enter");

    assert_eq!(*wm.conn().focused.borrow(), Some(42));
    let d = wm.state.focused_desktop();
    let focused = d.tree.focused_leaf().expect("a leaf is focused");
    assert_eq!(d.tree.client(focused).map(|c| c.id), Some(Xid(42)));
}

#[test]
fn client_list_tracks_insertions_and_removals() {
    let mut wm = new_wm();
    map_normal(&mut wm, 42);
    map_normal(&mut wm, 43);

    assert_eq!(
        wm.conn().root_prop(Atom::NetClientList.as_ref()),
        Some(Prop::Window(vec![Xid(42), Xid(43)]))
    );

    wm.handle_xevent(XEvent::Destroy(Xid(43))).expect("destroy");

    assert_eq!(
        wm.conn().root_prop(Atom::NetClientList.as_ref()),
        Some(Prop::Window(vec![Xid(42)]))
    );
}
