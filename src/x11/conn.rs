//! API wrapper for talking to the X server using x11rb
use crate::{
    core::bindings::KeyCode,
    pure::geometry::{Point, Rect},
    x::{
        event::{ClientMessage, ConfigureEvent, PointerChange},
        Atom, ClientAttr, ClientConfig, OutputInfo, Prop, WindowAttributes, WmNormalHints,
        WmNormalHintsFlags, WmState, XConn, XEvent,
    },
    x11::{client_event_mask, root_event_mask},
    Error, Result, Xid,
};
use std::{collections::HashMap, str::FromStr};
use strum::IntoEnumIterator;
use tracing::{trace, warn};
use x11rb::{
    connection::{Connection, RequestConnection},
    properties::{WmClass, WmSizeHints},
    protocol::{
        randr::{self, ConnectionExt as _, NotifyMask},
        xproto::{
            AtomEnum, ButtonIndex, ChangeWindowAttributesAux, ClientMessageEvent,
            ConfigureWindowAux, ConnectionExt as _, CreateWindowAux, EventMask, GrabMode,
            InputFocus, ModMask, PropMode, StackMode, WindowClass, CLIENT_MESSAGE_EVENT,
        },
        Event,
    },
    rust_connection::RustConnection,
    wrapper::ConnectionExt as _,
};

/// Handles communication with an X server via the x11rb crate.
#[derive(Debug)]
pub struct RustConn {
    conn: RustConnection,
    root: Xid,
    screen_rect: Rect,
    atoms: HashMap<Atom, u32>,
    has_randr: bool,
    min_keycode: u8,
    max_keycode: u8,
}

impl RustConn {
    /// Connect to the X server using the `DISPLAY` environment variable.
    pub fn new() -> Result<Self> {
        let (conn, screen_ix) = x11rb::connect(None)?;
        let screen = &conn.setup().roots[screen_ix];
        let root = Xid(screen.root);
        let screen_rect = Rect::new(
            0,
            0,
            screen.width_in_pixels as u32,
            screen.height_in_pixels as u32,
        );
        let (min_keycode, max_keycode) = (conn.setup().min_keycode, conn.setup().max_keycode);

        // intern all known atoms up front: send every request before
        // reading the replies
        let cookies: Vec<_> = Atom::iter()
            .map(|atom| (atom, conn.intern_atom(false, atom.as_ref().as_bytes())))
            .collect();
        let mut atoms = HashMap::new();
        for (atom, cookie) in cookies {
            atoms.insert(atom, cookie?.reply()?.atom);
        }

        let has_randr = conn
            .extension_information(randr::X11_EXTENSION_NAME)?
            .is_some();
        if has_randr {
            let mask =
                NotifyMask::OUTPUT_CHANGE | NotifyMask::CRTC_CHANGE | NotifyMask::SCREEN_CHANGE;
            conn.randr_select_input(*root, mask)?;
        } else {
            warn!("the X server does not support randr: using a single synthetic output");
        }

        Ok(Self {
            conn,
            root,
            screen_rect,
            atoms,
            has_randr,
            min_keycode,
            max_keycode,
        })
    }

    fn known_atom(&self, atom: Atom) -> u32 {
        *self
            .atoms
            .get(&atom)
            .expect("all atoms are interned on startup")
    }

    fn next_xevent(&self) -> Result<XEvent> {
        loop {
            let event = self.conn.wait_for_event()?;

            if let Some(converted) = self.convert_event(event)? {
                return Ok(converted);
            }
        }
    }

    // Map a raw x11rb event onto our event type, dropping everything the
    // reducer does not consume.
    fn convert_event(&self, event: Event) -> Result<Option<XEvent>> {
        let converted = match event {
            Event::MapRequest(e) => Some(XEvent::MapRequest(Xid(e.window))),

            Event::UnmapNotify(e) => Some(XEvent::UnmapNotify(Xid(e.window))),

            Event::DestroyNotify(e) => Some(XEvent::Destroy(Xid(e.window))),

            Event::ConfigureRequest(e) => Some(XEvent::ConfigureRequest(ConfigureEvent {
                id: Xid(e.window),
                r: Rect::new(e.x as i32, e.y as i32, e.width as u32, e.height as u32),
            })),

            Event::ClientMessage(e) if e.format == 32 => {
                let dtype = self.atom_name(e.type_)?;
                Some(XEvent::ClientMessage(ClientMessage {
                    id: Xid(e.window),
                    dtype,
                    data: e.data.as_data32(),
                }))
            }
            Event::ClientMessage(_) => None,

            Event::EnterNotify(e) => Some(XEvent::Enter(PointerChange {
                id: Xid(e.event),
                abs: Point::new(e.root_x as i32, e.root_y as i32),
            })),

            Event::LeaveNotify(e) => Some(XEvent::Leave(PointerChange {
                id: Xid(e.event),
                abs: Point::new(e.root_x as i32, e.root_y as i32),
            })),

            Event::ButtonPress(e) => Some(XEvent::ButtonPress(PointerChange {
                id: Xid(e.event),
                abs: Point::new(e.root_x as i32, e.root_y as i32),
            })),

            Event::ButtonRelease(e) => Some(XEvent::ButtonRelease(Point::new(
                e.root_x as i32,
                e.root_y as i32,
            ))),

            Event::MotionNotify(e) => Some(XEvent::MotionNotify(Point::new(
                e.root_x as i32,
                e.root_y as i32,
            ))),

            Event::KeyPress(e) => Some(XEvent::KeyPress(KeyCode {
                mask: u16::from(e.state),
                code: e.detail,
            })),

            Event::MappingNotify(_) => Some(XEvent::MappingNotify),

            Event::RandrScreenChangeNotify(_) | Event::RandrNotify(_) => Some(XEvent::RandrNotify),

            _ => None,
        };

        Ok(converted)
    }

    fn decode_property(
        &self,
        r: x11rb::protocol::xproto::GetPropertyReply,
    ) -> Result<Option<Prop>> {
        if r.value.is_empty() {
            return Ok(None);
        }

        let prop = if r.type_ == u32::from(AtomEnum::ATOM) {
            let names = r
                .value32()
                .into_iter()
                .flatten()
                .map(|a| self.atom_name(a))
                .collect::<Result<Vec<String>>>()?;
            Prop::Atom(names)
        } else if r.type_ == u32::from(AtomEnum::WINDOW) {
            Prop::Window(r.value32().into_iter().flatten().map(Xid).collect())
        } else if r.type_ == u32::from(AtomEnum::CARDINAL) {
            Prop::Cardinal(r.value32().into_iter().flatten().collect())
        } else if r.type_ == u32::from(AtomEnum::STRING)
            || r.type_ == self.known_atom(Atom::UTF8String)
        {
            let strs = String::from_utf8_lossy(&r.value)
                .split('\0')
                .filter(|s| !s.is_empty())
                .map(|s| s.to_owned())
                .collect();
            Prop::UTF8String(strs)
        } else {
            return Ok(None);
        };

        Ok(Some(prop))
    }
}

impl XConn for RustConn {
    fn root(&self) -> Xid {
        self.root
    }

    fn screen_rect(&self) -> Result<Rect> {
        Ok(self.screen_rect)
    }

    fn current_outputs(&self) -> Result<Vec<OutputInfo>> {
        if !self.has_randr {
            return Ok(Vec::new());
        }

        let reply = self.conn.randr_get_monitors(*self.root, true)?.reply()?;
        let mut outputs = Vec::with_capacity(reply.monitors.len());

        for (i, m) in reply.monitors.into_iter().enumerate() {
            if m.width == 0 || m.height == 0 {
                continue;
            }
            let name = self
                .atom_name(m.name)
                .unwrap_or_else(|_| format!("output-{i}"));

            outputs.push(OutputInfo {
                name,
                rect: Rect::new(m.x as i32, m.y as i32, m.width as u32, m.height as u32),
                randr_id: m.name,
                primary: m.primary,
            });
        }

        Ok(outputs)
    }

    fn cursor_position(&self) -> Result<Point> {
        let reply = self.conn.query_pointer(*self.root)?.reply()?;

        Ok(Point::new(reply.root_x as i32, reply.root_y as i32))
    }

    fn window_under_cursor(&self) -> Result<Option<Xid>> {
        let reply = self.conn.query_pointer(*self.root)?.reply()?;

        Ok(match reply.child {
            0 => None,
            w => Some(Xid(w)),
        })
    }

    fn become_wm(&self) -> Result<()> {
        trace!("claiming substructure redirection on the root window");
        let aux = ChangeWindowAttributesAux::new().event_mask(root_event_mask());

        self.conn
            .change_window_attributes(*self.root, &aux)?
            .check()
            .map_err(|_| Error::NotTheWm)
    }

    fn next_event(&self) -> Result<XEvent> {
        self.next_xevent()
    }

    fn flush(&self) {
        let _ = self.conn.flush();
    }

    fn intern_atom(&self, atom: &str) -> Result<u32> {
        if let Ok(known) = Atom::from_str(atom) {
            return Ok(self.known_atom(known));
        }

        Ok(self.conn.intern_atom(false, atom.as_bytes())?.reply()?.atom)
    }

    fn atom_name(&self, atom: u32) -> Result<String> {
        if let Some((known, _)) = self.atoms.iter().find(|&(_, &id)| id == atom) {
            return Ok(known.as_ref().to_owned());
        }

        let reply = self.conn.get_atom_name(atom)?.reply()?;

        Ok(String::from_utf8_lossy(&reply.name).into_owned())
    }

    fn get_prop(&self, client: Xid, prop_name: &str) -> Result<Option<Prop>> {
        let atom = self.intern_atom(prop_name)?;
        let reply = self
            .conn
            .get_property(false, *client, atom, AtomEnum::ANY, 0, 1024)?
            .reply()?;

        self.decode_property(reply)
    }

    fn set_prop(&self, target: Xid, prop_name: &str, value: Prop) -> Result<()> {
        let prop = self.intern_atom(prop_name)?;

        match value {
            Prop::Atom(names) => {
                let atoms = names
                    .iter()
                    .map(|n| self.intern_atom(n))
                    .collect::<Result<Vec<u32>>>()?;
                self.conn.change_property32(
                    PropMode::REPLACE,
                    *target,
                    prop,
                    AtomEnum::ATOM,
                    &atoms,
                )?;
            }

            Prop::Cardinal(vals) => {
                self.conn.change_property32(
                    PropMode::REPLACE,
                    *target,
                    prop,
                    AtomEnum::CARDINAL,
                    &vals,
                )?;
            }

            Prop::Window(ids) => {
                let raw: Vec<u32> = ids.iter().map(|id| **id).collect();
                self.conn.change_property32(
                    PropMode::REPLACE,
                    *target,
                    prop,
                    AtomEnum::WINDOW,
                    &raw,
                )?;
            }

            Prop::UTF8String(strs) => {
                self.conn.change_property8(
                    PropMode::REPLACE,
                    *target,
                    prop,
                    self.known_atom(Atom::UTF8String),
                    strs.join("\0").as_bytes(),
                )?;
            }
        }

        Ok(())
    }

    fn delete_prop(&self, target: Xid, prop_name: &str) -> Result<()> {
        let atom = self.intern_atom(prop_name)?;
        self.conn.delete_property(*target, atom)?;

        Ok(())
    }

    fn get_window_attributes(&self, client: Xid) -> Result<WindowAttributes> {
        let reply = self.conn.get_window_attributes(*client)?.reply()?;

        Ok(WindowAttributes {
            override_redirect: reply.override_redirect,
        })
    }

    fn normal_hints(&self, client: Xid) -> Result<Option<WmNormalHints>> {
        let hints = match WmSizeHints::get_normal_hints(&self.conn, *client)?.reply() {
            Ok(h) => h,
            Err(_) => return Ok(None),
        };

        let mut flags = WmNormalHintsFlags::empty();
        let min = hints.min_size.map(|(w, h)| (w.max(0) as u32, h.max(0) as u32));
        let max = hints.max_size.map(|(w, h)| (w.max(0) as u32, h.max(0) as u32));
        if min.is_some() {
            flags |= WmNormalHintsFlags::P_MIN_SIZE;
        }
        if max.is_some() {
            flags |= WmNormalHintsFlags::P_MAX_SIZE;
        }

        Ok(Some(WmNormalHints::new(flags, min, max)))
    }

    fn window_class(&self, client: Xid) -> Result<Option<String>> {
        let class = WmClass::get(&self.conn, *client)?
            .reply_unchecked()
            .ok()
            .flatten()
            .and_then(|c| String::from_utf8(c.class().to_vec()).ok());

        Ok(class)
    }

    fn window_type(&self, client: Xid) -> Result<Option<Atom>> {
        let atoms = match self.get_prop(client, Atom::NetWmWindowType.as_ref())? {
            Some(Prop::Atom(atoms)) => atoms,
            _ => return Ok(None),
        };

        Ok(atoms.iter().find_map(|name| Atom::from_str(name).ok()))
    }

    fn client_geometry(&self, client: Xid) -> Result<Rect> {
        let g = self.conn.get_geometry(*client)?.reply()?;

        Ok(Rect::new(g.x as i32, g.y as i32, g.width as u32, g.height as u32))
    }

    fn set_client_config(&self, client: Xid, data: &[ClientConfig]) -> Result<()> {
        let mut aux = ConfigureWindowAux::new();

        for conf in data {
            aux = match conf {
                ClientConfig::BorderPx(px) => aux.border_width(*px),
                ClientConfig::Position(r) => aux
                    .x(r.x)
                    .y(r.y)
                    .width(r.w.max(1))
                    .height(r.h.max(1)),
                ClientConfig::StackTop => aux.stack_mode(StackMode::ABOVE),
                ClientConfig::StackBottom => aux.stack_mode(StackMode::BELOW),
            };
        }

        self.conn.configure_window(*client, &aux)?;

        Ok(())
    }

    fn set_client_attributes(&self, client: Xid, attrs: &[ClientAttr]) -> Result<()> {
        let mut aux = ChangeWindowAttributesAux::new();

        for attr in attrs {
            aux = match attr {
                ClientAttr::BorderColor(argb) => aux.border_pixel(*argb),
                ClientAttr::ClientEventMask => aux.event_mask(client_event_mask()),
                ClientAttr::RootEventMask => aux.event_mask(root_event_mask()),
            };
        }

        self.conn.change_window_attributes(*client, &aux)?;

        Ok(())
    }

    fn map(&self, client: Xid) -> Result<()> {
        self.conn.map_window(*client)?;

        Ok(())
    }

    fn unmap(&self, client: Xid) -> Result<()> {
        self.conn.unmap_window(*client)?;

        Ok(())
    }

    fn kill(&self, client: Xid) -> Result<()> {
        self.conn.kill_client(*client)?;

        Ok(())
    }

    fn focus(&self, client: Xid) -> Result<()> {
        self.conn
            .set_input_focus(InputFocus::POINTER_ROOT, *client, x11rb::CURRENT_TIME)?;

        Ok(())
    }

    fn set_wm_state(&self, client: Xid, state: WmState) -> Result<()> {
        let wm_state = self.known_atom(Atom::WmState);
        let data = [u32::from(state), 0];
        self.conn
            .change_property32(PropMode::REPLACE, *client, wm_state, wm_state, &data)?;

        Ok(())
    }

    fn supports_protocol(&self, client: Xid, proto: Atom) -> Result<bool> {
        match self.get_prop(client, Atom::WmProtocols.as_ref())? {
            Some(Prop::Atom(protocols)) => Ok(protocols.iter().any(|p| p == proto.as_ref())),
            _ => Ok(false),
        }
    }

    fn send_protocol_message(&self, client: Xid, proto: Atom) -> Result<()> {
        let event = ClientMessageEvent {
            response_type: CLIENT_MESSAGE_EVENT,
            format: 32,
            sequence: 0,
            window: *client,
            type_: self.known_atom(Atom::WmProtocols),
            data: [self.known_atom(proto), x11rb::CURRENT_TIME, 0, 0, 0].into(),
        };
        self.conn
            .send_event(false, *client, EventMask::NO_EVENT, event)?;

        Ok(())
    }

    fn warp_pointer(&self, target: Xid, x: i16, y: i16) -> Result<()> {
        self.conn
            .warp_pointer(x11rb::NONE, *target, 0, 0, 0, 0, x, y)?;

        Ok(())
    }

    fn grab_keys(&self, key_codes: &[KeyCode]) -> Result<()> {
        // NumLock and CapsLock alter the modifier mask of events, so grab
        // every lock-key combination alongside the plain binding
        let lock_masks = [
            ModMask::from(0u16),
            ModMask::M2,
            ModMask::LOCK,
            ModMask::M2 | ModMask::LOCK,
        ];

        for key in key_codes {
            for m in lock_masks {
                self.conn.grab_key(
                    false,
                    *self.root,
                    ModMask::from(key.mask) | m,
                    key.code,
                    GrabMode::ASYNC,
                    GrabMode::ASYNC,
                )?;
            }
        }

        self.flush();

        Ok(())
    }

    fn ungrab_keys(&self) -> Result<()> {
        // keycode 0 == AnyKey
        self.conn.ungrab_key(0_u8, *self.root, ModMask::ANY)?;

        Ok(())
    }

    fn grab_buttons(&self, client: Xid) -> Result<()> {
        self.conn.grab_button(
            false,
            *client,
            EventMask::BUTTON_PRESS,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
            x11rb::NONE,
            x11rb::NONE,
            ButtonIndex::ANY,
            ModMask::ANY,
        )?;

        Ok(())
    }

    fn ungrab_buttons(&self, client: Xid) -> Result<()> {
        self.conn
            .ungrab_button(ButtonIndex::ANY, *client, ModMask::ANY)?;

        Ok(())
    }

    fn grab_pointer(&self) -> Result<()> {
        let mask = EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION;
        self.conn
            .grab_pointer(
                false,
                *self.root,
                mask,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                x11rb::NONE,
                x11rb::NONE,
                x11rb::CURRENT_TIME,
            )?
            .reply()?;

        Ok(())
    }

    fn ungrab_pointer(&self) -> Result<()> {
        self.conn.ungrab_pointer(x11rb::CURRENT_TIME)?;

        Ok(())
    }

    fn keycodes_for_keysym(&self, keysym: u32) -> Result<Vec<u8>> {
        let count = self.max_keycode - self.min_keycode + 1;
        let reply = self
            .conn
            .get_keyboard_mapping(self.min_keycode, count)?
            .reply()?;

        let per = reply.keysyms_per_keycode as usize;
        let mut codes = Vec::new();

        for (i, chunk) in reply.keysyms.chunks(per).enumerate() {
            // only the unshifted and shifted columns are considered
            if chunk.iter().take(2).any(|&ks| ks == keysym) {
                codes.push(self.min_keycode + i as u8);
            }
        }

        Ok(codes)
    }

    fn create_check_window(&self) -> Result<Xid> {
        let id = self.conn.generate_id()?;
        let aux = CreateWindowAux::new().override_redirect(1);
        self.conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            id,
            *self.root,
            -1,
            -1,
            1,
            1,
            0,
            WindowClass::INPUT_OUTPUT,
            x11rb::COPY_FROM_PARENT,
            &aux,
        )?;

        Ok(Xid(id))
    }
}
