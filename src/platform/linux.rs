use super::{Observation, WindowInspector};
use crate::error::AppError;
use std::path::Path;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{AtomEnum, ConnectionExt, Window};
use x11rb::rust_connection::RustConnection;

/// Reads the focused window through EWMH properties on an X11 display.
///
/// The connection is opened once; if that fails (Wayland, headless) every
/// inspection returns an error and the tracker falls back to `Unknown`.
pub struct X11Inspector {
    conn: Option<RustConnection>,
    root: Window,
}

impl Default for X11Inspector {
    fn default() -> Self {
        Self::new()
    }
}

impl X11Inspector {
    pub fn new() -> Self {
        match x11rb::connect(None) {
            Ok((conn, screen_num)) => {
                let Some(root) = conn.setup().roots.get(screen_num).map(|s| s.root) else {
                    log::warn!(
                        "Invalid screen number {screen_num}, window inspection disabled"
                    );
                    return Self { conn: None, root: 0 };
                };
                Self { conn: Some(conn), root }
            }
            Err(e) => {
                log::warn!("Failed to connect to X server: {e}. Window inspection disabled");
                Self { conn: None, root: 0 }
            }
        }
    }

    fn conn(&self) -> Result<&RustConnection, AppError> {
        self.conn
            .as_ref()
            .ok_or_else(|| AppError::Inspector("no X11 connection".to_string()))
    }

    fn atom(&self, name: &str) -> Option<u32> {
        self.conn.as_ref()?
            .intern_atom(false, name.as_bytes())
            .ok()?
            .reply()
            .ok()
            .map(|r| r.atom)
    }

    fn property_bytes(&self, window: Window, atom: u32, kind: AtomEnum) -> Option<Vec<u8>> {
        let reply = self.conn.as_ref()?
            .get_property(false, window, atom, kind, 0, 1024)
            .ok()?
            .reply()
            .ok()?;
        (!reply.value.is_empty()).then_some(reply.value)
    }

    fn property_u32(&self, window: Window, atom: u32, kind: AtomEnum) -> Option<u32> {
        let reply = self.conn.as_ref()?
            .get_property(false, window, atom, kind, 0, 1)
            .ok()?
            .reply()
            .ok()?;
        let first = reply.value32()?.next();
        first
    }

    fn active_window(&self) -> Result<Window, AppError> {
        self.conn()?;
        let atom = self
            .atom("_NET_ACTIVE_WINDOW")
            .ok_or_else(|| AppError::Inspector("_NET_ACTIVE_WINDOW unavailable".to_string()))?;
        self.property_u32(self.root, atom, AtomEnum::WINDOW)
            .filter(|w| *w != 0)
            .ok_or_else(|| AppError::Inspector("no active window".to_string()))
    }

    fn window_title(&self, window: Window) -> Option<String> {
        self.atom("_NET_WM_NAME")
            .and_then(|atom| self.property_bytes(window, atom, AtomEnum::ANY))
            .or_else(|| self.property_bytes(window, AtomEnum::WM_NAME.into(), AtomEnum::ANY))
            .and_then(|bytes| String::from_utf8(bytes).ok())
    }

    fn process_executable(&self, window: Window) -> Option<String> {
        let pid = self
            .atom("_NET_WM_PID")
            .and_then(|atom| self.property_u32(window, atom, AtomEnum::CARDINAL));

        pid.and_then(executable_for_pid).or_else(|| {
            // No PID advertised; the WM_CLASS instance name is the next best thing
            self.property_bytes(window, AtomEnum::WM_CLASS.into(), AtomEnum::STRING)
                .and_then(|bytes| {
                    String::from_utf8(bytes)
                        .ok()?
                        .split('\0')
                        .next()
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                })
        })
    }
}

fn executable_for_pid(pid: u32) -> Option<String> {
    let proc_dir = Path::new("/proc").join(pid.to_string());
    if let Ok(target) = std::fs::read_link(proc_dir.join("exe")) {
        if let Some(name) = target.file_name().and_then(|n| n.to_str()) {
            return Some(name.to_string());
        }
    }
    std::fs::read_to_string(proc_dir.join("comm"))
        .ok()
        .map(|s| s.trim_end().to_string())
        .filter(|s| !s.is_empty())
}

impl WindowInspector for X11Inspector {
    fn inspect_foreground_window(&self) -> Result<Observation, AppError> {
        let window = self.active_window()?;
        Ok(Observation {
            process_executable: self.process_executable(window),
            window_title: self.window_title(window),
        })
    }
}
