//! Synthetic event injection
//!
//! The core service only knows the `Injector` trait; the concrete backend
//! here uses ydotool to send mouse and keyboard events via uinput at the
//! kernel level. Works on Wayland by bypassing the display server entirely.
//! Requires ydotoold daemon to be running: sudo systemctl enable --now ydotoold

use std::process::Command;
use tracing::{debug, info};

use crate::event::{Event, EventType, BTN_EXTRA, BTN_LEFT, REL_X, REL_Y};
use crate::HoldClickError;

/// Sink for synthetic events produced by the service.
///
/// `write_events` receives one ordered batch per logical frame. `close` is
/// called once, after the last write, during service shutdown.
pub trait Injector: Send {
    fn write_events(&mut self, events: &[Event]) -> Result<(), HoldClickError>;
    fn close(&mut self) -> Result<(), HoldClickError>;
}

/// Get the ydotool socket path
fn socket_path() -> String {
    let uid = unsafe { libc::getuid() };
    format!("/run/user/{}/.ydotool_socket", uid)
}

/// Convert an evdev button code to a ydotool click button index
fn button_index(code: u16) -> Option<u8> {
    // ydotool click encodes buttons as 0x00..0x04 plus a down/up bit
    if (BTN_LEFT..=BTN_EXTRA).contains(&code) {
        Some((code - BTN_LEFT) as u8)
    } else {
        None
    }
}

/// Injector that sends synthetic inputs via ydotool
pub struct YdotoolInjector {
    socket_path: String,
    // Rel deltas accumulate until the frame's Syn flushes them as one move
    pending_dx: i32,
    pending_dy: i32,
}

impl YdotoolInjector {
    /// Create a new YdotoolInjector
    ///
    /// Requires ydotool to be installed and ydotoold daemon running.
    pub fn new() -> Result<Self, HoldClickError> {
        let output = Command::new("which")
            .arg("ydotool")
            .output()
            .map_err(|e| {
                HoldClickError::InputAccess(format!("Failed to check for ydotool: {}", e))
            })?;

        if !output.status.success() {
            return Err(HoldClickError::InputAccess(
                "ydotool not found. Install it: sudo pacman -S ydotool".to_string(),
            ));
        }

        let test = Command::new("ydotool").args(["click", "--help"]).output();
        if test.is_err() {
            return Err(HoldClickError::InputAccess(
                "ydotoold daemon may not be running. Start it: sudo systemctl enable --now ydotoold"
                    .to_string(),
            ));
        }

        info!("ydotool injector ready");
        Ok(Self {
            socket_path: socket_path(),
            pending_dx: 0,
            pending_dy: 0,
        })
    }

    /// Run a ydotool command with the socket path set
    fn run_ydotool(&self, args: &[&str]) -> Result<(), HoldClickError> {
        let args_str = args.join(" ");
        let cmd = format!("YDOTOOL_SOCKET={} ydotool {}", self.socket_path, args_str);

        let output = Command::new("sh")
            .args(["-c", &cmd])
            .output()
            .map_err(|e| HoldClickError::SendEvent(format!("Failed to run ydotool: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HoldClickError::SendEvent(format!(
                "ydotool failed: {}",
                stderr
            )));
        }

        Ok(())
    }

    fn flush_motion(&mut self) -> Result<(), HoldClickError> {
        if self.pending_dx == 0 && self.pending_dy == 0 {
            return Ok(());
        }
        let dx = self.pending_dx.to_string();
        let dy = self.pending_dy.to_string();
        self.pending_dx = 0;
        self.pending_dy = 0;
        debug!(dx = %dx, dy = %dy, "Sending relative move via ydotool");
        self.run_ydotool(&["mousemove", "-x", &dx, "-y", &dy])
    }

    fn write_key(&mut self, code: u16, value: i32) -> Result<(), HoldClickError> {
        if let Some(index) = button_index(code) {
            // 0x40 = press bit, 0x80 = release bit
            let mask: u8 = if value != 0 { 0x40 } else { 0x80 };
            let arg = format!("0x{:02x}", mask | index);
            debug!(code, value, "Sending button event via ydotool");
            self.run_ydotool(&["click", &arg])
        } else {
            // ydotool key format: keycode:down
            let arg = format!("{}:{}", code, if value != 0 { 1 } else { 0 });
            debug!(code, value, "Sending key event via ydotool");
            self.run_ydotool(&["key", &arg])
        }
    }
}

impl Injector for YdotoolInjector {
    fn write_events(&mut self, events: &[Event]) -> Result<(), HoldClickError> {
        for event in events {
            match event.event_type {
                EventType::Rel => match event.code {
                    REL_X => self.pending_dx += event.value,
                    REL_Y => self.pending_dy += event.value,
                    other => debug!(code = other, "Ignoring unknown relative axis"),
                },
                EventType::Key => {
                    self.flush_motion()?;
                    self.write_key(event.code, event.value)?;
                }
                EventType::Syn => self.flush_motion()?,
                EventType::Abs => {
                    debug!(code = event.code, "Absolute events are not injected");
                }
            }
        }
        // Unterminated frames still move the cursor
        self.flush_motion()
    }

    fn close(&mut self) -> Result<(), HoldClickError> {
        debug!("ydotool injector closed");
        Ok(())
    }
}
