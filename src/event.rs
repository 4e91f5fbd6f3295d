//! Platform-neutral input event model
//!
//! Events mirror the Linux evdev shape (type/code/value) so that kernel,
//! X11 and hook-based backends can all normalize into the same struct before
//! anything reaches the core service.

/// Synchronization report code: terminates one atomic input frame.
pub const SYN_REPORT: u16 = 0;

/// Primary (left) mouse button.
pub const BTN_LEFT: u16 = 0x110;
/// Secondary (right) mouse button.
pub const BTN_RIGHT: u16 = 0x111;
/// Middle mouse button.
pub const BTN_MIDDLE: u16 = 0x112;
/// Side mouse button (usually button 4).
pub const BTN_SIDE: u16 = 0x113;
/// Extra mouse button (usually button 5).
pub const BTN_EXTRA: u16 = 0x114;

/// Relative motion along the X axis.
pub const REL_X: u16 = 0x00;
/// Relative motion along the Y axis.
pub const REL_Y: u16 = 0x01;

/// Kind of input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Frame boundary marker.
    Syn,
    /// Key or button state change (value 1 = press, 0 = release, 2 = repeat).
    Key,
    /// Relative axis motion; value is a signed delta.
    Rel,
    /// Absolute axis position.
    Abs,
}

/// One normalized input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub event_type: EventType,
    pub code: u16,
    pub value: i32,
}

impl Event {
    /// Key/button press or release.
    pub fn key(code: u16, value: i32) -> Self {
        Self {
            event_type: EventType::Key,
            code,
            value,
        }
    }

    /// Frame-terminating sync report.
    pub fn syn() -> Self {
        Self {
            event_type: EventType::Syn,
            code: SYN_REPORT,
            value: 0,
        }
    }

    /// Relative X motion.
    pub fn rel_x(delta: i32) -> Self {
        Self {
            event_type: EventType::Rel,
            code: REL_X,
            value: delta,
        }
    }

    /// Relative Y motion.
    pub fn rel_y(delta: i32) -> Self {
        Self {
            event_type: EventType::Rel,
            code: REL_Y,
            value: delta,
        }
    }

    /// True for a press (or autorepeat) of a key event.
    pub fn is_key_press(&self) -> bool {
        self.event_type == EventType::Key && self.value != 0
    }
}
