//! Global input listening using rdev
//!
//! Normalizes rdev's OS-global capture stream into the platform-neutral
//! [`Event`] model and feeds it to the service. In grab mode the raw trigger
//! events are swallowed so only the service's own output (and its optional
//! pass-through) reaches the desktop.

use rdev::{Button, Event as RdevEvent, EventType as RdevEventType, Key};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tracing::{debug, error, info, warn};

use crate::event::{Event, BTN_EXTRA, BTN_LEFT, BTN_MIDDLE, BTN_RIGHT, BTN_SIDE};
use crate::service::Service;

/// Source identity reported for the OS-global capture backend.
pub const GLOBAL_SOURCE: &str = "global-capture";

/// Convert an rdev mouse button to an evdev button code
fn button_to_code(button: Button) -> Option<u16> {
    match button {
        Button::Left => Some(BTN_LEFT),
        Button::Right => Some(BTN_RIGHT),
        Button::Middle => Some(BTN_MIDDLE),
        // X11 numbering for the side buttons
        Button::Unknown(8) => Some(BTN_SIDE),
        Button::Unknown(9) => Some(BTN_EXTRA),
        Button::Unknown(_) => None,
    }
}

/// Convert an rdev key to a Linux evdev key code
fn key_to_code(key: Key) -> Option<u16> {
    match key {
        Key::Escape => Some(1),       // KEY_ESC
        Key::KeyW => Some(17),        // KEY_W
        Key::KeyA => Some(30),        // KEY_A
        Key::KeyS => Some(31),        // KEY_S
        Key::KeyD => Some(32),        // KEY_D
        Key::ControlLeft => Some(29), // KEY_LEFTCTRL
        Key::ShiftLeft => Some(42),   // KEY_LEFTSHIFT
        Key::Alt => Some(56),         // KEY_LEFTALT
        Key::CapsLock => Some(58),    // KEY_CAPSLOCK
        Key::F1 => Some(59),          // KEY_F1
        Key::F2 => Some(60),          // KEY_F2
        Key::F3 => Some(61),          // KEY_F3
        Key::F4 => Some(62),          // KEY_F4
        Key::F5 => Some(63),          // KEY_F5
        Key::F6 => Some(64),          // KEY_F6
        Key::F7 => Some(65),          // KEY_F7
        Key::F8 => Some(66),          // KEY_F8
        _ => None,
    }
}

/// Normalize one rdev event; motion and unmapped keys yield `None`
fn normalize(event: &RdevEvent) -> Option<Event> {
    match event.event_type {
        RdevEventType::ButtonPress(button) => Some(Event::key(button_to_code(button)?, 1)),
        RdevEventType::ButtonRelease(button) => Some(Event::key(button_to_code(button)?, 0)),
        RdevEventType::KeyPress(key) => Some(Event::key(key_to_code(key)?, 1)),
        RdevEventType::KeyRelease(key) => Some(Event::key(key_to_code(key)?, 0)),
        _ => None,
    }
}

/// Input listener that captures global input events and feeds the service
pub struct InputListener {
    service: Service,
    grab: bool,
}

impl InputListener {
    /// Create a listener. With `grab` set, raw trigger events are suppressed
    /// instead of being delivered to the rest of the desktop.
    pub fn new(service: Service, grab: bool) -> Self {
        Self { service, grab }
    }

    /// Start listening for input events in a background thread.
    ///
    /// Forwarding ends once `submit_event` reports the service has stopped;
    /// the underlying rdev loop itself only terminates with the process.
    pub fn start(self) -> thread::JoinHandle<()> {
        thread::spawn(move || {
            info!(grab = self.grab, "Input listener started");
            if self.grab {
                self.run_grab();
            } else {
                self.run_listen();
            }
        })
    }

    fn run_listen(self) {
        let service = self.service;
        let mut stopped = false;

        let callback = move |event: RdevEvent| {
            if stopped {
                return;
            }
            if let Some(normalized) = normalize(&event) {
                if !service.submit_event(GLOBAL_SOURCE, normalized) {
                    debug!("Service stopped, input listener going idle");
                    stopped = true;
                }
            }
        };

        if let Err(e) = rdev::listen(callback) {
            error!("Error in input listener: {:?}", e);
        }
    }

    fn run_grab(self) {
        let service = self.service.clone();
        // rdev::grab takes a Fn, so the stop latch has to be an atomic
        let stopped = AtomicBool::new(false);

        let callback = move |event: RdevEvent| -> Option<RdevEvent> {
            if stopped.load(Ordering::Relaxed) {
                return Some(event);
            }
            let normalized = match normalize(&event) {
                Some(normalized) => normalized,
                None => return Some(event),
            };
            if !service.submit_event(GLOBAL_SOURCE, normalized) {
                debug!("Service stopped, releasing grabbed input");
                stopped.store(true, Ordering::Relaxed);
                return Some(event);
            }
            // Swallow the raw trigger; the service re-emits it when
            // pass-through is configured
            if normalized.code == service.trigger_code() {
                None
            } else {
                Some(event)
            }
        };

        if let Err(e) = rdev::grab(callback) {
            warn!(
                "Failed to grab input, falling back to plain listening: {:?}",
                e
            );
            self.run_listen();
        }
    }
}
