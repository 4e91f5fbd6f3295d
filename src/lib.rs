//! HoldClick - Held-trigger autoclicker
//!
//! While a configured trigger button is physically held (and the service is
//! enabled via a second toggle button), HoldClick emits synthetic clicks at a
//! configurable rate, optionally with bounded net-zero cursor jitter.
//!
//! This library provides components for:
//! - The core event-aggregation and click-scheduling engine (`Service`)
//! - A platform-neutral input event model
//! - Global input listening feeding the service (rdev)
//! - Synthetic event injection (ydotool)

pub mod config;
pub mod event;
pub mod injector;
pub mod input_listener;
pub mod jitter;
pub mod service;

pub use config::Config;
pub use event::{Event, EventType};
pub use injector::{Injector, YdotoolInjector};
pub use input_listener::{InputListener, GLOBAL_SOURCE};
pub use service::Service;

use thiserror::Error;

/// Main error type for HoldClick
#[derive(Error, Debug)]
pub enum HoldClickError {
    #[error("Trigger and toggle must be different codes (both 0x{0:03x})")]
    CodeConflict(u16),

    #[error("No trigger sources configured")]
    NoTriggerSources,

    #[error("No toggle sources configured")]
    NoToggleSources,

    #[error("Clicks per second must be > 0, got {0}")]
    InvalidCps(f64),

    #[error("Jitter radius must be >= 0 pixels, got {0}")]
    InvalidJitter(i32),

    #[error("Service already started")]
    AlreadyStarted,

    #[error("Failed to access input devices: {0}")]
    InputAccess(String),

    #[error("Failed to send input event: {0}")]
    SendEvent(String),

    #[error("Permission denied - add user to 'input' group")]
    PermissionDenied,
}
