//! Configuration for the autoclicker service

use std::collections::HashSet;
use std::time::Duration;

use crate::event::{BTN_EXTRA, BTN_LEFT};
use crate::HoldClickError;

/// Configuration for the autoclicker
#[derive(Debug, Clone)]
pub struct Config {
    /// Key/button code whose held-down state drives clicking
    pub trigger_code: u16,

    /// Key/button code that flips the service on/off when pressed
    pub toggle_code: u16,

    /// Sources allowed to drive the trigger
    pub trigger_sources: HashSet<String>,

    /// Sources allowed to drive the toggle
    pub toggle_sources: HashSet<String>,

    /// Sources whose raw events are exclusively captured by the backend
    pub grab_sources: HashSet<String>,

    /// Whether grabbing is active
    pub grab_enabled: bool,

    /// Forward a grabbed device's raw trigger events to the injector
    pub pass_through_trigger: bool,

    /// Target clicks per second while the trigger is held
    pub cps: f64,

    /// How long each synthetic click stays down
    pub click_down: Duration,

    /// Maximum random cursor offset per click in pixels (0 disables)
    pub jitter_px: i32,

    /// Whether the service starts enabled
    pub start_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trigger_code: BTN_LEFT,
            toggle_code: BTN_EXTRA,
            trigger_sources: HashSet::new(),
            toggle_sources: HashSet::new(),
            grab_sources: HashSet::new(),
            grab_enabled: false,
            pass_through_trigger: false,
            cps: 16.0,
            click_down: Duration::from_millis(10),
            jitter_px: 0,
            start_enabled: true,
        }
    }
}

impl Config {
    /// Set trigger and toggle codes
    pub fn with_codes(mut self, trigger: u16, toggle: u16) -> Self {
        self.trigger_code = trigger;
        self.toggle_code = toggle;
        self
    }

    /// Register a source for both trigger and toggle events
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        let source = source.into();
        self.trigger_sources.insert(source.clone());
        self.toggle_sources.insert(source);
        self
    }

    /// Set the click rate
    pub fn with_cps(mut self, cps: f64) -> Self {
        self.cps = cps;
        self
    }

    /// Set the click-down hold duration
    pub fn with_click_down(mut self, down: Duration) -> Self {
        self.click_down = down;
        self
    }

    /// Set the jitter radius in pixels
    pub fn with_jitter(mut self, pixels: i32) -> Self {
        self.jitter_px = pixels;
        self
    }

    /// Mark a source as grabbed and enable grabbing
    pub fn with_grabbed_source(mut self, source: impl Into<String>) -> Self {
        self.grab_sources.insert(source.into());
        self.grab_enabled = true;
        self
    }

    /// Forward raw trigger events from grabbed sources
    pub fn with_pass_through(mut self, pass_through: bool) -> Self {
        self.pass_through_trigger = pass_through;
        self
    }

    /// Set the initial enabled state
    pub fn with_start_enabled(mut self, enabled: bool) -> Self {
        self.start_enabled = enabled;
        self
    }

    /// Check the configuration for construction errors
    pub fn validate(&self) -> Result<(), HoldClickError> {
        if self.trigger_code == self.toggle_code {
            return Err(HoldClickError::CodeConflict(self.trigger_code));
        }
        if self.trigger_sources.is_empty() {
            return Err(HoldClickError::NoTriggerSources);
        }
        if self.toggle_sources.is_empty() {
            return Err(HoldClickError::NoToggleSources);
        }
        if !self.cps.is_finite() || self.cps <= 0.0 {
            return Err(HoldClickError::InvalidCps(self.cps));
        }
        if self.jitter_px < 0 {
            return Err(HoldClickError::InvalidJitter(self.jitter_px));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates_once_sources_are_set() {
        assert!(Config::default().validate().is_err());
        assert!(Config::default().with_source("device").validate().is_ok());
    }

    #[test]
    fn equal_codes_are_rejected() {
        let cfg = Config::default()
            .with_source("device")
            .with_codes(BTN_LEFT, BTN_LEFT);
        assert!(matches!(
            cfg.validate(),
            Err(HoldClickError::CodeConflict(code)) if code == BTN_LEFT
        ));
    }

    #[test]
    fn invalid_rates_are_rejected() {
        let cfg = Config::default().with_source("device").with_cps(0.0);
        assert!(matches!(cfg.validate(), Err(HoldClickError::InvalidCps(_))));

        let cfg = Config::default().with_source("device").with_cps(f64::NAN);
        assert!(matches!(cfg.validate(), Err(HoldClickError::InvalidCps(_))));

        let cfg = Config::default().with_source("device").with_jitter(-2);
        assert!(matches!(
            cfg.validate(),
            Err(HoldClickError::InvalidJitter(-2))
        ));
    }
}
