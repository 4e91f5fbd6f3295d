//! Core autoclicker service
//!
//! `Service` turns raw input events, submitted concurrently by any number of
//! source readers, into a correctly-timed stream of synthetic clicks. It owns
//! the trigger/toggle state machine, the timed click scheduler and the
//! shutdown sequencing; everything platform-specific stays behind the
//! [`Injector`] trait and the readers that call [`Service::submit_event`].
//!
//! Correlated state (`enabled`, `holding`, `left_button_down`, the active
//! bindings) lives in a single mutex-guarded struct and transitions as a
//! unit, so concurrent readers never observe a torn combination such as
//! "disabled but primary button still asserted".

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::event::{Event, EventType, BTN_LEFT};
use crate::injector::Injector;
use crate::jitter;
use crate::HoldClickError;

/// Outcome of one scheduler wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaitOutcome {
    /// An explicit wake was raised before the tick elapsed.
    Wake,
    /// The tick interval elapsed with no wake pending.
    Timeout,
    /// Shutdown has been requested; the loop must exit.
    Stopped,
}

#[derive(Default)]
struct WaitFlags {
    wake: bool,
    stopped: bool,
}

/// Coalescing wake signal for the scheduler.
///
/// A single full/empty slot, not a queue: raising a wake that is already
/// pending is a no-op, so any number of trigger presses before the scheduler
/// observes the slot collapse into one early wake-up.
struct Waiter {
    flags: Mutex<WaitFlags>,
    cond: Condvar,
}

impl Waiter {
    fn new() -> Self {
        Self {
            flags: Mutex::new(WaitFlags::default()),
            cond: Condvar::new(),
        }
    }

    fn signal_wake(&self) {
        let mut flags = self.flags.lock();
        if !flags.wake {
            flags.wake = true;
            self.cond.notify_one();
        }
    }

    /// Drop a pending wake that belonged to an old trigger binding.
    fn clear_wake(&self) {
        self.flags.lock().wake = false;
    }

    fn signal_stop(&self) {
        let mut flags = self.flags.lock();
        flags.stopped = true;
        self.cond.notify_all();
    }

    /// Block until a wake is raised, `timeout` elapses, or stop is signaled.
    ///
    /// A wake that was raised concurrently with the timeout still wins: the
    /// flags are re-checked after the deadline, so `Timeout` really means
    /// "an idle tick elapsed".
    fn wait(&self, timeout: Duration) -> WaitOutcome {
        let deadline = Instant::now() + timeout;
        let mut flags = self.flags.lock();
        loop {
            if flags.stopped {
                return WaitOutcome::Stopped;
            }
            if flags.wake {
                flags.wake = false;
                return WaitOutcome::Wake;
            }
            if self.cond.wait_until(&mut flags, deadline).timed_out() {
                if flags.stopped {
                    return WaitOutcome::Stopped;
                }
                if flags.wake {
                    flags.wake = false;
                    return WaitOutcome::Wake;
                }
                return WaitOutcome::Timeout;
            }
        }
    }
}

/// Mutable service state, transitioned as a unit under one lock.
struct State {
    enabled: bool,
    holding: bool,
    /// True while a synthetic primary-button down has been emitted with no
    /// matching up yet. Must be forced false (with a release emitted) before
    /// disabling, re-enabling, rebinding or stopping.
    left_button_down: bool,
    trigger_code: u16,
    toggle_code: u16,
    trigger_sources: HashSet<String>,
    toggle_sources: HashSet<String>,
    cps: f64,
    jitter_px: i32,
}

struct Inner {
    state: Mutex<State>,
    injector: Mutex<Box<dyn Injector>>,
    waiter: Waiter,
    stopped: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
    // Fixed at construction
    grab_sources: HashSet<String>,
    grab_enabled: bool,
    pass_through_trigger: bool,
    click_down: Duration,
}

/// Held-trigger autoclicker engine.
///
/// Cheap to clone; all clones share the same underlying service.
#[derive(Clone)]
pub struct Service {
    inner: Arc<Inner>,
}

impl Service {
    /// Create a service from a validated configuration and an injector.
    pub fn new(config: Config, injector: impl Injector + 'static) -> Result<Self, HoldClickError> {
        config.validate()?;

        let state = State {
            enabled: config.start_enabled,
            holding: false,
            left_button_down: false,
            trigger_code: config.trigger_code,
            toggle_code: config.toggle_code,
            trigger_sources: config.trigger_sources,
            toggle_sources: config.toggle_sources,
            cps: config.cps,
            jitter_px: config.jitter_px,
        };

        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                injector: Mutex::new(Box::new(injector)),
                waiter: Waiter::new(),
                stopped: AtomicBool::new(false),
                worker: Mutex::new(None),
                grab_sources: config.grab_sources,
                grab_enabled: config.grab_enabled,
                pass_through_trigger: config.pass_through_trigger,
                click_down: config.click_down,
            }),
        })
    }

    /// Start the click scheduler thread.
    pub fn start(&self) -> Result<(), HoldClickError> {
        let mut worker = self.inner.worker.lock();
        if worker.is_some() {
            return Err(HoldClickError::AlreadyStarted);
        }
        let inner = Arc::clone(&self.inner);
        *worker = Some(thread::spawn(move || inner.run_scheduler()));
        info!("Click scheduler started");
        Ok(())
    }

    /// Stop the service.
    ///
    /// Idempotent; safe to call concurrently. Signals the scheduler, forces a
    /// primary-button release if one is outstanding, waits for the scheduler
    /// to exit, then closes the injector. The injector never sees a write
    /// after `close`.
    pub fn stop(&self) {
        if self.inner.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Stopping autoclicker service");

        self.inner.waiter.signal_stop();

        {
            let mut state = self.inner.state.lock();
            self.inner.release_left_button(&mut state);
        }

        let handle = self.inner.worker.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("Scheduler thread panicked");
            }
        }

        if let Err(e) = self.inner.injector.lock().close() {
            warn!(error = %e, "Failed to close injector");
        }
        info!("Autoclicker service stopped");
    }

    /// Ingest one raw event from a source reader.
    ///
    /// Returns `false` once the service has been stopped, telling the caller
    /// to end its read loop. Bounded and allocation-free: this may run
    /// directly inside an OS input callback.
    pub fn submit_event(&self, source: &str, event: Event) -> bool {
        if self.inner.stopped.load(Ordering::SeqCst) {
            return false;
        }
        self.inner.handle_event(source, event);
        true
    }

    /// Set the enabled state, forcing a release of any outstanding synthetic
    /// primary-button press first.
    pub fn set_enabled(&self, enabled: bool) {
        let mut state = self.inner.state.lock();
        self.inner.release_left_button(&mut state);
        state.enabled = enabled;
        info!(enabled, "Autoclicker enabled state set");
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.state.lock().enabled
    }

    /// Update the click rate; takes effect within one scheduler tick.
    ///
    /// The rate feeds `1 / cps` in the scheduler, so anything non-finite is
    /// rejected along with non-positive values.
    pub fn set_cps(&self, cps: f64) -> Result<(), HoldClickError> {
        if !cps.is_finite() || cps <= 0.0 {
            return Err(HoldClickError::InvalidCps(cps));
        }
        self.inner.state.lock().cps = cps;
        debug!(cps, "Click rate updated");
        Ok(())
    }

    pub fn cps(&self) -> f64 {
        self.inner.state.lock().cps
    }

    /// Update the jitter radius; zero disables jitter entirely.
    pub fn set_jitter(&self, pixels: i32) -> Result<(), HoldClickError> {
        if pixels < 0 {
            return Err(HoldClickError::InvalidJitter(pixels));
        }
        self.inner.state.lock().jitter_px = pixels;
        debug!(pixels, "Jitter radius updated");
        Ok(())
    }

    pub fn jitter_px(&self) -> i32 {
        self.inner.state.lock().jitter_px
    }

    /// Rebind the trigger code.
    ///
    /// Clears `holding` and any pending wake so events for the old binding
    /// can never activate the new one. Rejected without mutation if `code`
    /// equals the active toggle code.
    pub fn set_trigger_code(&self, code: u16) -> Result<(), HoldClickError> {
        let mut state = self.inner.state.lock();
        if code == state.toggle_code {
            return Err(HoldClickError::CodeConflict(code));
        }
        self.inner.release_left_button(&mut state);
        state.trigger_code = code;
        state.holding = false;
        self.inner.waiter.clear_wake();
        info!(code = %format_args!("0x{:03x}", code), "Trigger rebound");
        Ok(())
    }

    /// Currently bound trigger code.
    pub fn trigger_code(&self) -> u16 {
        self.inner.state.lock().trigger_code
    }

    /// Rebind the toggle code. Rejected without mutation if `code` equals the
    /// active trigger code.
    pub fn set_toggle_code(&self, code: u16) -> Result<(), HoldClickError> {
        let mut state = self.inner.state.lock();
        if code == state.trigger_code {
            return Err(HoldClickError::CodeConflict(code));
        }
        self.inner.release_left_button(&mut state);
        state.toggle_code = code;
        info!(code = %format_args!("0x{:03x}", code), "Toggle rebound");
        Ok(())
    }
}

impl Inner {
    fn handle_event(&self, source: &str, event: Event) {
        if event.event_type != EventType::Key {
            return;
        }

        let mut state = self.state.lock();

        let pass_through = self.grab_enabled
            && self.pass_through_trigger
            && event.code == state.trigger_code
            && self.grab_sources.contains(source);

        if event.code == state.toggle_code && state.toggle_sources.contains(source) {
            if event.value == 1 {
                self.release_left_button(&mut state);
                state.enabled = !state.enabled;
                info!(enabled = state.enabled, "Autoclicker toggled");
            }
        } else if event.code == state.trigger_code && state.trigger_sources.contains(source) {
            if event.is_key_press() {
                // Wake once per press transition; autorepeat stays silent
                if !state.holding {
                    state.holding = true;
                    self.waiter.signal_wake();
                    debug!("Trigger held");
                }
            } else if state.holding {
                state.holding = false;
                debug!("Trigger released");
            }
        }

        drop(state);

        if pass_through {
            let mut injector = self.injector.lock();
            // stop() sets `stopped` before it closes under this same lock, so
            // a false read here means the injector is still open
            if self.stopped.load(Ordering::SeqCst) {
                return;
            }
            if let Err(e) = injector.write_events(&[event]) {
                warn!(error = %e, "Failed to pass through trigger event");
            }
        }
    }

    /// Emit a primary-button release if one is outstanding.
    ///
    /// Runs under the state lock so the release is on the wire before any
    /// caller completes its transition.
    fn release_left_button(&self, state: &mut State) {
        if !state.left_button_down {
            return;
        }
        state.left_button_down = false;
        let frame = [Event::key(BTN_LEFT, 0), Event::syn()];
        if let Err(e) = self.injector.lock().write_events(&frame) {
            warn!(error = %e, "Failed to write forced release");
        }
        debug!("Forced primary button release");
    }

    fn run_scheduler(self: Arc<Self>) {
        debug!("Scheduler loop running");
        loop {
            let cps = self.state.lock().cps;
            let tick = Duration::from_secs_f64(1.0 / cps);
            match self.waiter.wait(tick) {
                WaitOutcome::Stopped => break,
                // A silent tick re-checks state exactly like a wake does
                WaitOutcome::Wake | WaitOutcome::Timeout => {
                    let active = {
                        let state = self.state.lock();
                        state.enabled && state.holding
                    };
                    if active {
                        self.click_once();
                    }
                }
            }
        }
        debug!("Scheduler loop exited");
    }

    /// Emit one full click: optional jitter out, press, timed hold, release,
    /// exact jitter negation back. Injector failures are logged and the cycle
    /// carries on; button tracking is updated optimistically.
    fn click_once(&self) {
        let jitter_px = self.state.lock().jitter_px;
        let (dx, dy) = jitter::offset(jitter_px);

        if (dx, dy) != (0, 0) {
            self.write_frame(&[Event::rel_x(dx), Event::rel_y(dy), Event::syn()]);
        }

        {
            // Flag and press frame transition together, same as the release
            // side, so the flag never claims a down that was not emitted
            let mut state = self.state.lock();
            state.left_button_down = true;
            self.write_frame(&[Event::key(BTN_LEFT, 1), Event::syn()]);
        }

        if !self.click_down.is_zero() {
            thread::sleep(self.click_down);
        }

        {
            let mut state = self.state.lock();
            // A concurrent forced release may already have emitted the up
            if state.left_button_down {
                state.left_button_down = false;
                self.write_frame(&[Event::key(BTN_LEFT, 0), Event::syn()]);
            }
        }

        if (dx, dy) != (0, 0) {
            self.write_frame(&[Event::rel_x(-dx), Event::rel_y(-dy), Event::syn()]);
        }
    }

    fn write_frame(&self, events: &[Event]) {
        if let Err(e) = self.injector.lock().write_events(events) {
            warn!(error = %e, "Injector write failed");
        }
    }
}
