//! HoldClick - Held-trigger autoclicker
//!
//! Holds-to-click: while the trigger button (default: left mouse button) is
//! physically held and the service is enabled, synthetic clicks are emitted
//! at the configured rate. The toggle button (default: mouse button 5) flips
//! the service on and off.

use holdclick::{
    Config, HoldClickError, InputListener, Service, YdotoolInjector, GLOBAL_SOURCE,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<(), HoldClickError> {
    // Initialize logging
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .compact()
        .init();

    info!("HoldClick starting...");

    let config = Config::default().with_source(GLOBAL_SOURCE);
    info!(
        "Config: trigger=0x{:03x}, toggle=0x{:03x}, cps={}, jitter={}px",
        config.trigger_code, config.toggle_code, config.cps, config.jitter_px
    );

    // Set up Ctrl+C handler for graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();

    ctrlc::set_handler(move || {
        info!("Shutdown signal received");
        running_clone.store(false, Ordering::SeqCst);
    })
    .expect("Failed to set Ctrl+C handler");

    // Create the injector that emits synthetic events
    let injector = match YdotoolInjector::new() {
        Ok(injector) => injector,
        Err(e) => {
            error!("Failed to set up event injection: {}", e);
            error!("Make sure ydotool is installed and ydotoold is running:");
            error!("  sudo systemctl enable --now ydotoold");
            return Err(e);
        }
    };

    let grab = config.grab_enabled;
    let service = Service::new(config, injector)?;
    service.start()?;

    // Start input listener in background thread
    let listener = InputListener::new(service.clone(), grab);
    let _listener_handle = listener.start();

    info!("Hold the trigger button to click; press the toggle button to pause");
    info!("Press Ctrl+C to exit");

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }

    info!("HoldClick shutting down...");
    service.stop();

    // Note: the rdev listener thread only terminates when the process exits

    Ok(())
}
