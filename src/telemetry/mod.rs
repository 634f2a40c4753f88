//! Telemetry module
//!
//! Logging is constructed with the [tracing](https://crates.io/crates/tracing)
//! crate. Use [init] to install a global subscriber; it errors if one is
//! already registered.

pub mod logging;
pub use logging::{get_subscriber, init, init_subscriber};

/// Registers a ctrl-c handler for a clean exit mid-run.
pub fn register_shutdown() {
    ctrlc::set_handler(move || {
        println!();
        tracing::info!(target: "snapsafe", "shutting down...");
        std::process::exit(0);
    })
    .expect("failed to register shutdown handler");
}
