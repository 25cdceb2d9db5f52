//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Dispatcher stops reading → In-flight requests drain → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop reading, drain, flush, exit
//! - No forced deadline; node calls are bounded by the HTTP timeout

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::spawn_signal_handler;
