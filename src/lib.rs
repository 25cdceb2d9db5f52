//! NEM JSON-RPC bridge library.
//!
//! - [`rpc`]: line-delimited JSON-RPC dispatcher
//! - [`nem`]: key, address, message and transaction handling plus the NIS client
//! - [`crypt`]: one-shot message encrypt/decrypt pipeline

pub mod config;
pub mod crypt;
pub mod lifecycle;
pub mod nem;
pub mod observability;
pub mod rpc;

pub use config::BridgeConfig;
pub use lifecycle::Shutdown;
pub use nem::{NisClient, NodeFacade};
pub use rpc::Dispatcher;
