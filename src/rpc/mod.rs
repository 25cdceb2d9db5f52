//! Line-delimited JSON-RPC dispatcher.
//!
//! # Data Flow
//! ```text
//! stdin
//!     → frame.rs (newline framing, size limit)
//!     → dispatcher.rs (parse, route, spawn, collect)
//!     → registry.rs + handlers.rs (typed params → NodeFacade)
//!     → types.rs (response / error objects)
//!     → stdout
//! ```
//!
//! # Design Decisions
//! - stdout carries nothing but response frames
//! - Every non-blank frame gets exactly one response
//! - Registry and config are explicit constructor inputs, never globals

pub mod dispatcher;
pub mod frame;
pub mod handlers;
pub mod registry;
pub mod types;

pub use dispatcher::{Dispatcher, ServeSummary};
pub use handlers::{nem_registry, register_nem_methods};
pub use registry::{Handler, HandlerRegistry};
pub use types::{JsonRpcError, JsonRpcErrorCode, JsonRpcRequest, JsonRpcResponse, RpcError};
