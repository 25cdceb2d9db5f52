//! NEM (NIS1) SDK facade.
//!
//! # Data Flow
//! ```text
//! handler params
//!     → keys.rs (private key → key pair, signing)
//!     → address.rs (public key → address, validation)
//!     → message.rs (encrypted message payloads)
//!     → transaction.rs (build, serialize, sign transfers)
//!     → client.rs (announce / query the NIS node)
//! ```
//!
//! # Security Constraints
//! - Private keys arrive per request and are never logged
//! - All node calls are bounded by the configured timeout

pub mod address;
pub mod client;
pub mod facade;
pub mod keys;
pub mod message;
pub mod transaction;
pub mod types;

pub use client::NisClient;
pub use facade::NodeFacade;
pub use keys::KeyPair;
pub use types::{
    AnnounceResult, HashData, NemError, NemResult, Network, TransactionMeta,
    TransactionMetaDataPair, TransactionPage, TransferRequest,
};
