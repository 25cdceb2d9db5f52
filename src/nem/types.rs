//! Network identifiers, NIS wire records and error definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export EndpointConfig from config module to avoid duplication
pub use crate::config::schema::EndpointConfig;

/// NEM network the bridge signs and derives addresses for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Testnet,
    Mijin,
}

impl Network {
    /// Signed network id as used by NIS (104, -104, 96).
    pub fn id(self) -> i8 {
        match self {
            Network::Mainnet => 104,
            Network::Testnet => -104,
            Network::Mijin => 96,
        }
    }

    /// Leading byte of every address on this network.
    pub fn address_prefix(self) -> u8 {
        self.id() as u8
    }

    /// Transaction version word for the given entity version.
    pub fn version(self, entity_version: u32) -> u32 {
        ((self.address_prefix() as u32) << 24) | entity_version
    }

    /// Minutes until an announced transaction expires.
    pub fn deadline_minutes(self) -> u32 {
        match self {
            Network::Testnet => 60,
            Network::Mainnet | Network::Mijin => 24 * 60,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Mijin => "mijin",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = NemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "mijin" => Ok(Network::Mijin),
            other => Err(NemError::UnknownNetwork(other.to_string())),
        }
    }
}

/// Errors that can occur during NEM operations.
#[derive(Debug, Error)]
pub enum NemError {
    /// Private or public key is not valid hex of the expected length.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Address fails base32, length, network or checksum checks.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Encrypted message payload is malformed.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Encryption or decryption failed.
    #[error("Cipher error: {0}")]
    Cipher(String),

    /// Network name not recognised.
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    /// Connection to the node failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Node request timed out.
    #[error("Node request timed out after {0} seconds")]
    Timeout(u64),

    /// Node answered with a non-success status.
    #[error("Node returned status {status}: {message}")]
    Node {
        status: u16,
        message: String,
        body: Option<serde_json::Value>,
    },

    /// Node response did not have the expected shape.
    #[error("Unexpected node response: {0}")]
    Decode(String),
}

impl NemError {
    /// True when the caller supplied bad input, as opposed to the node failing.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            NemError::InvalidKey(_)
                | NemError::InvalidAddress(_)
                | NemError::InvalidPayload(_)
                | NemError::Cipher(_)
        )
    }
}

/// Result type for NEM operations.
pub type NemResult<T> = Result<T, NemError>;

/// Hash wrapper used throughout the NIS API (`{"data": "..."}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct HashData {
    /// Absent for `{}` (e.g. the inner hash of a non-multisig transaction).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Result of `POST /transaction/announce`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnounceResult {
    #[serde(rename = "type")]
    pub kind: i32,
    pub code: i32,
    pub message: String,
    #[serde(default)]
    pub transaction_hash: Option<HashData>,
    #[serde(default)]
    pub inner_transaction_hash: Option<HashData>,
}

impl AnnounceResult {
    /// NIS reports `code == 1` for an accepted transaction.
    pub fn is_success(&self) -> bool {
        self.code == 1
    }
}

/// Transaction metadata as returned by the account transfer endpoints.
///
/// Fields not modelled here are kept in `extra` so the node's reply
/// serializes back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TransactionMeta {
    pub id: i64,
    pub height: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<HashData>,
    #[serde(rename = "innerHash", skip_serializing_if = "Option::is_none")]
    pub inner_hash: Option<HashData>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One transaction record; the body is passed through untouched.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TransactionMetaDataPair {
    pub meta: TransactionMeta,
    pub transaction: serde_json::Value,
}

/// Page of transactions (`{"data": [...]}`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TransactionPage {
    #[serde(default)]
    pub data: Vec<TransactionMetaDataPair>,
}

/// Parameters for a transfer as accepted by the facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Recipient address (dashes and case are normalised).
    pub recipient: String,
    /// Sender private key (hex).
    pub privkey: String,
    /// Message text.
    pub message: String,
    /// When set the message is encrypted for this public key.
    pub recipient_pubkey: Option<String>,
    /// Amount in micro-XEM.
    pub amount: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_ids() {
        assert_eq!(Network::Testnet.address_prefix(), 0x98);
        assert_eq!(Network::Mainnet.address_prefix(), 0x68);
        assert_eq!(Network::Mijin.address_prefix(), 0x60);
        assert_eq!(Network::Testnet.version(1), 0x9800_0001);
        assert_eq!(Network::Mainnet.version(1), 0x6800_0001);
    }

    #[test]
    fn test_network_from_str() {
        assert_eq!("TESTNET".parse::<Network>().unwrap(), Network::Testnet);
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert!("ropsten".parse::<Network>().is_err());
    }

    #[test]
    fn test_error_display() {
        let err = NemError::Timeout(10);
        assert_eq!(err.to_string(), "Node request timed out after 10 seconds");

        let err = NemError::Node {
            status: 400,
            message: "FAILURE_INSUFFICIENT_BALANCE".into(),
            body: None,
        };
        assert!(err.to_string().contains("400"));
        assert!(!err.is_input_error());
        assert!(NemError::InvalidKey("x".into()).is_input_error());
    }

    #[test]
    fn test_announce_result_wire_names() {
        let json = r#"{"type":1,"code":1,"message":"SUCCESS","transactionHash":{"data":"ab"},"innerTransactionHash":{}}"#;
        let result: AnnounceResult = serde_json::from_str(json).unwrap();
        assert!(result.is_success());
        assert_eq!(result.transaction_hash.unwrap().data.as_deref(), Some("ab"));
        assert_eq!(result.inner_transaction_hash.unwrap().data, None);
    }

    #[test]
    fn test_transaction_page_keeps_body() {
        let json = r#"{"data":[{"meta":{"id":7,"height":10,"hash":{"data":"ff"},"innerHash":{}},"transaction":{"signer":"abc","type":257}}]}"#;
        let page: TransactionPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].meta.id, 7);
        assert_eq!(page.data[0].transaction["signer"], "abc");

        let back = serde_json::to_value(&page).unwrap();
        assert_eq!(back["data"][0]["transaction"]["type"], 257);
    }

    #[test]
    fn test_transaction_meta_round_trips_unchanged() {
        let reply = serde_json::json!({
            "data": [{
                "meta": {
                    "id": 7,
                    "height": 10,
                    "hash": {"data": "ff"},
                    "innerHash": {},
                    "timeStamp": 123
                },
                "transaction": {"type": 257}
            }]
        });
        let page: TransactionPage = serde_json::from_value(reply.clone()).unwrap();
        assert_eq!(page.data[0].meta.extra["timeStamp"], 123);
        assert_eq!(serde_json::to_value(&page).unwrap(), reply);
    }
}
