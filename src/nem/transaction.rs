//! Transfer transaction building, serialization and signing.
//!
//! # Responsibilities
//! - Compute timestamps, deadlines and fees
//! - Attach plain or encrypted messages
//! - Serialize to the NIS binary layout and sign

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::nem::address;
use crate::nem::keys::KeyPair;
use crate::nem::message;
use crate::nem::types::{NemError, NemResult, Network, TransferRequest};

/// Entity type of a transfer.
pub const TRANSFER_TYPE: u32 = 0x101;

/// 2015-03-29T00:06:25Z, the NEM nemesis block time.
pub const NEM_EPOCH_UNIX_SECS: u64 = 1_427_587_585;

/// Fee unit in micro-XEM (0.05 XEM).
const FEE_UNIT: u64 = 50_000;

/// Message payload bytes covered by one fee unit.
const MESSAGE_FEE_CHUNK: usize = 32;

/// Seconds since the NEM epoch.
pub fn nem_timestamp_now() -> u32 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    now.saturating_sub(NEM_EPOCH_UNIX_SECS) as u32
}

/// Fee for moving `amount` micro-XEM: one unit per 10,000 XEM, between 1 and 25 units.
pub fn transfer_fee(amount: u64) -> u64 {
    let units = (amount / 10_000_000_000).clamp(1, 25);
    units * FEE_UNIT
}

/// Fee for a message payload of `len` bytes.
pub fn message_fee(len: usize) -> u64 {
    if len == 0 {
        return 0;
    }
    ((len / MESSAGE_FEE_CHUNK) as u64 + 1) * FEE_UNIT
}

/// Message type tag on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MessageKind {
    Plain = 1,
    Encrypted = 2,
}

/// Message attached to a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferMessage {
    pub kind: MessageKind,
    pub payload: Vec<u8>,
}

impl TransferMessage {
    /// Plain UTF-8 message.
    pub fn plain(text: &str) -> Self {
        Self {
            kind: MessageKind::Plain,
            payload: text.as_bytes().to_vec(),
        }
    }

    /// Message encrypted from `sender` to the holder of `recipient_pubkey`.
    pub fn encrypted(sender_privkey: &str, recipient_pubkey: &str, text: &str) -> NemResult<Self> {
        let payload_hex = message::encode(sender_privkey, recipient_pubkey, text.as_bytes())?;
        let payload = hex::decode(payload_hex)
            .map_err(|e| NemError::Cipher(format!("cipher produced invalid hex: {}", e)))?;
        Ok(Self {
            kind: MessageKind::Encrypted,
            payload,
        })
    }
}

/// Body of `POST /transaction/announce`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedTransaction {
    /// Serialized transaction, hex.
    pub data: String,
    /// Signature over `data`, hex.
    pub signature: String,
}

/// Version 1 transfer transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTransaction {
    pub version: u32,
    pub timestamp: u32,
    pub signer: [u8; 32],
    pub fee: u64,
    pub deadline: u32,
    pub recipient: String,
    pub amount: u64,
    pub message: TransferMessage,
}

impl TransferTransaction {
    /// Build a transfer from a request, signed by `keys`, stamped at `timestamp`.
    pub fn prepare(
        keys: &KeyPair,
        request: &TransferRequest,
        network: Network,
        timestamp: u32,
    ) -> NemResult<Self> {
        let recipient = address::validate(&request.recipient, network)?;

        // Nothing to encrypt in an empty message.
        let message = match request.recipient_pubkey.as_deref() {
            Some(pubkey) if !pubkey.is_empty() && !request.message.is_empty() => {
                TransferMessage::encrypted(&request.privkey, pubkey, &request.message)?
            }
            _ => TransferMessage::plain(&request.message),
        };

        let fee = transfer_fee(request.amount) + message_fee(message.payload.len());
        let deadline = timestamp + network.deadline_minutes() * 60;

        Ok(Self {
            version: network.version(1),
            timestamp,
            signer: *keys.public_key(),
            fee,
            deadline,
            recipient,
            amount: request.amount,
            message,
        })
    }

    /// Serialize to the NIS binary layout (all integers little-endian).
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(128 + self.message.payload.len());

        // Common part
        out.extend_from_slice(&TRANSFER_TYPE.to_le_bytes());
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.timestamp.to_le_bytes());
        out.extend_from_slice(&(self.signer.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.signer);
        out.extend_from_slice(&self.fee.to_le_bytes());
        out.extend_from_slice(&self.deadline.to_le_bytes());

        // Transfer part
        out.extend_from_slice(&(self.recipient.len() as u32).to_le_bytes());
        out.extend_from_slice(self.recipient.as_bytes());
        out.extend_from_slice(&self.amount.to_le_bytes());

        let payload = &self.message.payload;
        if payload.is_empty() {
            out.extend_from_slice(&0u32.to_le_bytes());
        } else {
            out.extend_from_slice(&(8 + payload.len() as u32).to_le_bytes());
            out.extend_from_slice(&(self.message.kind as u32).to_le_bytes());
            out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            out.extend_from_slice(payload);
        }

        out
    }

    /// Serialize and sign.
    pub fn sign(&self, keys: &KeyPair) -> SignedTransaction {
        let data = self.serialize();
        let signature = keys.sign(&data);
        SignedTransaction {
            data: hex::encode(&data),
            signature: hex::encode(signature),
        }
    }
}
