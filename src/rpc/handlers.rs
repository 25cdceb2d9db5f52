//! The five bridge methods and their parameter schemas.

use std::sync::Arc;

use serde::Deserialize;

use crate::nem::{AnnounceResult, NodeFacade, TransactionPage, TransferRequest};
use crate::rpc::registry::HandlerRegistry;
use crate::rpc::types::RpcError;

pub const SEND_TRANSFER_TRANSACTION: &str = "send-transfer-transaction";
pub const GET_INCOMING_TRANSACTIONS: &str = "get-incoming-transactions";
pub const GET_OUTGOING_TRANSACTIONS: &str = "get-outgoing-transactions";
pub const PUBKEY_TO_ADDRESS: &str = "pubkey-to-address";
pub const PRIVKEY_TO_PUBKEY: &str = "privkey-to-pubkey";

/// `send-transfer-transaction` kwargs.
#[derive(Debug, Clone, Deserialize)]
pub struct SendTransferParams {
    /// Recipient address.
    pub address: String,
    pub privkey: String,
    pub message: String,
    /// Encrypt the message for this public key; empty means plain.
    #[serde(default)]
    pub recv_pubkey: Option<String>,
    /// Micro-XEM to transfer.
    #[serde(default)]
    pub amount: u64,
}

impl From<SendTransferParams> for TransferRequest {
    fn from(params: SendTransferParams) -> Self {
        TransferRequest {
            recipient: params.address,
            privkey: params.privkey,
            message: params.message,
            recipient_pubkey: params.recv_pubkey,
            amount: params.amount,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddressParams {
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PubkeyParams {
    pub pubkey: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrivkeyParams {
    pub privkey: String,
}

async fn send_transfer_transaction(
    params: SendTransferParams,
    facade: Arc<dyn NodeFacade>,
) -> Result<AnnounceResult, RpcError> {
    Ok(facade.send_transfer(params.into()).await?)
}

async fn get_incoming_transactions(
    params: AddressParams,
    facade: Arc<dyn NodeFacade>,
) -> Result<TransactionPage, RpcError> {
    Ok(facade.incoming_transactions(&params.address).await?)
}

async fn get_outgoing_transactions(
    params: AddressParams,
    facade: Arc<dyn NodeFacade>,
) -> Result<TransactionPage, RpcError> {
    Ok(facade.outgoing_transactions(&params.address).await?)
}

async fn pubkey_to_address(params: PubkeyParams, facade: Arc<dyn NodeFacade>) -> Result<String, RpcError> {
    Ok(facade.pubkey_to_address(&params.pubkey).await?)
}

async fn privkey_to_pubkey(params: PrivkeyParams, facade: Arc<dyn NodeFacade>) -> Result<String, RpcError> {
    Ok(facade.privkey_to_pubkey(&params.privkey).await?)
}

/// Add the bridge methods to `registry`.
pub fn register_nem_methods(registry: &mut HandlerRegistry) -> Result<(), RpcError> {
    registry.register(SEND_TRANSFER_TRANSACTION, send_transfer_transaction)?;
    registry.register(GET_INCOMING_TRANSACTIONS, get_incoming_transactions)?;
    registry.register(GET_OUTGOING_TRANSACTIONS, get_outgoing_transactions)?;
    registry.register(PUBKEY_TO_ADDRESS, pubkey_to_address)?;
    registry.register(PRIVKEY_TO_PUBKEY, privkey_to_pubkey)?;
    Ok(())
}

/// Registry holding exactly the bridge methods.
pub fn nem_registry() -> Result<HandlerRegistry, RpcError> {
    let mut registry = HandlerRegistry::new();
    register_nem_methods(&mut registry)?;
    Ok(registry)
}
