//! Asynchronous operations the bridge exposes, behind one trait.
//!
//! The dispatcher only ever holds an `Arc<dyn NodeFacade>`, so the NIS
//! backed implementation can be swapped for a scripted one in tests.
//! Key, address and message operations are local and come with default
//! implementations; only the node-bound calls must be provided.

use async_trait::async_trait;

use crate::nem::address;
use crate::nem::client::NisClient;
use crate::nem::keys::KeyPair;
use crate::nem::message;
use crate::nem::types::{AnnounceResult, NemResult, Network, TransactionPage, TransferRequest};

#[async_trait]
pub trait NodeFacade: Send + Sync {
    /// Network used for addresses and transaction versions.
    fn network(&self) -> Network;

    /// Build, sign and announce a transfer.
    async fn send_transfer(&self, request: TransferRequest) -> NemResult<AnnounceResult>;

    /// Transfers received by `address`.
    async fn incoming_transactions(&self, address: &str) -> NemResult<TransactionPage>;

    /// Transfers sent by `address`.
    async fn outgoing_transactions(&self, address: &str) -> NemResult<TransactionPage>;

    async fn pubkey_to_address(&self, pubkey: &str) -> NemResult<String> {
        address::from_public_key(pubkey, self.network())
    }

    async fn privkey_to_pubkey(&self, privkey: &str) -> NemResult<String> {
        Ok(KeyPair::from_private_key(privkey)?.public_key_hex())
    }

    /// Encrypt `plaintext` for the holder of `pubkey`; returns the hex payload.
    async fn encode_message(&self, privkey: &str, pubkey: &str, plaintext: &[u8]) -> NemResult<String> {
        message::encode(privkey, pubkey, plaintext)
    }

    /// Decrypt a hex payload produced by [`NodeFacade::encode_message`].
    async fn decode_message(&self, privkey: &str, pubkey: &str, payload_hex: &str) -> NemResult<Vec<u8>> {
        message::decode(privkey, pubkey, payload_hex)
    }
}

#[async_trait]
impl NodeFacade for NisClient {
    fn network(&self) -> Network {
        NisClient::network(self)
    }

    async fn send_transfer(&self, request: TransferRequest) -> NemResult<AnnounceResult> {
        NisClient::send_transfer(self, &request).await
    }

    async fn incoming_transactions(&self, address: &str) -> NemResult<TransactionPage> {
        NisClient::incoming_transactions(self, address).await
    }

    async fn outgoing_transactions(&self, address: &str) -> NemResult<TransactionPage> {
        NisClient::outgoing_transactions(self, address).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointConfig;
    use std::sync::Arc;

    const ALICE: &str = "575dbb3062267eff57c970a336ebbc8fbcfe12c5bd3ed7bc11eb0481d7704ced";
    const BOB: &str = "1ba9a2a6b5b3d0e1d77a9b39e0b0f3a1c2d4e5f60718293a4b5c6d7e8f901234";

    fn facade() -> Arc<dyn NodeFacade> {
        Arc::new(NisClient::new(&EndpointConfig::default(), Network::Testnet).unwrap())
    }

    #[tokio::test]
    async fn test_local_key_operations() {
        let facade = facade();
        let pubkey = facade.privkey_to_pubkey(ALICE).await.unwrap();
        assert_eq!(pubkey.len(), 64);

        let address = facade.pubkey_to_address(&pubkey).await.unwrap();
        assert_eq!(address.len(), 40);
        assert!(address.starts_with('T'));
    }

    #[tokio::test]
    async fn test_message_round_trip() {
        let facade = facade();
        let bob_pub = facade.privkey_to_pubkey(BOB).await.unwrap();
        let alice_pub = facade.privkey_to_pubkey(ALICE).await.unwrap();

        let payload = facade.encode_message(ALICE, &bob_pub, b"ping").await.unwrap();
        let plain = facade.decode_message(BOB, &alice_pub, &payload).await.unwrap();
        assert_eq!(plain, b"ping");
    }

    #[tokio::test]
    async fn test_bad_pubkey_is_input_error() {
        let err = facade().pubkey_to_address("xyz").await.unwrap_err();
        assert!(err.is_input_error());
    }
}
