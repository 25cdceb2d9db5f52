//! NIS REST client with timeout and error handling.
//!
//! # Responsibilities
//! - Build request URLs from the endpoint configuration
//! - Announce signed transactions
//! - Query account transfer history
//! - Map transport failures, timeouts and non-2xx answers to `NemError`

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::nem::address;
use crate::nem::keys::{fix_private_key, KeyPair};
use crate::nem::transaction::{nem_timestamp_now, SignedTransaction, TransferTransaction};
use crate::nem::types::{
    AnnounceResult, EndpointConfig, NemError, NemResult, Network, TransactionPage, TransferRequest,
};

const ANNOUNCE_PATH: &str = "transaction/announce";
const INCOMING_PATH: &str = "account/transfers/incoming";
const OUTGOING_PATH: &str = "account/transfers/outgoing";

/// HTTP client for a single NIS node.
#[derive(Clone)]
pub struct NisClient {
    http: Client,
    base_url: Url,
    network: Network,
    timeout_secs: u64,
}

impl NisClient {
    /// Create a client for `endpoint` signing for `network`.
    ///
    /// No connection is made until the first request.
    pub fn new(endpoint: &EndpointConfig, network: Network) -> NemResult<Self> {
        let base_url = endpoint.base_url().map_err(NemError::Transport)?;
        let http = Client::builder()
            .timeout(Duration::from_secs(endpoint.timeout_secs))
            .build()
            .map_err(|e| NemError::Transport(format!("failed to build HTTP client: {}", e)))?;

        tracing::info!(
            endpoint = %base_url,
            network = %network,
            timeout_secs = endpoint.timeout_secs,
            "NIS client initialized"
        );

        Ok(Self {
            http,
            base_url,
            network,
            timeout_secs: endpoint.timeout_secs,
        })
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> NemResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| NemError::Transport(format!("invalid request path '{}': {}", path, e)))
    }

    fn map_send_error(&self, err: reqwest::Error) -> NemError {
        if err.is_timeout() {
            NemError::Timeout(self.timeout_secs)
        } else {
            NemError::Transport(err.to_string())
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, response: Response) -> NemResult<T> {
        let status = response.status();
        let text = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            let body = serde_json::from_str::<serde_json::Value>(&text).ok();
            let message = body
                .as_ref()
                .and_then(|b| b.get("message").or_else(|| b.get("error")))
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown status")
                        .to_string()
                });
            return Err(NemError::Node {
                status: status.as_u16(),
                message,
                body,
            });
        }

        serde_json::from_str(&text).map_err(|e| NemError::Decode(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> NemResult<T> {
        let mut url = self.url(path)?;
        url.query_pairs_mut().extend_pairs(query);

        tracing::debug!(url = %url, "NIS GET");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.read_json(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> NemResult<T> {
        let url = self.url(path)?;

        tracing::debug!(url = %url, "NIS POST");
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.read_json(response).await
    }

    /// Announce a signed transaction.
    pub async fn announce(&self, signed: &SignedTransaction) -> NemResult<AnnounceResult> {
        let result: AnnounceResult = self.post_json(ANNOUNCE_PATH, signed).await?;
        if !result.is_success() {
            tracing::warn!(code = result.code, message = %result.message, "Node rejected announce");
        }
        Ok(result)
    }

    /// Build, sign and announce a transfer.
    pub async fn send_transfer(&self, request: &TransferRequest) -> NemResult<AnnounceResult> {
        let privkey = fix_private_key(&request.privkey)?;
        let keys = KeyPair::from_private_key(&privkey)?;
        let request = TransferRequest {
            privkey,
            ..request.clone()
        };
        let tx = TransferTransaction::prepare(&keys, &request, self.network, nem_timestamp_now())?;
        let signed = tx.sign(&keys);

        tracing::info!(
            recipient = %tx.recipient,
            amount = tx.amount,
            fee = tx.fee,
            encrypted = request.recipient_pubkey.as_deref().is_some_and(|p| !p.is_empty()),
            "Announcing transfer"
        );
        self.announce(&signed).await
    }

    async fn transfers(&self, path: &str, account: &str) -> NemResult<TransactionPage> {
        let account = address::validate(account, self.network)?;
        self.get_json(path, &[("address", account.as_str())]).await
    }

    /// Transfers received by `account`.
    pub async fn incoming_transactions(&self, account: &str) -> NemResult<TransactionPage> {
        self.transfers(INCOMING_PATH, account).await
    }

    /// Transfers sent by `account`.
    pub async fn outgoing_transactions(&self, account: &str) -> NemResult<TransactionPage> {
        self.transfers(OUTGOING_PATH, account).await
    }
}

impl std::fmt::Debug for NisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NisClient")
            .field("base_url", &self.base_url.as_str())
            .field("network", &self.network)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(host: &str) -> EndpointConfig {
        EndpointConfig {
            host: host.to_string(),
            port: 7890,
            timeout_secs: 1,
        }
    }

    #[test]
    fn test_client_creation() {
        let client = NisClient::new(&endpoint("127.0.0.1"), Network::Testnet).unwrap();
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:7890/");
        assert_eq!(
            client.url(INCOMING_PATH).unwrap().as_str(),
            "http://127.0.0.1:7890/account/transfers/incoming"
        );
    }

    #[test]
    fn test_invalid_host_rejected() {
        let err = NisClient::new(&endpoint("http://bad host"), Network::Testnet).unwrap_err();
        assert!(matches!(err, NemError::Transport(_)));
    }

    #[tokio::test]
    async fn test_invalid_address_fails_before_request() {
        // Port 9 is discard; the address check must fail first.
        let mut config = endpoint("127.0.0.1");
        config.port = 9;
        let client = NisClient::new(&config, Network::Testnet).unwrap();
        let err = client.incoming_transactions("TNOTANADDRESS").await.unwrap_err();
        assert!(matches!(err, NemError::InvalidAddress(_)));
    }

    #[tokio::test]
    async fn test_unreachable_node_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut config = endpoint("127.0.0.1");
        config.port = port;
        let client = NisClient::new(&config, Network::Testnet).unwrap();

        let keys = KeyPair::from_private_key(
            "575dbb3062267eff57c970a336ebbc8fbcfe12c5bd3ed7bc11eb0481d7704ced",
        )
        .unwrap();
        let account = address::from_public_key_bytes(keys.public_key(), Network::Testnet);

        let err = client.outgoing_transactions(&account).await.unwrap_err();
        assert!(matches!(err, NemError::Transport(_) | NemError::Timeout(_)));
    }
}
