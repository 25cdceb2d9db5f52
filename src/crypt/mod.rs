//! One-shot message encrypt/decrypt utility.
//!
//! # Data Flow
//! ```text
//! stdin (read to EOF)
//!     → input.rs (private key, public key, message)
//!     → NodeFacade::encode_message / decode_message
//!     → stdout (hex payload or plaintext, no trailing newline)
//! ```
//!
//! # Design Decisions
//! - Fewer than three input lines is an error, not a silent empty result
//! - Output is written once, after the whole input has been read
//! - Encrypting an empty message is an error, as is a private key that is
//!   not 64 hex characters (66 with a leading `00`)

pub mod input;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::nem::{NemError, NodeFacade};

pub use input::{CryptInput, Mode, REQUIRED_LINES};

#[derive(Debug, Error)]
pub enum CryptError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("expected {} input lines (private key, public key, message), got {found}", REQUIRED_LINES)]
    MissingInput { found: usize },

    #[error(transparent)]
    Facade(#[from] NemError),
}

/// Output options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CryptOptions {
    pub mode: Mode,
    /// Write decrypted plaintext as hex instead of raw bytes.
    pub hex_output: bool,
}

/// Apply `options.mode` to a parsed input.
pub async fn transform(
    facade: &dyn NodeFacade,
    input: &CryptInput,
    options: CryptOptions,
) -> Result<Vec<u8>, CryptError> {
    match options.mode {
        Mode::Encrypt => {
            let payload = facade
                .encode_message(&input.privkey, &input.pubkey, &input.message)
                .await?;
            Ok(payload.into_bytes())
        }
        Mode::Decrypt => {
            let payload = String::from_utf8_lossy(&input.message);
            let plain = facade
                .decode_message(&input.privkey, &input.pubkey, payload.trim())
                .await?;
            if options.hex_output {
                Ok(hex::encode(plain).into_bytes())
            } else {
                Ok(plain)
            }
        }
    }
}

/// Read all of `reader`, transform it and write the result to `writer`.
pub async fn run<R, W>(
    facade: &dyn NodeFacade,
    options: CryptOptions,
    mut reader: R,
    mut writer: W,
) -> Result<(), CryptError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw).await?;

    let input = CryptInput::parse(&raw)?;
    if input.extra_lines > 0 {
        tracing::warn!(extra_lines = input.extra_lines, "Ignoring input lines after the third");
    }
    tracing::debug!(mode = %options.mode, message_len = input.message.len(), "Transforming message");

    let output = transform(facade, &input, options).await?;
    writer.write_all(&output).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EndpointConfig;
    use crate::nem::{KeyPair, Network, NisClient};

    const ALICE: &str = "575dbb3062267eff57c970a336ebbc8fbcfe12c5bd3ed7bc11eb0481d7704ced";
    const BOB: &str = "1ba9a2a6b5b3d0e1d77a9b39e0b0f3a1c2d4e5f60718293a4b5c6d7e8f901234";

    fn facade() -> NisClient {
        NisClient::new(&EndpointConfig::default(), Network::Testnet).unwrap()
    }

    fn public(private_key: &str) -> String {
        KeyPair::from_private_key(private_key).unwrap().public_key_hex()
    }

    async fn run_on(options: CryptOptions, input: String) -> Result<Vec<u8>, CryptError> {
        let mut out = Vec::new();
        run(&facade(), options, input.as_bytes(), &mut out).await?;
        Ok(out)
    }

    #[tokio::test]
    async fn test_encrypt_then_decrypt() {
        let encrypted = run_on(
            CryptOptions::default(),
            format!("{}\n{}\nhello nem\n", ALICE, public(BOB)),
        )
        .await
        .unwrap();
        let payload = String::from_utf8(encrypted).unwrap();
        assert!(!payload.ends_with('\n'));
        assert!(payload.chars().all(|c| c.is_ascii_hexdigit()));

        let decrypt = CryptOptions {
            mode: Mode::Decrypt,
            hex_output: false,
        };
        let plain = run_on(decrypt, format!("{}\n{}\n{}\n", BOB, public(ALICE), payload))
            .await
            .unwrap();
        assert_eq!(plain, b"hello nem");
    }

    #[tokio::test]
    async fn test_decrypt_hex_output() {
        let payload = facade()
            .encode_message(ALICE, &public(BOB), b"hi")
            .await
            .unwrap();
        let options = CryptOptions {
            mode: Mode::Decrypt,
            hex_output: true,
        };
        let out = run_on(options, format!("{}\n{}\n{}", ALICE, public(BOB), payload))
            .await
            .unwrap();
        assert_eq!(out, b"6869");
    }

    #[tokio::test]
    async fn test_short_input_fails() {
        let err = run_on(CryptOptions::default(), format!("{}\n", ALICE))
            .await
            .unwrap_err();
        assert!(matches!(err, CryptError::MissingInput { found: 1 }));
        assert!(err.to_string().contains("got 1"));
    }

    #[tokio::test]
    async fn test_bad_key_propagates() {
        let err = run_on(CryptOptions::default(), "zz\nyy\nmsg".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, CryptError::Facade(_)));
    }
}
