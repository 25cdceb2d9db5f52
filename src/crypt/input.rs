//! Utility input parsing.

use std::fmt;

use crate::crypt::CryptError;

/// Number of input lines the utility consumes.
pub const REQUIRED_LINES: usize = 3;

/// Direction of the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Encrypt,
    Decrypt,
}

impl Mode {
    /// `decrypt` selects decryption; anything else, or nothing, encrypts.
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            Some("decrypt") => Mode::Decrypt,
            _ => Mode::Encrypt,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Encrypt => f.write_str("encrypt"),
            Mode::Decrypt => f.write_str("decrypt"),
        }
    }
}

/// Private key, public key and message, in input order.
#[derive(Clone, PartialEq, Eq)]
pub struct CryptInput {
    pub privkey: String,
    pub pubkey: String,
    /// Plaintext bytes when encrypting, hex payload when decrypting.
    pub message: Vec<u8>,
    /// Lines after the third, which are ignored.
    pub extra_lines: usize,
}

impl CryptInput {
    /// Split raw stdin into the input triple.
    ///
    /// Lines end with `\n` and an optional `\r`; a final line without a
    /// newline counts.
    pub fn parse(input: &[u8]) -> Result<Self, CryptError> {
        let body = input.strip_suffix(b"\n").unwrap_or(input);
        let lines: Vec<&[u8]> = if input.is_empty() {
            Vec::new()
        } else {
            body.split(|b| *b == b'\n')
                .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
                .collect()
        };

        if lines.len() < REQUIRED_LINES {
            return Err(CryptError::MissingInput { found: lines.len() });
        }

        Ok(Self {
            privkey: String::from_utf8_lossy(lines[0]).trim().to_string(),
            pubkey: String::from_utf8_lossy(lines[1]).trim().to_string(),
            message: lines[2].to_vec(),
            extra_lines: lines.len() - REQUIRED_LINES,
        })
    }
}

impl fmt::Debug for CryptInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptInput")
            .field("pubkey", &self.pubkey)
            .field("message_len", &self.message.len())
            .field("extra_lines", &self.extra_lines)
            .finish_non_exhaustive()
    }
}
