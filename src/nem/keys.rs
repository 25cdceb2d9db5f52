//! Key pair derivation and transaction signing.
//!
//! NEM uses Ed25519 with Keccak-512 in place of SHA-512, and stores
//! private keys byte-reversed relative to their hex form.
//!
//! # Security
//! - Private keys are never logged or serialized
//! - `Debug` only prints the public half

use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::scalar::{clamp_integer, Scalar};
use sha3::{Digest, Keccak512};

use crate::nem::types::{NemError, NemResult};

/// Pad a private key the way NEM wallets do before signing.
///
/// A single leading `00` (66-char NIS export format) is dropped and
/// short keys are left-padded with zeros. Empty keys are rejected.
pub fn fix_private_key(private_key_hex: &str) -> NemResult<String> {
    let key = private_key_hex.trim();
    if key.is_empty() {
        return Err(NemError::InvalidKey("private key is missing".to_string()));
    }
    let key = key.strip_prefix("00").unwrap_or(key);

    if key.len() > 64 {
        return Err(NemError::InvalidKey(format!(
            "private key has {} hex characters, expected 64",
            key.len()
        )));
    }

    Ok(format!("{:0>64}", key))
}

/// Decode exactly 32 bytes of hex.
pub fn decode_hex32(value: &str, what: &str) -> NemResult<[u8; 32]> {
    let value = value.trim();
    if value.len() != 64 {
        return Err(NemError::InvalidKey(format!(
            "{} has {} hex characters, expected 64",
            what,
            value.len()
        )));
    }

    let mut out = [0u8; 32];
    hex::decode_to_slice(value, &mut out)
        .map_err(|e| NemError::InvalidKey(format!("{} is not valid hex: {}", what, e)))?;
    Ok(out)
}

/// Decode a public key and check that it is a point on the curve.
pub fn decode_public_key(public_key_hex: &str) -> NemResult<(CompressedEdwardsY, EdwardsPoint)> {
    let bytes = decode_hex32(public_key_hex, "public key")?;
    let compressed = CompressedEdwardsY(bytes);
    let point = compressed
        .decompress()
        .ok_or_else(|| NemError::InvalidKey("public key is not a valid curve point".to_string()))?;
    Ok((compressed, point))
}

fn keccak512<const N: usize>(parts: [&[u8]; N]) -> [u8; 64] {
    let mut hasher = Keccak512::new();
    for part in parts {
        hasher.update(part);
    }
    let digest = hasher.finalize();
    let mut out = [0u8; 64];
    out.copy_from_slice(&digest);
    out
}

/// NEM key pair.
#[derive(Clone)]
pub struct KeyPair {
    /// Keccak-512 of the reversed secret; low half is the scalar, high half the nonce prefix.
    expanded: [u8; 64],
    public: [u8; 32],
}

impl KeyPair {
    /// Create a key pair from a hex-encoded private key.
    ///
    /// Accepts 64 hex characters, or 66 with a leading `00`.
    ///
    /// # Security
    /// The private key is parsed and stored in memory only. It is never logged.
    pub fn from_private_key(private_key_hex: &str) -> NemResult<Self> {
        let key = private_key_hex.trim();
        if key.is_empty() {
            return Err(NemError::InvalidKey("private key is missing".to_string()));
        }
        let key = match key.strip_prefix("00") {
            Some(rest) if key.len() == 66 => rest,
            _ => key,
        };

        let mut secret = decode_hex32(key, "private key")?;
        secret.reverse();

        let expanded = keccak512([&secret[..]]);
        let public = EdwardsPoint::mul_base_clamped(Self::low_half(&expanded))
            .compress()
            .to_bytes();

        Ok(Self { expanded, public })
    }

    fn low_half(expanded: &[u8; 64]) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&expanded[..32]);
        bytes
    }

    /// Raw public key bytes.
    pub fn public_key(&self) -> &[u8; 32] {
        &self.public
    }

    /// Lowercase hex public key.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public)
    }

    /// Sign arbitrary bytes.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        let a = Scalar::from_bytes_mod_order(clamp_integer(Self::low_half(&self.expanded)));

        let r = Scalar::from_bytes_mod_order_wide(&keccak512([&self.expanded[32..], message]));
        let big_r = EdwardsPoint::mul_base(&r).compress();

        let k = Scalar::from_bytes_mod_order_wide(&keccak512([
            &big_r.as_bytes()[..],
            &self.public[..],
            message,
        ]));
        let s = r + k * a;

        let mut signature = [0u8; 64];
        signature[..32].copy_from_slice(big_r.as_bytes());
        signature[32..].copy_from_slice(s.as_bytes());
        signature
    }

    /// ECDH point shared with `other`, as NEM computes it (against the negated point).
    pub fn shared_point(&self, other: &EdwardsPoint) -> [u8; 32] {
        (-*other)
            .mul_clamped(Self::low_half(&self.expanded))
            .compress()
            .to_bytes()
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// Check a signature produced by [`KeyPair::sign`].
pub fn verify(public_key: &[u8; 32], message: &[u8], signature: &[u8; 64]) -> bool {
    let a = match CompressedEdwardsY(*public_key).decompress() {
        Some(point) => point,
        None => return false,
    };

    let mut s_bytes = [0u8; 32];
    s_bytes.copy_from_slice(&signature[32..]);
    let s: Scalar = match Option::from(Scalar::from_canonical_bytes(s_bytes)) {
        Some(s) => s,
        None => return false,
    };

    let k = Scalar::from_bytes_mod_order_wide(&keccak512([&signature[..32], &public_key[..], message]));
    let check = EdwardsPoint::vartime_double_scalar_mul_basepoint(&k, &(-a), &s);

    check.compress().as_bytes()[..] == signature[..32]
}
