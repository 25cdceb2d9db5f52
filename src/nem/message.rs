//! Encrypted message payloads.
//!
//! Payload layout (hex on the wire):
//! ```text
//! salt (32) | iv (16) | AES-256-CBC ciphertext (PKCS#7, multiple of 16)
//! ```
//! The AES key is `keccak256(shared_point XOR salt)`. Empty plaintexts
//! are rejected rather than encrypted into a padding-only block.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use sha3::{Digest, Keccak256};

use crate::nem::keys::{decode_public_key, KeyPair};
use crate::nem::types::{NemError, NemResult};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const SALT_LEN: usize = 32;
const IV_LEN: usize = 16;
const BLOCK_LEN: usize = 16;

fn derive_key(private_key_hex: &str, public_key_hex: &str, salt: &[u8; SALT_LEN]) -> NemResult<[u8; 32]> {
    let keys = KeyPair::from_private_key(private_key_hex)?;
    let (_, other) = decode_public_key(public_key_hex)?;

    let mut shared = keys.shared_point(&other);
    for (byte, salt_byte) in shared.iter_mut().zip(salt.iter()) {
        *byte ^= salt_byte;
    }

    let digest = Keccak256::digest(shared);
    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    Ok(key)
}

/// Encrypt with an explicit salt and IV.
pub fn encode_with(
    private_key_hex: &str,
    public_key_hex: &str,
    plaintext: &[u8],
    salt: [u8; SALT_LEN],
    iv: [u8; IV_LEN],
) -> NemResult<String> {
    if plaintext.is_empty() {
        return Err(NemError::InvalidPayload("message to encrypt is empty".to_string()));
    }

    let key = derive_key(private_key_hex, public_key_hex, &salt)?;
    let cipher = Aes256CbcEnc::new_from_slices(&key, &iv)
        .map_err(|e| NemError::Cipher(format!("cipher init failed: {}", e)))?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut payload = Vec::with_capacity(SALT_LEN + IV_LEN + ciphertext.len());
    payload.extend_from_slice(&salt);
    payload.extend_from_slice(&iv);
    payload.extend_from_slice(&ciphertext);
    Ok(hex::encode(payload))
}

/// Encrypt `plaintext` from the holder of `private_key_hex` to `public_key_hex`.
///
/// Returns the lowercase hex payload.
pub fn encode(private_key_hex: &str, public_key_hex: &str, plaintext: &[u8]) -> NemResult<String> {
    let mut rng = rand::thread_rng();
    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; IV_LEN];
    rng.fill_bytes(&mut salt);
    rng.fill_bytes(&mut iv);

    encode_with(private_key_hex, public_key_hex, plaintext, salt, iv)
}

/// Decrypt a hex payload produced by [`encode`].
pub fn decode(private_key_hex: &str, public_key_hex: &str, payload_hex: &str) -> NemResult<Vec<u8>> {
    let payload = hex::decode(payload_hex.trim())
        .map_err(|e| NemError::InvalidPayload(format!("payload is not valid hex: {}", e)))?;

    if payload.len() < SALT_LEN + IV_LEN + BLOCK_LEN {
        return Err(NemError::InvalidPayload(format!(
            "payload is {} bytes, too short for salt, iv and one block",
            payload.len()
        )));
    }

    let (salt, rest) = payload.split_at(SALT_LEN);
    let (iv, ciphertext) = rest.split_at(IV_LEN);
    if ciphertext.len() % BLOCK_LEN != 0 {
        return Err(NemError::InvalidPayload(format!(
            "ciphertext length {} is not a multiple of {}",
            ciphertext.len(),
            BLOCK_LEN
        )));
    }

    let mut salt_bytes = [0u8; SALT_LEN];
    salt_bytes.copy_from_slice(salt);

    let key = derive_key(private_key_hex, public_key_hex, &salt_bytes)?;
    let cipher = Aes256CbcDec::new_from_slices(&key, iv)
        .map_err(|e| NemError::Cipher(format!("cipher init failed: {}", e)))?;

    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| NemError::Cipher("decryption failed: wrong key or corrupted payload".to_string()))
}
