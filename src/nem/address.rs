//! Account address derivation and validation.
//!
//! An address is `base32(prefix || ripemd160(keccak256(pubkey)) || checksum)`
//! where `checksum` is the first four bytes of `keccak256` over the
//! preceding 21 bytes. Encoded addresses are always 40 characters.

use data_encoding::BASE32;
use ripemd::Ripemd160;
use sha3::{Digest, Keccak256};

use crate::nem::keys::decode_hex32;
use crate::nem::types::{NemError, NemResult, Network};

/// Decoded address length in bytes.
const ADDRESS_DECODED_LEN: usize = 25;

/// Encoded address length in characters.
pub const ADDRESS_ENCODED_LEN: usize = 40;

const CHECKSUM_LEN: usize = 4;

fn checksum(versioned: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = Keccak256::digest(versioned);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[..CHECKSUM_LEN]);
    out
}

/// Derive the address of raw public key bytes on `network`.
pub fn from_public_key_bytes(public_key: &[u8; 32], network: Network) -> String {
    let sha = Keccak256::digest(public_key);
    let ripe = Ripemd160::digest(sha);

    let mut decoded = Vec::with_capacity(ADDRESS_DECODED_LEN);
    decoded.push(network.address_prefix());
    decoded.extend_from_slice(&ripe);
    let sum = checksum(&decoded);
    decoded.extend_from_slice(&sum);

    BASE32.encode(&decoded)
}

/// Derive the address of a hex public key on `network`.
pub fn from_public_key(public_key_hex: &str, network: Network) -> NemResult<String> {
    let bytes = decode_hex32(public_key_hex, "public key")?;
    Ok(from_public_key_bytes(&bytes, network))
}

/// Upper-case and strip the dashes of a pretty-printed address.
pub fn normalize(address: &str) -> String {
    address
        .trim()
        .chars()
        .filter(|c| *c != '-')
        .collect::<String>()
        .to_ascii_uppercase()
}

/// Check that `address` is well formed for `network`.
///
/// Returns the normalised form on success.
pub fn validate(address: &str, network: Network) -> NemResult<String> {
    let normalized = normalize(address);
    if normalized.len() != ADDRESS_ENCODED_LEN {
        return Err(NemError::InvalidAddress(format!(
            "{} has {} characters, expected {}",
            address,
            normalized.len(),
            ADDRESS_ENCODED_LEN
        )));
    }

    let decoded = BASE32
        .decode(normalized.as_bytes())
        .map_err(|e| NemError::InvalidAddress(format!("{} is not base32: {}", address, e)))?;

    if decoded.len() != ADDRESS_DECODED_LEN {
        return Err(NemError::InvalidAddress(format!(
            "{} decodes to {} bytes",
            address,
            decoded.len()
        )));
    }

    if decoded[0] != network.address_prefix() {
        return Err(NemError::InvalidAddress(format!(
            "{} does not belong to {}",
            address, network
        )));
    }

    let (versioned, sum) = decoded.split_at(ADDRESS_DECODED_LEN - CHECKSUM_LEN);
    if checksum(versioned)[..] != sum[..] {
        return Err(NemError::InvalidAddress(format!("{} has a bad checksum", address)));
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nem::keys::KeyPair;

    const TEST_PRIVATE_KEY: &str = "575dbb3062267eff57c970a336ebbc8fbcfe12c5bd3ed7bc11eb0481d7704ced";

    fn test_public_key() -> String {
        KeyPair::from_private_key(TEST_PRIVATE_KEY)
            .unwrap()
            .public_key_hex()
    }

    #[test]
    fn test_address_prefix_per_network() {
        let pubkey = test_public_key();
        let testnet = from_public_key(&pubkey, Network::Testnet).unwrap();
        let mainnet = from_public_key(&pubkey, Network::Mainnet).unwrap();
        let mijin = from_public_key(&pubkey, Network::Mijin).unwrap();

        assert_eq!(testnet.len(), ADDRESS_ENCODED_LEN);
        assert!(testnet.starts_with('T'));
        assert!(mainnet.starts_with('N'));
        assert!(mijin.starts_with('M'));
    }

    #[test]
    fn test_known_addresses() {
        let pubkey = "c5f54ba980fcbb657dbaaa42700539b207873e134d2375efeab5f1ab52f87844";
        assert_eq!(
            from_public_key(pubkey, Network::Mainnet).unwrap(),
            "NDD2CT6LQLIYQ56KIXI3ENTM6EK3D44P5JFXJ4R4"
        );
        assert_eq!(
            from_public_key(pubkey, Network::Testnet).unwrap(),
            "TDD2CT6LQLIYQ56KIXI3ENTM6EK3D44P5KZPFMK2"
        );
        assert_eq!(test_public_key(), pubkey);
    }

    #[test]
    fn test_derived_address_validates() {
        let address = from_public_key(&test_public_key(), Network::Testnet).unwrap();
        assert_eq!(validate(&address, Network::Testnet).unwrap(), address);
        assert!(validate(&address, Network::Mainnet).is_err());
    }

    #[test]
    fn test_pretty_address_is_normalized() {
        let address = from_public_key(&test_public_key(), Network::Testnet).unwrap();
        let pretty: Vec<String> = address
            .as_bytes()
            .chunks(6)
            .map(|c| String::from_utf8_lossy(c).to_lowercase())
            .collect();
        let pretty = pretty.join("-");

        assert_eq!(validate(&pretty, Network::Testnet).unwrap(), address);
    }

    #[test]
    fn test_bad_checksum_rejected() {
        let address = from_public_key(&test_public_key(), Network::Testnet).unwrap();
        let mut chars: Vec<char> = address.chars().collect();
        let last = chars[39];
        chars[39] = if last == 'A' { 'B' } else { 'A' };
        let broken: String = chars.into_iter().collect();

        let err = validate(&broken, Network::Testnet).unwrap_err();
        assert!(matches!(err, NemError::InvalidAddress(_)));
    }

    #[test]
    fn test_malformed_public_key() {
        assert!(from_public_key("abcd", Network::Testnet).is_err());
        assert!(from_public_key(&"zz".repeat(32), Network::Testnet).is_err());
    }
}
