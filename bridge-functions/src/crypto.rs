//! Cryptographic Operations Module
//!
//! secp256k1 signing for EVM transactions and SHA-256 routine digests.
//! Private keys must never be exposed or logged.

use anyhow::{Context, Result};
use chain_clients_common::strip_hex_prefix;
use chain_clients_evm::{TransactionSignature, H160};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use sha2::Sha256;
use sha3::{Digest, Keccak256};
use std::fmt;

/// ECDSA signer for the pool messenger account.
#[derive(Clone)]
pub struct EvmSigner {
    signing_key: SigningKey,
}

impl fmt::Debug for EvmSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmSigner")
            .field("address", &self.address())
            .finish()
    }
}

impl EvmSigner {
    /// Parses a 32-byte hex private key, with or without `0x`.
    pub fn from_hex(key: &str) -> Result<Self> {
        let bytes = hex::decode(strip_hex_prefix(key.trim()))
            .context("Private key is not valid hex")?;
        if bytes.len() != 32 {
            anyhow::bail!(
                "Invalid private key length: expected 32 bytes, got {}",
                bytes.len()
            );
        }
        let signing_key = SigningKey::from_slice(&bytes)
            .map_err(|e| anyhow::anyhow!("Failed to create ECDSA signing key: {}", e))?;
        Ok(Self { signing_key })
    }

    /// Ethereum address: keccak256(uncompressed_public_key[1..])[12..32]
    pub fn address(&self) -> H160 {
        let public_key_point = self.signing_key.verifying_key().to_encoded_point(false);
        let mut hasher = Keccak256::new();
        hasher.update(&public_key_point.as_bytes()[1..]);
        let hash = hasher.finalize();
        H160::from_slice(&hash[12..])
    }

    /// Signs a raw transaction hash (no message prefix).
    ///
    /// # Returns
    ///
    /// * `Ok(TransactionSignature)` - r and s big-endian, recovery_id 0 or 1
    pub fn sign_prehash(&self, hash: &[u8; 32]) -> Result<TransactionSignature> {
        use k256::ecdsa::signature::hazmat::PrehashSigner;
        let signature: Signature = self
            .signing_key
            .sign_prehash(hash)
            .map_err(|e| anyhow::anyhow!("Failed to sign transaction hash: {}", e))?;

        // k256 signs with low-s, so the recovery id is whichever of 0/1 gives back our key
        let expected = self.signing_key.verifying_key();
        let recovery_id = [0u8, 1u8]
            .into_iter()
            .find(|&id| {
                k256::ecdsa::RecoveryId::try_from(id)
                    .ok()
                    .and_then(|rid| VerifyingKey::recover_from_prehash(hash, &signature, rid).ok())
                    .map(|recovered| &recovered == expected)
                    .unwrap_or(false)
            })
            .context("Could not determine signature recovery id")?;

        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);

        Ok(TransactionSignature { r, s, recovery_id })
    }
}

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known development key (first Hardhat/Anvil account)
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_address_derivation() {
        let signer = EvmSigner::from_hex(DEV_KEY).unwrap();
        assert_eq!(
            format!("{:?}", signer.address()),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_signature_recovers_signer() {
        let signer = EvmSigner::from_hex(DEV_KEY).unwrap();
        let hash = [7u8; 32];
        let sig = signer.sign_prehash(&hash).unwrap();

        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&sig.r);
        bytes[32..].copy_from_slice(&sig.s);
        let signature = Signature::from_slice(&bytes).unwrap();
        let rid = k256::ecdsa::RecoveryId::try_from(sig.recovery_id).unwrap();
        let recovered = VerifyingKey::recover_from_prehash(&hash, &signature, rid).unwrap();

        assert_eq!(&recovered, signer.signing_key.verifying_key());
    }

    #[test]
    fn test_rejects_bad_keys() {
        assert!(EvmSigner::from_hex("0x1234").is_err());
        assert!(EvmSigner::from_hex("zz").is_err());
    }

    #[test]
    fn test_debug_does_not_print_key() {
        let signer = EvmSigner::from_hex(DEV_KEY).unwrap();
        let printed = format!("{:?}", signer);
        assert!(!printed.contains("ac0974bec39a17e3"));
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            hex::encode(sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
