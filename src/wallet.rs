//! Session wallet

use anyhow::{Context, Result};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use std::sync::Arc;

use crate::keys;

/// Holds the session keypair used to co-sign casts
pub struct WalletManager {
    keypair: Arc<Keypair>,
}

impl WalletManager {
    /// Load from a base58 session credential (`seed || pubkey`).
    ///
    /// The public half must belong to the seed, so a credential produced by
    /// trusting a mismatched public key is rejected here.
    pub fn from_base58(session_key: &str) -> Result<Self> {
        let bytes = keys::decode_keypair_base58(session_key).context("Invalid session key")?;
        Self::from_keypair_bytes(bytes.as_slice())
    }

    /// Load from a keypair file, either raw 64 bytes or a JSON byte array
    pub fn from_file(path: &str) -> Result<Self> {
        let keypair_bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read keypair file: {}", path))?;

        if keypair_bytes.len() == keys::KEYPAIR_LEN {
            Self::from_keypair_bytes(&keypair_bytes)
        } else {
            let json: Vec<u8> = serde_json::from_slice(&keypair_bytes)
                .context("Failed to parse keypair JSON")?;
            if json.len() != keys::KEYPAIR_LEN {
                anyhow::bail!(
                    "Invalid keypair length: expected {} bytes, got {}",
                    keys::KEYPAIR_LEN,
                    json.len()
                );
            }
            Self::from_keypair_bytes(&json)
        }
    }

    pub fn from_keypair(keypair: Keypair) -> Self {
        Self {
            keypair: Arc::new(keypair),
        }
    }

    fn from_keypair_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.iter().all(|&b| b == 0) {
            anyhow::bail!("Invalid keypair: all-zero key rejected");
        }
        let keypair = Keypair::try_from(bytes)
            .context("Invalid keypair bytes: public key does not match seed")?;
        Ok(Self::from_keypair(keypair))
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl Clone for WalletManager {
    fn clone(&self) -> Self {
        Self {
            keypair: Arc::clone(&self.keypair),
        }
    }
}

impl std::fmt::Debug for WalletManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletManager")
            .field("pubkey", &self.pubkey())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{convert, DerivationMode};
    use std::io::Write;

    fn container(seed: [u8; 32]) -> Vec<u8> {
        let mut out = vec![0u8; 16];
        out.extend_from_slice(&seed);
        out
    }

    #[test]
    fn test_from_converted_credential() {
        let converted = convert(&container([11u8; 32]), &[], DerivationMode::DeriveFromSeed).unwrap();
        let wallet = WalletManager::from_base58(&converted.keypair_base58()).unwrap();
        assert_eq!(wallet.pubkey().to_string(), converted.public_key_base58());
    }

    #[test]
    fn test_mismatched_public_key_rejected() {
        let converted = convert(
            &container([11u8; 32]),
            &[0x77; 32],
            DerivationMode::TrustSuppliedPublicKey,
        )
        .unwrap();
        assert!(WalletManager::from_base58(&converted.keypair_base58()).is_err());
    }

    #[test]
    fn test_all_zero_rejected() {
        let encoded = bs58::encode([0u8; 64]).into_string();
        let err = WalletManager::from_base58(&encoded).unwrap_err();
        assert!(err.to_string().contains("all-zero"));
    }

    #[test]
    fn test_from_json_file() {
        let keypair = Keypair::new();
        let json = serde_json::to_string(&keypair.to_bytes().to_vec()).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let wallet = WalletManager::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(wallet.pubkey(), keypair.pubkey());
    }
}
