//! Session key conversion
//!
//! Browser key exports hand us an Ed25519 private key wrapped in a PKCS#8
//! container plus the raw 32-byte public key. Solana tooling wants the
//! 64-byte `seed || pubkey` keypair encoding, rendered as base58. This module
//! performs that conversion and nothing else: no I/O, no persistence.
//!
//! ## Container layout
//!
//! ```text
//! [0..16)   opaque PKCS#8 header (never interpreted)
//! [16..48)  32-byte Ed25519 seed
//! ```

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ed25519_dalek::SigningKey;
use thiserror::Error;
use zeroize::{Zeroize, Zeroizing};

/// Exact length of a wrapped key container.
pub const WRAPPED_KEY_LEN: usize = 48;

/// Length of the opaque container header preceding the seed.
pub const WRAPPED_KEY_HEADER_LEN: usize = 16;

/// Ed25519 seed length.
pub const SEED_LEN: usize = 32;

/// Raw Ed25519 public key length.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Full keypair length (`seed || pubkey`).
pub const KEYPAIR_LEN: usize = 64;

/// Errors raised while converting key material
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyConversionError {
    /// Input had the wrong size for its role
    #[error("Invalid {what} length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Input text could not be decoded
    #[error("Invalid {what} encoding: {reason}")]
    InvalidEncoding { what: &'static str, reason: String },
}

impl KeyConversionError {
    /// Structural errors never succeed on retry
    pub fn is_retryable(&self) -> bool {
        false
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidLength { .. } => "length",
            Self::InvalidEncoding { .. } => "encoding",
        }
    }
}

/// How the public half of the keypair is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DerivationMode {
    /// Concatenate the seed with the caller-supplied public key as-is.
    ///
    /// Only valid when the public key is known to belong to the seed.
    TrustSuppliedPublicKey,

    /// Re-derive the public key from the seed, ignoring the supplied one.
    #[default]
    DeriveFromSeed,
}

/// Result of a key conversion
///
/// The keypair bytes are wiped when this value is dropped.
pub struct ConvertedKey {
    keypair: Zeroizing<[u8; KEYPAIR_LEN]>,
    public_key: [u8; PUBLIC_KEY_LEN],
    supplied_key_matches: bool,
}

impl ConvertedKey {
    /// Raw `seed || pubkey` bytes
    pub fn keypair_bytes(&self) -> &[u8; KEYPAIR_LEN] {
        &self.keypair
    }

    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.public_key
    }

    /// Whether the caller-supplied public key belongs to the seed
    pub fn supplied_key_matches(&self) -> bool {
        self.supplied_key_matches
    }

    /// Base58 session credential, as consumed by [`crate::wallet::WalletManager::from_base58`]
    pub fn keypair_base58(&self) -> String {
        bs58::encode(self.keypair.as_slice()).into_string()
    }

    /// Base58 address of the session key
    pub fn public_key_base58(&self) -> String {
        bs58::encode(self.public_key).into_string()
    }
}

impl std::fmt::Debug for ConvertedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConvertedKey")
            .field("public_key", &self.public_key_base58())
            .field("keypair", &"<redacted>")
            .finish()
    }
}

/// Extract the 32-byte seed from a wrapped key container.
pub fn extract_seed(wrapped_key: &[u8]) -> Result<Zeroizing<[u8; SEED_LEN]>, KeyConversionError> {
    if wrapped_key.len() != WRAPPED_KEY_LEN {
        return Err(KeyConversionError::InvalidLength {
            what: "wrapped key",
            expected: WRAPPED_KEY_LEN,
            actual: wrapped_key.len(),
        });
    }

    let mut seed = Zeroizing::new([0u8; SEED_LEN]);
    seed.copy_from_slice(&wrapped_key[WRAPPED_KEY_HEADER_LEN..WRAPPED_KEY_LEN]);
    Ok(seed)
}

/// Derive the Ed25519 public key belonging to `seed`.
pub fn derive_public_key(seed: &[u8; SEED_LEN]) -> [u8; PUBLIC_KEY_LEN] {
    SigningKey::from_bytes(seed).verifying_key().to_bytes()
}

/// Check whether `raw_public_key` actually belongs to `seed`.
pub fn verify_public_key(seed: &[u8; SEED_LEN], raw_public_key: &[u8]) -> bool {
    raw_public_key.len() == PUBLIC_KEY_LEN && derive_public_key(seed).as_slice() == raw_public_key
}

/// Convert a wrapped key container into a 64-byte keypair.
///
/// `raw_public_key` is only read in [`DerivationMode::TrustSuppliedPublicKey`].
pub fn convert(
    wrapped_key: &[u8],
    raw_public_key: &[u8],
    mode: DerivationMode,
) -> Result<ConvertedKey, KeyConversionError> {
    let seed = extract_seed(wrapped_key)?;
    let supplied_key_matches = verify_public_key(&seed, raw_public_key);

    let public_key: [u8; PUBLIC_KEY_LEN] = match mode {
        DerivationMode::TrustSuppliedPublicKey => {
            raw_public_key
                .try_into()
                .map_err(|_| KeyConversionError::InvalidLength {
                    what: "public key",
                    expected: PUBLIC_KEY_LEN,
                    actual: raw_public_key.len(),
                })?
        }
        DerivationMode::DeriveFromSeed => derive_public_key(&seed),
    };

    let mut keypair = Zeroizing::new([0u8; KEYPAIR_LEN]);
    keypair[..SEED_LEN].copy_from_slice(seed.as_slice());
    keypair[SEED_LEN..].copy_from_slice(&public_key);

    Ok(ConvertedKey {
        keypair,
        public_key,
        supplied_key_matches,
    })
}

/// Convert base64 text as produced by the browser export.
pub fn convert_base64(
    wrapped_key_b64: &str,
    raw_public_key_b64: &str,
    mode: DerivationMode,
) -> Result<ConvertedKey, KeyConversionError> {
    let mut wrapped = decode_base64("wrapped key", wrapped_key_b64)?;
    let public = decode_base64("public key", raw_public_key_b64)?;
    let converted = convert(&wrapped, &public, mode);
    wrapped.zeroize();
    converted
}

/// Decode a base58 session credential back into its 64 raw bytes.
pub fn decode_keypair_base58(encoded: &str) -> Result<Zeroizing<[u8; KEYPAIR_LEN]>, KeyConversionError> {
    let mut bytes = bs58::decode(encoded.trim())
        .into_vec()
        .map_err(|e| KeyConversionError::InvalidEncoding {
            what: "keypair",
            reason: e.to_string(),
        })?;

    if bytes.len() != KEYPAIR_LEN {
        let actual = bytes.len();
        bytes.zeroize();
        return Err(KeyConversionError::InvalidLength {
            what: "keypair",
            expected: KEYPAIR_LEN,
            actual,
        });
    }

    let mut keypair = Zeroizing::new([0u8; KEYPAIR_LEN]);
    keypair.copy_from_slice(&bytes);
    bytes.zeroize();
    Ok(keypair)
}

fn decode_base64(what: &'static str, text: &str) -> Result<Vec<u8>, KeyConversionError> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| KeyConversionError::InvalidEncoding {
            what,
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn container_with_seed(seed: [u8; 32]) -> Vec<u8> {
        // Real PKCS#8 v1 Ed25519 prefix; its content is irrelevant to conversion
        let mut out = vec![
            0x30, 0x2e, 0x02, 0x01, 0x00, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x04, 0x22,
            0x04, 0x20,
        ];
        out.extend_from_slice(&seed);
        out
    }

    #[test]
    fn test_extract_seed_takes_bytes_16_to_48() {
        let seed: [u8; 32] = core::array::from_fn(|i| i as u8 + 100);
        let extracted = extract_seed(&container_with_seed(seed)).unwrap();
        assert_eq!(*extracted, seed);
    }

    #[test]
    fn test_wrong_container_length_rejected() {
        for len in [0, 32, 47, 49, 64] {
            let err = convert(&vec![1u8; len], &[0u8; 32], DerivationMode::DeriveFromSeed)
                .unwrap_err();
            assert_eq!(
                err,
                KeyConversionError::InvalidLength {
                    what: "wrapped key",
                    expected: 48,
                    actual: len,
                }
            );
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn test_derive_from_seed_matches_reference() {
        let seed = [7u8; 32];
        let reference = SigningKey::from_bytes(&seed).verifying_key().to_bytes();

        // Supplied public key is garbage and must be ignored
        let converted =
            convert(&container_with_seed(seed), &[0xAA; 32], DerivationMode::DeriveFromSeed)
                .unwrap();

        assert_eq!(converted.public_key(), &reference);
        assert_eq!(&converted.keypair_bytes()[..32], &seed);
        assert_eq!(&converted.keypair_bytes()[32..], &reference);
    }

    #[test]
    fn test_trusted_mode_concatenates_verbatim() {
        let seed = [3u8; 32];
        let supplied = [0x55u8; 32];
        let converted = convert(
            &container_with_seed(seed),
            &supplied,
            DerivationMode::TrustSuppliedPublicKey,
        )
        .unwrap();

        assert_eq!(&converted.keypair_bytes()[32..], &supplied);
        assert!(!verify_public_key(&seed, &supplied));
        assert!(!converted.supplied_key_matches());
    }

    #[test]
    fn test_trusted_mode_rejects_short_public_key() {
        let err = convert(
            &container_with_seed([1u8; 32]),
            &[0u8; 31],
            DerivationMode::TrustSuppliedPublicKey,
        )
        .unwrap_err();
        assert_eq!(err.category(), "length");
    }

    #[test]
    fn test_both_modes_agree_for_matching_public_key() {
        let seed = [42u8; 32];
        let public = derive_public_key(&seed);
        assert!(verify_public_key(&seed, &public));

        let container = container_with_seed(seed);
        let a = convert(&container, &public, DerivationMode::TrustSuppliedPublicKey).unwrap();
        let b = convert(&container, &public, DerivationMode::DeriveFromSeed).unwrap();
        assert_eq!(a.keypair_base58(), b.keypair_base58());
        assert_eq!(a.public_key_base58(), b.public_key_base58());
        assert!(a.supplied_key_matches() && b.supplied_key_matches());
    }

    #[test]
    fn test_convert_base64_input() {
        let seed = [9u8; 32];
        let container = STANDARD.encode(container_with_seed(seed));
        let public = STANDARD.encode(derive_public_key(&seed));

        let converted = convert_base64(&container, &public, DerivationMode::DeriveFromSeed).unwrap();
        assert_eq!(converted.public_key(), &derive_public_key(&seed));

        let err = convert_base64("not base64!", &public, DerivationMode::DeriveFromSeed).unwrap_err();
        assert_eq!(err.category(), "encoding");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let converted =
            convert(&container_with_seed([5u8; 32]), &[], DerivationMode::DeriveFromSeed).unwrap();
        let debug = format!("{:?}", converted);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains(&converted.keypair_base58()));
    }

    #[test]
    fn test_decode_keypair_rejects_wrong_length() {
        let encoded = bs58::encode([1u8; 32]).into_string();
        let err = decode_keypair_base58(&encoded).unwrap_err();
        assert!(matches!(
            err,
            KeyConversionError::InvalidLength { actual: 32, .. }
        ));
        assert!(decode_keypair_base58("0OIl").is_err());
    }

    proptest! {
        #[test]
        fn prop_keypair_base58_round_trip(bytes in proptest::collection::vec(any::<u8>(), 64)) {
            let encoded = bs58::encode(&bytes).into_string();
            let decoded = decode_keypair_base58(&encoded).unwrap();
            prop_assert_eq!(decoded.as_slice(), bytes.as_slice());
            prop_assert_eq!(bs58::encode(decoded.as_slice()).into_string(), encoded);
        }
    }
}
