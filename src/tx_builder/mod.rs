//! Cast transaction builder
//!
//! Casts are not built from scratch. A complete transaction captured from the
//! game client serves as a template, and each attempt patches the handful of
//! bytes that change between casts.
//!
//! ## Modules
//! - **errors**: structural error taxonomy
//! - **layout**: versioned byte offsets of the patched instructions
//! - **template**: decoding and validating the captured transaction
//! - **assembler**: blockhash, capability and slot/nonce patching
//! - **output**: partial signing and wire serialization
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use castbot::tx_builder::{assemble, Capability, TxTemplate};
//! # fn example(template_b64: &str, wallet: &castbot::wallet::WalletManager)
//! #     -> Result<(), castbot::tx_builder::TransactionBuilderError> {
//! let template = TxTemplate::from_base64(template_b64)?;
//! let capability = Capability { message: vec![1, 2, 3], signature: [0u8; 64] };
//! let mut output = assemble(&template, Default::default(), &capability, 42, 7)?;
//! output.sign(wallet)?;
//! let wire = output.to_base64()?;
//! # let _ = wire;
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub use errors::TransactionBuilderError;

pub mod layout;

mod assembler;
mod output;
mod template;

pub use assembler::{assemble, patch_cast_data, patch_verify_data, Capability};
pub use output::TxBuildOutput;
pub use template::TxTemplate;
