//! Crypto module: key management and signing.
//!
//! - Keys: ed25519 generation and deterministic dev seeds
//! - Sign: transaction signatures and verification
//! - Keyring: named pairs and the privileged sudo pair

pub mod keys;
pub mod sign;
pub mod keyring;

pub use keys::Keypair;
pub use sign::{sign_transaction, verify_transaction, Signature, Signer, Verifier};
pub use keyring::{Keyring, DEFAULT_SUDO_SEED};
