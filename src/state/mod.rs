pub mod nonce;

pub use nonce::NonceSequencer;
