pub mod submitter;

pub use submitter::{SignOptions, TransactionSubmitter, TxOutcome};
