use ed25519_dalek::{
    PublicKey as DalekPublic, Signature as DalekSig, Signer as DalekSigner,
    Verifier as DalekVerifier,
};

use crate::chain::types::{AccountId, Balance, Call, Nonce, SignedTransaction};
use crate::crypto::Keypair;
use crate::utils::{LoadError, Result};

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

/// Trait for signing
pub trait Signer {
    fn sign(&self, msg: &[u8]) -> Signature;
}

/// Trait for verifying
pub trait Verifier {
    fn verify(&self, msg: &[u8], sig: &Signature) -> Result<()>;
}

impl Signer for Keypair {
    fn sign(&self, msg: &[u8]) -> Signature {
        let sig = self.keypair.sign(msg);
        Signature(sig.to_bytes())
    }
}

impl Verifier for AccountId {
    fn verify(&self, msg: &[u8], sig: &Signature) -> Result<()> {
        let pk = DalekPublic::from_bytes(&self.0).map_err(|e| LoadError::Key(e.to_string()))?;
        let ds = DalekSig::try_from(&sig.0[..]).map_err(|e| LoadError::Key(e.to_string()))?;
        pk.verify(msg, &ds)
            .map_err(|_| LoadError::Key("signature verification failed".into()))
    }
}

/// Build and sign a transaction for `signer`.
pub fn sign_transaction(
    signer: &Keypair,
    nonce: Nonce,
    tip: Balance,
    call: Call,
) -> Result<SignedTransaction> {
    let who = signer.account_id();
    let payload = SignedTransaction::signing_payload(&who, nonce, tip, &call)
        .map_err(|e| LoadError::Chain(format!("encode call: {}", e)))?;
    let Signature(signature) = signer.sign(&payload);
    Ok(SignedTransaction { signer: who, nonce, tip, call, signature })
}

/// Check a transaction's signature against its signer.
pub fn verify_transaction(tx: &SignedTransaction) -> Result<()> {
    let payload = tx.payload().map_err(|e| LoadError::Chain(format!("encode call: {}", e)))?;
    tx.signer.verify(&payload, &Signature(tx.signature))
}
