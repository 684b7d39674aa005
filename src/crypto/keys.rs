use ed25519_dalek::{Keypair as DalekKeypair, PublicKey as DalekPublic, SecretKey};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

use crate::chain::types::AccountId;
use crate::utils::{LoadError, Result};

#[derive(Clone)]
pub struct Keypair {
    pub keypair: Arc<DalekKeypair>,
}

impl Keypair {
    /// Generate a new random keypair
    pub fn generate() -> Result<Self> {
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        Self::from_bytes(&secret)
    }

    /// Deterministic dev key derived from a seed phrase such as `//Alice`.
    pub fn from_seed(seed: &str) -> Result<Self> {
        let digest = Sha256::digest(seed.as_bytes());
        Self::from_bytes(digest.as_slice())
    }

    /// Construct from raw bytes
    pub fn from_bytes(secret: &[u8]) -> Result<Self> {
        let sk = SecretKey::from_bytes(secret).map_err(|e| LoadError::Key(e.to_string()))?;
        let pk = DalekPublic::from(&sk);
        let kp = DalekKeypair { secret: sk, public: pk };
        Ok(Self { keypair: Arc::new(kp) })
    }

    pub fn account_id(&self) -> AccountId {
        AccountId(self.keypair.public.to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Keypair").field(&self.account_id()).finish()
    }
}

impl PartialEq for Keypair {
    fn eq(&self, other: &Self) -> bool {
        self.account_id() == other.account_id()
    }
}

impl Eq for Keypair {}
