//! Named key pairs plus the designated privileged (sudo) pair.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::crypto::Keypair;
use crate::utils::{LoadError, Result};

pub const DEFAULT_SUDO_SEED: &str = "//Alice";

pub struct Keyring {
    names: RwLock<HashMap<String, Keypair>>,
    sudo_key: Option<Keypair>,
}

impl Keyring {
    pub fn new(sudo_seed: Option<&str>) -> Result<Self> {
        let keyring = Self { names: RwLock::new(HashMap::new()), sudo_key: None };
        match sudo_seed {
            Some(seed) => {
                let pair = keyring.add_from_seed(seed, "sudo")?;
                Ok(Self { sudo_key: Some(pair), ..keyring })
            }
            None => Ok(keyring),
        }
    }

    pub fn pair_by_name(&self, name: &str) -> Option<Keypair> {
        self.names.read().get(name).cloned()
    }

    /// Fresh random pair registered under `name`, replacing any older one.
    pub fn create_pair(&self, name: &str) -> Result<Keypair> {
        let pair = Keypair::generate()?;
        self.names.write().insert(name.to_string(), pair.clone());
        Ok(pair)
    }

    pub fn add_from_seed(&self, seed: &str, name: &str) -> Result<Keypair> {
        let pair = Keypair::from_seed(seed)?;
        self.names.write().insert(name.to_string(), pair.clone());
        Ok(pair)
    }

    pub fn sudo(&self) -> Result<&Keypair> {
        self.sudo_key.as_ref().ok_or(LoadError::MissingSudoKey)
    }

    pub fn len(&self) -> usize {
        self.names.read().len()
    }
}
