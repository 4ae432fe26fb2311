//! Platform credentials persisted in the OS keychain.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use stash_core::auth::{CredentialPersistence, Credentials};
use stash_core::{Error, Platform, Result};

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "stash-cli";

#[derive(Clone)]
pub struct KeyringCredentials {
    username: String,
}

impl KeyringCredentials {
    pub fn new(platform: Platform) -> Self {
        Self {
            username: format!("{platform}_credentials"),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> Result<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username)
            .map_err(|error| Error::Credentials(error.to_string()))
    }
}

impl CredentialPersistence for KeyringCredentials {
    #[cfg(not(test))]
    fn load(&self) -> Result<Option<Credentials>> {
        let entry = self.entry()?;
        match entry.get_password() {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(Error::Credentials(error.to_string())),
        }
    }

    #[cfg(test)]
    fn load(&self) -> Result<Option<Credentials>> {
        let guard = Self::test_store()
            .lock()
            .map_err(|error| Error::Credentials(error.to_string()))?;
        match guard.get(&self.username) {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    #[cfg(not(test))]
    fn save(&self, credentials: &Credentials) -> Result<()> {
        let raw = serde_json::to_string(credentials)?;
        self.entry()?
            .set_password(&raw)
            .map_err(|error| Error::Credentials(error.to_string()))
    }

    #[cfg(test)]
    fn save(&self, credentials: &Credentials) -> Result<()> {
        let raw = serde_json::to_string(credentials)?;
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| Error::Credentials(error.to_string()))?;
        guard.insert(self.username.clone(), raw);
        Ok(())
    }

    #[cfg(not(test))]
    fn clear(&self) -> Result<()> {
        let entry = self.entry()?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(Error::Credentials(error.to_string())),
        }
    }

    #[cfg(test)]
    fn clear(&self) -> Result<()> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| Error::Credentials(error.to_string()))?;
        guard.remove(&self.username);
        Ok(())
    }
}

/// Stored credentials for `platform`, if any
pub fn load_stored_credentials(platform: Platform) -> Result<Option<Credentials>> {
    KeyringCredentials::new(platform).load()
}
