//! Bearer-token persistence.
//!
//! # Design
//! Exactly one token lives under a fixed account key. `SecretStore` is the
//! seam: the OS credential vault backs it in production and an in-memory
//! slot backs it in tests or when embedding without a vault.

use parking_lot::Mutex;

/// Account key the token is stored under.
pub const TOKEN_ACCOUNT: &str = "jwt_token";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("invalid token data")]
    InvalidData,

    #[error("failed to save token: {0}")]
    Save(String),

    #[error("failed to retrieve token: {0}")]
    Retrieve(String),

    #[error("failed to delete token: {0}")]
    Delete(String),

    #[error("credential vault unavailable: {0}")]
    Unavailable(String),
}

/// Single-slot secret storage for the session token.
pub trait SecretStore: Send + Sync {
    /// Replace the stored token, inserting it when the slot is empty.
    fn save(&self, token: &str) -> Result<(), CredentialError>;

    fn get(&self) -> Result<Option<String>, CredentialError>;

    /// Remove the token. Deleting an empty slot succeeds.
    fn delete(&self) -> Result<(), CredentialError>;

    /// Whether a token is stored; read errors count as "no".
    fn has(&self) -> bool {
        matches!(self.get(), Ok(Some(_)))
    }
}

/// In-process `SecretStore`.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    slot: Mutex<Option<String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            slot: Mutex::new(Some(token.to_string())),
        }
    }
}

impl SecretStore for MemorySecretStore {
    fn save(&self, token: &str) -> Result<(), CredentialError> {
        *self.slot.lock() = Some(token.to_string());
        Ok(())
    }

    fn get(&self) -> Result<Option<String>, CredentialError> {
        Ok(self.slot.lock().clone())
    }

    fn delete(&self) -> Result<(), CredentialError> {
        self.slot.lock().take();
        Ok(())
    }
}

/// `SecretStore` backed by the platform credential vault (Keychain,
/// Credential Manager, or the kernel keyring).
pub struct KeyringSecretStore {
    entry: keyring::Entry,
}

impl KeyringSecretStore {
    pub fn new(service: &str) -> Result<Self, CredentialError> {
        let entry = keyring::Entry::new(service, TOKEN_ACCOUNT)
            .map_err(|e| CredentialError::Unavailable(e.to_string()))?;
        Ok(Self { entry })
    }
}

impl SecretStore for KeyringSecretStore {
    fn save(&self, token: &str) -> Result<(), CredentialError> {
        // set_password overwrites an existing credential or creates one.
        self.entry
            .set_password(token)
            .map_err(|e| CredentialError::Save(e.to_string()))
    }

    fn get(&self) -> Result<Option<String>, CredentialError> {
        match self.entry.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(keyring::Error::BadEncoding(_)) => Err(CredentialError::InvalidData),
            Err(e) => Err(CredentialError::Retrieve(e.to_string())),
        }
    }

    fn delete(&self) -> Result<(), CredentialError> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(CredentialError::Delete(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_then_get_is_empty() {
        let store = MemorySecretStore::with_token("abc");
        store.delete().unwrap();
        assert_eq!(store.get().unwrap(), None);

        // Deleting an empty slot is not an error.
        store.delete().unwrap();
        assert_eq!(store.get().unwrap(), None);
        assert!(!store.has());
    }

    #[test]
    fn last_save_wins() {
        let store = MemorySecretStore::new();
        store.save("t1").unwrap();
        store.save("t2").unwrap();
        assert_eq!(store.get().unwrap().as_deref(), Some("t2"));
        assert!(store.has());
    }

    struct BrokenStore;

    impl SecretStore for BrokenStore {
        fn save(&self, _: &str) -> Result<(), CredentialError> {
            Err(CredentialError::Save("locked".into()))
        }
        fn get(&self) -> Result<Option<String>, CredentialError> {
            Err(CredentialError::Retrieve("locked".into()))
        }
        fn delete(&self) -> Result<(), CredentialError> {
            Err(CredentialError::Delete("locked".into()))
        }
    }

    #[test]
    fn has_swallows_read_errors() {
        assert!(!BrokenStore.has());
    }

    #[test]
    fn empty_token_is_stored() {
        let store = MemorySecretStore::new();
        store.save("").unwrap();
        assert_eq!(store.get().unwrap().as_deref(), Some(""));
    }

    mod keyring_backend {
        use keyring::mock::MockCredential;

        use super::super::*;

        fn store() -> KeyringSecretStore {
            keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
            KeyringSecretStore::new("com.example.pokecollect.test").unwrap()
        }

        fn fail_next(store: &KeyringSecretStore, err: keyring::Error) {
            let mock: &MockCredential = store.entry.get_credential().downcast_ref().unwrap();
            mock.set_error(err);
        }

        fn platform_failure() -> keyring::Error {
            keyring::Error::PlatformFailure(Box::new(std::io::Error::other("vault locked")))
        }

        #[test]
        fn missing_entry_reads_as_none() {
            let store = store();
            assert_eq!(store.get().unwrap(), None);
            assert!(!store.has());
        }

        #[test]
        fn delete_is_idempotent() {
            let store = store();
            store.delete().unwrap();

            store.save("t1").unwrap();
            store.save("t2").unwrap();
            assert_eq!(store.get().unwrap().as_deref(), Some("t2"));

            store.delete().unwrap();
            assert_eq!(store.get().unwrap(), None);
            store.delete().unwrap();
        }

        #[test]
        fn empty_token_is_stored() {
            let store = store();
            store.save("").unwrap();
            assert_eq!(store.get().unwrap().as_deref(), Some(""));
        }

        #[test]
        fn read_failure_is_retrieve_error() {
            let store = store();
            fail_next(&store, platform_failure());
            assert!(matches!(store.get(), Err(CredentialError::Retrieve(_))));

            fail_next(&store, platform_failure());
            assert!(!store.has());
        }

        #[test]
        fn undecodable_token_is_invalid_data() {
            let store = store();
            fail_next(&store, keyring::Error::BadEncoding(vec![0xff, 0xfe]));
            assert_eq!(store.get(), Err(CredentialError::InvalidData));
        }

        #[test]
        fn write_failures_are_mapped() {
            let store = store();
            fail_next(&store, platform_failure());
            assert!(matches!(store.save("t"), Err(CredentialError::Save(_))));

            store.save("t").unwrap();
            fail_next(&store, platform_failure());
            assert!(matches!(store.delete(), Err(CredentialError::Delete(_))));
            assert_eq!(store.get().unwrap().as_deref(), Some("t"));
        }
    }
}
