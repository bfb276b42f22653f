use anyhow::{Context, Result};
use keyring::Entry;
use tracing::debug;

const SERVICE_NAME: &str = "postworx";

/// Password storage in the OS keychain, keyed by username.
pub struct CredentialStore;

impl CredentialStore {
    pub fn store(username: &str, password: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, username)
            .context("Failed to create keyring entry")?;
        entry
            .set_password(password)
            .context("Failed to store password in keychain")?;
        Ok(())
    }

    /// Stored password for `username`, or `None` if there is none.
    pub fn get_password(username: &str) -> Result<Option<String>> {
        let entry = Entry::new(SERVICE_NAME, username)
            .context("Failed to create keyring entry")?;
        match entry.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => {
                debug!(username, "No stored password");
                Ok(None)
            }
            Err(e) => Err(e).context("Failed to retrieve password from keychain"),
        }
    }

    /// Delete the stored password. Returns false if there was none.
    pub fn delete(username: &str) -> Result<bool> {
        let entry = Entry::new(SERVICE_NAME, username)
            .context("Failed to create keyring entry")?;
        match entry.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(e).context("Failed to delete credential from keychain"),
        }
    }
}
