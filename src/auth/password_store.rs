use anyhow::{Result, anyhow};
use keyring::{Entry, Error as KeyringError};
use log::warn;

const SERVICE: &str = "mailstats";
pub const PASSWORD_ENV: &str = "MAILSTATS_PASSWORD";

/// Save the IMAP password into the OS keyring for the given user
pub fn save_password(user: &str, password: &str) -> Result<()> {
    let entry = Entry::new(SERVICE, user);
    entry?
        .set_password(password)
        .map_err(|e| anyhow!(e.to_string()))?;
    Ok(())
}

/// Load the IMAP password from the keyring for the given user
pub fn load_password(user: &str) -> Result<Option<String>> {
    let entry = Entry::new(SERVICE, user);
    match entry?.get_password() {
        Ok(v) => Ok(Some(v)),
        Err(KeyringError::NoEntry) => Ok(None),
        Err(e) => Err(anyhow!(e.to_string())),
    }
}

/// Keyring first, then the environment.
pub fn resolve_password(user: &str) -> Result<String> {
    let stored = load_password(user).unwrap_or_else(|e| {
        warn!("keyring unavailable: {e}");
        None
    });
    stored
        .or_else(|| std::env::var(PASSWORD_ENV).ok())
        .ok_or_else(|| {
            anyhow!("no password for {user}: run `mailstats set-password` or set {PASSWORD_ENV}")
        })
}
