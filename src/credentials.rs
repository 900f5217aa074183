//! File-backed account credentials.
//!
//! Accounts are loaded once at startup from a JSON file and written back on
//! registration. Passwords are kept as hex SHA-256 digests; at most one
//! account carries the master flag.

use crate::error::{Result, TallyError};
use crate::types::fold_diacritic;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One stored account.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Credential {
    pub name: String,
    pub password_digest: String,
    #[serde(default)]
    pub is_master: bool,
}

/// Hex SHA-256 digest of a password.
pub fn digest_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Canonical form of an account name: diacritics folded, lowercased,
/// whitespace removed.
fn canonical(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| fold_diacritic(c).to_ascii_lowercase())
        .collect()
}

/// Whether two account names refer to the same account.
///
/// Names match in canonical form, or in canonical form with every `h`
/// deleted. The latter is a narrow legacy alias for one historical account
/// spelled both with and without its `h`, not fuzzy matching.
pub(crate) fn names_match(a: &str, b: &str) -> bool {
    let ca = canonical(a);
    let cb = canonical(b);
    if ca == cb {
        return true;
    }

    let strip_h = |s: &str| s.chars().filter(|&c| c != 'h').collect::<String>();
    strip_h(&ca) == strip_h(&cb)
}

/// Account store, loaded at startup and written through on registration.
pub struct CredentialStore {
    /// Credential file path; `None` keeps the store memory-only.
    path: Option<PathBuf>,

    accounts: RwLock<Vec<Credential>>,
}

impl CredentialStore {
    /// Create an empty, memory-only store.
    pub fn new() -> Self {
        Self {
            path: None,
            accounts: RwLock::new(Vec::new()),
        }
    }

    /// Load accounts from a JSON file.
    ///
    /// A missing file is not an error: the store starts empty and the file
    /// appears on first registration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let accounts = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw)
                .map_err(|e| TallyError::Deserialization(e.to_string()))?
        } else {
            warn!(path = %path.display(), "credential file missing, starting empty");
            Vec::new()
        };

        Ok(Self {
            path: Some(path),
            accounts: RwLock::new(accounts),
        })
    }

    /// Register a new account and persist the store.
    ///
    /// Fails with `DuplicateName` when the name aliases an existing account
    /// or when a second master is registered.
    pub fn register(&self, name: &str, password: &str, is_master: bool) -> Result<Credential> {
        let mut accounts = self.accounts.write();

        if accounts.iter().any(|a| names_match(&a.name, name)) {
            return Err(TallyError::DuplicateName(name.to_string()));
        }
        if is_master && accounts.iter().any(|a| a.is_master) {
            return Err(TallyError::DuplicateName(name.to_string()));
        }

        let credential = Credential {
            name: name.to_string(),
            password_digest: digest_password(password),
            is_master,
        };
        accounts.push(credential.clone());

        self.save(&accounts)?;
        Ok(credential)
    }

    /// Check a name/password pair against the stored accounts.
    pub fn verify(&self, name: &str, password: &str) -> Option<Credential> {
        let digest = digest_password(password);
        self.accounts
            .read()
            .iter()
            .find(|a| names_match(&a.name, name) && a.password_digest == digest)
            .cloned()
    }

    /// Whether `name` is the master account (case-insensitive).
    pub fn is_master(&self, name: &str) -> bool {
        self.accounts
            .read()
            .iter()
            .any(|a| a.is_master && a.name.eq_ignore_ascii_case(name))
    }

    /// Name of the master account, if one is registered.
    pub fn master_name(&self) -> Option<String> {
        self.accounts
            .read()
            .iter()
            .find(|a| a.is_master)
            .map(|a| a.name.clone())
    }

    /// Number of registered accounts.
    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }

    /// Write the account list back to the credential file.
    fn save(&self, accounts: &[Credential]) -> Result<()> {
        let path = match &self.path {
            Some(path) => path,
            None => return Ok(()),
        };

        let encoded = serde_json::to_string_pretty(accounts)?;
        fs::write(path, encoded)?;
        Ok(())
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}
