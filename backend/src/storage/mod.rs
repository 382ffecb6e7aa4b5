//! Local persistence for minted coins.
//!
//! A [`StorageBackend`] is a small string key-value store. On top of it:
//!
//! - [`TokenRepository`] keeps every wallet's [`UserData`] under one fixed key
//! - [`SessionStore`] remembers the active wallet address
//!
//! Writes are last-write-wins per key. [`MemoryBackend`] serves tests and
//! throwaway sessions, [`FileBackend`] persists one JSON file per key.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{StorageError, StorageResult};
use crate::models::{same_address, TokenData, UserData};

/// Key holding the list of all users and their coins.
pub const USERS_DATA_KEY: &str = "artify_users_data";

/// Key holding the active wallet address.
pub const SESSION_USER_KEY: &str = "artify_session_user";

// =============================================================================
// Backends
// =============================================================================

/// String key-value storage.
pub trait StorageBackend: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// In-memory backend.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file))
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    /// Written to a sibling temp file, then renamed over the target.
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        fs::create_dir_all(&self.dir)?;
        let mut staged = NamedTempFile::new_in(&self.dir)?;
        staged.write_all(value.as_bytes())?;
        staged.as_file().sync_all()?;
        staged.persist(self.path_for(key)).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

// =============================================================================
// Token Repository
// =============================================================================

/// Wallet address to minted coins.
pub struct TokenRepository<B: StorageBackend + ?Sized> {
    backend: Arc<B>,
}

impl<B: StorageBackend + ?Sized> Clone for TokenRepository<B> {
    fn clone(&self) -> Self {
        Self { backend: Arc::clone(&self.backend) }
    }
}

impl<B: StorageBackend + ?Sized> TokenRepository<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Every stored user. A corrupt payload reads as empty.
    pub fn all_users(&self) -> StorageResult<Vec<UserData>> {
        let Some(raw) = self.backend.get(USERS_DATA_KEY)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<UserData>>(&raw) {
            Ok(users) => Ok(users),
            Err(e) => {
                warn!(error = %e, "discarding unreadable users data");
                Ok(Vec::new())
            }
        }
    }

    /// Replace the whole user list.
    pub fn save_all_users(&self, users: &[UserData]) -> StorageResult<()> {
        let raw = serde_json::to_string(users)?;
        self.backend.set(USERS_DATA_KEY, &raw)?;
        debug!(users = users.len(), "saved users data");
        Ok(())
    }

    pub fn user(&self, wallet_address: &str) -> StorageResult<Option<UserData>> {
        Ok(self
            .all_users()?
            .into_iter()
            .find(|u| same_address(&u.wallet_address, wallet_address)))
    }

    /// Insert or replace the record for `user.wallet_address`.
    pub fn save_user(&self, mut user: UserData) -> StorageResult<()> {
        let mut users = self.all_users()?;
        user.last_updated = now();

        match users
            .iter_mut()
            .find(|u| same_address(&u.wallet_address, &user.wallet_address))
        {
            Some(existing) => {
                debug!(wallet = %user.wallet_address, "updating user");
                *existing = user;
            }
            None => {
                debug!(wallet = %user.wallet_address, "adding user");
                users.push(user);
            }
        }

        self.save_all_users(&users)
    }

    /// Record a coin for a wallet. Returns `false` if the contract address
    /// was already recorded for that wallet.
    pub fn add_user_token(&self, wallet_address: &str, token: TokenData) -> StorageResult<bool> {
        match self.user(wallet_address)? {
            Some(mut user) => {
                if user.has_token(&token.contract_address) {
                    debug!(wallet = %wallet_address, token = %token.contract_address, "token already recorded");
                    return Ok(false);
                }
                user.tokens.push(token);
                self.save_user(user)?;
            }
            None => {
                self.save_user(UserData {
                    wallet_address: wallet_address.to_string(),
                    tokens: vec![token],
                    last_updated: now(),
                })?;
            }
        }
        Ok(true)
    }

    /// Coins of every user, in insertion order.
    pub fn all_tokens(&self) -> StorageResult<Vec<TokenData>> {
        Ok(self
            .all_users()?
            .into_iter()
            .flat_map(|u| u.tokens)
            .collect())
    }

    pub fn tokens_by_creator(&self, creator_address: &str) -> StorageResult<Vec<TokenData>> {
        Ok(self
            .user(creator_address)?
            .map(|u| u.tokens)
            .unwrap_or_default())
    }

    /// Drop all users and the session.
    pub fn clear_all(&self) -> StorageResult<()> {
        self.backend.remove(USERS_DATA_KEY)?;
        self.backend.remove(SESSION_USER_KEY)
    }
}

// =============================================================================
// Session
// =============================================================================

/// Active wallet address.
pub struct SessionStore<B: StorageBackend + ?Sized> {
    backend: Arc<B>,
}

impl<B: StorageBackend + ?Sized> SessionStore<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub fn set_session_user(&self, wallet_address: &str) -> StorageResult<()> {
        self.backend.set(SESSION_USER_KEY, wallet_address)
    }

    pub fn session_user(&self) -> StorageResult<Option<String>> {
        Ok(self
            .backend
            .get(SESSION_USER_KEY)?
            .filter(|s| !s.trim().is_empty()))
    }

    pub fn clear_session_user(&self) -> StorageResult<()> {
        self.backend.remove(SESSION_USER_KEY)
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
