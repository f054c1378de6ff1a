//! The account store boundary and the in-memory dev implementation.

use std::collections::HashMap;

use mangrove_protocol::{PlayerProfile, TreeRecord};
use rand::Rng;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::AccountError;

/// Mango balance granted to every new account.
const STARTING_MANGOES: i64 = 10;

/// A persisted player account.
///
/// Owned by the account store; the presence core only ever reads it.
/// `password_hash` is an opaque verifier in whatever format the store
/// that created the account uses — nothing outside that store may
/// interpret it, and it must never cross the wire (see
/// [`PlayerAccount::profile`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerAccount {
    pub username: String,
    pub password_hash: String,
    pub trees: Vec<TreeRecord>,
    pub mangoes: i64,
}

impl PlayerAccount {
    /// The client-safe view of this account: everything except the
    /// credential verifier.
    pub fn profile(&self) -> PlayerProfile {
        PlayerProfile {
            username: self.username.clone(),
            trees: self.trees.clone(),
            mangoes: self.mangoes,
        }
    }
}

/// Looks up and provisions player accounts.
///
/// This is the seam to the outside world: the server is generic over
/// it, so production backs it with a real database while tests and the
/// dev server use [`MemoryAccountStore`].
///
/// `Send + Sync + 'static` because one store instance is shared by
/// every connection task for the lifetime of the server. The async
/// methods return explicitly `Send` futures for the same reason —
/// connection handlers calling them are spawned onto the multithreaded
/// runtime. Implementations can still use plain `async fn`.
pub trait AccountStore: Send + Sync + 'static {
    /// Looks up an account by username.
    ///
    /// `Ok(None)` means the account does not exist — a normal outcome,
    /// distinct from the store itself failing.
    fn find(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<Option<PlayerAccount>, AccountError>> + Send;

    /// Creates a fresh account with the given credentials, hashing the
    /// password however this store does.
    ///
    /// # Errors
    /// - [`AccountError::DuplicateUsername`] if the username is taken.
    /// - [`AccountError::Unavailable`] on store failure.
    fn create(
        &self,
        username: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<(), AccountError>> + Send;

    /// Verifies a plaintext password against the account's stored
    /// verifier. Pure computation — the account was already fetched.
    fn verify(&self, account: &PlayerAccount, password: &str) -> bool;
}

// ---------------------------------------------------------------------------
// MemoryAccountStore
// ---------------------------------------------------------------------------

/// An in-process [`AccountStore`] keyed by username.
///
/// Used by the dev server and the test suites. The verifier is a
/// salted SHA-256 digest (`"<salt-hex>:<digest-hex>"`, 16 random salt
/// bytes per account) — fine for throwaway dev accounts, not a
/// substitute for a real KDF in production stores.
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<String, PlayerAccount>>,
}

impl MemoryAccountStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully formed account, replacing any existing one with
    /// the same username. Seeding hook for the dev server and tests;
    /// [`create`](AccountStore::create) is the normal provisioning path.
    pub async fn insert(&self, account: PlayerAccount) {
        self.accounts
            .write()
            .await
            .insert(account.username.clone(), account);
    }
}

impl AccountStore for MemoryAccountStore {
    async fn find(
        &self,
        username: &str,
    ) -> Result<Option<PlayerAccount>, AccountError> {
        Ok(self.accounts.read().await.get(username).cloned())
    }

    async fn create(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(), AccountError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(username) {
            return Err(AccountError::DuplicateUsername(username.to_string()));
        }

        let salt = generate_salt();
        let account = PlayerAccount {
            username: username.to_string(),
            password_hash: format!("{salt}:{}", digest(&salt, password)),
            trees: Vec::new(),
            mangoes: STARTING_MANGOES,
        };
        accounts.insert(username.to_string(), account);

        tracing::info!(username, "account created");
        Ok(())
    }

    fn verify(&self, account: &PlayerAccount, password: &str) -> bool {
        let Some((salt, stored)) = account.password_hash.split_once(':') else {
            return false;
        };
        digest(salt, password) == stored
    }
}

/// Generates a random 32-character hex salt (128 bits of entropy).
fn generate_salt() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    hex::encode(bytes)
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

// =========================================================================
// Tests
// =========================================================================
