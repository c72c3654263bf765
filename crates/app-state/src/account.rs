//! Local accounts and the current session
//!
//! Accounts are device-local records: the registered-users table lives in the
//! key-value store under [`USERS_KEY`] and a copy of the signed-in user under
//! [`SESSION_KEY`], both as JSON. There is no server.
//!
//! # Example
//!
//! ```rust,no_run
//! use app_state::account::AccountStore;
//! use app_state::password::HashingConfig;
//! use storage::MemoryKvStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let accounts = AccountStore::new(Arc::new(MemoryKvStore::new()), HashingConfig::default())?;
//!
//! accounts.register("Alice", "Alice@Test.com", "secret1", None).await?;
//! assert_eq!(accounts.current_user().unwrap().email, "alice@test.com");
//!
//! accounts.logout().await;
//! assert!(accounts.current_user().is_none());
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{get_json, set_json, KeyValueStore, KvError};
use thiserror::Error;
use tokio::sync::{watch, Mutex};

use crate::password::{CredentialHasher, HashingConfig};
use crate::session::SessionState;
use crate::validation;

/// Key of the registered-users table
pub const USERS_KEY: &str = "auth:users";

/// Key of the persisted current session
pub const SESSION_KEY: &str = "auth:session";

/// Value written over the session record when it cannot be removed
const SIGNED_OUT: &str = "null";

/// Authentication errors
///
/// The `Display` text of every variant is meant to be shown to the user as is.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required field was left empty
    #[error("All fields are required")]
    MissingFields,

    /// Email does not look like `local@domain.tld`
    #[error("Enter a valid email address")]
    InvalidEmail,

    /// Password is too short
    #[error("Password must be at least {} characters", validation::MIN_PASSWORD_LEN)]
    WeakPassword,

    /// Another account already uses this email
    #[error("An account with this email already exists")]
    EmailTaken,

    /// Nobody has registered on this device yet
    #[error("No account found. Please create an account first")]
    NoAccounts,

    /// Email and password do not match a registered account
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Durable storage failed
    #[error("Something went wrong. Please try again")]
    Storage(#[source] KvError),

    /// Password hashing failed
    #[error("Something went wrong. Please try again")]
    Hashing(String),
}

impl AuthError {
    /// Check if the error came from user input rather than the device
    pub fn is_validation(&self) -> bool {
        !matches!(self, AuthError::Storage(_) | AuthError::Hashing(_))
    }
}

/// Result type for account operations
pub type Result<T> = std::result::Result<T, AuthError>;

/// A locally registered user
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Display name
    pub name: String,
    /// Normalized (trimmed, lower-case) email, unique per device
    pub email: String,
    /// Argon2id PHC string
    pub password_hash: String,
    /// URI of a locally picked avatar image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("avatar", &self.avatar)
            .finish_non_exhaustive()
    }
}

/// Account store
///
/// Owns the registered-users table and the session pointer. Every durable
/// mutation runs under a single writer lock, so two concurrent registrations
/// with the same email cannot both pass the uniqueness check. Password hashing
/// runs on the blocking pool so the lock holder never stalls the runtime.
pub struct AccountStore {
    kv: Arc<dyn KeyValueStore>,
    hasher: CredentialHasher,
    writer: Mutex<()>,
    session_tx: watch::Sender<SessionState>,
}

impl AccountStore {
    /// Create an account store over a key-value backend
    ///
    /// The store starts anonymous; call [`AccountStore::load_session`] to
    /// restore a persisted session.
    pub fn new(kv: Arc<dyn KeyValueStore>, hashing: HashingConfig) -> Result<Self> {
        let (session_tx, _) = watch::channel(SessionState::Anonymous);

        Ok(Self {
            kv,
            hasher: CredentialHasher::new(hashing)?,
            writer: Mutex::new(()),
            session_tx,
        })
    }

    /// Register a new account and sign it in
    ///
    /// # Errors
    ///
    /// - `AuthError::MissingFields`, `InvalidEmail`, `WeakPassword` - bad input
    /// - `AuthError::EmailTaken` - the normalized email is already registered
    /// - `AuthError::Storage` - the device store failed; the session is unchanged
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        avatar: Option<&str>,
    ) -> Result<User> {
        let input = validation::validate_registration(name, email, password)?;

        let _guard = self.writer.lock().await;

        let mut users = self.read_users().await?.unwrap_or_default();
        if users.iter().any(|user| user.email == input.email) {
            tracing::debug!(email = %input.email, "registration rejected: email taken");
            return Err(AuthError::EmailTaken);
        }

        let user = User {
            name: input.name,
            email: input.email,
            password_hash: self.hash_password(input.password).await?,
            avatar: avatar
                .map(str::trim)
                .filter(|uri| !uri.is_empty())
                .map(str::to_string),
        };
        users.push(user.clone());

        set_json(self.kv.as_ref(), USERS_KEY, &users)
            .await
            .map_err(|e| storage_failure("save registered users", e))?;
        self.persist_session(&user).await?;

        self.session_tx
            .send_replace(SessionState::Authenticated(user.clone()));
        tracing::info!(email = %user.email, "registered account");

        Ok(user)
    }

    /// Sign in with an email and password
    ///
    /// Email case is ignored; password case is not.
    ///
    /// # Errors
    ///
    /// - `AuthError::MissingFields`, `InvalidEmail`, `WeakPassword` - bad input
    /// - `AuthError::NoAccounts` - nobody has registered yet
    /// - `AuthError::InvalidCredentials` - no matching account
    /// - `AuthError::Storage` - the device store failed; the session is unchanged
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let credentials = validation::validate_login(email, password)?;

        let _guard = self.writer.lock().await;

        let users = self.read_users().await?.ok_or(AuthError::NoAccounts)?;
        let candidate = users
            .into_iter()
            .find(|user| user.email == credentials.email);

        let matched = match &candidate {
            Some(user) => {
                self.verify_password(credentials.password.clone(), user.password_hash.clone())
                    .await
            }
            None => false,
        };

        let user = match candidate {
            Some(user) if matched => user,
            _ => {
                tracing::debug!(email = %credentials.email, "login rejected");
                return Err(AuthError::InvalidCredentials);
            }
        };

        self.persist_session(&user).await?;

        self.session_tx
            .send_replace(SessionState::Authenticated(user.clone()));
        tracing::info!(email = %user.email, "logged in");

        Ok(user)
    }

    /// Sign out
    ///
    /// The in-memory session is always cleared. If the durable record cannot
    /// be removed it is overwritten with a signed-out marker; if that fails
    /// too, the error is logged.
    pub async fn logout(&self) {
        let _guard = self.writer.lock().await;

        if let Err(e) = self.kv.remove(SESSION_KEY).await {
            tracing::warn!("Failed to remove persisted session, overwriting: {}", e);
            if let Err(e) = self.kv.set(SESSION_KEY, SIGNED_OUT).await {
                tracing::error!("Failed to clear persisted session: {}", e);
            }
        }

        let previous = self.session_tx.send_replace(SessionState::Anonymous);
        if let Some(email) = previous.email() {
            tracing::info!(email = %email, "logged out");
        }
    }

    /// Restore the persisted session, if any
    ///
    /// Missing, unreadable or corrupt data means "no session" and never fails.
    /// Returns the restored user.
    pub async fn load_session(&self) -> Option<User> {
        let restored = match get_json::<Option<User>, _>(self.kv.as_ref(), SESSION_KEY).await {
            Ok(user) => user.flatten(),
            Err(KvError::Serialization(e)) => {
                tracing::warn!("Discarding corrupt persisted session: {}", e);
                None
            }
            Err(e) => {
                tracing::error!("Failed to read persisted session: {}", e);
                None
            }
        };

        if let Some(user) = &restored {
            tracing::info!(email = %user.email, "restored session");
            self.session_tx
                .send_replace(SessionState::Authenticated(user.clone()));
        }

        restored
    }

    /// The signed-in user
    pub fn current_user(&self) -> Option<User> {
        self.session_tx.borrow().user().cloned()
    }

    /// Snapshot of the session state
    pub fn session(&self) -> SessionState {
        self.session_tx.borrow().clone()
    }

    /// Check if a user is signed in
    pub fn is_authenticated(&self) -> bool {
        self.session_tx.borrow().is_authenticated()
    }

    /// Subscribe to session changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.session_tx.subscribe()
    }

    /// Read the registered-users table
    ///
    /// `Ok(None)` means nobody has registered yet. A corrupt table is reported
    /// as a storage failure so it is never overwritten.
    async fn read_users(&self) -> Result<Option<Vec<User>>> {
        get_json(self.kv.as_ref(), USERS_KEY)
            .await
            .map_err(|e| storage_failure("read registered users", e))
    }

    async fn hash_password(&self, password: String) -> Result<String> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }

    async fn verify_password(&self, password: String, stored: String) -> bool {
        let hasher = self.hasher.clone();
        match tokio::task::spawn_blocking(move || hasher.verify(&password, &stored)).await {
            Ok(matched) => matched,
            Err(e) => {
                tracing::error!("Password verification task failed: {}", e);
                false
            }
        }
    }

    async fn persist_session(&self, user: &User) -> Result<()> {
        set_json(self.kv.as_ref(), SESSION_KEY, user)
            .await
            .map_err(|e| storage_failure("save session", e))
    }
}

fn storage_failure(action: &str, error: KvError) -> AuthError {
    tracing::error!("Failed to {}: {}", action, error);
    AuthError::Storage(error)
}
