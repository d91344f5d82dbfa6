//! Gates usage of an application by user identity.
//!
//! The access list holds a [`Mode`] and an ordered set of user ids. In
//! blacklist mode listed users are denied and everyone else is allowed; in
//! whitelist mode only listed users are allowed. Switching modes never touches
//! the member set, so toggling back and forth is lossless.
//!
//! Every operation is a complete read-modify-write transaction against a
//! single record in a [`Store`], serialized through one lock shared by all
//! clones of an [`AccessList`].
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod mode;
mod state;

pub use error::{Error, Result};
pub use mode::Mode;
pub use state::{AccessListState, UserId};

use std::sync::Arc;

use async_trait::async_trait;
use gatekeeper_store::Store;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// Key the access list record is stored under unless overridden.
pub const DEFAULT_KEY: &str = "allowed_users.json";

/// Options for creating a new `AccessList`
pub struct AccessListOptions<S>
where
    S: Store,
{
    /// The store holding the persisted record.
    pub store: S,

    /// The key of the record within the store.
    pub key: String,
}

impl<S> AccessListOptions<S>
where
    S: Store,
{
    /// Options using [`DEFAULT_KEY`].
    pub fn new(store: S) -> Self {
        Self {
            store,
            key: DEFAULT_KEY.to_string(),
        }
    }

    /// Overrides the record key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }
}

/// Trait for managing user access.
#[async_trait]
pub trait AccessListManagement
where
    Self: Clone + Send + Sync + 'static,
{
    /// Store type.
    type Store: Store;

    /// Creates a new instance of the access list.
    fn new(options: AccessListOptions<Self::Store>) -> Self;

    /// Whether a user may use the system under the current mode.
    async fn is_allowed(&self, user_id: UserId) -> Result<bool>;

    /// Like [`is_allowed`](Self::is_allowed), but any failure denies access.
    async fn is_allowed_or_deny(&self, user_id: UserId) -> bool {
        match self.is_allowed(user_id).await {
            Ok(allowed) => allowed,
            Err(e) => {
                error!(user_id, error = %e, "access check failed, denying");
                false
            }
        }
    }

    /// Adds a user. Returns `false` if they were already listed.
    async fn add_user(&self, user_id: UserId) -> Result<bool>;

    /// Removes a user. Returns `false` if they were not listed.
    async fn remove_user(&self, user_id: UserId) -> Result<bool>;

    /// All listed users in insertion order.
    async fn list_users(&self) -> Result<Vec<UserId>>;

    /// Removes every listed user and returns how many there were.
    async fn clear_users(&self) -> Result<usize>;

    /// Current mode.
    async fn get_mode(&self) -> Result<Mode>;

    /// Sets the mode. Membership is left untouched.
    async fn set_mode(&self, mode: Mode) -> Result<()>;

    /// Flips the mode, returning `(previous, current)`.
    async fn toggle_mode(&self) -> Result<(Mode, Mode)>;

    /// Mode and members read in a single transaction.
    async fn snapshot(&self) -> Result<AccessListState>;
}

/// Access list persisted in a [`Store`].
///
/// Cloning is cheap; clones share the lock and the store.
#[derive(Clone, Debug)]
pub struct AccessList<S>
where
    S: Store,
{
    key: String,
    lock: Arc<Mutex<()>>,
    store: S,
}

impl<S> AccessList<S>
where
    S: Store,
{
    /// Loads the record, writing the default one if none exists yet.
    ///
    /// Must be called with `lock` held.
    async fn load(&self) -> Result<AccessListState> {
        let bytes = self.store.get(self.key.as_str()).await.map_err(|e| {
            error!(key = %self.key, error = %e, "failed to read access list");
            Error::StorageUnavailable(e.to_string())
        })?;

        if let Some(bytes) = bytes {
            return AccessListState::from_bytes(&bytes).inspect_err(|e| {
                error!(key = %self.key, error = %e, "refusing to use corrupt access list");
            });
        }

        let state = AccessListState::default();
        self.save(&state).await?;
        info!(key = %self.key, mode = %state.mode(), "initialised empty access list");

        Ok(state)
    }

    /// Must be called with `lock` held.
    async fn save(&self, state: &AccessListState) -> Result<()> {
        let bytes = state.to_bytes()?;

        self.store
            .put(self.key.as_str(), bytes)
            .await
            .map_err(|e| {
                error!(key = %self.key, error = %e, "failed to write access list");
                Error::StorageUnavailable(e.to_string())
            })
    }

    async fn read<T, F>(&self, view: F) -> Result<T>
    where
        F: FnOnce(&AccessListState) -> T + Send,
        T: Send,
    {
        let _guard = self.lock.lock().await;
        let state = self.load().await?;

        Ok(view(&state))
    }

    /// Applies `apply` to the current state and persists the result if it
    /// reports a change.
    async fn update<T, F>(&self, apply: F) -> Result<T>
    where
        F: FnOnce(&mut AccessListState) -> (T, bool) + Send,
        T: Send,
    {
        let _guard = self.lock.lock().await;
        let mut state = self.load().await?;

        let (output, changed) = apply(&mut state);
        if changed {
            self.save(&state).await?;
        }

        Ok(output)
    }
}

#[async_trait]
impl<S> AccessListManagement for AccessList<S>
where
    S: Store,
{
    type Store = S;

    fn new(AccessListOptions { store, key }: AccessListOptions<S>) -> Self {
        Self {
            key,
            lock: Arc::new(Mutex::new(())),
            store,
        }
    }

    async fn is_allowed(&self, user_id: UserId) -> Result<bool> {
        let (mode, allowed) = self
            .read(|state| (state.mode(), state.is_allowed(user_id)))
            .await?;

        debug!(user_id, %mode, allowed, "checked access");
        Ok(allowed)
    }

    async fn add_user(&self, user_id: UserId) -> Result<bool> {
        let (added, mode) = self
            .update(|state| {
                let added = state.insert(user_id);
                ((added, state.mode()), added)
            })
            .await?;

        if added {
            info!(user_id, %mode, "added user to access list");
        } else {
            debug!(user_id, %mode, "user already in access list");
        }
        Ok(added)
    }

    async fn remove_user(&self, user_id: UserId) -> Result<bool> {
        let (removed, mode) = self
            .update(|state| {
                let removed = state.remove(user_id);
                ((removed, state.mode()), removed)
            })
            .await?;

        if removed {
            info!(user_id, %mode, "removed user from access list");
        } else {
            debug!(user_id, %mode, "user not in access list");
        }
        Ok(removed)
    }

    async fn list_users(&self) -> Result<Vec<UserId>> {
        self.read(|state| state.users().to_vec()).await
    }

    async fn clear_users(&self) -> Result<usize> {
        let count = self
            .update(|state| {
                let count = state.clear();
                (count, count > 0)
            })
            .await?;

        info!(count, "cleared access list");
        Ok(count)
    }

    async fn get_mode(&self) -> Result<Mode> {
        self.read(AccessListState::mode).await
    }

    async fn set_mode(&self, mode: Mode) -> Result<()> {
        let previous = self
            .update(|state| {
                let previous = state.mode();
                (previous, state.set_mode(mode))
            })
            .await?;

        info!(from = %previous, to = %mode, "set access list mode");
        Ok(())
    }

    async fn toggle_mode(&self) -> Result<(Mode, Mode)> {
        let (previous, current) = self
            .update(|state| {
                let previous = state.mode();
                let current = previous.opposite();
                state.set_mode(current);
                ((previous, current), true)
            })
            .await?;

        info!(from = %previous, to = %current, "toggled access list mode");
        Ok((previous, current))
    }

    async fn snapshot(&self) -> Result<AccessListState> {
        self.read(AccessListState::clone).await
    }
}
