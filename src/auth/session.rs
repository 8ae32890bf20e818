use super::store::{CredentialStore, StoredCredentials};
use crate::gateway::{SessionProvider, User};
use crate::Result;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Authenticated(User),
    Unauthenticated,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}

/// Application-wide session state
///
/// Cheap to clone; all clones share the same credentials and state channel.
#[derive(Clone)]
pub struct AuthSession {
    credentials: Arc<RwLock<Option<StoredCredentials>>>,
    store: Arc<dyn CredentialStore>,
    state_tx: Arc<watch::Sender<AuthState>>,
}

impl AuthSession {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        let (state_tx, _) = watch::channel(AuthState::Unauthenticated);
        Self {
            credentials: Arc::new(RwLock::new(None)),
            store,
            state_tx: Arc::new(state_tx),
        }
    }

    /// Load previously stored credentials
    pub fn restore(&self) -> Result<AuthState> {
        match self.store.load()? {
            Some(credentials) => {
                info!("Restored session for {}", credentials.user.email);
                self.set(Some(credentials));
            }
            None => self.set(None),
        }
        Ok(self.state())
    }

    /// Persist and activate new credentials
    pub fn establish(&self, credentials: StoredCredentials) -> Result<()> {
        self.store.save(&credentials)?;
        self.set(Some(credentials));
        Ok(())
    }

    /// Drop credentials locally and in the store
    pub fn clear(&self) {
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear stored credentials: {}", e);
        }
        self.set(None);
    }

    pub fn state(&self) -> AuthState {
        self.state_tx.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    pub fn user(&self) -> Option<User> {
        self.credentials.read().as_ref().map(|c| c.user.clone())
    }

    /// Observe state changes
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }

    fn set(&self, credentials: Option<StoredCredentials>) {
        let state = match &credentials {
            Some(c) => AuthState::Authenticated(c.user.clone()),
            None => AuthState::Unauthenticated,
        };
        *self.credentials.write() = credentials;
        self.state_tx.send_replace(state);
    }
}

impl SessionProvider for AuthSession {
    fn token(&self) -> Option<String> {
        self.credentials.read().as_ref().map(|c| c.token.clone())
    }

    fn invalidate(&self) {
        if self.is_authenticated() {
            info!("Session invalidated, re-authentication required");
        }
        self.clear();
    }
}
