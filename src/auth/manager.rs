use super::session::AuthSession;
use super::store::StoredCredentials;
use crate::gateway::{AuthApi, AuthResponse, User};
use crate::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// Login, signup, and logout flows
pub struct AuthManager<A: AuthApi> {
    api: Arc<A>,
    session: AuthSession,
}

impl<A: AuthApi> AuthManager<A> {
    pub fn new(api: Arc<A>, session: AuthSession) -> Self {
        Self { api, session }
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let response = self.api.login(email, password).await?;
        self.accept(response)
    }

    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<User> {
        let response = self.api.signup(name, email, password).await?;
        self.accept(response)
    }

    /// Always ends logged out locally, even if the backend call fails
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            warn!("Logout API call failed: {}", e);
        }
        self.session.clear();
        info!("Logged out");
    }

    fn accept(&self, response: AuthResponse) -> Result<User> {
        let user = response.user.clone();
        self.session.establish(StoredCredentials {
            token: response.token,
            user: response.user,
        })?;
        info!("Authenticated as {}", user.email);
        Ok(user)
    }
}
