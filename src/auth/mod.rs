//! Authentication session
//!
//! Credentials live in a [`CredentialStore`] (the client-local equivalent of
//! browser storage). [`AuthSession`] holds the in-memory copy, broadcasts
//! state changes, and is the [`SessionProvider`] the gateway authorizes
//! requests from. [`AuthManager`] runs the login, signup, and logout flows.
//!
//! [`SessionProvider`]: crate::gateway::SessionProvider

pub mod manager;
pub mod session;
pub mod store;

pub use manager::AuthManager;
pub use session::{AuthSession, AuthState};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore, StoredCredentials};
