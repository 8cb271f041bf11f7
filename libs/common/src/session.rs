//! Session context backed by the local store
//!
//! The session is the single access/refresh token pair active on the device
//! together with the email of the signed-in user. All token reads and writes
//! go through [`SessionStore`].

use std::sync::Arc;
use tracing::info;

use crate::error::StoreResult;
use crate::store::{ACCESS_TOKEN, KeyValueStore, REFRESH_TOKEN, USER_EMAIL};

/// Credentials of the signed-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub email: String,
}

impl Session {
    /// Create a new session
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            email: email.into(),
        }
    }
}

/// Session manager for the token pair persisted on the device
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    /// Create a new session store on top of a key-value backend
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load the full session, if every part of it is persisted
    pub async fn load(&self) -> StoreResult<Option<Session>> {
        let access_token = self.store.get(ACCESS_TOKEN).await?;
        let refresh_token = self.store.get(REFRESH_TOKEN).await?;
        let email = self.store.get(USER_EMAIL).await?;

        Ok(match (access_token, refresh_token, email) {
            (Some(access_token), Some(refresh_token), Some(email)) => Some(Session {
                access_token,
                refresh_token,
                email,
            }),
            _ => None,
        })
    }

    /// Persist a freshly created session, replacing the previous pair
    pub async fn save(&self, session: &Session) -> StoreResult<()> {
        info!("Saving session for user: {}", session.email);

        self.store.set(ACCESS_TOKEN, &session.access_token).await?;
        self.store.set(REFRESH_TOKEN, &session.refresh_token).await?;
        self.store.set(USER_EMAIL, &session.email).await?;
        Ok(())
    }

    pub async fn access_token(&self) -> StoreResult<Option<String>> {
        self.store.get(ACCESS_TOKEN).await
    }

    pub async fn refresh_token(&self) -> StoreResult<Option<String>> {
        self.store.get(REFRESH_TOKEN).await
    }

    /// Replace the access token after a successful refresh
    pub async fn set_access_token(&self, access_token: &str) -> StoreResult<()> {
        self.store.set(ACCESS_TOKEN, access_token).await
    }

    pub async fn email(&self) -> StoreResult<Option<String>> {
        self.store.get(USER_EMAIL).await
    }

    pub async fn set_email(&self, email: &str) -> StoreResult<()> {
        self.store.set(USER_EMAIL, email).await
    }

    /// Drop the token pair, keeping the remembered email
    pub async fn clear_tokens(&self) -> StoreResult<()> {
        info!("Clearing session tokens");
        self.store.delete_many(&[ACCESS_TOKEN, REFRESH_TOKEN]).await
    }

    /// Drop everything belonging to the session (logout)
    pub async fn clear(&self) -> StoreResult<()> {
        info!("Clearing session");
        self.store
            .delete_many(&[ACCESS_TOKEN, REFRESH_TOKEN, USER_EMAIL])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn session_store() -> SessionStore {
        SessionStore::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_save_and_load() -> StoreResult<()> {
        let sessions = session_store();
        assert_eq!(sessions.load().await?, None);

        let session = Session::new("access", "refresh", "jane@example.com");
        sessions.save(&session).await?;

        assert_eq!(sessions.load().await?, Some(session));
        assert_eq!(sessions.access_token().await?, Some("access".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_partial_session_does_not_load() -> StoreResult<()> {
        let sessions = session_store();
        sessions.set_access_token("access").await?;

        assert_eq!(sessions.load().await?, None);
        assert_eq!(sessions.refresh_token().await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_tokens_keeps_email() -> StoreResult<()> {
        let sessions = session_store();
        sessions
            .save(&Session::new("access", "refresh", "jane@example.com"))
            .await?;

        sessions.clear_tokens().await?;

        assert_eq!(sessions.access_token().await?, None);
        assert_eq!(sessions.refresh_token().await?, None);
        assert_eq!(sessions.email().await?, Some("jane@example.com".to_string()));
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_removes_everything() -> StoreResult<()> {
        let sessions = session_store();
        sessions
            .save(&Session::new("access", "refresh", "jane@example.com"))
            .await?;

        sessions.clear().await?;

        assert_eq!(sessions.load().await?, None);
        assert_eq!(sessions.email().await?, None);
        Ok(())
    }
}
