use std::sync::Arc;
use tokio::sync::RwLock;

use super::{AppError, AppResult};
use crate::domain::{validate_sign_up, Credentials, Session, SignUp, User};
use crate::ports::{AuthRepository, SessionStore};

/// Application-wide authentication state.
///
/// Loaded once at startup from the session store, replaced on sign-in and
/// torn down on sign-out. `reload` picks up changes made by another process
/// sharing the same store.
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
    auth: Arc<dyn AuthRepository>,
    current: RwLock<Option<Session>>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn SessionStore>, auth: Arc<dyn AuthRepository>) -> Self {
        Self {
            store,
            auth,
            current: RwLock::new(None),
        }
    }

    pub async fn initialize(&self) -> AppResult<Option<User>> {
        let session = self.store.load_session().await?;
        let user = session.as_ref().map(|s| s.user.clone());
        match &user {
            Some(user) => tracing::info!(user = %user.id, "restored session"),
            None => tracing::debug!("no stored session"),
        }
        *self.current.write().await = session;
        Ok(user)
    }

    /// Re-reads the stored session. Returns whether it changed.
    pub async fn reload(&self) -> AppResult<bool> {
        let stored = self.store.load_session().await?;
        let mut current = self.current.write().await;
        if *current == stored {
            return Ok(false);
        }
        tracing::info!(signed_in = stored.is_some(), "session changed outside this process");
        *current = stored;
        Ok(true)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<User> {
        let credentials = Credentials {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let session = self.auth.sign_in(&credentials).await?;
        self.store.save_session(&session).await?;

        let user = session.user.clone();
        tracing::info!(user = %user.id, "signed in");
        *self.current.write().await = Some(session);
        Ok(user)
    }

    pub async fn sign_up(&self, request: SignUp) -> AppResult<()> {
        let errors = validate_sign_up(&request);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        self.auth.sign_up(&request).await?;
        tracing::info!(email = %request.email, "account created");
        Ok(())
    }

    pub async fn sign_out(&self) -> AppResult<()> {
        self.store.clear_session().await?;
        *self.current.write().await = None;
        tracing::info!("signed out");
        Ok(())
    }

    pub async fn current_user(&self) -> Option<User> {
        self.current.read().await.as_ref().map(|s| s.user.clone())
    }

    pub async fn token(&self) -> Option<String> {
        self.current.read().await.as_ref().map(|s| s.token.clone())
    }

    pub async fn require_user(&self) -> AppResult<User> {
        self.current_user()
            .await
            .ok_or(AppError::AuthenticationRequired)
    }

    /// Like `require_user`, after re-reading the store.
    pub async fn require_fresh_user(&self) -> AppResult<User> {
        self.reload().await?;
        self.require_user().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use crate::ports::{MockAuthRepository, MockSessionStore, RepositoryError};

    fn session() -> Session {
        Session {
            token: "jwt-token".to_string(),
            user: User {
                id: UserId::from("u-1"),
                full_name: "Hamza Ali".to_string(),
                email: "hamza@example.com".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_initialize_restores_stored_session() {
        let mut store = MockSessionStore::new();
        store.expect_load_session().returning(|| Ok(Some(session())));
        let context = SessionContext::new(Arc::new(store), Arc::new(MockAuthRepository::new()));

        let user = context.initialize().await.unwrap();
        assert_eq!(user.map(|u| u.id), Some(UserId::from("u-1")));
        assert_eq!(context.token().await.as_deref(), Some("jwt-token"));
    }

    #[tokio::test]
    async fn test_require_user_without_session() {
        let mut store = MockSessionStore::new();
        store.expect_load_session().returning(|| Ok(None));
        let context = SessionContext::new(Arc::new(store), Arc::new(MockAuthRepository::new()));

        context.initialize().await.unwrap();
        assert_eq!(
            context.require_user().await,
            Err(AppError::AuthenticationRequired)
        );
    }

    #[tokio::test]
    async fn test_sign_in_persists_session() {
        let mut auth = MockAuthRepository::new();
        auth.expect_sign_in()
            .withf(|c| c.email == "hamza@example.com" && c.password == "secret")
            .returning(|_| Ok(session()));
        let mut store = MockSessionStore::new();
        store
            .expect_save_session()
            .withf(|s| s.token == "jwt-token")
            .times(1)
            .returning(|_| Ok(()));

        let context = SessionContext::new(Arc::new(store), Arc::new(auth));
        let user = context.sign_in(" hamza@example.com ", "secret").await.unwrap();
        assert_eq!(user.full_name, "Hamza Ali");
        assert!(context.current_user().await.is_some());
    }

    #[tokio::test]
    async fn test_failed_sign_in_keeps_state() {
        let mut auth = MockAuthRepository::new();
        auth.expect_sign_in().returning(|_| {
            Err(RepositoryError::Authentication("Invalid credentials".to_string()))
        });
        let context = SessionContext::new(Arc::new(MockSessionStore::new()), Arc::new(auth));

        let err = context.sign_in("a@b.co", "nope").await.unwrap_err();
        assert!(matches!(err, AppError::Repository(RepositoryError::Authentication(_))));
        assert!(context.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_sign_out_clears_store_and_state() {
        let mut store = MockSessionStore::new();
        store.expect_load_session().returning(|| Ok(Some(session())));
        store.expect_clear_session().times(1).returning(|| Ok(()));
        let context = SessionContext::new(Arc::new(store), Arc::new(MockAuthRepository::new()));

        context.initialize().await.unwrap();
        context.sign_out().await.unwrap();
        assert!(context.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_reload_detects_external_logout() {
        let mut store = MockSessionStore::new();
        let mut calls = 0;
        store.expect_load_session().returning(move || {
            calls += 1;
            Ok(if calls == 1 { Some(session()) } else { None })
        });
        let context = SessionContext::new(Arc::new(store), Arc::new(MockAuthRepository::new()));

        context.initialize().await.unwrap();
        assert!(context.reload().await.unwrap());
        assert!(!context.reload().await.unwrap());
        assert!(context.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_fresh_user_picks_up_login_from_another_terminal() {
        let mut store = MockSessionStore::new();
        let mut calls = 0;
        store.expect_load_session().times(2).returning(move || {
            calls += 1;
            Ok(if calls == 1 { None } else { Some(session()) })
        });
        let context = SessionContext::new(Arc::new(store), Arc::new(MockAuthRepository::new()));

        context.initialize().await.unwrap();
        assert_eq!(
            context.require_user().await,
            Err(AppError::AuthenticationRequired)
        );

        let user = context.require_fresh_user().await.unwrap();
        assert_eq!(user.email, "hamza@example.com");
        assert_eq!(context.token().await.as_deref(), Some("jwt-token"));
    }

    #[tokio::test]
    async fn test_sign_up_validates_before_calling_api() {
        let context = SessionContext::new(
            Arc::new(MockSessionStore::new()),
            Arc::new(MockAuthRepository::new()),
        );
        let err = context
            .sign_up(SignUp {
                full_name: String::new(),
                email: "not-an-email".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap_err();

        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 2);
    }
}
