use async_trait::async_trait;

use super::ConfigResult;
use crate::domain::Session;

/// Local persistence of the signed-in session (token and user profile).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// `Ok(None)` when nobody is signed in or the stored profile is unusable.
    async fn load_session(&self) -> ConfigResult<Option<Session>>;
    async fn save_session(&self, session: &Session) -> ConfigResult<()>;
    async fn clear_session(&self) -> ConfigResult<()>;
}
