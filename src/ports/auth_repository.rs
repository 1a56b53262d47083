use async_trait::async_trait;

use super::RepositoryResult;
use crate::domain::{Credentials, Session, SignUp};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn sign_in(&self, credentials: &Credentials) -> RepositoryResult<Session>;
    /// Creates the account. The caller still has to sign in.
    async fn sign_up(&self, request: &SignUp) -> RepositoryResult<()>;
}
