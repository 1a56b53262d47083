use async_trait::async_trait;

use super::RepositoryResult;
use crate::domain::{Client, ClientDraft, ClientId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn list_clients(&self) -> RepositoryResult<Vec<Client>>;
    async fn get_client(&self, id: &ClientId) -> RepositoryResult<Client>;
    async fn create_client(&self, client: &ClientDraft) -> RepositoryResult<Client>;
    async fn update_client(&self, id: &ClientId, client: &ClientDraft) -> RepositoryResult<Client>;
}
