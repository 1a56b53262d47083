use async_trait::async_trait;

use super::{ApiClient, ClientDto, ClientPayload, ClientResponse};
use crate::domain::{Client, ClientDraft, ClientId};
use crate::ports::{ClientRepository, RepositoryResult};

#[derive(Clone)]
pub struct ApiClientRepository {
    client: ApiClient,
}

impl ApiClientRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    fn client_path(id: &ClientId) -> String {
        format!("/api/clients/{}", urlencoding::encode(&id.0))
    }
}

#[async_trait]
impl ClientRepository for ApiClientRepository {
    async fn list_clients(&self) -> RepositoryResult<Vec<Client>> {
        let dtos: Vec<ClientDto> = self.client.get("/api/clients", &[]).await?;

        let mut clients = Vec::with_capacity(dtos.len());
        for dto in dtos {
            match Client::try_from(dto) {
                Ok(client) => clients.push(client),
                Err(e) => tracing::warn!(error = %e, "skipping unreadable client"),
            }
        }
        Ok(clients)
    }

    async fn get_client(&self, id: &ClientId) -> RepositoryResult<Client> {
        let response: ClientResponse = self.client.get(&Self::client_path(id), &[]).await?;
        Client::try_from(response.into_dto())
    }

    async fn create_client(&self, client: &ClientDraft) -> RepositoryResult<Client> {
        let response: ClientResponse = self
            .client
            .post("/api/clients", &ClientPayload::from(client))
            .await?;
        Client::try_from(response.into_dto())
    }

    async fn update_client(&self, id: &ClientId, client: &ClientDraft) -> RepositoryResult<Client> {
        let response: ClientResponse = self
            .client
            .put(&Self::client_path(id), &ClientPayload::from(client))
            .await?;

        // Some responses omit the id on update
        let mut dto = response.into_dto();
        if dto.cid.is_none() && dto.id.is_none() && dto.object_id.is_none() {
            dto.cid = Some(id.0.clone());
        }
        Client::try_from(dto)
    }
}
