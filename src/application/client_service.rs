use std::sync::Arc;

use super::{paginate, AppError, AppResult, Page};
use crate::domain::*;
use crate::ports::{Cache, ClientRepository};

pub struct ClientService {
    repository: Arc<dyn ClientRepository>,
    cache: Arc<dyn Cache<ClientId, Client>>,
    phone_policy: PhonePolicy,
}

impl ClientService {
    pub fn new(
        repository: Arc<dyn ClientRepository>,
        cache: Arc<dyn Cache<ClientId, Client>>,
        phone_policy: PhonePolicy,
    ) -> Self {
        Self {
            repository,
            cache,
            phone_policy,
        }
    }

    pub async fn list(&self, page: usize, per_page: usize) -> AppResult<Page<Client>> {
        let clients = self.repository.list_clients().await?;

        for client in &clients {
            self.cache.insert(client.id.clone(), client.clone()).await;
        }

        Ok(paginate(&clients, page, per_page))
    }

    pub async fn get(&self, id: &ClientId, use_cache: bool) -> AppResult<Client> {
        if use_cache {
            if let Some(client) = self.cache.get(id).await {
                return Ok(client);
            }
        }

        let client = self.repository.get_client(id).await?;
        self.cache.insert(id.clone(), client.clone()).await;
        Ok(client)
    }

    pub async fn create(&self, draft: ClientDraft) -> AppResult<Client> {
        self.check(&draft)?;

        let client = self.repository.create_client(&draft).await?;
        tracing::info!(id = %client.id, "client created");
        self.cache.insert(client.id.clone(), client.clone()).await;
        Ok(client)
    }

    pub async fn update(&self, id: &ClientId, draft: ClientDraft) -> AppResult<Client> {
        self.check(&draft)?;

        let client = self.repository.update_client(id, &draft).await?;
        tracing::info!(id = %id, "client updated");
        self.cache.insert(id.clone(), client.clone()).await;
        Ok(client)
    }

    fn check(&self, draft: &ClientDraft) -> AppResult<()> {
        let errors = validate_client(draft, self.phone_policy);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::MokaCacheAdapter;
    use crate::ports::{MockClientRepository, RepositoryError};

    fn draft() -> ClientDraft {
        ClientDraft {
            full_name: "Sara Khan".to_string(),
            client_type: Some(ClientKind::Individual),
            email: "sara@example.com".to_string(),
            phone: "+92 300 1234567".to_string(),
            ..Default::default()
        }
    }

    fn client(id: &str) -> Client {
        Client {
            id: ClientId::from(id),
            details: draft(),
        }
    }

    fn service(repo: MockClientRepository, policy: PhonePolicy) -> ClientService {
        ClientService::new(
            Arc::new(repo),
            Arc::new(MokaCacheAdapter::for_clients(300)),
            policy,
        )
    }

    #[tokio::test]
    async fn test_get_uses_cache_after_first_fetch() {
        let mut repo = MockClientRepository::new();
        repo.expect_get_client()
            .times(1)
            .returning(|id| Ok(client(&id.0)));

        let service = service(repo, PhonePolicy::Lenient);
        let id = ClientId::from("c-1");
        service.get(&id, true).await.unwrap();
        let cached = service.get(&id, true).await.unwrap();
        assert_eq!(cached.details.full_name, "Sara Khan");
    }

    #[tokio::test]
    async fn test_list_paginates() {
        let mut repo = MockClientRepository::new();
        repo.expect_list_clients()
            .returning(|| Ok((1..=8).map(|i| client(&format!("c-{i}"))).collect()));

        let service = service(repo, PhonePolicy::Lenient);
        let page = service.list(2, 6).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 8);
        assert_eq!(page.items[0].id, ClientId::from("c-7"));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_before_calling_api() {
        let mut repo = MockClientRepository::new();
        repo.expect_create_client().never();

        let service = service(repo, PhonePolicy::Strict);
        let err = service.create(draft()).await.unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.contains(Field::Phone));
        assert_eq!(errors.len(), 1);
    }

    #[tokio::test]
    async fn test_update_surfaces_server_error() {
        let mut repo = MockClientRepository::new();
        repo.expect_update_client().returning(|_, _| {
            Err(RepositoryError::Api {
                status: 409,
                message: "Email already in use".to_string(),
            })
        });

        let service = service(repo, PhonePolicy::Lenient);
        let err = service
            .update(&ClientId::from("c-1"), draft())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AppError::Repository(RepositoryError::Api {
                status: 409,
                message: "Email already in use".to_string(),
            })
        );
    }
}
