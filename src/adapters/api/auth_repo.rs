use async_trait::async_trait;

use super::{ApiClient, SignInRequest, SignInResponse, SignUpRequest};
use crate::domain::{Credentials, Session, SignUp};
use crate::ports::{AuthRepository, RepositoryResult};

#[derive(Clone)]
pub struct ApiAuthRepository {
    client: ApiClient,
}

impl ApiAuthRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthRepository for ApiAuthRepository {
    async fn sign_in(&self, credentials: &Credentials) -> RepositoryResult<Session> {
        let request = SignInRequest {
            email: &credentials.email,
            password: &credentials.password,
        };
        let response: SignInResponse = self.client.post("/user/signin", &request).await?;
        Ok(response.into())
    }

    async fn sign_up(&self, request: &SignUp) -> RepositoryResult<()> {
        let body = SignUpRequest {
            full_name: request.full_name.trim(),
            email: request.email.trim(),
            password: &request.password,
        };
        let _: serde_json::Value = self.client.post("/user/signup", &body).await?;
        Ok(())
    }
}
