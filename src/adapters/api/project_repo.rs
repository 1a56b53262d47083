use async_trait::async_trait;
use serde_json::json;
use std::path::PathBuf;

use super::{
    ApiClient, DataResponse, ListResponse, ProjectPayload, ProjectRecordDto, ProjectResponse,
    StatusResponse, UploadResponse,
};
use crate::domain::{ProjectDraft, ProjectId, ProjectRecord, UserId};
use crate::ports::{MediaUpload, ProjectRepository, RepositoryResult};

#[derive(Clone)]
pub struct ApiProjectRepository {
    client: ApiClient,
}

impl ApiProjectRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    async fn list(&self, path: &str, user_id: &UserId, is_draft: bool) -> RepositoryResult<Vec<ProjectRecord>> {
        let response: ListResponse<ProjectRecordDto> = self
            .client
            .post(path, &json!({ "userId": user_id.0 }))
            .await?;

        let mut records = Vec::with_capacity(response.data.len());
        for dto in response.data {
            match dto.into_record(is_draft) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(error = %e, path, "skipping unreadable project"),
            }
        }
        Ok(records)
    }

    async fn submit(
        &self,
        path: &str,
        draft: &ProjectDraft,
        user_id: &UserId,
        is_draft: bool,
    ) -> RepositoryResult<ProjectRecord> {
        let payload = ProjectPayload::new(draft, Some(user_id));
        let response: ProjectResponse = self.client.post(path, &payload).await?;
        Ok(record_from_response(response, draft, is_draft))
    }
}

/// Any 2xx reply counts as saved. When the reply echoes no readable project
/// with an id, the record is rebuilt from what was sent.
fn record_from_response(
    response: ProjectResponse,
    draft: &ProjectDraft,
    is_draft: bool,
) -> ProjectRecord {
    if let Some(dto) = response.project {
        match dto.into_record(is_draft) {
            Ok(record) => return record,
            Err(e) => tracing::debug!(error = %e, "reply project unusable, keeping submitted draft"),
        }
    }

    let known_id = if is_draft {
        draft.draft_id.as_ref().or(draft.project_id.as_ref())
    } else {
        draft.project_id.as_ref().or(draft.draft_id.as_ref())
    };
    ProjectRecord {
        id: known_id.cloned().unwrap_or_else(|| ProjectId(String::new())),
        draft: draft.clone(),
        is_draft,
        created_at: None,
        updated_at: None,
    }
}

#[async_trait]
impl ProjectRepository for ApiProjectRepository {
    async fn list_projects(&self, user_id: &UserId) -> RepositoryResult<Vec<ProjectRecord>> {
        self.list("/project/all_projects", user_id, false).await
    }

    async fn list_drafts(&self, user_id: &UserId) -> RepositoryResult<Vec<ProjectRecord>> {
        self.list("/project/all_draftProject", user_id, true).await
    }

    async fn get_project(&self, id: &ProjectId) -> RepositoryResult<ProjectRecord> {
        let path = format!("/project/{}", urlencoding::encode(&id.0));
        let response: DataResponse<ProjectRecordDto> = self.client.get(&path, &[]).await?;
        response.data.into_record(false)
    }

    async fn get_draft(&self, id: &ProjectId, user_id: &UserId) -> RepositoryResult<ProjectRecord> {
        let path = format!("/project/draft/{}", urlencoding::encode(&id.0));
        let response: DataResponse<ProjectRecordDto> = self
            .client
            .get(&path, &[("userId", user_id.0.as_str())])
            .await?;
        response.data.into_record(true)
    }

    async fn save_draft(
        &self,
        draft: &ProjectDraft,
        user_id: &UserId,
    ) -> RepositoryResult<ProjectRecord> {
        self.submit("/project/draftProject", draft, user_id, true).await
    }

    async fn create_project(
        &self,
        draft: &ProjectDraft,
        user_id: &UserId,
    ) -> RepositoryResult<ProjectRecord> {
        self.submit("/project/new_project", draft, user_id, false).await
    }

    async fn update_project(&self, record: &ProjectRecord) -> RepositoryResult<()> {
        let path = format!("/project/update_project/{}", urlencoding::encode(&record.id.0));
        let response: StatusResponse = self
            .client
            .put(&path, &ProjectPayload::for_record(record))
            .await?;
        response.into_result("Failed to update project")
    }

    async fn upload_media(&self, files: Vec<PathBuf>) -> RepositoryResult<MediaUpload> {
        let response: UploadResponse = self
            .client
            .post_files("/project/upload_pictures", "images", &files)
            .await?;
        MediaUpload::try_from(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookbook() -> ProjectDraft {
        ProjectDraft {
            project_name: "Lookbook".to_string(),
            description: "Autumn lookbook shoot".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_created_reply_without_id_keeps_submitted_draft() {
        let response: ProjectResponse = serde_json::from_str(
            r#"{"message":"Project created successfully","project":{"projectName":"Lookbook"}}"#,
        )
        .unwrap();

        let record = record_from_response(response, &lookbook(), false);
        assert!(!record.is_draft);
        assert_eq!(record.id, ProjectId::from(""));
        assert_eq!(record.draft, lookbook());
    }

    #[test]
    fn test_reply_without_project_reuses_known_draft_id() {
        let response: ProjectResponse =
            serde_json::from_str(r#"{"message":"Draft saved"}"#).unwrap();
        let draft = ProjectDraft {
            draft_id: Some(ProjectId::from("d-9")),
            ..lookbook()
        };

        let record = record_from_response(response, &draft, true);
        assert!(record.is_draft);
        assert_eq!(record.id, ProjectId::from("d-9"));
    }

    #[test]
    fn test_reply_with_id_wins() {
        let response: ProjectResponse = serde_json::from_str(
            r#"{"project":{"pid":"p-12","projectName":"Lookbook Final"}}"#,
        )
        .unwrap();

        let record = record_from_response(response, &lookbook(), false);
        assert_eq!(record.id, ProjectId::from("p-12"));
        assert_eq!(record.draft.project_name, "Lookbook Final");
    }
}
