use async_trait::async_trait;
use std::path::PathBuf;

use super::RepositoryResult;
use crate::domain::{ProjectDraft, ProjectId, ProjectRecord, UserId};

/// URLs and project id handed back by a media upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUpload {
    pub urls: Vec<String>,
    pub project_id: Option<ProjectId>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn list_projects(&self, user_id: &UserId) -> RepositoryResult<Vec<ProjectRecord>>;
    async fn list_drafts(&self, user_id: &UserId) -> RepositoryResult<Vec<ProjectRecord>>;
    async fn get_project(&self, id: &ProjectId) -> RepositoryResult<ProjectRecord>;
    async fn get_draft(&self, id: &ProjectId, user_id: &UserId) -> RepositoryResult<ProjectRecord>;
    async fn save_draft(
        &self,
        draft: &ProjectDraft,
        user_id: &UserId,
    ) -> RepositoryResult<ProjectRecord>;
    async fn create_project(
        &self,
        draft: &ProjectDraft,
        user_id: &UserId,
    ) -> RepositoryResult<ProjectRecord>;
    async fn update_project(&self, record: &ProjectRecord) -> RepositoryResult<()>;
    async fn upload_media(&self, files: Vec<PathBuf>) -> RepositoryResult<MediaUpload>;
}
