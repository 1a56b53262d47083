use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::{ProjectDraft, ProjectRecord, UserId};
use crate::ports::{ProjectRepository, RepositoryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    Draft,
    Final,
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionKind::Draft => f.write_str("draft"),
            SubmissionKind::Final => f.write_str("project"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitErrorKind {
    Network,
    Server,
    Unauthenticated,
    InvalidResponse,
    UnreadableFile,
}

/// A failed submission, with the message to show the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct SubmitError {
    pub kind: SubmitErrorKind,
    pub message: String,
}

impl From<RepositoryError> for SubmitError {
    fn from(err: RepositoryError) -> Self {
        let kind = match &err {
            RepositoryError::Network(_) => SubmitErrorKind::Network,
            RepositoryError::Authentication(_) => SubmitErrorKind::Unauthenticated,
            RepositoryError::NotFound(_) | RepositoryError::Api { .. } => SubmitErrorKind::Server,
            RepositoryError::Serialization(_) => SubmitErrorKind::InvalidResponse,
            RepositoryError::Io { .. } => SubmitErrorKind::UnreadableFile,
        };
        Self {
            kind,
            message: err.user_message(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReceipt {
    pub kind: SubmissionKind,
    pub project: ProjectRecord,
}

/// Sends a wizard draft to the backend, either as a draft or as a finished
/// project. Single attempt, no retry.
pub struct SubmissionGateway {
    projects: Arc<dyn ProjectRepository>,
}

impl SubmissionGateway {
    pub fn new(projects: Arc<dyn ProjectRepository>) -> Self {
        Self { projects }
    }

    pub async fn save_draft(
        &self,
        draft: &ProjectDraft,
        user_id: &UserId,
    ) -> Result<SubmitReceipt, SubmitError> {
        self.submit(SubmissionKind::Draft, draft, user_id).await
    }

    pub async fn finalize(
        &self,
        draft: &ProjectDraft,
        user_id: &UserId,
    ) -> Result<SubmitReceipt, SubmitError> {
        self.submit(SubmissionKind::Final, draft, user_id).await
    }

    async fn submit(
        &self,
        kind: SubmissionKind,
        draft: &ProjectDraft,
        user_id: &UserId,
    ) -> Result<SubmitReceipt, SubmitError> {
        let draft = self.upload_pending_media(draft).await?;

        let result = match kind {
            SubmissionKind::Draft => self.projects.save_draft(&draft, user_id).await,
            SubmissionKind::Final => self.projects.create_project(&draft, user_id).await,
        };

        match result {
            Ok(project) => {
                tracing::info!(%kind, id = %project.id, user = %user_id, "submission accepted");
                Ok(SubmitReceipt { kind, project })
            }
            Err(err) => {
                tracing::warn!(%kind, user = %user_id, error = %err, "submission failed");
                Err(err.into())
            }
        }
    }

    /// Uploads locally picked files first so the payload only carries URLs.
    async fn upload_pending_media(&self, draft: &ProjectDraft) -> Result<ProjectDraft, SubmitError> {
        let mut draft = draft.clone();
        let pending: Vec<_> = draft.pending_media().into_iter().map(Path::to_path_buf).collect();
        if pending.is_empty() {
            return Ok(draft);
        }

        tracing::debug!(files = pending.len(), "uploading pending media");
        let upload = self.projects.upload_media(pending).await.map_err(|err| {
            tracing::warn!(error = %err, "media upload failed");
            SubmitError::from(err)
        })?;

        let mut urls: Vec<String> = draft
            .media
            .iter()
            .filter_map(|m| m.remote_url().map(str::to_string))
            .collect();
        urls.extend(upload.urls);
        draft.apply_upload(urls, upload.project_id);
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MediaItem, ProjectId};
    use crate::ports::{MediaUpload, MockProjectRepository, NETWORK_ERROR_MESSAGE};
    use std::path::PathBuf;

    fn record(id: &str) -> ProjectRecord {
        ProjectRecord {
            id: ProjectId::from(id),
            draft: ProjectDraft::default(),
            is_draft: false,
            created_at: None,
            updated_at: None,
        }
    }

    fn user() -> UserId {
        UserId::from("u-7")
    }

    #[tokio::test]
    async fn test_save_draft_posts_to_draft_endpoint() {
        let mut repo = MockProjectRepository::new();
        repo.expect_save_draft()
            .withf(|draft, user| draft.project_name == "Lookbook" && user.0 == "u-7")
            .times(1)
            .returning(|_, _| Ok(record("dp-1")));
        repo.expect_create_project().never();

        let gateway = SubmissionGateway::new(Arc::new(repo));
        let draft = ProjectDraft {
            project_name: "Lookbook".to_string(),
            ..Default::default()
        };
        let receipt = gateway.save_draft(&draft, &user()).await.unwrap();
        assert_eq!(receipt.kind, SubmissionKind::Draft);
        assert_eq!(receipt.project.id, ProjectId::from("dp-1"));
    }

    #[tokio::test]
    async fn test_finalize_posts_to_create_endpoint() {
        let mut repo = MockProjectRepository::new();
        repo.expect_create_project()
            .times(1)
            .returning(|_, _| Ok(record("p-1")));
        repo.expect_save_draft().never();

        let gateway = SubmissionGateway::new(Arc::new(repo));
        let receipt = gateway
            .finalize(&ProjectDraft::default(), &user())
            .await
            .unwrap();
        assert_eq!(receipt.kind, SubmissionKind::Final);
    }

    #[tokio::test]
    async fn test_server_message_is_surfaced() {
        let mut repo = MockProjectRepository::new();
        repo.expect_create_project().returning(|_, _| {
            Err(RepositoryError::Api {
                status: 400,
                message: "Project name already exists".to_string(),
            })
        });

        let gateway = SubmissionGateway::new(Arc::new(repo));
        let err = gateway
            .finalize(&ProjectDraft::default(), &user())
            .await
            .unwrap_err();
        assert_eq!(err.kind, SubmitErrorKind::Server);
        assert_eq!(err.message, "Project name already exists");
    }

    #[tokio::test]
    async fn test_network_failure_uses_generic_message() {
        let mut repo = MockProjectRepository::new();
        repo.expect_save_draft()
            .times(1)
            .returning(|_, _| Err(RepositoryError::Network("connection refused".to_string())));

        let gateway = SubmissionGateway::new(Arc::new(repo));
        let err = gateway
            .save_draft(&ProjectDraft::default(), &user())
            .await
            .unwrap_err();
        assert_eq!(err.kind, SubmitErrorKind::Network);
        assert_eq!(err.message, NETWORK_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_pending_media_uploaded_before_submit() {
        let mut repo = MockProjectRepository::new();
        repo.expect_upload_media()
            .withf(|files| files == &vec![PathBuf::from("/tmp/shot.jpg")])
            .times(1)
            .returning(|_| {
                Ok(MediaUpload {
                    urls: vec!["https://cdn.example/shot.jpg".to_string()],
                    project_id: Some(ProjectId::from("p-9")),
                })
            });
        repo.expect_create_project()
            .withf(|draft, _| {
                draft.pending_media().is_empty()
                    && draft.project_id == Some(ProjectId::from("p-9"))
                    && draft.media
                        == vec![
                            MediaItem::Remote("https://cdn.example/cover.jpg".to_string()),
                            MediaItem::Remote("https://cdn.example/shot.jpg".to_string()),
                        ]
            })
            .times(1)
            .returning(|_, _| Ok(record("p-9")));

        let gateway = SubmissionGateway::new(Arc::new(repo));
        let draft = ProjectDraft {
            media: vec![
                MediaItem::Remote("https://cdn.example/cover.jpg".to_string()),
                MediaItem::Local(PathBuf::from("/tmp/shot.jpg")),
            ],
            ..Default::default()
        };
        gateway.finalize(&draft, &user()).await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_upload_aborts_submission() {
        let mut repo = MockProjectRepository::new();
        repo.expect_upload_media()
            .returning(|_| Err(RepositoryError::Network("timeout".to_string())));
        repo.expect_create_project().never();

        let gateway = SubmissionGateway::new(Arc::new(repo));
        let draft = ProjectDraft {
            media: vec![MediaItem::Local(PathBuf::from("/tmp/a.png"))],
            ..Default::default()
        };
        let err = gateway.finalize(&draft, &user()).await.unwrap_err();
        assert_eq!(err.kind, SubmitErrorKind::Network);
    }
}
