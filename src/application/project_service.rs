use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;

use super::{AppError, AppResult};
use crate::domain::*;
use crate::ports::{MediaUpload, ProjectRepository};

/// One page of a listing. Pages are 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn page_count(&self) -> usize {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(self.per_page)
    }
}

pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let page = page.max(1);
    let per_page = per_page.max(1);
    let start = (page - 1).saturating_mul(per_page);

    Page {
        items: items.iter().skip(start).take(per_page).cloned().collect(),
        page,
        per_page,
        total: items.len(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProjectQuery {
    pub drafts: bool,
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: usize,
    pub per_page: usize,
}

impl ProjectQuery {
    fn cache_key(&self, user_id: &UserId) -> String {
        let kind = if self.drafts { "drafts" } else { "projects" };
        format!("{kind}:{user_id}")
    }

    fn matches(&self, summary: &ProjectSummary) -> bool {
        if let Some(status) = &self.status {
            if !summary.status.eq_ignore_ascii_case(status.trim()) {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim) {
            Some(query) if !query.is_empty() => {
                let query = query.to_lowercase();
                summary.name.to_lowercase().contains(&query)
                    || summary
                        .project_type
                        .is_some_and(|t| t.as_str().to_lowercase().contains(&query))
                    || summary
                        .tags
                        .iter()
                        .any(|tag| tag.to_lowercase().contains(&query))
            }
            _ => true,
        }
    }
}

#[derive(Debug, Clone)]
struct CachedList {
    items: Vec<ProjectRecord>,
    fetched_at: DateTime<Utc>,
}

pub struct ProjectService {
    repository: Arc<dyn ProjectRepository>,
    list_cache: DashMap<String, CachedList>,
    cache_ttl: chrono::Duration,
}

impl ProjectService {
    pub fn new(repository: Arc<dyn ProjectRepository>, cache_ttl_seconds: u64) -> Self {
        Self {
            repository,
            list_cache: DashMap::new(),
            cache_ttl: chrono::Duration::seconds(cache_ttl_seconds as i64),
        }
    }

    /// Projects or drafts of a user, newest first, filtered and paginated.
    pub async fn list(
        &self,
        user_id: &UserId,
        query: &ProjectQuery,
        use_cache: bool,
    ) -> AppResult<Page<ProjectSummary>> {
        let records = self.records(user_id, query, use_cache).await?;
        let summaries: Vec<ProjectSummary> = records
            .iter()
            .map(ProjectSummary::from)
            .filter(|s| query.matches(s))
            .collect();

        Ok(paginate(&summaries, query.page, query.per_page))
    }

    async fn records(
        &self,
        user_id: &UserId,
        query: &ProjectQuery,
        use_cache: bool,
    ) -> AppResult<Vec<ProjectRecord>> {
        let cache_key = query.cache_key(user_id);

        if use_cache {
            if let Some(cached) = self.list_cache.get(&cache_key) {
                if Utc::now() - cached.fetched_at < self.cache_ttl {
                    return Ok(cached.items.clone());
                }
            }
        }

        let mut records = if query.drafts {
            self.repository.list_drafts(user_id).await?
        } else {
            self.repository.list_projects(user_id).await?
        };
        tracing::debug!(count = records.len(), key = %cache_key, "fetched project list");

        // Newest first, undated records last
        records.sort_by(|a, b| {
            let a_at = a.created_at.or(a.updated_at);
            let b_at = b.created_at.or(b.updated_at);
            match (a_at, b_at) {
                (None, None) => std::cmp::Ordering::Equal,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (Some(_), None) => std::cmp::Ordering::Less,
                (Some(a_at), Some(b_at)) => b_at.cmp(&a_at),
            }
        });

        self.list_cache.insert(
            cache_key,
            CachedList {
                items: records.clone(),
                fetched_at: Utc::now(),
            },
        );

        Ok(records)
    }

    pub async fn get_project(&self, id: &ProjectId) -> AppResult<ProjectRecord> {
        Ok(self.repository.get_project(id).await?)
    }

    pub async fn get_draft(&self, id: &ProjectId, user_id: &UserId) -> AppResult<ProjectRecord> {
        Ok(self.repository.get_draft(id, user_id).await?)
    }

    pub async fn update_project(&self, record: &ProjectRecord) -> AppResult<()> {
        self.repository.update_project(record).await?;
        self.invalidate_lists();
        tracing::info!(id = %record.id, "project updated");
        Ok(())
    }

    pub async fn add_tag(&self, id: &ProjectId, tag: &str) -> AppResult<ProjectRecord> {
        let mut record = self.get_project(id).await?;
        if !record.draft.add_tag(tag) {
            return Err(AppError::Application(format!(
                "Tag {tag:?} is empty or already present"
            )));
        }
        self.update_project(&record).await?;
        Ok(record)
    }

    pub async fn remove_tag(&self, id: &ProjectId, tag: &str) -> AppResult<ProjectRecord> {
        let mut record = self.get_project(id).await?;
        if !record.draft.remove_tag(tag) {
            return Err(AppError::Application(format!("Project has no tag {tag:?}")));
        }
        self.update_project(&record).await?;
        Ok(record)
    }

    pub async fn set_status(
        &self,
        id: &ProjectId,
        status: ProjectStatus,
    ) -> AppResult<ProjectRecord> {
        let mut record = self.get_project(id).await?;
        record.draft.project_status = Some(status);
        self.update_project(&record).await?;
        Ok(record)
    }

    pub async fn upload_media(&self, files: Vec<PathBuf>) -> AppResult<MediaUpload> {
        if files.is_empty() {
            return Err(AppError::Application("No files to upload".to_string()));
        }
        Ok(self.repository.upload_media(files).await?)
    }

    pub fn invalidate_lists(&self) {
        self.list_cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockProjectRepository;
    use chrono::TimeZone;

    fn record(id: &str, name: &str, day: Option<u32>) -> ProjectRecord {
        ProjectRecord {
            id: ProjectId::from(id),
            draft: ProjectDraft {
                project_name: name.to_string(),
                project_type: Some(ProjectType::VideoProduction),
                project_status: Some(ProjectStatus::InProcess),
                tags: vec!["reels".to_string()],
                ..Default::default()
            },
            is_draft: false,
            created_at: day.map(|d| Utc.with_ymd_and_hms(2025, 1, d, 0, 0, 0).unwrap()),
            updated_at: None,
        }
    }

    fn query(page: usize, per_page: usize) -> ProjectQuery {
        ProjectQuery {
            page,
            per_page,
            ..Default::default()
        }
    }

    #[test]
    fn test_paginate_slices_and_counts() {
        let items: Vec<u32> = (1..=13).collect();
        let page = paginate(&items, 3, 6);
        assert_eq!(page.items, vec![13]);
        assert_eq!(page.total, 13);
        assert_eq!(page.page_count(), 3);

        let page = paginate(&items, 0, 6);
        assert_eq!(page.page, 1);
        assert_eq!(page.items.len(), 6);

        assert!(paginate(&items, 9, 6).items.is_empty());
    }

    #[tokio::test]
    async fn test_list_sorts_newest_first_and_caches() {
        let mut repo = MockProjectRepository::new();
        repo.expect_list_projects().times(1).returning(|_| {
            Ok(vec![
                record("a", "Old", Some(1)),
                record("b", "Undated", None),
                record("c", "New", Some(20)),
            ])
        });

        let service = ProjectService::new(Arc::new(repo), 300);
        let user = UserId::from("u-1");
        let page = service.list(&user, &query(1, 6), true).await.unwrap();
        let ids: Vec<&str> = page.items.iter().map(|s| s.id.0.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);

        // Served from cache, the mock allows a single fetch
        let page = service.list(&user, &query(1, 2), true).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.page_count(), 2);
    }

    #[tokio::test]
    async fn test_drafts_use_draft_endpoint_and_status() {
        let mut repo = MockProjectRepository::new();
        repo.expect_list_drafts().returning(|_| {
            let mut draft = record("d-1", "Half done", Some(3));
            draft.is_draft = true;
            Ok(vec![draft])
        });
        repo.expect_list_projects().never();

        let service = ProjectService::new(Arc::new(repo), 300);
        let query = ProjectQuery {
            drafts: true,
            status: Some("draft".to_string()),
            ..query(1, 6)
        };
        let page = service
            .list(&UserId::from("u-1"), &query, false)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].status, "Draft");
    }

    #[tokio::test]
    async fn test_search_matches_name_type_and_tags() {
        let mut repo = MockProjectRepository::new();
        repo.expect_list_projects().returning(|_| {
            let mut other = record("b", "Portraits", Some(2));
            other.draft.project_type = Some(ProjectType::PortraitPhotography);
            other.draft.tags.clear();
            Ok(vec![record("a", "Launch film", Some(1)), other])
        });

        let service = ProjectService::new(Arc::new(repo), 300);
        let user = UserId::from("u-1");
        for (search, expected) in [("LAUNCH", "a"), ("video", "a"), ("reel", "a"), ("portrait", "b")] {
            let query = ProjectQuery {
                search: Some(search.to_string()),
                ..query(1, 6)
            };
            let page = service.list(&user, &query, true).await.unwrap();
            assert_eq!(page.total, 1, "search {search}");
            assert_eq!(page.items[0].id.0, expected);
        }
    }

    #[tokio::test]
    async fn test_add_tag_updates_and_invalidates() {
        let mut repo = MockProjectRepository::new();
        repo.expect_get_project()
            .returning(|id| Ok(record(&id.0, "Shoot", Some(1))));
        repo.expect_update_project()
            .withf(|r| r.draft.tags == vec!["reels".to_string(), "summer".to_string()])
            .times(1)
            .returning(|_| Ok(()));

        let service = ProjectService::new(Arc::new(repo), 300);
        let updated = service
            .add_tag(&ProjectId::from("p-1"), " summer ")
            .await
            .unwrap();
        assert_eq!(updated.draft.tags.len(), 2);

        let err = service
            .add_tag(&ProjectId::from("p-1"), "reels")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Application(_)));
    }

    #[tokio::test]
    async fn test_set_status() {
        let mut repo = MockProjectRepository::new();
        repo.expect_get_project()
            .returning(|id| Ok(record(&id.0, "Shoot", Some(1))));
        repo.expect_update_project()
            .withf(|r| r.draft.project_status == Some(ProjectStatus::Completed))
            .times(1)
            .returning(|_| Ok(()));

        let service = ProjectService::new(Arc::new(repo), 300);
        service
            .set_status(&ProjectId::from("p-1"), ProjectStatus::Completed)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_upload_requires_files() {
        let service = ProjectService::new(Arc::new(MockProjectRepository::new()), 300);
        assert!(service.upload_media(Vec::new()).await.is_err());
    }
}
