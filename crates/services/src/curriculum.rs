use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use exam_core::Clock;
use exam_core::model::{
    Chapter, ChapterDraft, ChapterId, Topic, TopicDraft, TopicId, ValidatedChapter, ValidatedTopic,
};

use crate::error::CurriculumApiError;

/// Write/read boundary to the curriculum backend.
///
/// The front-end is thin data-binding over this API; drafts are validated in
/// core before anything crosses the boundary.
#[async_trait]
pub trait CurriculumApi: Send + Sync {
    async fn list_chapters(&self) -> Result<Vec<Chapter>, CurriculumApiError>;
    async fn create_chapter(
        &self,
        fields: &ValidatedChapter,
    ) -> Result<Chapter, CurriculumApiError>;
    async fn rename_chapter(
        &self,
        id: ChapterId,
        fields: &ValidatedChapter,
    ) -> Result<Chapter, CurriculumApiError>;
    async fn delete_chapter(&self, id: ChapterId) -> Result<(), CurriculumApiError>;

    async fn list_topics(&self, chapter: ChapterId) -> Result<Vec<Topic>, CurriculumApiError>;
    async fn create_topic(
        &self,
        chapter: ChapterId,
        fields: &ValidatedTopic,
    ) -> Result<Topic, CurriculumApiError>;
    async fn delete_topic(&self, id: TopicId) -> Result<(), CurriculumApiError>;
}

/// Validating passthrough used by the curriculum views.
#[derive(Clone)]
pub struct CurriculumService {
    api: Arc<dyn CurriculumApi>,
}

impl CurriculumService {
    #[must_use]
    pub fn new(api: Arc<dyn CurriculumApi>) -> Self {
        Self { api }
    }

    /// # Errors
    ///
    /// Returns `CurriculumApiError` for transport failures.
    pub async fn list_chapters(&self) -> Result<Vec<Chapter>, CurriculumApiError> {
        self.api.list_chapters().await
    }

    /// # Errors
    ///
    /// Returns `CurriculumApiError::Validation` for a bad draft and
    /// transport errors otherwise.
    pub async fn create_chapter(&self, draft: ChapterDraft) -> Result<Chapter, CurriculumApiError> {
        let fields = draft.validate()?;
        self.api.create_chapter(&fields).await
    }

    /// # Errors
    ///
    /// Returns `CurriculumApiError::Validation` for a bad draft and
    /// transport errors otherwise.
    pub async fn rename_chapter(
        &self,
        id: ChapterId,
        draft: ChapterDraft,
    ) -> Result<Chapter, CurriculumApiError> {
        let fields = draft.validate()?;
        self.api.rename_chapter(id, &fields).await
    }

    /// # Errors
    ///
    /// Returns `CurriculumApiError` for transport failures.
    pub async fn delete_chapter(&self, id: ChapterId) -> Result<(), CurriculumApiError> {
        self.api.delete_chapter(id).await
    }

    /// # Errors
    ///
    /// Returns `CurriculumApiError` for transport failures.
    pub async fn list_topics(&self, chapter: ChapterId) -> Result<Vec<Topic>, CurriculumApiError> {
        self.api.list_topics(chapter).await
    }

    /// # Errors
    ///
    /// Returns `CurriculumApiError::Validation` for a bad draft and
    /// transport errors otherwise.
    pub async fn create_topic(
        &self,
        chapter: ChapterId,
        draft: TopicDraft,
    ) -> Result<Topic, CurriculumApiError> {
        let fields = draft.validate()?;
        self.api.create_topic(chapter, &fields).await
    }

    /// # Errors
    ///
    /// Returns `CurriculumApiError` for transport failures.
    pub async fn delete_topic(&self, id: TopicId) -> Result<(), CurriculumApiError> {
        self.api.delete_topic(id).await
    }
}

//
// ─── HTTP API ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChapterWriteDto<'a> {
    title: &'a str,
    description: Option<&'a str>,
    position: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TopicWriteDto<'a> {
    title: &'a str,
    position: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChapterDto {
    id: u64,
    title: String,
    description: Option<String>,
    position: u32,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl ChapterDto {
    fn into_domain(self) -> Result<Chapter, CurriculumApiError> {
        Ok(Chapter::from_persisted(
            ChapterId::new(self.id),
            self.title,
            self.description.as_deref(),
            self.position,
            self.created_at,
            self.updated_at,
        )?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopicDto {
    id: u64,
    chapter_id: u64,
    title: String,
    position: u32,
}

impl TopicDto {
    fn into_domain(self) -> Result<Topic, CurriculumApiError> {
        Ok(Topic::from_persisted(
            TopicId::new(self.id),
            ChapterId::new(self.chapter_id),
            self.title,
            self.position,
        )?)
    }
}

#[derive(Clone)]
pub struct HttpCurriculumApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpCurriculumApi {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn check(
        response: reqwest::Response,
        missing: CurriculumApiError,
    ) -> Result<reqwest::Response, CurriculumApiError> {
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(missing);
        }
        if !response.status().is_success() {
            return Err(CurriculumApiError::HttpStatus(response.status()));
        }
        Ok(response)
    }
}

#[async_trait]
impl CurriculumApi for HttpCurriculumApi {
    async fn list_chapters(&self) -> Result<Vec<Chapter>, CurriculumApiError> {
        let url = format!("{}/chapters", self.base_url);
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(CurriculumApiError::HttpStatus(response.status()));
        }
        let dtos: Vec<ChapterDto> = response.json().await?;
        dtos.into_iter().map(ChapterDto::into_domain).collect()
    }

    async fn create_chapter(
        &self,
        fields: &ValidatedChapter,
    ) -> Result<Chapter, CurriculumApiError> {
        let url = format!("{}/chapters", self.base_url);
        let body = ChapterWriteDto {
            title: &fields.title,
            description: fields.description.as_deref(),
            position: fields.position,
        };
        let response = self.http.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(CurriculumApiError::HttpStatus(response.status()));
        }
        let dto: ChapterDto = response.json().await?;
        dto.into_domain()
    }

    async fn rename_chapter(
        &self,
        id: ChapterId,
        fields: &ValidatedChapter,
    ) -> Result<Chapter, CurriculumApiError> {
        let url = format!("{}/chapters/{}", self.base_url, id);
        let body = ChapterWriteDto {
            title: &fields.title,
            description: fields.description.as_deref(),
            position: fields.position,
        };
        let response = Self::check(
            self.http.put(&url).json(&body).send().await?,
            CurriculumApiError::ChapterNotFound,
        )?;
        let dto: ChapterDto = response.json().await?;
        dto.into_domain()
    }

    async fn delete_chapter(&self, id: ChapterId) -> Result<(), CurriculumApiError> {
        let url = format!("{}/chapters/{}", self.base_url, id);
        Self::check(
            self.http.delete(&url).send().await?,
            CurriculumApiError::ChapterNotFound,
        )?;
        Ok(())
    }

    async fn list_topics(&self, chapter: ChapterId) -> Result<Vec<Topic>, CurriculumApiError> {
        let url = format!("{}/chapters/{}/topics", self.base_url, chapter);
        let response = Self::check(
            self.http.get(&url).send().await?,
            CurriculumApiError::ChapterNotFound,
        )?;
        let dtos: Vec<TopicDto> = response.json().await?;
        dtos.into_iter().map(TopicDto::into_domain).collect()
    }

    async fn create_topic(
        &self,
        chapter: ChapterId,
        fields: &ValidatedTopic,
    ) -> Result<Topic, CurriculumApiError> {
        let url = format!("{}/chapters/{}/topics", self.base_url, chapter);
        let body = TopicWriteDto {
            title: &fields.title,
            position: fields.position,
        };
        let response = Self::check(
            self.http.post(&url).json(&body).send().await?,
            CurriculumApiError::ChapterNotFound,
        )?;
        let dto: TopicDto = response.json().await?;
        dto.into_domain()
    }

    async fn delete_topic(&self, id: TopicId) -> Result<(), CurriculumApiError> {
        let url = format!("{}/topics/{}", self.base_url, id);
        Self::check(
            self.http.delete(&url).send().await?,
            CurriculumApiError::TopicNotFound,
        )?;
        Ok(())
    }
}

//
// ─── IN-MEMORY API ─────────────────────────────────────────────────────────────
//

/// Backend-free implementation for demos and tests.
pub struct InMemoryCurriculumApi {
    clock: Clock,
    next_id: AtomicU64,
    chapters: RwLock<BTreeMap<u64, Chapter>>,
    topics: RwLock<BTreeMap<u64, Topic>>,
}

impl InMemoryCurriculumApi {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            next_id: AtomicU64::new(1),
            chapters: RwLock::new(BTreeMap::new()),
            topics: RwLock::new(BTreeMap::new()),
        }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl CurriculumApi for InMemoryCurriculumApi {
    async fn list_chapters(&self) -> Result<Vec<Chapter>, CurriculumApiError> {
        let chapters = self.chapters.read().await;
        let mut rows: Vec<Chapter> = chapters.values().cloned().collect();
        rows.sort_by_key(Chapter::position);
        Ok(rows)
    }

    async fn create_chapter(
        &self,
        fields: &ValidatedChapter,
    ) -> Result<Chapter, CurriculumApiError> {
        let now = self.clock.now();
        let id = self.next_id();
        let chapter = Chapter::from_persisted(
            ChapterId::new(id),
            &fields.title,
            fields.description.as_deref(),
            fields.position,
            now,
            now,
        )?;
        self.chapters.write().await.insert(id, chapter.clone());
        Ok(chapter)
    }

    async fn rename_chapter(
        &self,
        id: ChapterId,
        fields: &ValidatedChapter,
    ) -> Result<Chapter, CurriculumApiError> {
        let mut chapters = self.chapters.write().await;
        let existing = chapters
            .get(&id.value())
            .ok_or(CurriculumApiError::ChapterNotFound)?;
        let updated = Chapter::from_persisted(
            id,
            &fields.title,
            fields.description.as_deref(),
            fields.position,
            existing.created_at(),
            self.clock.now(),
        )?;
        chapters.insert(id.value(), updated.clone());
        Ok(updated)
    }

    async fn delete_chapter(&self, id: ChapterId) -> Result<(), CurriculumApiError> {
        self.chapters
            .write()
            .await
            .remove(&id.value())
            .ok_or(CurriculumApiError::ChapterNotFound)?;
        self.topics
            .write()
            .await
            .retain(|_, topic| topic.chapter_id() != id);
        Ok(())
    }

    async fn list_topics(&self, chapter: ChapterId) -> Result<Vec<Topic>, CurriculumApiError> {
        if !self.chapters.read().await.contains_key(&chapter.value()) {
            return Err(CurriculumApiError::ChapterNotFound);
        }
        let topics = self.topics.read().await;
        let mut rows: Vec<Topic> = topics
            .values()
            .filter(|topic| topic.chapter_id() == chapter)
            .cloned()
            .collect();
        rows.sort_by_key(Topic::position);
        Ok(rows)
    }

    async fn create_topic(
        &self,
        chapter: ChapterId,
        fields: &ValidatedTopic,
    ) -> Result<Topic, CurriculumApiError> {
        if !self.chapters.read().await.contains_key(&chapter.value()) {
            return Err(CurriculumApiError::ChapterNotFound);
        }
        let id = self.next_id();
        let topic = Topic::from_persisted(TopicId::new(id), chapter, &fields.title, fields.position)?;
        self.topics.write().await.insert(id, topic.clone());
        Ok(topic)
    }

    async fn delete_topic(&self, id: TopicId) -> Result<(), CurriculumApiError> {
        self.topics
            .write()
            .await
            .remove(&id.value())
            .ok_or(CurriculumApiError::TopicNotFound)?;
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
