use crate::domain::chapter::{Chapter, ChapterSummary, Paragraph};
use crate::error::AppResult;
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Read access to chapters owned by the reading platform
#[async_trait]
pub trait ChapterRepository: Send + Sync {
    /// Chapter with its paragraphs in stored order
    async fn find_by_id(&self, chapter_id: Uuid) -> AppResult<Option<Chapter>>;

    /// Chapters of a book in reading order, without paragraphs
    async fn find_by_book(&self, book_id: Uuid) -> AppResult<Vec<ChapterSummary>>;
}

pub struct PgChapterRepository {
    pool: Arc<DbPool>,
}

impl PgChapterRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChapterRepository for PgChapterRepository {
    async fn find_by_id(&self, chapter_id: Uuid) -> AppResult<Option<Chapter>> {
        let pool = self.pool.as_ref();
        let summary = sqlx::query_as::<_, ChapterSummary>(
            r#"
            SELECT id, book_id, title, chapter_number
            FROM chapters
            WHERE id = $1
            "#,
        )
        .bind(chapter_id)
        .fetch_optional(pool)
        .await?;

        let Some(summary) = summary else {
            return Ok(None);
        };

        let paragraphs = sqlx::query_as::<_, Paragraph>(
            r#"
            SELECT position, content
            FROM chapter_paragraphs
            WHERE chapter_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(chapter_id)
        .fetch_all(pool)
        .await?;

        Ok(Some(Chapter {
            id: summary.id,
            book_id: summary.book_id,
            title: summary.title,
            chapter_number: summary.chapter_number,
            paragraphs,
        }))
    }

    async fn find_by_book(&self, book_id: Uuid) -> AppResult<Vec<ChapterSummary>> {
        let pool = self.pool.as_ref();
        let chapters = sqlx::query_as::<_, ChapterSummary>(
            r#"
            SELECT id, book_id, title, chapter_number
            FROM chapters
            WHERE book_id = $1
            ORDER BY chapter_number ASC, created_at ASC
            "#,
        )
        .bind(book_id)
        .fetch_all(pool)
        .await?;

        Ok(chapters)
    }
}
