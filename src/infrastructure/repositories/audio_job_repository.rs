use crate::domain::audio::{AudioJob, AudioJobRecord, AudioJobStatus, NewAudioJob};
use crate::error::{AppError, AppResult};
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Persistence of chapter audio jobs.
///
/// Uniqueness of completed jobs per (chapter, language, voice) is not enforced
/// here; the audio service checks for an existing job before creating one.
#[async_trait]
pub trait AudioJobStore: Send + Sync {
    /// Newest completed job matching all three keys exactly
    async fn find_existing(
        &self,
        chapter_id: Uuid,
        language: &str,
        voice: &str,
    ) -> AppResult<Option<AudioJob>>;

    /// Newest completed job for a chapter, whatever its language or voice
    async fn find_completed_by_chapter(&self, chapter_id: Uuid) -> AppResult<Option<AudioJob>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<AudioJob>>;

    /// Every job of a chapter, newest first
    async fn list_by_chapter(&self, chapter_id: Uuid) -> AppResult<Vec<AudioJob>>;

    /// Persist a new pending job, assigning its id
    async fn create(&self, job: NewAudioJob) -> AppResult<AudioJob>;

    /// Replace the stored job with the given value (inserting it if missing)
    async fn update(&self, job: &AudioJob) -> AppResult<AudioJob>;

    /// Change only the status (and error message) of a job
    async fn update_status(
        &self,
        id: Uuid,
        status: AudioJobStatus,
        error_message: Option<&str>,
    ) -> AppResult<()>;

    /// Atomically add one play to a completed job. Returns false when no
    /// completed job has this id.
    async fn increment_play_count(&self, id: Uuid, played_at: DateTime<Utc>) -> AppResult<bool>;

    /// Remove every job of a chapter, returning how many were removed
    async fn delete_by_chapter(&self, chapter_id: Uuid) -> AppResult<u64>;
}

const JOB_COLUMNS: &str = r#"
    id, chapter_id, book_id, text, voice, language, speed,
    character_count, paragraph_count, audio_url, audio_format, audio_duration,
    status, error_message, play_count, last_played_at,
    created_at, updated_at, processed_at
"#;

pub struct PgAudioJobRepository {
    pool: Arc<DbPool>,
}

impl PgAudioJobRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    fn into_job(record: AudioJobRecord) -> AppResult<AudioJob> {
        AudioJob::try_from(record).map_err(|e| {
            tracing::error!(error = %e, "Stored audio job is inconsistent");
            AppError::Internal(e.to_string())
        })
    }

    fn into_jobs(records: Vec<AudioJobRecord>) -> AppResult<Vec<AudioJob>> {
        records.into_iter().map(Self::into_job).collect()
    }
}

#[async_trait]
impl AudioJobStore for PgAudioJobRepository {
    async fn find_existing(
        &self,
        chapter_id: Uuid,
        language: &str,
        voice: &str,
    ) -> AppResult<Option<AudioJob>> {
        let pool = self.pool.as_ref();
        let record = sqlx::query_as::<_, AudioJobRecord>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM chapter_audio_jobs
            WHERE chapter_id = $1 AND language = $2 AND voice = $3 AND status = $4
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(chapter_id)
        .bind(language)
        .bind(voice)
        .bind(AudioJobStatus::Completed)
        .fetch_optional(pool)
        .await?;

        record.map(Self::into_job).transpose()
    }

    async fn find_completed_by_chapter(&self, chapter_id: Uuid) -> AppResult<Option<AudioJob>> {
        let pool = self.pool.as_ref();
        let record = sqlx::query_as::<_, AudioJobRecord>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM chapter_audio_jobs
            WHERE chapter_id = $1 AND status = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(chapter_id)
        .bind(AudioJobStatus::Completed)
        .fetch_optional(pool)
        .await?;

        record.map(Self::into_job).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<AudioJob>> {
        let pool = self.pool.as_ref();
        let record = sqlx::query_as::<_, AudioJobRecord>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM chapter_audio_jobs
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        record.map(Self::into_job).transpose()
    }

    async fn list_by_chapter(&self, chapter_id: Uuid) -> AppResult<Vec<AudioJob>> {
        let pool = self.pool.as_ref();
        let records = sqlx::query_as::<_, AudioJobRecord>(&format!(
            r#"
            SELECT {JOB_COLUMNS}
            FROM chapter_audio_jobs
            WHERE chapter_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(chapter_id)
        .fetch_all(pool)
        .await?;

        Self::into_jobs(records)
    }

    async fn create(&self, job: NewAudioJob) -> AppResult<AudioJob> {
        let pool = self.pool.as_ref();
        let job = job.into_pending(Uuid::new_v4(), Utc::now());

        let record = sqlx::query_as::<_, AudioJobRecord>(&format!(
            r#"
            INSERT INTO chapter_audio_jobs (
                id, chapter_id, book_id, text, voice, language, speed,
                character_count, paragraph_count, status, play_count,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 0, $11, $11)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job.id())
        .bind(job.chapter_id())
        .bind(job.book_id())
        .bind(job.text())
        .bind(job.voice())
        .bind(job.language())
        .bind(job.speed())
        .bind(job.character_count())
        .bind(job.paragraph_count())
        .bind(job.status())
        .bind(job.created_at())
        .fetch_one(pool)
        .await?;

        Self::into_job(record)
    }

    async fn update(&self, job: &AudioJob) -> AppResult<AudioJob> {
        let pool = self.pool.as_ref();
        let record = sqlx::query_as::<_, AudioJobRecord>(&format!(
            r#"
            INSERT INTO chapter_audio_jobs (
                id, chapter_id, book_id, text, voice, language, speed,
                character_count, paragraph_count, audio_url, audio_format, audio_duration,
                status, error_message, play_count, last_played_at,
                created_at, updated_at, processed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            ON CONFLICT (id)
            DO UPDATE SET
                chapter_id = EXCLUDED.chapter_id,
                book_id = EXCLUDED.book_id,
                text = EXCLUDED.text,
                voice = EXCLUDED.voice,
                language = EXCLUDED.language,
                speed = EXCLUDED.speed,
                character_count = EXCLUDED.character_count,
                paragraph_count = EXCLUDED.paragraph_count,
                audio_url = EXCLUDED.audio_url,
                audio_format = EXCLUDED.audio_format,
                audio_duration = EXCLUDED.audio_duration,
                status = EXCLUDED.status,
                error_message = EXCLUDED.error_message,
                play_count = EXCLUDED.play_count,
                last_played_at = EXCLUDED.last_played_at,
                updated_at = EXCLUDED.updated_at,
                processed_at = EXCLUDED.processed_at
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job.id())
        .bind(job.chapter_id())
        .bind(job.book_id())
        .bind(job.text())
        .bind(job.voice())
        .bind(job.language())
        .bind(job.speed())
        .bind(job.character_count())
        .bind(job.paragraph_count())
        .bind(job.audio_url())
        .bind(job.audio_format())
        .bind(job.audio_duration())
        .bind(job.status())
        .bind(job.error_message())
        .bind(job.play_count())
        .bind(job.last_played_at())
        .bind(job.created_at())
        .bind(Utc::now())
        .bind(job.processed_at())
        .fetch_one(pool)
        .await?;

        Self::into_job(record)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: AudioJobStatus,
        error_message: Option<&str>,
    ) -> AppResult<()> {
        let pool = self.pool.as_ref();
        let now = Utc::now();
        let processed_at = status.is_terminal().then_some(now);

        let result = sqlx::query(
            r#"
            UPDATE chapter_audio_jobs
            SET status = $2,
                error_message = $3,
                processed_at = COALESCE($4, processed_at),
                updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(error_message)
        .bind(processed_at)
        .bind(now)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Audio job {}", id)));
        }

        Ok(())
    }

    async fn increment_play_count(&self, id: Uuid, played_at: DateTime<Utc>) -> AppResult<bool> {
        let pool = self.pool.as_ref();
        let result = sqlx::query(
            r#"
            UPDATE chapter_audio_jobs
            SET play_count = play_count + 1,
                last_played_at = $2,
                updated_at = $2
            WHERE id = $1 AND status = $3
            "#,
        )
        .bind(id)
        .bind(played_at)
        .bind(AudioJobStatus::Completed)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_chapter(&self, chapter_id: Uuid) -> AppResult<u64> {
        let pool = self.pool.as_ref();
        let result = sqlx::query(
            r#"
            DELETE FROM chapter_audio_jobs
            WHERE chapter_id = $1
            "#,
        )
        .bind(chapter_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
