use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::{
    domain::audio::{
        service::parse_id, AudioJobResponse, BookAudioResponse, BookAudioService,
        ChapterAudioServiceApi, GenerateAudioOptions,
    },
    error::{AppError, AppResult},
};

pub struct AudioController {
    chapter_audio: Arc<dyn ChapterAudioServiceApi>,
    book_audio: Arc<BookAudioService>,
}

impl AudioController {
    pub fn new(
        chapter_audio: Arc<dyn ChapterAudioServiceApi>,
        book_audio: Arc<BookAudioService>,
    ) -> Self {
        Self {
            chapter_audio,
            book_audio,
        }
    }

    /// POST /api/chapters/{chapterId}/audio - Generate (or reuse) chapter audio
    pub async fn generate_chapter_audio(
        State(controller): State<Arc<AudioController>>,
        Path(chapter_id): Path<String>,
        body: Bytes,
    ) -> AppResult<Json<AudioJobResponse>> {
        let options = parse_options(&body)?;
        let job = controller
            .chapter_audio
            .generate_chapter_audio(&chapter_id, options)
            .await?;
        Ok(Json(job.into()))
    }

    /// GET /api/chapters/{chapterId}/audio - Current completed audio
    pub async fn get_chapter_audio(
        State(controller): State<Arc<AudioController>>,
        Path(chapter_id): Path<String>,
    ) -> AppResult<Json<AudioJobResponse>> {
        let job = controller
            .chapter_audio
            .get_chapter_audio(&chapter_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Audio for chapter {}", chapter_id)))?;
        Ok(Json(job.into()))
    }

    /// GET /api/chapters/{chapterId}/audio/jobs - Every job, newest first
    pub async fn list_chapter_audio_jobs(
        State(controller): State<Arc<AudioController>>,
        Path(chapter_id): Path<String>,
    ) -> AppResult<Json<Vec<AudioJobResponse>>> {
        let jobs = controller
            .chapter_audio
            .list_chapter_audio_jobs(&chapter_id)
            .await?;
        Ok(Json(jobs.into_iter().map(Into::into).collect()))
    }

    /// DELETE /api/chapters/{chapterId}/audio - Remove all audio jobs
    pub async fn delete_chapter_audio(
        State(controller): State<Arc<AudioController>>,
        Path(chapter_id): Path<String>,
    ) -> AppResult<StatusCode> {
        controller
            .chapter_audio
            .delete_chapter_audio(&chapter_id)
            .await?;
        Ok(StatusCode::NO_CONTENT)
    }

    /// POST /api/chapters/{chapterId}/audio/play - Count a playback
    pub async fn record_play(
        State(controller): State<Arc<AudioController>>,
        Path(chapter_id): Path<String>,
    ) -> AppResult<StatusCode> {
        controller
            .chapter_audio
            .increment_play_count(&chapter_id)
            .await?;
        Ok(StatusCode::NO_CONTENT)
    }

    /// POST /api/books/{bookId}/audio - Generate audio for every chapter
    pub async fn generate_book_audio(
        State(controller): State<Arc<AudioController>>,
        Path(book_id): Path<String>,
        body: Bytes,
    ) -> AppResult<Json<BookAudioResponse>> {
        let options = parse_options(&body)?;
        let outcomes = controller
            .book_audio
            .generate_for_book(&book_id, options)
            .await?;
        let book_id = parse_id(&book_id, "book")?;
        Ok(Json(BookAudioResponse::new(book_id, outcomes)))
    }
}

/// The request body is optional; an empty body means default options
fn parse_options(body: &[u8]) -> AppResult<GenerateAudioOptions> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(GenerateAudioOptions::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))
}
