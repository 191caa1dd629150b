use super::dto::{ChapterAudioOutcome, GenerateAudioOptions};
use super::error::AudioServiceError;
use super::service::{parse_id, ChapterAudioServiceApi};
use crate::infrastructure::repositories::ChapterRepository;
use futures::stream::{self, StreamExt};
use std::sync::Arc;

pub const DEFAULT_BATCH_CONCURRENCY: usize = 3;
pub const MAX_BATCH_CONCURRENCY: usize = 5;

/// Generates audio for every chapter of a book with bounded parallelism.
pub struct BookAudioService {
    chapter_repo: Arc<dyn ChapterRepository>,
    chapter_audio: Arc<dyn ChapterAudioServiceApi>,
    concurrency: usize,
}

impl BookAudioService {
    pub fn new(
        chapter_repo: Arc<dyn ChapterRepository>,
        chapter_audio: Arc<dyn ChapterAudioServiceApi>,
        concurrency: usize,
    ) -> Self {
        Self {
            chapter_repo,
            chapter_audio,
            concurrency: concurrency.clamp(1, MAX_BATCH_CONCURRENCY),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run chapter generation for each chapter of the book, ordered by
    /// chapter number. One chapter failing does not stop the others; every
    /// chapter gets an outcome, in chapter order.
    pub async fn generate_for_book(
        &self,
        book_id: &str,
        options: GenerateAudioOptions,
    ) -> Result<Vec<ChapterAudioOutcome>, AudioServiceError> {
        let book_id = parse_id(book_id, "book")?;
        let chapters = self.chapter_repo.find_by_book(book_id).await?;

        tracing::info!(
            book_id = %book_id,
            chapter_count = chapters.len(),
            concurrency = self.concurrency,
            "Book audio generation started"
        );

        let outcomes: Vec<ChapterAudioOutcome> = stream::iter(chapters)
            .map(|chapter| {
                let options = options.clone();
                async move {
                    let result = self
                        .chapter_audio
                        .generate_chapter_audio(&chapter.id.to_string(), options)
                        .await;
                    if let Err(e) = &result {
                        tracing::warn!(
                            book_id = %book_id,
                            chapter_id = %chapter.id,
                            chapter_number = chapter.chapter_number,
                            error = %e,
                            "Chapter audio failed during book generation"
                        );
                    }
                    ChapterAudioOutcome {
                        chapter_id: chapter.id,
                        result,
                    }
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        tracing::info!(
            book_id = %book_id,
            succeeded = succeeded,
            failed = outcomes.len() - succeeded,
            "Book audio generation finished"
        );

        Ok(outcomes)
    }
}
