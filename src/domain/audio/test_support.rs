//! In-memory collaborators for exercising the audio services without a
//! database or a real speech vendor.

use super::events::{AudioEvent, AudioEventSink};
use super::model::{AudioJob, AudioJobStatus, NewAudioJob};
use crate::domain::chapter::{Chapter, ChapterSummary, Paragraph};
use crate::error::{AppError, AppResult};
use crate::infrastructure::repositories::{
    AudioJobStore, ChapterRepository, SpeechProvider, SpeechProviderError, SpeechRequest,
    SynthesizedAudio,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryAudioJobStore {
    jobs: Mutex<Vec<AudioJob>>,
    history: Mutex<Vec<(Uuid, AudioJobStatus)>>,
    failing: AtomicBool,
}

impl InMemoryAudioJobStore {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn all(&self) -> Vec<AudioJob> {
        self.jobs.lock().clone()
    }

    pub fn get(&self, id: Uuid) -> Option<AudioJob> {
        self.jobs.lock().iter().find(|j| j.id() == id).cloned()
    }

    /// Statuses written for a job, in order
    pub fn status_history(&self, id: Uuid) -> Vec<AudioJobStatus> {
        self.history
            .lock()
            .iter()
            .filter(|(job_id, _)| *job_id == id)
            .map(|(_, status)| *status)
            .collect()
    }

    fn check(&self) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(AppError::Internal("store unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    fn save(&self, job: AudioJob) {
        self.history.lock().push((job.id(), job.status()));
        let mut jobs = self.jobs.lock();
        match jobs.iter_mut().find(|j| j.id() == job.id()) {
            Some(existing) => *existing = job,
            None => jobs.push(job),
        }
    }
}

#[async_trait]
impl AudioJobStore for InMemoryAudioJobStore {
    async fn find_existing(
        &self,
        chapter_id: Uuid,
        language: &str,
        voice: &str,
    ) -> AppResult<Option<AudioJob>> {
        self.check()?;
        Ok(self
            .jobs
            .lock()
            .iter()
            .rev()
            .find(|j| {
                j.is_completed()
                    && j.chapter_id() == chapter_id
                    && j.language() == language
                    && j.voice() == voice
            })
            .cloned())
    }

    async fn find_completed_by_chapter(&self, chapter_id: Uuid) -> AppResult<Option<AudioJob>> {
        self.check()?;
        Ok(self
            .jobs
            .lock()
            .iter()
            .rev()
            .find(|j| j.is_completed() && j.chapter_id() == chapter_id)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<AudioJob>> {
        self.check()?;
        Ok(self.get(id))
    }

    async fn list_by_chapter(&self, chapter_id: Uuid) -> AppResult<Vec<AudioJob>> {
        self.check()?;
        Ok(self
            .jobs
            .lock()
            .iter()
            .rev()
            .filter(|j| j.chapter_id() == chapter_id)
            .cloned()
            .collect())
    }

    async fn create(&self, job: NewAudioJob) -> AppResult<AudioJob> {
        self.check()?;
        let job = job.into_pending(Uuid::new_v4(), Utc::now());
        self.save(job.clone());
        Ok(job)
    }

    async fn update(&self, job: &AudioJob) -> AppResult<AudioJob> {
        self.check()?;
        self.save(job.clone());
        Ok(job.clone())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: AudioJobStatus,
        error_message: Option<&str>,
    ) -> AppResult<()> {
        self.check()?;
        let job = self
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("Audio job {}", id)))?;
        let now = Utc::now();
        let next = match status {
            AudioJobStatus::Processing => job.to_processing(now),
            AudioJobStatus::Failed => job.to_failed(error_message.unwrap_or_default(), now),
            other => {
                return Err(AppError::Internal(format!(
                    "status-only update to {} is not supported",
                    other
                )))
            }
        }
        .map_err(|e| AppError::Internal(e.to_string()))?;
        self.save(next);
        Ok(())
    }

    async fn increment_play_count(&self, id: Uuid, played_at: DateTime<Utc>) -> AppResult<bool> {
        self.check()?;
        let mut jobs = self.jobs.lock();
        let Some(slot) = jobs.iter_mut().find(|j| j.id() == id) else {
            return Ok(false);
        };
        match slot.clone().record_play(played_at) {
            Ok(played) => {
                *slot = played;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    async fn delete_by_chapter(&self, chapter_id: Uuid) -> AppResult<u64> {
        self.check()?;
        let mut jobs = self.jobs.lock();
        let before = jobs.len();
        jobs.retain(|j| j.chapter_id() != chapter_id);
        Ok((before - jobs.len()) as u64)
    }
}

#[derive(Default)]
pub struct InMemoryChapterRepository {
    chapters: Mutex<HashMap<Uuid, Chapter>>,
}

impl InMemoryChapterRepository {
    pub fn add_chapter(&self, book_id: Uuid, chapter_number: i32, paragraphs: &[&str]) -> Uuid {
        let id = Uuid::new_v4();
        let chapter = Chapter {
            id,
            book_id,
            title: format!("Chapter {}", chapter_number),
            chapter_number,
            paragraphs: to_paragraphs(paragraphs),
        };
        self.chapters.lock().insert(id, chapter);
        id
    }

    pub fn set_paragraphs(&self, chapter_id: Uuid, paragraphs: &[&str]) {
        if let Some(chapter) = self.chapters.lock().get_mut(&chapter_id) {
            chapter.paragraphs = to_paragraphs(paragraphs);
        }
    }
}

fn to_paragraphs(paragraphs: &[&str]) -> Vec<Paragraph> {
    paragraphs
        .iter()
        .enumerate()
        .map(|(i, content)| Paragraph {
            position: i as i32,
            content: content.to_string(),
        })
        .collect()
}

#[async_trait]
impl ChapterRepository for InMemoryChapterRepository {
    async fn find_by_id(&self, chapter_id: Uuid) -> AppResult<Option<Chapter>> {
        Ok(self.chapters.lock().get(&chapter_id).cloned())
    }

    async fn find_by_book(&self, book_id: Uuid) -> AppResult<Vec<ChapterSummary>> {
        let mut chapters: Vec<ChapterSummary> = self
            .chapters
            .lock()
            .values()
            .filter(|c| c.book_id == book_id)
            .map(|c| ChapterSummary {
                id: c.id,
                book_id: c.book_id,
                title: c.title.clone(),
                chapter_number: c.chapter_number,
            })
            .collect();
        chapters.sort_by_key(|c| c.chapter_number);
        Ok(chapters)
    }
}

/// Speech provider returning a fixed URL, with switchable failure and delay
pub struct StubSpeechProvider {
    audio_url: String,
    duration_seconds: f64,
    delay: Mutex<Option<Duration>>,
    failing: AtomicBool,
    fail_on_text: Mutex<Option<String>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requests: Mutex<Vec<SpeechRequest>>,
    store_to_break: Mutex<Option<Arc<InMemoryAudioJobStore>>>,
}

impl StubSpeechProvider {
    pub fn new(audio_url: &str, duration_seconds: f64) -> Self {
        Self {
            audio_url: audio_url.to_string(),
            duration_seconds,
            delay: Mutex::new(None),
            failing: AtomicBool::new(false),
            fail_on_text: Mutex::new(None),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            store_to_break: Mutex::new(None),
        }
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock() = Some(delay);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn fail_when_text_contains(&self, marker: &str) {
        *self.fail_on_text.lock() = Some(marker.to_string());
    }

    /// Make the store start failing while a synthesis is in flight
    pub fn break_store_during_call(&self, store: Arc<InMemoryAudioJobStore>) {
        *self.store_to_break.lock() = Some(store);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<SpeechRequest> {
        self.requests.lock().clone()
    }
}

impl Default for StubSpeechProvider {
    fn default() -> Self {
        Self::new("https://x/y.mp3", 12.3)
    }
}

#[async_trait]
impl SpeechProvider for StubSpeechProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn synthesize(
        &self,
        text: &str,
        request: &SpeechRequest,
    ) -> Result<SynthesizedAudio, SpeechProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(store) = self.store_to_break.lock().as_ref() {
            store.set_failing(true);
        }

        let marker = self.fail_on_text.lock().clone();
        let fails_on_text = marker.is_some_and(|m| text.contains(&m));
        if self.failing.load(Ordering::SeqCst) || fails_on_text {
            return Err(SpeechProviderError::Vendor("stub provider failure".to_string()));
        }

        Ok(SynthesizedAudio {
            audio_url: self.audio_url.clone(),
            duration_seconds: self.duration_seconds,
        })
    }
}

#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<AudioEvent>>,
}

impl RecordingEventSink {
    pub fn events(&self) -> Vec<AudioEvent> {
        self.events.lock().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(|e| e.name()).collect()
    }
}

impl AudioEventSink for RecordingEventSink {
    fn publish(&self, event: &AudioEvent) {
        self.events.lock().push(event.clone());
    }
}
