use crate::e2e::helpers;

use chapter_audio_backend::domain::audio::{
    AudioFormat, AudioJobStatus, AudioOutput, NewAudioJob,
};
use chapter_audio_backend::infrastructure::repositories::{
    AudioJobStore, ChapterRepository, PgAudioJobRepository, PgChapterRepository,
};
use chrono::Utc;
use helpers::StoreContext;
use pretty_assertions::assert_eq;
use test_context::test_context;
use uuid::Uuid;

fn new_job(chapter_id: Uuid, voice: &str) -> NewAudioJob {
    NewAudioJob::new(
        chapter_id,
        Uuid::new_v4(),
        "Xin chào.\n\nHôm nay trời đẹp.".to_string(),
        2,
        voice,
        "vi-VN",
        1.0,
    )
}

fn output() -> AudioOutput {
    AudioOutput {
        url: "https://x/y.mp3".to_string(),
        format: AudioFormat::Mp3,
        duration_seconds: 12.3,
    }
}

#[test_context(StoreContext)]
#[tokio::test]
async fn it_should_persist_the_job_lifecycle(ctx: &StoreContext) {
    let repo = PgAudioJobRepository::new(ctx.pool.clone());
    let chapter_id = Uuid::new_v4();

    let job = repo.create(new_job(chapter_id, "vi-VN-Standard")).await.unwrap();
    assert_eq!(job.status(), AudioJobStatus::Pending);
    assert_eq!(job.character_count(), 28);

    repo.update_status(job.id(), AudioJobStatus::Processing, None)
        .await
        .unwrap();
    let processing = repo.find_by_id(job.id()).await.unwrap().unwrap();
    assert_eq!(processing.status(), AudioJobStatus::Processing);

    let completed = processing.to_completed(output(), Utc::now()).unwrap();
    let stored = repo.update(&completed).await.unwrap();
    assert_eq!(stored.status(), AudioJobStatus::Completed);
    assert_eq!(stored.audio_url(), Some("https://x/y.mp3"));
    assert_eq!(stored.audio_duration(), Some(12.3));
    assert!(stored.processed_at().is_some());

    let found = repo
        .find_existing(chapter_id, "vi-VN", "vi-VN-Standard")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id(), job.id());
    assert_eq!(found.text(), "Xin chào.\n\nHôm nay trời đẹp.");
}

#[test_context(StoreContext)]
#[tokio::test]
async fn it_should_only_match_completed_jobs_with_the_same_key(ctx: &StoreContext) {
    let repo = PgAudioJobRepository::new(ctx.pool.clone());
    let chapter_id = Uuid::new_v4();

    let pending = repo.create(new_job(chapter_id, "vi-VN-Standard")).await.unwrap();
    assert!(repo
        .find_existing(chapter_id, "vi-VN", "vi-VN-Standard")
        .await
        .unwrap()
        .is_none());

    let failed = pending.to_failed("vendor down", Utc::now()).unwrap();
    repo.update(&failed).await.unwrap();
    assert!(repo
        .find_existing(chapter_id, "vi-VN", "vi-VN-Standard")
        .await
        .unwrap()
        .is_none());

    let other_voice = repo.create(new_job(chapter_id, "nova")).await.unwrap();
    let other_voice = other_voice
        .to_processing(Utc::now())
        .and_then(|j| j.to_completed(output(), Utc::now()))
        .unwrap();
    repo.update(&other_voice).await.unwrap();

    assert!(repo
        .find_existing(chapter_id, "vi-VN", "vi-VN-Standard")
        .await
        .unwrap()
        .is_none());
    let current = repo.find_completed_by_chapter(chapter_id).await.unwrap();
    assert_eq!(current.map(|j| j.id()), Some(other_voice.id()));

    let jobs = repo.list_by_chapter(chapter_id).await.unwrap();
    assert_eq!(jobs.len(), 2);
}

#[test_context(StoreContext)]
#[tokio::test]
async fn it_should_increment_play_count_atomically(ctx: &StoreContext) {
    let repo = std::sync::Arc::new(PgAudioJobRepository::new(ctx.pool.clone()));
    let chapter_id = Uuid::new_v4();
    let job = repo
        .create(new_job(chapter_id, "vi-VN-Standard"))
        .await
        .unwrap()
        .to_processing(Utc::now())
        .and_then(|j| j.to_completed(output(), Utc::now()))
        .unwrap();
    repo.update(&job).await.unwrap();

    let plays = (0..10).map(|_| {
        let repo = repo.clone();
        let id = job.id();
        async move { repo.increment_play_count(id, Utc::now()).await }
    });
    let results = futures::future::join_all(plays).await;
    assert!(results.into_iter().all(|r| r.unwrap()));

    let played = repo.find_by_id(job.id()).await.unwrap().unwrap();
    assert_eq!(played.play_count(), 10);
    assert!(played.last_played_at().is_some());
}

#[test_context(StoreContext)]
#[tokio::test]
async fn it_should_not_count_plays_of_unfinished_jobs(ctx: &StoreContext) {
    let repo = PgAudioJobRepository::new(ctx.pool.clone());
    let job = repo
        .create(new_job(Uuid::new_v4(), "vi-VN-Standard"))
        .await
        .unwrap();

    assert!(!repo.increment_play_count(job.id(), Utc::now()).await.unwrap());
}

#[test_context(StoreContext)]
#[tokio::test]
async fn it_should_delete_all_jobs_of_a_chapter(ctx: &StoreContext) {
    let repo = PgAudioJobRepository::new(ctx.pool.clone());
    let chapter_id = Uuid::new_v4();
    let kept = repo
        .create(new_job(Uuid::new_v4(), "vi-VN-Standard"))
        .await
        .unwrap();
    repo.create(new_job(chapter_id, "vi-VN-Standard")).await.unwrap();
    repo.create(new_job(chapter_id, "nova")).await.unwrap();

    assert_eq!(repo.delete_by_chapter(chapter_id).await.unwrap(), 2);
    assert!(repo.list_by_chapter(chapter_id).await.unwrap().is_empty());
    assert!(repo.find_by_id(kept.id()).await.unwrap().is_some());
}

#[test_context(StoreContext)]
#[tokio::test]
async fn it_should_reject_status_updates_for_missing_jobs(ctx: &StoreContext) {
    let repo = PgAudioJobRepository::new(ctx.pool.clone());

    let result = repo
        .update_status(Uuid::new_v4(), AudioJobStatus::Processing, None)
        .await;

    assert!(result.is_err());
}

#[test_context(StoreContext)]
#[tokio::test]
async fn it_should_load_chapters_in_order(ctx: &StoreContext) {
    let repo = PgChapterRepository::new(ctx.pool.clone());
    let book_id = Uuid::new_v4();
    let second = ctx
        .fixtures
        .create_chapter(book_id, 2, &["Hai."])
        .await
        .unwrap();
    let first = ctx
        .fixtures
        .create_chapter(book_id, 1, &["Một.", "Một nữa."])
        .await
        .unwrap();

    let chapters = repo.find_by_book(book_id).await.unwrap();
    let ids: Vec<Uuid> = chapters.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![first, second]);

    let chapter = repo.find_by_id(first).await.unwrap().unwrap();
    assert_eq!(chapter.full_text(), "Một.\n\nMột nữa.");
    assert_eq!(chapter.paragraph_count(), 2);
    assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
}
