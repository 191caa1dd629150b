use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Identity of a generation: two requests with the same key produce the same audio
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenerationKey {
    pub chapter_id: Uuid,
    pub language: String,
    pub voice: String,
}

impl GenerationKey {
    pub fn new(chapter_id: Uuid, language: &str, voice: &str) -> Self {
        Self {
            chapter_id,
            language: language.to_string(),
            voice: voice.to_string(),
        }
    }
}

/// In-process mutual exclusion per [`GenerationKey`].
///
/// Only one generation per key runs at a time inside this process; a second
/// caller waits and then sees the first caller's completed job through the
/// cache lookup. Idle locks are evicted. Separate processes are not
/// coordinated.
pub struct GenerationLocks {
    locks: Cache<GenerationKey, Arc<Mutex<()>>>,
}

impl GenerationLocks {
    pub fn new() -> Self {
        Self {
            locks: Cache::builder()
                .max_capacity(10_000)
                .time_to_idle(Duration::from_secs(30 * 60))
                .build(),
        }
    }

    pub async fn acquire(&self, key: GenerationKey) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .get_with(key, async { Arc::new(Mutex::new(())) })
            .await;
        lock.lock_owned().await
    }
}

impl Default for GenerationLocks {
    fn default() -> Self {
        Self::new()
    }
}
