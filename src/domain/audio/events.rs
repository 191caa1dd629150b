use uuid::Uuid;

/// Progress notifications emitted by the audio pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    CacheHit {
        chapter_id: Uuid,
        job_id: Uuid,
    },
    JobCreated {
        chapter_id: Uuid,
        job_id: Uuid,
    },
    JobProcessing {
        chapter_id: Uuid,
        job_id: Uuid,
    },
    JobCompleted {
        chapter_id: Uuid,
        job_id: Uuid,
        audio_url: String,
    },
    JobFailed {
        chapter_id: Uuid,
        job_id: Uuid,
        error: String,
    },
    AudioDeleted {
        chapter_id: Uuid,
        jobs_removed: u64,
    },
}

impl AudioEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AudioEvent::CacheHit { .. } => "audio.cache_hit",
            AudioEvent::JobCreated { .. } => "audio.job_created",
            AudioEvent::JobProcessing { .. } => "audio.job_processing",
            AudioEvent::JobCompleted { .. } => "audio.job_completed",
            AudioEvent::JobFailed { .. } => "audio.job_failed",
            AudioEvent::AudioDeleted { .. } => "audio.deleted",
        }
    }

    pub fn chapter_id(&self) -> Uuid {
        match self {
            AudioEvent::CacheHit { chapter_id, .. }
            | AudioEvent::JobCreated { chapter_id, .. }
            | AudioEvent::JobProcessing { chapter_id, .. }
            | AudioEvent::JobCompleted { chapter_id, .. }
            | AudioEvent::JobFailed { chapter_id, .. }
            | AudioEvent::AudioDeleted { chapter_id, .. } => *chapter_id,
        }
    }

    pub fn job_id(&self) -> Option<Uuid> {
        match self {
            AudioEvent::CacheHit { job_id, .. }
            | AudioEvent::JobCreated { job_id, .. }
            | AudioEvent::JobProcessing { job_id, .. }
            | AudioEvent::JobCompleted { job_id, .. }
            | AudioEvent::JobFailed { job_id, .. } => Some(*job_id),
            AudioEvent::AudioDeleted { .. } => None,
        }
    }
}

/// Receiver for pipeline events, injected into the audio service.
///
/// Implementations must not block: publishing happens inline with the
/// state transitions.
pub trait AudioEventSink: Send + Sync {
    fn publish(&self, event: &AudioEvent);
}

/// Writes every event to the log
pub struct TracingEventSink;

impl AudioEventSink for TracingEventSink {
    fn publish(&self, event: &AudioEvent) {
        match event {
            AudioEvent::JobFailed { error, .. } => tracing::warn!(
                event = event.name(),
                chapter_id = %event.chapter_id(),
                job_id = ?event.job_id(),
                error = %error,
                "Audio event"
            ),
            _ => tracing::info!(
                event = event.name(),
                chapter_id = %event.chapter_id(),
                job_id = ?event.job_id(),
                "Audio event"
            ),
        }
    }
}

pub struct NoopEventSink;

impl AudioEventSink for NoopEventSink {
    fn publish(&self, _event: &AudioEvent) {}
}
