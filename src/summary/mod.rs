//! Meeting transcript summarization and storage.

use std::sync::Arc;

use crate::core::errors::ApiError;
use crate::providers::ProviderRegistry;
use crate::store::{DataStore, MeetingRecord, NewMeeting};

#[derive(Debug, Clone)]
pub struct MeetingUpload {
    pub title: String,
    pub transcript: String,
    pub participants: Vec<String>,
    pub duration_minutes: i64,
    pub ai_provider: Option<String>,
}

#[derive(Clone)]
pub struct SummaryGenerator {
    store: DataStore,
    registry: Arc<ProviderRegistry>,
}

impl SummaryGenerator {
    pub fn new(store: DataStore, registry: Arc<ProviderRegistry>) -> Self {
        Self { store, registry }
    }

    /// Summarize the transcript with the selected provider and persist the
    /// meeting. Generation failures surface to the caller; nothing is
    /// stored in that case.
    pub async fn generate_and_store(
        &self,
        upload: MeetingUpload,
    ) -> Result<MeetingRecord, ApiError> {
        let provider = self.registry.resolve(upload.ai_provider.as_deref())?;
        tracing::info!(provider = provider.name(), "Generating meeting summary");

        let analysis = provider.summarize_meeting(&upload.transcript).await?;

        self.store
            .insert_meeting(NewMeeting {
                title: upload.title,
                transcript: upload.transcript,
                participants: upload.participants,
                duration_minutes: upload.duration_minutes,
                analysis,
            })
            .await
    }

    /// Re-summarize an existing meeting with a new transcript. Returns
    /// false when the meeting id does not exist; the existence check runs
    /// first so no provider call is spent on a missing record.
    pub async fn regenerate(
        &self,
        meeting_id: &str,
        transcript: &str,
        ai_provider: Option<&str>,
    ) -> Result<bool, ApiError> {
        if self.store.get_meeting(meeting_id).await?.is_none() {
            return Ok(false);
        }

        let provider = self.registry.resolve(ai_provider)?;
        let analysis = provider.summarize_meeting(transcript).await?;

        self.store
            .update_meeting_summary(meeting_id, transcript, &analysis)
            .await
    }
}
