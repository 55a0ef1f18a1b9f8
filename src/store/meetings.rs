use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::Row;
use uuid::Uuid;

use super::{from_json_text, now_rfc3339, to_json_text, DataStore};
use crate::core::errors::ApiError;
use crate::providers::MeetingAnalysis;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingRecord {
    pub id: String,
    pub title: String,
    pub transcript: String,
    pub summary: String,
    pub key_points: Vec<String>,
    pub action_items: Vec<Value>,
    pub decisions: Vec<String>,
    pub tags: Vec<String>,
    pub participants: Vec<String>,
    pub duration_minutes: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewMeeting {
    pub title: String,
    pub transcript: String,
    pub participants: Vec<String>,
    pub duration_minutes: i64,
    pub analysis: MeetingAnalysis,
}

fn new_meeting_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("MTG-{}", hex[..8].to_uppercase())
}

fn row_to_meeting(row: &sqlx::sqlite::SqliteRow) -> MeetingRecord {
    let key_points: String = row.try_get("key_points").unwrap_or_else(|_| "[]".into());
    let action_items: String = row.try_get("action_items").unwrap_or_else(|_| "[]".into());
    let decisions: String = row.try_get("decisions").unwrap_or_else(|_| "[]".into());
    let tags: String = row.try_get("tags").unwrap_or_else(|_| "[]".into());
    let participants: String = row.try_get("participants").unwrap_or_else(|_| "[]".into());

    MeetingRecord {
        id: row.try_get("id").unwrap_or_default(),
        title: row.try_get("title").unwrap_or_default(),
        transcript: row.try_get("transcript").unwrap_or_default(),
        summary: row.try_get("summary").unwrap_or_default(),
        key_points: from_json_text(&key_points),
        action_items: from_json_text(&action_items),
        decisions: from_json_text(&decisions),
        tags: from_json_text(&tags),
        participants: from_json_text(&participants),
        duration_minutes: row.try_get("duration_minutes").unwrap_or_default(),
        created_at: row.try_get("created_at").unwrap_or_default(),
        updated_at: row.try_get("updated_at").unwrap_or_default(),
    }
}

impl DataStore {
    pub async fn insert_meeting(&self, meeting: NewMeeting) -> Result<MeetingRecord, ApiError> {
        let record = MeetingRecord {
            id: new_meeting_id(),
            title: meeting.title,
            transcript: meeting.transcript,
            summary: meeting.analysis.summary,
            key_points: meeting.analysis.key_points,
            action_items: meeting.analysis.action_items,
            decisions: meeting.analysis.decisions,
            tags: meeting.analysis.tags,
            participants: meeting.participants,
            duration_minutes: meeting.duration_minutes,
            created_at: now_rfc3339(),
            updated_at: now_rfc3339(),
        };

        sqlx::query(
            "INSERT INTO meetings (id, title, transcript, summary, key_points, action_items,
                                   decisions, tags, participants, duration_minutes,
                                   created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.title)
        .bind(&record.transcript)
        .bind(&record.summary)
        .bind(to_json_text(&record.key_points))
        .bind(to_json_text(&record.action_items))
        .bind(to_json_text(&record.decisions))
        .bind(to_json_text(&record.tags))
        .bind(to_json_text(&record.participants))
        .bind(record.duration_minutes)
        .bind(&record.created_at)
        .bind(&record.updated_at)
        .execute(self.pool())
        .await
        .map_err(ApiError::store)?;

        Ok(record)
    }

    pub async fn get_meeting(&self, id: &str) -> Result<Option<MeetingRecord>, ApiError> {
        let row = sqlx::query("SELECT * FROM meetings WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(ApiError::store)?;
        Ok(row.as_ref().map(row_to_meeting))
    }

    pub async fn list_meetings(
        &self,
        limit: i64,
        tag: Option<&str>,
        participant: Option<&str>,
    ) -> Result<Vec<MeetingRecord>, ApiError> {
        let rows = sqlx::query(
            "SELECT * FROM meetings
             WHERE (?1 IS NULL OR tags LIKE '%\"' || ?1 || '\"%')
               AND (?2 IS NULL OR participants LIKE '%\"' || ?2 || '\"%')
             ORDER BY created_at DESC
             LIMIT ?3",
        )
        .bind(tag)
        .bind(participant)
        .bind(limit.max(1))
        .fetch_all(self.pool())
        .await
        .map_err(ApiError::store)?;

        Ok(rows.iter().map(row_to_meeting).collect())
    }

    /// Replace the transcript and its regenerated analysis. Returns false when
    /// the id does not exist.
    pub async fn update_meeting_summary(
        &self,
        id: &str,
        transcript: &str,
        analysis: &MeetingAnalysis,
    ) -> Result<bool, ApiError> {
        let result = sqlx::query(
            "UPDATE meetings SET
                transcript = ?2,
                summary = ?3,
                key_points = ?4,
                action_items = ?5,
                decisions = ?6,
                tags = ?7,
                updated_at = ?8
             WHERE id = ?1",
        )
        .bind(id)
        .bind(transcript)
        .bind(&analysis.summary)
        .bind(to_json_text(&analysis.key_points))
        .bind(to_json_text(&analysis.action_items))
        .bind(to_json_text(&analysis.decisions))
        .bind(to_json_text(&analysis.tags))
        .bind(now_rfc3339())
        .execute(self.pool())
        .await
        .map_err(ApiError::store)?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_meeting(&self, id: &str) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM meetings WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(ApiError::store)?;
        Ok(result.rows_affected() > 0)
    }

    /// Keyword match over title, summary and tags, newest first.
    pub async fn search_meetings(
        &self,
        keyword: &str,
        limit: i64,
    ) -> Result<Vec<MeetingRecord>, ApiError> {
        let pattern = format!("%{}%", keyword.trim());
        if pattern == "%%" {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT * FROM meetings
             WHERE title LIKE ?1 OR summary LIKE ?1 OR tags LIKE ?1
             ORDER BY created_at DESC
             LIMIT ?2",
        )
        .bind(&pattern)
        .bind(limit.max(1))
        .fetch_all(self.pool())
        .await
        .map_err(ApiError::store)?;

        Ok(rows.iter().map(row_to_meeting).collect())
    }

    pub async fn recent_meetings(
        &self,
        days: i64,
        limit: i64,
    ) -> Result<Vec<MeetingRecord>, ApiError> {
        let cutoff = (Utc::now() - Duration::days(days.max(0))).to_rfc3339();
        let rows = sqlx::query(
            "SELECT * FROM meetings
             WHERE created_at >= ?1
             ORDER BY created_at DESC
             LIMIT ?2",
        )
        .bind(&cutoff)
        .bind(limit.max(1))
        .fetch_all(self.pool())
        .await
        .map_err(ApiError::store)?;

        Ok(rows.iter().map(row_to_meeting).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::temp_store;
    use super::*;

    fn sample_meeting() -> NewMeeting {
        NewMeeting {
            title: "Project Kickoff".to_string(),
            transcript: "We discussed scope and timelines.".to_string(),
            participants: vec!["john@example.com".to_string()],
            duration_minutes: 60,
            analysis: MeetingAnalysis {
                summary: "Kickoff covering scope and timelines.".to_string(),
                key_points: vec!["Scope finalization".to_string()],
                action_items: vec![serde_json::json!({
                    "task": "Prepare requirements",
                    "assignee": "john"
                })],
                decisions: vec!["Ship in Q3".to_string()],
                tags: vec!["kickoff".to_string()],
            },
        }
    }

    #[tokio::test]
    async fn insert_get_and_delete() {
        let store = temp_store().await;

        let created = store.insert_meeting(sample_meeting()).await.unwrap();
        assert!(created.id.starts_with("MTG-"));

        let fetched = store.get_meeting(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.summary, created.summary);
        assert_eq!(fetched.key_points, created.key_points);
        assert_eq!(fetched.participants, created.participants);

        assert!(store.delete_meeting(&created.id).await.unwrap());
        assert!(store.get_meeting(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_replaces_summary_fields() {
        let store = temp_store().await;
        let created = store.insert_meeting(sample_meeting()).await.unwrap();

        let new_analysis = MeetingAnalysis {
            summary: "Revised summary.".to_string(),
            ..Default::default()
        };
        let updated = store
            .update_meeting_summary(&created.id, "New transcript.", &new_analysis)
            .await
            .unwrap();
        assert!(updated);

        let fetched = store.get_meeting(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.transcript, "New transcript.");
        assert_eq!(fetched.summary, "Revised summary.");
        assert!(fetched.key_points.is_empty());

        let missing = store
            .update_meeting_summary("MTG-DEADBEEF", "x", &new_analysis)
            .await
            .unwrap();
        assert!(!missing);
    }

    #[tokio::test]
    async fn list_filters_by_tag_and_participant() {
        let store = temp_store().await;
        store.insert_meeting(sample_meeting()).await.unwrap();

        let by_tag = store.list_meetings(10, Some("kickoff"), None).await.unwrap();
        assert_eq!(by_tag.len(), 1);

        let by_participant = store
            .list_meetings(10, None, Some("john@example.com"))
            .await
            .unwrap();
        assert_eq!(by_participant.len(), 1);

        let none = store.list_meetings(10, Some("retro"), None).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn search_and_recent() {
        let store = temp_store().await;
        store.insert_meeting(sample_meeting()).await.unwrap();

        let hits = store.search_meetings("timelines", 10).await.unwrap();
        assert_eq!(hits.len(), 1);

        let recent = store.recent_meetings(30, 10).await.unwrap();
        assert_eq!(recent.len(), 1);

        let stale = store.recent_meetings(0, 10).await.unwrap();
        assert!(stale.is_empty());
    }
}
