use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;

use super::{from_json_text, now_rfc3339, to_json_text, DataStore};
use crate::core::errors::ApiError;

pub const ANONYMOUS_EMAIL: &str = "anonymous@local";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: String,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: i64,
    pub conversation_id: String,
    pub role: String,
    pub content: String,
    pub context_ids: Vec<String>,
    pub created_at: String,
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> UserRecord {
    UserRecord {
        id: row.try_get("id").unwrap_or_default(),
        name: row.try_get("name").unwrap_or_default(),
        email: row.try_get("email").unwrap_or_default(),
        created_at: row.try_get("created_at").unwrap_or_default(),
    }
}

fn row_to_conversation(row: &sqlx::sqlite::SqliteRow) -> ConversationRecord {
    ConversationRecord {
        id: row.try_get("id").unwrap_or_default(),
        user_id: row.try_get("user_id").unwrap_or_default(),
        created_at: row.try_get("created_at").unwrap_or_default(),
        updated_at: row.try_get("updated_at").unwrap_or_default(),
    }
}

fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> MessageRecord {
    let context_ids: String = row.try_get("context_ids").unwrap_or_else(|_| "[]".into());
    MessageRecord {
        id: row.try_get("id").unwrap_or_default(),
        conversation_id: row.try_get("conversation_id").unwrap_or_default(),
        role: row.try_get("role").unwrap_or_default(),
        content: row.try_get("content").unwrap_or_default(),
        context_ids: from_json_text(&context_ids),
        created_at: row.try_get("created_at").unwrap_or_default(),
    }
}

impl DataStore {
    /// Look up a user by email, creating one on first interaction.
    pub async fn ensure_user(
        &self,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<UserRecord, ApiError> {
        let email = email.unwrap_or(ANONYMOUS_EMAIL);

        let existing = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(self.pool())
            .await
            .map_err(ApiError::store)?;
        if let Some(row) = existing {
            return Ok(row_to_user(&row));
        }

        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            name: name.unwrap_or("Anonymous").to_string(),
            email: email.to_string(),
            created_at: now_rfc3339(),
        };

        sqlx::query("INSERT INTO users (id, name, email, created_at) VALUES (?, ?, ?, ?)")
            .bind(&record.id)
            .bind(&record.name)
            .bind(&record.email)
            .bind(&record.created_at)
            .execute(self.pool())
            .await
            .map_err(ApiError::store)?;

        Ok(record)
    }

    /// Fetch the conversation, creating it for the given user when absent.
    /// A caller-supplied id is kept so follow-up asks can address it.
    pub async fn ensure_conversation(
        &self,
        id: Option<&str>,
        user_id: &str,
    ) -> Result<ConversationRecord, ApiError> {
        if let Some(id) = id {
            let existing = sqlx::query("SELECT * FROM conversations WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool())
                .await
                .map_err(ApiError::store)?;
            if let Some(row) = existing {
                return Ok(row_to_conversation(&row));
            }
        }

        let record = ConversationRecord {
            id: id
                .map(|s| s.to_string())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            user_id: user_id.to_string(),
            created_at: now_rfc3339(),
            updated_at: now_rfc3339(),
        };

        sqlx::query(
            "INSERT INTO conversations (id, user_id, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(&record.created_at)
        .bind(&record.updated_at)
        .execute(self.pool())
        .await
        .map_err(ApiError::store)?;

        Ok(record)
    }

    /// Append-only; also touches the conversation's updated_at.
    pub async fn append_message(
        &self,
        conversation_id: &str,
        role: &str,
        content: &str,
        context_ids: &[String],
    ) -> Result<i64, ApiError> {
        let now = now_rfc3339();
        let mut tx = self.pool().begin().await.map_err(ApiError::store)?;

        sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(conversation_id)
            .execute(&mut *tx)
            .await
            .map_err(ApiError::store)?;

        let result = sqlx::query(
            "INSERT INTO messages (conversation_id, role, content, context_ids, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(conversation_id)
        .bind(role)
        .bind(content)
        .bind(to_json_text(&context_ids))
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(ApiError::store)?;

        tx.commit().await.map_err(ApiError::store)?;
        Ok(result.last_insert_rowid())
    }

    /// Messages in arrival order (rowid ascending).
    pub async fn get_messages(
        &self,
        conversation_id: &str,
        limit: i64,
    ) -> Result<Vec<MessageRecord>, ApiError> {
        let rows = if limit > 0 {
            sqlx::query(
                "SELECT * FROM (SELECT * FROM messages WHERE conversation_id = ?
                 ORDER BY id DESC LIMIT ?) ORDER BY id ASC",
            )
            .bind(conversation_id)
            .bind(limit)
            .fetch_all(self.pool())
            .await
            .map_err(ApiError::store)?
        } else {
            sqlx::query("SELECT * FROM messages WHERE conversation_id = ? ORDER BY id ASC")
                .bind(conversation_id)
                .fetch_all(self.pool())
                .await
                .map_err(ApiError::store)?
        };

        Ok(rows.iter().map(row_to_message).collect())
    }

    pub async fn message_count(&self, conversation_id: &str) -> Result<i64, ApiError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE conversation_id = ?")
            .bind(conversation_id)
            .fetch_one(self.pool())
            .await
            .map_err(ApiError::store)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::temp_store;
    use super::*;

    #[tokio::test]
    async fn ensure_user_is_idempotent_per_email() {
        let store = temp_store().await;

        let first = store
            .ensure_user(Some("jane@example.com"), Some("Jane"))
            .await
            .unwrap();
        let second = store
            .ensure_user(Some("jane@example.com"), Some("Jane Again"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Jane");

        let anon = store.ensure_user(None, None).await.unwrap();
        assert_eq!(anon.email, ANONYMOUS_EMAIL);
    }

    #[tokio::test]
    async fn ensure_conversation_creates_and_reuses() {
        let store = temp_store().await;
        let user = store.ensure_user(None, None).await.unwrap();

        let created = store
            .ensure_conversation(Some("conv-1"), &user.id)
            .await
            .unwrap();
        assert_eq!(created.id, "conv-1");

        let reused = store
            .ensure_conversation(Some("conv-1"), &user.id)
            .await
            .unwrap();
        assert_eq!(reused.user_id, user.id);

        let generated = store.ensure_conversation(None, &user.id).await.unwrap();
        assert_ne!(generated.id, created.id);
    }

    #[tokio::test]
    async fn messages_append_in_arrival_order() {
        let store = temp_store().await;
        let user = store.ensure_user(None, None).await.unwrap();
        let conv = store
            .ensure_conversation(Some("conv-1"), &user.id)
            .await
            .unwrap();

        store
            .append_message(&conv.id, "user", "first question", &[])
            .await
            .unwrap();
        store
            .append_message(
                &conv.id,
                "assistant",
                "first answer",
                &["DOC-1A2B3C4D".to_string()],
            )
            .await
            .unwrap();

        let messages = store.get_messages(&conv.id, 0).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[1].role, "assistant");
        assert_eq!(messages[1].context_ids, vec!["DOC-1A2B3C4D".to_string()]);

        assert_eq!(store.message_count(&conv.id).await.unwrap(), 2);
    }
}
