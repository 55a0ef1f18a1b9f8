use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;

use super::{from_json_text, now_rfc3339, to_json_text, DataStore};
use crate::core::errors::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl DocumentUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.category.is_none()
            && self.tags.is_none()
    }
}

fn new_document_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("DOC-{}", hex[..8].to_uppercase())
}

fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> DocumentRecord {
    let tags_text: String = row.try_get("tags").unwrap_or_else(|_| "[]".to_string());
    DocumentRecord {
        id: row.try_get("id").unwrap_or_default(),
        title: row.try_get("title").unwrap_or_default(),
        content: row.try_get("content").unwrap_or_default(),
        category: row.try_get("category").unwrap_or_default(),
        tags: from_json_text(&tags_text),
        created_at: row.try_get("created_at").unwrap_or_default(),
        updated_at: row.try_get("updated_at").unwrap_or_default(),
    }
}

impl DataStore {
    pub async fn insert_document(&self, doc: NewDocument) -> Result<DocumentRecord, ApiError> {
        let record = DocumentRecord {
            id: new_document_id(),
            title: doc.title,
            content: doc.content,
            category: doc.category.unwrap_or_else(|| "general".to_string()),
            tags: doc.tags,
            created_at: now_rfc3339(),
            updated_at: now_rfc3339(),
        };

        sqlx::query(
            "INSERT INTO documents (id, title, content, category, tags, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.title)
        .bind(&record.content)
        .bind(&record.category)
        .bind(to_json_text(&record.tags))
        .bind(&record.created_at)
        .bind(&record.updated_at)
        .execute(self.pool())
        .await
        .map_err(ApiError::store)?;

        Ok(record)
    }

    pub async fn get_document(&self, id: &str) -> Result<Option<DocumentRecord>, ApiError> {
        let row = sqlx::query("SELECT * FROM documents WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(ApiError::store)?;
        Ok(row.as_ref().map(row_to_document))
    }

    pub async fn list_documents(
        &self,
        limit: i64,
        offset: i64,
        category: Option<&str>,
        tag: Option<&str>,
    ) -> Result<Vec<DocumentRecord>, ApiError> {
        let rows = sqlx::query(
            "SELECT * FROM documents
             WHERE (?1 IS NULL OR category = ?1)
               AND (?2 IS NULL OR tags LIKE '%\"' || ?2 || '\"%')
             ORDER BY created_at DESC
             LIMIT ?3 OFFSET ?4",
        )
        .bind(category)
        .bind(tag)
        .bind(limit.max(1))
        .bind(offset.max(0))
        .fetch_all(self.pool())
        .await
        .map_err(ApiError::store)?;

        Ok(rows.iter().map(row_to_document).collect())
    }

    /// Partial update; returns false when the id does not exist.
    pub async fn update_document(
        &self,
        id: &str,
        update: DocumentUpdate,
    ) -> Result<bool, ApiError> {
        let result = sqlx::query(
            "UPDATE documents SET
                title = COALESCE(?2, title),
                content = COALESCE(?3, content),
                category = COALESCE(?4, category),
                tags = COALESCE(?5, tags),
                updated_at = ?6
             WHERE id = ?1",
        )
        .bind(id)
        .bind(update.title)
        .bind(update.content)
        .bind(update.category)
        .bind(update.tags.as_ref().map(to_json_text))
        .bind(now_rfc3339())
        .execute(self.pool())
        .await
        .map_err(ApiError::store)?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_document(&self, id: &str) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(ApiError::store)?;
        Ok(result.rows_affected() > 0)
    }

    /// Case-insensitive keyword match over title, content, tags and category.
    pub async fn search_documents(
        &self,
        keyword: &str,
        limit: i64,
    ) -> Result<Vec<DocumentRecord>, ApiError> {
        let pattern = format!("%{}%", keyword.trim());
        if pattern == "%%" {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT * FROM documents
             WHERE title LIKE ?1 OR content LIKE ?1 OR tags LIKE ?1 OR category LIKE ?1
             ORDER BY created_at DESC
             LIMIT ?2",
        )
        .bind(&pattern)
        .bind(limit.max(1))
        .fetch_all(self.pool())
        .await
        .map_err(ApiError::store)?;

        Ok(rows.iter().map(row_to_document).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::temp_store;
    use super::*;

    fn sample_doc() -> NewDocument {
        NewDocument {
            title: "Project Documentation".to_string(),
            content: "This document describes the deployment process.".to_string(),
            category: Some("documentation".to_string()),
            tags: vec!["project".to_string(), "deploy".to_string()],
        }
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let store = temp_store().await;

        let created = store.insert_document(sample_doc()).await.unwrap();
        assert!(created.id.starts_with("DOC-"));

        let fetched = store.get_document(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, created.title);
        assert_eq!(fetched.content, created.content);
        assert_eq!(fetched.category, created.category);
        assert_eq!(fetched.tags, created.tags);
    }

    #[tokio::test]
    async fn delete_then_get_is_none() {
        let store = temp_store().await;
        let created = store.insert_document(sample_doc()).await.unwrap();

        assert!(store.delete_document(&created.id).await.unwrap());
        assert!(store.get_document(&created.id).await.unwrap().is_none());
        assert!(!store.delete_document(&created.id).await.unwrap());
    }

    #[tokio::test]
    async fn partial_update_keeps_other_fields() {
        let store = temp_store().await;
        let created = store.insert_document(sample_doc()).await.unwrap();

        let updated = store
            .update_document(
                &created.id,
                DocumentUpdate {
                    title: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated);

        let fetched = store.get_document(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Renamed");
        assert_eq!(fetched.content, created.content);
        assert_eq!(fetched.tags, created.tags);

        let missing = store
            .update_document("DOC-DEADBEEF", DocumentUpdate::default())
            .await
            .unwrap();
        assert!(!missing);
    }

    #[tokio::test]
    async fn list_filters_by_category_and_tag() {
        let store = temp_store().await;
        store.insert_document(sample_doc()).await.unwrap();
        store
            .insert_document(NewDocument {
                title: "Release Notes".to_string(),
                content: "v1.2 changes".to_string(),
                category: Some("notes".to_string()),
                tags: vec!["release".to_string()],
            })
            .await
            .unwrap();

        let all = store.list_documents(20, 0, None, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let docs = store
            .list_documents(20, 0, Some("documentation"), None)
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].category, "documentation");

        let tagged = store
            .list_documents(20, 0, None, Some("release"))
            .await
            .unwrap();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].title, "Release Notes");
    }

    #[tokio::test]
    async fn keyword_search_matches_content_and_tags() {
        let store = temp_store().await;
        store.insert_document(sample_doc()).await.unwrap();

        let by_content = store.search_documents("deployment", 10).await.unwrap();
        assert_eq!(by_content.len(), 1);

        let by_tag = store.search_documents("deploy", 10).await.unwrap();
        assert_eq!(by_tag.len(), 1);

        let none = store.search_documents("unrelated", 10).await.unwrap();
        assert!(none.is_empty());

        let blank = store.search_documents("  ", 10).await.unwrap();
        assert!(blank.is_empty());
    }
}
