//! Best-effort persistence of chat exchanges.

use uuid::Uuid;

use crate::store::DataStore;

use super::ChatQuery;

#[derive(Clone)]
pub struct ConversationRecorder {
    store: DataStore,
}

impl ConversationRecorder {
    pub fn new(store: DataStore) -> Self {
        Self { store }
    }

    /// Append the user question and assistant answer to the addressed
    /// conversation, creating the user and conversation when absent. The
    /// assistant message carries the context document ids used.
    ///
    /// Fire-and-forget semantics: a failure here is logged and the caller
    /// still returns the generated answer. The conversation id is returned
    /// so the client can continue the thread; when persistence failed it is
    /// the id that would have been used.
    pub async fn record(&self, query: &ChatQuery, answer: &str, context_ids: &[String]) -> String {
        let fallback_id = query
            .conversation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        match self.try_record(query, answer, context_ids, &fallback_id).await {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!("Failed to record conversation: {}", err);
                fallback_id
            }
        }
    }

    async fn try_record(
        &self,
        query: &ChatQuery,
        answer: &str,
        context_ids: &[String],
        conversation_id: &str,
    ) -> Result<String, crate::core::errors::ApiError> {
        let user = self
            .store
            .ensure_user(query.user_email.as_deref(), query.user_name.as_deref())
            .await?;

        let conversation = self
            .store
            .ensure_conversation(Some(conversation_id), &user.id)
            .await?;

        self.store
            .append_message(&conversation.id, "user", &query.question, &[])
            .await?;
        self.store
            .append_message(&conversation.id, "assistant", answer, context_ids)
            .await?;

        Ok(conversation.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::temp_store;

    fn query(conversation_id: Option<&str>) -> ChatQuery {
        ChatQuery {
            question: "What was decided?".to_string(),
            ai_provider: None,
            conversation_id: conversation_id.map(|s| s.to_string()),
            user_email: Some("jane@example.com".to_string()),
            user_name: Some("Jane".to_string()),
            max_documents: None,
        }
    }

    #[tokio::test]
    async fn records_two_messages_per_ask_in_order() {
        let store = temp_store().await;
        let recorder = ConversationRecorder::new(store.clone());

        let conv_id = recorder
            .record(&query(Some("conv-1")), "Ship Friday.", &["DOC-AAAA1111".to_string()])
            .await;
        assert_eq!(conv_id, "conv-1");

        recorder.record(&query(Some("conv-1")), "Yes.", &[]).await;

        let messages = store.get_messages("conv-1", 0).await.unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[1].role, "assistant");
        assert_eq!(messages[1].context_ids, vec!["DOC-AAAA1111".to_string()]);
        assert_eq!(messages[2].role, "user");
        assert_eq!(messages[3].role, "assistant");
    }

    #[tokio::test]
    async fn generates_conversation_id_when_absent() {
        let store = temp_store().await;
        let recorder = ConversationRecorder::new(store.clone());

        let conv_id = recorder.record(&query(None), "Answer.", &[]).await;
        assert!(!conv_id.is_empty());

        let messages = store.get_messages(&conv_id, 0).await.unwrap();
        assert_eq!(messages.len(), 2);
    }
}
