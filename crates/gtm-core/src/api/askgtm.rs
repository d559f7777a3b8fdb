use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{check_status, read_json, GtmClient};
use crate::error::Result;

#[derive(Serialize)]
struct AskRequest<'a> {
    question: &'a str,
}

/// A retrieved passage backing an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub content: String,
    pub source: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KnowledgeStats {
    pub total_documents: u64,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Free text added to the knowledge base, with optional metadata
/// such as `source` and `category`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
struct MessageResponse {
    message: String,
}

impl GtmClient {
    pub async fn stats(&self) -> Result<KnowledgeStats> {
        let response = self.client.get(self.url("/askgtm/stats")).send().await?;
        read_json(response).await
    }

    pub async fn ask(&self, question: &str) -> Result<AskResponse> {
        let response = self
            .client
            .post(self.url("/askgtm/ask"))
            .json(&AskRequest { question })
            .send()
            .await?;

        read_json(response).await
    }

    /// Clear the server-side conversation memory. The response body is ignored.
    pub async fn reset(&self) -> Result<()> {
        let response = self.client.post(self.url("/askgtm/reset")).send().await?;
        check_status(response).await?;
        Ok(())
    }

    pub async fn add_document(&self, document: &KnowledgeDocument) -> Result<String> {
        let response = self
            .client
            .post(self.url("/askgtm/add-document"))
            .json(document)
            .send()
            .await?;

        let reply: MessageResponse = read_json(response).await?;
        Ok(reply.message)
    }

    /// Upload a JSON file holding `[{"content": ..., "metadata": {...}}, ...]`.
    pub async fn upload_docs(&self, path: &Path) -> Result<String> {
        let reply: MessageResponse = self.post_file("/askgtm/upload-docs", path).await?;
        Ok(reply.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server;
    use axum::{
        extract::{Multipart, State},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_ask_sends_question_and_parses_sources() {
        let seen = Arc::new(Mutex::new(None::<Value>));
        let router = Router::new()
            .route(
                "/askgtm/ask",
                post(|State(seen): State<Arc<Mutex<Option<Value>>>>, Json(body): Json<Value>| async move {
                    *seen.lock().unwrap() = Some(body);
                    Json(json!({
                        "answer": "Enterprise starts at $50k/yr.",
                        "sources": [
                            {"content": "Enterprise tier...", "source": "pricing.md", "category": "sales"},
                            {"content": "Discount policy...", "source": "discounts.md", "category": "sales"}
                        ]
                    }))
                }),
            )
            .with_state(seen.clone());
        let client = GtmClient::new(&test_server::spawn(router).await);

        let reply = client.ask("What's our enterprise pricing?").await.unwrap();

        assert_eq!(
            seen.lock().unwrap().clone(),
            Some(json!({"question": "What's our enterprise pricing?"}))
        );
        assert_eq!(reply.answer, "Enterprise starts at $50k/yr.");
        assert_eq!(reply.sources.len(), 2);
        assert_eq!(reply.sources[1].source, "discounts.md");
    }

    #[tokio::test]
    async fn test_stats_and_reset() {
        let router = Router::new()
            .route(
                "/askgtm/stats",
                get(|| async {
                    Json(json!({
                        "total_documents": 8,
                        "categories": ["sales", "product", "customer-success", "technical"]
                    }))
                }),
            )
            .route(
                "/askgtm/reset",
                post(|| async { Json(json!({"message": "Conversation reset successfully"})) }),
            );
        let client = GtmClient::new(&test_server::spawn(router).await);

        let stats = client.stats().await.unwrap();
        assert_eq!(stats.total_documents, 8);
        assert_eq!(stats.categories.len(), 4);

        client.reset().await.unwrap();
    }

    #[tokio::test]
    async fn test_upload_docs_sends_file_part() {
        let router = Router::new().route(
            "/askgtm/upload-docs",
            post(|mut multipart: Multipart| async move {
                let field = multipart.next_field().await.unwrap().unwrap();
                assert_eq!(field.name(), Some("file"));
                let bytes = field.bytes().await.unwrap();
                let docs: Vec<Value> = serde_json::from_slice(&bytes).unwrap();
                Json(json!({"message": format!("Added {} documents successfully", docs.len())}))
            }),
        );
        let client = GtmClient::new(&test_server::spawn(router).await);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.json");
        std::fs::write(
            &path,
            r#"[{"content": "Onboarding takes 2 weeks"}, {"content": "SOC2 certified"}]"#,
        )
        .unwrap();

        let message = client.upload_docs(&path).await.unwrap();
        assert_eq!(message, "Added 2 documents successfully");
    }

    #[test]
    fn test_document_without_metadata_omits_field() {
        let doc = KnowledgeDocument {
            text: "Implementation takes 2-4 weeks".to_string(),
            metadata: None,
        };
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({"text": "Implementation takes 2-4 weeks"})
        );
    }
}
