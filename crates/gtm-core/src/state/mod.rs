//! UI-agnostic tool state
//!
//! Each tool is a stateless request/response client around one form. The
//! session types here hold the transient per-tool state (input, loading flag,
//! latest result) and enforce the one-outstanding-request rule, so the TUI
//! and the CLI share the same behaviour.

pub mod chat;
pub mod deals;
pub mod outreach;

pub use chat::{ChatMessage, ChatRole, ChatSession, ASK_FALLBACK, EXAMPLE_QUESTIONS};
pub use deals::DealSession;
pub use outreach::{FormField, OutreachForm, OutreachSession};

/// Recording backend for session tests.
#[cfg(test)]
pub(crate) mod fake {
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use reqwest::StatusCode;

    use crate::api::{
        AskResponse, DealScore, GtmApi, KnowledgeStats, OutreachRequest, OutreachResult,
        ServiceInfo,
    };
    use crate::error::{ApiError, Result};

    #[derive(Default)]
    pub struct FakeApi {
        pub fail: bool,
        pub calls: AtomicUsize,
        pub ask_reply: Mutex<Option<AskResponse>>,
        pub deals_reply: Mutex<Vec<DealScore>>,
        pub outreach_reply: Mutex<Option<OutreachResult>>,
        pub last_outreach: Mutex<Option<OutreachRequest>>,
    }

    impl FakeApi {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn hit(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ApiError::Status {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: "upstream model timeout".to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl GtmApi for FakeApi {
        async fn service_info(&self) -> Result<ServiceInfo> {
            self.hit()?;
            Ok(ServiceInfo {
                message: "GTM Synergy Suite API".to_string(),
                status: "operational".to_string(),
                tools: vec![],
            })
        }

        async fn stats(&self) -> Result<KnowledgeStats> {
            self.hit()?;
            Ok(KnowledgeStats {
                total_documents: 8,
                categories: vec!["sales".to_string(), "product".to_string()],
            })
        }

        async fn ask(&self, _question: &str) -> Result<AskResponse> {
            self.hit()?;
            Ok(self.ask_reply.lock().unwrap().clone().unwrap_or(AskResponse {
                answer: "No idea.".to_string(),
                sources: vec![],
            }))
        }

        async fn reset(&self) -> Result<()> {
            self.hit()
        }

        async fn analyze_csv(&self, _path: &Path) -> Result<Vec<DealScore>> {
            self.hit()?;
            Ok(self.deals_reply.lock().unwrap().clone())
        }

        async fn generate(&self, request: &OutreachRequest) -> Result<OutreachResult> {
            self.hit()?;
            *self.last_outreach.lock().unwrap() = Some(request.clone());
            Ok(self.outreach_reply.lock().unwrap().clone().unwrap_or(OutreachResult {
                subject: None,
                body: "Hello".to_string(),
                reasoning: String::new(),
                personalization_elements: vec![],
                call_to_action: String::new(),
                alternative_versions: None,
            }))
        }
    }
}
