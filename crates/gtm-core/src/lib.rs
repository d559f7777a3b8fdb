pub mod api;
pub mod config;
pub mod error;
pub mod state;

// Re-export main types for convenience
pub use api::{
    high_risk, AskResponse, Channel, ChannelInfo, DealInput, DealScore, GtmApi, GtmClient,
    KnowledgeDocument, KnowledgeStats, OutreachRequest, OutreachResult, RiskLevel, ServiceInfo,
    Source,
};
pub use config::Config;
pub use error::ApiError;
pub use state::{
    ChatMessage, ChatRole, ChatSession, DealSession, FormField, OutreachForm, OutreachSession,
};
