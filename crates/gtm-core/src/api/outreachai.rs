use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{read_json, GtmClient};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Email,
    Linkedin,
    Slack,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Linkedin => "linkedin",
            Channel::Slack => "slack",
        }
    }

    /// Case-insensitive channel id, `None` for anything unsupported
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "email" => Some(Channel::Email),
            "linkedin" => Some(Channel::Linkedin),
            "slack" => Some(Channel::Slack),
            _ => None,
        }
    }

    pub fn all() -> Vec<Channel> {
        vec![Channel::Email, Channel::Linkedin, Channel::Slack]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Channel::Email => "Email",
            Channel::Linkedin => "LinkedIn",
            Channel::Slack => "Slack",
        }
    }

    /// Only email outreach carries a subject line
    pub fn has_subject(&self) -> bool {
        matches!(self, Channel::Email)
    }

    pub fn next(&self) -> Channel {
        match self {
            Channel::Email => Channel::Linkedin,
            Channel::Linkedin => Channel::Slack,
            Channel::Slack => Channel::Email,
        }
    }

    pub fn prev(&self) -> Channel {
        match self {
            Channel::Email => Channel::Slack,
            Channel::Linkedin => Channel::Email,
            Channel::Slack => Channel::Linkedin,
        }
    }
}

/// Entry of `GET /outreachai/channels`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Deserialize)]
struct ChannelsResponse {
    channels: Vec<ChannelInfo>,
}

/// Prospect profile sent to `/outreachai/generate`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutreachRequest {
    pub company_name: String,
    pub industry: String,
    pub company_size: String,
    pub pain_points: Vec<String>,
    pub decision_maker_name: Option<String>,
    pub decision_maker_title: Option<String>,
    pub recent_activity: Option<String>,
    pub channel: Channel,
}

#[derive(Serialize)]
struct MultiVersionRequest<'a> {
    #[serde(flatten)]
    request: &'a OutreachRequest,
    versions_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutreachResult {
    /// Empty or absent for channels without a subject line
    #[serde(default)]
    pub subject: Option<String>,
    pub body: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub personalization_elements: Vec<String>,
    #[serde(default)]
    pub call_to_action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_versions: Option<Vec<Map<String, Value>>>,
}

impl OutreachResult {
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Clipboard text: subject header for email, body alone otherwise
    pub fn copy_text(&self) -> String {
        match self.subject() {
            Some(subject) => format!("Subject: {}\n\n{}", subject, self.body),
            None => self.body.clone(),
        }
    }
}

impl GtmClient {
    pub async fn generate(&self, request: &OutreachRequest) -> Result<OutreachResult> {
        tracing::debug!(company = %request.company_name, channel = request.channel.as_str(), "generating outreach");
        let response = self
            .client
            .post(self.url("/outreachai/generate"))
            .json(request)
            .send()
            .await?;

        read_json(response).await
    }

    /// Several variants of the same outreach, for A/B testing
    pub async fn generate_multiple(
        &self,
        request: &OutreachRequest,
        versions_count: u32,
    ) -> Result<Vec<OutreachResult>> {
        let response = self
            .client
            .post(self.url("/outreachai/generate-multiple"))
            .json(&MultiVersionRequest { request, versions_count })
            .send()
            .await?;

        read_json(response).await
    }

    pub async fn channels(&self) -> Result<Vec<ChannelInfo>> {
        let response = self.client.get(self.url("/outreachai/channels")).send().await?;
        let reply: ChannelsResponse = read_json(response).await?;
        Ok(reply.channels)
    }
}
