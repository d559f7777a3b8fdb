use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{read_json, GtmClient};
use crate::error::Result;

/// Risk bucket assigned by the scoring service.
///
/// Labels outside Low/Medium/High are kept verbatim rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Other(String),
}

impl RiskLevel {
    pub fn as_str(&self) -> &str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Other(label) => label,
        }
    }
}

impl From<String> for RiskLevel {
    fn from(label: String) -> Self {
        match label.trim().to_lowercase().as_str() {
            "low" => RiskLevel::Low,
            "medium" => RiskLevel::Medium,
            "high" => RiskLevel::High,
            _ => RiskLevel::Other(label),
        }
    }
}

impl From<RiskLevel> for String {
    fn from(level: RiskLevel) -> Self {
        level.as_str().to_string()
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scored deal, one per row of the uploaded pipeline CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealScore {
    pub deal_id: String,
    pub company_name: String,
    pub deal_value: f64,
    /// Percentage, 0-100
    pub close_probability: f64,
    pub risk_level: RiskLevel,
    pub reasoning: String,
    #[serde(default)]
    pub next_actions: Vec<String>,
}

/// A single deal submitted for scoring without a CSV.
///
/// Mirrors the pipeline CSV columns the scoring service reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DealInput {
    pub deal_id: String,
    pub company_name: String,
    pub deal_value: f64,
    pub stage: String,
    pub days_in_pipeline: u32,
    pub last_contact_days: u32,
    pub decision_maker_engaged: bool,
    pub has_competitor: bool,
    pub budget_confirmed: bool,
}

impl GtmClient {
    /// Upload a pipeline CSV as the multipart `file` field.
    pub async fn analyze_csv(&self, path: &Path) -> Result<Vec<DealScore>> {
        let scores: Vec<DealScore> = self.post_file("/dealsense/analyze-csv", path).await?;
        tracing::info!(deals = scores.len(), "pipeline scored");
        Ok(scores)
    }

    pub async fn analyze_deal(&self, deal: &DealInput) -> Result<DealScore> {
        let response = self
            .client
            .post(self.url("/dealsense/analyze-deal"))
            .json(deal)
            .send()
            .await?;

        read_json(response).await
    }
}

/// Deals the scorer flagged as High risk
pub fn high_risk(deals: &[DealScore]) -> Vec<&DealScore> {
    deals
        .iter()
        .filter(|deal| deal.risk_level == RiskLevel::High)
        .collect()
}
