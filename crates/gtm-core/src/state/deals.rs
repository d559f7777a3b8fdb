use std::path::PathBuf;

use crate::api::{self, DealScore, GtmApi};
use crate::error::{ApiError, Result};

/// DealSense upload state: the chosen CSV and the latest scores
#[derive(Debug, Default)]
pub struct DealSession {
    pub file: Option<PathBuf>,
    pub results: Vec<DealScore>,
    pub loading: bool,
}

impl DealSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a file, or clear the selection with a blank path.
    pub fn select_file(&mut self, path: &str) {
        let path = path.trim();
        self.file = if path.is_empty() {
            None
        } else {
            Some(PathBuf::from(path))
        };
    }

    /// Mark the session busy and hand back the file to upload.
    ///
    /// `None` means no request may be issued: nothing is selected or an
    /// upload is already running.
    pub fn begin_upload(&mut self) -> Option<PathBuf> {
        if self.loading {
            return None;
        }
        let file = self.file.clone()?;
        self.loading = true;
        Some(file)
    }

    /// Replace results on success; on failure log and keep the old ones.
    pub fn finish_upload(&mut self, result: Result<Vec<DealScore>>) {
        self.loading = false;
        match result {
            Ok(scores) => self.results = scores,
            Err(e) => tracing::error!("Error analyzing pipeline: {}", e),
        }
    }

    /// Upload the selected file. A failed analysis leaves the previous
    /// results in place and is returned to the caller.
    pub async fn upload(&mut self, api: &dyn GtmApi) -> Result<()> {
        let file = self.begin_upload().ok_or(ApiError::NoFileSelected)?;
        match api.analyze_csv(&file).await {
            Ok(scores) => {
                self.finish_upload(Ok(scores));
                Ok(())
            }
            Err(e) => {
                self.loading = false;
                tracing::error!("Error analyzing pipeline: {}", e);
                Err(e)
            }
        }
    }

    pub fn high_risk(&self) -> Vec<&DealScore> {
        api::high_risk(&self.results)
    }

    pub fn total_value(&self) -> f64 {
        self.results.iter().map(|deal| deal.deal_value).sum()
    }

    /// Sum of deal values weighted by close probability
    pub fn weighted_forecast(&self) -> f64 {
        self.results
            .iter()
            .map(|deal| deal.deal_value * deal.close_probability / 100.0)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RiskLevel;
    use crate::state::fake::FakeApi;

    fn scores() -> Vec<DealScore> {
        vec![
            DealScore {
                deal_id: "1".to_string(),
                company_name: "Acme".to_string(),
                deal_value: 100_000.0,
                close_probability: 80.0,
                risk_level: RiskLevel::Low,
                reasoning: "Exec sponsor engaged".to_string(),
                next_actions: vec!["Send contract".to_string()],
            },
            DealScore {
                deal_id: "2".to_string(),
                company_name: "Globex".to_string(),
                deal_value: 50_000.0,
                close_probability: 20.0,
                risk_level: RiskLevel::High,
                reasoning: "Competitor in play, no budget".to_string(),
                next_actions: vec![],
            },
        ]
    }

    #[tokio::test]
    async fn test_no_file_issues_no_request() {
        let api = FakeApi::default();
        let mut deals = DealSession::new();

        assert!(matches!(deals.upload(&api).await, Err(ApiError::NoFileSelected)));
        assert_eq!(api.calls(), 0);
        assert!(!deals.loading);

        deals.select_file("   ");
        assert!(deals.upload(&api).await.is_err());
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn test_upload_replaces_results() {
        let api = FakeApi::default();
        *api.deals_reply.lock().unwrap() = scores();

        let mut deals = DealSession::new();
        deals.select_file("pipeline.csv");
        deals.upload(&api).await.unwrap();

        assert_eq!(api.calls(), 1);
        assert_eq!(deals.results.len(), 2);
        assert_eq!(deals.high_risk().len(), 1);
        assert_eq!(deals.total_value(), 150_000.0);
        assert_eq!(deals.weighted_forecast(), 90_000.0);
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_previous_results() {
        let mut deals = DealSession::new();
        deals.results = scores();
        deals.select_file("pipeline.csv");

        let result = deals.upload(&FakeApi::failing()).await;

        assert!(matches!(result, Err(ApiError::Status { .. })));
        assert_eq!(deals.results, scores());
        assert!(!deals.loading);
    }

    #[test]
    fn test_one_upload_at_a_time() {
        let mut deals = DealSession::new();
        deals.select_file("pipeline.csv");
        assert!(deals.begin_upload().is_some());
        assert!(deals.begin_upload().is_none());

        deals.finish_upload(Ok(vec![]));
        assert!(deals.begin_upload().is_some());
    }
}
